use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, IgnoredAny, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::algorithm::AlgorithmId;
use crate::metrics::{ErrorMetrics, MetricTuple};
use crate::time::{REQUEST_DATETIME_FORMAT, TimeWindow, format_date, parse_date, parse_request_datetime};

/// Per-algorithm parameter values, keyed by parameter name.
pub type AlgorithmParams = BTreeMap<AlgorithmId, BTreeMap<String, f64>>;

/// Body of `POST /api/algorithm`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplifyRequest {
    pub algorithms: Vec<AlgorithmId>,
    pub start_date: Option<String>,
    #[serde(alias = "end_date")]
    pub end_time: String,
    #[serde(default)]
    pub params: AlgorithmParams,
}

impl SimplifyRequest {
    pub fn new(algorithms: Vec<AlgorithmId>, params: AlgorithmParams, window: &TimeWindow) -> Self {
        Self {
            algorithms,
            start_date: window.request_start_date(),
            end_time: window.request_end_time(),
            params,
        }
    }

    /// Check the request against the static algorithm and parameter tables.
    pub fn validate(&self) -> Result<(), String> {
        if self.algorithms.is_empty() {
            return Err("no algorithm selected".to_string());
        }
        if let Some(id) = self.algorithms.iter().find(|id| !id.is_selectable()) {
            return Err(format!("{id} cannot be requested explicitly"));
        }
        if parse_request_datetime(&self.end_time).is_none() {
            return Err(format!("invalid end_time: {}", self.end_time));
        }
        if let Some(start) = &self.start_date
            && parse_date(start).is_none()
        {
            return Err(format!("invalid start_date: {start}"));
        }
        for (id, values) in &self.params {
            if !self.algorithms.contains(id) {
                return Err(format!("parameters sent for disabled algorithm {id}"));
            }
            for (name, value) in values {
                if id.param(name).is_none() {
                    return Err(format!("{id} has no parameter {name}"));
                }
                if !value.is_finite() {
                    return Err(format!("{id}.{name} is not a finite number"));
                }
            }
        }
        Ok(())
    }
}

/// Body expected by the simplification service's `POST /algorithm`.
///
/// The service reads a single flat parameter map shared by every algorithm and
/// needs a concrete start date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub algorithms: Vec<AlgorithmId>,
    pub start_date: String,
    pub end_date: String,
    pub params: BTreeMap<String, f64>,
}

impl SimplifyRequest {
    /// Translate into the service's shape. A missing start date becomes the day of
    /// `end_time`. Parameters of enabled algorithms are flattened in request order,
    /// so when two algorithms share a name the later one wins.
    pub fn to_service_request(&self) -> Result<ServiceRequest, String> {
        let end = parse_request_datetime(&self.end_time)
            .ok_or_else(|| format!("invalid end_time: {}", self.end_time))?;
        let start_date = match &self.start_date {
            Some(start) => parse_date(start).ok_or_else(|| format!("invalid start_date: {start}"))?,
            None => end.date(),
        };

        let mut params = BTreeMap::new();
        for id in &self.algorithms {
            if let Some(values) = self.params.get(id) {
                for (name, value) in values {
                    params.insert(name.clone(), *value);
                }
            }
        }

        Ok(ServiceRequest {
            algorithms: self.algorithms.clone(),
            start_date: format_date(start_date),
            end_date: end.format(REQUEST_DATETIME_FORMAT).to_string(),
            params,
        })
    }
}

/// One `(lat, lon)` point. Deserializes from `[lat, lon, ...]`; trailing elements
/// such as timestamps are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl<'de> Deserialize<'de> for LatLon {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PointVisitor;

        impl<'de> Visitor<'de> for PointVisitor {
            type Value = LatLon;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a [lat, lon] point")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<LatLon, A::Error> {
                let lat: f64 = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let lon: f64 = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                Ok(LatLon { lat, lon })
            }
        }

        deserializer.deserialize_seq(PointVisitor)
    }
}

/// Ordered points returned for one algorithm, split into routes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Trajectory {
    pub routes: Vec<Vec<LatLon>>,
}

impl Trajectory {
    pub fn from_points(points: Vec<LatLon>) -> Self {
        if points.is_empty() {
            return Self::default();
        }
        Self {
            routes: vec![points],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.routes.iter().all(Vec::is_empty)
    }

    pub fn point_count(&self) -> usize {
        self.routes.iter().map(Vec::len).sum()
    }

    pub fn points(&self) -> impl Iterator<Item = &LatLon> {
        self.routes.iter().flatten()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TrajectoryShape {
    Routes(Vec<Vec<LatLon>>),
    Points(Vec<LatLon>),
}

impl<'de> Deserialize<'de> for Trajectory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let shape = Option::<TrajectoryShape>::deserialize(deserializer)?;
        Ok(match shape {
            None => Trajectory::default(),
            Some(TrajectoryShape::Routes(routes)) => Trajectory {
                routes: routes.into_iter().filter(|route| !route.is_empty()).collect(),
            },
            Some(TrajectoryShape::Points(points)) => Trajectory::from_points(points),
        })
    }
}

/// Trajectories per algorithm; `AlgorithmId::Raw` holds the baseline.
pub type TrajectoryResult = BTreeMap<AlgorithmId, Trajectory>;

const METRICS_SUFFIX: &str = "_error_metrics";

/// Parsed backend answer. Trajectories that came back empty are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimplifyResponse {
    pub trajectories: TrajectoryResult,
    pub errors: ErrorMetrics,
}

impl SimplifyResponse {
    pub fn from_json_str(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    pub fn trajectory(&self, id: AlgorithmId) -> Option<&Trajectory> {
        self.trajectories.get(&id)
    }

    pub fn raw(&self) -> Option<&Trajectory> {
        self.trajectory(AlgorithmId::Raw)
    }
}

impl<'de> Deserialize<'de> for SimplifyResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let object = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        let mut response = SimplifyResponse::default();

        for (key, value) in object {
            if let Some(prefix) = key.strip_suffix(METRICS_SUFFIX) {
                let Ok(id) = prefix.parse::<AlgorithmId>() else {
                    continue;
                };
                let values: Option<Vec<f64>> = serde_json::from_value(value)
                    .map_err(|e| de::Error::custom(format!("{key}: {e}")))?;
                match values.as_deref() {
                    None | Some([]) => {}
                    Some(&[a, b, c, d, e]) => {
                        response
                            .errors
                            .insert(id, MetricTuple::from_service_order([a, b, c, d, e]));
                    }
                    Some(other) => {
                        return Err(de::Error::custom(format!(
                            "{key}: expected 5 metrics, got {}",
                            other.len()
                        )));
                    }
                }
                continue;
            }

            let Ok(id) = key.parse::<AlgorithmId>() else {
                continue;
            };
            let trajectory: Trajectory = serde_json::from_value(value)
                .map_err(|e| de::Error::custom(format!("{key}: {e}")))?;
            if !trajectory.is_empty() {
                response.trajectories.insert(id, trajectory);
            }
        }

        Ok(response)
    }
}
