use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Trajectory simplification algorithms known to the dashboard.
///
/// Declaration order is the canonical order: selections, paths and table rows are
/// always presented in this order regardless of the order the user toggled them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AlgorithmId {
    #[serde(rename = "DP")]
    Dp,
    #[serde(rename = "DR")]
    Dr,
    #[serde(rename = "SQUISH")]
    Squish,
    #[serde(rename = "SQUISH_E")]
    SquishE,
    #[serde(rename = "SQUISH_RECKONING")]
    SquishReckoning,
    #[serde(rename = "UNIFORM_SAMPLING")]
    UniformSampling,
    /// Unsimplified baseline. Always returned by the backend, never user-toggled.
    #[serde(rename = "raw")]
    Raw,
}

impl AlgorithmId {
    pub const ALL: [AlgorithmId; 7] = [
        AlgorithmId::Dp,
        AlgorithmId::Dr,
        AlgorithmId::Squish,
        AlgorithmId::SquishE,
        AlgorithmId::SquishReckoning,
        AlgorithmId::UniformSampling,
        AlgorithmId::Raw,
    ];

    /// Algorithms the user can enable, in canonical order.
    pub const SELECTABLE: [AlgorithmId; 6] = [
        AlgorithmId::Dp,
        AlgorithmId::Dr,
        AlgorithmId::Squish,
        AlgorithmId::SquishE,
        AlgorithmId::SquishReckoning,
        AlgorithmId::UniformSampling,
    ];

    /// Token used in request bodies and response keys.
    pub fn as_str(self) -> &'static str {
        match self {
            AlgorithmId::Dp => "DP",
            AlgorithmId::Dr => "DR",
            AlgorithmId::Squish => "SQUISH",
            AlgorithmId::SquishE => "SQUISH_E",
            AlgorithmId::SquishReckoning => "SQUISH_RECKONING",
            AlgorithmId::UniformSampling => "UNIFORM_SAMPLING",
            AlgorithmId::Raw => "raw",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AlgorithmId::Dp => "Douglas-Peucker",
            AlgorithmId::Dr => "Dead Reckoning",
            AlgorithmId::Squish => "SQUISH",
            AlgorithmId::SquishE => "SQUISH-E",
            AlgorithmId::SquishReckoning => "SQUISH Reckoning",
            AlgorithmId::UniformSampling => "Uniform Sampling",
            AlgorithmId::Raw => "Raw",
        }
    }

    pub fn is_selectable(self) -> bool {
        self != AlgorithmId::Raw
    }

    /// Parameters this algorithm needs from the user. Every other parameter input is
    /// disabled while only this algorithm is enabled.
    pub fn params(self) -> &'static [ParamSpec] {
        match self {
            AlgorithmId::Dp => DP_PARAMS,
            AlgorithmId::Dr => DR_PARAMS,
            AlgorithmId::Squish => SQUISH_PARAMS,
            AlgorithmId::SquishE => SQUISH_E_PARAMS,
            AlgorithmId::SquishReckoning => SQUISH_RECKONING_PARAMS,
            AlgorithmId::UniformSampling => UNIFORM_SAMPLING_PARAMS,
            AlgorithmId::Raw => &[],
        }
    }

    pub fn param(self, name: &str) -> Option<&'static ParamSpec> {
        self.params().iter().find(|spec| spec.name == name)
    }
}

impl fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlgorithmId {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        AlgorithmId::ALL
            .into_iter()
            .find(|id| id.as_str() == raw)
            .ok_or_else(|| format!("unknown algorithm: {raw}"))
    }
}

/// Declaration of one numeric parameter input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub default: f64,
    pub step: f64,
}

impl ParamSpec {
    /// Clamp user input into the inclusive `[min, max]` range.
    /// Non-finite input falls back to the declared default.
    pub fn clamp(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return self.default;
        }
        let mut clamped = value;
        if let Some(min) = self.min {
            clamped = clamped.max(min);
        }
        if let Some(max) = self.max {
            clamped = clamped.min(max);
        }
        clamped
    }
}

const DP_PARAMS: &[ParamSpec] = &[ParamSpec {
    name: "epsilon",
    label: "Epsilon",
    min: Some(0.0),
    max: None,
    default: 10.0,
    step: 1.0,
}];

const DR_PARAMS: &[ParamSpec] = &[ParamSpec {
    name: "tolerance",
    label: "Tolerance (m)",
    min: Some(0.0),
    max: None,
    default: 100.0,
    step: 10.0,
}];

const SQUISH_PARAMS: &[ParamSpec] = &[ParamSpec {
    name: "buff_size",
    label: "Buffer size",
    min: Some(2.0),
    max: Some(100_000.0),
    default: 1000.0,
    step: 1.0,
}];

const SQUISH_E_PARAMS: &[ParamSpec] = &[
    ParamSpec {
        name: "low_comp",
        label: "Lower compression ratio",
        min: Some(1.0),
        max: None,
        default: 2.0,
        step: 0.5,
    },
    ParamSpec {
        name: "max_sed",
        label: "Max SED",
        min: Some(0.0),
        max: None,
        default: 0.0,
        step: 1.0,
    },
];

const SQUISH_RECKONING_PARAMS: &[ParamSpec] = &[ParamSpec {
    name: "buff_size",
    label: "Buffer size",
    min: Some(2.0),
    max: Some(100_000.0),
    default: 1000.0,
    step: 1.0,
}];

const UNIFORM_SAMPLING_PARAMS: &[ParamSpec] = &[ParamSpec {
    name: "sampling_rate",
    label: "Keep every n-th point",
    min: Some(1.0),
    max: Some(10_000.0),
    default: 10.0,
    step: 1.0,
}];
