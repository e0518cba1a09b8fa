use trajview_shared::{
    AlgorithmId, ErrorMetrics, LatLon, METRIC_HEADERS, TrajectoryResult, metrics::format_metric,
};

use crate::coordinator::RenderJob;
use crate::selection::Selection;

/// Map capability: a layer set of colored paths on top of base layers it never
/// removes.
pub trait MapSurface {
    /// Remove every path layer. Base layers stay.
    fn clear_paths(&mut self);
    fn draw_path(&mut self, points: &[LatLon], color: &str);
    /// Called once after a full redraw.
    fn paths_updated(&mut self) {}
}

pub const MISSING_METRIC: &str = "-";

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsRow {
    pub algorithm: AlgorithmId,
    /// Display order; `None` when the response carried no metrics for it.
    pub values: Option<[f64; 5]>,
}

impl MetricsRow {
    pub fn cells(&self) -> Vec<String> {
        match self.values {
            Some(values) => values.iter().map(|v| format_metric(*v)).collect(),
            None => vec![MISSING_METRIC.to_string(); METRIC_HEADERS.len()],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsTable {
    pub headers: [&'static str; 5],
    pub rows: Vec<MetricsRow>,
}

impl MetricsTable {
    /// One row per selected algorithm, in canonical order, whether or not metrics
    /// came back for it.
    pub fn build(errors: &ErrorMetrics, selection: &Selection) -> Self {
        let rows = selection
            .algorithms
            .iter()
            .map(|id| MetricsRow {
                algorithm: *id,
                values: errors.get(id).map(|tuple| tuple.display_values()),
            })
            .collect();
        Self {
            headers: METRIC_HEADERS,
            rows,
        }
    }
}

/// Applies fresh results to the map and the metrics table.
pub struct RenderSink<M> {
    map: M,
    table: Option<MetricsTable>,
    drawn_paths: usize,
}

impl<M: MapSurface> RenderSink<M> {
    pub fn new(map: M) -> Self {
        Self {
            map,
            table: None,
            drawn_paths: 0,
        }
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn table(&self) -> Option<&MetricsTable> {
        self.table.as_ref()
    }

    pub fn drawn_paths(&self) -> usize {
        self.drawn_paths
    }

    /// Replace paths and table. `errors` is `None` while the metrics panel is hidden.
    pub fn render(
        &mut self,
        result: &TrajectoryResult,
        errors: Option<&ErrorMetrics>,
        selection: &Selection,
    ) {
        self.map.clear_paths();
        self.drawn_paths = 0;

        // Baseline underneath, then algorithms in canonical order.
        let order = std::iter::once(AlgorithmId::Raw)
            .chain(AlgorithmId::SELECTABLE);
        for id in order {
            let Some(trajectory) = result.get(&id) else {
                continue;
            };
            let color = id.path_color();
            for route in trajectory.routes.iter().filter(|route| !route.is_empty()) {
                self.map.draw_path(route, &color);
                self.drawn_paths += 1;
            }
        }
        self.map.paths_updated();

        self.table = errors.map(|errors| MetricsTable::build(errors, selection));
    }

    pub fn apply(&mut self, job: &RenderJob, show_errors: bool) {
        let errors = show_errors.then_some(&job.response.errors);
        self.render(&job.response.trajectories, errors, &job.selection);
    }

    pub fn hide_table(&mut self) {
        self.table = None;
    }

    /// Drop every path and the table.
    pub fn clear(&mut self) {
        self.map.clear_paths();
        self.map.paths_updated();
        self.drawn_paths = 0;
        self.table = None;
    }
}
