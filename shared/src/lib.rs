pub mod algorithm;
pub mod colors;
pub mod metrics;
pub mod time;
pub mod wire;

pub use algorithm::{AlgorithmId, ParamSpec};
pub use metrics::{ErrorMetrics, METRIC_HEADERS, MetricTuple};
pub use time::{SECONDS_PER_DAY, TimeWindow};
pub use wire::{
    AlgorithmParams, LatLon, ServiceRequest, SimplifyRequest, SimplifyResponse, Trajectory,
    TrajectoryResult,
};
