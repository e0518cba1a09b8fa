use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::algorithm::AlgorithmId;

/// Header row of the error-metrics table, in display order.
pub const METRIC_HEADERS: [&str; 5] = [
    "SED avg.",
    "SED max",
    "PED avg.",
    "PED max",
    "Compression ratio",
];

/// Error metrics of one simplified trajectory against the raw one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricTuple {
    pub sed_avg: f64,
    pub sed_max: f64,
    pub ped_avg: f64,
    pub ped_max: f64,
    pub compression_ratio: f64,
}

impl MetricTuple {
    /// Build from the service's `[ped_avg, ped_max, sed_avg, sed_max, compression_ratio]`.
    pub fn from_service_order(values: [f64; 5]) -> Self {
        let [ped_avg, ped_max, sed_avg, sed_max, compression_ratio] = values;
        Self {
            sed_avg,
            sed_max,
            ped_avg,
            ped_max,
            compression_ratio,
        }
    }

    /// Values in `METRIC_HEADERS` order.
    pub fn display_values(&self) -> [f64; 5] {
        [
            self.sed_avg,
            self.sed_max,
            self.ped_avg,
            self.ped_max,
            self.compression_ratio,
        ]
    }
}

/// Metrics per algorithm, present only for algorithms the service reported on.
pub type ErrorMetrics = BTreeMap<AlgorithmId, MetricTuple>;

/// Table cell text for one metric value.
pub fn format_metric(value: f64) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }
    if value.abs() >= 1000.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.3}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_order_is_reordered_for_display() {
        let tuple = MetricTuple::from_service_order([1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(tuple.ped_avg, 1.0);
        assert_eq!(tuple.ped_max, 2.0);
        assert_eq!(tuple.sed_avg, 3.0);
        assert_eq!(tuple.sed_max, 4.0);
        assert_eq!(tuple.display_values(), [3.0, 4.0, 1.0, 2.0, 5.0]);
    }

    #[test]
    fn headers_line_up_with_display_values() {
        assert_eq!(METRIC_HEADERS.len(), MetricTuple::from_service_order([0.0; 5]).display_values().len());
        assert!(METRIC_HEADERS[0].starts_with("SED"));
        assert!(METRIC_HEADERS[2].starts_with("PED"));
    }

    #[test]
    fn format_metric_handles_magnitudes() {
        assert_eq!(format_metric(0.5), "0.500");
        assert_eq!(format_metric(12345.6), "12346");
        assert_eq!(format_metric(f64::NAN), "-");
    }
}
