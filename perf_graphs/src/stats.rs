use std::fmt::Display;

use average::{concatenate, Estimate, Max, Mean, Min, Variance};
use itertools::Itertools;
use readable::num::*;
use sparklines::spark;

use crate::api::{GraphData, Series};

concatenate!(
    AggStats,
    [Min, min],
    [Max, max],
    [Mean, mean],
    [Variance, sample_variance]
);

/// Statistics over the measured points of a series. Interpolated points are only counted.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesStats {
    pub len: usize,
    pub interpolated: usize,
    pub mean: f64,
    pub stddev: f64,
    pub min: f64,
    pub max: f64,
}

impl SeriesStats {
    pub fn of(series: &Series) -> SeriesStats {
        let s: AggStats = series.measured().map(|(_, v)| v).collect();
        let measured = s.mean.len() as usize;
        let (mean, stddev, min, max) = if measured == 0 {
            (f64::NAN, f64::NAN, f64::NAN, f64::NAN)
        } else {
            (s.mean(), s.sample_variance().sqrt(), s.min(), s.max())
        };
        SeriesStats {
            len: series.len(),
            interpolated: series.interpolated_indices().len(),
            mean,
            stddev,
            min,
            max,
        }
    }

    pub fn measured(&self) -> usize {
        self.len - self.interpolated
    }
}

/// Series without measured points have no statistics.
fn readable_float(v: f64) -> String {
    if v.is_finite() {
        Float::from(v).to_string()
    } else {
        "-".to_string()
    }
}

impl Display for SeriesStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "μ: {} σ: {} min: {} max: {} n: {} (interpolated: {})",
            readable_float(self.mean),
            readable_float(self.stddev),
            readable_float(self.min),
            readable_float(self.max),
            Unsigned::from(self.len),
            Unsigned::from(self.interpolated),
        )
    }
}

/// One row per series, in benchmark, profile, scenario order.
pub fn summarize(data: &GraphData) -> Vec<(String, SeriesStats)> {
    data.iter_series()
        .map(|(key, series)| (key.to_string(), SeriesStats::of(series)))
        .collect()
}

/// Sparkline over all points of a series, interpolated ones included so the shape lines up with the commits.
pub fn sparkline(series: &Series) -> String {
    if series.is_empty() {
        return String::new();
    }
    spark(series.points())
}

pub fn format_summary(data: &GraphData) -> String {
    data.iter_series()
        .map(|(key, series)| {
            format!(
                "{}: {} {}",
                key,
                SeriesStats::of(series),
                sparkline(series)
            )
        })
        .join("\n")
}
