// Statistical analysis for benchmark results
//
// Everything here is pure: no printing, no files. Rounding helpers exist
// for display only; comparisons always use the unrounded values.

use crate::benchmarks::SampleSet;
use serde::Serialize;
use std::time::Duration;

/// Summary of one variant's samples
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantResult {
    pub label: String,
    pub mean: f64,
    pub std_dev: f64,
    pub samples: usize,
}

impl VariantResult {
    pub fn from_samples(label: impl Into<String>, samples: &SampleSet) -> Self {
        Self {
            label: label.into(),
            mean: samples.mean(),
            std_dev: samples.std_dev(),
            samples: samples.len(),
        }
    }

    pub fn rounded_mean(&self) -> f64 {
        round_to(self.mean, 3)
    }

    pub fn rounded_std_dev(&self) -> f64 {
        round_to(self.std_dev, 3)
    }
}

/// Arithmetic mean; NaN for an empty slice
pub fn mean(samples: &[f64]) -> f64 {
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Population standard deviation (divides by n, not n - 1); NaN for an
/// empty slice
pub fn std_dev(samples: &[f64]) -> f64 {
    let mean = mean(samples);
    let variance = samples
        .iter()
        .map(|s| {
            let diff = s - mean;
            diff * diff
        })
        .sum::<f64>()
        / samples.len() as f64;
    variance.sqrt()
}

/// Round half away from zero to `digits` decimal places
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

/// Indices of the largest and smallest value. Ties keep the earliest index.
/// Returns None for an empty slice.
pub fn extremes(values: &[f64]) -> Option<(usize, usize)> {
    let first = *values.first()?;
    let (mut max_idx, mut min_idx) = (0, 0);
    let (mut max_val, mut min_val) = (first, first);

    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > max_val {
            max_idx = i;
            max_val = v;
        }
        if v < min_val {
            min_idx = i;
            min_val = v;
        }
    }

    Some((max_idx, min_idx))
}

/// How many times slower the slowest variant is than the fastest
pub fn speed_ratio(max_mean: f64, min_mean: f64) -> f64 {
    max_mean / min_mean
}

pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos < 1_000 {
        format!("{} ns", nanos)
    } else if nanos < 1_000_000 {
        format!("{:.2} µs", nanos as f64 / 1_000.0)
    } else if nanos < 1_000_000_000 {
        format!("{:.2} ms", nanos as f64 / 1_000_000.0)
    } else {
        format!("{:.2} s", nanos as f64 / 1_000_000_000.0)
    }
}

/// Human-readable form of a duration in seconds; "NaN" when undefined
pub fn format_seconds(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return format!("{}", seconds);
    }
    format_duration(Duration::from_secs_f64(seconds))
}
