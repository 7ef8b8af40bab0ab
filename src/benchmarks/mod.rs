// Benchmarking module for Frame Duel
//
// This module provides the harness that compares the dataframe libraries:
// - timer:    runs setup/statement closures and records samples
// - stats:    mean, population standard deviation, extremes
// - reporter: text report and terminal bars
// - chart:    PNG bar chart per test case
// - runner:   test cases, variants and the driver loop
// - suite:    the eight built-in test cases
//
// Usage:
//   let runner = BenchmarkRunner::new(BenchConfig::default());
//   runner.run(&suite::default_suite(Path::new("data.csv")))?;

pub mod chart;
pub mod font;
pub mod reporter;
pub mod runner;
pub mod stats;
pub mod suite;
pub mod timer;

pub use reporter::{summarize, Report, Reporter};
pub use runner::{BenchmarkRunner, TestCase, Variant};
pub use stats::VariantResult;
pub use timer::{measure, Timer};

use serde::Serialize;

/// Elapsed-time samples (seconds) for one variant of one test case
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SampleSet {
    samples: Vec<f64>,
}

impl SampleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { samples: Vec::with_capacity(capacity) }
    }

    pub fn add_sample(&mut self, seconds: f64) {
        self.samples.push(seconds);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.samples
    }

    /// Arithmetic mean; NaN when empty
    pub fn mean(&self) -> f64 {
        stats::mean(&self.samples)
    }

    /// Population standard deviation; NaN when empty
    pub fn std_dev(&self) -> f64 {
        stats::std_dev(&self.samples)
    }
}

impl From<Vec<f64>> for SampleSet {
    fn from(samples: Vec<f64>) -> Self {
        Self { samples }
    }
}
