// High-precision timing utilities for benchmarks

use crate::benchmarks::SampleSet;
use crate::errors::Result;
use std::hint::black_box;
use std::time::{Duration, Instant};

pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }

    pub fn start() -> Self {
        Self::new()
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

/// Time `statement` under a freshly prepared `setup`.
///
/// For each of `repeats` rounds, `setup` runs once (untimed) and produces the
/// bindings the statement works on; then `statement` runs `iterations` times
/// back to back and the total wall-clock time of that block becomes one
/// sample. Re-running setup every round keeps in-place mutations made by the
/// statement from leaking into later rounds.
///
/// The first error from either closure aborts the measurement.
pub fn measure<S, R>(
    mut setup: impl FnMut() -> Result<S>,
    mut statement: impl FnMut(&mut S) -> Result<R>,
    repeats: usize,
    iterations: usize,
) -> Result<SampleSet> {
    let mut samples = SampleSet::with_capacity(repeats);

    for _ in 0..repeats {
        let mut bindings = setup()?;

        let timer = Timer::start();
        for _ in 0..iterations {
            black_box(statement(&mut bindings)?);
        }
        samples.add_sample(timer.elapsed_secs());
    }

    Ok(samples)
}

/// Time a single execution
pub fn time_once<R>(f: impl FnOnce() -> R) -> (R, Duration) {
    let timer = Timer::start();
    let value = f();
    (value, timer.elapsed())
}
