// Benchmark runner - orchestrates benchmark execution
//
// A TestCase maps variant labels to (setup, statement) closures and keeps a
// separate display order. The runner measures every variant of a case,
// summarizes, and reports before moving on to the next case.

use crate::benchmarks::stats::format_duration;
use crate::benchmarks::timer::time_once;
use crate::benchmarks::{measure, summarize, Report, Reporter, SampleSet};
use crate::config::BenchConfig;
use crate::errors::{BenchError, Result};
use ahash::AHashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

type MeasureFn = Box<dyn Fn(usize, usize) -> Result<SampleSet>>;

/// One library/engine combination of a test case
pub struct Variant {
    label: String,
    run: MeasureFn,
}

impl Variant {
    /// `setup` builds the bindings (a loaded frame, or `()`), `statement`
    /// is the timed operation on them
    pub fn new<S, R, F, G>(label: &str, setup: F, statement: G) -> Self
    where
        S: 'static,
        R: 'static,
        F: Fn() -> Result<S> + 'static,
        G: Fn(&mut S) -> Result<R> + 'static,
    {
        Self {
            label: label.to_string(),
            run: Box::new(move |repeats, iterations| {
                measure(&setup, &statement, repeats, iterations)
            }),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn measure(&self, repeats: usize, iterations: usize) -> Result<SampleSet> {
        (self.run)(repeats, iterations)
    }
}

pub struct TestCase {
    index: usize,
    name: String,
    variants: AHashMap<String, Variant>,
    order: Vec<String>,
}

impl TestCase {
    pub fn new(index: usize, name: &str) -> Self {
        Self { index, name: name.to_string(), variants: AHashMap::new(), order: Vec::new() }
    }

    /// Add a variant at the end of the display order. A variant with the
    /// same label is replaced and keeps its position.
    pub fn variant(mut self, variant: Variant) -> Self {
        if !self.variants.contains_key(variant.label()) {
            self.order.push(variant.label().to_string());
        }
        self.variants.insert(variant.label().to_string(), variant);
        self
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn labels(&self) -> &[String] {
        &self.order
    }

    /// Measure every variant in display order
    pub fn evaluate(&self, repeats: usize, iterations: usize) -> Result<Vec<(String, SampleSet)>> {
        self.order
            .iter()
            .map(|label| {
                let variant = self.variants.get(label).ok_or_else(|| {
                    BenchError::config(format!("Test case has no variant '{}'", label))
                        .with_context(self.name.clone())
                })?;

                tracing::debug!(
                    target: "frame_duel::runner",
                    test = %self.name,
                    variant = %label,
                    repeats,
                    iterations,
                    "measuring"
                );
                let samples = variant
                    .measure(repeats, iterations)
                    .map_err(|e| e.within(format!("{} [{}]", self.name, label)))?;
                tracing::debug!(
                    target: "frame_duel::runner",
                    variant = %label,
                    mean = samples.mean(),
                    "measured"
                );

                Ok((label.clone(), samples))
            })
            .collect()
    }
}

pub struct BenchmarkRunner {
    config: BenchConfig,
}

impl BenchmarkRunner {
    pub fn new(config: BenchConfig) -> Self {
        Self { config }
    }

    /// Measure and summarize one test case without printing anything
    pub fn evaluate(&self, case: &TestCase) -> Result<Report> {
        let sets = case.evaluate(self.config.repeats, self.config.iterations)?;
        summarize(case.name(), case.index(), sets)
    }

    /// Measure, summarize, print and chart one test case
    pub fn evaluate_and_report(&self, case: &TestCase) -> Result<Report> {
        let report = self.evaluate(case)?;
        Reporter::report(&report, &self.config.output_options())?;
        Ok(report)
    }

    /// Run the selected test cases in order. The first failure aborts the
    /// run; no report is produced for the failing case.
    pub fn run(&self, suite: &[TestCase]) -> Result<Vec<Report>> {
        self.config.validate()?;
        let selector = self.config.selector()?;

        let selected: Vec<&TestCase> = suite
            .iter()
            .filter(|case| selector.as_ref().map_or(true, |re| re.is_match(case.name())))
            .collect();
        if selected.is_empty() {
            return Err(BenchError::config("No test case matches the filter")
                .with_help(format!("filter was '{}'", self.config.only.as_deref().unwrap_or(""))));
        }

        Reporter::print_header(&format!(
            "Frame Duel: {} repeats x {} iterations on {}",
            self.config.repeats,
            self.config.iterations,
            self.config.data_path.display()
        ));

        let mut reports = Vec::with_capacity(selected.len());
        for case in selected {
            let (report, elapsed) = time_once(|| self.evaluate_and_report(case));
            tracing::debug!(
                target: "frame_duel::runner",
                test = %case.name(),
                elapsed = %format_duration(elapsed),
                "test case finished"
            );
            reports.push(report?);
        }

        if let Some(path) = &self.config.json_output {
            write_json(&reports, path)?;
        }

        Ok(reports)
    }
}

/// Write reports as a pretty-printed JSON array
pub fn write_json(reports: &[Report], path: &Path) -> Result<()> {
    let file = File::create(path)
        .map_err(|e| BenchError::from(e).with_context(path.display().to_string()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), reports)?;
    tracing::debug!(target: "frame_duel::runner", path = %path.display(), "reports written");
    Ok(())
}
