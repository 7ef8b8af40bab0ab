// Results formatting and reporting

use crate::benchmarks::stats::{self, VariantResult};
use crate::benchmarks::{chart, SampleSet};
use crate::errors::{BenchError, ErrorKind, Result};
use colored::*;
use serde::Serialize;
use std::path::PathBuf;

const WIDTH: usize = 80;
const BAR_WIDTH: usize = 40;

/// Everything printed and charted for one test case
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub index: usize,
    pub test_name: String,
    /// Variant summaries in display order
    pub results: Vec<VariantResult>,
    /// Index into `results` of the largest mean
    pub slowest: usize,
    /// Index into `results` of the smallest mean
    pub fastest: usize,
    /// Unrounded slowest mean / fastest mean
    pub ratio: f64,
}

impl Report {
    pub fn slowest(&self) -> &VariantResult {
        &self.results[self.slowest]
    }

    pub fn fastest(&self) -> &VariantResult {
        &self.results[self.fastest]
    }

    pub fn rounded_ratio(&self) -> f64 {
        stats::round_to(self.ratio, 2)
    }
}

/// Compute the report for one test case without doing any I/O.
///
/// Variant order is preserved. Extremes use unrounded means with
/// first-occurrence tie-breaking. A variant whose mean is undefined (empty
/// sample set) makes the whole test case fail.
pub fn summarize(test_name: &str, index: usize, sets: Vec<(String, SampleSet)>) -> Result<Report> {
    let results: Vec<VariantResult> = sets
        .iter()
        .map(|(label, samples)| VariantResult::from_samples(label.as_str(), samples))
        .collect();

    if let Some(bad) = results.iter().find(|r| r.mean.is_nan()) {
        return Err(BenchError::new(
            ErrorKind::DegenerateSamples,
            format!("Mean of '{}' is {} ({} samples)", bad.label, bad.mean, bad.samples),
        )
        .with_context(test_name.to_string()));
    }

    let means: Vec<f64> = results.iter().map(|r| r.mean).collect();
    let (slowest, fastest) = stats::extremes(&means).ok_or_else(|| {
        BenchError::new(ErrorKind::DegenerateSamples, "No variants to compare")
            .with_context(test_name.to_string())
    })?;

    Ok(Report {
        index,
        test_name: test_name.to_string(),
        ratio: stats::speed_ratio(means[slowest], means[fastest]),
        results,
        slowest,
        fastest,
    })
}

/// Where and how a report is emitted
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub output_dir: PathBuf,
    pub terminal_chart: bool,
    pub show: bool,
}

pub struct Reporter;

impl Reporter {
    pub fn print_header(title: &str) {
        println!("{}", "=".repeat(WIDTH).bright_blue());
        println!("{:^width$}", title.bright_white().bold(), width = WIDTH);
        println!("{}", "=".repeat(WIDTH).bright_blue());
        println!();
    }

    pub fn print_separator() {
        println!("{}", "-".repeat(WIDTH).blue());
    }

    /// Plain-text block for one report (no colors)
    pub fn format_text(report: &Report) -> String {
        let mut out = format!("| Test {:02}: {}\n", report.index, report.test_name);
        for r in &report.results {
            out.push_str(&format!(
                "|   Average duration [{}]: {:.3} s, Std: {:.3} s\n",
                r.label,
                r.rounded_mean(),
                r.rounded_std_dev()
            ));
        }
        out.push_str(&format!(
            "|   --> Slowest: {} is {:.2} times slower than the fastest ({})\n",
            report.slowest().label,
            report.rounded_ratio(),
            report.fastest().label
        ));
        out
    }

    pub fn print_text(report: &Report) {
        println!(
            "{} {}",
            format!("| Test {:02}:", report.index).bright_white().bold(),
            report.test_name.bright_white()
        );
        for (i, r) in report.results.iter().enumerate() {
            let label = format!("[{}]", r.label);
            let label = if i == report.fastest {
                label.green()
            } else if i == report.slowest {
                label.red()
            } else {
                label.cyan()
            };
            println!(
                "|   Average duration {}: {} s, Std: {} s  ({})",
                label,
                format!("{:.3}", r.rounded_mean()).yellow(),
                format!("{:.3}", r.rounded_std_dev()).blue(),
                stats::format_seconds(r.mean).dimmed()
            );
        }
        println!(
            "|   --> Slowest: {} is {} times slower than the fastest ({})",
            report.slowest().label.red().bold(),
            format!("{:.2}", report.rounded_ratio()).bright_green().bold(),
            report.fastest().label.green().bold()
        );
    }

    /// Horizontal bars scaled to the slowest variant
    pub fn terminal_chart(report: &Report) -> String {
        let label_width = report.results.iter().map(|r| r.label.len()).max().unwrap_or(0);
        let max = report.slowest().mean;

        let mut out = String::new();
        for r in &report.results {
            let filled = if max > 0.0 {
                ((r.mean / max) * BAR_WIDTH as f64).round() as usize
            } else {
                0
            };
            out.push_str(&format!(
                "  {:<lw$} {}{} {}\n",
                r.label,
                "█".repeat(filled),
                " ".repeat(BAR_WIDTH - filled.min(BAR_WIDTH)),
                stats::format_seconds(r.mean),
                lw = label_width
            ));
        }
        out
    }

    /// Print the text block, write the chart, optionally display it
    pub fn report(report: &Report, options: &OutputOptions) -> Result<PathBuf> {
        Self::print_text(report);

        let path = chart::save(report, &options.output_dir)?;

        if options.terminal_chart {
            println!();
            print!("{}", Self::terminal_chart(report).bright_blue());
        }
        println!("|   Chart: {}", path.display().to_string().dimmed());

        if options.show {
            chart::open_in_viewer(&path)?;
        }

        Self::print_separator();
        Ok(path)
    }
}
