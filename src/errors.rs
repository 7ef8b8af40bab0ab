// File: src/errors.rs
//
// Error handling and reporting for Frame Duel.
// Every fallible operation in the harness and in the frame libraries returns
// a BenchError; main prints it with colors and exits.

use colored::Colorize;
use std::fmt;

/// Types of errors that can abort a benchmark run
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    Io,
    Csv,
    Config,
    MissingColumn,
    TypeMismatch,
    DegenerateSamples,
    Chart,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::Io => write!(f, "I/O Error"),
            ErrorKind::Csv => write!(f, "CSV Error"),
            ErrorKind::Config => write!(f, "Config Error"),
            ErrorKind::MissingColumn => write!(f, "Missing Column"),
            ErrorKind::TypeMismatch => write!(f, "Type Mismatch"),
            ErrorKind::DegenerateSamples => write!(f, "Degenerate Samples"),
            ErrorKind::Chart => write!(f, "Chart Error"),
        }
    }
}

/// A structured error with optional context (which test or file failed)
#[derive(Debug, Clone)]
pub struct BenchError {
    pub kind: ErrorKind,
    pub message: String,
    pub context: Option<String>,
    pub suggestion: Option<String>,
    pub help: Option<String>,
}

impl BenchError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), context: None, suggestion: None, help: None }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Prepend `outer` to the existing context, keeping the inner detail
    pub fn within(mut self, outer: impl Into<String>) -> Self {
        let outer = outer.into();
        self.context = Some(match self.context.take() {
            Some(inner) => format!("{}: {}", outer, inner),
            None => outer,
        });
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeMismatch, message)
    }

    /// Create a missing column error, suggesting the closest existing column
    pub fn missing_column(name: &str, available: &[String]) -> Self {
        let err = Self::new(ErrorKind::MissingColumn, format!("Column '{}' not found", name))
            .with_help(format!("available columns: {}", available.join(", ")));
        match find_closest_match(name, available) {
            Some(candidate) => err.with_suggestion(candidate),
            None => err,
        }
    }
}

impl fmt::Display for BenchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind_str = format!("{}", self.kind);
        writeln!(f, "{}: {}", kind_str.red().bold(), self.message.bold())?;

        if let Some(ref context) = self.context {
            writeln!(f, "{}", format!("  --> {}", context).bright_blue())?;
        }

        if let Some(ref help) = self.help {
            writeln!(
                f,
                "   {} {}",
                "=".bright_yellow(),
                format!("help: {}", help).bright_yellow()
            )?;
        }

        if let Some(ref suggestion) = self.suggestion {
            writeln!(
                f,
                "   {} {}",
                "=".bright_green(),
                format!("Did you mean '{}'?", suggestion).bright_green()
            )?;
        }

        Ok(())
    }
}

impl std::error::Error for BenchError {}

impl From<std::io::Error> for BenchError {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, err.to_string())
    }
}

impl From<csv::Error> for BenchError {
    fn from(err: csv::Error) -> Self {
        Self::new(ErrorKind::Csv, err.to_string())
    }
}

impl From<image::ImageError> for BenchError {
    fn from(err: image::ImageError) -> Self {
        Self::new(ErrorKind::Chart, err.to_string())
    }
}

impl From<toml::de::Error> for BenchError {
    fn from(err: toml::de::Error) -> Self {
        Self::new(ErrorKind::Config, err.to_string())
    }
}

impl From<serde_json::Error> for BenchError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(ErrorKind::Io, format!("JSON export failed: {}", err))
    }
}

impl From<regex::Error> for BenchError {
    fn from(err: regex::Error) -> Self {
        Self::new(ErrorKind::Config, format!("Invalid test filter: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;

/// Computes the Levenshtein distance between two strings
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Single rolling row instead of the full matrix
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Find the closest candidate (case-insensitive) within distance 3
pub fn find_closest_match<'a>(target: &str, candidates: &'a [String]) -> Option<&'a str> {
    let target = target.to_lowercase();
    candidates
        .iter()
        .map(|c| (levenshtein_distance(&target, &c.to_lowercase()), c))
        .filter(|(distance, _)| *distance <= 3)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, c)| c.as_str())
}
