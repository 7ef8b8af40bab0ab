// File: src/frame/mod.rs
//
// The two dataframe libraries the harness compares:
// - rows:    row-oriented frame with three CSV read engines
// - columns: columnar frame with an expression API, parallel kernels
//            and a lazy query planner (lazy.rs)
//
// Both parse CSV fields with the same rules so their results agree.

pub mod columns;
pub mod lazy;
pub mod rows;

pub use columns::{col, mean, ColumnData, ColumnFrame, Expr, Scalar, Series};
pub use lazy::LazyFrame;
pub use rows::{ReadEngine, RowFrame};

/// A single parsed CSV field
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// Parse a field: empty is null, then integer, then float, else text
    pub fn parse(field: &str) -> Cell {
        if field.is_empty() {
            Cell::Null
        } else if let Ok(i) = field.parse::<i64>() {
            Cell::Int(i)
        } else if let Ok(f) = field.parse::<f64>() {
            Cell::Float(f)
        } else {
            Cell::Text(field.to_string())
        }
    }

    pub fn parse_bytes(field: &[u8]) -> Cell {
        match std::str::from_utf8(field) {
            Ok(s) => Cell::parse(s),
            Err(_) => Cell::Text(String::from_utf8_lossy(field).into_owned()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            Cell::Null | Cell::Text(_) => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Int(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Float(value)
    }
}

/// Hashable view of a cell used as a group-by key.
///
/// Floats hash by bit pattern, with `-0.0` folded into `0.0` and every NaN
/// folded into one canonical NaN so equal-looking keys land in one group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Null,
    Int(i64),
    Float(u64),
    Text(String),
}

impl GroupKey {
    pub fn from_f64(value: f64) -> Self {
        let normalized = if value == 0.0 {
            0.0
        } else if value.is_nan() {
            f64::NAN
        } else {
            value
        };
        GroupKey::Float(normalized.to_bits())
    }
}

/// Numeric cells key by value, so `5` and `5.0` share a group
impl From<&Cell> for GroupKey {
    fn from(cell: &Cell) -> Self {
        match cell {
            Cell::Null => GroupKey::Null,
            Cell::Int(i) => GroupKey::from_f64(*i as f64),
            Cell::Float(f) => GroupKey::from_f64(*f),
            Cell::Text(s) => GroupKey::Text(s.clone()),
        }
    }
}
