// File: src/frame/columns.rs
//
// Columnar frame: a list of typed, reference-counted series.
// Cloning a frame or selecting columns only bumps reference counts.
// Expressions (col, mean, *, gt, fill_null, alias) are evaluated against a
// frame; plain numbers become literals. Element-wise kernels and per-group
// reductions run on rayon.

use super::lazy::LazyFrame;
use super::{Cell, GroupKey};
use crate::errors::{BenchError, Result};
use ahash::AHashMap;
use rayon::prelude::*;
use std::fs::File;
use std::io::Read;
use std::ops::Mul;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Int(i64),
    Float(f64),
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int(value as i64)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Int(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Bool(Vec<Option<bool>>),
    Text(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Int(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Bool(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dtype(&self) -> &'static str {
        match self {
            ColumnData::Int(_) => "i64",
            ColumnData::Float(_) => "f64",
            ColumnData::Bool(_) => "bool",
            ColumnData::Text(_) => "str",
        }
    }

    /// Numeric value at `i`, broadcasting length-1 data
    fn float_at(&self, i: usize) -> Option<f64> {
        let i = if self.len() == 1 { 0 } else { i };
        match self {
            ColumnData::Int(v) => v[i].map(|x| x as f64),
            ColumnData::Float(v) => v[i],
            ColumnData::Bool(_) | ColumnData::Text(_) => None,
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(self, ColumnData::Int(_) | ColumnData::Float(_))
    }

    fn group_key(&self, i: usize) -> GroupKey {
        match self {
            ColumnData::Int(v) => v[i].map_or(GroupKey::Null, GroupKey::Int),
            ColumnData::Float(v) => v[i].map_or(GroupKey::Null, GroupKey::from_f64),
            ColumnData::Bool(v) => v[i].map_or(GroupKey::Null, |b| GroupKey::Int(b as i64)),
            ColumnData::Text(v) => v[i].clone().map_or(GroupKey::Null, GroupKey::Text),
        }
    }

    fn filter(&self, mask: &[bool]) -> ColumnData {
        fn keep<T: Clone>(values: &[T], mask: &[bool]) -> Vec<T> {
            values.iter().zip(mask).filter(|(_, m)| **m).map(|(v, _)| v.clone()).collect()
        }
        match self {
            ColumnData::Int(v) => ColumnData::Int(keep(v, mask)),
            ColumnData::Float(v) => ColumnData::Float(keep(v, mask)),
            ColumnData::Bool(v) => ColumnData::Bool(keep(v, mask)),
            ColumnData::Text(v) => ColumnData::Text(keep(v, mask)),
        }
    }

    fn take(&self, indices: &[usize]) -> ColumnData {
        fn gather<T: Clone>(values: &[T], indices: &[usize]) -> Vec<T> {
            indices.iter().map(|&i| values[i].clone()).collect()
        }
        match self {
            ColumnData::Int(v) => ColumnData::Int(gather(v, indices)),
            ColumnData::Float(v) => ColumnData::Float(gather(v, indices)),
            ColumnData::Bool(v) => ColumnData::Bool(gather(v, indices)),
            ColumnData::Text(v) => ColumnData::Text(gather(v, indices)),
        }
    }

    fn broadcast(&self, len: usize) -> ColumnData {
        self.take(&vec![0; len])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    name: String,
    data: ColumnData,
}

impl Series {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self { name: name.into(), data }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn null_count(&self) -> usize {
        match &self.data {
            ColumnData::Int(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::Float(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::Bool(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::Text(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }

    /// Value at row `i`; booleans come back as 0/1 integers
    pub fn get(&self, i: usize) -> Option<Cell> {
        if i >= self.len() {
            return None;
        }
        Some(match &self.data {
            ColumnData::Int(v) => v[i].map_or(Cell::Null, Cell::Int),
            ColumnData::Float(v) => v[i].map_or(Cell::Null, Cell::Float),
            ColumnData::Bool(v) => v[i].map_or(Cell::Null, |b| Cell::Int(b as i64)),
            ColumnData::Text(v) => v[i].clone().map_or(Cell::Null, Cell::Text),
        })
    }

    fn renamed(self, name: &str) -> Series {
        Series { name: name.to_string(), data: self.data }
    }
}

/// Column expression, evaluated against a ColumnFrame
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Column(String),
    Literal(Scalar),
    Mul(Box<Expr>, Box<Expr>),
    Gt(Box<Expr>, Box<Expr>),
    FillNull(Box<Expr>, Scalar),
    Mean(Box<Expr>),
    Alias(Box<Expr>, String),
}

pub fn col(name: &str) -> Expr {
    Expr::Column(name.to_string())
}

fn lit(value: impl Into<Scalar>) -> Expr {
    Expr::Literal(value.into())
}

pub fn mean(name: &str) -> Expr {
    col(name).mean()
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        lit(value)
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        lit(value)
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        lit(value)
    }
}

impl<T: Into<Expr>> Mul<T> for Expr {
    type Output = Expr;

    fn mul(self, rhs: T) -> Expr {
        Expr::Mul(Box::new(self), Box::new(rhs.into()))
    }
}

impl Expr {
    pub fn alias(self, name: &str) -> Expr {
        Expr::Alias(Box::new(self), name.to_string())
    }

    pub fn gt(self, rhs: impl Into<Expr>) -> Expr {
        Expr::Gt(Box::new(self), Box::new(rhs.into()))
    }

    pub fn fill_null(self, value: impl Into<Scalar>) -> Expr {
        Expr::FillNull(Box::new(self), value.into())
    }

    pub fn mean(self) -> Expr {
        Expr::Mean(Box::new(self))
    }

    /// Name of the column this expression produces (the left-most input
    /// column unless aliased)
    pub fn output_name(&self) -> &str {
        match self {
            Expr::Column(name) | Expr::Alias(_, name) => name.as_str(),
            Expr::Literal(_) => "literal",
            Expr::Mul(lhs, _) | Expr::Gt(lhs, _) => lhs.output_name(),
            Expr::FillNull(inner, _) | Expr::Mean(inner) => inner.output_name(),
        }
    }

    pub(crate) fn evaluate(&self, frame: &ColumnFrame) -> Result<Arc<Series>> {
        match self {
            Expr::Column(name) => frame.column_arc(name).cloned(),
            Expr::Literal(value) => {
                let data = match value {
                    Scalar::Int(i) => ColumnData::Int(vec![Some(*i)]),
                    Scalar::Float(f) => ColumnData::Float(vec![Some(*f)]),
                };
                Ok(Arc::new(Series::new("literal", data)))
            }
            Expr::Mul(lhs, rhs) => {
                let (l, r) = (lhs.evaluate(frame)?, rhs.evaluate(frame)?);
                let data = multiply(&l.data, &r.data)?;
                Ok(Arc::new(Series::new(self.output_name(), data)))
            }
            Expr::Gt(lhs, rhs) => {
                let (l, r) = (lhs.evaluate(frame)?, rhs.evaluate(frame)?);
                let data = greater_than(&l.data, &r.data)?;
                Ok(Arc::new(Series::new(self.output_name(), data)))
            }
            Expr::FillNull(inner, value) => {
                let series = inner.evaluate(frame)?;
                let data = fill_null(&series.data, *value)?;
                Ok(Arc::new(Series::new(self.output_name(), data)))
            }
            Expr::Mean(inner) => {
                let series = inner.evaluate(frame)?;
                let all: Vec<usize> = (0..series.len()).collect();
                let value = mean_of(&series.data, &all)?;
                Ok(Arc::new(Series::new(self.output_name(), ColumnData::Float(vec![value]))))
            }
            Expr::Alias(inner, name) => {
                let series = Arc::unwrap_or_clone(inner.evaluate(frame)?);
                Ok(Arc::new(series.renamed(name)))
            }
        }
    }
}

fn binary_len(lhs: &ColumnData, rhs: &ColumnData) -> Result<usize> {
    match (lhs.len(), rhs.len()) {
        (a, b) if a == b => Ok(a),
        (1, b) => Ok(b),
        (a, 1) => Ok(a),
        (a, b) => Err(BenchError::type_mismatch(format!(
            "Cannot combine series of length {} and {}",
            a, b
        ))),
    }
}

fn require_numeric(data: &ColumnData, op: &str) -> Result<()> {
    if data.is_numeric() {
        Ok(())
    } else {
        Err(BenchError::type_mismatch(format!(
            "Operation '{}' is not defined for {} series",
            op,
            data.dtype()
        )))
    }
}

fn multiply(lhs: &ColumnData, rhs: &ColumnData) -> Result<ColumnData> {
    require_numeric(lhs, "mul")?;
    require_numeric(rhs, "mul")?;
    let len = binary_len(lhs, rhs)?;

    if let (ColumnData::Int(a), ColumnData::Int(b)) = (lhs, rhs) {
        let (a, b) = (a.as_slice(), b.as_slice());
        let at = |v: &[Option<i64>], i: usize| if v.len() == 1 { v[0] } else { v[i] };
        let out = (0..len)
            .into_par_iter()
            .map(|i| match (at(a, i), at(b, i)) {
                (Some(x), Some(y)) => Some(x.wrapping_mul(y)),
                _ => None,
            })
            .collect();
        return Ok(ColumnData::Int(out));
    }

    let out = (0..len)
        .into_par_iter()
        .map(|i| match (lhs.float_at(i), rhs.float_at(i)) {
            (Some(x), Some(y)) => Some(x * y),
            _ => None,
        })
        .collect();
    Ok(ColumnData::Float(out))
}

fn greater_than(lhs: &ColumnData, rhs: &ColumnData) -> Result<ColumnData> {
    require_numeric(lhs, "gt")?;
    require_numeric(rhs, "gt")?;
    let len = binary_len(lhs, rhs)?;

    let out = (0..len)
        .into_par_iter()
        .map(|i| match (lhs.float_at(i), rhs.float_at(i)) {
            (Some(x), Some(y)) => Some(x > y),
            _ => None,
        })
        .collect();
    Ok(ColumnData::Bool(out))
}

fn fill_null(data: &ColumnData, value: Scalar) -> Result<ColumnData> {
    Ok(match (data, value) {
        (ColumnData::Int(v), Scalar::Int(fill)) => {
            ColumnData::Int(v.par_iter().map(|x| Some(x.unwrap_or(fill))).collect())
        }
        (ColumnData::Int(v), Scalar::Float(fill)) => ColumnData::Float(
            v.par_iter().map(|x| Some(x.map_or(fill, |i| i as f64))).collect(),
        ),
        (ColumnData::Float(v), fill) => {
            let fill = match fill {
                Scalar::Int(i) => i as f64,
                Scalar::Float(f) => f,
            };
            ColumnData::Float(v.par_iter().map(|x| Some(x.unwrap_or(fill))).collect())
        }
        (other, _) => {
            return Err(BenchError::type_mismatch(format!(
                "Cannot fill nulls of a {} series with a number",
                other.dtype()
            )))
        }
    })
}

/// Mean of the non-null values at `rows`; None when there are none
fn mean_of(data: &ColumnData, rows: &[usize]) -> Result<Option<f64>> {
    require_numeric(data, "mean")?;
    let (sum, count) = rows
        .iter()
        .filter_map(|&i| data.float_at(i))
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    Ok(if count == 0 { None } else { Some(sum / count as f64) })
}

fn infer_column(values: Vec<Option<String>>) -> ColumnData {
    let ints: std::result::Result<Vec<Option<i64>>, _> =
        values.iter().map(|v| v.as_deref().map(str::parse::<i64>).transpose()).collect();
    if let Ok(ints) = ints {
        return ColumnData::Int(ints);
    }

    let floats: std::result::Result<Vec<Option<f64>>, _> =
        values.iter().map(|v| v.as_deref().map(str::parse::<f64>).transpose()).collect();
    if let Ok(floats) = floats {
        return ColumnData::Float(floats);
    }

    ColumnData::Text(values)
}

#[derive(Debug, Clone, Default)]
pub struct ColumnFrame {
    columns: Vec<Arc<Series>>,
}

impl ColumnFrame {
    pub fn new(columns: Vec<Series>) -> Result<Self> {
        if let Some(first) = columns.first() {
            if let Some(bad) = columns.iter().find(|s| s.len() != first.len()) {
                return Err(BenchError::type_mismatch(format!(
                    "Series '{}' has length {}, expected {}",
                    bad.name,
                    bad.len(),
                    first.len()
                )));
            }
        }
        Ok(Self { columns: columns.into_iter().map(Arc::new).collect() })
    }

    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| BenchError::from(e).with_context(path.display().to_string()))?;
        Self::from_reader(file).map_err(|e| e.with_context(path.display().to_string()))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let names: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

        let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); names.len()];
        let mut record = csv::ByteRecord::new();
        while rdr.read_byte_record(&mut record)? {
            for (column, field) in raw.iter_mut().zip(record.iter()) {
                column.push(if field.is_empty() {
                    None
                } else {
                    Some(String::from_utf8_lossy(field).into_owned())
                });
            }
        }

        // Type inference is per column, so columns parse in parallel
        let columns = names
            .into_par_iter()
            .zip(raw.into_par_iter())
            .map(|(name, values)| Arc::new(Series::new(name, infer_column(values))))
            .collect();

        Ok(Self { columns })
    }

    pub fn height(&self) -> usize {
        self.columns.first().map_or(0, |s| s.len())
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|s| s.name.clone()).collect()
    }

    fn column_arc(&self, name: &str) -> Result<&Arc<Series>> {
        self.columns
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| BenchError::missing_column(name, &self.column_names()))
    }

    pub fn column(&self, name: &str) -> Result<&Series> {
        self.column_arc(name).map(|s| s.as_ref())
    }

    pub fn select(&self, names: &[&str]) -> Result<ColumnFrame> {
        let columns = names
            .iter()
            .map(|name| self.column_arc(name).cloned())
            .collect::<Result<Vec<_>>>()?;
        Ok(ColumnFrame { columns })
    }

    /// Keep rows where `predicate` is true; null counts as false
    pub fn filter(&self, predicate: &Expr) -> Result<ColumnFrame> {
        let mask_series = predicate.evaluate(self)?;
        let mask: Vec<bool> = match &mask_series.data {
            ColumnData::Bool(v) if v.len() == self.height() => {
                v.iter().map(|b| *b == Some(true)).collect()
            }
            other => {
                return Err(BenchError::type_mismatch(format!(
                    "Filter predicate must be a bool series of length {}, got {} of length {}",
                    self.height(),
                    other.dtype(),
                    other.len()
                )))
            }
        };

        let columns = self
            .columns
            .par_iter()
            .map(|s| Arc::new(Series::new(s.name.clone(), s.data.filter(&mask))))
            .collect();
        Ok(ColumnFrame { columns })
    }

    /// New frame with each expression's output added, replacing columns of
    /// the same name in place
    pub fn with_columns(&self, exprs: &[Expr]) -> Result<ColumnFrame> {
        let evaluated = exprs
            .par_iter()
            .map(|e| e.evaluate(self))
            .collect::<Result<Vec<_>>>()?;

        let height = self.height();
        let mut columns = self.columns.clone();
        for series in evaluated {
            let series = if series.len() == 1 && height != 1 {
                Arc::new(Series::new(series.name.clone(), series.data.broadcast(height)))
            } else if series.len() != height && !columns.is_empty() {
                return Err(BenchError::type_mismatch(format!(
                    "Expression '{}' produced {} rows, frame has {}",
                    series.name,
                    series.len(),
                    height
                )));
            } else {
                series
            };

            match columns.iter().position(|c| c.name == series.name) {
                Some(idx) => columns[idx] = series,
                None => columns.push(series),
            }
        }
        Ok(ColumnFrame { columns })
    }

    pub fn group_by(&self, key: &str) -> GroupBy<'_> {
        GroupBy { frame: self, key: key.to_string() }
    }

    pub fn lazy(&self) -> LazyFrame {
        LazyFrame::new(self.clone())
    }
}

/// Pending group-by; groups appear in order of first occurrence
pub struct GroupBy<'a> {
    frame: &'a ColumnFrame,
    key: String,
}

impl GroupBy<'_> {
    pub fn agg(&self, exprs: &[Expr]) -> Result<ColumnFrame> {
        let keys = self.frame.column(&self.key)?;

        let mut index: AHashMap<GroupKey, usize> = AHashMap::new();
        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut first_rows: Vec<usize> = Vec::new();
        for row in 0..keys.len() {
            let next = groups.len();
            let group = *index.entry(keys.data.group_key(row)).or_insert(next);
            if group == next {
                groups.push(Vec::new());
                first_rows.push(row);
            }
            groups[group].push(row);
        }

        let mut columns = vec![Series::new(self.key.clone(), keys.data.take(&first_rows))];
        for expr in exprs {
            let (input, name) = split_mean(expr)?;
            let values = input.evaluate(self.frame)?;
            require_numeric(&values.data, "mean")?;
            let means = groups
                .par_iter()
                .map(|rows| mean_of(&values.data, rows))
                .collect::<Result<Vec<_>>>()?;
            columns.push(Series::new(name, ColumnData::Float(means)));
        }

        ColumnFrame::new(columns)
    }
}

fn split_mean(expr: &Expr) -> Result<(&Expr, String)> {
    match expr {
        Expr::Mean(inner) => Ok((&**inner, inner.output_name().to_string())),
        Expr::Alias(inner, name) => match inner.as_ref() {
            Expr::Mean(input) => Ok((&**input, name.clone())),
            _ => split_mean(inner).map(|(input, _)| (input, name.clone())),
        },
        other => Err(BenchError::type_mismatch(format!(
            "Only mean aggregations are supported, got {:?}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = "\
Date,Open,Low,Close,Volume
2024-01-02,10.5,4.0,11.0,100
2024-01-03,11.0,6.5,,200
2024-01-04,12.5,6.5,13.0,300
2024-01-05,13.0,8.0,12.0,400
";

    fn frame() -> ColumnFrame {
        ColumnFrame::from_reader(FIXTURE.as_bytes()).unwrap()
    }

    #[test]
    fn test_read_infers_types() {
        let df = frame();
        assert_eq!(df.height(), 4);
        assert_eq!(df.column("Date").unwrap().data().dtype(), "str");
        assert_eq!(df.column("Low").unwrap().data().dtype(), "f64");
        assert_eq!(df.column("Volume").unwrap().data().dtype(), "i64");
        assert_eq!(df.column("Close").unwrap().null_count(), 1);
    }

    #[test]
    fn test_select_shares_columns() {
        let df = frame();
        let selected = df.select(&["Date", "Volume"]).unwrap();
        assert_eq!(selected.column_names(), vec!["Date", "Volume"]);
        assert!(Arc::ptr_eq(
            selected.column_arc("Volume").unwrap(),
            df.column_arc("Volume").unwrap()
        ));
    }

    #[test]
    fn test_filter_gt() {
        let df = frame().filter(&col("Low").gt(5)).unwrap();
        assert_eq!(df.height(), 3);
        assert_eq!(df.column("Volume").unwrap().get(0), Some(Cell::Int(200)));
    }

    #[test]
    fn test_filter_rejects_numeric_predicate() {
        let err = frame().filter(&col("Low")).unwrap_err();
        assert_eq!(err.kind, crate::errors::ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_with_columns_alias() {
        let df = frame().with_columns(&[(col("Low") * 10).alias("new_col")]).unwrap();
        assert_eq!(df.width(), 6);
        assert_eq!(df.column("new_col").unwrap().get(3), Some(Cell::Float(80.0)));
        assert_eq!(df.column("Low").unwrap().get(3), Some(Cell::Float(8.0)));
    }

    #[test]
    fn test_with_columns_int_stays_int() {
        let df = frame().with_columns(&[col("Volume") * 10]).unwrap();
        assert_eq!(df.width(), 5);
        assert_eq!(df.column("Volume").unwrap().get(0), Some(Cell::Int(1000)));
    }

    #[test]
    fn test_with_columns_broadcasts_mean() {
        let df = frame().with_columns(&[mean("Volume").alias("avg_volume")]).unwrap();
        assert_eq!(df.column("avg_volume").unwrap().get(2), Some(Cell::Float(250.0)));
    }

    #[test]
    fn test_group_by_mean() {
        let out = frame().group_by("Low").agg(&[mean("Close")]).unwrap();
        assert_eq!(out.column_names(), vec!["Low", "Close"]);
        assert_eq!(out.height(), 3);
        let closes = out.column("Close").unwrap();
        assert_eq!(closes.get(0), Some(Cell::Float(11.0)));
        assert_eq!(closes.get(1), Some(Cell::Float(13.0)));
        assert_eq!(closes.get(2), Some(Cell::Float(12.0)));
    }

    #[test]
    fn test_group_by_rejects_non_mean() {
        assert!(frame().group_by("Low").agg(&[col("Close")]).is_err());
    }

    #[test]
    fn test_fill_null() {
        let df = frame().with_columns(&[col("Close").fill_null(-999)]).unwrap();
        let close = df.column("Close").unwrap();
        assert_eq!(close.null_count(), 0);
        assert_eq!(close.get(1), Some(Cell::Float(-999.0)));
    }

    #[test]
    fn test_fill_null_on_text_fails() {
        assert!(frame().with_columns(&[col("Date").fill_null(0)]).is_err());
    }

    #[test]
    fn test_missing_column_error() {
        let err = frame().with_columns(&[col("low") * 10]).unwrap_err();
        assert_eq!(err.suggestion.as_deref(), Some("Low"));
    }
}
