// File: src/frame/rows.rs
//
// Row-oriented frame: every record is a Vec<Cell>.
// Operations mirror the classic "index by column list / query / assign /
// groupby / fillna" style and return new values instead of views.

use super::{Cell, GroupKey};
use crate::errors::{BenchError, Result};
use ahash::AHashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// CSV parsing strategy used when loading a RowFrame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadEngine {
    /// Allocates a fresh StringRecord per row
    Default,
    /// Reuses one ByteRecord buffer for the whole file
    Bytes,
    /// Deserializes each record through serde
    Serde,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowFrame {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl RowFrame {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        if let Some(pos) = rows.iter().position(|row| row.len() != columns.len()) {
            return Err(BenchError::type_mismatch(format!(
                "Row {} has {} fields, expected {}",
                pos,
                rows[pos].len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    pub fn read_csv(path: impl AsRef<Path>, engine: ReadEngine) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| BenchError::from(e).with_context(path.display().to_string()))?;
        Self::from_reader(file, engine)
            .map_err(|e| e.with_context(path.display().to_string()))
    }

    pub fn from_reader<R: Read>(reader: R, engine: ReadEngine) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let columns: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

        let rows = match engine {
            ReadEngine::Default => read_string_records(&mut rdr)?,
            ReadEngine::Bytes => read_byte_records(&mut rdr)?,
            ReadEngine::Serde => read_serde_records(&mut rdr)?,
        };

        Self::new(columns, rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| BenchError::missing_column(name, &self.columns))
    }

    /// Copy of one column's values, in row order
    pub fn column(&self, name: &str) -> Result<Vec<Cell>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| row[idx].clone()).collect())
    }

    /// New frame containing only `names`, in the given order
    pub fn select(&self, names: &[&str]) -> Result<RowFrame> {
        let indices = names
            .iter()
            .map(|name| self.column_index(name))
            .collect::<Result<Vec<_>>>()?;

        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();

        Ok(RowFrame { columns: names.iter().map(|n| n.to_string()).collect(), rows })
    }

    /// Rows where `column > threshold`; null and text cells never match
    pub fn query_gt(&self, column: &str, threshold: f64) -> Result<RowFrame> {
        let idx = self.column_index(column)?;
        let rows = self
            .rows
            .iter()
            .filter(|row| row[idx].as_f64().is_some_and(|v| v > threshold))
            .cloned()
            .collect();

        Ok(RowFrame { columns: self.columns.clone(), rows })
    }

    /// Element-wise `column * factor`; integers stay integers when the
    /// factor is integral
    pub fn mul_scalar(&self, column: &str, factor: Cell) -> Result<Vec<Cell>> {
        let idx = self.column_index(column)?;
        self.rows.iter().map(|row| mul_cell(&row[idx], &factor)).collect()
    }

    /// Insert a column at the end, or overwrite it if the name exists
    pub fn assign(&mut self, name: &str, values: Vec<Cell>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(BenchError::type_mismatch(format!(
                "Cannot assign {} values to a frame of {} rows",
                values.len(),
                self.rows.len()
            )));
        }

        match self.columns.iter().position(|c| c == name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }

    /// Mean of `value` per distinct `key`, groups ordered by key. Each group
    /// is labelled with the first key cell seen for it.
    pub fn groupby_mean(&self, key: &str, value: &str) -> Result<Vec<(Cell, f64)>> {
        let key_idx = self.column_index(key)?;
        let value_idx = self.column_index(value)?;

        let mut groups: AHashMap<GroupKey, (Cell, f64, usize)> = AHashMap::new();
        for row in &self.rows {
            let key_cell = &row[key_idx];
            if key_cell.is_null() {
                continue;
            }
            let entry = groups
                .entry(GroupKey::from(key_cell))
                .or_insert_with(|| (key_cell.clone(), 0.0, 0));
            if let Some(v) = row[value_idx].as_f64() {
                entry.1 += v;
                entry.2 += 1;
            }
        }

        let mut out: Vec<(Cell, f64)> = groups
            .into_values()
            .map(|(key, sum, count)| {
                let mean = if count == 0 { f64::NAN } else { sum / count as f64 };
                (key, mean)
            })
            .collect();
        out.sort_by(|a, b| compare_cells(&a.0, &b.0));
        Ok(out)
    }

    /// Copy of `column` with nulls replaced by `value`
    pub fn fillna(&self, column: &str, value: Cell) -> Result<Vec<Cell>> {
        let idx = self.column_index(column)?;
        Ok(self
            .rows
            .iter()
            .map(|row| if row[idx].is_null() { value.clone() } else { row[idx].clone() })
            .collect())
    }
}

fn read_string_records<R: Read>(rdr: &mut csv::Reader<R>) -> Result<Vec<Vec<Cell>>> {
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(Cell::parse).collect());
    }
    Ok(rows)
}

fn read_byte_records<R: Read>(rdr: &mut csv::Reader<R>) -> Result<Vec<Vec<Cell>>> {
    let mut rows = Vec::new();
    let mut record = csv::ByteRecord::new();
    while rdr.read_byte_record(&mut record)? {
        rows.push(record.iter().map(Cell::parse_bytes).collect());
    }
    Ok(rows)
}

fn read_serde_records<R: Read>(rdr: &mut csv::Reader<R>) -> Result<Vec<Vec<Cell>>> {
    let mut rows = Vec::new();
    // Fields come through serde as strings so typing matches the other engines
    for record in rdr.deserialize::<Vec<Option<String>>>() {
        rows.push(
            record?
                .into_iter()
                .map(|field| field.map_or(Cell::Null, |s| Cell::parse(&s)))
                .collect(),
        );
    }
    Ok(rows)
}

fn mul_cell(cell: &Cell, factor: &Cell) -> Result<Cell> {
    Ok(match (cell, factor) {
        (Cell::Null, _) => Cell::Null,
        (Cell::Int(a), Cell::Int(b)) => Cell::Int(a.wrapping_mul(*b)),
        (Cell::Int(a), Cell::Float(b)) => Cell::Float(*a as f64 * b),
        (Cell::Float(a), Cell::Int(b)) => Cell::Float(a * *b as f64),
        (Cell::Float(a), Cell::Float(b)) => Cell::Float(a * b),
        (other, _) => {
            return Err(BenchError::type_mismatch(format!(
                "Cannot multiply {:?} by {:?}",
                other, factor
            )))
        }
    })
}

fn compare_cells(a: &Cell, b: &Cell) -> std::cmp::Ordering {
    match (a, b) {
        (Cell::Text(x), Cell::Text(y)) => x.cmp(y),
        _ => {
            let x = a.as_f64().unwrap_or(f64::NAN);
            let y = b.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
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

    fn frame(engine: ReadEngine) -> RowFrame {
        RowFrame::from_reader(FIXTURE.as_bytes(), engine).unwrap()
    }

    #[test]
    fn test_engines_agree() {
        let default = frame(ReadEngine::Default);
        assert_eq!(default.height(), 4);
        assert_eq!(default.width(), 5);
        assert_eq!(frame(ReadEngine::Bytes), default);
        assert_eq!(frame(ReadEngine::Serde), default);
    }

    #[test]
    fn test_empty_field_is_null() {
        let df = frame(ReadEngine::Serde);
        assert_eq!(df.get(1, "Close"), Some(&Cell::Null));
        assert_eq!(df.get(0, "Volume"), Some(&Cell::Int(100)));
    }

    #[test]
    fn test_select_keeps_requested_order() {
        let df = frame(ReadEngine::Default).select(&["Volume", "Date"]).unwrap();
        assert_eq!(df.columns(), &["Volume".to_string(), "Date".to_string()]);
        assert_eq!(df.get(2, "Volume"), Some(&Cell::Int(300)));
    }

    #[test]
    fn test_select_missing_column() {
        let err = frame(ReadEngine::Default).select(&["Hgh"]).unwrap_err();
        assert_eq!(err.kind, crate::errors::ErrorKind::MissingColumn);
    }

    #[test]
    fn test_query_gt() {
        let df = frame(ReadEngine::Default).query_gt("Low", 5.0).unwrap();
        assert_eq!(df.height(), 3);
        assert_eq!(df.get(0, "Date"), Some(&Cell::Text("2024-01-03".to_string())));
    }

    #[test]
    fn test_assign_new_column() {
        let mut df = frame(ReadEngine::Bytes);
        let scaled = df.mul_scalar("Low", Cell::Int(10)).unwrap();
        df.assign("new_col", scaled).unwrap();
        assert_eq!(df.width(), 6);
        assert_eq!(df.get(0, "new_col"), Some(&Cell::Float(40.0)));

        let scaled = df.mul_scalar("Volume", Cell::Int(10)).unwrap();
        df.assign("new_col", scaled).unwrap();
        assert_eq!(df.width(), 6);
        assert_eq!(df.get(3, "new_col"), Some(&Cell::Int(4000)));
    }

    #[test]
    fn test_assign_length_mismatch() {
        let mut df = frame(ReadEngine::Default);
        assert!(df.assign("x", vec![Cell::Null]).is_err());
    }

    #[test]
    fn test_groupby_mean_skips_nulls() {
        let groups = frame(ReadEngine::Default).groupby_mean("Low", "Close").unwrap();
        assert_eq!(
            groups,
            vec![(Cell::Float(4.0), 11.0), (Cell::Float(6.5), 13.0), (Cell::Float(8.0), 12.0)]
        );
    }

    #[test]
    fn test_groupby_mean_merges_int_and_float_keys() {
        let df = RowFrame::from_reader("Low,Close\n5,1.0\n5.0,3.0\n6.5,2.0\n".as_bytes(), ReadEngine::Default)
            .unwrap();
        let groups = df.groupby_mean("Low", "Close").unwrap();
        assert_eq!(groups, vec![(Cell::Int(5), 2.0), (Cell::Float(6.5), 2.0)]);
    }

    #[test]
    fn test_engines_agree_on_bool_and_wide_fields() {
        let csv = "Low,Flag,Big\n5.0,true,18446744073709551615\n6.0,false,1\n";
        let default = RowFrame::from_reader(csv.as_bytes(), ReadEngine::Default).unwrap();
        assert_eq!(default.get(0, "Flag"), Some(&Cell::Text("true".to_string())));
        assert_eq!(RowFrame::from_reader(csv.as_bytes(), ReadEngine::Bytes).unwrap(), default);
        assert_eq!(RowFrame::from_reader(csv.as_bytes(), ReadEngine::Serde).unwrap(), default);
    }

    #[test]
    fn test_fillna() {
        let filled = frame(ReadEngine::Default).fillna("Close", Cell::Int(-999)).unwrap();
        assert_eq!(filled[1], Cell::Int(-999));
        assert_eq!(filled[0], Cell::Float(11.0));
    }
}
