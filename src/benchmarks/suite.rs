// The default test suite
//
// Eight fixed cases over the price CSV. Each case times the same operation
// on the row frame (once per read engine, the engine only affects how the
// setup loads the frame) and on the column frame.

use crate::benchmarks::{TestCase, Variant};
use crate::errors::Result;
use crate::frame::{col, mean, Cell, ColumnFrame, ReadEngine, RowFrame};
use std::path::Path;

pub const ROWS: &str = "Rows";
pub const ROWS_BYTES: &str = "Rows (bytes engine)";
pub const ROWS_SERDE: &str = "Rows (serde engine)";
pub const COLUMNS: &str = "Columns";

/// Display order of the variants in every default case
pub const VARIANT_ORDER: [&str; 4] = [ROWS, ROWS_BYTES, ROWS_SERDE, COLUMNS];

const ROW_ENGINES: [(&str, ReadEngine); 3] = [
    (ROWS, ReadEngine::Default),
    (ROWS_BYTES, ReadEngine::Bytes),
    (ROWS_SERDE, ReadEngine::Serde),
];

pub fn default_suite(data: &Path) -> Vec<TestCase> {
    vec![
        read_case(1, "Read a single CSV file", data),
        frame_case(2, "Selecting columns (v1)", data, |df| df.select(&["Open", "High"]), |df| {
            df.select(&["Open", "High"])
        }),
        frame_case(3, "Selecting columns (v2)", data, |df| df.select(&["Date", "Volume"]), |df| {
            df.select(&["Date", "Volume"])
        }),
        frame_case(4, "Filtering", data, |df| df.query_gt("Low", 5.0), |df| {
            df.filter(&col("Low").gt(5))
        }),
        frame_case(5, "Create a new column (v1)", data, assign_new_col, |df| {
            df.with_columns(&[(col("Low") * 10).alias("new_col")])
        }),
        // The lazy variant only builds the plan; nothing is collected
        frame_case(6, "Create a new column (v2)", data, assign_new_col, |df| {
            Ok(df.lazy().with_columns(vec![(col("Low") * 10).alias("new_col")]))
        }),
        frame_case(7, "Group and aggregate", data, |df| df.groupby_mean("Low", "Close"), |df| {
            df.group_by("Low").agg(&[mean("Close")])
        }),
        frame_case(8, "Fill missing data", data, |df| df.fillna("Close", Cell::Int(-999)), |df| {
            df.with_columns(&[col("Close").fill_null(-999)])
        }),
    ]
}

fn assign_new_col(df: &mut RowFrame) -> Result<()> {
    let values = df.mul_scalar("Low", Cell::Int(10))?;
    df.assign("new_col", values)
}

/// Reading is the timed statement itself, so setup binds nothing
fn read_case(index: usize, name: &str, data: &Path) -> TestCase {
    let mut case = TestCase::new(index, name);
    for (label, engine) in ROW_ENGINES {
        let path = data.to_path_buf();
        case = case.variant(Variant::new(label, || Ok(()), move |_| RowFrame::read_csv(&path, engine)));
    }
    let path = data.to_path_buf();
    case.variant(Variant::new(COLUMNS, || Ok(()), move |_| ColumnFrame::read_csv(&path)))
}

/// Setup loads a fresh frame each repeat; the statement runs against it
fn frame_case<R1: 'static, R2: 'static>(
    index: usize,
    name: &str,
    data: &Path,
    rows: fn(&mut RowFrame) -> Result<R1>,
    columns: fn(&mut ColumnFrame) -> Result<R2>,
) -> TestCase {
    let mut case = TestCase::new(index, name);
    for (label, engine) in ROW_ENGINES {
        let path = data.to_path_buf();
        case = case.variant(Variant::new(label, move || RowFrame::read_csv(&path, engine), rows));
    }
    let path = data.to_path_buf();
    case.variant(Variant::new(COLUMNS, move || ColumnFrame::read_csv(&path), columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PRICES: &str = "\
Date,Open,High,Low,Close,Adj Close,Volume,Ticker
2024-01-02,250.08,251.25,244.41,248.42,248.42,104654200,tsla
2024-01-03,244.98,245.68,236.32,,238.45,121082600,tsla
2024-01-02,373.86,375.90,366.77,370.87,368.27,25258600,msft
2024-01-03,369.01,373.26,366.77,370.60,368.00,23083500,msft
";

    fn fixture() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PRICES.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_suite_shape() {
        let suite = default_suite(Path::new("data.csv"));
        assert_eq!(suite.len(), 8);
        for (i, case) in suite.iter().enumerate() {
            assert_eq!(case.index(), i + 1);
            assert_eq!(case.labels(), VARIANT_ORDER.map(String::from).as_slice());
        }
        assert_eq!(suite[0].name(), "Read a single CSV file");
        assert_eq!(suite[7].name(), "Fill missing data");
    }

    #[test]
    fn test_every_case_runs_on_fixture() {
        let file = fixture();
        for case in default_suite(file.path()) {
            let sets = case.evaluate(2, 1).unwrap();
            assert_eq!(sets.len(), 4);
            assert!(sets.iter().all(|(_, s)| s.len() == 2));
        }
    }

    #[test]
    fn test_missing_file_fails_setup() {
        let suite = default_suite(Path::new("/nonexistent/prices.csv"));
        assert!(suite[1].evaluate(1, 1).is_err());
    }
}
