// Integration tests for the Frame Duel harness
//
// These tests drive the public library API end to end. Tests cover:
// - A full suite run over generated data (reports, charts, JSON export)
// - Timing of sleep statements
// - Slowest/fastest selection and the text report
// - Agreement between the row and column frames on the suite operations

use frame_duel::benchmarks::suite::{self, VARIANT_ORDER};
use frame_duel::benchmarks::{measure, summarize, BenchmarkRunner, Report, Reporter, SampleSet, TestCase, Variant};
use frame_duel::config::BenchConfig;
use frame_duel::data;
use frame_duel::frame::{col, mean, Cell, ColumnFrame, ReadEngine, RowFrame};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

fn write_prices(dir: &Path) -> PathBuf {
    let path = dir.join("data.csv");
    let mut rows = data::generate_default(data::DEFAULT_SEED).unwrap();
    // Make sure the null-fill case has something to fill
    rows[5].close = None;
    data::write_csv(&rows, &path).unwrap();
    path
}

fn quiet_config(dir: &Path, data_path: PathBuf) -> BenchConfig {
    BenchConfig {
        repeats: 2,
        iterations: 1,
        data_path,
        output_dir: dir.join("images"),
        show: false,
        terminal_chart: false,
        only: None,
        json_output: None,
    }
}

#[test]
fn test_full_suite_writes_one_chart_per_case() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = write_prices(dir.path());
    let mut config = quiet_config(dir.path(), data_path.clone());
    config.json_output = Some(dir.path().join("reports.json"));

    let suite = suite::default_suite(&data_path);
    let reports = BenchmarkRunner::new(config).run(&suite).unwrap();
    assert_eq!(reports.len(), 8);

    for (i, report) in reports.iter().enumerate() {
        assert_eq!(report.index, i + 1);
        let labels: Vec<&str> = report.results.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, VARIANT_ORDER);
        assert!(report.ratio >= 1.0);
    }

    let mut charts: Vec<String> = std::fs::read_dir(dir.path().join("images"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    charts.sort();
    let expected: Vec<String> = (1..=8).map(|i| format!("test_{:02}.png", i)).collect();
    assert_eq!(charts, expected);

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("reports.json")).unwrap()).unwrap();
    assert_eq!(json.as_array().map(|a| a.len()), Some(8));
    assert_eq!(json[3]["test_name"], "Filtering");
}

#[test]
fn test_only_filter_selects_cases() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = write_prices(dir.path());
    let mut config = quiet_config(dir.path(), data_path.clone());
    config.only = Some("^Selecting".to_string());

    let reports = BenchmarkRunner::new(config).run(&suite::default_suite(&data_path)).unwrap();
    let indexes: Vec<usize> = reports.iter().map(|r| r.index).collect();
    assert_eq!(indexes, vec![2, 3]);
    assert!(dir.path().join("images/test_02.png").exists());
    assert!(!dir.path().join("images/test_01.png").exists());
}

#[test]
fn test_missing_data_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.csv");
    let config = quiet_config(dir.path(), missing.clone());

    assert!(BenchmarkRunner::new(config).run(&suite::default_suite(&missing)).is_err());
    assert!(!dir.path().join("images/test_01.png").exists());
}

#[test]
fn test_measure_sleep_samples() {
    let samples = measure(
        || Ok(()),
        |_| {
            thread::sleep(Duration::from_millis(2));
            Ok(())
        },
        5,
        10,
    )
    .unwrap();

    assert_eq!(samples.len(), 5);
    for s in samples.as_slice() {
        assert!(*s >= 0.020, "sample {} shorter than 10 sleeps", s);
    }
}

#[test]
fn test_slowest_and_fastest_from_sleepers() {
    let sleeper = |label: &str, millis: u64| {
        Variant::new(label, || Ok(()), move |_| {
            thread::sleep(Duration::from_millis(millis));
            Ok(())
        })
    };
    let case = TestCase::new(1, "Sleepers")
        .variant(sleeper("A", 1))
        .variant(sleeper("B", 6))
        .variant(sleeper("C", 0));

    let dir = tempfile::tempdir().unwrap();
    let config = quiet_config(dir.path(), PathBuf::from("unused.csv"));
    let report = BenchmarkRunner::new(config).evaluate(&case).unwrap();
    assert_eq!(report.slowest().label, "B");
    assert_eq!(report.fastest().label, "C");
}

#[test]
fn test_text_report_for_known_means() {
    let sets: Vec<(String, SampleSet)> = [1.0, 2.0, 3.0, 4.0]
        .iter()
        .zip(VARIANT_ORDER)
        .map(|(m, label)| (label.to_string(), SampleSet::from(vec![*m; 5])))
        .collect();
    let report: Report = summarize("Group and aggregate", 7, sets).unwrap();

    let text = Reporter::format_text(&report);
    assert!(text.starts_with("| Test 07: Group and aggregate\n"));
    assert!(text.contains("Average duration [Rows]: 1.000 s, Std: 0.000 s"));
    assert!(text.contains("--> Slowest: Columns is 4.00 times slower than the fastest (Rows)"));
}

#[test]
fn test_frames_agree_on_suite_operations() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_prices(dir.path());
    let rows = RowFrame::read_csv(&path, ReadEngine::Bytes).unwrap();
    let columns = ColumnFrame::read_csv(&path).unwrap();

    let filtered_rows = rows.query_gt("Low", 150.0).unwrap();
    let filtered_columns = columns.filter(&col("Low").gt(150)).unwrap();
    assert_eq!(filtered_rows.height(), filtered_columns.height());

    let grouped_rows = rows.groupby_mean("Low", "Close").unwrap();
    let grouped_columns = columns.group_by("Low").agg(&[mean("Close")]).unwrap();
    assert_eq!(grouped_rows.len(), grouped_columns.height());

    let filled = rows.fillna("Close", Cell::Int(-999)).unwrap();
    assert!(filled.iter().all(|c| !c.is_null()));
    let filled_columns = columns.with_columns(&[col("Close").fill_null(-999)]).unwrap();
    assert_eq!(filled_columns.column("Close").unwrap().null_count(), 0);
}

#[test]
fn test_frames_group_mixed_numeric_keys_alike() {
    let csv = "Low,Close\n5,1.0\n5.0,3.0\n7,2.0\n";
    for engine in [ReadEngine::Default, ReadEngine::Bytes, ReadEngine::Serde] {
        let rows = RowFrame::from_reader(csv.as_bytes(), engine).unwrap();
        let grouped_rows = rows.groupby_mean("Low", "Close").unwrap();
        assert_eq!(grouped_rows, vec![(Cell::Int(5), 2.0), (Cell::Int(7), 2.0)]);
    }

    let columns = ColumnFrame::from_reader(csv.as_bytes()).unwrap();
    let grouped_columns = columns.group_by("Low").agg(&[mean("Close")]).unwrap();
    assert_eq!(grouped_columns.height(), 2);
}
