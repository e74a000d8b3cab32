//! Integration tests for exporting normalized tables and metrics.

use chrono::{NaiveDate, NaiveDateTime};
use normair_features::TimeSeries;
use normair_features::schema::{DATE, SENSOR_ID, VALUE};
use normair_model::TimeSeriesMetrics;
use normair_output::{ExportFormat, Exporter, MetricsTable, NormalizedRecord};
use polars::prelude::*;

fn days(n: u32) -> Vec<NaiveDateTime> {
    (1..=n)
        .map(|d| {
            NaiveDate::from_ymd_opt(2022, 5, d)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        })
        .collect()
}

#[test]
fn test_normalized_frame_to_csv_file() {
    let series = TimeSeries::new(days(3), vec![12.5, 14.0, 13.25]).unwrap();
    let mut frame = series.to_frame(DATE, VALUE).unwrap();
    frame
        .with_column(Column::new(SENSOR_ID.into(), vec!["6328"; 3]))
        .unwrap();

    let records = NormalizedRecord::from_frame(&frame).unwrap();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.sensor == "6328"));

    let path = std::env::temp_dir().join("normair_export_test.csv");
    records.export_to_file(&path, ExportFormat::Csv).unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(content.lines().count(), 4);
    assert!(content.starts_with("data,valore,idsensore\n"));
    assert!(content.contains("2022-05-03T00:00:00,13.25,6328"));
}

#[test]
fn test_model_comparison_workflow() {
    let actual = TimeSeries::new(days(4), vec![10.0, 20.0, 30.0, 40.0]).unwrap();
    let close = TimeSeries::new(days(4), vec![11.0, 19.0, 31.0, 39.0]).unwrap();
    let far = TimeSeries::new(days(4), vec![15.0, 25.0, 20.0, 50.0]).unwrap();

    let mut table = MetricsTable::new();
    table.insert("far", TimeSeriesMetrics::compute(&actual, &far));
    table.insert("close", TimeSeriesMetrics::compute(&actual, &close));
    table.insert("empty", TimeSeriesMetrics::compute(&actual, &TimeSeries::default()));

    let order: Vec<&str> = table.rows().map(|r| r.model).collect();
    assert_eq!(order, vec!["close", "far", "empty"]);
    assert!((table.get("close").unwrap().mae - 1.0).abs() < 1e-12);

    let ascii = table.to_ascii_table();
    assert!(ascii.contains("close"));
    assert!(ascii.contains("NaN"));

    let json = table.export_to_string(ExportFormat::PrettyJson).unwrap();
    assert!(json.contains("\"model\": \"close\""));
    // undefined metrics serialize as null
    assert!(json.contains("\"mape\": null"));
}
