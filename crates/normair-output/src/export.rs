//! Export of normalized series and metric tables.
//!
//! CSV output uses the column names of the observation schema (`data`,
//! `valore`, `idsensore`), so an exported table can be read back by the same
//! tools that produced the input.

use crate::metrics_table::MetricsTable;
use chrono::NaiveDateTime;
use normair_features::schema::{DATE, SENSOR_ID, VALUE};
use normair_features::sensors::string_values;
use normair_features::timestamps::extract_timestamps;
use normair_features::FeatureError;
use normair_model::TimeSeriesMetrics;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialized bytes are not UTF-8.
    #[error("invalid UTF-8 in output: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// The table does not have the normalized output schema.
    #[error("unexpected table layout: {0}")]
    Table(#[from] FeatureError),

    /// Polars error while reading a table.
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Comma-separated values format.
    #[default]
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }

    /// Guess the format from a file extension, defaulting to CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::Json,
            _ => Self::Csv,
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty-json" | "pretty_json" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// One normalized value of one sensor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedRecord {
    /// Timestamp.
    #[serde(rename = "data")]
    pub date: NaiveDateTime,

    /// Normalized pollutant level.
    #[serde(rename = "valore")]
    pub value: f64,

    /// Sensor identifier.
    #[serde(rename = "idsensore")]
    pub sensor: String,
}

impl NormalizedRecord {
    /// Create a new normalized record.
    pub const fn new(date: NaiveDateTime, value: f64, sensor: String) -> Self {
        Self {
            date,
            value,
            sensor,
        }
    }

    /// Read the rows of a `data`, `valore`, `idsensore` table.
    ///
    /// Null values become NaN and null identifiers an empty string.
    pub fn from_frame(df: &DataFrame) -> Result<Vec<Self>, ExportError> {
        let dates = extract_timestamps(df, DATE)?;
        let values = df
            .column(VALUE)
            .map_err(|_| FeatureError::MissingColumn(VALUE.to_string()))?
            .cast(&DataType::Float64)?;
        let sensors = string_values(df, SENSOR_ID)?;

        Ok(dates
            .into_iter()
            .zip(values.f64()?)
            .zip(sensors)
            .map(|((date, value), sensor)| {
                Self::new(date, value.unwrap_or(f64::NAN), sensor.unwrap_or_default())
            })
            .collect())
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

/// Run `write` against an in-memory CSV writer and return the text.
fn csv_string(
    write: impl FnOnce(&mut csv::Writer<Vec<u8>>) -> Result<(), ExportError>,
) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    write(&mut wtr)?;
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

impl Exporter for Vec<NormalizedRecord> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => csv_string(|wtr| {
                // an empty table still gets its header
                if self.is_empty() {
                    wtr.write_record([DATE, VALUE, SENSOR_ID])?;
                }
                for record in self {
                    wtr.serialize(record)?;
                }
                Ok(())
            }),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

impl Exporter for MetricsTable {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => csv_string(|wtr| {
                let header = std::iter::once("model").chain(TimeSeriesMetrics::NAMES);
                wtr.write_record(header)?;
                for row in self.rows() {
                    let values = row.metrics.values().map(|v| v.to_string());
                    wtr.write_record(std::iter::once(row.model.to_string()).chain(values))?;
                }
                Ok(())
            }),
            ExportFormat::Json => Ok(serde_json::to_string(&self.rows().collect::<Vec<_>>())?),
            ExportFormat::PrettyJson => {
                Ok(serde_json::to_string_pretty(&self.rows().collect::<Vec<_>>())?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use normair_features::timestamps::timestamp_column;
    use rstest::rstest;

    fn ts(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn records() -> Vec<NormalizedRecord> {
        vec![
            NormalizedRecord::new(ts(1), 21.5, "5504".to_string()),
            NormalizedRecord::new(ts(2), 19.25, "5504".to_string()),
        ]
    }

    #[test]
    fn test_normalized_records_csv() {
        let csv = records().export_to_string(ExportFormat::Csv).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("data,valore,idsensore"));
        assert_eq!(lines.next(), Some("2024-03-01T00:00:00,21.5,5504"));
        assert_eq!(lines.count(), 1);
    }

    #[test]
    fn test_empty_records_csv_has_header() {
        let csv = Vec::<NormalizedRecord>::new()
            .export_to_string(ExportFormat::Csv)
            .unwrap();
        assert_eq!(csv.trim_end(), "data,valore,idsensore");
    }

    #[test]
    fn test_normalized_records_json() {
        let json = records().export_to_string(ExportFormat::Json).unwrap();
        assert!(json.contains("\"data\":\"2024-03-01T00:00:00\""));
        assert!(json.contains("\"valore\":19.25"));
        assert!(json.contains("\"idsensore\":\"5504\""));

        let back: Vec<NormalizedRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, records());
    }

    #[test]
    fn test_pretty_json_is_indented() {
        let json = records().export_to_string(ExportFormat::PrettyJson).unwrap();
        assert!(json.contains("\n  "));
    }

    #[test]
    fn test_records_from_frame() {
        let df = DataFrame::new(vec![
            timestamp_column(DATE, &[ts(1), ts(2)]).unwrap(),
            Column::new(VALUE.into(), [Some(3.0), None]),
            Column::new(SENSOR_ID.into(), ["5504", "5504"]),
        ])
        .unwrap();

        let records = NormalizedRecord::from_frame(&df).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], NormalizedRecord::new(ts(1), 3.0, "5504".to_string()));
        assert!(records[1].value.is_nan());
    }

    #[test]
    fn test_records_from_frame_missing_column() {
        let df = DataFrame::new(vec![timestamp_column(DATE, &[ts(1)]).unwrap()]).unwrap();
        assert!(matches!(
            NormalizedRecord::from_frame(&df),
            Err(ExportError::Table(FeatureError::MissingColumn(_)))
        ));
    }

    #[test]
    fn test_metrics_table_csv() {
        let table = MetricsTable::new().with(
            "rf",
            TimeSeriesMetrics::from_pairs(&[10.0, 20.0], &[10.0, 20.0]),
        );
        let csv = table.export_to_string(ExportFormat::Csv).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("model,mae,mape,mse,rmse,r2,bias,sd,corr,mad,max_ae,max_mape")
        );
        assert_eq!(lines.next(), Some("rf,0,0,0,0,1,0,0,1,0,0,0"));
    }

    #[test]
    fn test_metrics_table_json_flattens_rows() {
        let table = MetricsTable::new().with(
            "rf",
            TimeSeriesMetrics::from_pairs(&[10.0, 20.0], &[12.0, 18.0]),
        );
        let json = table.export_to_string(ExportFormat::Json).unwrap();
        assert!(json.starts_with("[{\"model\":\"rf\",\"mae\":2.0"));
    }

    #[rstest]
    #[case("csv", ExportFormat::Csv)]
    #[case("json", ExportFormat::Json)]
    #[case("pretty-json", ExportFormat::PrettyJson)]
    fn test_format_from_str(#[case] text: &str, #[case] expected: ExportFormat) {
        assert_eq!(text.parse::<ExportFormat>().unwrap(), expected);
    }

    #[test]
    fn test_format_rejects_unknown() {
        assert!(matches!(
            "xlsx".parse::<ExportFormat>(),
            Err(ExportError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_export_format_extension() {
        assert_eq!(ExportFormat::Csv.extension(), "csv");
        assert_eq!(ExportFormat::Json.extension(), "json");
        assert_eq!(ExportFormat::PrettyJson.extension(), "json");
        assert_eq!(ExportFormat::from_path(Path::new("out.json")), ExportFormat::Json);
        assert_eq!(ExportFormat::from_path(Path::new("out")), ExportFormat::Csv);
    }
}
