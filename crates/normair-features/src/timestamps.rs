//! Timestamp extraction and construction.
//!
//! The joined table may carry its `data` column as a polars `Date`, a
//! `Datetime` of any resolution, or an ISO-like string. Everything is brought
//! to `NaiveDateTime` (no timezone assumption) before features are derived.

use crate::error::{FeatureError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parse a textual timestamp, accepting plain dates and second-resolution datetimes.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}

/// Extract the timestamps of `column` as naive datetimes, one per row.
///
/// Null or unparsable values are reported with their row position.
pub fn extract_timestamps(df: &DataFrame, column: &str) -> Result<Vec<NaiveDateTime>> {
    let values = df
        .column(column)
        .map_err(|_| FeatureError::MissingColumn(column.to_string()))?;

    if df.height() == 0 {
        return Ok(Vec::new());
    }

    let invalid = |row: usize| FeatureError::InvalidTimestamp {
        column: column.to_string(),
        row,
    };

    match values.dtype() {
        DataType::Date | DataType::Datetime(_, _) => {
            let millis = values
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
                .cast(&DataType::Int64)?;
            millis
                .i64()?
                .into_iter()
                .enumerate()
                .map(|(row, ms)| {
                    ms.and_then(DateTime::from_timestamp_millis)
                        .map(|dt| dt.naive_utc())
                        .ok_or_else(|| invalid(row))
                })
                .collect()
        }
        DataType::String => values
            .str()?
            .into_iter()
            .enumerate()
            .map(|(row, text)| text.and_then(parse_timestamp).ok_or_else(|| invalid(row)))
            .collect(),
        other => Err(FeatureError::UnsupportedTimestampType {
            column: column.to_string(),
            dtype: other.to_string(),
        }),
    }
}

/// Build a millisecond `Datetime` column from naive timestamps.
pub fn timestamp_column(name: &str, index: &[NaiveDateTime]) -> PolarsResult<Column> {
    let millis: Vec<i64> = index
        .iter()
        .map(|ts| ts.and_utc().timestamp_millis())
        .collect();
    let series = Series::new(name.into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
    Ok(series.into())
}
