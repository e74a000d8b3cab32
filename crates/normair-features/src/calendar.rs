//! Calendar Features
//!
//! Derives the calendar position of each reading: year, day of month, ISO
//! week, day of year, a continuous Unix-time index and one-hot weekday and
//! month indicators.
//!
//! All weekday and month indicator columns are emitted regardless of which
//! values occur in the input, so the schema is identical for any slice of
//! the data.

use crate::schema::{MONTH_COLUMNS, TIME_INDEX, WEEKDAY_COLUMNS};
use chrono::{Datelike, NaiveDateTime};
use polars::prelude::*;

/// Seconds since 1970-01-01T00:00:00, with millisecond precision.
pub fn unix_seconds(ts: &NaiveDateTime) -> f64 {
    ts.and_utc().timestamp_millis() as f64 / 1_000.0
}

/// Compute every calendar column for the given timestamps.
///
/// Total for any valid timestamp; an empty slice yields zero-length columns.
pub fn calendar_columns(timestamps: &[NaiveDateTime]) -> Vec<Column> {
    let years: Vec<i32> = timestamps.iter().map(|ts| ts.year()).collect();
    let days: Vec<i32> = timestamps.iter().map(|ts| ts.day() as i32).collect();
    let weeks: Vec<i32> = timestamps
        .iter()
        .map(|ts| ts.iso_week().week() as i32)
        .collect();
    let ordinals: Vec<i32> = timestamps.iter().map(|ts| ts.ordinal() as i32).collect();
    let unix: Vec<f64> = timestamps.iter().map(unix_seconds).collect();

    let mut columns = vec![
        Column::new("year".into(), years),
        Column::new("day".into(), days),
        Column::new("weekofyear".into(), weeks),
        Column::new("dayofyear".into(), ordinals),
        Column::new(TIME_INDEX.into(), unix),
    ];

    columns.extend(WEEKDAY_COLUMNS.iter().enumerate().map(|(i, name)| {
        let flags: Vec<i32> = timestamps
            .iter()
            .map(|ts| i32::from(ts.weekday().num_days_from_monday() as usize == i))
            .collect();
        Column::new((*name).into(), flags)
    }));

    columns.extend(MONTH_COLUMNS.iter().enumerate().map(|(i, name)| {
        let flags: Vec<i32> = timestamps
            .iter()
            .map(|ts| i32::from(ts.month0() as usize == i))
            .collect();
        Column::new((*name).into(), flags)
    }));

    columns
}
