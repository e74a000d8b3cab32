//! Harmonic Seasonality Features
//!
//! Sine/cosine basis functions giving the model a smooth periodic encoding of
//! weekly and yearly cycles.
//!
//! For a period `P` and harmonic index `i`:
//! sin_P_i = sin(2π·i·Δt / P),  cos_P_i = cos(2π·i·Δt / P)
//!
//! where Δt is the time elapsed since a fixed epoch, expressed in the unit of
//! `P`.

use crate::error::{FeatureError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::f64::consts::PI;

/// One (period, number of harmonics) configuration entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HarmonicSpec {
    /// Base period, in [`HarmonicUnit`]s
    pub period: f64,
    /// Number of harmonics to emit (i = 1..=harmonics)
    pub harmonics: usize,
}

impl HarmonicSpec {
    /// Create a new harmonic specification.
    pub const fn new(period: f64, harmonics: usize) -> Self {
        Self { period, harmonics }
    }

    /// Fail unless the period is positive and finite.
    pub fn validate(&self) -> Result<()> {
        if self.period.is_finite() && self.period > 0.0 {
            Ok(())
        } else {
            Err(FeatureError::InvalidHarmonicPeriod(self.period))
        }
    }
}

/// Default configuration: three weekly and three yearly harmonics.
pub fn default_harmonics() -> Vec<HarmonicSpec> {
    vec![HarmonicSpec::new(7.0, 3), HarmonicSpec::new(365.24, 3)]
}

/// Unit in which elapsed time and periods are measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarmonicUnit {
    /// Periods expressed in days
    #[default]
    Days,
    /// Periods expressed in hours
    Hours,
}

impl HarmonicUnit {
    /// Length of one unit in seconds.
    pub const fn seconds(&self) -> f64 {
        match self {
            Self::Days => 86_400.0,
            Self::Hours => 3_600.0,
        }
    }
}

/// Reference epoch for elapsed-time computation: 1900-01-01T00:00:00.
pub fn default_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1900, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Name of the sine column for a period and harmonic index.
pub fn sin_column_name(period: f64, index: usize) -> String {
    format!("sin_{period}_{index}")
}

/// Name of the cosine column for a period and harmonic index.
pub fn cos_column_name(period: f64, index: usize) -> String {
    format!("cos_{period}_{index}")
}

/// Elapsed time from `epoch` to `ts` in `unit`s.
pub fn elapsed(ts: &NaiveDateTime, epoch: &NaiveDateTime, unit: HarmonicUnit) -> f64 {
    (*ts - *epoch).num_milliseconds() as f64 / 1_000.0 / unit.seconds()
}

/// Compute the harmonic columns for all specs.
///
/// A period/index pair that was already emitted by an earlier spec is not
/// emitted again. Every spec is validated before any column is computed.
pub fn harmonic_columns(
    timestamps: &[NaiveDateTime],
    specs: &[HarmonicSpec],
    epoch: &NaiveDateTime,
    unit: HarmonicUnit,
) -> Result<Vec<Column>> {
    for spec in specs {
        spec.validate()?;
    }

    let elapsed_units: Vec<f64> = timestamps
        .iter()
        .map(|ts| elapsed(ts, epoch, unit))
        .collect();

    let mut emitted = HashSet::new();
    let mut columns = Vec::new();

    for spec in specs {
        for i in 1..=spec.harmonics {
            let sin_name = sin_column_name(spec.period, i);
            if !emitted.insert(sin_name.clone()) {
                continue;
            }
            let omega = 2.0 * PI * i as f64 / spec.period;
            let (sin, cos): (Vec<f64>, Vec<f64>) = elapsed_units
                .iter()
                .map(|dt| (omega * dt).sin_cos())
                .unzip();
            columns.push(Column::new(sin_name.as_str().into(), sin));
            columns.push(Column::new(
                cos_column_name(spec.period, i).as_str().into(),
                cos,
            ));
        }
    }

    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    fn days_from(start: NaiveDateTime, n: i64) -> Vec<NaiveDateTime> {
        (0..n).map(|d| start + chrono::Duration::days(d)).collect()
    }

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2018, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[rstest]
    #[case(7.0, 1, "sin_7_1")]
    #[case(365.24, 3, "sin_365.24_3")]
    #[case(24.0, 2, "sin_24_2")]
    fn test_column_names(#[case] period: f64, #[case] index: usize, #[case] expected: &str) {
        assert_eq!(sin_column_name(period, index), expected);
        assert_eq!(cos_column_name(period, index), expected.replacen("sin", "cos", 1));
    }

    #[test]
    fn test_default_epoch() {
        assert_eq!(default_epoch().to_string(), "1900-01-01 00:00:00");
    }

    #[test]
    fn test_pythagorean_identity() {
        let ts = days_from(start(), 800);
        let columns = harmonic_columns(&ts, &default_harmonics(), &default_epoch(), HarmonicUnit::Days).unwrap();
        assert_eq!(columns.len(), 12);
        let df = DataFrame::new(columns).unwrap();

        for spec in default_harmonics() {
            for i in 1..=spec.harmonics {
                let sin = df.column(&sin_column_name(spec.period, i)).unwrap().f64().unwrap();
                let cos = df.column(&cos_column_name(spec.period, i)).unwrap().f64().unwrap();
                for (s, c) in sin.into_iter().zip(cos.into_iter()) {
                    let (s, c) = (s.unwrap(), c.unwrap());
                    assert_abs_diff_eq!(s * s + c * c, 1.0, epsilon = 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_weekly_period_repeats() {
        let ts = days_from(start(), 15);
        let columns = harmonic_columns(&ts, &[HarmonicSpec::new(7.0, 2)], &default_epoch(), HarmonicUnit::Days).unwrap();
        let df = DataFrame::new(columns).unwrap();
        let sin = df.column("sin_7_2").unwrap().f64().unwrap();
        for d in 0..8 {
            assert_abs_diff_eq!(
                sin.get(d).unwrap(),
                sin.get(d + 7).unwrap(),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn test_hours_unit() {
        let epoch = default_epoch();
        let ts = epoch + chrono::Duration::hours(6);
        assert_abs_diff_eq!(elapsed(&ts, &epoch, HarmonicUnit::Hours), 6.0);
        assert_abs_diff_eq!(elapsed(&ts, &epoch, HarmonicUnit::Days), 0.25);
    }

    #[test]
    fn test_repeated_spec_does_not_duplicate() {
        let ts = days_from(start(), 3);
        let specs = [HarmonicSpec::new(7.0, 2), HarmonicSpec::new(7.0, 3)];
        let columns = harmonic_columns(&ts, &specs, &default_epoch(), HarmonicUnit::Days).unwrap();
        // sin/cos for i = 1, 2, 3 once each
        assert_eq!(columns.len(), 6);
        assert!(DataFrame::new(columns).is_ok());
    }

    #[test]
    fn test_empty_timestamps() {
        let columns = harmonic_columns(&[], &default_harmonics(), &default_epoch(), HarmonicUnit::Days).unwrap();
        assert!(columns.iter().all(|c| c.len() == 0));
    }

    #[rstest]
    #[case(0.0)]
    #[case(-7.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn test_invalid_period_rejected(#[case] period: f64) {
        let ts = days_from(start(), 3);
        let specs = [HarmonicSpec::new(7.0, 1), HarmonicSpec::new(period, 2)];
        let result = harmonic_columns(&ts, &specs, &default_epoch(), HarmonicUnit::Days);
        assert!(matches!(result, Err(FeatureError::InvalidHarmonicPeriod(_))));
        assert!(HarmonicSpec::new(period, 2).validate().is_err());
    }
}
