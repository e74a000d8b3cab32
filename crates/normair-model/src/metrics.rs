//! Time Series Error Metrics
//!
//! With `e = actual - predicted` over the timestamps present in both series:
//!
//! | name | formula |
//! |---|---|
//! | `mae` | mean(\|e\|) |
//! | `mape` | mean(\|e / actual\|) |
//! | `mse` | mean(e²) |
//! | `rmse` | √mse |
//! | `r2` | 1 − Σe² / Σ(actual − mean(actual))² |
//! | `bias` | mean(e) |
//! | `sd` | population standard deviation of e |
//! | `corr` | Pearson correlation of actual and predicted |
//! | `mad` | median(\|e\|) − median(e) |
//! | `max_ae` | max(\|e\|) |
//! | `max_mape` | max(\|e / actual\|) |
//!
//! Ratio metrics are infinite or NaN when an actual value is exactly zero.

use normair_features::TimeSeries;
use serde::{Deserialize, Serialize};

/// The metrics bundle comparing a predicted series with the observed one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesMetrics {
    /// Mean absolute error
    pub mae: f64,
    /// Mean absolute percentage error, as a fraction
    pub mape: f64,
    /// Mean squared error
    pub mse: f64,
    /// Root mean squared error
    pub rmse: f64,
    /// Coefficient of determination
    pub r2: f64,
    /// Mean signed error
    pub bias: f64,
    /// Standard deviation of the errors
    pub sd: f64,
    /// Correlation between actual and predicted
    pub corr: f64,
    /// Median absolute error minus median error
    pub mad: f64,
    /// Maximum absolute error
    pub max_ae: f64,
    /// Maximum absolute percentage error, as a fraction
    pub max_mape: f64,
}

impl TimeSeriesMetrics {
    /// Metric names, in [`TimeSeriesMetrics::values`] order.
    pub const NAMES: [&'static str; 11] = [
        "mae", "mape", "mse", "rmse", "r2", "bias", "sd", "corr", "mad", "max_ae", "max_mape",
    ];

    /// Every metric NaN, for comparisons over no data.
    pub const fn undefined() -> Self {
        Self {
            mae: f64::NAN,
            mape: f64::NAN,
            mse: f64::NAN,
            rmse: f64::NAN,
            r2: f64::NAN,
            bias: f64::NAN,
            sd: f64::NAN,
            corr: f64::NAN,
            mad: f64::NAN,
            max_ae: f64::NAN,
            max_mape: f64::NAN,
        }
    }

    /// Compare two series on their common timestamps.
    ///
    /// Pairs where either value is missing are skipped.
    pub fn compute(actual: &TimeSeries, predicted: &TimeSeries) -> Self {
        let predicted = predicted.lookup();
        let (actual, predicted): (Vec<f64>, Vec<f64>) = actual
            .iter()
            .filter_map(|(ts, a)| predicted.get(ts).map(|&p| (a, p)))
            .filter(|(a, p)| !a.is_nan() && !p.is_nan())
            .unzip();
        Self::from_pairs(&actual, &predicted)
    }

    /// Compare aligned slices of actual and predicted values.
    pub fn from_pairs(actual: &[f64], predicted: &[f64]) -> Self {
        let n = actual.len().min(predicted.len());
        if n == 0 {
            return Self::undefined();
        }
        let (actual, predicted) = (&actual[..n], &predicted[..n]);
        let errors: Vec<f64> = actual.iter().zip(predicted).map(|(a, p)| a - p).collect();
        let abs_errors: Vec<f64> = errors.iter().map(|e| e.abs()).collect();
        let rel_errors: Vec<f64> = errors.iter().zip(actual).map(|(e, a)| (e / a).abs()).collect();

        let mse = mean(errors.iter().map(|e| e * e));
        let bias = mean(errors.iter().copied());
        let sd = mean(errors.iter().map(|e| (e - bias).powi(2))).sqrt();

        Self {
            mae: mean(abs_errors.iter().copied()),
            mape: mean(rel_errors.iter().copied()),
            mse,
            rmse: mse.sqrt(),
            r2: r2_score(actual, &errors),
            bias,
            sd,
            corr: pearson(actual, predicted),
            mad: median(&abs_errors) - median(&errors),
            max_ae: max(&abs_errors),
            max_mape: max(&rel_errors),
        }
    }

    /// Metric values, in [`TimeSeriesMetrics::NAMES`] order.
    pub const fn values(&self) -> [f64; 11] {
        [
            self.mae,
            self.mape,
            self.mse,
            self.rmse,
            self.r2,
            self.bias,
            self.sd,
            self.corr,
            self.mad,
            self.max_ae,
            self.max_mape,
        ]
    }

    /// Look up a metric by name.
    pub fn get(&self, name: &str) -> Option<f64> {
        Self::NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.values()[i])
    }

    /// `(name, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> {
        Self::NAMES.into_iter().zip(self.values())
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (count, sum) = values.fold((0usize, 0.0), |(c, s), v| (c + 1, s + v));
    sum / count as f64
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    match sorted.len() {
        0 => f64::NAN,
        len if len % 2 == 1 => sorted[mid],
        _ => (sorted[mid - 1] + sorted[mid]) / 2.0,
    }
}

/// Maximum, propagating NaN.
fn max(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, |m, v| if v.is_nan() || m.is_nan() { f64::NAN } else { m.max(v) })
}

/// R² with the convention that a constant target scores 1.0 when predicted
/// exactly and 0.0 otherwise.
fn r2_score(actual: &[f64], errors: &[f64]) -> f64 {
    let mean_actual = mean(actual.iter().copied());
    let ss_res: f64 = errors.iter().map(|e| e * e).sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean_actual).powi(2)).sum();
    if ss_tot == 0.0 {
        if ss_res == 0.0 { 1.0 } else { 0.0 }
    } else {
        1.0 - ss_res / ss_tot
    }
}

/// Pearson correlation; NaN when either side is constant.
fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let mx = mean(x.iter().copied());
    let my = mean(y.iter().copied());
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx).powi(2);
        syy += (b - my).powi(2);
    }
    let denom = (sxx * syy).sqrt();
    if denom == 0.0 { f64::NAN } else { sxy / denom }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{NaiveDate, NaiveDateTime};
    use rstest::rstest;

    fn days(n: u32) -> Vec<NaiveDateTime> {
        (1..=n)
            .map(|d| NaiveDate::from_ymd_opt(2022, 1, d).unwrap().and_hms_opt(0, 0, 0).unwrap())
            .collect()
    }

    #[test]
    fn test_known_values() {
        let actual = [10.0, 20.0, 30.0, 40.0];
        let predicted = [12.0, 18.0, 33.0, 40.0];
        let m = TimeSeriesMetrics::from_pairs(&actual, &predicted);

        // errors: -2, 2, -3, 0
        assert_relative_eq!(m.mae, 7.0 / 4.0);
        assert_relative_eq!(m.mape, (0.2 + 0.1 + 0.1 + 0.0) / 4.0);
        assert_relative_eq!(m.mse, 17.0 / 4.0);
        assert_relative_eq!(m.rmse, (17.0f64 / 4.0).sqrt());
        assert_relative_eq!(m.r2, 1.0 - 17.0 / 500.0);
        assert_relative_eq!(m.bias, -0.75);
        assert_relative_eq!(m.sd, ((1.25f64.powi(2) + 2.75f64.powi(2) + 2.25f64.powi(2) + 0.75f64.powi(2)) / 4.0).sqrt());
        assert_relative_eq!(m.mad, 2.0 - (-1.0));
        assert_relative_eq!(m.max_ae, 3.0);
        assert_relative_eq!(m.max_mape, 0.2);
        assert!(m.corr > 0.95 && m.corr <= 1.0);
    }

    #[test]
    fn test_perfect_prediction() {
        let values = [1.0, 4.0, 2.0];
        let m = TimeSeriesMetrics::from_pairs(&values, &values);
        assert_eq!(m.mae, 0.0);
        assert_eq!(m.r2, 1.0);
        assert_relative_eq!(m.corr, 1.0, epsilon = 1e-12);
    }

    #[rstest]
    #[case(&[5.0, 5.0], &[5.0, 5.0], 1.0)]
    #[case(&[5.0, 5.0], &[4.0, 6.0], 0.0)]
    fn test_r2_constant_target(#[case] actual: &[f64], #[case] predicted: &[f64], #[case] expected: f64) {
        assert_eq!(TimeSeriesMetrics::from_pairs(actual, predicted).r2, expected);
    }

    #[test]
    fn test_zero_actual_is_not_fatal() {
        let m = TimeSeriesMetrics::from_pairs(&[0.0, 2.0], &[1.0, 2.0]);
        assert!(m.mape.is_infinite());
        assert!(m.max_mape.is_infinite());
        assert_relative_eq!(m.mae, 0.5);
    }

    #[test]
    fn test_join_on_timestamp() {
        let idx = days(4);
        let actual = TimeSeries::new(idx.clone(), vec![1.0, f64::NAN, 3.0, 4.0]).unwrap();
        let predicted = TimeSeries::new(vec![idx[3], idx[0], idx[1]], vec![5.0, 1.0, 2.0]).unwrap();
        let m = TimeSeriesMetrics::compute(&actual, &predicted);
        // pairs: (1, 1) and (4, 5)
        assert_relative_eq!(m.mae, 0.5);
        assert_relative_eq!(m.bias, -0.5);
    }

    #[test]
    fn test_empty_join() {
        let actual = TimeSeries::new(days(2), vec![1.0, 2.0]).unwrap();
        let m = TimeSeriesMetrics::compute(&actual, &TimeSeries::default());
        assert!(m.values().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_names_and_lookup() {
        let m = TimeSeriesMetrics::from_pairs(&[1.0, 2.0], &[1.5, 2.5]);
        assert_eq!(m.get("bias"), Some(-0.5));
        assert_eq!(m.get("unknown"), None);
        let names: Vec<&str> = m.iter().map(|(n, _)| n).collect();
        assert_eq!(names, TimeSeriesMetrics::NAMES);
    }
}
