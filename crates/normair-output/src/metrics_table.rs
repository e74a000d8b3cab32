//! Model comparison table.
//!
//! Accumulates one row of [`TimeSeriesMetrics`] per named model. Inserting a
//! row under an existing name replaces it, and rows are kept sorted by
//! ascending `mape` with undefined values last.

use normair_model::TimeSeriesMetrics;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// Metrics of one model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsRow<'a> {
    /// Model name.
    pub model: &'a str,

    /// Metric values.
    #[serde(flatten)]
    pub metrics: TimeSeriesMetrics,
}

/// Named metric rows, best `mape` first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsTable {
    rows: Vec<(String, TimeSeriesMetrics)>,
}

impl MetricsTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the row for `model`.
    pub fn insert(&mut self, model: impl Into<String>, metrics: TimeSeriesMetrics) {
        let model = model.into();
        self.rows.retain(|(name, _)| *name != model);
        self.rows.push((model, metrics));
        self.rows.sort_by(|(_, a), (_, b)| nan_last(a.mape, b.mape));
    }

    /// Builder-style [`MetricsTable::insert`].
    pub fn with(mut self, model: impl Into<String>, metrics: TimeSeriesMetrics) -> Self {
        self.insert(model, metrics);
        self
    }

    /// Rows in table order.
    pub fn rows(&self) -> impl Iterator<Item = MetricsRow<'_>> {
        self.rows.iter().map(|(model, metrics)| MetricsRow {
            model,
            metrics: *metrics,
        })
    }

    /// Metrics of `model`, if present.
    pub fn get(&self, model: &str) -> Option<&TimeSeriesMetrics> {
        self.rows
            .iter()
            .find(|(name, _)| name == model)
            .map(|(_, metrics)| metrics)
    }

    /// The row with the lowest defined `mape`.
    pub fn best(&self) -> Option<MetricsRow<'_>> {
        self.rows().next().filter(|row| !row.metrics.mape.is_nan())
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Format as ASCII table for terminal display.
    pub fn to_ascii_table(&self) -> String {
        let width = 16 + 11 * TimeSeriesMetrics::NAMES.len();
        let mut output = String::new();

        output.push_str(&"=".repeat(width));
        output.push('\n');
        output.push_str(&format!("{:<16}", "Model"));
        for name in TimeSeriesMetrics::NAMES {
            output.push_str(&format!("{name:>11}"));
        }
        output.push('\n');
        output.push_str(&"-".repeat(width));
        output.push('\n');

        for row in self.rows() {
            output.push_str(&format!("{:<16}", row.model));
            for value in row.metrics.values() {
                output.push_str(&format!("{value:>11.4}"));
            }
            output.push('\n');
        }

        output.push_str(&"=".repeat(width));
        output.push('\n');
        output
    }

    /// Format as Markdown.
    pub fn to_markdown(&self) -> String {
        let mut output = String::from("| Model |");
        for name in TimeSeriesMetrics::NAMES {
            output.push_str(&format!(" {name} |"));
        }
        output.push_str("\n|-------|");
        output.push_str(&"---|".repeat(TimeSeriesMetrics::NAMES.len()));
        output.push('\n');

        for row in self.rows() {
            output.push_str(&format!("| {} |", row.model));
            for value in row.metrics.values() {
                output.push_str(&format!(" {value:.4} |"));
            }
            output.push('\n');
        }
        output
    }
}

impl fmt::Display for MetricsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_ascii_table())
    }
}

fn nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.total_cmp(&b),
    }
}
