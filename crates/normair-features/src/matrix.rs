//! Timestamp-indexed feature and target containers.

use crate::error::{FeatureError, Result};
use crate::timestamps::timestamp_column;
use chrono::NaiveDateTime;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Numeric feature table carrying the original timestamps as its row index.
///
/// Every column of the frame is integer or floating point; the index has one
/// entry per row.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    index: Vec<NaiveDateTime>,
    frame: DataFrame,
}

impl FeatureMatrix {
    /// Pair a row index with a frame of the same height.
    ///
    /// A frame without columns is accepted for any index length.
    pub fn new(index: Vec<NaiveDateTime>, frame: DataFrame) -> Result<Self> {
        if frame.width() > 0 && frame.height() != index.len() {
            return Err(FeatureError::LengthMismatch {
                index: index.len(),
                values: frame.height(),
            });
        }
        Ok(Self { index, frame })
    }

    /// Matrix with no rows and no columns.
    pub fn empty() -> Self {
        Self {
            index: Vec::new(),
            frame: DataFrame::empty(),
        }
    }

    /// Row timestamps.
    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    /// Underlying numeric frame.
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.index.len()
    }

    /// Number of feature columns.
    pub fn width(&self) -> usize {
        self.frame.width()
    }

    /// Whether the matrix has no rows.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Feature column names in frame order.
    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect()
    }

    /// Whether a feature column exists.
    pub fn contains(&self, name: &str) -> bool {
        self.frame.column(name).is_ok()
    }

    /// Names from `names` that are not columns of this matrix.
    pub fn missing_columns(&self, names: &[String]) -> Vec<String> {
        names
            .iter()
            .filter(|n| !self.contains(n))
            .cloned()
            .collect()
    }

    /// Values of one column as `f64`; nulls become NaN.
    pub fn column_values(&self, name: &str) -> Result<Vec<f64>> {
        let values = self
            .frame
            .column(name)
            .map_err(|_| FeatureError::MissingColumn(name.to_string()))?
            .cast(&DataType::Float64)?;
        Ok(values
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect())
    }

    /// Narrow the matrix to `names`, in that order.
    pub fn select(&self, names: &[String]) -> Result<Self> {
        if let Some(missing) = self.missing_columns(names).into_iter().next() {
            return Err(FeatureError::MissingColumn(missing));
        }
        let frame = self.frame.select(names.iter().map(String::as_str))?;
        Self::new(self.index.clone(), frame)
    }

    /// Keep the rows where `mask` is true.
    pub fn filter_rows(&self, mask: &[bool]) -> Result<Self> {
        if mask.len() != self.height() {
            return Err(FeatureError::LengthMismatch {
                index: self.height(),
                values: mask.len(),
            });
        }
        let index = self
            .index
            .iter()
            .zip(mask)
            .filter_map(|(ts, keep)| keep.then_some(*ts))
            .collect();
        let frame = if self.frame.width() == 0 {
            self.frame.clone()
        } else {
            self.frame
                .filter(&BooleanChunked::from_slice("mask".into(), mask))?
        };
        Self::new(index, frame)
    }

    /// Split off the target column, returning `(features, target)`.
    pub fn split_target(&self, target: &str) -> Result<(Self, TimeSeries)> {
        let values = self.column_values(target)?;
        let frame = self.frame.drop(target)?;
        Ok((
            Self::new(self.index.clone(), frame)?,
            TimeSeries::new(self.index.clone(), values)?,
        ))
    }
}

/// A timestamp-indexed series of floats; NaN marks a missing value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    index: Vec<NaiveDateTime>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Pair an index with values of the same length.
    pub fn new(index: Vec<NaiveDateTime>, values: Vec<f64>) -> Result<Self> {
        if index.len() != values.len() {
            return Err(FeatureError::LengthMismatch {
                index: index.len(),
                values: values.len(),
            });
        }
        Ok(Self { index, values })
    }

    /// Row timestamps.
    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    /// Values, aligned with [`TimeSeries::index`].
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series has no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(timestamp, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDateTime, f64)> {
        self.index.iter().zip(self.values.iter().copied())
    }

    /// The series without its NaN entries.
    pub fn dropna(&self) -> Self {
        let (index, values) = self.iter().filter(|(_, v)| !v.is_nan()).map(|(t, v)| (*t, v)).unzip();
        Self { index, values }
    }

    /// Value lookup by timestamp. Later duplicates win.
    pub fn lookup(&self) -> HashMap<NaiveDateTime, f64> {
        self.iter().map(|(t, v)| (*t, v)).collect()
    }

    /// Decompose into index and values.
    pub fn into_parts(self) -> (Vec<NaiveDateTime>, Vec<f64>) {
        (self.index, self.values)
    }

    /// Two-column frame: a millisecond `Datetime` column and a `Float64` column.
    pub fn to_frame(&self, date_column: &str, value_column: &str) -> Result<DataFrame> {
        Ok(DataFrame::new(vec![
            timestamp_column(date_column, &self.index)?,
            Column::new(value_column.into(), self.values.clone()),
        ])?)
    }
}
