//! Design matrices handed to the learner.

use crate::error::Result;
use crate::selection::FeatureSelection;
use chrono::NaiveDateTime;
use ndarray::Array2;
use normair_features::FeatureMatrix;

/// Dense `f64` matrix of the selected features over complete rows.
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    index: Vec<NaiveDateTime>,
    values: Array2<f64>,
}

impl DesignMatrix {
    /// Narrow `x` to the selected features and drop every row holding a
    /// missing value in any of them.
    ///
    /// Fails when a selected feature is absent.
    pub fn complete_rows(x: &FeatureMatrix, selection: &FeatureSelection) -> Result<Self> {
        selection.check(x)?;
        let columns = selection
            .features()
            .iter()
            .map(|name| x.column_values(name))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let kept: Vec<usize> = (0..x.height())
            .filter(|&row| columns.iter().all(|c| !c[row].is_nan()))
            .collect();

        let values = Array2::from_shape_fn((kept.len(), columns.len()), |(r, c)| {
            columns[c][kept[r]]
        });
        let index = kept.iter().map(|&row| x.index()[row]).collect();
        Ok(Self { index, values })
    }

    /// Keep only the rows where `keep` is true.
    pub fn retain(&self, keep: &[bool]) -> Self {
        let rows: Vec<usize> = (0..self.nrows()).filter(|&r| keep[r]).collect();
        let values = Array2::from_shape_fn((rows.len(), self.ncols()), |(r, c)| {
            self.values[[rows[r], c]]
        });
        let index = rows.iter().map(|&r| self.index[r]).collect();
        Self { index, values }
    }

    /// Row timestamps.
    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    /// Feature values, one row per timestamp.
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    /// Number of feature columns.
    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }
}
