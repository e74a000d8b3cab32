//! Random Forest Regression
//!
//! An ensemble of regression trees, each grown on a bootstrap sample of the
//! training rows. The prediction is the mean of the tree predictions.
//!
//! Trees are grown in parallel; tree `i` is seeded with `seed + i`, so a fit
//! is reproducible regardless of thread scheduling.

mod model;
pub mod tree;

pub use model::RandomForestModel;

use crate::error::{ModelError, Result};
use crate::resample::draw_rows;
use ndarray::ArrayView2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tree::{RegressionTree, TreeParams};

/// Random forest configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees in the ensemble
    pub n_trees: usize,
    /// Maximum depth of each tree (`None` = unlimited)
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Minimum samples in each leaf
    pub min_samples_leaf: usize,
    /// Features considered per split (`None` = all)
    pub max_features: Option<usize>,
    /// Grow each tree on a bootstrap sample of the rows
    pub bootstrap: bool,
    /// Training seed
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 20,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

impl ForestConfig {
    /// Check the configuration for values that cannot grow a forest.
    pub fn validate(&self) -> Result<()> {
        if self.n_trees == 0 {
            return Err(ModelError::InvalidConfiguration(
                "n_trees must be at least 1".to_string(),
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(ModelError::InvalidConfiguration(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }
        if self.max_features == Some(0) {
            return Err(ModelError::InvalidConfiguration(
                "max_features must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    const fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            max_features: self.max_features,
        }
    }
}

/// Random forest regressor over dense design matrices.
#[derive(Debug, Clone)]
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<RegressionTree>,
    fitted: bool,
}

impl RandomForest {
    /// Create an unfitted forest.
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            fitted: false,
        }
    }

    /// Forest configuration.
    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Whether [`RandomForest::fit`] has been called.
    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    /// Fitted trees; empty when fitted on zero rows.
    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    /// Fit on `x` (one row per sample) and targets `y`.
    pub fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[f64]) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(ModelError::InvalidConfiguration(format!(
                "design matrix has {} rows but target has {}",
                x.nrows(),
                y.len()
            )));
        }

        let n = y.len();
        let config = self.config;
        let params = config.tree_params();

        self.trees = if n == 0 {
            Vec::new()
        } else {
            (0..config.n_trees)
                .into_par_iter()
                .map(|i| {
                    let mut rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(i as u64));
                    let mut rows = if config.bootstrap {
                        draw_rows(n, &mut rng)
                    } else {
                        (0..n).collect()
                    };
                    RegressionTree::fit(x, y, &mut rows, params, &mut rng)
                })
                .collect()
        };
        self.fitted = true;
        Ok(())
    }

    /// Mean tree prediction per row of `x`; NaN for an empty ensemble.
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Vec<f64> {
        x.rows()
            .into_iter()
            .map(|row| {
                if self.trees.is_empty() {
                    return f64::NAN;
                }
                let total: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
                total / self.trees.len() as f64
            })
            .collect()
    }
}
