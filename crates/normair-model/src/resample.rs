//! Joint row resampling of bootstrap features.
//!
//! Rows are drawn with replacement and all bootstrap columns are copied from
//! the same drawn row, so combinations of weather covariates that never
//! occurred together are not produced.

use ndarray::Array2;
use rand::{Rng, RngCore};

/// Draw `n` row positions uniformly with replacement.
pub fn draw_rows(n: usize, rng: &mut dyn RngCore) -> Vec<usize> {
    (0..n).map(|_| rng.gen_range(0..n)).collect()
}

/// Copy of `values` whose `columns` are replaced, row-wise, by a
/// with-replacement resample of their own rows. Other columns are untouched.
pub fn resample_columns(values: &Array2<f64>, columns: &[usize], rng: &mut dyn RngCore) -> Array2<f64> {
    let mut out = values.clone();
    if columns.is_empty() {
        return out;
    }
    let rows = draw_rows(values.nrows(), rng);
    for (target, &source) in rows.iter().enumerate() {
        for &c in columns {
            out[[target, c]] = values[[source, c]];
        }
    }
    out
}
