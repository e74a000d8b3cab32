//! Regression tree grown by exhaustive variance-reduction splits.

use ndarray::{ArrayView1, ArrayView2};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

/// Node impurity below which a node is not split further.
const MIN_IMPURITY: f64 = 1e-10;

/// Growth limits for one tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeParams {
    /// Maximum depth; `None` grows until the other limits stop it
    pub max_depth: Option<usize>,
    /// Minimum number of samples a node needs to be split
    pub min_samples_split: usize,
    /// Minimum number of samples in each child
    pub min_samples_leaf: usize,
    /// Features considered per split; `None` considers all
    pub max_features: Option<usize>,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// A fitted regression tree stored as a flat node arena.
#[derive(Debug, Clone)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Grow a tree on the rows `rows` of `x` / `y`.
    ///
    /// `rows` may repeat positions, as produced by a bootstrap sample.
    pub fn fit(x: ArrayView2<'_, f64>, y: &[f64], rows: &mut [usize], params: TreeParams, rng: &mut ChaCha8Rng) -> Self {
        let mut grower = Grower {
            x,
            y,
            params,
            rng,
            nodes: Vec::new(),
        };
        grower.grow(rows, 0);
        Self { nodes: grower.nodes }
    }

    /// Predict one feature row.
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut id = 0;
        loop {
            match self.nodes.get(id) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    id = if row[*feature] <= *threshold { *left } else { *right };
                }
                None => return f64::NAN,
            }
        }
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Depth of the deepest leaf; a single leaf has depth 0.
    pub fn depth(&self) -> usize {
        self.depth_from(0)
    }

    fn depth_from(&self, id: usize) -> usize {
        match self.nodes.get(id) {
            Some(Node::Split { left, right, .. }) => 1 + self.depth_from(*left).max(self.depth_from(*right)),
            _ => 0,
        }
    }
}

struct Grower<'a, 'x, 'y> {
    x: ArrayView2<'x, f64>,
    y: &'y [f64],
    params: TreeParams,
    rng: &'a mut ChaCha8Rng,
    nodes: Vec<Node>,
}

impl Grower<'_, '_, '_> {
    /// Grow the subtree over `rows` and return its node id.
    fn grow(&mut self, rows: &mut [usize], depth: usize) -> usize {
        let id = self.nodes.len();
        let (mean, impurity) = mean_and_variance(rows.iter().map(|&r| self.y[r]));
        self.nodes.push(Node::Leaf { value: mean });

        let depth_reached = self.params.max_depth.is_some_and(|max| depth >= max);
        if depth_reached || rows.len() < self.params.min_samples_split || impurity < MIN_IMPURITY {
            return id;
        }

        let Some(split) = self.best_split(rows, impurity) else {
            return id;
        };

        let boundary = partition(rows, |r| self.x[[r, split.feature]] <= split.threshold);
        let (left_rows, right_rows) = rows.split_at_mut(boundary);
        let left = self.grow(left_rows, depth + 1);
        let right = self.grow(right_rows, depth + 1);
        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    /// Best variance-reducing split over the candidate features.
    fn best_split(&mut self, rows: &[usize], parent_impurity: f64) -> Option<Split> {
        let n = rows.len();
        if n < 2 {
            return None;
        }
        let n_features = self.x.ncols();
        let mut candidates: Vec<usize> = (0..n_features).collect();
        if let Some(max) = self.params.max_features.filter(|&m| m < n_features) {
            candidates.shuffle(&mut *self.rng);
            candidates.truncate(max.max(1));
        }

        let min_leaf = self.params.min_samples_leaf.max(1);
        let mut best: Option<Split> = None;
        let mut best_gain = 0.0;
        let mut sorted = rows.to_vec();

        for feature in candidates {
            sorted.sort_by(|&a, &b| self.x[[a, feature]].total_cmp(&self.x[[b, feature]]));

            let total_sum: f64 = sorted.iter().map(|&r| self.y[r]).sum();
            let total_sq: f64 = sorted.iter().map(|&r| self.y[r] * self.y[r]).sum();
            let mut left_sum = 0.0;
            let mut left_sq = 0.0;

            for k in 0..n - 1 {
                let yk = self.y[sorted[k]];
                left_sum += yk;
                left_sq += yk * yk;

                let n_left = k + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }
                let lo = self.x[[sorted[k], feature]];
                let hi = self.x[[sorted[k + 1], feature]];
                if lo == hi {
                    continue;
                }

                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;
                let sse_left = (left_sq - left_sum * left_sum / n_left as f64).max(0.0);
                let sse_right = (right_sq - right_sum * right_sum / n_right as f64).max(0.0);
                let gain = parent_impurity - (sse_left + sse_right) / n as f64;

                if gain > best_gain {
                    best_gain = gain;
                    let mid = lo + (hi - lo) / 2.0;
                    let threshold = if mid < hi { mid } else { lo };
                    best = Some(Split {
                        feature,
                        threshold,
                        gain,
                    });
                }
            }
        }

        best.filter(|s| s.gain > 0.0)
    }
}

/// Mean and population variance.
fn mean_and_variance(values: impl Iterator<Item = f64> + Clone) -> (f64, f64) {
    let (count, sum) = values.clone().fold((0usize, 0.0), |(c, s), v| (c + 1, s + v));
    if count == 0 {
        return (f64::NAN, 0.0);
    }
    let mean = sum / count as f64;
    let variance = values.map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
    (mean, variance)
}

/// Reorder `rows` so that rows satisfying `pred` come first; returns their count.
fn partition(rows: &mut [usize], pred: impl Fn(usize) -> bool) -> usize {
    let mut boundary = 0;
    for i in 0..rows.len() {
        if pred(rows[i]) {
            rows.swap(i, boundary);
            boundary += 1;
        }
    }
    boundary
}
