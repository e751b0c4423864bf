//! Multi-output random forest over binary labels.
//!
//! Each tree is grown on a bootstrap resample of the rows. At every node a
//! shuffled feature order is scanned; once `max_features` features have
//! been examined and a valid split exists the scan stops, otherwise it
//! keeps going through the remaining features. Impurity is the gini index
//! averaged over all outputs. Leaves hold the positive fraction per output.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::types::ForestError;

pub const DEFAULT_TREES: usize = 100;
pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub seed: u64,
    /// Features examined per split; `None` means `floor(sqrt(n_features))`.
    pub max_features: Option<usize>,
    pub bootstrap: bool,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: DEFAULT_TREES,
            seed: DEFAULT_SEED,
            max_features: None,
            bootstrap: true,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        positive: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn leaf_for<'a>(&'a self, row: &[f64]) -> &'a [f64] {
        match self {
            Node::Leaf { positive } => positive,
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                let value = row.get(*feature).copied().unwrap_or(0.0);
                if value <= *threshold {
                    left.leaf_for(row)
                } else {
                    right.leaf_for(row)
                }
            }
        }
    }
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

struct TreeBuilder<'a> {
    x: &'a [Vec<f64>],
    y: &'a [Vec<bool>],
    n_outputs: usize,
    max_features: usize,
    rng: &'a mut StdRng,
}

impl TreeBuilder<'_> {
    fn build(&mut self, indices: &[usize]) -> Node {
        let positive = self.positive_fractions(indices);
        if indices.len() < 2 || mean_gini(&positive) == 0.0 {
            return Node::Leaf { positive };
        }

        match self.best_split(indices) {
            Some(split) => {
                let (left, right): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| self.x[i][split.feature] <= split.threshold);
                Node::Split {
                    feature: split.feature,
                    threshold: split.threshold,
                    left: Box::new(self.build(&left)),
                    right: Box::new(self.build(&right)),
                }
            }
            None => Node::Leaf { positive },
        }
    }

    fn positive_fractions(&self, indices: &[usize]) -> Vec<f64> {
        let n = indices.len().max(1) as f64;
        (0..self.n_outputs)
            .map(|k| indices.iter().filter(|&&i| self.y[i][k]).count() as f64 / n)
            .collect()
    }

    fn best_split(&mut self, indices: &[usize]) -> Option<SplitCandidate> {
        let n_features = self.x[indices[0]].len();
        let mut order: Vec<usize> = (0..n_features).collect();
        order.shuffle(&mut *self.rng);

        let mut best: Option<SplitCandidate> = None;
        for (visited, &feature) in order.iter().enumerate() {
            if visited >= self.max_features && best.is_some() {
                break;
            }
            if let Some(candidate) = self.best_threshold(indices, feature) {
                if best.as_ref().map_or(true, |b| candidate.impurity < b.impurity) {
                    best = Some(candidate);
                }
            }
        }
        best
    }

    fn best_threshold(&self, indices: &[usize], feature: usize) -> Option<SplitCandidate> {
        let mut values: Vec<f64> = indices.iter().map(|&i| self.x[i][feature]).collect();
        values.sort_by(f64::total_cmp);
        values.dedup();

        let mut best: Option<SplitCandidate> = None;
        for pair in values.windows(2) {
            let threshold = (pair[0] + pair[1]) / 2.0;
            let (left, right): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .partition(|&&i| self.x[i][feature] <= threshold);
            if left.is_empty() || right.is_empty() {
                continue;
            }
            let n = indices.len() as f64;
            let impurity = (left.len() as f64 / n) * mean_gini(&self.positive_fractions(&left))
                + (right.len() as f64 / n) * mean_gini(&self.positive_fractions(&right));
            if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                best = Some(SplitCandidate {
                    feature,
                    threshold,
                    impurity,
                });
            }
        }
        best
    }
}

fn mean_gini(positive: &[f64]) -> f64 {
    if positive.is_empty() {
        return 0.0;
    }
    positive.iter().map(|p| 2.0 * p * (1.0 - p)).sum::<f64>() / positive.len() as f64
}

/// A fitted forest.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<Node>,
    n_features: usize,
    n_outputs: usize,
}

impl RandomForest {
    /// Fit on rows `x` with binary label rows `y` (one column per output).
    pub fn fit(x: &[Vec<f64>], y: &[Vec<bool>], params: &ForestParams) -> Result<Self, ForestError> {
        if x.is_empty() {
            return Err(ForestError::EmptyTrainingSet);
        }
        if x.len() != y.len() {
            return Err(ForestError::LabelMismatch {
                rows: x.len(),
                labels: y.len(),
            });
        }
        let n_features = x[0].len();
        if let Some((index, row)) = x.iter().enumerate().find(|(_, r)| r.len() != n_features) {
            return Err(ForestError::RaggedRow {
                index,
                expected: n_features,
                found: row.len(),
            });
        }
        let n_outputs = y[0].len();
        if let Some((index, labels)) = y.iter().enumerate().find(|(_, l)| l.len() != n_outputs) {
            return Err(ForestError::RaggedRow {
                index,
                expected: n_outputs,
                found: labels.len(),
            });
        }

        let max_features = params
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt() as usize)
            .max(1);

        let mut rng = StdRng::seed_from_u64(params.seed);
        let n = x.len();
        let mut trees = Vec::with_capacity(params.n_estimators);
        for _ in 0..params.n_estimators {
            let indices: Vec<usize> = if params.bootstrap {
                (0..n).map(|_| rng.gen_range(0..n)).collect()
            } else {
                (0..n).collect()
            };
            let mut builder = TreeBuilder {
                x,
                y,
                n_outputs,
                max_features,
                rng: &mut rng,
            };
            trees.push(builder.build(&indices));
        }

        tracing::debug!(
            trees = trees.len(),
            n_features,
            n_outputs,
            max_features,
            "Random forest fitted"
        );

        Ok(Self {
            trees,
            n_features,
            n_outputs,
        })
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_outputs(&self) -> usize {
        self.n_outputs
    }

    /// Mean positive probability per output across all trees.
    pub fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        let mut totals = vec![0.0; self.n_outputs];
        for tree in &self.trees {
            for (total, p) in totals.iter_mut().zip(tree.leaf_for(row)) {
                *total += p;
            }
        }
        let count = self.trees.len().max(1) as f64;
        totals.into_iter().map(|t| t / count).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (Vec<Vec<f64>>, Vec<Vec<bool>>) {
        let x = vec![
            vec![0.0, 1.0],
            vec![0.1, 1.0],
            vec![0.9, 1.0],
            vec![1.0, 1.0],
        ];
        let y = vec![
            vec![true, false],
            vec![true, false],
            vec![false, true],
            vec![false, true],
        ];
        (x, y)
    }

    #[test]
    fn fit_rejects_empty() {
        let err = RandomForest::fit(&[], &[], &ForestParams::default()).unwrap_err();
        assert_eq!(err, ForestError::EmptyTrainingSet);
    }

    #[test]
    fn fit_rejects_label_mismatch() {
        let err = RandomForest::fit(&[vec![1.0]], &[], &ForestParams::default()).unwrap_err();
        assert_eq!(err, ForestError::LabelMismatch { rows: 1, labels: 0 });
    }

    #[test]
    fn fit_rejects_ragged_rows() {
        let x = vec![vec![1.0, 2.0], vec![1.0]];
        let y = vec![vec![true], vec![false]];
        let err = RandomForest::fit(&x, &y, &ForestParams::default()).unwrap_err();
        assert_eq!(
            err,
            ForestError::RaggedRow {
                index: 1,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn single_tree_without_bootstrap_separates_classes() {
        let (x, y) = separable();
        let params = ForestParams {
            n_estimators: 1,
            bootstrap: false,
            ..ForestParams::default()
        };
        let forest = RandomForest::fit(&x, &y, &params).unwrap();
        assert_eq!(forest.predict_proba(&[0.05, 1.0]), vec![1.0, 0.0]);
        assert_eq!(forest.predict_proba(&[0.95, 1.0]), vec![0.0, 1.0]);
    }

    #[test]
    fn constant_feature_is_skipped_for_informative_one() {
        // max_features = 1 may pick the constant column first; the scan
        // must continue to the informative one.
        let (x, y) = separable();
        let params = ForestParams {
            n_estimators: 10,
            bootstrap: false,
            max_features: Some(1),
            ..ForestParams::default()
        };
        let forest = RandomForest::fit(&x, &y, &params).unwrap();
        assert_eq!(forest.predict_proba(&[0.0, 1.0]), vec![1.0, 0.0]);
    }

    #[test]
    fn probabilities_are_fractions() {
        let (x, y) = separable();
        let forest = RandomForest::fit(&x, &y, &ForestParams::default()).unwrap();
        let probs = forest.predict_proba(&[0.5, 1.0]);
        assert_eq!(probs.len(), 2);
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn same_seed_same_forest() {
        let (x, y) = separable();
        let params = ForestParams::default();
        let a = RandomForest::fit(&x, &y, &params).unwrap();
        let b = RandomForest::fit(&x, &y, &params).unwrap();
        for row in [[0.2, 1.0], [0.5, 1.0], [0.8, 1.0]] {
            assert_eq!(a.predict_proba(&row), b.predict_proba(&row));
        }
    }

    #[test]
    fn pure_node_is_leaf() {
        let x = vec![vec![0.0], vec![1.0]];
        let y = vec![vec![true], vec![true]];
        let forest = RandomForest::fit(&x, &y, &ForestParams::default()).unwrap();
        assert_eq!(forest.predict_proba(&[0.5]), vec![1.0]);
        assert_eq!(forest.n_features(), 1);
        assert_eq!(forest.n_outputs(), 1);
    }
}
