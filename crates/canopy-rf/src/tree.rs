use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::{
    RfError,
    node::{Impurity, Node, NodeIndex},
    split::{SplitContext, SplitCriterion},
};

/// Configuration for a single CART decision tree.
///
/// Construct via [`DecisionTreeConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter           | Default               |
/// |---------------------|-----------------------|
/// | `criterion`         | `Gini`                |
/// | `max_depth`         | `None` (grow to purity) |
/// | `min_samples_split` | 2                     |
/// | `min_samples_leaf`  | 1                     |
/// | `max_features`      | `None` (all features) |
/// | `seed`              | 0                     |
#[derive(Debug, Clone)]
pub struct DecisionTreeConfig {
    pub(crate) criterion: SplitCriterion,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) max_features: Option<usize>,
    pub(crate) seed: u64,
}

impl DecisionTreeConfig {
    /// Create a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            criterion: SplitCriterion::Gini,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 0,
        }
    }

    /// Set the split quality criterion.
    #[must_use]
    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set the maximum tree depth (root is depth 0). `None` grows until leaves are pure.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the minimum number of samples required to attempt a split.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Set the minimum number of samples required in each leaf after a split.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Set how many features to draw per split. `None` means all.
    #[must_use]
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the random seed for feature sampling.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Train a decision tree on row-major `features` and zero-based class `labels`.
    ///
    /// # Errors
    ///
    /// | Variant                              | When                                            |
    /// |--------------------------------------|-------------------------------------------------|
    /// | [`RfError::EmptyDataset`]            | `features` is empty                             |
    /// | [`RfError::ZeroFeatures`]            | rows have zero feature columns                  |
    /// | [`RfError::LabelCountMismatch`]      | `labels.len() != features.len()`                |
    /// | [`RfError::FeatureCountMismatch`]    | rows have inconsistent lengths                  |
    /// | [`RfError::NonFiniteValue`]          | any value is NaN or infinite                    |
    /// | [`RfError::InvalidMaxFeatures`]      | `max_features` outside [1, n_features]          |
    /// | [`RfError::InvalidMaxDepth`]         | `max_depth` is `Some(0)`                        |
    /// | [`RfError::InvalidMinSamplesSplit`]  | `min_samples_split` < 2                         |
    /// | [`RfError::InvalidMinSamplesLeaf`]   | `min_samples_leaf` < 1                          |
    #[instrument(skip_all, fields(n_samples = features.len()))]
    pub fn fit(&self, features: &[Vec<f64>], labels: &[usize]) -> Result<DecisionTree, RfError> {
        let n_features = validate_rows(features, labels.len())?;
        self.validate(n_features)?;
        let n_classes = labels.iter().max().map_or(0, |&m| m + 1);
        let columns = to_columns(features, n_features);
        let indices: Vec<usize> = (0..features.len()).collect();
        Ok(self.grow(&columns, labels, &indices, n_classes))
    }

    /// Check the hyperparameters against the dataset width.
    pub(crate) fn validate(&self, n_features: usize) -> Result<(), RfError> {
        if self.max_depth == Some(0) {
            return Err(RfError::InvalidMaxDepth { max_depth: 0 });
        }
        if self.min_samples_split < 2 {
            return Err(RfError::InvalidMinSamplesSplit {
                min_samples_split: self.min_samples_split,
            });
        }
        if self.min_samples_leaf < 1 {
            return Err(RfError::InvalidMinSamplesLeaf {
                min_samples_leaf: self.min_samples_leaf,
            });
        }
        let max_features = self.max_features.unwrap_or(n_features);
        if max_features == 0 || max_features > n_features {
            return Err(RfError::InvalidMaxFeatures {
                max_features,
                n_features,
            });
        }
        Ok(())
    }

    /// Grow a tree over `sample_indices` (duplicates allowed, as in a bootstrap).
    ///
    /// Inputs must already be validated.
    pub(crate) fn grow(
        &self,
        columns: &[Vec<f64>],
        labels: &[usize],
        sample_indices: &[usize],
        n_classes: usize,
    ) -> DecisionTree {
        let n_features = columns.len();
        let ctx = SplitContext {
            columns,
            labels,
            n_classes,
            criterion: self.criterion,
            max_features: self.max_features.unwrap_or(n_features),
            min_samples_leaf: self.min_samples_leaf,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        // Each pending node owns a reserved arena slot; children are reserved
        // before their parent is written so indices are known up front.
        let mut nodes = vec![placeholder()];
        let mut pending: Vec<(NodeIndex, Vec<usize>, usize)> =
            vec![(NodeIndex::new(0), sample_indices.to_vec(), 0)];

        while let Some((slot, indices, depth)) = pending.pop() {
            let n_samples = indices.len();
            let mut class_counts = vec![0usize; n_classes];
            for &si in &indices {
                class_counts[labels[si]] += 1;
            }
            let impurity = self.criterion.impurity(&class_counts, n_samples);

            let stop = impurity.is_pure()
                || n_samples < self.min_samples_split
                || self.max_depth.is_some_and(|d| depth >= d);
            let split = if stop {
                None
            } else {
                ctx.find_best_split(&indices, &mut rng)
            };

            nodes[slot.index()] = match split {
                None => Node::Leaf {
                    class_counts,
                    impurity,
                    n_samples,
                },
                Some(split) => {
                    let left = NodeIndex::new(nodes.len());
                    let right = NodeIndex::new(nodes.len() + 1);
                    nodes.push(placeholder());
                    nodes.push(placeholder());
                    // Right is pushed first so the left subtree is grown first.
                    pending.push((right, split.right_indices, depth + 1));
                    pending.push((left, split.left_indices, depth + 1));
                    Node::Split {
                        feature: split.feature,
                        threshold: split.threshold,
                        left,
                        right,
                        impurity,
                        n_samples,
                        impurity_decrease: split.impurity_decrease,
                    }
                }
            };
        }

        debug!(n_nodes = nodes.len(), "decision tree grown");

        DecisionTree {
            nodes,
            n_features,
            n_classes,
        }
    }
}

impl Default for DecisionTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn placeholder() -> Node {
    Node::Leaf {
        class_counts: Vec::new(),
        impurity: Impurity::new(0.0),
        n_samples: 0,
    }
}

/// Validate a row-major matrix and return its width.
pub(crate) fn validate_rows(features: &[Vec<f64>], n_labels: usize) -> Result<usize, RfError> {
    let Some(first) = features.first() else {
        return Err(RfError::EmptyDataset);
    };
    if n_labels != features.len() {
        return Err(RfError::LabelCountMismatch {
            n_samples: features.len(),
            n_labels,
        });
    }
    let n_features = first.len();
    if n_features == 0 {
        return Err(RfError::ZeroFeatures);
    }
    for (sample_index, row) in features.iter().enumerate() {
        if row.len() != n_features {
            return Err(RfError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        if let Some(feature_index) = row.iter().position(|v| !v.is_finite()) {
            return Err(RfError::NonFiniteValue {
                sample_index,
                feature_index,
            });
        }
    }
    Ok(n_features)
}

/// Transpose row-major features into column-major layout.
pub(crate) fn to_columns(features: &[Vec<f64>], n_features: usize) -> Vec<Vec<f64>> {
    (0..n_features)
        .map(|f| features.iter().map(|row| row[f]).collect())
        .collect()
}

/// A fitted CART decision tree stored as an arena of [`Node`]s.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DecisionTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
}

impl DecisionTree {
    /// Predict the class index for a single sample.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<usize, RfError> {
        let proba = self.predict_proba(sample)?;
        Ok(argmax(&proba))
    }

    /// Return the training class frequencies of the leaf `sample` falls into.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict_proba(&self, sample: &[f64]) -> Result<Vec<f64>, RfError> {
        if sample.len() != self.n_features {
            return Err(RfError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        let leaf = &self.nodes[self.traverse(sample)];
        Ok(leaf.distribution().unwrap_or_else(|| vec![0.0; self.n_classes]))
    }

    /// Mean decrease in impurity per feature, normalized to sum to 1.0.
    ///
    /// All zeros when the tree is a single leaf.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0f64; self.n_features];
        for node in &self.nodes {
            if let Node::Split {
                feature,
                impurity_decrease,
                ..
            } = node
            {
                totals[feature.index()] += impurity_decrease;
            }
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|v| *v /= sum);
        }
        totals
    }

    /// Return the total number of nodes.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaves.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the maximum depth; a lone root leaf has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, d)) = stack.pop() {
            match &self.nodes[idx] {
                Node::Leaf { .. } => max_depth = max_depth.max(d),
                Node::Split { left, right, .. } => {
                    stack.push((left.index(), d + 1));
                    stack.push((right.index(), d + 1));
                }
            }
        }
        max_depth
    }

    fn traverse(&self, sample: &[f64]) -> usize {
        let mut idx = 0usize;
        while let Node::Split {
            feature,
            threshold,
            left,
            right,
            ..
        } = &self.nodes[idx]
        {
            idx = if sample[feature.index()] <= *threshold {
                left.index()
            } else {
                right.index()
            };
        }
        idx
    }
}

/// Index of the largest value; ties go to the lowest index.
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}
