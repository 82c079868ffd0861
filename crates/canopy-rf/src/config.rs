//! Configuration builder for Random Forest training.

use crate::error::RfError;
use crate::forest::RandomForest;
use crate::split::SplitCriterion;

/// Strategy for determining the number of features to consider at each split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaxFeatures {
    /// Square root of total features, rounded down, at least 1.
    Sqrt,
    /// Log base 2 of total features, rounded down, at least 1.
    Log2,
    /// A fraction of total features, rounded down, at least 1 (must be in (0.0, 1.0]).
    Fraction(f64),
    /// A fixed count.
    Fixed(usize),
    /// All features (no subsampling).
    All,
}

impl MaxFeatures {
    /// Resolve to a concrete feature count for a dataset of width `n_features`.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidMaxFeatures`] if the count falls outside `[1, n_features]`.
    pub fn resolve(self, n_features: usize) -> Result<usize, RfError> {
        let resolved = match self {
            MaxFeatures::Sqrt => at_least_one((n_features as f64).sqrt()),
            MaxFeatures::Log2 => at_least_one((n_features as f64).log2()),
            MaxFeatures::Fraction(f) if f > 0.0 => at_least_one(n_features as f64 * f),
            MaxFeatures::Fraction(_) => 0,
            MaxFeatures::Fixed(n) => n,
            MaxFeatures::All => n_features,
        };
        if resolved == 0 || resolved > n_features {
            return Err(RfError::InvalidMaxFeatures {
                max_features: resolved,
                n_features,
            });
        }
        Ok(resolved)
    }
}

fn at_least_one(count: f64) -> usize {
    count.floor().max(1.0) as usize
}

/// Configuration for Random Forest training.
///
/// Construct via [`RandomForestConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter           | Default    |
/// |---------------------|------------|
/// | `max_features`      | `Sqrt`     |
/// | `max_depth`         | `None`     |
/// | `min_samples_split` | 2          |
/// | `min_samples_leaf`  | 1          |
/// | `criterion`         | `Gini`     |
/// | `bootstrap`         | `true`     |
/// | `seed`              | 0          |
#[derive(Debug, Clone)]
pub struct RandomForestConfig {
    pub(crate) n_trees: usize,
    pub(crate) max_features: MaxFeatures,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) criterion: SplitCriterion,
    pub(crate) bootstrap: bool,
    pub(crate) seed: u64,
}

impl RandomForestConfig {
    /// Create a new config with the given number of trees.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidTreeCount`] if `n_trees` is zero.
    pub fn new(n_trees: usize) -> Result<Self, RfError> {
        if n_trees == 0 {
            return Err(RfError::InvalidTreeCount { n_trees });
        }
        Ok(Self {
            n_trees,
            max_features: MaxFeatures::Sqrt,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            criterion: SplitCriterion::Gini,
            bootstrap: true,
            seed: 0,
        })
    }

    /// Set the max features strategy.
    #[must_use]
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the maximum tree depth. `None` means unlimited.
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

    /// Set the split quality criterion.
    #[must_use]
    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Draw a bootstrap sample per tree (`true`) or give every tree all rows.
    #[must_use]
    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Set the random seed for reproducibility.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Return the max features strategy.
    #[must_use]
    pub fn max_features(&self) -> MaxFeatures {
        self.max_features
    }

    /// Return the split criterion.
    #[must_use]
    pub fn criterion(&self) -> SplitCriterion {
        self.criterion
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Train a Random Forest.
    ///
    /// `features[sample_idx][feature_idx]` is row-major; `labels[sample_idx]`
    /// is the raw class name; `feature_names` names each feature column.
    ///
    /// # Errors
    ///
    /// | Variant                                | When                                            |
    /// |----------------------------------------|-------------------------------------------------|
    /// | [`RfError::EmptyDataset`]              | `features` is empty                             |
    /// | [`RfError::ZeroFeatures`]              | rows have zero feature columns                  |
    /// | [`RfError::LabelCountMismatch`]        | `labels.len() != features.len()`                |
    /// | [`RfError::FeatureNameCountMismatch`]  | `feature_names.len()` differs from row width    |
    /// | [`RfError::FeatureCountMismatch`]      | rows have inconsistent lengths                  |
    /// | [`RfError::NonFiniteValue`]            | any value is NaN or infinite                    |
    /// | [`RfError::InvalidMaxFeatures`]        | resolved max_features outside [1, n_features]   |
    /// | [`RfError::InvalidMaxDepth`]           | `max_depth` is `Some(0)`                        |
    /// | [`RfError::InvalidMinSamplesSplit`]    | `min_samples_split` < 2                         |
    /// | [`RfError::InvalidMinSamplesLeaf`]     | `min_samples_leaf` < 1                          |
    pub fn fit<S: AsRef<str>>(
        &self,
        features: &[Vec<f64>],
        labels: &[S],
        feature_names: &[String],
    ) -> Result<RandomForest, RfError> {
        crate::forest::train(self, features, labels, feature_names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_trees_rejected() {
        assert!(matches!(
            RandomForestConfig::new(0),
            Err(RfError::InvalidTreeCount { n_trees: 0 })
        ));
    }

    #[test]
    fn sqrt_rounds_down() {
        assert_eq!(MaxFeatures::Sqrt.resolve(1).unwrap(), 1);
        assert_eq!(MaxFeatures::Sqrt.resolve(2).unwrap(), 1);
        assert_eq!(MaxFeatures::Sqrt.resolve(3).unwrap(), 1);
        assert_eq!(MaxFeatures::Sqrt.resolve(4).unwrap(), 2);
        assert_eq!(MaxFeatures::Sqrt.resolve(10).unwrap(), 3);
    }

    #[test]
    fn log2_and_fraction() {
        assert_eq!(MaxFeatures::Log2.resolve(8).unwrap(), 3);
        assert_eq!(MaxFeatures::Log2.resolve(10).unwrap(), 3);
        assert_eq!(MaxFeatures::Log2.resolve(1).unwrap(), 1);
        assert_eq!(MaxFeatures::Fraction(0.5).resolve(5).unwrap(), 2);
        assert_eq!(MaxFeatures::Fraction(0.1).resolve(5).unwrap(), 1);
    }

    #[test]
    fn out_of_range_rejected() {
        assert!(MaxFeatures::Fixed(0).resolve(4).is_err());
        assert!(MaxFeatures::Fixed(5).resolve(4).is_err());
        assert!(MaxFeatures::Fraction(1.5).resolve(4).is_err());
        assert!(MaxFeatures::Fraction(0.0).resolve(4).is_err());
    }

    #[test]
    fn defaults() {
        let config = RandomForestConfig::new(100).unwrap();
        assert_eq!(config.n_trees(), 100);
        assert_eq!(config.max_features(), MaxFeatures::Sqrt);
        assert_eq!(config.criterion(), SplitCriterion::Gini);
        assert_eq!(config.seed(), 0);
    }
}
