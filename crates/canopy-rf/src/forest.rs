//! Random Forest training with parallel tree construction.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::config::RandomForestConfig;
use crate::error::RfError;
use crate::labels::ClassLabels;
use crate::tree::{DecisionTree, DecisionTreeConfig, to_columns, validate_rows};

/// A fitted Random Forest ensemble.
#[derive(Debug, Clone)]
pub struct RandomForest {
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) n_features: usize,
    pub(crate) feature_names: Vec<String>,
    pub(crate) classes: ClassLabels,
}

/// Draw `n_samples` row indices with replacement.
fn bootstrap_sample(n_samples: usize, rng: &mut impl Rng) -> Vec<usize> {
    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
}

#[instrument(skip_all, fields(n_trees = config.n_trees, n_samples = features.len()))]
pub(crate) fn train<S: AsRef<str>>(
    config: &RandomForestConfig,
    features: &[Vec<f64>],
    labels: &[S],
    feature_names: &[String],
) -> Result<RandomForest, RfError> {
    let n_features = validate_rows(features, labels.len())?;
    if feature_names.len() != n_features {
        return Err(RfError::FeatureNameCountMismatch {
            n_features,
            n_names: feature_names.len(),
        });
    }
    let n_samples = features.len();
    let max_features = config.max_features.resolve(n_features)?;

    let classes = ClassLabels::from_labels(labels);
    let encoded = classes
        .encode(labels)
        .expect("every label is a member of the classes built from it");
    let n_classes = classes.len();

    let tree_template = DecisionTreeConfig::new()
        .with_criterion(config.criterion)
        .with_max_depth(config.max_depth)
        .with_min_samples_split(config.min_samples_split)
        .with_min_samples_leaf(config.min_samples_leaf)
        .with_max_features(Some(max_features));
    tree_template.validate(n_features)?;

    info!(
        n_trees = config.n_trees,
        n_samples,
        n_features,
        n_classes,
        max_features,
        "training random forest"
    );

    // Per-tree seeds come from one master stream so the forest does not
    // depend on how rayon schedules the trees.
    let mut master_rng = ChaCha8Rng::seed_from_u64(config.seed);
    let tree_seeds: Vec<u64> = (0..config.n_trees).map(|_| master_rng.r#gen()).collect();

    let columns = to_columns(features, n_features);
    let all_rows: Vec<usize> = (0..n_samples).collect();
    let n_trees = config.n_trees;
    let bootstrap = config.bootstrap;

    let trees: Vec<DecisionTree> = tree_seeds
        .into_par_iter()
        .enumerate()
        .map(|(i, seed)| {
            debug!(tree = i + 1, n_trees, "building tree");
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let rows = if bootstrap {
                bootstrap_sample(n_samples, &mut rng)
            } else {
                all_rows.clone()
            };
            tree_template
                .clone()
                .with_seed(rng.r#gen())
                .grow(&columns, &encoded, &rows, n_classes)
        })
        .collect();

    let forest = RandomForest {
        trees,
        n_features,
        feature_names: feature_names.to_vec(),
        classes,
    };

    info!(
        mean_depth = forest.mean_depth(),
        "random forest training complete"
    );

    Ok(forest)
}

impl RandomForest {
    /// Return the number of features this forest was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Return the number of trees in the ensemble.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Return the training feature names, in training column order.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Return the classes the forest can predict.
    #[must_use]
    pub fn classes(&self) -> &ClassLabels {
        &self.classes
    }

    /// Return the fitted trees.
    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    fn mean_depth(&self) -> f64 {
        let total: usize = self.trees.iter().map(DecisionTree::depth).sum();
        total as f64 / self.trees.len().max(1) as f64
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{MaxFeatures, RandomForestConfig};
    use crate::error::RfError;

    /// Three well-separated classes along `x`; `y` is constant noise.
    fn make_separable_data() -> (Vec<Vec<f64>>, Vec<String>, Vec<String>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for (class, offset) in [("low", 0.0), ("mid", 10.0), ("high", 20.0)] {
            for i in 0..20 {
                features.push(vec![offset + i as f64 * 0.15, 0.5]);
                labels.push(class.to_string());
            }
        }
        let names = vec!["x".to_string(), "y".to_string()];
        (features, labels, names)
    }

    #[test]
    fn three_class_separable_accuracy() {
        let (features, labels, names) = make_separable_data();
        let forest = RandomForestConfig::new(50)
            .unwrap()
            .with_max_features(MaxFeatures::All)
            .fit(&features, &labels, &names)
            .unwrap();

        let predictions = forest.predict_batch(&features).unwrap();
        let correct = predictions.iter().zip(&labels).filter(|(p, l)| p == l).count();
        assert_eq!(correct, labels.len());
        assert_eq!(forest.classes().names(), &["high", "low", "mid"]);
    }

    #[test]
    fn deterministic_with_same_seed() {
        let (features, labels, names) = make_separable_data();
        let fit = || {
            RandomForestConfig::new(10)
                .unwrap()
                .with_seed(99)
                .fit(&features, &labels, &names)
                .unwrap()
        };
        let (a, b) = (fit(), fit());
        assert_eq!(a.to_bytes().unwrap(), b.to_bytes().unwrap());
    }

    #[test]
    fn different_seeds_differ() {
        let (features, labels, names) = make_separable_data();
        let a = RandomForestConfig::new(10).unwrap().with_seed(1).fit(&features, &labels, &names).unwrap();
        let b = RandomForestConfig::new(10).unwrap().with_seed(2).fit(&features, &labels, &names).unwrap();
        assert_ne!(a.to_bytes().unwrap(), b.to_bytes().unwrap());
    }

    #[test]
    fn default_subsamples_features_on_two_columns() {
        // Both columns carry some signal, so a tree that sees one feature per
        // split must differ from one that always sees both.
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..100u32 {
            let class = i % 2;
            features.push(vec![
                f64::from(class) * 2.0 + f64::from(i % 5) * 0.7,
                f64::from(class) + f64::from((i * 7) % 11) * 0.3,
            ]);
            labels.push(class.to_string());
        }
        let names = vec!["f1".to_string(), "f2".to_string()];

        let default = RandomForestConfig::new(100).unwrap();
        assert_eq!(default.max_features().resolve(2).unwrap(), 1);
        let sampled = default.fit(&features, &labels, &names).unwrap();
        let exhaustive = RandomForestConfig::new(100)
            .unwrap()
            .with_max_features(MaxFeatures::All)
            .fit(&features, &labels, &names)
            .unwrap();
        assert_ne!(sampled.to_bytes().unwrap(), exhaustive.to_bytes().unwrap());
    }

    #[test]
    fn tree_count_matches_config() {
        let (features, labels, names) = make_separable_data();
        let forest = RandomForestConfig::new(7).unwrap().fit(&features, &labels, &names).unwrap();
        assert_eq!(forest.n_trees(), 7);
        assert_eq!(forest.n_features(), 2);
        assert_eq!(forest.n_classes(), 3);
    }

    #[test]
    fn without_bootstrap_every_tree_fits_training_rows() {
        let (features, labels, names) = make_separable_data();
        let forest = RandomForestConfig::new(5)
            .unwrap()
            .with_bootstrap(false)
            .fit(&features, &labels, &names)
            .unwrap();
        for tree in forest.trees() {
            assert_eq!(tree.nodes[0].n_samples(), features.len());
        }
    }

    #[test]
    fn empty_dataset_error() {
        let config = RandomForestConfig::new(10).unwrap();
        let err = config.fit::<String>(&[], &[], &[]).unwrap_err();
        assert!(matches!(err, RfError::EmptyDataset));
    }

    #[test]
    fn feature_name_count_mismatch_error() {
        let (features, labels, _) = make_separable_data();
        let err = RandomForestConfig::new(3)
            .unwrap()
            .fit(&features, &labels, &["x".to_string()])
            .unwrap_err();
        assert!(matches!(
            err,
            RfError::FeatureNameCountMismatch { n_features: 2, n_names: 1 }
        ));
    }
}
