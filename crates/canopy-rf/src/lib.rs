//! Random Forest classification: train, persist, predict, score.
//!
//! Provides a hand-rolled Random Forest classifier with CART decision trees,
//! Gini/Entropy split criteria, parallel training via rayon, MDI feature
//! importance, a versioned bincode model store, and classification metrics.
//!
//! Class labels are arbitrary strings; see [`ClassLabels`] for how they are
//! ordered and indexed.

mod classifier;
mod config;
mod error;
mod forest;
mod importance;
mod labels;
mod metrics;
mod node;
mod predict;
mod serialize;
mod split;
mod tree;

pub use classifier::{Classifier, Estimator, MODEL_FILE_NAME, load_model, model_path, save_model};
pub use config::{MaxFeatures, RandomForestConfig};
pub use error::RfError;
pub use forest::RandomForest;
pub use importance::RankedFeature;
pub use labels::ClassLabels;
pub use metrics::{AverageMetrics, ClassMetrics, ClassificationReport, ConfusionMatrix, accuracy_score};
pub use node::{FeatureIndex, Impurity, Node, NodeIndex};
pub use predict::ClassDistribution;
pub use split::SplitCriterion;
pub use tree::{DecisionTree, DecisionTreeConfig};
