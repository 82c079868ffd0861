//! Capability traits separating "can be trained" from "can predict and be persisted".
//!
//! The training pipeline is written against these traits so another
//! classifier can replace the random forest without touching the stages.

use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::config::RandomForestConfig;
use crate::error::RfError;
use crate::forest::RandomForest;
use crate::labels::ClassLabels;

/// Fixed artifact name inside a model directory.
pub const MODEL_FILE_NAME: &str = "model.joblib";

/// An unfitted learner.
pub trait Estimator {
    /// The fitted model this estimator produces.
    type Model: Classifier;

    /// Fit on row-major `features`, raw class `labels`, and column names.
    ///
    /// # Errors
    ///
    /// Returns an [`RfError`] describing the first shape or value problem.
    fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[String],
        feature_names: &[String],
    ) -> Result<Self::Model, RfError>;
}

/// A fitted model: predicts class names and round-trips through a file.
pub trait Classifier: Sized {
    /// Feature names the model was trained on, in order.
    fn feature_names(&self) -> &[String];

    /// Classes the model can predict.
    fn classes(&self) -> &ClassLabels;

    /// Predict one class name per row of named feature columns.
    ///
    /// # Errors
    ///
    /// Returns an [`RfError`] when the columns do not match the training columns.
    fn predict(&self, feature_names: &[String], features: &[Vec<f64>]) -> Result<Vec<String>, RfError>;

    /// Write the model to `path`.
    ///
    /// # Errors
    ///
    /// Returns an [`RfError`] when encoding or writing fails.
    fn save(&self, path: &Path) -> Result<(), RfError>;

    /// Read a model previously written by [`Classifier::save`].
    ///
    /// # Errors
    ///
    /// Returns an [`RfError`] when the file is missing, corrupt, or from another format version.
    fn load(path: &Path) -> Result<Self, RfError>;
}

impl Estimator for RandomForestConfig {
    type Model = RandomForest;

    fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[String],
        feature_names: &[String],
    ) -> Result<RandomForest, RfError> {
        RandomForestConfig::fit(self, features, labels, feature_names)
    }
}

impl Classifier for RandomForest {
    fn feature_names(&self) -> &[String] {
        RandomForest::feature_names(self)
    }

    fn classes(&self) -> &ClassLabels {
        RandomForest::classes(self)
    }

    fn predict(&self, feature_names: &[String], features: &[Vec<f64>]) -> Result<Vec<String>, RfError> {
        self.predict_named(feature_names, features)
    }

    fn save(&self, path: &Path) -> Result<(), RfError> {
        RandomForest::save(self, path)
    }

    fn load(path: &Path) -> Result<Self, RfError> {
        RandomForest::load(path)
    }
}

/// Path of the model artifact inside `model_dir`.
#[must_use]
pub fn model_path(model_dir: &Path) -> PathBuf {
    model_dir.join(MODEL_FILE_NAME)
}

/// Persist `model` as `model_dir/model.joblib`, creating the directory if needed.
///
/// Returns the path written.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`RfError::ModelDirCreate`] | `model_dir` cannot be created |
/// | [`RfError::SerializeModel`] / [`RfError::WriteModel`] | from [`Classifier::save`] |
#[instrument(skip(model), fields(dir = %model_dir.display()))]
pub fn save_model<C: Classifier>(model: &C, model_dir: &Path) -> Result<PathBuf, RfError> {
    std::fs::create_dir_all(model_dir).map_err(|e| RfError::ModelDirCreate {
        path: model_dir.to_path_buf(),
        source: e,
    })?;
    let path = model_path(model_dir);
    model.save(&path)?;
    info!(path = %path.display(), "model persisted");
    Ok(path)
}

/// Load the model stored as `model_dir/model.joblib`.
///
/// # Errors
///
/// Propagates [`Classifier::load`] errors.
#[instrument(fields(dir = %model_dir.display()))]
pub fn load_model<C: Classifier>(model_dir: &Path) -> Result<C, RfError> {
    C::load(&model_path(model_dir))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn train<E: Estimator>(estimator: &E) -> E::Model {
        let features = vec![vec![0.0], vec![1.0], vec![9.0], vec![10.0]];
        let labels: Vec<String> = ["no", "no", "yes", "yes"].map(String::from).to_vec();
        estimator.fit(&features, &labels, &["score".to_string()]).unwrap()
    }

    #[test]
    fn store_uses_fixed_file_name() {
        let dir = TempDir::new().unwrap();
        let model = train(&RandomForestConfig::new(3).unwrap());
        let path = save_model(&model, dir.path()).unwrap();
        assert_eq!(path, dir.path().join("model.joblib"));
        assert!(path.is_file());
    }

    #[test]
    fn store_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let model = train(&RandomForestConfig::new(3).unwrap());
        save_model(&model, &nested).unwrap();
        assert!(model_path(&nested).is_file());
    }

    #[test]
    fn load_model_round_trip_through_trait() {
        let dir = TempDir::new().unwrap();
        let model = train(&RandomForestConfig::new(3).unwrap());
        save_model(&model, dir.path()).unwrap();

        let loaded: RandomForest = load_model(dir.path()).unwrap();
        let names = vec!["score".to_string()];
        let rows = vec![vec![0.5], vec![9.5]];
        assert_eq!(
            Classifier::predict(&loaded, &names, &rows).unwrap(),
            Classifier::predict(&model, &names, &rows).unwrap()
        );
        assert_eq!(Classifier::classes(&loaded).names(), &["no", "yes"]);
    }

    #[test]
    fn load_model_from_empty_directory_fails() {
        let dir = TempDir::new().unwrap();
        let err = load_model::<RandomForest>(dir.path()).unwrap_err();
        assert!(matches!(err, RfError::ReadModel { .. }));
    }
}
