//! Prediction methods for the Random Forest ensemble.

use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::error::RfError;
use crate::forest::RandomForest;
use crate::tree::argmax;

/// Class probability distribution from a prediction.
#[derive(Debug, Clone)]
pub struct ClassDistribution {
    probs: Vec<f64>,
}

impl ClassDistribution {
    /// Return the predicted class index (argmax, ties to the lowest index).
    #[must_use]
    pub fn predicted_class(&self) -> usize {
        argmax(&self.probs)
    }

    /// Return the probability distribution as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.probs
    }
}

impl RandomForest {
    /// Average the leaf class frequencies of every tree for one sample.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict_proba(&self, sample: &[f64]) -> Result<ClassDistribution, RfError> {
        if sample.len() != self.n_features {
            return Err(RfError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }

        let mut avg = vec![0.0f64; self.classes.len()];
        for tree in &self.trees {
            for (acc, p) in avg.iter_mut().zip(tree.predict_proba(sample)?) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f64;
        avg.iter_mut().for_each(|v| *v /= n);

        Ok(ClassDistribution { probs: avg })
    }

    /// Predict the class name for a single sample.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<String, RfError> {
        let class = self.predict_proba(sample)?.predicted_class();
        Ok(self.classes.name(class).unwrap_or_default().to_string())
    }

    /// Predict class names for a batch of samples in parallel.
    ///
    /// Output order matches input order.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] if any sample has the wrong feature count.
    pub fn predict_batch(&self, features: &[Vec<f64>]) -> Result<Vec<String>, RfError> {
        features
            .into_par_iter()
            .map(|sample| self.predict(sample))
            .collect()
    }

    /// Predict a batch whose columns are named, rejecting columns that are not
    /// exactly the training columns in training order.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::FeatureNameMismatch`] | `feature_names` differ from the training names |
    /// | [`RfError::PredictionFeatureMismatch`] | a row has the wrong width |
    pub fn predict_named(
        &self,
        feature_names: &[String],
        features: &[Vec<f64>],
    ) -> Result<Vec<String>, RfError> {
        if feature_names != self.feature_names.as_slice() {
            return Err(RfError::FeatureNameMismatch {
                expected: self.feature_names.clone(),
                got: feature_names.to_vec(),
            });
        }
        self.predict_batch(features)
    }
}
