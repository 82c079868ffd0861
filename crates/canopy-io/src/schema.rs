//! Train/test schema compatibility.

use tracing::debug;

use crate::IoError;
use crate::dataset::Dataset;

/// Check that `test` has the same feature columns, in the same order, and the
/// same label column as `train`.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::SchemaMismatch`] | feature names or their order differ |
/// | [`IoError::LabelColumnMismatch`] | label column names differ |
pub fn ensure_same_schema(train: &Dataset, test: &Dataset) -> Result<(), IoError> {
    if train.feature_names() != test.feature_names() {
        return Err(IoError::SchemaMismatch {
            train: train.feature_names().to_vec(),
            test: test.feature_names().to_vec(),
        });
    }
    if train.label_name() != test.label_name() {
        return Err(IoError::LabelColumnMismatch {
            train: train.label_name().to_string(),
            test: test.label_name().to_string(),
        });
    }
    debug!(n_features = train.n_features(), "train and test schemas match");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(features: &[&str], label: &str) -> Dataset {
        Dataset::new(
            features.iter().map(|s| s.to_string()).collect(),
            label.to_string(),
            vec![],
            vec![],
        )
    }

    #[test]
    fn identical_schemas_pass() {
        assert!(ensure_same_schema(&table(&["a", "b"], "y"), &table(&["a", "b"], "y")).is_ok());
    }

    #[test]
    fn reordered_features_fail() {
        let err = ensure_same_schema(&table(&["a", "b"], "y"), &table(&["b", "a"], "y")).unwrap_err();
        assert!(matches!(err, IoError::SchemaMismatch { .. }));
    }

    #[test]
    fn extra_feature_fails() {
        let err = ensure_same_schema(&table(&["a"], "y"), &table(&["a", "b"], "y")).unwrap_err();
        assert!(matches!(err, IoError::SchemaMismatch { .. }));
    }

    #[test]
    fn renamed_label_fails() {
        let err = ensure_same_schema(&table(&["a"], "y"), &table(&["a"], "target")).unwrap_err();
        assert!(matches!(err, IoError::LabelColumnMismatch { .. }));
    }
}
