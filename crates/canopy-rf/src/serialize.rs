//! On-disk layout of a fitted forest.
//!
//! A model file holds a single bincode record with these fields in order:
//!
//! 1. `version`: `u32`, currently [`LAYOUT_VERSION`]
//! 2. `feature_names`: the training columns, in training order
//! 3. `classes`: the class names, in class-index order
//! 4. `trees`: the fitted trees
//!
//! The version is decoded on its own before anything else, so a file written
//! by another layout is reported as such rather than as a decode failure.

use std::path::Path;

use tracing::{debug, instrument, warn};

use crate::error::RfError;
use crate::forest::RandomForest;
use crate::labels::ClassLabels;
use crate::tree::DecisionTree;

const LAYOUT_VERSION: u32 = 2;

/// Write side: borrows the forest so encoding never clones the trees.
#[derive(serde::Serialize)]
struct ArtifactRef<'a> {
    version: u32,
    feature_names: &'a [String],
    classes: &'a ClassLabels,
    trees: &'a [DecisionTree],
}

/// Read side; field order and types must mirror [`ArtifactRef`].
#[derive(serde::Deserialize)]
struct Artifact {
    version: u32,
    feature_names: Vec<String>,
    classes: ClassLabels,
    trees: Vec<DecisionTree>,
}

impl Artifact {
    /// First disagreement between the header fields and the trees, if any.
    fn inconsistency(&self) -> Option<String> {
        if self.trees.is_empty() {
            return Some("no trees".to_string());
        }
        if self.classes.is_empty() {
            return Some("no classes".to_string());
        }
        let n_features = self.feature_names.len();
        let n_classes = self.classes.len();
        self.trees.iter().enumerate().find_map(|(i, tree)| {
            if tree.n_features != n_features {
                Some(format!(
                    "tree {i} expects {} features but {n_features} are named",
                    tree.n_features
                ))
            } else if tree.n_classes != n_classes {
                Some(format!(
                    "tree {i} votes over {} classes but {n_classes} are named",
                    tree.n_classes
                ))
            } else {
                None
            }
        })
    }

    fn into_forest(self) -> RandomForest {
        RandomForest {
            n_features: self.feature_names.len(),
            trees: self.trees,
            feature_names: self.feature_names,
            classes: self.classes,
        }
    }
}

impl RandomForest {
    /// The bytes [`RandomForest::save`] writes.
    ///
    /// Two forests fitted on the same data with the same seed produce the same
    /// bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::SerializeModel`] if bincode encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RfError> {
        let artifact = ArtifactRef {
            version: LAYOUT_VERSION,
            feature_names: &self.feature_names,
            classes: &self.classes,
            trees: &self.trees,
        };
        bincode::serialize(&artifact).map_err(|source| RfError::SerializeModel { source })
    }

    /// Write the model file at `path`. An existing file is replaced.
    ///
    /// # Errors
    ///
    /// [`RfError::SerializeModel`] when encoding fails, [`RfError::WriteModel`]
    /// when the file cannot be written.
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RfError> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        std::fs::write(path, &bytes).map_err(|source| RfError::WriteModel {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(bytes = bytes.len(), trees = self.trees.len(), "wrote model file");
        Ok(())
    }

    /// Read a model file written by [`RandomForest::save`].
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::ReadModel`] | the file cannot be read |
    /// | [`RfError::IncompatibleModelVersion`] | the file uses another layout version |
    /// | [`RfError::DeserializeModel`] | the record is truncated or malformed |
    /// | [`RfError::InconsistentModel`] | the trees disagree with the stored names |
    #[instrument(fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RfError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| RfError::ReadModel {
            path: path.to_path_buf(),
            source,
        })?;

        let decode_error = |source| RfError::DeserializeModel {
            path: path.to_path_buf(),
            source,
        };

        // bincode's default decoder ignores trailing bytes, which lets the
        // leading version be read alone.
        let version: u32 = bincode::deserialize(&bytes).map_err(decode_error)?;
        if version != LAYOUT_VERSION {
            warn!(found = version, expected = LAYOUT_VERSION, "unsupported model layout");
            return Err(RfError::IncompatibleModelVersion {
                expected: LAYOUT_VERSION,
                found: version,
                path: path.to_path_buf(),
            });
        }

        let artifact: Artifact = bincode::deserialize(&bytes).map_err(decode_error)?;
        if let Some(detail) = artifact.inconsistency() {
            return Err(RfError::InconsistentModel {
                path: path.to_path_buf(),
                detail,
            });
        }

        let forest = artifact.into_forest();
        debug!(
            trees = forest.trees.len(),
            features = forest.n_features,
            classes = forest.classes.len(),
            "read model file"
        );
        Ok(forest)
    }
}
