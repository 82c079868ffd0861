//! In-memory labelled table.

/// A table of numeric feature columns plus one label column.
///
/// The label is the last column of the source file; `features` is row-major,
/// so `features[row][col]` belongs to `feature_names[col]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    feature_names: Vec<String>,
    label_name: String,
    features: Vec<Vec<f64>>,
    labels: Vec<String>,
}

impl Dataset {
    /// Assemble a dataset from already-parsed parts.
    ///
    /// The caller keeps rows and labels aligned; the reader is the usual
    /// way to obtain one.
    #[must_use]
    pub fn new(
        feature_names: Vec<String>,
        label_name: String,
        features: Vec<Vec<f64>>,
        labels: Vec<String>,
    ) -> Self {
        debug_assert_eq!(features.len(), labels.len(), "one label per row");
        Self {
            feature_names,
            label_name,
            features,
            labels,
        }
    }

    /// Return the feature column names in file order.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Return the label column name.
    #[must_use]
    pub fn label_name(&self) -> &str {
        &self.label_name
    }

    /// Return the feature matrix (row-major).
    #[must_use]
    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    /// Return the label of every row.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Return the number of data rows.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.labels.len()
    }

    /// Return the number of feature columns.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// `(rows, feature columns)` of the feature matrix.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.n_samples(), self.n_features())
    }

    /// Return `true` if the table has no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
