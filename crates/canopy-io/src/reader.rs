//! CSV table reader: last column is the label, the rest are numeric features.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::IoError;
use crate::dataset::Dataset;

/// Reads a labelled table from `dir/filename`.
///
/// Expected CSV format:
/// - Header row required, naming every column
/// - `feature1,feature2,...,featureN,label`
/// - Feature cells parse as finite floats; label cells are kept verbatim
/// - All rows have the same number of columns as the header
///
/// A header with no data rows yields an empty [`Dataset`].
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::NoFeatureColumns`] | Header has fewer than two columns |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::NonNumericValue`] | Feature cell is empty, NaN, Inf, or not a float |
pub struct TableReader {
    path: PathBuf,
}

impl TableReader {
    /// Create a reader for `filename` inside `dir`.
    pub fn new(dir: &Path, filename: &str) -> Self {
        Self {
            path: dir.join(filename),
        }
    }

    /// Return the resolved file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and validate the CSV file, returning a [`Dataset`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Dataset, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) lets InconsistentRowLength report short rows instead of
        // a generic CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?.clone();
        let expected_cols = header.len();
        debug!(expected_cols, "read CSV header");

        if expected_cols < 2 {
            return Err(IoError::NoFeatureColumns {
                path: self.path.clone(),
                n_columns: expected_cols,
            });
        }

        let label_col = expected_cols - 1;
        let feature_names: Vec<String> = header.iter().take(label_col).map(String::from).collect();
        let label_name = header.get(label_col).unwrap_or_default().to_string();

        let mut features = Vec::new();
        let mut labels = Vec::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;

            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            let mut row = Vec::with_capacity(label_col);
            for (col_index, raw) in record.iter().take(label_col).enumerate() {
                let value = raw
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| IoError::NonNumericValue {
                        path: self.path.clone(),
                        row_index,
                        column: feature_names[col_index].clone(),
                        raw: raw.to_string(),
                    })?;
                row.push(value);
            }

            features.push(row);
            labels.push(record.get(label_col).unwrap_or_default().to_string());
        }

        info!(
            n_rows = labels.len(),
            n_features = feature_names.len(),
            label = %label_name,
            "table loaded"
        );

        Ok(Dataset::new(feature_names, label_name, features, labels))
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}
