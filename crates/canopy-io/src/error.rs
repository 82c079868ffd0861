//! I/O error types for canopy-io.

use std::path::PathBuf;

/// Errors from loading tabular CSV data and checking dataset schemas.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the header has no column besides the label.
    #[error("no feature columns in {path}: header has {n_columns} column(s), need a label and at least one feature")]
    NoFeatureColumns {
        /// Path to the CSV file.
        path: PathBuf,
        /// Number of header columns.
        n_columns: usize,
    },

    /// Returned when a data row has a different number of columns than the header.
    #[error("inconsistent row length in {path}: row {row_index} has {got} columns, expected {expected}")]
    InconsistentRowLength {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Expected number of columns (from header).
        expected: usize,
        /// Actual number of columns in this row.
        got: usize,
    },

    /// Returned when a feature cell is empty, NaN, infinite, or not a number.
    #[error("non-numeric value in {path}: row {row_index}, column \"{column}\", raw value \"{raw}\"")]
    NonNumericValue {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Header name of the offending column.
        column: String,
        /// The raw cell text.
        raw: String,
    },

    /// Returned when two datasets disagree on feature names or their order.
    #[error("feature columns differ: train has {train:?}, test has {test:?}")]
    SchemaMismatch {
        /// Feature names of the training dataset.
        train: Vec<String>,
        /// Feature names of the test dataset.
        test: Vec<String>,
    },

    /// Returned when two datasets name their label column differently.
    #[error("label column differs: train uses \"{train}\", test uses \"{test}\"")]
    LabelColumnMismatch {
        /// Label column of the training dataset.
        train: String,
        /// Label column of the test dataset.
        test: String,
    },
}
