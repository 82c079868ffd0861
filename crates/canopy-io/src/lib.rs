//! Tabular CSV ingestion and schema checks for the canopy pipeline.

mod dataset;
mod error;
mod reader;
mod schema;

pub use dataset::Dataset;
pub use error::IoError;
pub use reader::TableReader;
pub use schema::ensure_same_schema;
