//! Train a random forest on a CSV table, persist it, and score it on a
//! held-out table.
//!
//! The binary parses [`Cli`] into [`Settings`] and hands them to [`run`];
//! the individual stages are public so callers can compose them.

pub mod pipeline;
pub mod settings;

pub use pipeline::{Evaluation, estimator, evaluate, load_datasets, persist, run, train};
pub use settings::{Cli, Settings};
