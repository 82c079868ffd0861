//! The training run: load → fit → persist → evaluate, printing as it goes.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, instrument};

use canopy_io::{Dataset, TableReader, ensure_same_schema};
use canopy_rf::{
    Classifier, ClassificationReport, ConfusionMatrix, Estimator, RandomForest,
    RandomForestConfig, accuracy_score, save_model,
};

use crate::settings::Settings;

/// Scores of a fitted model on the test table.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// One predicted class name per test row, in row order.
    pub predictions: Vec<String>,
    /// Fraction of rows predicted correctly.
    pub accuracy: f64,
    /// Per-class precision, recall, F1 and support.
    pub report: ClassificationReport,
    /// Counts of true class versus predicted class.
    pub confusion: ConfusionMatrix,
}

/// Load the train and test tables and require that their columns agree.
///
/// # Errors
///
/// Fails when either file cannot be read or the schemas differ.
#[instrument(skip_all)]
pub fn load_datasets(settings: &Settings) -> Result<(Dataset, Dataset)> {
    let train = TableReader::new(&settings.train_dir, &settings.train_file)
        .read()
        .with_context(|| format!("failed to read training data {}", settings.train_path().display()))?;
    let test = TableReader::new(&settings.test_dir, &settings.test_file)
        .read()
        .with_context(|| format!("failed to read testing data {}", settings.test_path().display()))?;
    ensure_same_schema(&train, &test).context("training and testing tables are incompatible")?;
    Ok((train, test))
}

/// Forest configuration for this run.
///
/// # Errors
///
/// Fails when `n_estimators` is zero.
pub fn estimator(settings: &Settings) -> Result<RandomForestConfig> {
    let config = RandomForestConfig::new(settings.n_estimators)
        .context("invalid forest configuration")?
        .with_seed(settings.random_state);
    Ok(config)
}

/// Fit `estimator` on the training table.
///
/// # Errors
///
/// Propagates the estimator's fit error (empty table, non-finite values, ...).
#[instrument(skip_all, fields(n_rows = train.n_samples()))]
pub fn train<E: Estimator>(estimator: &E, train: &Dataset) -> Result<E::Model> {
    estimator
        .fit(train.features(), train.labels(), train.feature_names())
        .context("failed to fit model")
}

/// Write the model into the configured model directory.
///
/// # Errors
///
/// Fails when the directory cannot be created or the file cannot be written.
pub fn persist<C: Classifier>(model: &C, settings: &Settings) -> Result<PathBuf> {
    save_model(model, &settings.model_dir)
        .with_context(|| format!("failed to persist model in {}", settings.model_dir.display()))
}

/// Predict every test row in one call and score the predictions.
///
/// # Errors
///
/// Fails when the test columns differ from the model's training columns or the
/// test table is empty.
#[instrument(skip_all, fields(n_rows = test.n_samples()))]
pub fn evaluate<C: Classifier>(model: &C, test: &Dataset) -> Result<Evaluation> {
    let predictions = model
        .predict(test.feature_names(), test.features())
        .context("failed to predict test rows")?;
    let accuracy = accuracy_score(test.labels(), &predictions).context("failed to score predictions")?;
    let confusion = ConfusionMatrix::from_labels(test.labels(), &predictions)
        .context("failed to build confusion matrix")?;
    let report = ClassificationReport::from_confusion(&confusion);
    info!(accuracy, "evaluation complete");
    Ok(Evaluation {
        predictions,
        accuracy,
        report,
        confusion,
    })
}

/// Run the whole pipeline, writing the human-readable log to `out`.
///
/// # Errors
///
/// Returns the first failing stage's error; later stages do not run.
pub fn run(settings: &Settings, out: &mut impl Write) -> Result<Evaluation> {
    info!(version = env!("CARGO_PKG_VERSION"), "reading data");
    let (train_set, test_set) = load_datasets(settings)?;

    writeln!(out, "Column order:")?;
    writeln!(out, "{:?}", train_set.feature_names())?;
    writeln!(out)?;
    writeln!(out, "Label column is: {}", train_set.label_name())?;
    writeln!(out)?;
    writeln!(out, "Data shape:")?;
    write_shape(out, "TRAINING", &train_set)?;
    write_shape(out, "TESTING", &test_set)?;

    writeln!(out, "Training RandomForest model.....")?;
    let model: RandomForest = train(&estimator(settings)?, &train_set)?;
    writeln!(out)?;
    writeln!(out, "Feature importances:")?;
    for feature in model.feature_importances() {
        writeln!(out, "{:>4}. {:<20} {:.4}", feature.rank, feature.name, feature.importance)?;
    }
    writeln!(out)?;

    let path = persist(&model, settings)?;
    writeln!(out, "Model persisted at {}", path.display())?;
    writeln!(out)?;

    let evaluation = evaluate(&model, &test_set)?;
    writeln!(out, "---- METRICS RESULTS FOR TESTING DATA ----")?;
    writeln!(out)?;
    writeln!(out, "Total Rows are: {}", test_set.n_samples())?;
    writeln!(out, "[TESTING] Model Accuracy is: {}", evaluation.accuracy)?;
    writeln!(out, "[TESTING] Testing Report:")?;
    writeln!(out, "{}", evaluation.report)?;
    writeln!(out, "[TESTING] Confusion Matrix:")?;
    write!(out, "{}", evaluation.confusion)?;
    out.flush()?;

    Ok(evaluation)
}

fn write_shape(out: &mut impl Write, name: &str, data: &Dataset) -> std::io::Result<()> {
    let (rows, cols) = data.shape();
    writeln!(out, "---- SHAPE OF {name} DATA ----")?;
    writeln!(out, "({rows}, {cols})")?;
    writeln!(out, "({rows},)")?;
    writeln!(out)
}
