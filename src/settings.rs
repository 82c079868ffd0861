//! Command-line surface and the immutable run settings derived from it.

use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use clap::{Command, CommandFactory, Parser};

/// Command-line arguments.
///
/// The three directories fall back to the `SM_*` environment variables when
/// the flag is absent; that fallback is the only place the environment is read.
///
/// Training jobs are often launched with extra hyperparameters this program
/// has no use for, so [`Cli::parse_known`] sets unrecognised arguments aside
/// instead of failing.
#[derive(Parser, Debug)]
#[command(name = "canopy")]
#[command(about = "Train, persist, and evaluate a random forest classifier on CSV data")]
#[command(version)]
pub struct Cli {
    /// Number of trees in the forest
    #[arg(long = "n_estimators", default_value_t = 100)]
    pub n_estimators: usize,

    /// Seed for bootstrap sampling and feature selection
    #[arg(long = "random_state", default_value_t = 0)]
    pub random_state: u64,

    /// Directory the model artifact is written to
    #[arg(long = "model-dir", env = "SM_MODEL_DIR")]
    pub model_dir: PathBuf,

    /// Directory containing the training file
    #[arg(long = "train", env = "SM_CHANNEL_TRAIN")]
    pub train: PathBuf,

    /// Directory containing the testing file
    #[arg(long = "test", env = "SM_CHANNEL_TEST")]
    pub test: PathBuf,

    /// Training file name inside the train directory
    #[arg(long = "train_file", default_value = "train-V-1.csv")]
    pub train_file: String,

    /// Testing file name inside the test directory
    #[arg(long = "test_file", default_value = "test-V-1.csv")]
    pub test_file: String,

    /// Worker threads for tree construction and prediction (1 = no parallel jobs)
    #[arg(long = "n_jobs", default_value_t = NonZeroUsize::MIN)]
    pub n_jobs: NonZeroUsize,

    /// Enable verbose (debug-level) logging
    #[arg(long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress all log output except errors
    #[arg(long)]
    pub quiet: bool,

    #[arg(skip)]
    ignored: Vec<OsString>,
}

impl Cli {
    /// Parse the process arguments, exiting with a usage message on error.
    /// Unrecognised arguments are kept in [`Cli::ignored`].
    #[must_use]
    pub fn parse_known() -> Self {
        Self::try_parse_known_from(std::env::args_os()).unwrap_or_else(|err| err.exit())
    }

    /// Parse `args` (program name first), setting aside arguments `Cli` does
    /// not define.
    ///
    /// An unknown `--flag` and a bare value after it are both set aside. Known
    /// flags keep working wherever they appear, and everything after a lone
    /// `--` is set aside.
    ///
    /// # Errors
    ///
    /// Returns the clap error for the recognised arguments, e.g. a missing
    /// directory or an unparsable number.
    pub fn try_parse_known_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let mut command = Self::command();
        let flags = FlagTable::of(&mut command);

        let mut args = args.into_iter().map(Into::<OsString>::into);
        let mut known: Vec<OsString> = args.next().into_iter().collect();
        let mut ignored = Vec::new();
        while let Some(arg) = args.next() {
            if arg.as_os_str() == "--" {
                ignored.push(arg);
                ignored.extend(args.by_ref());
                break;
            }
            match flags.lookup(&arg) {
                Some(wants_value) => {
                    known.push(arg);
                    if wants_value && let Some(value) = args.next() {
                        known.push(value);
                    }
                }
                None => ignored.push(arg),
            }
        }

        let mut cli = Self::try_parse_from(known)?;
        cli.ignored = ignored;
        Ok(cli)
    }

    /// Arguments set aside by [`Cli::try_parse_known_from`], in command-line order.
    #[must_use]
    pub fn ignored(&self) -> &[OsString] {
        &self.ignored
    }

    /// Log filter directive for the chosen verbosity.
    #[must_use]
    pub fn log_filter(&self) -> &'static str {
        match (self.verbose, self.quiet) {
            (true, _) => "debug",
            (_, true) => "error",
            _ => "info",
        }
    }

    /// Freeze the parsed arguments into [`Settings`].
    #[must_use]
    pub fn into_settings(self) -> Settings {
        Settings {
            n_estimators: self.n_estimators,
            random_state: self.random_state,
            model_dir: self.model_dir,
            train_dir: self.train,
            test_dir: self.test,
            train_file: self.train_file,
            test_file: self.test_file,
            n_jobs: self.n_jobs,
        }
    }
}

/// Flags defined on the command, each mapped to whether it takes a value.
struct FlagTable {
    longs: HashMap<String, bool>,
    shorts: HashMap<char, bool>,
}

impl FlagTable {
    fn of(command: &mut Command) -> Self {
        // Building adds the generated --help and --version flags.
        command.build();
        let mut longs = HashMap::new();
        let mut shorts = HashMap::new();
        for arg in command.get_arguments() {
            let takes_value = arg.get_action().takes_values();
            if let Some(long) = arg.get_long() {
                longs.insert(long.to_string(), takes_value);
            }
            if let Some(short) = arg.get_short() {
                shorts.insert(short, takes_value);
            }
        }
        Self { longs, shorts }
    }

    /// `Some(wants_next)` when `arg` is a defined flag, where `wants_next`
    /// says whether the following argument is its value.
    fn lookup(&self, arg: &OsStr) -> Option<bool> {
        let text = arg.to_str()?;
        if let Some(body) = text.strip_prefix("--") {
            let (name, inline) = body.split_once('=').map_or((body, false), |(name, _)| (name, true));
            return self.longs.get(name).map(|&takes| takes && !inline);
        }
        let mut chars = text.strip_prefix('-')?.chars();
        let takes = *self.shorts.get(&chars.next()?)?;
        Some(takes && chars.as_str().is_empty())
    }
}

/// Everything a run needs, built once at startup and passed to every stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Number of trees.
    pub n_estimators: usize,
    /// Master seed of the forest.
    pub random_state: u64,
    /// Output directory for `model.joblib`.
    pub model_dir: PathBuf,
    /// Directory holding the training file.
    pub train_dir: PathBuf,
    /// Directory holding the testing file.
    pub test_dir: PathBuf,
    /// Training file name.
    pub train_file: String,
    /// Testing file name.
    pub test_file: String,
    /// Size of the global worker pool.
    pub n_jobs: NonZeroUsize,
}

impl Settings {
    /// Settings with the command-line defaults for the given directories.
    #[must_use]
    pub fn new(model_dir: &Path, train_dir: &Path, test_dir: &Path) -> Self {
        Self {
            n_estimators: 100,
            random_state: 0,
            model_dir: model_dir.to_path_buf(),
            train_dir: train_dir.to_path_buf(),
            test_dir: test_dir.to_path_buf(),
            train_file: "train-V-1.csv".to_string(),
            test_file: "test-V-1.csv".to_string(),
            n_jobs: NonZeroUsize::MIN,
        }
    }

    /// Full path of the training file.
    #[must_use]
    pub fn train_path(&self) -> PathBuf {
        self.train_dir.join(&self.train_file)
    }

    /// Full path of the testing file.
    #[must_use]
    pub fn test_path(&self) -> PathBuf {
        self.test_dir.join(&self.test_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_known_from(std::iter::once("canopy").chain(args.iter().copied()))
    }

    fn ignored(cli: &Cli) -> Vec<&str> {
        cli.ignored().iter().map(|a| a.to_str().unwrap()).collect()
    }

    #[test]
    fn defaults_match_new() {
        let cli = parse(&["--model-dir", "m", "--train", "tr", "--test", "te"]).unwrap();
        assert_eq!(cli.log_filter(), "info");
        let settings = cli.into_settings();
        assert_eq!(
            settings,
            Settings::new(Path::new("m"), Path::new("tr"), Path::new("te"))
        );
        assert_eq!(settings.train_path(), Path::new("tr").join("train-V-1.csv"));
        assert_eq!(settings.test_path(), Path::new("te").join("test-V-1.csv"));
    }

    #[test]
    fn underscore_flags_override_defaults() {
        let cli = parse(&[
            "--model-dir", "m", "--train", "tr", "--test", "te",
            "--n_estimators", "7", "--random_state", "42",
            "--train_file", "a.csv", "--test_file", "b.csv", "--n_jobs", "4",
        ])
        .unwrap();
        let settings = cli.into_settings();
        assert_eq!(settings.n_estimators, 7);
        assert_eq!(settings.random_state, 42);
        assert_eq!(settings.train_path(), Path::new("tr").join("a.csv"));
        assert_eq!(settings.test_file, "b.csv");
        assert_eq!(settings.n_jobs.get(), 4);
    }

    #[test]
    fn zero_jobs_rejected() {
        let err = parse(&["--model-dir", "m", "--train", "t", "--test", "t", "--n_jobs", "0"]);
        assert!(err.is_err());
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        let err = parse(&["--model-dir", "m", "--train", "t", "--test", "t", "--verbose", "--quiet"]);
        assert!(err.is_err());
    }

    #[test]
    fn quiet_selects_error_filter() {
        let cli = parse(&["--model-dir", "m", "--train", "t", "--test", "t", "--quiet"]).unwrap();
        assert_eq!(cli.log_filter(), "error");
    }

    #[test]
    fn missing_directory_is_usage_error() {
        if std::env::var_os("SM_MODEL_DIR").is_some() {
            return;
        }
        let err = parse(&["--train", "t", "--test", "t"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn unknown_hyperparameter_is_ignored() {
        let cli = parse(&["--model-dir", "m", "--train", "tr", "--test", "te", "--max_depth", "5"]).unwrap();
        assert_eq!(ignored(&cli), vec!["--max_depth", "5"]);
        assert_eq!(
            cli.into_settings(),
            Settings::new(Path::new("m"), Path::new("tr"), Path::new("te"))
        );
    }

    #[test]
    fn known_flags_after_unknown_ones_still_apply() {
        let cli = parse(&[
            "--max_depth", "5", "--n_estimators", "7",
            "--model-dir", "m", "--criterion=entropy", "--train", "tr", "--test", "te",
            "--random_state=3",
        ])
        .unwrap();
        assert_eq!(ignored(&cli), vec!["--max_depth", "5", "--criterion=entropy"]);
        let settings = cli.into_settings();
        assert_eq!(settings.n_estimators, 7);
        assert_eq!(settings.random_state, 3);
        assert_eq!(settings.model_dir, Path::new("m"));
    }

    #[test]
    fn everything_after_double_dash_is_ignored() {
        let cli = parse(&["--model-dir", "m", "--train", "t", "--test", "t", "--", "--n_estimators", "9"]).unwrap();
        assert_eq!(ignored(&cli), vec!["--", "--n_estimators", "9"]);
        assert_eq!(cli.into_settings().n_estimators, 100);
    }

    #[test]
    fn bad_value_for_known_flag_is_still_an_error() {
        let err = parse(&["--model-dir", "m", "--train", "t", "--test", "t", "--n_estimators", "many"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
