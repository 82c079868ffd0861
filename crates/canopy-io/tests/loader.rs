//! Loader integration tests against the checked-in CSV fixtures.

use std::path::{Path, PathBuf};

use canopy_io::{IoError, TableReader, ensure_same_schema};

fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

#[test]
fn train_and_test_fixtures_share_a_schema() {
    let train = TableReader::new(&fixture_dir(), "train-V-1.csv")
        .read()
        .expect("train fixture should parse");
    let test = TableReader::new(&fixture_dir(), "test-V-1.csv")
        .read()
        .expect("test fixture should parse");

    assert_eq!(train.shape(), (100, 2));
    assert_eq!(test.shape(), (40, 2));
    assert_eq!(train.feature_names(), &["f1", "f2"]);
    assert_eq!(train.label_name(), "label");

    // Rows alternate between the two classes.
    let ones = train.labels().iter().filter(|l| l.as_str() == "1").count();
    assert_eq!(ones, 50);

    ensure_same_schema(&train, &test).unwrap();
}

#[test]
fn reordered_test_columns_are_rejected() {
    let train = TableReader::new(&fixture_dir(), "train-V-1.csv").read().unwrap();
    let reordered = TableReader::new(&fixture_dir(), "test-reordered.csv").read().unwrap();

    let err = ensure_same_schema(&train, &reordered).unwrap_err();
    match err {
        IoError::SchemaMismatch { train, test } => {
            assert_eq!(train, vec!["f1", "f2"]);
            assert_eq!(test, vec!["f2", "f1"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn header_only_fixture_loads_empty() {
    let ds = TableReader::new(&fixture_dir(), "header-only.csv").read().unwrap();
    assert!(ds.is_empty());
    assert_eq!(ds.shape(), (0, 2));
}

#[test]
fn reader_resolves_dir_and_filename() {
    let reader = TableReader::new(&fixture_dir(), "train-V-1.csv");
    assert_eq!(reader.path(), fixture_dir().join("train-V-1.csv"));
}
