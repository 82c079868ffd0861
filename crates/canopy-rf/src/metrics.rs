//! Accuracy, confusion matrix, and per-class classification report.

use std::fmt;

use crate::error::RfError;
use crate::labels::ClassLabels;

/// Fraction of positions where `predicted` names the same class as
/// `true_labels`, under the class equality of [`ClassLabels`] (so `"1"` and
/// `"1.0"` match when every label is numeric).
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`RfError::EmptyDataset`] | zero labels |
/// | [`RfError::PredictionCountMismatch`] | the slices differ in length |
pub fn accuracy_score<S: AsRef<str>>(true_labels: &[S], predicted: &[S]) -> Result<f64, RfError> {
    Ok(ConfusionMatrix::from_labels(true_labels, predicted)?.accuracy())
}

fn check_lengths(n_true: usize, n_predicted: usize) -> Result<(), RfError> {
    if n_true == 0 {
        return Err(RfError::EmptyDataset);
    }
    if n_true != n_predicted {
        return Err(RfError::PredictionCountMismatch {
            n_true,
            n_predicted,
        });
    }
    Ok(())
}

/// A confusion matrix for multi-class classification.
///
/// Entry `[t][p]` counts samples of true class `t` predicted as class `p`.
/// Classes are the union of true and predicted labels, deduplicated as one
/// [`ClassLabels`] set.
#[derive(Debug, Clone)]
pub struct ConfusionMatrix {
    classes: ClassLabels,
    matrix: Vec<Vec<usize>>,
}

/// Per-class precision, recall, F1, and support.
#[derive(Debug, Clone)]
pub struct ClassMetrics {
    /// Class name.
    pub class: String,
    /// TP / (TP + FP); 0.0 when the class is never predicted.
    pub precision: f64,
    /// TP / (TP + FN); 0.0 when the class never occurs.
    pub recall: f64,
    /// Harmonic mean of precision and recall; 0.0 when both are zero.
    pub f1: f64,
    /// Number of true samples of this class.
    pub support: usize,
}

impl ConfusionMatrix {
    /// Build a confusion matrix from true and predicted class names.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::EmptyDataset`] | zero labels |
    /// | [`RfError::PredictionCountMismatch`] | the slices differ in length |
    pub fn from_labels<S: AsRef<str>>(true_labels: &[S], predicted: &[S]) -> Result<Self, RfError> {
        check_lengths(true_labels.len(), predicted.len())?;
        let all: Vec<&str> = true_labels
            .iter()
            .chain(predicted)
            .map(|l| {
                let name: &str = l.as_ref();
                name
            })
            .collect();
        let classes = ClassLabels::from_labels(&all);
        let n = classes.len();
        let (Some(t_idx), Some(p_idx)) = (classes.encode(true_labels), classes.encode(predicted))
        else {
            unreachable!("classes are built from both label sets");
        };
        let mut matrix = vec![vec![0usize; n]; n];
        for (t, p) in t_idx.into_iter().zip(p_idx) {
            matrix[t][p] += 1;
        }
        Ok(Self { classes, matrix })
    }

    /// Overall accuracy: proportion of diagonal entries.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let correct: usize = (0..self.classes.len()).map(|i| self.matrix[i][i]).sum();
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64
        }
    }

    /// Per-class metrics in class order.
    #[must_use]
    pub fn class_metrics(&self) -> Vec<ClassMetrics> {
        let n = self.classes.len();
        (0..n)
            .map(|c| {
                let tp = self.matrix[c][c];
                let predicted: usize = (0..n).map(|i| self.matrix[i][c]).sum();
                let support: usize = self.matrix[c].iter().sum();
                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                let f1 = if precision + recall == 0.0 {
                    0.0
                } else {
                    2.0 * precision * recall / (precision + recall)
                };
                ClassMetrics {
                    class: self.classes.name(c).unwrap_or_default().to_string(),
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect()
    }

    /// Return the classes labelling rows and columns.
    #[must_use]
    pub fn classes(&self) -> &ClassLabels {
        &self.classes
    }

    /// Return the underlying matrix rows.
    #[must_use]
    pub fn as_rows(&self) -> &[Vec<usize>] {
        &self.matrix
    }

    fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .names()
            .iter()
            .map(String::len)
            .chain(self.matrix.iter().flatten().map(|v| v.to_string().len()))
            .max()
            .unwrap_or(1);

        write!(f, "{:>width$}", "")?;
        for name in self.classes.names() {
            write!(f, " {name:>width$}")?;
        }
        writeln!(f)?;
        for (name, row) in self.classes.names().iter().zip(&self.matrix) {
            write!(f, "{name:>width$}")?;
            for val in row {
                write!(f, " {val:>width$}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Averaged precision/recall/F1 row.
#[derive(Debug, Clone, Copy)]
pub struct AverageMetrics {
    /// Averaged precision.
    pub precision: f64,
    /// Averaged recall.
    pub recall: f64,
    /// Averaged F1.
    pub f1: f64,
}

/// Text classification report: one row per class, then accuracy, macro and
/// support-weighted averages.
#[derive(Debug, Clone)]
pub struct ClassificationReport {
    /// Per-class rows in class order.
    pub rows: Vec<ClassMetrics>,
    /// Overall accuracy.
    pub accuracy: f64,
    /// Unweighted mean over classes.
    pub macro_avg: AverageMetrics,
    /// Mean over classes weighted by support.
    pub weighted_avg: AverageMetrics,
    /// Total number of samples.
    pub support: usize,
}

impl ClassificationReport {
    /// Score predictions against true class names.
    ///
    /// # Errors
    ///
    /// Same as [`ConfusionMatrix::from_labels`].
    pub fn from_labels<S: AsRef<str>>(true_labels: &[S], predicted: &[S]) -> Result<Self, RfError> {
        Ok(Self::from_confusion(&ConfusionMatrix::from_labels(
            true_labels,
            predicted,
        )?))
    }

    /// Build the report from an existing confusion matrix.
    #[must_use]
    pub fn from_confusion(cm: &ConfusionMatrix) -> Self {
        let rows = cm.class_metrics();
        let support = cm.total();
        let n = rows.len().max(1) as f64;
        let macro_avg = AverageMetrics {
            precision: rows.iter().map(|r| r.precision).sum::<f64>() / n,
            recall: rows.iter().map(|r| r.recall).sum::<f64>() / n,
            f1: rows.iter().map(|r| r.f1).sum::<f64>() / n,
        };
        let weighted = |metric: fn(&ClassMetrics) -> f64| -> f64 {
            if support == 0 {
                return 0.0;
            }
            rows.iter().map(|r| metric(r) * r.support as f64).sum::<f64>() / support as f64
        };
        let weighted_avg = AverageMetrics {
            precision: weighted(|r| r.precision),
            recall: weighted(|r| r.recall),
            f1: weighted(|r| r.f1),
        };
        Self {
            accuracy: cm.accuracy(),
            rows,
            macro_avg,
            weighted_avg,
            support,
        }
    }

    /// Return the class names listed in the report.
    #[must_use]
    pub fn class_names(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.class.as_str()).collect()
    }
}

const LAST_ROW_HEADING: &str = "weighted avg";

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .rows
            .iter()
            .map(|r| r.class.len())
            .chain([LAST_ROW_HEADING.len()])
            .max()
            .unwrap_or(LAST_ROW_HEADING.len());

        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for r in &self.rows {
            writeln!(
                f,
                "{:>width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                r.class, r.precision, r.recall, r.f1, r.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.support
        )?;
        for (name, avg) in [("macro avg", self.macro_avg), (LAST_ROW_HEADING, self.weighted_avg)] {
            writeln!(
                f,
                "{:>width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1, self.support
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_predictions() {
        let labels = ["0", "0", "1", "1", "2", "2"];
        let cm = ConfusionMatrix::from_labels(&labels, &labels).unwrap();
        assert!((cm.accuracy() - 1.0).abs() < f64::EPSILON);
        for m in cm.class_metrics() {
            assert!((m.precision - 1.0).abs() < f64::EPSILON);
            assert!((m.recall - 1.0).abs() < f64::EPSILON);
            assert!((m.f1 - 1.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn known_confusion_matrix() {
        let truth = ["0", "0", "0", "1", "1", "1", "2", "2", "2"];
        let pred = ["0", "0", "1", "1", "1", "2", "2", "2", "0"];
        let cm = ConfusionMatrix::from_labels(&truth, &pred).unwrap();
        let metrics = cm.class_metrics();
        assert!((metrics[0].precision - 2.0 / 3.0).abs() < 1e-10);
        assert!((metrics[0].recall - 2.0 / 3.0).abs() < 1e-10);
        assert_eq!(metrics[0].support, 3);
        assert!((cm.accuracy() - 6.0 / 9.0).abs() < 1e-10);
        assert_eq!(cm.as_rows()[2], vec![1, 0, 2]);
    }

    #[test]
    fn accuracy_score_counts_matches() {
        let acc = accuracy_score(&["a", "b", "b", "a"], &["a", "b", "a", "a"]).unwrap();
        assert!((acc - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn numeric_spellings_score_as_matches() {
        let truth = ["1.0", "0", "1.0", "2"];
        let pred = ["1", "0", "0", "2.0"];
        let acc = accuracy_score(&truth, &pred).unwrap();
        assert!((acc - 0.75).abs() < f64::EPSILON);

        let cm = ConfusionMatrix::from_labels(&truth, &pred).unwrap();
        assert_eq!(cm.classes().names(), &["0", "1.0", "2"]);
        assert_eq!(cm.as_rows(), &[vec![1, 0, 0], vec![1, 1, 0], vec![0, 0, 1]]);
        let report = ClassificationReport::from_confusion(&cm);
        assert_eq!(report.class_names(), vec!["0", "1.0", "2"]);
    }

    #[test]
    fn empty_labels_error() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            ConfusionMatrix::from_labels(&empty, &empty),
            Err(RfError::EmptyDataset)
        ));
        assert!(matches!(accuracy_score(&empty, &empty), Err(RfError::EmptyDataset)));
    }

    #[test]
    fn length_mismatch_error() {
        let err = accuracy_score(&["a", "b"], &["a"]).unwrap_err();
        assert!(matches!(
            err,
            RfError::PredictionCountMismatch { n_true: 2, n_predicted: 1 }
        ));
    }

    #[test]
    fn predicted_only_class_has_zero_support() {
        // "c" is predicted but never true: listed with zero support and precision.
        let cm = ConfusionMatrix::from_labels(&["a", "b"], &["a", "c"]).unwrap();
        assert_eq!(cm.classes().names(), &["a", "b", "c"]);
        let metrics = cm.class_metrics();
        assert_eq!(metrics[2].support, 0);
        assert!((metrics[2].precision - 0.0).abs() < f64::EPSILON);
        assert!((metrics[1].recall - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn report_averages() {
        let truth = ["a", "a", "a", "b"];
        let pred = ["a", "a", "b", "b"];
        let report = ClassificationReport::from_labels(&truth, &pred).unwrap();
        // a: p=1.0 r=2/3 ; b: p=0.5 r=1.0
        assert!((report.macro_avg.precision - 0.75).abs() < 1e-10);
        assert!((report.weighted_avg.recall - 0.75).abs() < 1e-10);
        assert!((report.accuracy - 0.75).abs() < 1e-10);
        assert_eq!(report.support, 4);
        assert_eq!(report.class_names(), vec!["a", "b"]);
    }

    #[test]
    fn report_layout() {
        let labels = ["0", "1"];
        let text = ClassificationReport::from_labels(&labels, &labels).unwrap().to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "              precision    recall  f1-score   support"
        );
        assert_eq!(lines[1], "");
        assert_eq!(
            lines[2],
            "           0       1.00      1.00      1.00         1"
        );
        assert_eq!(
            lines[5],
            "    accuracy                           1.00         2"
        );
        assert_eq!(
            lines[7],
            "weighted avg       1.00      1.00      1.00         2"
        );
    }

    #[test]
    fn confusion_display_has_class_headers() {
        let cm = ConfusionMatrix::from_labels(&["no", "yes"], &["no", "no"]).unwrap();
        let text = cm.to_string();
        assert!(text.lines().next().unwrap().contains("yes"));
        assert_eq!(text.lines().count(), 3);
    }
}
