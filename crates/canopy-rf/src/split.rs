use rand::Rng;

use crate::node::{FeatureIndex, Impurity};

/// Criterion for measuring the quality of a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SplitCriterion {
    /// Gini impurity: 1 - Σ(p_i²)
    Gini,
    /// Information entropy: -Σ(p_i · ln(p_i))
    Entropy,
}

impl SplitCriterion {
    /// Compute the impurity of a node from its class counts.
    ///
    /// An empty node has impurity zero.
    #[must_use]
    pub fn impurity(&self, class_counts: &[usize], n_samples: usize) -> Impurity {
        if n_samples == 0 {
            return Impurity::new(0.0);
        }
        let n = n_samples as f64;
        let proportions = class_counts
            .iter()
            .filter(|&&c| c > 0)
            .map(|&c| c as f64 / n);
        let value = match self {
            SplitCriterion::Gini => 1.0 - proportions.map(|p| p * p).sum::<f64>(),
            SplitCriterion::Entropy => -proportions.map(|p| p * p.ln()).sum::<f64>(),
        };
        Impurity::new(value.max(0.0))
    }
}

/// The chosen partition of a node's samples.
#[derive(Debug, Clone)]
pub(crate) struct SplitResult {
    pub(crate) feature: FeatureIndex,
    pub(crate) threshold: f64,
    /// `n·I(parent) - n_l·I(left) - n_r·I(right)`.
    pub(crate) impurity_decrease: f64,
    pub(crate) left_indices: Vec<usize>,
    pub(crate) right_indices: Vec<usize>,
}

/// Inputs shared by every split search within one tree.
pub(crate) struct SplitContext<'a> {
    /// Column-major: `columns[feature_idx][sample_idx]`.
    pub(crate) columns: &'a [Vec<f64>],
    pub(crate) labels: &'a [usize],
    pub(crate) n_classes: usize,
    pub(crate) criterion: SplitCriterion,
    pub(crate) max_features: usize,
    pub(crate) min_samples_leaf: usize,
}

/// Best threshold found on one feature.
struct Candidate {
    decrease: f64,
    threshold: f64,
}

impl SplitContext<'_> {
    /// Find the best split of `sample_indices`.
    ///
    /// Features are visited in a random order. After `max_features` features
    /// the search stops if a valid split has been found; otherwise it keeps
    /// drawing features until one yields a split or all are exhausted.
    ///
    /// Returns `None` when no feature admits a split (all values identical
    /// within the node, or every boundary violates `min_samples_leaf`).
    pub(crate) fn find_best_split(
        &self,
        sample_indices: &[usize],
        rng: &mut impl Rng,
    ) -> Option<SplitResult> {
        let n_features = self.columns.len();
        let n_samples = sample_indices.len();
        if n_samples < 2 || n_features == 0 {
            return None;
        }

        let mut parent_counts = vec![0usize; self.n_classes];
        for &si in sample_indices {
            parent_counts[self.labels[si]] += 1;
        }
        let parent_impurity = self.criterion.impurity(&parent_counts, n_samples);

        let mut order: Vec<usize> = (0..n_features).collect();
        let mut best: Option<(FeatureIndex, Candidate)> = None;

        for visited in 0..n_features {
            if visited >= self.max_features && best.is_some() {
                break;
            }
            // Lazy Fisher-Yates: draw the next feature without replacement.
            let j = rng.gen_range(visited..n_features);
            order.swap(visited, j);
            let feat_idx = order[visited];

            let Some(candidate) =
                self.scan_feature(feat_idx, sample_indices, &parent_counts, parent_impurity)
            else {
                continue;
            };
            let improves = best
                .as_ref()
                .is_none_or(|(_, b)| candidate.decrease > b.decrease);
            if improves {
                best = Some((FeatureIndex::new(feat_idx), candidate));
            }
        }

        let (feature, candidate) = best?;
        let column = &self.columns[feature.index()];
        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = sample_indices
            .iter()
            .partition(|&&si| column[si] <= candidate.threshold);

        Some(SplitResult {
            feature,
            threshold: candidate.threshold,
            impurity_decrease: candidate.decrease,
            left_indices,
            right_indices,
        })
    }

    /// Sort the node's values for one feature and scan every boundary.
    fn scan_feature(
        &self,
        feat_idx: usize,
        sample_indices: &[usize],
        parent_counts: &[usize],
        parent_impurity: Impurity,
    ) -> Option<Candidate> {
        let column = &self.columns[feat_idx];
        let n_samples = sample_indices.len();

        let mut sorted: Vec<(f64, usize)> = sample_indices
            .iter()
            .map(|&si| (column[si], self.labels[si]))
            .collect();
        sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

        if sorted[0].0 == sorted[n_samples - 1].0 {
            return None;
        }

        let mut left_counts = vec![0usize; self.n_classes];
        let mut right_counts = parent_counts.to_vec();
        let mut best: Option<Candidate> = None;

        for i in 0..(n_samples - 1) {
            let (value, class) = sorted[i];
            left_counts[class] += 1;
            right_counts[class] -= 1;

            let next = sorted[i + 1].0;
            if value == next {
                continue;
            }
            let n_left = i + 1;
            let n_right = n_samples - n_left;
            if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                continue;
            }

            let left = self.criterion.impurity(&left_counts, n_left).value();
            let right = self.criterion.impurity(&right_counts, n_right).value();
            let decrease = n_samples as f64 * parent_impurity.value()
                - n_left as f64 * left
                - n_right as f64 * right;

            if best.as_ref().is_none_or(|b| decrease > b.decrease) {
                let mut threshold = value + (next - value) / 2.0;
                // Midpoint can round up onto `next` for adjacent floats.
                if threshold >= next {
                    threshold = value;
                }
                best = Some(Candidate {
                    decrease,
                    threshold,
                });
            }
        }

        best
    }
}
