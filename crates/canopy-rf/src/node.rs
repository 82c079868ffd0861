use std::fmt;

/// Zero-based feature column index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct FeatureIndex(usize);

impl FeatureIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based feature column index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FeatureIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of a node inside a tree's arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based arena index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Gini or entropy impurity of a node.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
pub struct Impurity(f64);

impl Impurity {
    pub(crate) fn new(value: f64) -> Self {
        Self(value)
    }

    /// Return the raw impurity value.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// A node with zero impurity holds a single class.
    #[must_use]
    pub fn is_pure(self) -> bool {
        self.0 <= 0.0
    }
}

impl fmt::Display for Impurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

/// A node in a decision tree arena.
///
/// Children are referenced by [`NodeIndex`]; the root is always index 0.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum Node {
    /// An interior node routing samples by one feature threshold.
    Split {
        /// Feature compared against `threshold`.
        feature: FeatureIndex,
        /// Samples with `feature <= threshold` go left.
        threshold: f64,
        /// Left child.
        left: NodeIndex,
        /// Right child.
        right: NodeIndex,
        /// Impurity before splitting.
        impurity: Impurity,
        /// Training samples that reached this node.
        n_samples: usize,
        /// Weighted impurity decrease achieved by the split.
        impurity_decrease: f64,
    },
    /// A terminal node.
    Leaf {
        /// Training samples per class that ended in this leaf.
        class_counts: Vec<usize>,
        /// Impurity of the leaf.
        impurity: Impurity,
        /// Training samples that ended in this leaf.
        n_samples: usize,
    },
}

impl Node {
    /// Return the impurity at this node.
    #[must_use]
    pub fn impurity(&self) -> Impurity {
        match self {
            Node::Split { impurity, .. } | Node::Leaf { impurity, .. } => *impurity,
        }
    }

    /// Return the number of training samples that reached this node.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        match self {
            Node::Split { n_samples, .. } | Node::Leaf { n_samples, .. } => *n_samples,
        }
    }

    /// Return `true` if this node is a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// Class frequencies of a leaf, `None` for split nodes.
    #[must_use]
    pub fn distribution(&self) -> Option<Vec<f64>> {
        match self {
            Node::Leaf {
                class_counts,
                n_samples,
                ..
            } => {
                let total = (*n_samples).max(1) as f64;
                Some(class_counts.iter().map(|&c| c as f64 / total).collect())
            }
            Node::Split { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FeatureIndex, Impurity, Node, NodeIndex};

    fn leaf() -> Node {
        Node::Leaf {
            class_counts: vec![1, 3],
            impurity: Impurity::new(0.375),
            n_samples: 4,
        }
    }

    fn split() -> Node {
        Node::Split {
            feature: FeatureIndex::new(2),
            threshold: 3.5,
            left: NodeIndex::new(1),
            right: NodeIndex::new(2),
            impurity: Impurity::new(0.48),
            n_samples: 20,
            impurity_decrease: 0.16,
        }
    }

    #[test]
    fn leaf_distribution_is_normalized() {
        let dist = leaf().distribution().unwrap();
        assert_eq!(dist, vec![0.25, 0.75]);
    }

    #[test]
    fn split_has_no_distribution() {
        assert!(split().distribution().is_none());
        assert!(!split().is_leaf());
    }

    #[test]
    fn accessors_cover_both_variants() {
        assert_eq!(leaf().n_samples(), 4);
        assert_eq!(split().n_samples(), 20);
        assert!((split().impurity().value() - 0.48).abs() < f64::EPSILON);
    }

    #[test]
    fn impurity_display_and_purity() {
        assert_eq!(format!("{}", Impurity::new(1.0 / 3.0)), "0.333333");
        assert!(Impurity::new(0.0).is_pure());
        assert!(!Impurity::new(0.1).is_pure());
    }
}
