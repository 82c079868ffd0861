//! Mean-decrease-in-impurity importances aggregated over the forest.

use crate::forest::RandomForest;
use crate::tree::DecisionTree;

/// A training feature with its MDI importance and rank.
#[derive(Debug, Clone)]
pub struct RankedFeature {
    /// Feature name.
    pub name: String,
    /// Normalized importance (sums to 1.0 unless every tree is a lone leaf).
    pub importance: f64,
    /// 1-based rank (1 = most important).
    pub rank: usize,
}

impl RandomForest {
    /// Rank the training features by mean decrease in impurity.
    ///
    /// Each tree's importances are normalized first, then averaged, so every
    /// tree carries equal weight. Ties keep training column order.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<RankedFeature> {
        let per_tree: Vec<Vec<f64>> = self
            .trees
            .iter()
            .map(DecisionTree::feature_importances)
            .collect();
        rank(&per_tree, &self.feature_names)
    }
}

fn rank(per_tree: &[Vec<f64>], names: &[String]) -> Vec<RankedFeature> {
    if per_tree.is_empty() || names.is_empty() {
        return vec![];
    }

    let mut totals = vec![0.0f64; names.len()];
    for tree in per_tree {
        for (acc, &v) in totals.iter_mut().zip(tree) {
            *acc += v;
        }
    }
    let sum: f64 = totals.iter().sum();
    if sum > 0.0 {
        totals.iter_mut().for_each(|v| *v /= sum);
    }

    let mut ranked: Vec<RankedFeature> = names
        .iter()
        .zip(totals)
        .map(|(name, importance)| RankedFeature {
            name: name.clone(),
            importance,
            rank: 0,
        })
        .collect();
    // Stable sort: equal scores stay in column order.
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    for (i, feature) in ranked.iter_mut().enumerate() {
        feature.rank = i + 1;
    }
    ranked
}

#[cfg(test)]
mod tests {
    use super::rank;
    use crate::config::{MaxFeatures, RandomForestConfig};

    #[test]
    fn rank_normalizes_and_orders() {
        let names = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let ranked = rank(&[vec![0.2, 0.8, 0.0], vec![0.4, 0.6, 0.0]], &names);
        assert_eq!(ranked[0].name, "b");
        assert_eq!(ranked[0].rank, 1);
        assert!((ranked[0].importance - 0.7).abs() < 1e-12);
        assert_eq!(ranked[2].name, "c");
        let sum: f64 = ranked.iter().map(|f| f.importance).sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn all_zero_keeps_column_order() {
        let names = vec!["a".to_string(), "b".to_string()];
        let ranked = rank(&[vec![0.0, 0.0]], &names);
        assert_eq!(ranked[0].name, "a");
        assert_eq!(ranked[1].name, "b");
    }

    #[test]
    fn informative_feature_ranks_first() {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..40u32 {
            let class = i % 2;
            features.push(vec![f64::from(i % 7), class as f64 * 5.0 + f64::from(i % 3) * 0.1]);
            labels.push(class.to_string());
        }
        let names = vec!["noise".to_string(), "signal".to_string()];
        let forest = RandomForestConfig::new(20)
            .unwrap()
            .with_max_features(MaxFeatures::All)
            .fit(&features, &labels, &names)
            .unwrap();
        let ranked = forest.feature_importances();
        assert_eq!(ranked[0].name, "signal");
        assert!(ranked[0].importance > 0.9);
    }
}
