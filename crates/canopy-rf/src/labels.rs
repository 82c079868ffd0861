//! Mapping between raw class names and zero-based class indices.

use std::collections::HashMap;

/// The ordered set of distinct class names known to a model.
///
/// Class `i` is `names()[i]`. When every name parses as a number the set is
/// numeric: classes are distinct values in ascending order (`"2"` before
/// `"10"`), and `"1"`, `"1.0"` and `" 1"` all denote the class spelled the
/// way it was first seen. Otherwise classes are distinct strings in
/// lexicographic order.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ClassLabels {
    names: Vec<String>,
}

impl ClassLabels {
    /// Collect the distinct classes of `labels` in canonical order.
    #[must_use]
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Self {
        let raw: Vec<&str> = labels
            .iter()
            .map(|l| {
                let name: &str = l.as_ref();
                name
            })
            .collect();
        let values: Option<Vec<f64>> = raw.iter().map(|l| numeric_value(l)).collect();

        let names = match values {
            Some(values) => {
                let mut first_seen: HashMap<u64, (f64, &str)> = HashMap::new();
                for (value, name) in values.into_iter().zip(&raw) {
                    first_seen.entry(value.to_bits()).or_insert((value, *name));
                }
                let mut classes: Vec<(f64, &str)> = first_seen.into_values().collect();
                classes.sort_by(|a, b| a.0.total_cmp(&b.0));
                classes.into_iter().map(|(_, name)| name.to_string()).collect()
            }
            None => {
                let mut names: Vec<String> = raw.iter().map(|l| l.to_string()).collect();
                names.sort();
                names.dedup();
                names
            }
        };
        Self { names }
    }

    /// Encode raw labels as class indices.
    ///
    /// Numeric sets match by value, others by exact string. Returns `None`
    /// if any label is not a known class.
    #[must_use]
    pub fn encode<S: AsRef<str>>(&self, labels: &[S]) -> Option<Vec<usize>> {
        if let Some(values) = self.values() {
            let lookup: HashMap<u64, usize> = values
                .into_iter()
                .enumerate()
                .map(|(i, v)| (v.to_bits(), i))
                .collect();
            return labels
                .iter()
                .map(|l| {
                    let label: &str = l.as_ref();
                    lookup.get(&numeric_value(label)?.to_bits()).copied()
                })
                .collect();
        }
        let lookup: HashMap<&str, usize> = self
            .names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.as_str(), i))
            .collect();
        labels
            .iter()
            .map(|l| {
                let key: &str = l.as_ref();
                lookup.get(key).copied()
            })
            .collect()
    }

    /// Class values when the set is numeric.
    fn values(&self) -> Option<Vec<f64>> {
        if self.names.is_empty() {
            return None;
        }
        self.names.iter().map(|n| numeric_value(n)).collect()
    }

    /// Return the class name for index `class`, if in range.
    #[must_use]
    pub fn name(&self, class: usize) -> Option<&str> {
        self.names.get(class).map(String::as_str)
    }

    /// Return all class names in index order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Return the number of classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Return `true` if there are no classes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Parsed value of a numeric label, with `-0` folded into `0`.
fn numeric_value(label: &str) -> Option<f64> {
    let value: f64 = label.trim().parse().ok()?;
    Some(if value == 0.0 { 0.0 } else { value })
}
