//! Helpers over the insertion-ordered tables.
//!
//! Row order and profile order carry meaning (display order, and the
//! alignment between multipliers and strategic sequences), so every table is
//! an `IndexMap` that keeps the declaration order of its source JSON object.

use std::hash::Hash;

use indexmap::IndexMap;

/// Key-set comparison between two tables.
pub trait KeyDifference<K> {
    /// Keys present in `other` but not in `self` (missing), and keys present
    /// in `self` but not in `other` (unexpected), each in declaration order.
    fn key_difference<'a, W>(&'a self, other: &'a IndexMap<K, W>) -> (Vec<&'a K>, Vec<&'a K>);
}

impl<K: Hash + Eq, V> KeyDifference<K> for IndexMap<K, V> {
    fn key_difference<'a, W>(&'a self, other: &'a IndexMap<K, W>) -> (Vec<&'a K>, Vec<&'a K>) {
        let missing = other.keys().filter(|k| !self.contains_key(*k)).collect();
        let unexpected = self.keys().filter(|k| !other.contains_key(*k)).collect();
        (missing, unexpected)
    }
}

/// Sum of a percentage-point table.
pub trait WeightTotal {
    fn total(&self) -> f64;
}

impl<K> WeightTotal for IndexMap<K, f64> {
    #[inline]
    fn total(&self) -> f64 {
        self.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_preserves_document_order() {
        let map: IndexMap<String, f64> =
            serde_json::from_str(r#"{"zeta": 1.0, "alpha": 2.0, "mid": -3.0}"#).unwrap();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert!(map.total().abs() < 1e-10);
    }

    #[test]
    fn test_insert_keeps_position() {
        let mut map: IndexMap<&str, f64> = [("b", 1.0), ("a", 2.0)].into_iter().collect();
        assert_eq!(map.insert("b", 3.0), Some(1.0));

        let keys: Vec<&&str> = map.keys().collect();
        assert_eq!(keys, vec![&"b", &"a"]);
        assert!((map.total() - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_key_difference() {
        let a: IndexMap<&str, f64> = [("x", 1.0), ("y", 2.0)].into_iter().collect();
        let b: IndexMap<&str, f64> = [("y", 0.0), ("z", 0.0)].into_iter().collect();
        let (missing, unexpected) = a.key_difference(&b);
        assert_eq!(missing, vec![&"z"]);
        assert_eq!(unexpected, vec![&"x"]);
    }
}
