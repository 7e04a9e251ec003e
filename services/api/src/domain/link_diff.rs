//! Diffing a desired link set against the stored one.
//!
//! Recipe updates rewrite join rows in place: unchanged rows are left alone,
//! changed rows are updated, new rows inserted and missing rows deleted. The
//! outcome is independent of the previous link order.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone, PartialEq)]
pub struct LinkDiff<K, V> {
    pub insert: Vec<(K, V)>,
    pub update: Vec<(K, V)>,
    pub delete: Vec<K>,
}

impl<K, V> LinkDiff<K, V> {
    pub fn is_empty(&self) -> bool {
        self.insert.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }
}

/// Compute the row operations that turn `existing` into `desired`.
///
/// Output order follows `desired` for inserts/updates and `existing` for
/// deletes.
pub fn diff_links<K, V>(
    existing: impl IntoIterator<Item = (K, V)>,
    desired: impl IntoIterator<Item = (K, V)>,
) -> LinkDiff<K, V>
where
    K: Eq + Hash + Copy,
    V: PartialEq,
{
    let existing: Vec<(K, V)> = existing.into_iter().collect();
    let mut current: HashMap<K, &V> = existing.iter().map(|(k, v)| (*k, v)).collect();

    let mut insert = Vec::new();
    let mut update = Vec::new();
    for (key, value) in desired {
        match current.remove(&key) {
            None => insert.push((key, value)),
            Some(old) if *old != value => update.push((key, value)),
            Some(_) => {}
        }
    }

    let delete = existing
        .iter()
        .map(|(k, _)| *k)
        .filter(|k| current.contains_key(k))
        .collect();

    LinkDiff {
        insert,
        update,
        delete,
    }
}
