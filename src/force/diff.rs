use std::collections::HashSet;
use std::hash::Hash;

#[derive(Clone, Debug)]
pub struct KeyedDiff<K> {
    pub added: HashSet<K>,
    pub removed: HashSet<K>,
    pub unchanged: bool,
}

// Pure set reconciliation; `unchanged` is the do-nothing fast path that
// keeps an at-rest simulation at rest.
pub fn diff<K>(previous: &HashSet<K>, next: &HashSet<K>) -> KeyedDiff<K>
where
    K: Eq + Hash + Clone,
{
    let added = next
        .iter()
        .filter(|key| !previous.contains(*key))
        .cloned()
        .collect::<HashSet<_>>();
    let removed = previous
        .iter()
        .filter(|key| !next.contains(*key))
        .cloned()
        .collect::<HashSet<_>>();
    let unchanged = added.is_empty() && removed.is_empty();

    KeyedDiff {
        added,
        removed,
        unchanged,
    }
}

pub fn key_set<T, K, F>(items: &[T], key: F) -> HashSet<K>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    items.iter().map(key).collect()
}
