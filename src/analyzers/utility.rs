use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;

/// Computes the arithmetic mean of a slice of values. Returns NaN for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Groups items by `key`, keeping groups in the order their key first appears
/// and items in input order within each group.
pub fn group_by<'a, T, K, F>(items: &'a [T], mut key: F) -> Vec<Vec<&'a T>>
where
    K: Eq + Hash,
    F: FnMut(&'a T) -> K,
{
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<Vec<&'a T>> = Vec::new();

    for item in items {
        let slot = *slots.entry(key(item)).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(item);
    }

    groups
}

/// Indexes items by a key that must be unique; the first repeated key is
/// handed to `on_duplicate` to build the error.
pub fn index_by<'a, T, F, E>(
    items: &'a [T],
    key: F,
    on_duplicate: impl Fn(&str) -> E,
) -> Result<HashMap<&'a str, &'a T>, E>
where
    F: Fn(&'a T) -> &'a str,
{
    let mut index = HashMap::with_capacity(items.len());
    for item in items {
        match index.entry(key(item)) {
            Entry::Occupied(entry) => return Err(on_duplicate(entry.key())),
            Entry::Vacant(entry) => {
                entry.insert(item);
            }
        }
    }
    Ok(index)
}
