//! Slice and list helpers.

use std::collections::HashSet;

/// Length of a compact (dash-less) UUID.
pub const COMPACT_UUID_LEN: usize = 32;

/// Whether `items` contains `item`.
pub fn contains<T: PartialEq>(items: &[T], item: &T) -> bool {
    items.iter().any(|candidate| candidate == item)
}

/// Removes duplicates, keeping the first occurrence of each string.
///
/// ```
/// use baseutils::collections::dedup;
///
/// assert_eq!(dedup(["b", "a", "b", "c", "a"]), ["b", "a", "c"]);
/// ```
pub fn dedup<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter_map(|item| {
            let item = item.as_ref();
            seen.insert(item.to_owned()).then(|| item.to_owned())
        })
        .collect()
}

/// Trims each entry, drops anything that is not [`COMPACT_UUID_LEN`] bytes
/// long, and removes duplicates keeping first occurrences.
pub fn dedup_uuids<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    dedup(
        items
            .into_iter()
            .map(|item| item.as_ref().trim().to_owned())
            .filter(|item| item.len() == COMPACT_UUID_LEN),
    )
}
