use std::cmp::Ordering;

use crate::assets::Entry;

use super::SortKey;

/// Case-insensitive name ordering; names equal ignoring case fall back to a
/// byte comparison so the order is total.
///
/// Lowercased names are compared by code point, not by locale collation, so
/// accented letters sort after `z` (`"émile"` comes after `"zebra"`).
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Stable sort of entry references by `key`.
pub(crate) fn sort_entries(entries: &mut Vec<&Entry>, key: SortKey) {
    let mut keyed: Vec<(String, &Entry)> = entries
        .iter()
        .map(|entry| (entry.name.to_lowercase(), *entry))
        .collect();
    keyed.sort_by(|(a_key, a), (b_key, b)| match key {
        SortKey::NameAsc => name_order(a_key, a, b_key, b),
        SortKey::NameDesc => name_order(b_key, b, a_key, a),
        SortKey::Type => a
            .file_type
            .cmp(&b.file_type)
            .then_with(|| name_order(a_key, a, b_key, b)),
    });
    *entries = keyed.into_iter().map(|(_, entry)| entry).collect();
}

fn name_order(a_key: &str, a: &Entry, b_key: &str, b: &Entry) -> Ordering {
    a_key.cmp(b_key).then_with(|| a.name.cmp(&b.name))
}
