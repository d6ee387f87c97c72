use crate::discovery::target::LabelSet;

/// Prometheus label names cannot contain `-`.
pub fn sanitize_label_key(key: &str) -> String {
    key.replace('-', "_")
}

/// Insert under the sanitized key. A later insert wins over an earlier one
/// that sanitizes to the same key.
pub fn insert_label(labels: &mut LabelSet, key: &str, value: &str) {
    labels.insert(sanitize_label_key(key), value.to_owned());
}

/// Merge a whole mapping, in its iteration order, with [`insert_label`] semantics.
pub fn merge_labels<'a, I>(labels: &mut LabelSet, entries: I)
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    for (key, value) in entries {
        insert_label(labels, key, value);
    }
}
