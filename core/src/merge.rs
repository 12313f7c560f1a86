//! Schema merging with last-writer-wins conflict resolution.
//!
//! When an object carries a default schema and the caller supplies an
//! override, [`merge_schemas`] folds both into one list. Priority grows from
//! left to right: adding a path drops its opposite-polarity counterpart
//! recorded by an earlier (lower-priority) list.
//!
//! # Example
//!
//! ```
//! use to_dict_core::merge_schemas;
//!
//! let model_default = ["-password", "-internal_id", "profile.avatar"];
//! let call_site = ["internal_id"];
//!
//! let merged = merge_schemas([&model_default[..], &call_site[..]]);
//! assert_eq!(merged, vec!["-password", "profile.avatar", "internal_id"]);
//! ```

use tracing::debug;

use crate::path;

/// Merges lists of path strings; later lists take precedence.
///
/// Within the fold, adding a plain path removes its negated form and adding
/// a negated path removes its plain form. Duplicates collapse to one entry.
/// The result is deterministic: survivors keep the position at which they
/// were first added.
///
/// # Examples
///
/// ```
/// use to_dict_core::merge_schemas;
///
/// // Inclusion at higher priority cancels an earlier exclusion.
/// let merged = merge_schemas([vec!["-x"], vec!["x"]]);
/// assert_eq!(merged, vec!["x"]);
///
/// // And vice versa.
/// let merged = merge_schemas([vec!["x.y"], vec!["-x.y"]]);
/// assert_eq!(merged, vec!["-x.y"]);
/// ```
pub fn merge_schemas<L, I, S>(lists: L) -> Vec<String>
where
    L: IntoIterator<Item = I>,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut merged: Vec<String> = Vec::new();

    for list in lists {
        for key in list {
            let key = key.as_ref();
            let counterpart = if path::is_negation(key) {
                path::admit(key).to_string()
            } else {
                path::negate(key)
            };
            merged.retain(|existing| *existing != counterpart);
            if !merged.iter().any(|existing| existing == key) {
                merged.push(key.to_string());
            }
        }
    }

    debug!(schema = ?merged, "Merged schemas");
    merged
}
