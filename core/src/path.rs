//! Schema path syntax.
//!
//! A schema path is a dot-separated list of segments. The first segment may
//! carry a leading negation marker, and any segment may be the wildcard:
//!
//! ```text
//! -prop1.prop2.*   exclude `prop1`; if traversed anyway, allow `prop2`
//!                  and everything beneath it
//! ```

/// Segment delimiter inside a path string.
pub const DELIMITER: char = '.';

/// Segment that admits every field at its level.
pub const WILDCARD: &str = "*";

/// Prefix on the first segment that turns an inclusion into an exclusion.
pub const NEGATION: char = '-';

/// Returns the negated form of `key`.
///
/// # Examples
///
/// ```
/// use to_dict_core::path::negate;
///
/// assert_eq!(negate("age"), "-age");
/// ```
pub fn negate(key: &str) -> String {
    format!("{NEGATION}{key}")
}

/// Returns `true` if `key` carries the negation marker.
pub fn is_negation(key: &str) -> bool {
    key.starts_with(NEGATION)
}

/// Strips one negation marker from `key`, if present.
///
/// # Examples
///
/// ```
/// use to_dict_core::path::admit;
///
/// assert_eq!(admit("-age"), "age");
/// assert_eq!(admit("age"), "age");
/// ```
pub fn admit(key: &str) -> &str {
    key.strip_prefix(NEGATION).unwrap_or(key)
}

/// Splits a path string into its head segment and the remaining tail.
///
/// The tail is empty for a bare key.
///
/// # Examples
///
/// ```
/// use to_dict_core::path::split;
///
/// let (head, tail) = split("-prop1.prop2.*");
/// assert_eq!(head, "-prop1");
/// assert_eq!(tail, vec!["prop2", "*"]);
///
/// let (head, tail) = split("name");
/// assert_eq!(head, "name");
/// assert!(tail.is_empty());
/// ```
pub fn split(path: &str) -> (&str, Vec<&str>) {
    let mut segments = path.split(DELIMITER);
    // `split` always yields at least one item, even for an empty string.
    let head = segments.next().unwrap_or_default();
    (head, segments.collect())
}

/// Joins segments back into a path string.
pub fn join<S: AsRef<str>>(segments: &[S]) -> String {
    let mut out = String::new();
    for (idx, segment) in segments.iter().enumerate() {
        if idx > 0 {
            out.push(DELIMITER);
        }
        out.push_str(segment.as_ref());
    }
    out
}
