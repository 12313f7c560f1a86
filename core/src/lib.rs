//! Schema-filtered conversion of object graphs into JSON-compatible trees.
//!
//! This crate walks a [`Value`] tree (records, mappings, lists, primitives,
//! dates and date-times) and produces a [`serde_json::Value`], keeping only
//! the fields a declarative schema selects:
//!
//! - [`SchemaStore`]: parses dotted paths such as `-prop1.prop2.*` into a
//!   per-level lookup table and decides which fields are visible.
//! - [`merge_schemas`]: folds an object's default schema and a caller
//!   override into one list, later lists winning per key.
//! - [`Serializer`]: recursive descent that forks a fresh schema scope for
//!   every nested field.
//! - [`Serializable`]: the trait objects implement to expose their fields
//!   and default schema.
//!
//! # Schema syntax
//!
//! | Path | Meaning |
//! |---|---|
//! | `name` | include `name` |
//! | `-name` | exclude `name` |
//! | `child.value` | include `child`, and only `value` beneath it (strict mode) |
//! | `child.*` | include `child` and every field beneath it |
//! | `-child.secret` | keep `child`, exclude `secret` beneath it |
//! | `*` | include every field at this level |
//!
//! In greedy mode (the default) unmentioned fields are included unless they
//! are private (leading `_` by default). In strict mode only mentioned or
//! wildcarded fields are.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use to_dict_core::*;
//!
//! let input = Value::from(json!({
//!     "child": {"value": 1, "extra": 2},
//!     "other": 3,
//! }));
//!
//! let strict = Serializer::new(SerializerOptions {
//!     is_greedy: false,
//!     ..SerializerOptions::default()
//! });
//!
//! assert_eq!(
//!     strict.serialize(&input, &["child.value"]).unwrap(),
//!     json!({"child": {"value": 1}}),
//! );
//! assert_eq!(
//!     strict.serialize(&input, &["child.*"]).unwrap(),
//!     json!({"child": {"value": 1, "extra": 2}}),
//! );
//! ```

mod config;
mod error;
mod merge;
pub mod path;
mod serializer;
mod store;
pub mod temporal;
mod value;

pub use config::{
    DEFAULT_DATE_FORMAT, DEFAULT_DATETIME_FORMAT, DEFAULT_PRIVATE_PREFIX, PrivacyRule,
    SerializerOptions,
};
pub use error::{ConfigError, Result, SerializeError};
pub use merge::merge_schemas;
pub use serializer::Serializer;
pub use store::SchemaStore;
pub use temporal::{FixedLocalizer, Localizer, SystemLocalizer};
pub use value::{Serializable, Value};

/// Serializes `value` under `schema` with the given options.
///
/// Convenience wrapper for a one-off call; build a [`Serializer`] to reuse
/// options across calls or to install a custom privacy predicate.
///
/// # Errors
///
/// Returns [`SerializeError`] as described on [`Serializer::serialize`].
/// An invalid `user_timezone` is reported as [`SerializeError::Config`]
/// wrapping [`ConfigError::InvalidTimezone`].
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use to_dict_core::{SerializerOptions, Value, to_dict};
///
/// let value = Value::from(json!({"id": 7, "_rev": 2}));
/// let out = to_dict(&value, &[] as &[&str], SerializerOptions::default()).unwrap();
/// assert_eq!(out, json!({"id": 7}));
/// ```
pub fn to_dict<S: AsRef<str>>(
    value: &Value,
    schema: &[S],
    options: SerializerOptions,
) -> Result<serde_json::Value> {
    let serializer = Serializer::from_options(options)?;
    serializer.serialize(value, schema)
}
