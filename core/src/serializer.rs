//! Recursive, schema-filtered serialization.
//!
//! A [`Serializer`] holds the options for one top-level call. Every nested
//! field is serialized by a fresh traversal that shares those options by
//! reference but builds its own [`SchemaStore`] from the field's
//! sub-schema, so no schema state leaks between siblings or up to parents.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use to_dict_core::{Serializer, SerializerOptions, Value};
//!
//! let input = Value::from(json!({
//!     "name": "Ann",
//!     "age": 30,
//!     "_secret": "s",
//!     "tags": ["x", "y"],
//! }));
//!
//! let serializer = Serializer::new(SerializerOptions::default());
//! let output = serializer.serialize(&input, &["-age"]).unwrap();
//! assert_eq!(output, json!({"name": "Ann", "tags": ["x", "y"]}));
//! ```

use std::rc::Rc;

use serde_json::{Map, Number, Value as Json};
use tracing::debug;

use crate::config::{PrivacyRule, SerializerOptions};
use crate::error::{ConfigError, Result, SerializeError};
use crate::merge::merge_schemas;
use crate::store::SchemaStore;
use crate::temporal::{self, FixedLocalizer, Localizer, SystemLocalizer};
use crate::value::{Serializable, Value};

/// Serializes [`Value`] trees into JSON under a field-selection schema.
///
/// Options are fixed for the serializer's lifetime. One serializer can be
/// reused for any number of top-level calls.
pub struct Serializer {
    options: SerializerOptions,
    privacy: PrivacyRule,
    localizer: Rc<dyn Localizer>,
}

impl Serializer {
    /// Creates a serializer.
    ///
    /// The private-field rule comes from
    /// [`private_prefix`](SerializerOptions::private_prefix). User-timezone
    /// conversion uses the host zone; see [`from_options`](Self::from_options)
    /// to honor [`user_timezone`](SerializerOptions::user_timezone).
    pub fn new(options: SerializerOptions) -> Self {
        let privacy = options.privacy_rule();
        Self {
            options,
            privacy,
            localizer: Rc::new(SystemLocalizer),
        }
    }

    /// Creates a serializer, resolving `user_timezone` into a localizer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTimezone`] if `user_timezone` is not a
    /// valid UTC offset.
    pub fn from_options(options: SerializerOptions) -> std::result::Result<Self, ConfigError> {
        let offset = options.user_offset()?;
        let serializer = Self::new(options);
        Ok(match offset {
            Some(offset) => serializer.with_localizer(FixedLocalizer(offset)),
            None => serializer,
        })
    }

    /// Replaces the private-field rule with a predicate.
    ///
    /// # Examples
    ///
    /// ```
    /// use serde_json::json;
    /// use to_dict_core::{Serializer, SerializerOptions, Value};
    ///
    /// let serializer = Serializer::new(SerializerOptions::default())
    ///     .with_private_predicate(|key| key.starts_with("sa_"));
    /// let input = Value::from(json!({"sa_state": 1, "_id": 2}));
    /// let output = serializer.serialize(&input, &[] as &[&str]).unwrap();
    /// assert_eq!(output, json!({"_id": 2}));
    /// ```
    pub fn with_private_predicate(mut self, f: impl Fn(&str) -> bool + 'static) -> Self {
        self.privacy = PrivacyRule::predicate(f);
        self
    }

    /// Replaces the localizer used when `to_user_tz` is enabled.
    pub fn with_localizer(mut self, localizer: impl Localizer + 'static) -> Self {
        self.localizer = Rc::new(localizer);
        self
    }

    /// Returns the options this serializer was built with.
    ///
    /// # Examples
    ///
    /// ```
    /// use to_dict_core::{Serializer, SerializerOptions};
    ///
    /// let serializer = Serializer::new(SerializerOptions {
    ///     is_greedy: false,
    ///     ..SerializerOptions::default()
    /// });
    /// assert!(!serializer.options().is_greedy);
    /// assert_eq!(serializer.options().date_format, "YYYY-MM-DD");
    /// ```
    pub fn options(&self) -> &SerializerOptions {
        &self.options
    }

    /// Serializes `value` under `schema`.
    ///
    /// Values are dispatched in a fixed order: computed values are resolved
    /// first, then primitives, date-times, dates, lists, serializable
    /// objects, and mappings. Anything else is not serializable.
    ///
    /// For objects, the object's default schema is merged underneath
    /// `schema` before filtering its fields.
    ///
    /// # Errors
    ///
    /// - [`SerializeError::NotSerializable`] for an unsupported value, unless
    ///   it is a list element (those are dropped).
    /// - [`SerializeError::ExcludedKeyHasSubkeys`] for a contradictory schema.
    /// - [`SerializeError::MissingField`] if an object cannot read a field it
    ///   enumerated.
    /// - [`SerializeError::InvalidFormat`] for a bad date/time pattern.
    pub fn serialize<S: AsRef<str>>(&self, value: &Value, schema: &[S]) -> Result<Json> {
        debug!(
            kind = value.kind(),
            schema = ?schema.iter().map(|s| s.as_ref()).collect::<Vec<&str>>(),
            "Serializing value"
        );

        let resolved;
        let value = match value {
            Value::Lazy(f) => {
                resolved = f();
                &resolved
            }
            other => other,
        };

        if value.is_primitive() {
            return Ok(primitive_to_json(value));
        }

        match value {
            Value::DateTime(dt) => self.serialize_datetime(dt),
            Value::NaiveDateTime(naive) => self.serialize_naive_datetime(naive),
            Value::Date(date) => self.serialize_date(date),
            Value::List(items) => self.serialize_list(items, schema),
            Value::Object(object) => {
                let merged = merge_schemas([object.default_schema(), owned_schema(schema)]);
                let store = SchemaStore::load(&merged);
                self.serialize_object(object.as_ref(), &store)
            }
            Value::Map(entries) => {
                let store = SchemaStore::load(schema);
                self.serialize_map(entries, &store)
            }
            other => Err(SerializeError::not_serializable(other.kind())),
        }
    }

    fn serialize_datetime(&self, value: &chrono::DateTime<chrono::FixedOffset>) -> Result<Json> {
        let pattern = &self.options.datetime_format;
        let formatted = if self.options.to_user_tz {
            let local = self.localizer.to_local(*value);
            temporal::format_datetime(&local, pattern)?
        } else {
            temporal::format_datetime(value, pattern)?
        };
        Ok(Json::String(formatted))
    }

    fn serialize_naive_datetime(&self, value: &chrono::NaiveDateTime) -> Result<Json> {
        if self.options.to_user_tz {
            return self.serialize_datetime(&temporal::assume_utc(value));
        }
        let formatted = temporal::format_naive_datetime(value, &self.options.datetime_format)?;
        Ok(Json::String(formatted))
    }

    fn serialize_date(&self, value: &chrono::NaiveDate) -> Result<Json> {
        let formatted = temporal::format_date(value, &self.options.date_format)?;
        Ok(Json::String(formatted))
    }

    /// Every element is serialized under the list's own schema, so a field
    /// path such as `orders.id` filters each element of `orders`. Elements
    /// that are not serializable are dropped rather than failing the whole
    /// list; every other error propagates.
    fn serialize_list<S: AsRef<str>>(&self, items: &[Value], schema: &[S]) -> Result<Json> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            match self.serialize(item, schema) {
                Ok(json) => out.push(json),
                Err(SerializeError::NotSerializable { kind }) => {
                    debug!(kind = %kind, "Dropped list element");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(Json::Array(out))
    }

    fn serialize_object(&self, object: &dyn Serializable, store: &SchemaStore) -> Result<Json> {
        let mut out = Map::new();
        for key in object.field_names() {
            if !self.is_included(&key, store) {
                debug!(model = object.type_name(), key = %key, "Skipped key");
                continue;
            }
            let value = object
                .field(&key)
                .ok_or_else(|| SerializeError::MissingField {
                    model: object.type_name().to_string(),
                    field: key.clone(),
                })?;
            let json = self.fork(&key, &value, store)?;
            out.insert(key, json);
        }
        Ok(Json::Object(out))
    }

    fn serialize_map(&self, entries: &[(String, Value)], store: &SchemaStore) -> Result<Json> {
        let mut out = Map::new();
        for (key, value) in entries {
            if !self.is_included(key, store) {
                debug!(key = %key, "Skipped key");
                continue;
            }
            let json = self.fork(key, value, store)?;
            out.insert(key.clone(), json);
        }
        Ok(Json::Object(out))
    }

    fn is_included(&self, key: &str, store: &SchemaStore) -> bool {
        store.is_included(key, self.options.is_greedy, &self.privacy)
    }

    /// Serializes one field in a traversal of its own, seeded with the
    /// field's sub-schema.
    fn fork(&self, key: &str, value: &Value, store: &SchemaStore) -> Result<Json> {
        if value.is_primitive() {
            return Ok(primitive_to_json(value));
        }
        let sub_schema = store.sub_schema(key)?;
        self.serialize(value, &sub_schema)
    }
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new(SerializerOptions::default())
    }
}

fn owned_schema<S: AsRef<str>>(schema: &[S]) -> Vec<String> {
    schema.iter().map(|s| s.as_ref().to_string()).collect()
}

/// Converts a primitive to JSON. Bytes are decoded as UTF-8 (lossy) and
/// non-finite floats become `null`.
fn primitive_to_json(value: &Value) -> Json {
    match value {
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::Number(Number::from(*i)),
        Value::UInt(u) => Json::Number(Number::from(*u)),
        Value::Float(f) => Number::from_f64(*f).map_or(Json::Null, Json::Number),
        Value::Str(s) => Json::String(s.clone()),
        Value::Bytes(bytes) => Json::String(String::from_utf8_lossy(bytes).into_owned()),
        _ => Json::Null,
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use chrono::{DateTime, NaiveDate};
    use serde_json::json;

    use super::*;

    fn greedy() -> Serializer {
        Serializer::default()
    }

    fn strict() -> Serializer {
        Serializer::new(SerializerOptions {
            is_greedy: false,
            ..SerializerOptions::default()
        })
    }

    const NONE: &[&str] = &[];

    #[test]
    fn test_primitives_pass_through() {
        let s = greedy();
        assert_eq!(s.serialize(&Value::Null, NONE).unwrap(), Json::Null);
        assert_eq!(s.serialize(&Value::from(true), NONE).unwrap(), json!(true));
        assert_eq!(s.serialize(&Value::from(-3), NONE).unwrap(), json!(-3));
        assert_eq!(s.serialize(&Value::from(2.5), NONE).unwrap(), json!(2.5));
        assert_eq!(s.serialize(&Value::from("hi"), NONE).unwrap(), json!("hi"));
        assert_eq!(
            s.serialize(&Value::bytes(b"raw".to_vec()), NONE).unwrap(),
            json!("raw")
        );
    }

    #[test]
    fn test_non_finite_float_is_null() {
        let out = greedy().serialize(&Value::from(f64::NAN), NONE).unwrap();
        assert_eq!(out, Json::Null);
    }

    #[test]
    fn test_lazy_value_is_resolved() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let value = Value::lazy(move || {
            counter.set(counter.get() + 1);
            Value::from(vec![1, 2])
        });
        let out = greedy().serialize(&value, NONE).unwrap();
        assert_eq!(out, json!([1, 2]));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_lazy_is_resolved_only_once() {
        let value = Value::lazy(|| Value::lazy(|| Value::from(1)));
        let err = greedy().serialize(&value, NONE).unwrap_err();
        assert!(matches!(err, SerializeError::NotSerializable { .. }));
    }

    #[test]
    fn test_opaque_is_not_serializable() {
        let err = greedy().serialize(&Value::opaque("Socket"), NONE).unwrap_err();
        assert!(matches!(
            err,
            SerializeError::NotSerializable { ref kind } if kind == "Socket"
        ));
    }

    #[test]
    fn test_list_drops_unserializable_elements() {
        let value = Value::List(vec![
            Value::from(1),
            Value::opaque("Socket"),
            Value::from("x"),
        ]);
        let out = greedy().serialize(&value, NONE).unwrap();
        assert_eq!(out, json!([1, "x"]));
    }

    #[test]
    fn test_list_propagates_other_errors() {
        let value = Value::List(vec![Value::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())]);
        let s = Serializer::new(SerializerOptions {
            date_format: "%Q".into(),
            ..SerializerOptions::default()
        });
        let err = s.serialize(&value, NONE).unwrap_err();
        assert!(matches!(err, SerializeError::InvalidFormat { .. }));
    }

    #[test]
    fn test_opaque_map_field_fails_whole_map() {
        let value = Value::map([("ok", Value::from(1)), ("bad", Value::opaque("Socket"))]);
        let err = greedy().serialize(&value, NONE).unwrap_err();
        assert!(matches!(err, SerializeError::NotSerializable { .. }));
    }

    #[test]
    fn test_excluded_opaque_field_is_never_touched() {
        let value = Value::map([("ok", Value::from(1)), ("bad", Value::opaque("Socket"))]);
        let out = greedy().serialize(&value, &["-bad"]).unwrap();
        assert_eq!(out, json!({"ok": 1}));
    }

    #[test]
    fn test_strict_mode_with_nested_path() {
        let value = Value::from(json!({"child": {"value": 1, "extra": 2}, "other": 3}));
        let out = strict().serialize(&value, &["child.value"]).unwrap();
        assert_eq!(out, json!({"child": {"value": 1}}));
    }

    #[test]
    fn test_wildcard_under_child() {
        let value = Value::from(json!({"child": {"value": 1, "extra": 2}, "other": 3}));
        let out = strict().serialize(&value, &["child.*"]).unwrap();
        assert_eq!(out, json!({"child": {"value": 1, "extra": 2}}));
    }

    #[test]
    fn test_negation_moves_one_level_deeper() {
        let value = Value::from(json!({"a": {"b": 1, "c": 2}, "d": 3}));
        let out = greedy().serialize(&value, &["-a.b"]).unwrap();
        assert_eq!(out, json!({"a": {"c": 2}, "d": 3}));
    }

    #[test]
    fn test_sub_schema_applies_to_every_list_element() {
        let value = Value::from(json!({"items": [{"id": 1, "x": 0}, {"id": 2, "x": 0}]}));
        let out = strict().serialize(&value, &["items.id"]).unwrap();
        assert_eq!(out, json!({"items": [{"id": 1}, {"id": 2}]}));
    }

    #[test]
    fn test_output_preserves_source_key_order() {
        let value = Value::map([("z", Value::from(1)), ("a", Value::from(2))]);
        let out = greedy().serialize(&value, NONE).unwrap();
        let keys: Vec<_> = out.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn test_datetime_uses_own_zone_without_conversion() {
        let dt = DateTime::parse_from_rfc3339("2024-01-15T23:30:00+05:00").unwrap();
        let s = Serializer::new(SerializerOptions {
            datetime_format: "YYYY-MM-DD".into(),
            ..SerializerOptions::default()
        });
        let out = s.serialize(&Value::DateTime(dt), NONE).unwrap();
        assert_eq!(out, json!("2024-01-15"));
    }

    #[test]
    fn test_datetime_converted_to_user_zone() {
        let dt = DateTime::parse_from_rfc3339("2024-01-15T23:30:00+05:00").unwrap();
        let s = Serializer::from_options(SerializerOptions {
            to_user_tz: true,
            user_timezone: Some("-01:00".into()),
            ..SerializerOptions::default()
        })
        .unwrap();
        let out = s.serialize(&Value::DateTime(dt), NONE).unwrap();
        assert_eq!(out, json!("2024-01-15 17:30"));
    }

    #[test]
    fn test_naive_datetime_treated_as_utc_for_user_zone() {
        let naive = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(22, 0, 0)
            .unwrap();
        let s = Serializer::from_options(SerializerOptions {
            to_user_tz: true,
            user_timezone: Some("+03:00".into()),
            ..SerializerOptions::default()
        })
        .unwrap();
        let out = s.serialize(&Value::NaiveDateTime(naive), NONE).unwrap();
        assert_eq!(out, json!("2024-01-16 01:00"));

        let out = greedy().serialize(&Value::NaiveDateTime(naive), NONE).unwrap();
        assert_eq!(out, json!("2024-01-15 22:00"));
    }

    #[test]
    fn test_date_uses_date_pattern() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let out = greedy().serialize(&Value::Date(date), NONE).unwrap();
        assert_eq!(out, json!("2024-02-29"));
    }

    #[test]
    fn test_invalid_user_timezone_rejected() {
        let result = Serializer::from_options(SerializerOptions {
            user_timezone: Some("mars".into()),
            ..SerializerOptions::default()
        });
        assert!(matches!(result, Err(ConfigError::InvalidTimezone(_))));
    }

    struct Account {
        login: &'static str,
        token: &'static str,
    }

    impl Serializable for Account {
        fn type_name(&self) -> &str {
            "Account"
        }

        fn default_schema(&self) -> Vec<String> {
            vec!["-token".into()]
        }

        fn field_names(&self) -> Vec<String> {
            vec!["login".into(), "token".into(), "ghost".into()]
        }

        fn field(&self, name: &str) -> Option<Value> {
            match name {
                "login" => Some(self.login.into()),
                "token" => Some(self.token.into()),
                _ => None,
            }
        }
    }

    fn account() -> Value {
        Value::object(Account {
            login: "ann",
            token: "t0k",
        })
    }

    #[test]
    fn test_object_default_schema_applies() {
        let out = greedy().serialize(&account(), &["-ghost"]).unwrap();
        assert_eq!(out, json!({"login": "ann"}));
    }

    #[test]
    fn test_call_site_overrides_default_schema() {
        let out = greedy().serialize(&account(), &["token", "-ghost"]).unwrap();
        assert_eq!(out, json!({"login": "ann", "token": "t0k"}));
    }

    #[test]
    fn test_unreadable_field_is_an_error() {
        let err = greedy().serialize(&account(), NONE).unwrap_err();
        assert!(matches!(
            err,
            SerializeError::MissingField { ref model, ref field }
                if model == "Account" && field == "ghost"
        ));
    }
}
