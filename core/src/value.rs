//! Input value model.
//!
//! [`Value`] is the closed set of shapes the serializer knows how to walk.
//! Objects that carry their own default schema plug in through the
//! [`Serializable`] trait.

use std::fmt;
use std::rc::Rc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};

/// An object exposing named fields and a default field-selection schema.
///
/// # Examples
///
/// ```
/// use to_dict_core::{Serializable, Value};
///
/// struct User {
///     name: String,
///     password: String,
/// }
///
/// impl Serializable for User {
///     fn type_name(&self) -> &str {
///         "User"
///     }
///
///     fn default_schema(&self) -> Vec<String> {
///         vec!["-password".into()]
///     }
///
///     fn field_names(&self) -> Vec<String> {
///         vec!["name".into(), "password".into()]
///     }
///
///     fn field(&self, name: &str) -> Option<Value> {
///         match name {
///             "name" => Some(self.name.as_str().into()),
///             "password" => Some(self.password.as_str().into()),
///             _ => None,
///         }
///     }
/// }
///
/// let user = User { name: "ann".into(), password: "hunter2".into() };
/// assert_eq!(user.field_names(), vec!["name", "password"]);
/// ```
pub trait Serializable {
    /// Label used in logs and error messages.
    fn type_name(&self) -> &str;

    /// Schema applied underneath any schema supplied by the caller.
    fn default_schema(&self) -> Vec<String> {
        Vec::new()
    }

    /// Field names in a stable order.
    fn field_names(&self) -> Vec<String>;

    /// Current value of `name`, or `None` if the field cannot be read.
    fn field(&self, name: &str) -> Option<Value>;
}

/// A value to be serialized.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    /// Zone-aware date-time.
    DateTime(DateTime<FixedOffset>),
    /// Date-time without a zone; taken as UTC when converted.
    NaiveDateTime(NaiveDateTime),
    Date(NaiveDate),
    List(Vec<Value>),
    /// Key/value pairs in their natural order.
    Map(Vec<(String, Value)>),
    Object(Rc<dyn Serializable>),
    /// Computed value, resolved once when serialized.
    Lazy(Rc<dyn Fn() -> Value>),
    /// Anything the serializer does not understand, with a type label.
    Opaque(String),
}

impl Value {
    /// Wraps a [`Serializable`] object.
    pub fn object(object: impl Serializable + 'static) -> Self {
        Self::Object(Rc::new(object))
    }

    /// Wraps a computed value.
    pub fn lazy(f: impl Fn() -> Value + 'static) -> Self {
        Self::Lazy(Rc::new(f))
    }

    /// Builds a mapping from key/value pairs, keeping their order.
    ///
    /// # Examples
    ///
    /// ```
    /// use to_dict_core::Value;
    ///
    /// let map = Value::map([("b", Value::from(1)), ("a", Value::from(2))]);
    /// assert_eq!(map.kind(), "map");
    /// ```
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Wraps raw bytes.
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(bytes.into())
    }

    /// A value of an unsupported kind.
    pub fn opaque(label: impl Into<String>) -> Self {
        Self::Opaque(label.into())
    }

    /// Returns `true` for values emitted unchanged (no traversal needed).
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Self::Null
                | Self::Bool(_)
                | Self::Int(_)
                | Self::UInt(_)
                | Self::Float(_)
                | Self::Str(_)
                | Self::Bytes(_)
        )
    }

    /// Short name of the value's shape.
    pub fn kind(&self) -> &str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) | Self::UInt(_) => "integer",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::DateTime(_) | Self::NaiveDateTime(_) => "datetime",
            Self::Date(_) => "date",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Object(object) => object.type_name(),
            Self::Lazy(_) => "lazy",
            Self::Opaque(label) => label,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Self::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Self::UInt(v) => f.debug_tuple("UInt").field(v).finish(),
            Self::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Self::Str(v) => f.debug_tuple("Str").field(v).finish(),
            Self::Bytes(v) => f.debug_tuple("Bytes").field(&v.len()).finish(),
            Self::DateTime(v) => f.debug_tuple("DateTime").field(v).finish(),
            Self::NaiveDateTime(v) => f.debug_tuple("NaiveDateTime").field(v).finish(),
            Self::Date(v) => f.debug_tuple("Date").field(v).finish(),
            Self::List(v) => f.debug_list().entries(v).finish(),
            Self::Map(v) => f
                .debug_map()
                .entries(v.iter().map(|(k, v)| (k, v)))
                .finish(),
            Self::Object(object) => write!(f, "Object({})", object.type_name()),
            Self::Lazy(_) => f.write_str("Lazy(..)"),
            Self::Opaque(label) => write!(f, "Opaque({label})"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

macro_rules! from_signed {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Self::Int(i64::from(v))
            }
        }
    )*};
}

macro_rules! from_unsigned {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Self::UInt(u64::from(v))
            }
        }
    )*};
}

from_signed!(i8, i16, i32, i64);
from_unsigned!(u8, u16, u32, u64);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::NaiveDateTime(v)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(v: DateTime<Tz>) -> Self {
        Self::DateTime(v.fixed_offset())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match v {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Self::UInt(u)
                } else {
                    n.as_f64().map_or(Self::Null, Self::Float)
                }
            }
            Json::String(s) => Self::Str(s),
            Json::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Json::Object(entries) => {
                Self::Map(entries.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}
