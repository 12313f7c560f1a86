//! Error types for serialization and option loading.

use thiserror::Error;

/// Errors raised while serializing a value.
///
/// Only [`NotSerializable`](SerializeError::NotSerializable) is ever
/// recovered from, and only when it is raised for a single list element.
#[derive(Debug, Error)]
pub enum SerializeError {
    /// The value matches none of the recognized shapes.
    #[error("value of kind `{kind}` is not serializable")]
    NotSerializable { kind: String },

    /// A key excluded outright was asked for nested rules.
    #[error("excluded key `{key}` has no access to subkeys")]
    ExcludedKeyHasSubkeys { key: String },

    /// An object enumerated a field it could not produce.
    #[error("field `{field}` is not readable on `{model}`")]
    MissingField { model: String, field: String },

    /// A date/time pattern was rejected by the formatter.
    #[error("invalid date/time format pattern: {pattern}")]
    InvalidFormat { pattern: String },

    /// The options could not be turned into a serializer.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SerializeError {
    pub(crate) fn not_serializable(kind: impl Into<String>) -> Self {
        Self::NotSerializable { kind: kind.into() }
    }
}

/// Errors raised while loading [`SerializerOptions`](crate::SerializerOptions).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// `user_timezone` is not a valid UTC offset.
    #[error("invalid user timezone: {0}")]
    InvalidTimezone(String),
}

/// Convenience alias for results with [`SerializeError`].
pub type Result<T> = std::result::Result<T, SerializeError>;
