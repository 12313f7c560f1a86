//! Serializer configuration.
//!
//! [`SerializerOptions`] is plain data and can be loaded from YAML:
//!
//! ```yaml
//! is_greedy: false
//! date_format: "DD.MM.YYYY"
//! datetime_format: "DD.MM.YYYY HH:mm"
//! to_user_tz: true
//! user_timezone: "+03:00"
//! private_prefix: "_"
//! ```
//!
//! Every field is optional; missing fields take their defaults.

use std::fmt;
use std::io::BufReader;
use std::path::Path;
use std::rc::Rc;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default pattern for date-only values.
pub const DEFAULT_DATE_FORMAT: &str = "YYYY-MM-DD";

/// Default pattern for date-time values.
pub const DEFAULT_DATETIME_FORMAT: &str = "YYYY-MM-DD HH:mm";

/// Default prefix marking a field as private.
pub const DEFAULT_PRIVATE_PREFIX: &str = "_";

/// Formatting and inclusion options shared by a whole serialization call.
///
/// # Examples
///
/// ```
/// use to_dict_core::SerializerOptions;
///
/// let options = SerializerOptions::default();
/// assert!(options.is_greedy);
/// assert_eq!(options.date_format, "YYYY-MM-DD");
/// assert_eq!(options.datetime_format, "YYYY-MM-DD HH:mm");
/// assert!(!options.to_user_tz);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerOptions {
    /// Include unmentioned public fields.
    pub is_greedy: bool,
    /// Pattern for date-only values.
    pub date_format: String,
    /// Pattern for date-time values.
    pub datetime_format: String,
    /// Convert date-times into the user's zone before formatting.
    pub to_user_tz: bool,
    /// The user's zone as a UTC offset (e.g. `+02:00`); host zone if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_timezone: Option<String>,
    /// Fields starting with this prefix are never admitted by greedy mode.
    pub private_prefix: Option<String>,
}

impl Default for SerializerOptions {
    fn default() -> Self {
        Self {
            is_greedy: true,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            datetime_format: DEFAULT_DATETIME_FORMAT.to_string(),
            to_user_tz: false,
            user_timezone: None,
            private_prefix: Some(DEFAULT_PRIVATE_PREFIX.to_string()),
        }
    }
}

impl SerializerOptions {
    /// Loads options from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let options = serde_yaml::from_reader(reader)?;
        Ok(options)
    }

    /// Parses options from a YAML string.
    ///
    /// # Examples
    ///
    /// ```
    /// use to_dict_core::SerializerOptions;
    ///
    /// let options = SerializerOptions::from_yaml("is_greedy: false\n").unwrap();
    /// assert!(!options.is_greedy);
    /// assert_eq!(options.date_format, "YYYY-MM-DD");
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parses [`user_timezone`](Self::user_timezone) into an offset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTimezone`] if the value is not of the
    /// form `Z`, `+HH:MM` or `-HH:MM`.
    ///
    /// # Examples
    ///
    /// ```
    /// use to_dict_core::SerializerOptions;
    ///
    /// let mut options = SerializerOptions::default();
    /// assert!(options.user_offset().unwrap().is_none());
    ///
    /// options.user_timezone = Some("+05:30".into());
    /// let offset = options.user_offset().unwrap().unwrap();
    /// assert_eq!(offset.local_minus_utc(), 5 * 3600 + 30 * 60);
    /// ```
    pub fn user_offset(&self) -> Result<Option<FixedOffset>, ConfigError> {
        self.user_timezone
            .as_deref()
            .map(|raw| parse_offset(raw).ok_or_else(|| ConfigError::InvalidTimezone(raw.into())))
            .transpose()
    }

    /// Builds the privacy rule described by
    /// [`private_prefix`](Self::private_prefix).
    pub fn privacy_rule(&self) -> PrivacyRule {
        match &self.private_prefix {
            Some(prefix) if !prefix.is_empty() => PrivacyRule::Prefix(prefix.clone()),
            _ => PrivacyRule::Never,
        }
    }
}

fn parse_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = match raw.as_bytes().first()? {
        b'+' => (1, &raw[1..]),
        b'-' => (-1, &raw[1..]),
        _ => return None,
    };
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 => (rest.get(..2)?, rest.get(2..)?),
        None => (rest, "0"),
    };
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Decides which field names greedy mode must never admit.
///
/// Explicit mentions and wildcards still admit private fields; the rule
/// only restricts the greedy default.
#[derive(Clone)]
pub enum PrivacyRule {
    /// Names starting with the prefix are private.
    Prefix(String),
    /// Caller-supplied predicate.
    Predicate(Rc<dyn Fn(&str) -> bool>),
    /// No field is private.
    Never,
}

impl Default for PrivacyRule {
    /// Leading underscore marks a private field.
    fn default() -> Self {
        Self::Prefix(DEFAULT_PRIVATE_PREFIX.to_string())
    }
}

impl PrivacyRule {
    /// Wraps a predicate returning `true` for private field names.
    pub fn predicate(f: impl Fn(&str) -> bool + 'static) -> Self {
        Self::Predicate(Rc::new(f))
    }

    /// Returns `true` if `key` is private under this rule.
    ///
    /// # Examples
    ///
    /// ```
    /// use to_dict_core::PrivacyRule;
    ///
    /// let rule = PrivacyRule::Prefix("_".into());
    /// assert!(rule.is_private("_secret"));
    /// assert!(!rule.is_private("name"));
    /// assert!(!PrivacyRule::Never.is_private("_secret"));
    /// ```
    pub fn is_private(&self, key: &str) -> bool {
        match self {
            Self::Prefix(prefix) => key.starts_with(prefix.as_str()),
            Self::Predicate(f) => f(key),
            Self::Never => false,
        }
    }
}

impl fmt::Debug for PrivacyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefix(prefix) => f.debug_tuple("Prefix").field(prefix).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
            Self::Never => f.write_str("Never"),
        }
    }
}
