// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration value type with type-safe conversions.
//!
//! A [`ConfigValue`] is either a scalar or a nested [`ConfigStore`] section.
//! Text that looks numeric is coerced to a number when the value enters a
//! store, so `"993"` and `993` compare equal after loading.

use crate::domain::config_store::ConfigStore;
use crate::domain::errors::{DiscoverError, Result};
use std::fmt;

/// A configuration value.
///
/// # Examples
///
/// ```
/// use maildiscover::domain::ConfigValue;
///
/// let value = ConfigValue::coerce("993");
/// assert_eq!(value, ConfigValue::Integer(993));
/// assert_eq!(value.as_u16("incoming_mail_port").unwrap(), 993);
///
/// let value = ConfigValue::coerce("imap.example.com");
/// assert_eq!(value.as_text().as_deref(), Some("imap.example.com"));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigValue {
    /// Free text.
    Text(String),
    /// An integral number.
    Integer(i64),
    /// A floating point number.
    Float(f64),
    /// A boolean, as produced by typed sources such as YAML.
    Boolean(bool),
    /// A nested, named section.
    Section(ConfigStore),
}

impl ConfigValue {
    /// Builds a value from raw text, coercing lexically numeric text to a number.
    pub fn coerce(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(n) = trimmed.parse::<i64>() {
            return ConfigValue::Integer(n);
        }
        let numeric_start = trimmed
            .chars()
            .next()
            .map(|c| c.is_ascii_digit() || c == '-' || c == '+' || c == '.')
            .unwrap_or(false);
        if numeric_start {
            if let Ok(f) = trimmed.parse::<f64>() {
                if f.is_finite() {
                    return ConfigValue::Float(f);
                }
            }
        }
        ConfigValue::Text(raw.to_string())
    }

    /// Re-applies numeric coercion to a text value; other variants pass through.
    pub fn normalized(self) -> Self {
        match self {
            ConfigValue::Text(s) => ConfigValue::coerce(&s),
            other => other,
        }
    }

    /// Returns the scalar rendered as text, or `None` for sections.
    pub fn as_text(&self) -> Option<String> {
        match self {
            ConfigValue::Text(s) => Some(s.clone()),
            ConfigValue::Integer(n) => Some(n.to_string()),
            ConfigValue::Float(f) => Some(f.to_string()),
            ConfigValue::Boolean(b) => Some(if *b { "1" } else { "" }.to_string()),
            ConfigValue::Section(_) => None,
        }
    }

    /// Returns the nested section, if this value is one.
    pub fn as_section(&self) -> Option<&ConfigStore> {
        match self {
            ConfigValue::Section(store) => Some(store),
            _ => None,
        }
    }

    /// Returns `true` if this value is a section.
    pub fn is_section(&self) -> bool {
        matches!(self, ConfigValue::Section(_))
    }

    /// Loose truthiness used by on/off flags.
    ///
    /// Empty text, `0`, `false`, `no` and `off` are false; sections are true
    /// when non-empty; everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            ConfigValue::Text(s) => {
                let lowered = s.trim().to_lowercase();
                !matches!(lowered.as_str(), "" | "0" | "false" | "no" | "off")
            }
            ConfigValue::Integer(n) => *n != 0,
            ConfigValue::Float(f) => *f != 0.0,
            ConfigValue::Boolean(b) => *b,
            ConfigValue::Section(store) => !store.is_empty(),
        }
    }

    /// Converts the value to a boolean.
    ///
    /// Recognizes the following values (case-insensitive):
    /// - `true`: "true", "yes", "1", "on"
    /// - `false`: "false", "no", "0", "off", ""
    ///
    /// Any other value fails with a `ValidationError` naming `key`.
    pub fn as_bool(&self, key: &str) -> Result<bool> {
        match self {
            ConfigValue::Boolean(b) => Ok(*b),
            ConfigValue::Integer(0) => Ok(false),
            ConfigValue::Integer(1) => Ok(true),
            ConfigValue::Text(s) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" | "1" | "on" => Ok(true),
                "false" | "no" | "0" | "off" | "" => Ok(false),
                _ => Err(DiscoverError::validation(key, s, &["on", "off"])),
            },
            other => Err(DiscoverError::validation(key, other, &["on", "off"])),
        }
    }

    /// Converts the value to a TCP port (1-65535).
    ///
    /// # Examples
    ///
    /// ```
    /// use maildiscover::domain::ConfigValue;
    ///
    /// assert_eq!(ConfigValue::from("587").as_u16("outgoing_mail_port").unwrap(), 587);
    /// assert!(ConfigValue::from("0").as_u16("outgoing_mail_port").is_err());
    /// ```
    pub fn as_u16(&self, key: &str) -> Result<u16> {
        let invalid = || DiscoverError::validation(key, self, &["1-65535"]);
        match self {
            ConfigValue::Integer(n) => u16::try_from(*n)
                .ok()
                .filter(|port| *port > 0)
                .ok_or_else(invalid),
            ConfigValue::Text(s) => s
                .trim()
                .parse::<u16>()
                .ok()
                .filter(|port| *port > 0)
                .ok_or_else(invalid),
            _ => Err(invalid()),
        }
    }

    /// Converts the value to a non-negative number of seconds.
    pub fn as_seconds(&self, key: &str) -> Result<f64> {
        let seconds = match self {
            ConfigValue::Integer(n) => *n as f64,
            ConfigValue::Float(f) => *f,
            ConfigValue::Text(s) => s.trim().parse::<f64>().unwrap_or(-1.0),
            _ => -1.0,
        };
        if seconds.is_finite() && seconds > 0.0 {
            Ok(seconds)
        } else {
            Err(DiscoverError::validation(key, self, &["a positive number of seconds"]))
        }
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::coerce(&s)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::coerce(s)
    }
}

impl From<i64> for ConfigValue {
    fn from(n: i64) -> Self {
        ConfigValue::Integer(n)
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Boolean(b)
    }
}

impl From<ConfigStore> for ConfigValue {
    fn from(store: ConfigStore) -> Self {
        ConfigValue::Section(store)
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Section(store) => write!(f, "[section with {} keys]", store.len()),
            scalar => write!(f, "{}", scalar.as_text().unwrap_or_default()),
        }
    }
}
