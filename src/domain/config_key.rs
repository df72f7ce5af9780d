// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration key newtype and section header parsing.
//!
//! Section headers may declare inheritance with `child : parent`. The
//! [`ConfigKey`] type knows how to split such a header; plain keys pass through
//! unchanged.

use once_cell::sync::Lazy;
use regex::Regex;

static EXTENSION_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*:\s*").unwrap());

/// A configuration key as written in a source, possibly a section header.
///
/// # Examples
///
/// ```
/// use maildiscover::domain::ConfigKey;
///
/// let key = ConfigKey::from("example.org : defaults".to_string());
/// assert_eq!(key.section_name(), "example.org");
/// assert_eq!(key.extends(), Some("defaults"));
///
/// let key = ConfigKey::from("incoming_mail_server".to_string());
/// assert_eq!(key.section_name(), "incoming_mail_server");
/// assert_eq!(key.extends(), None);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigKey(String);

impl ConfigKey {
    /// Splits the key into `(name, parent)` when it declares an extension.
    fn split(&self) -> Option<(&str, &str)> {
        let mut parts = EXTENSION_SEPARATOR.splitn(&self.0, 2);
        let name = parts.next()?;
        let parent = parts.next()?;
        Some((name.trim(), parent.trim()))
    }

    /// Returns the key without any `: parent` suffix.
    pub fn section_name(&self) -> &str {
        match self.split() {
            Some((name, _)) => name,
            None => self.0.as_str(),
        }
    }

    /// Returns the parent section named after `:`, if any.
    pub fn extends(&self) -> Option<&str> {
        self.split().map(|(_, parent)| parent)
    }
}

impl From<String> for ConfigKey {
    fn from(s: String) -> Self {
        ConfigKey(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(raw: &str) -> ConfigKey {
        ConfigKey::from(raw.to_string())
    }

    #[test]
    fn test_plain_key() {
        let key = key("allow_dns_lookup");
        assert_eq!(key.section_name(), "allow_dns_lookup");
        assert!(key.extends().is_none());
    }

    #[test]
    fn test_extension_without_spaces() {
        let key = key("b:a");
        assert_eq!(key.section_name(), "b");
        assert_eq!(key.extends(), Some("a"));
    }

    #[test]
    fn test_extension_with_spaces() {
        let key = key("example.org   :   example.com");
        assert_eq!(key.section_name(), "example.org");
        assert_eq!(key.extends(), Some("example.com"));
    }

    #[test]
    fn test_extension_splits_once() {
        let key = key("c : b : a");
        assert_eq!(key.section_name(), "c");
        assert_eq!(key.extends(), Some("b : a"));
    }
}
