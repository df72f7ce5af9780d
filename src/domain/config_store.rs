// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hierarchical, insertion-ordered configuration store.
//!
//! A [`ConfigStore`] maps keys to scalars or nested sections. Sections may
//! inherit from a previously declared section with a `child : parent` header,
//! and a section named after a mail domain acts as that domain's override layer.

use crate::domain::config_key::ConfigKey;
use crate::domain::config_value::ConfigValue;
use crate::domain::errors::{DiscoverError, Result};
use crate::ports::ConfigSource;

/// Ordered raw entries as produced by a configuration source.
pub type ConfigEntries = Vec<(String, ConfigValue)>;

/// An ordered key/value tree with section inheritance and shallow overlay.
///
/// Keys are unique; replacing a key keeps its original position, new keys are
/// appended. Iteration follows insertion order.
///
/// # Examples
///
/// ```
/// use maildiscover::domain::{ConfigStore, ConfigValue};
///
/// # fn main() -> maildiscover::domain::Result<()> {
/// let defaults = ConfigStore::from_entries(vec![
///     ("x".to_string(), ConfigValue::from("1")),
///     ("y".to_string(), ConfigValue::from("2")),
/// ])?;
/// let child = ConfigStore::from_entries(vec![("y".to_string(), ConfigValue::from("3"))])?;
///
/// let store = ConfigStore::from_entries(vec![
///     ("a".to_string(), ConfigValue::Section(defaults)),
///     ("b : a".to_string(), ConfigValue::Section(child)),
/// ])?;
///
/// let b = store.section("b").unwrap();
/// assert_eq!(b.get("x"), Some(&ConfigValue::Integer(1)));
/// assert_eq!(b.get("y"), Some(&ConfigValue::Integer(3)));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfigStore {
    entries: ConfigEntries,
}

impl ConfigStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from raw entries, resolving section extensions.
    pub fn from_entries(entries: ConfigEntries) -> Result<Self> {
        let mut store = Self::new();
        store.set_config(entries, false)?;
        Ok(store)
    }

    /// Returns the number of top-level keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the store has no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns `true` if `key` exists.
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    /// Returns the value stored under `key`, or `default` when absent.
    pub fn get_or(&self, key: &str, default: impl Into<ConfigValue>) -> ConfigValue {
        self.get(key).cloned().unwrap_or_else(|| default.into())
    }

    /// Returns the scalar under `key` rendered as text.
    ///
    /// Sections and empty strings yield `None`.
    pub fn get_text(&self, key: &str) -> Option<String> {
        self.get(key)
            .and_then(ConfigValue::as_text)
            .filter(|s| !s.trim().is_empty())
    }

    /// Reads a boolean flag, falling back to `default` when absent.
    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        match self.get(key) {
            Some(value) => value.as_bool(key),
            None => Ok(default),
        }
    }

    /// Returns `"on"` or `"off"` for a present key, or `default` unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use maildiscover::domain::{ConfigStore, ConfigValue};
    ///
    /// let mut store = ConfigStore::new();
    /// store.insert("SPA", ConfigValue::from("0"));
    /// assert_eq!(store.get_on_off("SPA", "on"), "off");
    /// assert_eq!(store.get_on_off("AuthRequired", "maybe"), "maybe");
    /// ```
    pub fn get_on_off<'a>(&self, key: &str, default: &'a str) -> &'a str {
        match self.get(key) {
            None => default,
            Some(value) if value.is_truthy() => "on",
            Some(_) => "off",
        }
    }

    /// Returns the section stored under `name`.
    ///
    /// Section names are matched ignoring ASCII case, so `[Example.com]`
    /// serves `user@example.com`. An exact match is preferred.
    pub fn section(&self, name: &str) -> Option<&ConfigStore> {
        self.get(name).and_then(ConfigValue::as_section).or_else(|| {
            self.entries
                .iter()
                .filter(|(key, _)| key.eq_ignore_ascii_case(name))
                .find_map(|(_, value)| value.as_section())
        })
    }

    /// Inserts or replaces `key`, keeping the position of an existing key.
    pub fn insert(&mut self, key: impl Into<String>, value: ConfigValue) -> Option<ConfigValue> {
        let key = key.into();
        match self.position(&key) {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<ConfigValue> {
        self.position(key).map(|i| self.entries.remove(i).1)
    }

    /// Applies raw entries to the store.
    ///
    /// Scalars are numerically coerced. Section headers of the form
    /// `child : parent` copy the already present `parent` section before the
    /// child's own keys are applied. When `clear` is true the store is emptied
    /// first.
    ///
    /// Fails with a `ConfigurationError` when a parent section does not exist.
    pub fn set_config(&mut self, entries: ConfigEntries, clear: bool) -> Result<&mut Self> {
        if clear {
            self.entries.clear();
        }

        for (raw_key, value) in entries {
            match value {
                ConfigValue::Section(child) => {
                    let header = ConfigKey::from(raw_key);
                    let child = ConfigStore::from_entries(child.entries)?;
                    let resolved = match header.extends() {
                        Some(parent) => {
                            let mut base = self.section(parent).cloned().ok_or_else(|| {
                                DiscoverError::configuration(format!(
                                    "Can not extend `{}` on non-existing section `{}`",
                                    header.section_name(),
                                    parent
                                ))
                            })?;
                            tracing::debug!(
                                "section `{}` extends `{}`",
                                header.section_name(),
                                parent
                            );
                            base.merge(&child);
                            base
                        }
                        None => child,
                    };
                    self.insert(header.section_name(), ConfigValue::Section(resolved));
                }
                scalar => {
                    self.insert(raw_key, scalar.normalized());
                }
            }
        }

        Ok(self)
    }

    /// Loads all entries of `source` into the store.
    pub fn load(&mut self, source: &dyn ConfigSource, clear: bool) -> Result<&mut Self> {
        let entries = source.entries()?;
        tracing::debug!(
            "loading {} entries from configuration source '{}'",
            entries.len(),
            source.name()
        );
        self.set_config(entries, clear)
    }

    /// Overlays `other`'s top-level keys onto this store.
    ///
    /// Whole values, including whole sections, are replaced on collision. This
    /// is a shallow overlay; nested sections are not merged recursively.
    pub fn merge(&mut self, other: &ConfigStore) -> &mut Self {
        for (key, value) in other.iter() {
            self.insert(key, value.clone());
        }
        self
    }

    /// Returns a snapshot of this store overlaid with the section named `domain`.
    ///
    /// The receiver is left untouched.
    pub fn with_domain_overlay(&self, domain: &str) -> ConfigStore {
        let mut snapshot = self.clone();
        if let Some(section) = self.section(domain) {
            tracing::debug!("applying domain overlay [{}]", domain);
            snapshot.merge(section);
        }
        snapshot
    }

    /// Returns client specific settings for `section`, adjusted for `domain`.
    ///
    /// The global section `section` is overlaid with keys of the domain section
    /// that start with `<section>_`; the prefix is stripped. For example
    /// `mozilla_displayName` in `[example.com]` overrides `displayName` in
    /// `[mozilla]`.
    pub fn client_profile(&self, section: &str, domain: &str) -> ConfigStore {
        let mut profile = self.section(section).cloned().unwrap_or_default();
        if let Some(host) = self.section(domain) {
            let prefix = format!("{}_", section);
            for (key, value) in host.iter() {
                if let Some(stripped) = key.strip_prefix(&prefix) {
                    profile.insert(stripped, value.clone());
                }
            }
        }
        profile
    }
}

impl<'a> IntoIterator for &'a ConfigStore {
    type Item = (&'a str, &'a ConfigValue);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a ConfigValue)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
