// SPDX-License-Identifier: MIT OR Apache-2.0

//! Environment variable configuration source adapter.
//!
//! This module provides an adapter that reads global configuration overrides
//! from environment variables.

use crate::domain::{ConfigEntries, ConfigValue, Result};
use crate::ports::ConfigSource;
use std::collections::BTreeMap;
use std::env;
use std::sync::RwLock;

/// Prefix used when none is given.
pub const DEFAULT_ENV_PREFIX: &str = "MAILDISCOVER_";

/// Maximum length for environment variable keys (prevents DoS)
const MAX_ENV_KEY_LEN: usize = 512;

/// Maximum length for environment variable values (prevents DoS)
const MAX_ENV_VALUE_LEN: usize = 1048576; // 1MB

/// Global keys whose spelling is not plain lower case.
const MIXED_CASE_KEYS: &[&str] = &["incoming_mail_socketType", "outgoing_mail_socketType"];

/// Configuration source adapter for environment variables.
///
/// Only variables starting with the prefix are read. The prefix is stripped and
/// the remainder lower-cased, so `MAILDISCOVER_ALLOW_DNS_LOOKUP=0` becomes
/// `allow_dns_lookup = 0`. Known mixed-case keys such as
/// `incoming_mail_socketType` are restored to their canonical spelling.
/// Environment variables can only carry global scalars, never sections.
///
/// # Priority
///
/// Environment variables have a priority of 2, which means they override
/// configuration files (priority 1).
///
/// # Examples
///
/// ```rust
/// use maildiscover::adapters::EnvVarAdapter;
/// use maildiscover::ports::ConfigSource;
///
/// let adapter = EnvVarAdapter::with_prefix("MYDISCOVER_");
/// assert_eq!(adapter.priority(), 2);
/// ```
#[derive(Debug)]
pub struct EnvVarAdapter {
    /// Prefix filtering the environment variables
    prefix: String,
    /// Cached variables, keyed by their canonical configuration key
    cache: RwLock<Option<BTreeMap<String, String>>>,
}

impl EnvVarAdapter {
    /// Creates an adapter reading `MAILDISCOVER_*` variables.
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_ENV_PREFIX)
    }

    /// Creates an adapter reading variables that start with `prefix`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            cache: RwLock::new(None),
        }
    }

    /// Creates an adapter with pre-populated values for testing.
    ///
    /// **Note**: This method is primarily intended for testing. Keys are used
    /// as given, without prefix handling.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use maildiscover::adapters::EnvVarAdapter;
    /// use maildiscover::ports::ConfigSource;
    /// use std::collections::HashMap;
    ///
    /// let mut values = HashMap::new();
    /// values.insert("allow_dns_lookup".to_string(), "0".to_string());
    ///
    /// let adapter = EnvVarAdapter::with_values(values);
    /// assert_eq!(adapter.entries().unwrap().len(), 1);
    /// ```
    pub fn with_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            prefix: String::new(),
            cache: RwLock::new(Some(values.into_iter().collect())),
        }
    }

    /// Returns the prefix variables must carry.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn canonical_key(stripped: &str) -> String {
        let lowered = stripped.to_lowercase();
        MIXED_CASE_KEYS
            .iter()
            .find(|known| known.eq_ignore_ascii_case(&lowered))
            .map(|known| known.to_string())
            .unwrap_or(lowered)
    }

    /// Reads matching environment variables.
    fn load(&self) -> BTreeMap<String, String> {
        let mut cache = BTreeMap::new();

        for (key, value) in env::vars() {
            if key.len() > MAX_ENV_KEY_LEN || value.len() > MAX_ENV_VALUE_LEN {
                tracing::debug!(
                    "Skipping oversized environment variable: key_len={}, value_len={}",
                    key.len(),
                    value.len()
                );
                continue;
            }

            let stripped = match key.strip_prefix(self.prefix.as_str()) {
                Some(stripped) if !stripped.is_empty() => stripped,
                _ => continue,
            };
            cache.insert(Self::canonical_key(stripped), value);
        }

        tracing::debug!(
            "Loaded {} environment variables (prefix={:?})",
            cache.len(),
            self.prefix
        );

        cache
    }

    /// Gets the cache, loading it on first use.
    fn get_cache(&self) -> BTreeMap<String, String> {
        {
            let guard = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(cache) = guard.as_ref() {
                return cache.clone();
            }
        }

        let loaded = self.load();
        let mut guard = self.cache.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(loaded.clone());
        loaded
    }
}

impl Default for EnvVarAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigSource for EnvVarAdapter {
    fn name(&self) -> &str {
        "env"
    }

    fn priority(&self) -> u8 {
        2
    }

    fn entries(&self) -> Result<ConfigEntries> {
        Ok(self
            .get_cache()
            .into_iter()
            .map(|(key, value)| (key, ConfigValue::from(value)))
            .collect())
    }

    fn reload(&mut self) -> Result<()> {
        let mut guard = self.cache.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    // Helper to set and clean up environment variables
    struct EnvGuard {
        keys: Vec<String>,
    }

    impl EnvGuard {
        fn new() -> Self {
            EnvGuard { keys: Vec::new() }
        }

        fn set(&mut self, key: &str, value: &str) {
            env::set_var(key, value);
            self.keys.push(key.to_string());
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for key in &self.keys {
                env::remove_var(key);
            }
        }
    }

    fn lookup(adapter: &EnvVarAdapter, key: &str) -> Option<ConfigValue> {
        adapter
            .entries()
            .unwrap()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    #[test]
    fn test_env_adapter_defaults() {
        let adapter = EnvVarAdapter::default();
        assert_eq!(adapter.name(), "env");
        assert_eq!(adapter.priority(), 2);
        assert_eq!(adapter.prefix(), "MAILDISCOVER_");
    }

    #[test]
    fn test_env_adapter_strips_prefix_and_lowercases() {
        let mut guard = EnvGuard::new();
        guard.set("MDTEST_STRIP_ALLOW_DNS_LOOKUP", "0");
        guard.set("OTHER_STRIP_VAR", "should_not_appear");

        let adapter = EnvVarAdapter::with_prefix("MDTEST_STRIP_");
        assert_eq!(lookup(&adapter, "allow_dns_lookup"), Some(ConfigValue::Integer(0)));
        assert!(lookup(&adapter, "var").is_none());
    }

    #[test]
    fn test_env_adapter_restores_mixed_case_keys() {
        let mut guard = EnvGuard::new();
        guard.set("MDTEST_CASE_INCOMING_MAIL_SOCKETTYPE", "SSL");

        let adapter = EnvVarAdapter::with_prefix("MDTEST_CASE_");
        assert_eq!(
            lookup(&adapter, "incoming_mail_socketType"),
            Some(ConfigValue::from("SSL"))
        );
    }

    #[test]
    fn test_env_adapter_reload() {
        let mut guard = EnvGuard::new();
        guard.set("MDTEST_RELOAD_INCOMING_MAIL_PORT", "993");

        let mut adapter = EnvVarAdapter::with_prefix("MDTEST_RELOAD_");
        assert_eq!(lookup(&adapter, "incoming_mail_port"), Some(ConfigValue::Integer(993)));

        guard.set("MDTEST_RELOAD_INCOMING_MAIL_PORT", "143");
        // cached until reloaded
        assert_eq!(lookup(&adapter, "incoming_mail_port"), Some(ConfigValue::Integer(993)));

        adapter.reload().unwrap();
        assert_eq!(lookup(&adapter, "incoming_mail_port"), Some(ConfigValue::Integer(143)));
    }

    #[test]
    fn test_env_adapter_with_values() {
        let adapter = EnvVarAdapter::with_values(vec![
            ("services".to_string(), "email".to_string()),
            ("allow_all_domains".to_string(), "1".to_string()),
        ]);
        let entries = adapter.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(lookup(&adapter, "services"), Some(ConfigValue::from("email")));
    }
}
