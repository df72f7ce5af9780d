// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration source trait definition.
//!
//! This module defines the `ConfigSource` trait, the port through which
//! administrator configuration (files, environment variables, anything else)
//! reaches the [`ConfigStore`](crate::domain::ConfigStore).

use crate::domain::{ConfigEntries, Result};

/// A trait for configuration sources.
///
/// A source hands over its whole content as ordered raw entries; section
/// headers may still carry a `child : parent` suffix, which the store resolves
/// while loading.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so a source can be shared with the
/// threads serving requests.
///
/// # Priority
///
/// Sources are applied in ascending priority, so the value from the source with
/// the highest priority wins on a key collision:
///
/// - **2**: Environment variables
/// - **1 (lowest)**: Configuration files
///
/// # Examples
///
/// ```rust
/// use maildiscover::domain::{ConfigEntries, ConfigValue, Result};
/// use maildiscover::ports::ConfigSource;
///
/// struct StaticSource;
///
/// impl ConfigSource for StaticSource {
///     fn name(&self) -> &str {
///         "static"
///     }
///
///     fn priority(&self) -> u8 {
///         1
///     }
///
///     fn entries(&self) -> Result<ConfigEntries> {
///         Ok(vec![("allow_dns_lookup".to_string(), ConfigValue::from("0"))])
///     }
///
///     fn reload(&mut self) -> Result<()> {
///         Ok(())
///     }
/// }
///
/// assert_eq!(StaticSource.entries().unwrap().len(), 1);
/// ```
pub trait ConfigSource: Send + Sync {
    /// Returns the name of this configuration source.
    ///
    /// Used for logging and error messages; a short identifier like "env" or
    /// "yaml-file".
    fn name(&self) -> &str;

    /// Returns the priority of this configuration source.
    ///
    /// Higher values are applied later and therefore take precedence.
    fn priority(&self) -> u8;

    /// Returns every entry of this source in declaration order.
    ///
    /// # Returns
    ///
    /// * `Ok(ConfigEntries)` - The raw entries, nested sections included
    /// * `Err(DiscoverError)` - The source could not be read or parsed
    fn entries(&self) -> Result<ConfigEntries>;

    /// Reloads the configuration from the underlying storage.
    ///
    /// Sources that can not change (like injected values) return `Ok(())`.
    fn reload(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConfigValue;

    struct TestSource {
        name: String,
        priority: u8,
        reloads: usize,
    }

    impl ConfigSource for TestSource {
        fn name(&self) -> &str {
            &self.name
        }

        fn priority(&self) -> u8 {
            self.priority
        }

        fn entries(&self) -> Result<ConfigEntries> {
            Ok(vec![(
                "reloads".to_string(),
                ConfigValue::Integer(self.reloads as i64),
            )])
        }

        fn reload(&mut self) -> Result<()> {
            self.reloads += 1;
            Ok(())
        }
    }

    fn source() -> TestSource {
        TestSource {
            name: "test-source".to_string(),
            priority: 2,
            reloads: 0,
        }
    }

    #[test]
    fn test_config_source_name_and_priority() {
        let source = source();
        assert_eq!(source.name(), "test-source");
        assert_eq!(source.priority(), 2);
    }

    #[test]
    fn test_config_source_reload_refreshes_entries() {
        let mut source = source();
        source.reload().unwrap();
        let entries = source.entries().unwrap();
        assert_eq!(entries[0].1, ConfigValue::Integer(1));
    }

    #[test]
    fn test_config_source_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Box<dyn ConfigSource>>();
    }
}
