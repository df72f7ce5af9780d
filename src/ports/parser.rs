// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration parser trait definition.
//!
//! This module defines the `ConfigParser` trait, which turns the text of a
//! configuration file into ordered raw entries.

use crate::domain::{ConfigEntries, Result};

/// A trait for parsing configuration files.
///
/// # Entry Format
///
/// Top-level keys are either scalars (global settings) or sections. A section
/// is a nested [`ConfigStore`](crate::domain::ConfigStore) stored under its
/// header, which may declare a parent:
///
/// ```yaml
/// allow_dns_lookup: 1
/// example.com:
///   incoming_mail_server: imap.example.com
/// "example.net : example.com":
///   outgoing_mail_server: smtp.example.net
/// ```
///
/// Parsers keep declaration order; they do not resolve extensions.
///
/// # Examples
///
/// ```rust
/// use maildiscover::domain::{ConfigEntries, ConfigValue, Result};
/// use maildiscover::ports::ConfigParser;
///
/// struct LineParser;
///
/// impl ConfigParser for LineParser {
///     fn parse(&self, content: &str) -> Result<ConfigEntries> {
///         Ok(content
///             .lines()
///             .filter_map(|line| line.split_once('='))
///             .map(|(k, v)| (k.trim().to_string(), ConfigValue::from(v.trim())))
///             .collect())
///     }
///
///     fn supported_extensions(&self) -> &[&str] {
///         &["conf"]
///     }
/// }
///
/// let entries = LineParser.parse("incoming_mail_port = 993").unwrap();
/// assert_eq!(entries[0].1, ConfigValue::Integer(993));
/// ```
pub trait ConfigParser {
    /// Parses configuration content into ordered entries.
    ///
    /// # Returns
    ///
    /// * `Ok(ConfigEntries)` - The parsed entries
    /// * `Err(DiscoverError)` - The content is malformed
    fn parse(&self, content: &str) -> Result<ConfigEntries>;

    /// Returns the file extensions supported by this parser, without the dot.
    fn supported_extensions(&self) -> &[&str];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConfigStore, ConfigValue};

    struct SectionParser;

    impl ConfigParser for SectionParser {
        fn parse(&self, _content: &str) -> Result<ConfigEntries> {
            let mut section = ConfigStore::new();
            section.insert("incoming_mail_server", ConfigValue::from("imap.example.com"));
            Ok(vec![
                ("allow_dns_lookup".to_string(), ConfigValue::from("0")),
                ("example.com".to_string(), ConfigValue::Section(section)),
            ])
        }

        fn supported_extensions(&self) -> &[&str] {
            &["test", "tst"]
        }
    }

    #[test]
    fn test_parser_keeps_order_and_sections() {
        let entries = SectionParser.parse("").unwrap();
        assert_eq!(entries[0].0, "allow_dns_lookup");
        assert!(entries[1].1.is_section());
    }

    #[test]
    fn test_parser_supported_extensions() {
        assert_eq!(SectionParser.supported_extensions(), &["test", "tst"]);
    }
}
