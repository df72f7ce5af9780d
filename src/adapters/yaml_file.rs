// SPDX-License-Identifier: MIT OR Apache-2.0

//! YAML file configuration source adapter.
//!
//! This module provides an adapter that reads the administrator configuration
//! from a YAML file. Top-level scalars are global settings; top-level mappings
//! are sections (client profiles such as `mozilla`, or per-domain overrides).

use crate::domain::{ConfigEntries, ConfigStore, ConfigValue, DiscoverError, Result};
use crate::ports::{ConfigParser, ConfigSource};
use directories::ProjectDirs;
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Maximum allowed file size for YAML configuration files (10MB)
/// This prevents denial of service attacks via extremely large files
const MAX_YAML_FILE_SIZE: u64 = 10 * 1024 * 1024;

const SOURCE_NAME: &str = "yaml-file";

/// YAML parser implementation.
///
/// Mapping order is preserved. Sequences become comma separated text, so
/// `services: [email, caldav]` and `services: "email, caldav"` are equivalent.
///
/// # Examples
///
/// ```rust
/// use maildiscover::adapters::YamlParser;
/// use maildiscover::domain::ConfigValue;
/// use maildiscover::ports::ConfigParser;
///
/// let parser = YamlParser::new();
/// let yaml = "allow_dns_lookup: false\nexample.com:\n  incoming_mail_port: 993";
/// let entries = parser.parse(yaml).unwrap();
/// assert_eq!(entries[0].1, ConfigValue::Boolean(false));
/// assert!(entries[1].1.is_section());
/// ```
#[derive(Debug, Clone)]
pub struct YamlParser;

impl YamlParser {
    /// Creates a new YAML parser.
    pub fn new() -> Self {
        YamlParser
    }

    fn key_text(key: &Value) -> Option<String> {
        match key {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Converts a YAML mapping into ordered entries, nesting sub-mappings.
    fn mapping_entries(map: &serde_yaml::Mapping) -> ConfigEntries {
        let mut entries = ConfigEntries::new();
        for (key, value) in map {
            let Some(key) = Self::key_text(key) else {
                tracing::warn!("ignoring YAML key that is not a scalar: {:?}", key);
                continue;
            };
            match Self::convert(value) {
                Some(value) => entries.push((key, value)),
                None => tracing::warn!("ignoring unsupported YAML value for `{}`", key),
            }
        }
        entries
    }

    fn convert(value: &Value) -> Option<ConfigValue> {
        match value {
            Value::Mapping(map) => {
                let mut section = ConfigStore::new();
                for (key, value) in Self::mapping_entries(map) {
                    section.insert(key, value);
                }
                Some(ConfigValue::Section(section))
            }
            Value::Sequence(seq) => {
                let items: Vec<String> = seq
                    .iter()
                    .filter_map(|item| Self::convert(item).and_then(|v| v.as_text()))
                    .collect();
                Some(ConfigValue::Text(items.join(", ")))
            }
            Value::String(s) => Some(ConfigValue::Text(s.clone())),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(ConfigValue::Integer(i)),
                None => n.as_f64().map(ConfigValue::Float),
            },
            Value::Bool(b) => Some(ConfigValue::Boolean(*b)),
            Value::Null => Some(ConfigValue::Text(String::new())),
            Value::Tagged(tagged) => Self::convert(&tagged.value),
        }
    }
}

impl Default for YamlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigParser for YamlParser {
    fn parse(&self, content: &str) -> Result<ConfigEntries> {
        let value: Value = serde_yaml::from_str(content).map_err(|e| DiscoverError::ParseError {
            message: format!("Failed to parse YAML: {}", e),
            source: Some(Box::new(e)),
        })?;

        match value {
            Value::Mapping(map) => Ok(Self::mapping_entries(&map)),
            Value::Null => Ok(ConfigEntries::new()),
            other => Err(DiscoverError::ParseError {
                message: format!(
                    "Failed to parse YAML: top level must be a mapping, found {:?}",
                    other
                ),
                source: None,
            }),
        }
    }

    fn supported_extensions(&self) -> &[&str] {
        &["yaml", "yml"]
    }
}

fn source_error(message: String, source: Option<std::io::Error>) -> DiscoverError {
    DiscoverError::SourceError {
        source_name: SOURCE_NAME.to_string(),
        message,
        source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
    }
}

fn display_name(path: &Path) -> &str {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
}

/// Reads `path` after checking its size.
fn read_capped(path: &Path) -> Result<String> {
    let metadata = fs::metadata(path).map_err(|e| {
        source_error(
            format!("Failed to read file metadata: {}", display_name(path)),
            Some(e),
        )
    })?;

    if metadata.len() > MAX_YAML_FILE_SIZE {
        return Err(source_error(
            format!(
                "Configuration file too large: {} bytes (max {} bytes)",
                metadata.len(),
                MAX_YAML_FILE_SIZE
            ),
            None,
        ));
    }

    fs::read_to_string(path).map_err(|e| {
        source_error(
            format!("Failed to read configuration file: {}", display_name(path)),
            Some(e),
        )
    })
}

/// Configuration source adapter for YAML files.
///
/// # Priority
///
/// YAML files have a priority of 1, which means they are overridden by
/// environment variables (priority 2).
///
/// # Examples
///
/// ```rust,no_run
/// use maildiscover::adapters::YamlFileAdapter;
///
/// // Load from a specific file
/// let adapter = YamlFileAdapter::from_file("/etc/maildiscover/config.yaml").unwrap();
///
/// // Load from default OS location
/// let adapter = YamlFileAdapter::from_default_location("maildiscover", "org.example").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct YamlFileAdapter {
    /// Path to the YAML file
    file_path: PathBuf,
    /// Parsed entries
    entries: ConfigEntries,
    /// YAML parser
    parser: YamlParser,
}

impl YamlFileAdapter {
    /// Creates a new YAML file adapter from a specific file path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file_path = path.as_ref();
        let parser = YamlParser::new();

        // Canonicalize path to prevent directory traversal attacks
        let canonical_path = file_path.canonicalize().map_err(|e| {
            source_error(
                format!("Invalid or inaccessible path: {}", display_name(file_path)),
                Some(e),
            )
        })?;

        let content = read_capped(&canonical_path)?;
        let entries = parser.parse(&content)?;
        tracing::debug!(
            "parsed {} top-level entries from {}",
            entries.len(),
            canonical_path.display()
        );

        Ok(Self {
            file_path: canonical_path,
            entries,
            parser,
        })
    }

    /// Creates a new YAML file adapter from the default OS-appropriate location.
    ///
    /// The file is `config.yaml` in the project configuration directory as
    /// determined by the `directories` crate.
    pub fn from_default_location(app_name: &str, qualifier: &str) -> Result<Self> {
        Self::with_filename(app_name, qualifier, "config.yaml")
    }

    /// Creates a new YAML file adapter with a custom file name in the default location.
    pub fn with_filename(app_name: &str, qualifier: &str, filename: &str) -> Result<Self> {
        let proj_dirs = ProjectDirs::from(qualifier, "", app_name).ok_or_else(|| {
            source_error("Failed to determine project directories".to_string(), None)
        })?;

        Self::from_file(proj_dirs.config_dir().join(filename))
    }

    /// Returns the path to the configuration file.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

impl ConfigSource for YamlFileAdapter {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn priority(&self) -> u8 {
        1
    }

    fn entries(&self) -> Result<ConfigEntries> {
        Ok(self.entries.clone())
    }

    fn reload(&mut self) -> Result<()> {
        let content = read_capped(&self.file_path)?;
        self.entries = self.parser.parse(&content)?;
        Ok(())
    }
}
