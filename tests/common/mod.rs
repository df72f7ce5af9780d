// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities shared by the integration tests.
//!
//! Provides a scripted DNS that records every query, a mock configuration
//! source, temporary YAML files and a log subscriber.

#![allow(dead_code)]

use maildiscover::domain::{ConfigEntries, ConfigValue, MxRecord, Result, SrvRecord};
use maildiscover::ports::{ConfigSource, DnsLookup};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Routes `tracing` output through the test harness.
///
/// Set `RUST_LOG=maildiscover=debug` to see lookup notices; repeated calls are
/// no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A DNS that answers from fixed tables and records every query.
///
/// Queries are recorded as `"SRV <name>"`, `"TXT <name>"` and `"MX <domain>"`.
#[derive(Debug, Default)]
pub struct RecordingDns {
    srv: HashMap<String, Vec<SrvRecord>>,
    txt: HashMap<String, Vec<String>>,
    mx: HashMap<String, Vec<MxRecord>>,
    calls: Mutex<Vec<String>>,
}

impl RecordingDns {
    /// Creates a DNS without any records.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an SRV record at `name`.
    pub fn with_srv(mut self, name: &str, priority: u16, port: u16, target: &str) -> Self {
        self.srv.entry(name.to_string()).or_default().push(SrvRecord {
            priority,
            weight: 0,
            port,
            target: target.to_string(),
        });
        self
    }

    /// Adds a TXT record at `name`.
    pub fn with_txt(mut self, name: &str, text: &str) -> Self {
        self.txt
            .entry(name.to_string())
            .or_default()
            .push(text.to_string());
        self
    }

    /// Adds an MX record for `domain`.
    pub fn with_mx(mut self, domain: &str, preference: u16, exchange: &str) -> Self {
        self.mx.entry(domain.to_string()).or_default().push(MxRecord {
            preference,
            exchange: exchange.to_string(),
        });
        self
    }

    /// Every query issued so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, kind: &str, name: &str) {
        self.calls.lock().unwrap().push(format!("{} {}", kind, name));
    }
}

impl DnsLookup for RecordingDns {
    fn srv(&self, name: &str) -> Result<Vec<SrvRecord>> {
        self.record("SRV", name);
        Ok(self.srv.get(name).cloned().unwrap_or_default())
    }

    fn txt(&self, name: &str) -> Result<Vec<String>> {
        self.record("TXT", name);
        Ok(self.txt.get(name).cloned().unwrap_or_default())
    }

    fn mx(&self, domain: &str) -> Result<Vec<MxRecord>> {
        self.record("MX", domain);
        Ok(self.mx.get(domain).cloned().unwrap_or_default())
    }
}

/// A mock configuration source holding flat key/value pairs.
#[derive(Debug, Clone)]
pub struct MockConfigSource {
    name: String,
    priority: u8,
    values: Vec<(String, String)>,
}

impl MockConfigSource {
    /// Creates a new mock source with the given name and priority.
    pub fn new(name: impl Into<String>, priority: u8) -> Self {
        Self {
            name: name.into(),
            priority,
            values: Vec::new(),
        }
    }

    /// Adds a value to the mock source.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.push((key.into(), value.into()));
        self
    }
}

impl ConfigSource for MockConfigSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> u8 {
        self.priority
    }

    fn entries(&self) -> Result<ConfigEntries> {
        Ok(self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), ConfigValue::from(v.as_str())))
            .collect())
    }

    fn reload(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Creates a temporary YAML file with the given content.
///
/// Returns a NamedTempFile that will be automatically deleted when dropped.
pub fn create_temp_yaml(content: &str) -> tempfile::NamedTempFile {
    use std::io::Write;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file.flush().unwrap();
    file
}
