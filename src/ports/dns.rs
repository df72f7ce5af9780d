// SPDX-License-Identifier: MIT OR Apache-2.0

//! DNS lookup trait definition.
//!
//! This module defines the `DnsLookup` trait, the capability through which the
//! resolvers query SRV, TXT and MX records. The hosting environment supplies an
//! implementation; tests substitute scripted fakes.

use crate::domain::{MxRecord, Result, SrvRecord};

/// A trait for raw DNS queries.
///
/// An empty answer is `Ok(vec![])`, never an error. Errors are reserved for
/// failures of the lookup itself (timeouts, unreachable servers); callers treat
/// both the same way and fall through to the next tier.
///
/// # Examples
///
/// ```rust
/// use maildiscover::domain::{MxRecord, Result, SrvRecord};
/// use maildiscover::ports::DnsLookup;
///
/// struct NoDns;
///
/// impl DnsLookup for NoDns {
///     fn srv(&self, _name: &str) -> Result<Vec<SrvRecord>> {
///         Ok(vec![])
///     }
///
///     fn txt(&self, _name: &str) -> Result<Vec<String>> {
///         Ok(vec![])
///     }
///
///     fn mx(&self, _domain: &str) -> Result<Vec<MxRecord>> {
///         Ok(vec![])
///     }
/// }
///
/// assert!(NoDns.srv("_imap._tcp.example.com").unwrap().is_empty());
/// ```
pub trait DnsLookup: Send + Sync {
    /// Queries SRV records at the fully qualified `name`.
    fn srv(&self, name: &str) -> Result<Vec<SrvRecord>>;

    /// Queries TXT records at `name`, one string per record.
    fn txt(&self, name: &str) -> Result<Vec<String>>;

    /// Queries MX records for `domain`.
    fn mx(&self, domain: &str) -> Result<Vec<MxRecord>>;
}

/// Scripted lookup used by unit tests across the crate.
#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use crate::domain::DiscoverError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Answers from fixed tables and records every query name.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedDns {
        srv: HashMap<String, Vec<SrvRecord>>,
        txt: HashMap<String, Vec<String>>,
        mx: HashMap<String, Vec<MxRecord>>,
        failing: Vec<String>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedDns {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn with_srv(mut self, name: &str, port: u16, target: &str) -> Self {
            self.srv.entry(name.to_string()).or_default().push(SrvRecord {
                priority: 10,
                weight: 0,
                port,
                target: target.to_string(),
            });
            self
        }

        pub(crate) fn with_txt(mut self, name: &str, text: &str) -> Self {
            self.txt
                .entry(name.to_string())
                .or_default()
                .push(text.to_string());
            self
        }

        pub(crate) fn with_mx(mut self, domain: &str, preference: u16, exchange: &str) -> Self {
            self.mx.entry(domain.to_string()).or_default().push(MxRecord {
                preference,
                exchange: exchange.to_string(),
            });
            self
        }

        pub(crate) fn with_failure(mut self, name: &str) -> Self {
            self.failing.push(name.to_string());
            self
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().map(|c| c.clone()).unwrap_or_default()
        }

        fn record(&self, kind: &str, name: &str) -> Result<()> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(format!("{} {}", kind, name));
            }
            if self.failing.iter().any(|n| n == name) {
                return Err(DiscoverError::SourceError {
                    source_name: "dns".to_string(),
                    message: format!("timed out querying {}", name),
                    source: None,
                });
            }
            Ok(())
        }
    }

    impl DnsLookup for ScriptedDns {
        fn srv(&self, name: &str) -> Result<Vec<SrvRecord>> {
            self.record("SRV", name)?;
            Ok(self.srv.get(name).cloned().unwrap_or_default())
        }

        fn txt(&self, name: &str) -> Result<Vec<String>> {
            self.record("TXT", name)?;
            Ok(self.txt.get(name).cloned().unwrap_or_default())
        }

        fn mx(&self, domain: &str) -> Result<Vec<MxRecord>> {
            self.record("MX", domain)?;
            Ok(self.mx.get(domain).cloned().unwrap_or_default())
        }
    }
}
