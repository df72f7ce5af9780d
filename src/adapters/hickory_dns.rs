// SPDX-License-Identifier: MIT OR Apache-2.0

//! DNS lookup adapter backed by `hickory-resolver`.

use crate::domain::{ConfigStore, DiscoverError, MxRecord, Result, SrvRecord};
use crate::ports::DnsLookup;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::system_conf::read_system_conf;
use hickory_resolver::Resolver;
use std::time::Duration;

/// Per-query timeout used when `dns_timeout` is not configured.
pub const DEFAULT_DNS_TIMEOUT: Duration = Duration::from_secs(3);

const SOURCE_NAME: &str = "dns";

/// Blocking DNS lookups through the system resolver configuration.
///
/// Every query gets a single attempt bounded by the configured timeout. A
/// "no records" answer is an empty result, not an error.
///
/// # Examples
///
/// ```rust,no_run
/// use maildiscover::adapters::HickoryDnsAdapter;
/// use maildiscover::ports::DnsLookup;
/// use std::time::Duration;
///
/// let dns = HickoryDnsAdapter::new(Duration::from_secs(2)).unwrap();
/// let records = dns.mx("example.com").unwrap();
/// ```
pub struct HickoryDnsAdapter {
    resolver: Resolver,
    timeout: Duration,
}

impl HickoryDnsAdapter {
    /// Creates an adapter from the system configuration with `timeout` per query.
    ///
    /// Falls back to hickory's default upstream servers when the system
    /// configuration can not be read.
    pub fn new(timeout: Duration) -> Result<Self> {
        let (config, mut opts) = match read_system_conf() {
            Ok(conf) => conf,
            Err(e) => {
                tracing::warn!("failed to read system DNS configuration, using defaults: {}", e);
                (ResolverConfig::default(), ResolverOpts::default())
            }
        };
        opts.timeout = timeout;
        opts.attempts = 1;

        let resolver = Resolver::new(config, opts).map_err(|e| DiscoverError::SourceError {
            source_name: SOURCE_NAME.to_string(),
            message: "Failed to initialize DNS resolver".to_string(),
            source: Some(Box::new(e)),
        })?;

        Ok(Self { resolver, timeout })
    }

    /// Creates an adapter using the `dns_timeout` key (seconds, default 3).
    pub fn from_config(config: &ConfigStore) -> Result<Self> {
        let timeout = match config.get("dns_timeout") {
            Some(value) => Duration::from_secs_f64(value.as_seconds("dns_timeout")?),
            None => DEFAULT_DNS_TIMEOUT,
        };
        Self::new(timeout)
    }

    /// Returns the per-query timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Appends the root dot so the search list is never consulted.
fn fully_qualified(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{}.", name)
    }
}

fn host_text(name: &hickory_resolver::Name) -> String {
    name.to_utf8().trim_end_matches('.').to_string()
}

/// Maps "no records" to an empty answer and anything else to an error.
fn empty_on_no_records<T>(name: &str, err: ResolveError) -> Result<Vec<T>> {
    match err.kind() {
        ResolveErrorKind::NoRecordsFound { .. } => {
            tracing::trace!("no records at {}", name);
            Ok(Vec::new())
        }
        _ => Err(DiscoverError::SourceError {
            source_name: SOURCE_NAME.to_string(),
            message: format!("lookup of {} failed", name),
            source: Some(Box::new(err)),
        }),
    }
}

impl DnsLookup for HickoryDnsAdapter {
    fn srv(&self, name: &str) -> Result<Vec<SrvRecord>> {
        match self.resolver.srv_lookup(fully_qualified(name).as_str()) {
            Ok(lookup) => Ok(lookup
                .iter()
                .map(|srv| SrvRecord {
                    priority: srv.priority(),
                    weight: srv.weight(),
                    port: srv.port(),
                    target: host_text(srv.target()),
                })
                // a target of "." means the service is decidedly not available
                .filter(|record| !record.target.is_empty())
                .collect()),
            Err(err) => empty_on_no_records(name, err),
        }
    }

    fn txt(&self, name: &str) -> Result<Vec<String>> {
        match self.resolver.txt_lookup(fully_qualified(name).as_str()) {
            Ok(lookup) => Ok(lookup
                .iter()
                .map(|txt| {
                    txt.txt_data()
                        .iter()
                        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
                        .collect::<String>()
                })
                .collect()),
            Err(err) => empty_on_no_records(name, err),
        }
    }

    fn mx(&self, domain: &str) -> Result<Vec<MxRecord>> {
        match self.resolver.mx_lookup(fully_qualified(domain).as_str()) {
            Ok(lookup) => Ok(lookup
                .iter()
                .map(|mx| MxRecord {
                    preference: mx.preference(),
                    exchange: host_text(mx.exchange()),
                })
                .filter(|record| !record.exchange.is_empty())
                .collect()),
            Err(err) => empty_on_no_records(domain, err),
        }
    }
}

impl std::fmt::Debug for HickoryDnsAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HickoryDnsAdapter")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
