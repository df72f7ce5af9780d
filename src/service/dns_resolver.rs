// SPDX-License-Identifier: MIT OR Apache-2.0

//! Guarded DNS discovery helpers.
//!
//! [`DnsResolver`] wraps a [`DnsLookup`] behind the `allow_dns_lookup` kill
//! switch and turns raw answers into single, selected results. Empty answers,
//! lookup failures and a disabled switch all read as "not found"; only
//! [`DnsResolver::require_mx`] escalates.

use crate::domain::{ConfigStore, DiscoverError, MxRecord, Result, SrvRecord, TxtAnswer};
use crate::ports::DnsLookup;
use std::fmt;
use std::sync::Arc;

/// The owner name of an SRV/TXT record for `service` under `domain`.
pub fn srv_name(service: &str, domain: &str) -> String {
    format!("_{}._tcp.{}", service, domain)
}

/// DNS queries gated by the `allow_dns_lookup` setting.
///
/// Cloning is cheap; clones share the underlying lookup.
#[derive(Clone)]
pub struct DnsResolver {
    lookup: Option<Arc<dyn DnsLookup>>,
    allow_lookups: bool,
}

impl DnsResolver {
    /// Creates a resolver over `lookup`.
    pub fn new(lookup: Arc<dyn DnsLookup>, allow_lookups: bool) -> Self {
        Self {
            lookup: Some(lookup),
            allow_lookups,
        }
    }

    /// Creates a resolver that refuses every query.
    pub fn disabled() -> Self {
        Self {
            lookup: None,
            allow_lookups: false,
        }
    }

    /// Creates a resolver whose switch is read from `allow_dns_lookup` (default on).
    ///
    /// Without a lookup capability the resolver is disabled regardless.
    pub fn from_config(lookup: Option<Arc<dyn DnsLookup>>, config: &ConfigStore) -> Result<Self> {
        let allowed = config.get_bool("allow_dns_lookup", true)?;
        if allowed && lookup.is_none() {
            tracing::info!("no DNS lookup capability available, DNS discovery disabled");
        }
        Ok(Self {
            allow_lookups: allowed && lookup.is_some(),
            lookup,
        })
    }

    /// Returns `true` when queries are actually issued.
    pub fn allow_lookups(&self) -> bool {
        self.allow_lookups
    }

    fn lookup(&self, what: &str, name: &str) -> Option<&dyn DnsLookup> {
        match (&self.lookup, self.allow_lookups) {
            (Some(lookup), true) => Some(lookup.as_ref()),
            _ => {
                tracing::info!("{} lookup for {} refused by config (allow_dns_lookup)", what, name);
                None
            }
        }
    }

    fn srv_at(&self, name: &str) -> Option<SrvRecord> {
        let lookup = self.lookup("SRV", name)?;
        let records = match lookup.srv(name) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("SRV lookup for {} failed, treating as not found: {}", name, e);
                return None;
            }
        };
        tracing::debug!("found {} SRV entries for {}", records.len(), name);
        let selected = SrvRecord::select(&records).cloned();
        if let Some(srv) = &selected {
            tracing::debug!(
                "DNS SRV {} priority={} weight={} port={} target={}",
                name,
                srv.priority,
                srv.weight,
                srv.port,
                srv.target
            );
        }
        selected
    }

    /// Queries `_service._tcp.domain` and selects one record.
    ///
    /// With `try_secure`, an empty answer is retried once at
    /// `_services._tcp.domain`.
    pub fn query_srv(&self, service: &str, domain: &str, try_secure: bool) -> Option<SrvRecord> {
        if let Some(srv) = self.srv_at(&srv_name(service, domain)) {
            return Some(srv);
        }
        if try_secure && self.allow_lookups {
            return self.srv_at(&srv_name(&format!("{}s", service), domain));
        }
        None
    }

    /// Queries TXT at `_service._tcp.domain` and parses the first record.
    pub fn query_txt(&self, service: &str, domain: &str) -> Option<TxtAnswer> {
        let name = srv_name(service, domain);
        let lookup = self.lookup("TXT", &name)?;
        match lookup.txt(&name) {
            Ok(records) => {
                let answer = records.into_iter().next().map(TxtAnswer::from_raw);
                if let Some(txt) = &answer {
                    tracing::debug!("DNS TXT {} \"{}\"", name, txt.raw);
                }
                answer
            }
            Err(e) => {
                tracing::warn!("TXT lookup for {} failed, treating as not found: {}", name, e);
                None
            }
        }
    }

    /// Queries MX for `domain` and returns the preferred exchange.
    pub fn query_mx(&self, domain: &str) -> Option<String> {
        let lookup = self.lookup("MX", domain)?;
        let records = match lookup.mx(domain) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("MX lookup for {} failed, treating as not found: {}", domain, e);
                return None;
            }
        };
        tracing::debug!("found {} MX records for {}", records.len(), domain);
        let host = MxRecord::select(&records).map(|mx| mx.exchange.clone());
        if let Some(host) = &host {
            tracing::debug!("Found MX record `{}` for hostname `{}`", host, domain);
        }
        host
    }

    /// Like [`query_mx`](Self::query_mx), but a missing answer is an error.
    ///
    /// Fails with a `DiscoveryError` hinting at `hint_key` when no MX record
    /// was found or lookups are disabled.
    pub fn require_mx(&self, domain: &str, hint_key: &str) -> Result<String> {
        self.query_mx(domain).ok_or_else(|| {
            let attempted = if self.allow_lookups {
                vec![format!("MX {}", domain)]
            } else {
                Vec::new()
            };
            DiscoverError::discovery(format!("MX for {}", domain), &attempted, hint_key)
        })
    }
}

impl fmt::Debug for DnsResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DnsResolver")
            .field("has_lookup", &self.lookup.is_some())
            .field("allow_lookups", &self.allow_lookups)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConfigValue;
    use crate::ports::dns::fake::ScriptedDns;

    fn resolver(dns: ScriptedDns) -> (Arc<ScriptedDns>, DnsResolver) {
        let dns = Arc::new(dns);
        let resolver = DnsResolver::new(dns.clone(), true);
        (dns, resolver)
    }

    #[test]
    fn test_srv_name() {
        assert_eq!(srv_name("imap", "example.com"), "_imap._tcp.example.com");
    }

    #[test]
    fn test_query_srv_retries_secure_variant() {
        let (dns, resolver) =
            resolver(ScriptedDns::new().with_srv("_imaps._tcp.example.com", 993, "imap.example.com"));

        let srv = resolver.query_srv("imap", "example.com", true).unwrap();
        assert_eq!(srv.port, 993);
        assert_eq!(
            dns.calls(),
            vec!["SRV _imap._tcp.example.com", "SRV _imaps._tcp.example.com"]
        );
    }

    #[test]
    fn test_query_srv_without_secure_variant() {
        let (dns, resolver) = resolver(ScriptedDns::new());
        assert!(resolver.query_srv("submission", "example.com", false).is_none());
        assert_eq!(dns.calls(), vec!["SRV _submission._tcp.example.com"]);
    }

    #[test]
    fn test_lookup_failure_reads_as_not_found() {
        let (_, resolver) =
            resolver(ScriptedDns::new().with_failure("_caldavs._tcp.example.com"));
        assert!(resolver.query_srv("caldavs", "example.com", false).is_none());
    }

    #[test]
    fn test_query_txt_extracts_path() {
        let (_, resolver) = resolver(
            ScriptedDns::new()
                .with_txt("_carddavs._tcp.example.com", "path=/dav/contacts")
                .with_txt("_carddavs._tcp.example.com", "path=/ignored"),
        );
        let txt = resolver.query_txt("carddavs", "example.com").unwrap();
        assert_eq!(txt.path.as_deref(), Some("/dav/contacts"));
    }

    #[test]
    fn test_query_mx_prefers_lowest_then_first() {
        let (_, resolver) = resolver(
            ScriptedDns::new()
                .with_mx("example.com", 20, "mx2.example.com")
                .with_mx("example.com", 10, "mx1.example.com")
                .with_mx("example.com", 10, "mx1b.example.com"),
        );
        assert_eq!(resolver.query_mx("example.com").as_deref(), Some("mx1.example.com"));
    }

    #[test]
    fn test_require_mx_fails_without_records() {
        let (_, resolver) = resolver(ScriptedDns::new());
        let err = resolver
            .require_mx("example.com", "incoming_mail_server")
            .unwrap_err();
        assert!(matches!(err, DiscoverError::DiscoveryError { .. }));
        assert!(err.to_string().contains("incoming_mail_server"));
    }

    #[test]
    fn test_disabled_resolver_issues_no_queries() {
        let dns = Arc::new(ScriptedDns::new().with_mx("example.com", 10, "mx.example.com"));
        let mut config = ConfigStore::new();
        config.insert("allow_dns_lookup", ConfigValue::from("0"));
        let resolver = DnsResolver::from_config(Some(dns.clone()), &config).unwrap();

        assert!(!resolver.allow_lookups());
        assert!(resolver.query_mx("example.com").is_none());
        assert!(resolver.query_srv("imap", "example.com", true).is_none());
        assert!(resolver.query_txt("caldav", "example.com").is_none());
        assert!(dns.calls().is_empty());
    }

    #[test]
    fn test_from_config_defaults_to_enabled() {
        let dns: Arc<dyn DnsLookup> = Arc::new(ScriptedDns::new());
        let resolver = DnsResolver::from_config(Some(dns), &ConfigStore::new()).unwrap();
        assert!(resolver.allow_lookups());
        assert!(!DnsResolver::from_config(None, &ConfigStore::new()).unwrap().allow_lookups());
    }
}
