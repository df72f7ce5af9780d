// SPDX-License-Identifier: MIT OR Apache-2.0

//! CalDAV and CardDAV resolution.
//!
//! A configured `<kind>_url` always wins. Otherwise the secure SRV name
//! (`_caldavs._tcp`) is tried before the plain one (`_caldav._tcp`); each SRV
//! hit needs a `path=` TXT record under the same name to produce a URL.

use super::dns_resolver::{srv_name, DnsResolver};
use super::mail::set_from_config;
use crate::domain::{
    ConfigStore, DiscoverError, Field, MailAddress, Result, ServiceDescriptor,
    ServiceDescriptorBuilder, ServiceResolver, ServiceRole, SrvRecord,
};

/// Builds the URL advertised by an SRV target and a TXT path.
///
/// Port 443 selects `https`, anything else `http`. The port is omitted when
/// it is the scheme's default, and a root dot on `target` is dropped.
///
/// # Examples
///
/// ```
/// use maildiscover::service::dav::discovered_url;
///
/// assert_eq!(discovered_url("dav.example.com", 443, "/cal"), "https://dav.example.com/cal");
/// assert_eq!(discovered_url("dav.example.com", 8008, "cal"), "http://dav.example.com:8008/cal");
/// ```
pub fn discovered_url(target: &str, port: u16, path: &str) -> String {
    let scheme = if port == 443 { "https" } else { "http" };
    let port = match (scheme, port) {
        ("https", 443) | ("http", 80) => String::new(),
        (_, port) => format!(":{}", port),
    };
    let separator = if path.starts_with('/') { "" } else { "/" };
    let target = target.trim_end_matches('.');
    format!("{}://{}{}{}{}", scheme, target, port, separator, path)
}

/// Resolves the CalDAV or CardDAV endpoint of an account.
#[derive(Clone, Debug)]
pub struct DavResolver {
    role: ServiceRole,
    dns: DnsResolver,
}

impl DavResolver {
    /// Creates a CalDAV resolver.
    pub fn caldav(dns: DnsResolver) -> Self {
        Self {
            role: ServiceRole::CalDav,
            dns,
        }
    }

    /// Creates a CardDAV resolver.
    pub fn carddav(dns: DnsResolver) -> Self {
        Self {
            role: ServiceRole::CardDav,
            dns,
        }
    }

    fn url_key(&self) -> String {
        format!("{}_url", self.role.as_str())
    }

    fn configured_url(&self, config: &ConfigStore, domain: &str) -> Option<String> {
        let key = self.url_key();
        if let Some(url) = config.section(domain).and_then(|s| s.get_text(&key)) {
            tracing::debug!("using `{}` from specific domain config [{}]", key, domain);
            return Some(url);
        }
        config.get_text(&key).map(|url| {
            tracing::debug!("using `{}` from general config", key);
            url
        })
    }

    fn discover(&self, domain: &str, attempted: &mut Vec<String>) -> Option<String> {
        let kind = self.role.as_str();
        for service in [format!("{}s", kind), kind.to_string()] {
            let name = srv_name(&service, domain);
            attempted.push(format!("SRV {}", name));
            let Some(SrvRecord { target, port, .. }) = self.dns.query_srv(&service, domain, false)
            else {
                continue;
            };

            attempted.push(format!("TXT {}", name));
            match self.dns.query_txt(&service, domain).and_then(|txt| txt.path) {
                Some(path) => {
                    let url = discovered_url(&target, port, &path);
                    tracing::debug!("discovered {} url `{}` from {}", kind, url, name);
                    return Some(url);
                }
                None => {
                    tracing::debug!("SRV {} has no usable TXT path, skipping", name);
                }
            }
        }
        None
    }
}

impl ServiceResolver for DavResolver {
    fn role(&self) -> ServiceRole {
        self.role
    }

    fn resolve(&self, config: &ConfigStore, address: &MailAddress) -> Result<ServiceDescriptor> {
        let mut builder = ServiceDescriptorBuilder::new(self.role, address);
        let key = self.url_key();
        let domain = address.domain();

        let url = match self.configured_url(config, domain) {
            Some(url) => url,
            None => {
                let mut attempted = Vec::new();
                let found = if self.dns.allow_lookups() {
                    self.discover(domain, &mut attempted)
                } else {
                    tracing::info!(
                        "no `{}` and allow_dns_lookup=false, {} can not be discovered",
                        key,
                        self.role.as_str()
                    );
                    attempted.push("DNS lookups disabled".to_string());
                    None
                };
                found.ok_or_else(|| DiscoverError::discovery(self.role.as_str(), &attempted, &key))?
            }
        };

        set_from_config(&mut builder, Field::Url, &key, &url)?;
        builder.build()
    }
}
