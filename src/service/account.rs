// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account settings orchestration.
//!
//! This module provides [`AccountResolver`], the entry point of the crate. It
//! owns the load-once global configuration and the DNS capability, decides
//! which services apply to a request and runs the matching
//! [`ServiceResolver`]s against a per-request domain overlay.

use super::dav::DavResolver;
use super::dns_resolver::DnsResolver;
use super::incoming::IncomingResolver;
use super::outgoing::OutgoingResolver;
use crate::domain::{
    ConfigStore, DiscoverError, MailAddress, Result, ServiceDescriptor, ServiceKind,
    ServiceResolver,
};
use crate::ports::{ConfigSource, DnsLookup};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// The resolved settings of one service kind.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum ResolvedService {
    /// Mail needs both directions.
    Email {
        /// The IMAP or POP3 server.
        incoming: ServiceDescriptor,
        /// The SMTP server.
        outgoing: ServiceDescriptor,
    },
    /// A CalDAV or CardDAV endpoint.
    Dav(ServiceDescriptor),
}

impl ResolvedService {
    /// The incoming descriptor of an `Email` entry.
    pub fn incoming(&self) -> Option<&ServiceDescriptor> {
        match self {
            ResolvedService::Email { incoming, .. } => Some(incoming),
            ResolvedService::Dav(_) => None,
        }
    }

    /// The outgoing descriptor of an `Email` entry.
    pub fn outgoing(&self) -> Option<&ServiceDescriptor> {
        match self {
            ResolvedService::Email { outgoing, .. } => Some(outgoing),
            ResolvedService::Dav(_) => None,
        }
    }

    /// The descriptor of a `Dav` entry.
    pub fn dav(&self) -> Option<&ServiceDescriptor> {
        match self {
            ResolvedService::Dav(descriptor) => Some(descriptor),
            ResolvedService::Email { .. } => None,
        }
    }
}

/// Everything a renderer needs for one address.
#[derive(Clone, Debug, Serialize)]
pub struct AccountSettings {
    /// The address the settings were resolved for.
    pub address: MailAddress,
    /// Resolved services, keyed by kind.
    pub services: BTreeMap<ServiceKind, ResolvedService>,
}

impl AccountSettings {
    /// Returns the resolved entry for `kind`, if it was selected.
    pub fn get(&self, kind: ServiceKind) -> Option<&ResolvedService> {
        self.services.get(&kind)
    }

    /// Shorthand for the incoming mail descriptor.
    pub fn incoming(&self) -> Option<&ServiceDescriptor> {
        self.get(ServiceKind::Email).and_then(ResolvedService::incoming)
    }

    /// Shorthand for the outgoing mail descriptor.
    pub fn outgoing(&self) -> Option<&ServiceDescriptor> {
        self.get(ServiceKind::Email).and_then(ResolvedService::outgoing)
    }

    /// Shorthand for the CalDAV descriptor.
    pub fn caldav(&self) -> Option<&ServiceDescriptor> {
        self.get(ServiceKind::CalDav).and_then(ResolvedService::dav)
    }

    /// Shorthand for the CardDAV descriptor.
    pub fn carddav(&self) -> Option<&ServiceDescriptor> {
        self.get(ServiceKind::CardDav).and_then(ResolvedService::dav)
    }
}

/// Resolves account settings for mail addresses.
///
/// The global configuration is read-only after construction, so one resolver
/// can serve concurrent requests by shared reference.
///
/// # Examples
///
/// ```rust
/// use maildiscover::domain::{ConfigStore, ConfigValue};
/// use maildiscover::service::{AccountResolver, DnsResolver};
///
/// # fn main() -> maildiscover::domain::Result<()> {
/// let mut config = ConfigStore::new();
/// config.insert("allow_all_domains", ConfigValue::from("1"));
/// config.insert("incoming_mail_server", ConfigValue::from("imap.example.com"));
/// config.insert("incoming_mail_port", ConfigValue::from("993"));
///
/// let resolver = AccountResolver::new(config, DnsResolver::disabled());
/// let settings = resolver.resolve("jane@example.com", Some("email"))?;
///
/// let incoming = settings.incoming().unwrap();
/// assert_eq!(incoming.hostname(), "imap.example.com");
/// assert!(incoming.ssl());
/// assert_eq!(settings.outgoing().unwrap().hostname(), "example.com");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct AccountResolver {
    config: ConfigStore,
    dns: DnsResolver,
    incoming: IncomingResolver,
    outgoing: OutgoingResolver,
    caldav: DavResolver,
    carddav: DavResolver,
}

impl AccountResolver {
    /// Creates a resolver over a fully loaded configuration.
    pub fn new(config: ConfigStore, dns: DnsResolver) -> Self {
        Self {
            incoming: IncomingResolver::new(dns.clone()),
            outgoing: OutgoingResolver::new(dns.clone()),
            caldav: DavResolver::caldav(dns.clone()),
            carddav: DavResolver::carddav(dns.clone()),
            config,
            dns,
        }
    }

    /// Creates a new builder.
    pub fn builder() -> AccountResolverBuilder {
        AccountResolverBuilder::new()
    }

    /// The global configuration.
    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// The DNS capability shared by all service resolvers.
    pub fn dns(&self) -> &DnsResolver {
        &self.dns
    }

    /// Checks that `domain` may be served.
    ///
    /// Unless `allow_all_domains` is set, the domain needs its own section.
    pub fn check_access(&self, domain: &str) -> Result<()> {
        if self.config.get_bool("allow_all_domains", false)? {
            return Ok(());
        }
        if self.config.section(domain).is_some() {
            return Ok(());
        }
        tracing::info!("domain `{}` has no configuration section, refusing", domain);
        Err(DiscoverError::access(domain))
    }

    /// The service kinds enabled by the `services` setting.
    ///
    /// Unset means every kind. A value naming no known kind is an error.
    pub fn enabled_services(&self) -> Result<BTreeSet<ServiceKind>> {
        match self.config.get_text("services") {
            None => Ok(ServiceKind::ALL.into_iter().collect()),
            Some(raw) => {
                let enabled = ServiceKind::parse_selector(&raw);
                if enabled.is_empty() {
                    return Err(DiscoverError::configuration(format!(
                        "no valid services found in `{}`",
                        raw
                    )));
                }
                Ok(enabled)
            }
        }
    }

    /// Narrows the enabled services with a request `selector`.
    pub fn select_services(&self, selector: Option<&str>) -> Result<BTreeSet<ServiceKind>> {
        let enabled = self.enabled_services()?;
        let Some(selector) = selector.filter(|s| !s.trim().is_empty()) else {
            return Ok(enabled);
        };

        let requested = ServiceKind::parse_selector(selector);
        let selected: BTreeSet<ServiceKind> = enabled.intersection(&requested).copied().collect();
        if selected.is_empty() {
            let enabled = enabled
                .iter()
                .map(ServiceKind::as_str)
                .collect::<Vec<_>>()
                .join(",");
            return Err(DiscoverError::configuration(format!(
                "no valid services found in `{}` (enabled services are {})",
                selector, enabled
            )));
        }
        Ok(selected)
    }

    /// Resolves the settings of `address` for the selected services.
    ///
    /// `selector` is a free-text list such as `"email,caldav"`; `None` selects
    /// every enabled service. Domain access is checked before any DNS query.
    pub fn resolve(&self, address: &str, selector: Option<&str>) -> Result<AccountSettings> {
        let address = MailAddress::parse(address)?;
        self.check_access(address.domain())?;
        let selected = self.select_services(selector)?;
        tracing::debug!(
            "resolving {} for {}",
            selected
                .iter()
                .map(ServiceKind::as_str)
                .collect::<Vec<_>>()
                .join(","),
            address
        );

        let snapshot = self.config.with_domain_overlay(address.domain());
        let mut services = BTreeMap::new();
        for kind in selected {
            let resolved = match kind {
                ServiceKind::Email => ResolvedService::Email {
                    incoming: self.incoming.resolve(&snapshot, &address)?,
                    outgoing: self.outgoing.resolve(&snapshot, &address)?,
                },
                ServiceKind::CalDav => ResolvedService::Dav(self.caldav.resolve(&snapshot, &address)?),
                ServiceKind::CardDav => {
                    ResolvedService::Dav(self.carddav.resolve(&snapshot, &address)?)
                }
            };
            services.insert(kind, resolved);
        }

        Ok(AccountSettings { address, services })
    }
}

/// Builder for constructing an [`AccountResolver`].
///
/// Sources are loaded in ascending priority, so a higher priority source
/// overrides the keys of a lower one.
///
/// # Examples
///
/// ```rust
/// use maildiscover::service::AccountResolver;
///
/// # fn main() -> maildiscover::domain::Result<()> {
/// let resolver = AccountResolver::builder()
///     .with_env_prefix("MAILDISCOVER_DOCTEST_")
///     .without_dns()
///     .build()?;
/// assert!(!resolver.dns().allow_lookups());
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct AccountResolverBuilder {
    config: ConfigStore,
    sources: Vec<Box<dyn ConfigSource>>,
    dns: Option<Arc<dyn DnsLookup>>,
    system_dns: bool,
}

impl AccountResolverBuilder {
    /// Creates a new builder that falls back to the system resolver.
    pub fn new() -> Self {
        Self {
            system_dns: true,
            ..Self::default()
        }
    }

    /// Starts from an already populated configuration.
    pub fn with_config(mut self, config: ConfigStore) -> Self {
        self.config = config;
        self
    }

    /// Adds a configuration source.
    pub fn with_source(mut self, source: Box<dyn ConfigSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Adds a YAML file as a configuration source.
    #[cfg(feature = "yaml")]
    pub fn with_yaml_file(self, path: impl AsRef<std::path::Path>) -> Result<Self> {
        use crate::adapters::YamlFileAdapter;
        let adapter = YamlFileAdapter::from_file(path)?;
        Ok(self.with_source(Box::new(adapter)))
    }

    /// Adds `MAILDISCOVER_*` environment variables as a configuration source.
    #[cfg(feature = "env")]
    pub fn with_env_vars(self) -> Self {
        use crate::adapters::EnvVarAdapter;
        self.with_source(Box::new(EnvVarAdapter::new()))
    }

    /// Adds environment variables with a custom prefix as a configuration source.
    #[cfg(feature = "env")]
    pub fn with_env_prefix(self, prefix: impl Into<String>) -> Self {
        use crate::adapters::EnvVarAdapter;
        self.with_source(Box::new(EnvVarAdapter::with_prefix(prefix)))
    }

    /// Uses `lookup` for every DNS query.
    pub fn with_dns(mut self, lookup: Arc<dyn DnsLookup>) -> Self {
        self.dns = Some(lookup);
        self.system_dns = false;
        self
    }

    /// Never queries DNS, whatever `allow_dns_lookup` says.
    pub fn without_dns(mut self) -> Self {
        self.dns = None;
        self.system_dns = false;
        self
    }

    /// Loads every source and builds the resolver.
    ///
    /// Fails when a source can not be read or a section extends a missing one.
    pub fn build(mut self) -> Result<AccountResolver> {
        let mut config = self.config;
        self.sources.sort_by_key(|source| source.priority());
        for source in &self.sources {
            config.load(source.as_ref(), false)?;
        }

        let lookup = match self.dns {
            Some(lookup) => Some(lookup),
            None if self.system_dns => system_lookup(&config)?,
            None => None,
        };
        let dns = DnsResolver::from_config(lookup, &config)?;
        Ok(AccountResolver::new(config, dns))
    }
}

#[cfg(feature = "dns")]
fn system_lookup(config: &ConfigStore) -> Result<Option<Arc<dyn DnsLookup>>> {
    use crate::adapters::HickoryDnsAdapter;
    if !config.get_bool("allow_dns_lookup", true)? {
        return Ok(None);
    }
    let adapter = HickoryDnsAdapter::from_config(config)?;
    Ok(Some(Arc::new(adapter)))
}

#[cfg(not(feature = "dns"))]
fn system_lookup(_config: &ConfigStore) -> Result<Option<Arc<dyn DnsLookup>>> {
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConfigEntries, ConfigValue, ErrorKind};
    use crate::ports::dns::fake::ScriptedDns;

    struct StaticSource {
        name: &'static str,
        priority: u8,
        entries: ConfigEntries,
    }

    impl ConfigSource for StaticSource {
        fn name(&self) -> &str {
            self.name
        }

        fn priority(&self) -> u8 {
            self.priority
        }

        fn entries(&self) -> Result<ConfigEntries> {
            Ok(self.entries.clone())
        }

        fn reload(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn source(name: &'static str, priority: u8, pairs: &[(&str, &str)]) -> Box<dyn ConfigSource> {
        let entries = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), ConfigValue::from(*v)))
            .collect();
        Box::new(StaticSource {
            name,
            priority,
            entries,
        })
    }

    fn config(pairs: &[(&str, &str)]) -> ConfigStore {
        let mut config = ConfigStore::new();
        for (key, value) in pairs {
            config.insert(*key, ConfigValue::coerce(value));
        }
        config
    }

    fn scripted(config: ConfigStore, dns: ScriptedDns) -> (Arc<ScriptedDns>, AccountResolver) {
        let dns = Arc::new(dns);
        let resolver = AccountResolver::new(config, DnsResolver::new(dns.clone(), true));
        (dns, resolver)
    }

    #[test]
    fn test_unknown_domain_is_refused_before_dns() {
        let (dns, resolver) = scripted(ConfigStore::new(), ScriptedDns::new());

        let err = resolver.resolve("user@unlisted.test", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Access);
        assert!(dns.calls().is_empty());
    }

    #[test]
    fn test_domain_section_grants_access() {
        let mut config = config(&[("allow_dns_lookup", "0")]);
        config.insert("example.com", ConfigValue::Section(ConfigStore::new()));
        let resolver = AccountResolver::new(config, DnsResolver::disabled());

        let settings = resolver.resolve("jane@example.com", Some("email")).unwrap();
        assert_eq!(settings.incoming().unwrap().hostname(), "example.com");
    }

    #[test]
    fn test_services_setting_limits_selection() {
        let resolver = AccountResolver::new(
            config(&[("allow_all_domains", "1"), ("services", "email carddav")]),
            DnsResolver::disabled(),
        );

        let selected = resolver.select_services(None).unwrap();
        assert_eq!(
            selected.into_iter().collect::<Vec<_>>(),
            vec![ServiceKind::Email, ServiceKind::CardDav]
        );

        let err = resolver.select_services(Some("caldav")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_services_setting_without_known_kind() {
        let resolver = AccountResolver::new(
            config(&[("allow_all_domains", "1"), ("services", "webmail")]),
            DnsResolver::disabled(),
        );

        let err = resolver.resolve("jane@example.com", None).unwrap_err();
        assert!(err.to_string().contains("no valid services found in `webmail`"));
    }

    #[test]
    fn test_domain_overlay_applies_to_resolution() {
        let mut section = ConfigStore::new();
        section.insert("incoming_mail_server", ConfigValue::from("imap.example.com"));
        section.insert("caldav_url", ConfigValue::from("https://cal.example.com/dav"));
        let mut config = config(&[
            ("incoming_mail_server", "imap.global.test"),
            ("incoming_mail_socketType", "SSL"),
            ("outgoing_mail_server", "smtp.global.test"),
            ("outgoing_mail_port", "465"),
        ]);
        config.insert("example.com", ConfigValue::Section(section));
        let (dns, resolver) = scripted(config, ScriptedDns::new());

        let settings = resolver.resolve("jane@example.com", Some("email,caldav")).unwrap();
        assert_eq!(settings.incoming().unwrap().hostname(), "imap.example.com");
        assert_eq!(settings.incoming().unwrap().port(), 993);
        assert_eq!(settings.outgoing().unwrap().hostname(), "smtp.global.test");
        assert_eq!(
            settings.caldav().unwrap().url(),
            Some("https://cal.example.com/dav")
        );
        assert!(settings.carddav().is_none());
        assert!(dns.calls().is_empty());
    }

    #[test]
    fn test_invalid_address() {
        let resolver = AccountResolver::new(config(&[("allow_all_domains", "1")]), DnsResolver::disabled());
        let err = resolver.resolve("not-an-address", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_builder_loads_sources_by_priority() {
        let resolver = AccountResolver::builder()
            .with_source(source("high", 2, &[("incoming_mail_server", "imap.high.test")]))
            .with_source(source(
                "low",
                1,
                &[
                    ("incoming_mail_server", "imap.low.test"),
                    ("allow_all_domains", "1"),
                ],
            ))
            .without_dns()
            .build()
            .unwrap();

        assert_eq!(
            resolver.config().get_text("incoming_mail_server").as_deref(),
            Some("imap.high.test")
        );
        let settings = resolver.resolve("jane@example.com", Some("email")).unwrap();
        assert_eq!(settings.incoming().unwrap().hostname(), "imap.high.test");
    }

    #[test]
    fn test_builder_respects_dns_switch() {
        let dns: Arc<dyn DnsLookup> = Arc::new(ScriptedDns::new());
        let resolver = AccountResolver::builder()
            .with_config(config(&[("allow_dns_lookup", "false")]))
            .with_dns(dns)
            .build()
            .unwrap();
        assert!(!resolver.dns().allow_lookups());
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn test_settings_serialize_by_kind() {
        let resolver = AccountResolver::new(
            config(&[("allow_all_domains", "1"), ("carddav_url", "https://dav.example.com/")]),
            DnsResolver::disabled(),
        );
        let settings = resolver.resolve("jane@example.com", Some("carddav")).unwrap();

        let yaml = serde_yaml::to_string(&settings).unwrap();
        assert!(yaml.contains("carddav:"));
        assert!(yaml.contains("hostname: dav.example.com"));
        assert!(yaml.contains("socketType: SSL"));
        assert!(!yaml.contains("email:"));
    }
}
