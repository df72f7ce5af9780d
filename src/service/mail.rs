// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolution steps shared by the incoming and outgoing mail resolvers.
//!
//! Both resolvers decide the hostname and the `(port, socketType)` pair
//! independently, each through its own precedence chain. SRV discovery is
//! issued at most once per descriptor and its answer feeds both chains.

use crate::domain::{
    ConfigStore, DiscoverError, Field, MailAddress, Protocol, Result, ServiceDescriptorBuilder,
    SocketType, SrvRecord,
};
use once_cell::unsync::OnceCell;

/// Memoized SRV discovery for one descriptor.
///
/// A disabled discovery never runs `discover` and always answers `None`.
pub(crate) struct SrvDiscovery<F: Fn() -> Option<SrvRecord>> {
    enabled: bool,
    discover: F,
    answer: OnceCell<Option<SrvRecord>>,
}

impl<F: Fn() -> Option<SrvRecord>> SrvDiscovery<F> {
    pub(crate) fn new(enabled: bool, discover: F) -> Self {
        Self {
            enabled,
            discover,
            answer: OnceCell::new(),
        }
    }

    pub(crate) fn enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn get(&self) -> Option<&SrvRecord> {
        if !self.enabled {
            return None;
        }
        self.answer.get_or_init(|| (self.discover)()).as_ref()
    }
}

/// The configuration keys of one mail direction, e.g. `incoming_mail_*`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct MailKeys {
    pub(crate) server: &'static str,
    pub(crate) port: &'static str,
    pub(crate) socket_type: &'static str,
    pub(crate) authentication: &'static str,
}

/// Sets `field` from a configuration value, reporting errors against `key`.
pub(crate) fn set_from_config(
    builder: &mut ServiceDescriptorBuilder,
    field: Field,
    key: &str,
    value: &str,
) -> Result<()> {
    builder
        .set_field(field, value)
        .map(|_| ())
        .map_err(|e| e.for_field(key))
}

fn parse_socket_type(protocol: Protocol, key: &str, raw: &str) -> Result<SocketType> {
    SocketType::from_name(raw)
        .filter(|s| protocol.accepts(*s))
        .ok_or_else(|| {
            DiscoverError::validation(
                key,
                raw,
                protocol.socket_types().iter().map(SocketType::as_str),
            )
        })
}

/// Decides `(port, socketType)` and stores both on `builder`.
///
/// 1. socketType and port both configured: taken verbatim, no cross-check.
/// 2. socketType only: port from the forward table.
/// 3. port only: socketType from the reverse table.
/// 4. neither: the SRV port with the reverse table, else the secure default.
pub(crate) fn resolve_transport<F>(
    builder: &mut ServiceDescriptorBuilder,
    config: &ConfigStore,
    keys: &MailKeys,
    srv: &SrvDiscovery<F>,
) -> Result<()>
where
    F: Fn() -> Option<SrvRecord>,
{
    let protocol = builder.protocol();
    let socket_type = config.get_text(keys.socket_type);
    let port = config.get_text(keys.port).and(config.get(keys.port));

    let (port, socket_type) = match (port, socket_type) {
        (Some(port), Some(socket_type)) => {
            tracing::debug!(
                "using configured {} `{}` and {} `{}` as is",
                keys.socket_type,
                socket_type,
                keys.port,
                port
            );
            let socket_type = parse_socket_type(protocol, keys.socket_type, &socket_type)?;
            (port.as_u16(keys.port)?, socket_type)
        }
        (None, Some(socket_type)) => {
            let socket_type = parse_socket_type(protocol, keys.socket_type, &socket_type)?;
            let port = protocol.require_port_for(keys.socket_type, socket_type)?;
            tracing::debug!("guessed port `{}` for socketType `{}`", port, socket_type);
            (port, socket_type)
        }
        (Some(port), None) => {
            let port = port.as_u16(keys.port)?;
            let socket_type = protocol.require_socket_type_for(keys.port, port)?;
            tracing::debug!("guessed socketType `{}` for port {}", socket_type, port);
            (port, socket_type)
        }
        (None, None) => {
            tracing::debug!(
                "no socketType and port defined for {}, using DNS to guess settings",
                protocol
            );
            match srv.get() {
                Some(record) => {
                    let socket_type = protocol.require_socket_type_for(keys.port, record.port)?;
                    tracing::debug!(
                        "guessed socketType `{}` from DNS defined port {}",
                        socket_type,
                        record.port
                    );
                    (record.port, socket_type)
                }
                None => {
                    let socket_type = protocol.default_socket_type();
                    let port = protocol.require_port_for(keys.socket_type, socket_type)?;
                    tracing::debug!(
                        "no DNS found, using default socketType and port ({}:{})",
                        socket_type,
                        port
                    );
                    (port, socket_type)
                }
            }
        }
    };

    builder.set_field(Field::SocketType, socket_type.as_str())?;
    builder.set_field(Field::Port, &port.to_string())?;
    Ok(())
}

/// Decides the hostname and stores it on `builder`.
///
/// Domain section, then global configuration, then the SRV target, then MX,
/// then the bare mail domain.
pub(crate) fn resolve_hostname<F, M>(
    builder: &mut ServiceDescriptorBuilder,
    config: &ConfigStore,
    address: &MailAddress,
    keys: &MailKeys,
    srv: &SrvDiscovery<F>,
    mx: M,
) -> Result<()>
where
    F: Fn() -> Option<SrvRecord>,
    M: FnOnce() -> Option<String>,
{
    let domain = address.domain();

    if let Some(host) = config.section(domain).and_then(|s| s.get_text(keys.server)) {
        tracing::debug!(
            "changing `{}` to `{}` from specific domain config [{}]",
            keys.server,
            host,
            domain
        );
        return set_from_config(builder, Field::Hostname, keys.server, &host);
    }

    if let Some(host) = config.get_text(keys.server) {
        tracing::debug!("changing `{}` to `{}` from general config", keys.server, host);
        return set_from_config(builder, Field::Hostname, keys.server, &host);
    }

    if !srv.enabled() {
        tracing::info!(
            "no {} and allow_dns_lookup=false, sticking to {}",
            keys.server,
            domain
        );
        return set_from_config(builder, Field::Hostname, keys.server, domain);
    }

    if let Some(record) = srv.get() {
        tracing::debug!("using SRV target `{}` as {}", record.target, keys.server);
        return set_from_config(builder, Field::Hostname, keys.server, &record.target);
    }

    if let Some(host) = mx() {
        tracing::debug!("using MX host `{}` as {}", host, keys.server);
        return set_from_config(builder, Field::Hostname, keys.server, &host);
    }

    tracing::info!(
        "no DNS records found for {}, guessing `{}` as {} (unverified)",
        domain,
        domain,
        keys.server
    );
    set_from_config(builder, Field::Hostname, keys.server, domain)
}

/// Stores the configured authentication scheme, or `default`.
pub(crate) fn resolve_authentication(
    builder: &mut ServiceDescriptorBuilder,
    config: &ConfigStore,
    keys: &MailKeys,
    default: &str,
) -> Result<()> {
    let scheme = config
        .get_text(keys.authentication)
        .unwrap_or_else(|| default.to_string());
    set_from_config(builder, Field::Authentication, keys.authentication, &scheme)
}
