// SPDX-License-Identifier: MIT OR Apache-2.0

//! Incoming mail (IMAP/POP3) resolution.

use super::dns_resolver::DnsResolver;
use super::mail::{
    resolve_authentication, resolve_hostname, resolve_transport, set_from_config, MailKeys,
    SrvDiscovery,
};
use crate::domain::{
    ConfigStore, Field, MailAddress, Result, ServiceDescriptor, ServiceDescriptorBuilder,
    ServiceResolver, ServiceRole,
};

const KEYS: MailKeys = MailKeys {
    server: "incoming_mail_server",
    port: "incoming_mail_port",
    socket_type: "incoming_mail_socketType",
    authentication: "incoming_mail_authentication",
};

const PROTOCOL_KEY: &str = "incoming_mail_type";

/// Resolves the incoming mail server of an account.
///
/// The protocol comes from `incoming_mail_type` (default `imap`). SRV
/// discovery queries the protocol name and then its secure variant, e.g.
/// `_imap._tcp` then `_imaps._tcp`.
#[derive(Clone, Debug)]
pub struct IncomingResolver {
    dns: DnsResolver,
}

impl IncomingResolver {
    /// Creates a resolver using `dns` for discovery.
    pub fn new(dns: DnsResolver) -> Self {
        Self { dns }
    }
}

impl ServiceResolver for IncomingResolver {
    fn role(&self) -> ServiceRole {
        ServiceRole::Incoming
    }

    fn resolve(&self, config: &ConfigStore, address: &MailAddress) -> Result<ServiceDescriptor> {
        let mut builder = ServiceDescriptorBuilder::new(self.role(), address);
        let protocol = config
            .get_text(PROTOCOL_KEY)
            .unwrap_or_else(|| builder.protocol().as_str().to_string());
        set_from_config(&mut builder, Field::Protocol, PROTOCOL_KEY, &protocol)?;

        let service = builder.protocol().as_str();
        let domain = address.domain();
        let srv = SrvDiscovery::new(self.dns.allow_lookups(), || {
            self.dns.query_srv(service, domain, true)
        });

        resolve_transport(&mut builder, config, &KEYS, &srv)?;
        resolve_hostname(&mut builder, config, address, &KEYS, &srv, || {
            self.dns.query_mx(domain)
        })?;
        resolve_authentication(&mut builder, config, &KEYS, "password-encrypted")?;

        builder.build()
    }
}
