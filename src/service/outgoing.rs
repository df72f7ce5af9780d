// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outgoing mail (SMTP) resolution.

use super::dns_resolver::DnsResolver;
use super::mail::{resolve_authentication, resolve_hostname, resolve_transport, MailKeys, SrvDiscovery};
use crate::domain::{
    ConfigStore, MailAddress, Result, ServiceDescriptor, ServiceDescriptorBuilder, ServiceResolver,
    ServiceRole,
};

const KEYS: MailKeys = MailKeys {
    server: "outgoing_mail_server",
    port: "outgoing_mail_port",
    socket_type: "outgoing_mail_socketType",
    authentication: "outgoing_mail_authentication",
};

/// Resolves the outgoing mail server of an account.
///
/// SRV discovery asks for `_submission._tcp` first and `_smtps._tcp` second.
/// Neither lookup retries a secure variant of its own name.
#[derive(Clone, Debug)]
pub struct OutgoingResolver {
    dns: DnsResolver,
}

impl OutgoingResolver {
    /// Creates a resolver using `dns` for discovery.
    pub fn new(dns: DnsResolver) -> Self {
        Self { dns }
    }
}

impl ServiceResolver for OutgoingResolver {
    fn role(&self) -> ServiceRole {
        ServiceRole::Outgoing
    }

    fn resolve(&self, config: &ConfigStore, address: &MailAddress) -> Result<ServiceDescriptor> {
        let mut builder = ServiceDescriptorBuilder::new(self.role(), address);
        let domain = address.domain();
        let srv = SrvDiscovery::new(self.dns.allow_lookups(), || {
            self.dns
                .query_srv("submission", domain, false)
                .or_else(|| self.dns.query_srv("smtps", domain, false))
        });

        resolve_transport(&mut builder, config, &KEYS, &srv)?;
        resolve_hostname(&mut builder, config, address, &KEYS, &srv, || {
            self.dns.query_mx(domain)
        })?;
        resolve_authentication(&mut builder, config, &KEYS, "password-encrypted")?;

        builder.build()
    }
}
