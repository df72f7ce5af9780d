// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service resolver trait definition.
//!
//! A `ServiceResolver` turns configuration plus whatever discovery it is
//! allowed to do into one [`ServiceDescriptor`]. Implementations live in the
//! service layer.

use crate::domain::{ConfigStore, MailAddress, Result, ServiceDescriptor, ServiceRole};

/// Resolves one service for one mail address.
///
/// `config` is the request-scoped snapshot, already overlaid with the section
/// named after the mail domain. The section itself is still present under its
/// name, so implementations can tell domain values from global ones.
///
/// # Examples
///
/// ```rust
/// use maildiscover::domain::{
///     ConfigStore, Field, MailAddress, Result, ServiceDescriptor, ServiceDescriptorBuilder,
///     ServiceResolver, ServiceRole,
/// };
///
/// struct FixedSmtp;
///
/// impl ServiceResolver for FixedSmtp {
///     fn role(&self) -> ServiceRole {
///         ServiceRole::Outgoing
///     }
///
///     fn resolve(&self, _config: &ConfigStore, address: &MailAddress) -> Result<ServiceDescriptor> {
///         let mut builder = ServiceDescriptorBuilder::new(self.role(), address);
///         builder
///             .set_field(Field::Hostname, "smtp.example.com")?
///             .set_field(Field::SocketType, "SSL")?
///             .set_field(Field::Port, "465")?;
///         builder.build()
///     }
/// }
///
/// let address = MailAddress::parse("user@example.com").unwrap();
/// let descriptor = FixedSmtp.resolve(&ConfigStore::new(), &address).unwrap();
/// assert!(descriptor.ssl());
/// ```
pub trait ServiceResolver: Send + Sync {
    /// The role of the descriptors this resolver produces.
    fn role(&self) -> ServiceRole;

    /// Resolves the descriptor for `address` against `config`.
    fn resolve(&self, config: &ConfigStore, address: &MailAddress) -> Result<ServiceDescriptor>;
}
