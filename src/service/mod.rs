// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service layer containing the resolution engine.
//!
//! [`AccountResolver`] is the entry point. It drives one [`ServiceResolver`]
//! per service role, all sharing a [`DnsResolver`] that enforces the
//! `allow_dns_lookup` switch.
//!
//! [`ServiceResolver`]: crate::domain::ServiceResolver

pub mod account;
pub mod dav;
pub mod dns_resolver;
pub mod incoming;
mod mail;
pub mod outgoing;

// Re-export commonly used types
pub use account::{AccountResolver, AccountResolverBuilder, AccountSettings, ResolvedService};
pub use dav::DavResolver;
pub use dns_resolver::DnsResolver;
pub use incoming::IncomingResolver;
pub use outgoing::OutgoingResolver;
