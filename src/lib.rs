// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mail, CalDAV and CardDAV account settings resolution.
//!
//! Given `user@domain`, this crate decides which servers, ports, transport
//! security modes and authentication schemes a client should use. Explicit
//! administrator configuration always wins; DNS service discovery (SRV, TXT
//! and MX records) fills in whatever configuration leaves open.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain Layer**: Core types and rules (`ConfigStore`, `ServiceDescriptor`,
//!   port tables, errors). No I/O.
//! - **Ports**: Trait definitions for the outside world (`ConfigSource`,
//!   `ConfigParser`, `DnsLookup`)
//! - **Adapters**: YAML files, environment variables and the system DNS resolver
//! - **Service**: The resolvers that apply the precedence rules, and
//!   `AccountResolver` which orchestrates them
//!
//! # Resolution order
//!
//! For mail servers the hostname and the `(port, socketType)` pair are decided
//! independently:
//!
//! - hostname: domain section, global key, SRV target, MX host, the domain itself
//! - port and socketType: both configured (trusted as is), one configured (the
//!   other inferred from the protocol's port table), SRV port, secure default
//!
//! CalDAV and CardDAV use a configured `<kind>_url`, or a `_<kind>s._tcp` /
//! `_<kind>._tcp` SRV record paired with a `path=` TXT record.
//!
//! # Feature Flags
//!
//! - `yaml`: Enable YAML file support (default)
//! - `env`: Enable environment variable support (default)
//! - `dns`: Enable the system DNS resolver (default)
//! - `cli`: Build the `maildiscover` debugging binary
//! - `full`: Enable all features
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use maildiscover::prelude::*;
//!
//! # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let resolver = AccountResolver::builder()
//!     .with_yaml_file("/etc/maildiscover/config.yaml")?
//!     .with_env_vars()
//!     .build()?;
//!
//! let settings = resolver.resolve("jane@example.com", Some("email"))?;
//! if let Some(incoming) = settings.incoming() {
//!     println!("{}:{} ({})", incoming.hostname(), incoming.port(), incoming.socket_type());
//! }
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

/// Commonly used types and traits.
///
/// This module re-exports the most commonly used types and traits for convenient access.
pub mod prelude {
    pub use crate::domain::{
        ConfigStore, ConfigValue, DiscoverError, ErrorKind, MailAddress, Protocol, Result,
        ServiceDescriptor, ServiceKind, ServiceResolver, SocketType,
    };
    pub use crate::ports::{ConfigParser, ConfigSource, DnsLookup};
    pub use crate::service::{AccountResolver, AccountSettings, DnsResolver};

    // Re-export adapters based on feature flags
    #[cfg(feature = "env")]
    pub use crate::adapters::EnvVarAdapter;
    #[cfg(feature = "dns")]
    pub use crate::adapters::HickoryDnsAdapter;
    #[cfg(feature = "yaml")]
    pub use crate::adapters::{YamlFileAdapter, YamlParser};
}
