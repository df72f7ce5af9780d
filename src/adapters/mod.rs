// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapters layer containing port implementations.
//!
//! Configuration sources implement `ConfigSource`; the DNS adapter implements
//! `DnsLookup`. Each adapter sits behind its own feature flag.

#[cfg(feature = "env")]
pub mod env_var;
#[cfg(feature = "dns")]
pub mod hickory_dns;
#[cfg(feature = "yaml")]
pub mod yaml_file;

// Re-export adapters based on feature flags
#[cfg(feature = "env")]
pub use env_var::EnvVarAdapter;
#[cfg(feature = "dns")]
pub use hickory_dns::HickoryDnsAdapter;
#[cfg(feature = "yaml")]
pub use yaml_file::{YamlFileAdapter, YamlParser};
