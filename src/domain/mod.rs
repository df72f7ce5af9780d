// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain layer containing core types and resolution rules.
//!
//! Nothing in here performs I/O. The configuration tree, protocol port tables,
//! descriptor validation and DNS answer selection are all pure and can be
//! exercised without a network or a file system.

pub mod address;
pub mod config_key;
pub mod config_store;
pub mod config_value;
pub mod descriptor;
pub mod dns;
pub mod errors;
pub mod protocol;
pub mod resolver;
pub mod service_kind;

// Re-export commonly used types
pub use address::{is_valid_hostname, MailAddress};
pub use config_key::ConfigKey;
pub use config_store::{ConfigEntries, ConfigStore};
pub use config_value::ConfigValue;
pub use descriptor::{AuthenticationScheme, Field, ServiceDescriptor, ServiceDescriptorBuilder, ServiceRole};
pub use dns::{MxRecord, SrvRecord, TxtAnswer};
pub use errors::{DiscoverError, ErrorKind, Result};
pub use protocol::{Protocol, SocketType};
pub use resolver::ServiceResolver;
pub use service_kind::ServiceKind;
