// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ports layer containing trait definitions.
//!
//! This module contains the trait definitions (ports) that define the interfaces
//! between the resolution engine and its environment: where configuration comes
//! from and how DNS is queried. These traits are implemented by adapters in the
//! adapters layer, or by fakes in tests.

pub mod dns;
pub mod parser;
pub mod source;

// Re-export commonly used types
pub use dns::DnsLookup;
pub use parser::ConfigParser;
pub use source::ConfigSource;
