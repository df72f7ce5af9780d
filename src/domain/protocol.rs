// SPDX-License-Identifier: MIT OR Apache-2.0

//! Protocols, transport-security modes and their port tables.
//!
//! Each mail protocol owns a static table of `(socket type, port)` pairs in
//! declaration order. The forward lookup maps a socket type to its port; the
//! reverse lookup returns the first socket type declared for a port, so port
//! 993 maps to `SSL` rather than `TLS`.

use crate::domain::errors::{DiscoverError, Result};
use serde::Serialize;
use std::fmt;

/// Transport-security mode of a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum SocketType {
    /// Implicit TLS.
    #[serde(rename = "SSL")]
    Ssl,
    /// Implicit TLS, alternative spelling of `SSL`.
    #[serde(rename = "TLS")]
    Tls,
    /// In-band upgrade for IMAP and SMTP.
    #[serde(rename = "STARTTLS")]
    StartTls,
    /// In-band upgrade for POP3.
    #[serde(rename = "STLS")]
    Stls,
    /// No transport security.
    #[serde(rename = "PLAIN")]
    Plain,
}

impl SocketType {
    /// Returns the canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SocketType::Ssl => "SSL",
            SocketType::Tls => "TLS",
            SocketType::StartTls => "STARTTLS",
            SocketType::Stls => "STLS",
            SocketType::Plain => "PLAIN",
        }
    }

    /// Parses a socket type name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "SSL" => Some(SocketType::Ssl),
            "TLS" => Some(SocketType::Tls),
            "STARTTLS" => Some(SocketType::StartTls),
            "STLS" => Some(SocketType::Stls),
            "PLAIN" => Some(SocketType::Plain),
            _ => None,
        }
    }
}

impl fmt::Display for SocketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A protocol a descriptor can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// IMAP, incoming.
    Imap,
    /// POP3, incoming.
    Pop3,
    /// SMTP submission, outgoing.
    Smtp,
    /// CalDAV.
    CalDav,
    /// CardDAV.
    CardDav,
}

const IMAP_PORTS: &[(SocketType, u16)] = &[
    (SocketType::Ssl, 993),
    (SocketType::Tls, 993),
    (SocketType::StartTls, 143),
    (SocketType::Plain, 143),
];

const POP3_PORTS: &[(SocketType, u16)] = &[
    (SocketType::Stls, 110),
    (SocketType::Plain, 110),
    (SocketType::Ssl, 995),
    (SocketType::Tls, 995),
];

const SMTP_PORTS: &[(SocketType, u16)] = &[
    (SocketType::Ssl, 465),
    (SocketType::Tls, 465),
    (SocketType::StartTls, 587),
    (SocketType::Plain, 25),
];

const DAV_PORTS: &[(SocketType, u16)] = &[(SocketType::Ssl, 443), (SocketType::Plain, 80)];

impl Protocol {
    /// Returns the lower-case protocol name, which is also its SRV service label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Imap => "imap",
            Protocol::Pop3 => "pop3",
            Protocol::Smtp => "smtp",
            Protocol::CalDav => "caldav",
            Protocol::CardDav => "carddav",
        }
    }

    /// Parses a protocol name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "imap" => Some(Protocol::Imap),
            "pop3" => Some(Protocol::Pop3),
            "smtp" => Some(Protocol::Smtp),
            "caldav" => Some(Protocol::CalDav),
            "carddav" => Some(Protocol::CardDav),
            _ => None,
        }
    }

    /// The `(socket type, port)` table in declaration order.
    pub fn port_table(&self) -> &'static [(SocketType, u16)] {
        match self {
            Protocol::Imap => IMAP_PORTS,
            Protocol::Pop3 => POP3_PORTS,
            Protocol::Smtp => SMTP_PORTS,
            Protocol::CalDav | Protocol::CardDav => DAV_PORTS,
        }
    }

    /// The socket types this protocol accepts, in table order.
    pub fn socket_types(&self) -> Vec<SocketType> {
        self.port_table().iter().map(|(s, _)| *s).collect()
    }

    /// Returns `true` if `socket_type` belongs to this protocol's set.
    pub fn accepts(&self, socket_type: SocketType) -> bool {
        self.port_table().iter().any(|(s, _)| *s == socket_type)
    }

    /// Forward lookup: the port for `socket_type`.
    pub fn port_for(&self, socket_type: SocketType) -> Option<u16> {
        self.port_table()
            .iter()
            .find(|(s, _)| *s == socket_type)
            .map(|(_, port)| *port)
    }

    /// Reverse lookup: the first socket type declared for `port`.
    pub fn socket_type_for(&self, port: u16) -> Option<SocketType> {
        self.port_table()
            .iter()
            .find(|(_, p)| *p == port)
            .map(|(s, _)| *s)
    }

    /// The designated secure default used when nothing else is known.
    pub fn default_socket_type(&self) -> SocketType {
        match self {
            Protocol::Imap | Protocol::Smtp => SocketType::StartTls,
            Protocol::Pop3 => SocketType::Stls,
            Protocol::CalDav | Protocol::CardDav => SocketType::Ssl,
        }
    }

    /// Forward lookup that fails with a `ValidationError` on a foreign pair.
    pub fn require_port_for(&self, field: &str, socket_type: SocketType) -> Result<u16> {
        self.port_for(socket_type).ok_or_else(|| {
            let accepted: Vec<&str> = self.socket_types().iter().map(SocketType::as_str).collect();
            DiscoverError::validation(field, socket_type, &accepted)
        })
    }

    /// Reverse lookup that fails with a `ValidationError` on a foreign port.
    pub fn require_socket_type_for(&self, field: &str, port: u16) -> Result<SocketType> {
        self.socket_type_for(port).ok_or_else(|| {
            let mut accepted: Vec<String> = Vec::new();
            for (_, p) in self.port_table() {
                let p = p.to_string();
                if !accepted.contains(&p) {
                    accepted.push(p);
                }
            }
            DiscoverError::validation(field, port, &accepted)
        })
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
