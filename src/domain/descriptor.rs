// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolved service descriptors and their validating builder.
//!
//! Every field of a [`ServiceDescriptor`] enters through
//! [`ServiceDescriptorBuilder::set_field`], which dispatches on the [`Field`]
//! enum to the validator (and, for URLs, the derivation) of that field. A value
//! is checked at the moment it is accepted, never later.

use crate::domain::address::{validate_hostname, MailAddress};
use crate::domain::errors::{DiscoverError, Result};
use crate::domain::protocol::{Protocol, SocketType};
use serde::Serialize;
use std::fmt;
use url::Url;

/// A settable descriptor field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    /// The wire protocol.
    Protocol,
    /// The server hostname.
    Hostname,
    /// The TCP port.
    Port,
    /// The transport-security mode.
    SocketType,
    /// The authentication scheme.
    Authentication,
    /// A full service URL, decomposed into scheme, host, port and path.
    Url,
}

impl Field {
    /// Returns the field name used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Protocol => "protocol",
            Field::Hostname => "hostname",
            Field::Port => "port",
            Field::SocketType => "socketType",
            Field::Authentication => "authentication",
            Field::Url => "url",
        }
    }

    /// Parses a field name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "protocol" | "type" => Some(Field::Protocol),
            "hostname" | "server" => Some(Field::Hostname),
            "port" => Some(Field::Port),
            "sockettype" => Some(Field::SocketType),
            "authentication" => Some(Field::Authentication),
            "url" => Some(Field::Url),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a client authenticates against a server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum AuthenticationScheme {
    /// Password sent in the clear (over the secured channel).
    #[serde(rename = "password-cleartext")]
    PasswordCleartext,
    /// Challenge-response password authentication.
    #[serde(rename = "password-encrypted")]
    PasswordEncrypted,
    /// NTLM.
    #[serde(rename = "NTLM")]
    Ntlm,
    /// Kerberos via GSSAPI.
    #[serde(rename = "GSSAPI")]
    Gssapi,
    /// Access granted by client IP address.
    #[serde(rename = "client-IP-address")]
    ClientIpAddress,
    /// TLS client certificate.
    #[serde(rename = "TLS-client-cert")]
    TlsClientCert,
    /// OAuth2 bearer tokens.
    #[serde(rename = "OAuth2")]
    OAuth2,
    /// No authentication.
    #[serde(rename = "none")]
    None,
}

impl AuthenticationScheme {
    /// All schemes, in presentation order.
    pub const ALL: [AuthenticationScheme; 8] = [
        AuthenticationScheme::PasswordCleartext,
        AuthenticationScheme::PasswordEncrypted,
        AuthenticationScheme::Ntlm,
        AuthenticationScheme::Gssapi,
        AuthenticationScheme::ClientIpAddress,
        AuthenticationScheme::TlsClientCert,
        AuthenticationScheme::OAuth2,
        AuthenticationScheme::None,
    ];

    /// Returns the canonical scheme name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthenticationScheme::PasswordCleartext => "password-cleartext",
            AuthenticationScheme::PasswordEncrypted => "password-encrypted",
            AuthenticationScheme::Ntlm => "NTLM",
            AuthenticationScheme::Gssapi => "GSSAPI",
            AuthenticationScheme::ClientIpAddress => "client-IP-address",
            AuthenticationScheme::TlsClientCert => "TLS-client-cert",
            AuthenticationScheme::OAuth2 => "OAuth2",
            AuthenticationScheme::None => "none",
        }
    }

    /// Parses a scheme name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|scheme| scheme.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for AuthenticationScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The role a descriptor plays, which fixes its admissible protocols.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ServiceRole {
    /// Incoming mail (IMAP or POP3).
    Incoming,
    /// Outgoing mail (SMTP).
    Outgoing,
    /// Calendar access.
    CalDav,
    /// Contacts access.
    CardDav,
}

impl ServiceRole {
    /// The protocols admissible for this role, default first.
    pub fn protocols(&self) -> &'static [Protocol] {
        match self {
            ServiceRole::Incoming => &[Protocol::Imap, Protocol::Pop3],
            ServiceRole::Outgoing => &[Protocol::Smtp],
            ServiceRole::CalDav => &[Protocol::CalDav],
            ServiceRole::CardDav => &[Protocol::CardDav],
        }
    }

    /// The protocol assumed until one is set explicitly.
    pub fn default_protocol(&self) -> Protocol {
        self.protocols()[0]
    }

    /// Returns the role name, also the prefix of its configuration keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceRole::Incoming => "incoming",
            ServiceRole::Outgoing => "outgoing",
            ServiceRole::CalDav => "caldav",
            ServiceRole::CardDav => "carddav",
        }
    }

    fn is_dav(&self) -> bool {
        matches!(self, ServiceRole::CalDav | ServiceRole::CardDav)
    }
}

/// A fully resolved service endpoint, ready for rendering.
///
/// # Examples
///
/// ```
/// use maildiscover::domain::{Field, MailAddress, ServiceDescriptorBuilder, ServiceRole};
///
/// # fn main() -> maildiscover::domain::Result<()> {
/// let address = MailAddress::parse("user@example.com")?;
/// let mut builder = ServiceDescriptorBuilder::new(ServiceRole::Incoming, &address);
/// builder
///     .set_field(Field::Protocol, "imap")?
///     .set_field(Field::Hostname, "imap.example.com")?
///     .set_field(Field::SocketType, "SSL")?
///     .set_field(Field::Port, "993")?;
/// let descriptor = builder.build()?;
///
/// assert_eq!(descriptor.port(), 993);
/// assert_eq!(descriptor.ssl_on_off(), "on");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDescriptor {
    protocol: Protocol,
    hostname: String,
    port: u16,
    socket_type: SocketType,
    #[serde(skip_serializing_if = "Option::is_none")]
    authentication: Option<AuthenticationScheme>,
    email_address: String,
    username: String,
    domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scheme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
}

impl ServiceDescriptor {
    /// The wire protocol.
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// The server hostname.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// The TCP port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The transport-security mode.
    pub fn socket_type(&self) -> SocketType {
        self.socket_type
    }

    /// The authentication scheme, if one was configured.
    pub fn authentication(&self) -> Option<AuthenticationScheme> {
        self.authentication
    }

    /// The mail address the descriptor was resolved for.
    pub fn email_address(&self) -> &str {
        &self.email_address
    }

    /// The local part of the address.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The mail domain.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// The service URL (DAV only).
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// The URL scheme (DAV only).
    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    /// The URL path (DAV only).
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Whether the connection is encrypted from the first byte.
    ///
    /// STARTTLS upgrades in-band and is not counted; POP3's STLS is. DAV
    /// descriptors are secure unless their scheme is `http`.
    pub fn ssl(&self) -> bool {
        match self.protocol {
            Protocol::Imap | Protocol::Pop3 => matches!(
                self.socket_type,
                SocketType::Ssl | SocketType::Tls | SocketType::Stls
            ),
            Protocol::Smtp => matches!(self.socket_type, SocketType::Ssl | SocketType::Tls),
            Protocol::CalDav | Protocol::CardDav => self.scheme.as_deref() != Some("http"),
        }
    }

    /// [`ssl`](Self::ssl) rendered as `"on"` or `"off"`.
    pub fn ssl_on_off(&self) -> &'static str {
        if self.ssl() {
            "on"
        } else {
            "off"
        }
    }
}

/// Accumulates validated fields for a [`ServiceDescriptor`].
#[derive(Clone, Debug)]
pub struct ServiceDescriptorBuilder {
    role: ServiceRole,
    address: MailAddress,
    protocol: Option<Protocol>,
    hostname: Option<String>,
    port: Option<u16>,
    socket_type: Option<SocketType>,
    authentication: Option<AuthenticationScheme>,
    url: Option<String>,
    scheme: Option<String>,
    path: Option<String>,
}

impl ServiceDescriptorBuilder {
    /// Starts a descriptor for `role` on behalf of `address`.
    pub fn new(role: ServiceRole, address: &MailAddress) -> Self {
        let protocol = if role.protocols().len() == 1 {
            Some(role.default_protocol())
        } else {
            None
        };
        ServiceDescriptorBuilder {
            role,
            address: address.clone(),
            protocol,
            hostname: None,
            port: None,
            socket_type: None,
            authentication: None,
            url: None,
            scheme: None,
            path: None,
        }
    }

    /// The protocol set so far, or the role's default.
    pub fn protocol(&self) -> Protocol {
        self.protocol.unwrap_or_else(|| self.role.default_protocol())
    }

    /// Validates `value` for `field` and stores it.
    ///
    /// Fails with a `ValidationError` naming the field and the accepted values.
    pub fn set_field(&mut self, field: Field, value: &str) -> Result<&mut Self> {
        match field {
            Field::Protocol => self.set_protocol(value)?,
            Field::Hostname => self.hostname = Some(validate_hostname(field.as_str(), value)?),
            Field::Port => self.port = Some(parse_port(field, value)?),
            Field::SocketType => self.set_socket_type(value)?,
            Field::Authentication => {
                let scheme = AuthenticationScheme::from_name(value).ok_or_else(|| {
                    DiscoverError::validation(
                        field.as_str(),
                        value,
                        AuthenticationScheme::ALL.iter().map(AuthenticationScheme::as_str),
                    )
                })?;
                self.authentication = Some(scheme);
            }
            Field::Url => self.set_url(value)?,
        }
        tracing::trace!("{} descriptor: {} = {}", self.role.as_str(), field, value);
        Ok(self)
    }

    fn set_protocol(&mut self, value: &str) -> Result<()> {
        let accepted = self.role.protocols();
        let protocol = Protocol::from_name(value)
            .filter(|p| accepted.contains(p))
            .ok_or_else(|| {
                DiscoverError::validation(
                    Field::Protocol.as_str(),
                    value,
                    accepted.iter().map(Protocol::as_str),
                )
            })?;
        self.protocol = Some(protocol);
        Ok(())
    }

    fn set_socket_type(&mut self, value: &str) -> Result<()> {
        let protocol = self.protocol();
        let socket_type = SocketType::from_name(value)
            .filter(|s| protocol.accepts(*s))
            .ok_or_else(|| {
                DiscoverError::validation(
                    Field::SocketType.as_str(),
                    value,
                    protocol.socket_types().iter().map(SocketType::as_str),
                )
            })?;
        self.socket_type = Some(socket_type);
        Ok(())
    }

    fn set_url(&mut self, value: &str) -> Result<()> {
        let field = Field::Url.as_str();
        let invalid = || DiscoverError::validation(field, value, ["http://host/path", "https://host/path"]);

        if !self.role.is_dav() {
            return Err(DiscoverError::configuration(format!(
                "`{}` can not be set on a {} descriptor",
                field,
                self.role.as_str()
            )));
        }

        let url = Url::parse(value.trim()).map_err(|_| invalid())?;
        // The port follows the scheme; an explicit port stays in the URL only.
        let (socket_type, port) = match url.scheme() {
            "https" => (SocketType::Ssl, 443),
            "http" => (SocketType::Plain, 80),
            _ => return Err(invalid()),
        };
        let host = url.host_str().ok_or_else(invalid)?;
        let hostname = validate_hostname(Field::Hostname.as_str(), host)?;

        self.hostname = Some(hostname);
        self.port = Some(port);
        self.socket_type = Some(socket_type);
        self.scheme = Some(url.scheme().to_string());
        self.path = Some(url.path().to_string());
        self.url = Some(value.trim().to_string());
        Ok(())
    }

    /// Finishes the descriptor.
    ///
    /// Fails with a `ConfigurationError` when a mandatory field was never set.
    pub fn build(self) -> Result<ServiceDescriptor> {
        let missing = |field: Field| {
            DiscoverError::configuration(format!(
                "{} descriptor is missing `{}`",
                self.role.as_str(),
                field
            ))
        };
        let protocol = self.protocol();
        let hostname = self.hostname.clone().ok_or_else(|| missing(Field::Hostname))?;
        let port = self.port.ok_or_else(|| missing(Field::Port))?;
        let socket_type = self.socket_type.ok_or_else(|| missing(Field::SocketType))?;
        if self.role.is_dav() && self.url.is_none() {
            return Err(missing(Field::Url));
        }

        Ok(ServiceDescriptor {
            protocol,
            hostname,
            port,
            socket_type,
            authentication: self.authentication,
            email_address: self.address.as_str().to_string(),
            username: self.address.username().to_string(),
            domain: self.address.domain().to_string(),
            url: self.url,
            scheme: self.scheme,
            path: self.path,
        })
    }
}

fn parse_port(field: Field, value: &str) -> Result<u16> {
    value
        .trim()
        .parse::<u16>()
        .ok()
        .filter(|port| *port > 0)
        .ok_or_else(|| DiscoverError::validation(field.as_str(), value, ["1-65535"]))
}
