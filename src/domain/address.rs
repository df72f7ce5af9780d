// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mail address parsing and hostname syntax checks.

use crate::domain::errors::{DiscoverError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

static HOSTNAME_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?$").unwrap());

/// Returns `true` if `hostname` is a syntactically valid DNS hostname.
///
/// A single trailing root dot is accepted. Labels are 1-63 characters of
/// letters, digits and hyphens, never starting or ending with a hyphen, and the
/// whole name is at most 253 characters.
///
/// # Examples
///
/// ```
/// use maildiscover::domain::is_valid_hostname;
///
/// assert!(is_valid_hostname("imap.example.com"));
/// assert!(is_valid_hostname("mx1.example.com."));
/// assert!(!is_valid_hostname("-bad.example.com"));
/// assert!(!is_valid_hostname("under_score.example.com"));
/// ```
pub fn is_valid_hostname(hostname: &str) -> bool {
    let name = hostname.strip_suffix('.').unwrap_or(hostname);
    if name.is_empty() || name.len() > 253 {
        return false;
    }
    name.split('.').all(|label| HOSTNAME_LABEL.is_match(label))
}

/// Validates `hostname` for `field`, returning it without a trailing dot.
pub fn validate_hostname(field: &str, hostname: &str) -> Result<String> {
    let trimmed = hostname.trim();
    if is_valid_hostname(trimmed) {
        Ok(trimmed.trim_end_matches('.').to_string())
    } else {
        Err(DiscoverError::validation(
            field,
            hostname,
            ["a valid DNS hostname"],
        ))
    }
}

/// A mail address split into its local part and domain.
///
/// The domain is lower-cased; the local part is kept verbatim because mail
/// servers may treat it case-sensitively.
///
/// # Examples
///
/// ```
/// use maildiscover::domain::MailAddress;
///
/// let address = MailAddress::parse("Alice@Example.COM").unwrap();
/// assert_eq!(address.username(), "Alice");
/// assert_eq!(address.domain(), "example.com");
/// assert_eq!(address.as_str(), "Alice@example.com");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct MailAddress {
    address: String,
    username: String,
    domain: String,
}

impl MailAddress {
    /// Parses `local@domain`.
    ///
    /// Fails with a `ValidationError` on `emailaddress` when there is not
    /// exactly one `@`, either side is empty, or the domain is not a hostname.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let invalid = || DiscoverError::validation("emailaddress", raw, ["user@domain"]);

        let (username, domain) = raw.split_once('@').ok_or_else(invalid)?;
        if username.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(invalid());
        }
        let domain = domain.to_ascii_lowercase();
        if !is_valid_hostname(&domain) {
            return Err(invalid());
        }
        let domain = domain.trim_end_matches('.').to_string();

        Ok(MailAddress {
            address: format!("{}@{}", username, domain),
            username: username.to_string(),
            domain,
        })
    }

    /// The full, normalized address.
    pub fn as_str(&self) -> &str {
        &self.address
    }

    /// The part before `@`.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The lower-cased mail domain.
    pub fn domain(&self) -> &str {
        &self.domain
    }
}

impl fmt::Display for MailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}
