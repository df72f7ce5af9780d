// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service kinds a request can select.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

static SERVICE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"(email|caldav|carddav)").unwrap());

/// A group of services resolved together.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    /// Incoming and outgoing mail.
    Email,
    /// Calendars.
    CalDav,
    /// Contacts.
    CardDav,
}

impl ServiceKind {
    /// Every kind, in resolution order.
    pub const ALL: [ServiceKind; 3] = [ServiceKind::Email, ServiceKind::CalDav, ServiceKind::CardDav];

    /// Returns the service id.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Email => "email",
            ServiceKind::CalDav => "caldav",
            ServiceKind::CardDav => "carddav",
        }
    }

    /// Parses an exact service id.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "email" => Some(ServiceKind::Email),
            "caldav" => Some(ServiceKind::CalDav),
            "carddav" => Some(ServiceKind::CardDav),
            _ => None,
        }
    }

    /// Extracts every service id mentioned in free text.
    ///
    /// Any separator works; unknown words are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use maildiscover::domain::ServiceKind;
    ///
    /// let kinds = ServiceKind::parse_selector("email, carddav; fax");
    /// assert_eq!(kinds.into_iter().collect::<Vec<_>>(), vec![ServiceKind::Email, ServiceKind::CardDav]);
    /// ```
    pub fn parse_selector(selector: &str) -> BTreeSet<ServiceKind> {
        let lowered = selector.to_ascii_lowercase();
        SERVICE_ID
            .find_iter(&lowered)
            .filter_map(|m| ServiceKind::from_name(m.as_str()))
            .collect()
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
