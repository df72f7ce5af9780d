// SPDX-License-Identifier: MIT OR Apache-2.0

//! Normalized DNS answers.

use once_cell::sync::Lazy;
use regex::Regex;

static TXT_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^path=(.+)$").unwrap());

/// One SRV record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SrvRecord {
    /// Lower values are preferred.
    pub priority: u16,
    /// Relative weight among records of equal priority.
    pub weight: u16,
    /// Service port.
    pub port: u16,
    /// Target host, without a trailing dot.
    pub target: String,
}

impl SrvRecord {
    /// Picks the preferred record: lowest priority, then highest weight, then
    /// the first one seen.
    pub fn select(records: &[SrvRecord]) -> Option<&SrvRecord> {
        records.iter().reduce(|best, candidate| {
            let better = candidate.priority < best.priority
                || (candidate.priority == best.priority && candidate.weight > best.weight);
            if better {
                candidate
            } else {
                best
            }
        })
    }
}

/// One MX record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MxRecord {
    /// Lower values are preferred.
    pub preference: u16,
    /// Mail exchanger host, without a trailing dot.
    pub exchange: String,
}

impl MxRecord {
    /// Picks the record with the lowest preference; ties go to the first seen.
    pub fn select(records: &[MxRecord]) -> Option<&MxRecord> {
        records.iter().min_by_key(|record| record.preference)
    }
}

/// A TXT answer with the `path=` hint extracted when present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxtAnswer {
    /// The text of the first TXT record.
    pub raw: String,
    /// The value after `path=`, if the whole text has that shape.
    pub path: Option<String>,
}

impl TxtAnswer {
    /// Builds an answer from the text of a TXT record.
    ///
    /// # Examples
    ///
    /// ```
    /// use maildiscover::domain::TxtAnswer;
    ///
    /// let answer = TxtAnswer::from_raw("path=/dav/calendars");
    /// assert_eq!(answer.path.as_deref(), Some("/dav/calendars"));
    ///
    /// let answer = TxtAnswer::from_raw("v=spf1 -all");
    /// assert!(answer.path.is_none());
    /// ```
    pub fn from_raw(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let path = TXT_PATH
            .captures(&raw)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());
        TxtAnswer { raw, path }
    }
}
