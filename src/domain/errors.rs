// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for account settings resolution.
//!
//! Every failure the resolution engine can surface is a variant of
//! [`DiscoverError`]. All of them are terminal for the request that raised them;
//! empty or timed-out DNS answers are never errors on their own and only turn
//! into a [`DiscoverError::DiscoveryError`] once every fallback tier is exhausted.

use thiserror::Error;

/// The main error type for resolution operations.
///
/// Marked `#[non_exhaustive]` so new variants can be added without breaking
/// downstream matches.
///
/// # Examples
///
/// ```
/// use maildiscover::domain::errors::{DiscoverError, ErrorKind};
///
/// let error = DiscoverError::access("unlisted.test");
/// assert_eq!(error.kind(), ErrorKind::Access);
/// assert_eq!(
///     error.to_string(),
///     "Domain `unlisted.test` is not allowed for this service"
/// );
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DiscoverError {
    /// Configuration is malformed or missing.
    #[error("Configuration error: {message}")]
    ConfigurationError {
        /// Human readable description
        message: String,
    },

    /// A field value failed its validity check.
    #[error("Invalid value `{value}` for `{field}` (valid values are {accepted})")]
    ValidationError {
        /// The offending field or configuration key
        field: String,
        /// The rejected value
        value: String,
        /// Description of the accepted value set
        accepted: String,
    },

    /// DNS discovery exhausted every tier and configuration had no override.
    #[error("Failed to autodiscover {service} settings (tried {attempted}), try setting `{hint_key}` manually in config")]
    DiscoveryError {
        /// The service being resolved
        service: String,
        /// The lookups that were attempted
        attempted: String,
        /// The configuration key that would resolve this manually
        hint_key: String,
    },

    /// The requested domain is not allow-listed.
    #[error("Domain `{domain}` is not allowed for this service")]
    AccessError {
        /// The rejected mail domain
        domain: String,
    },

    /// Failed to parse a configuration source.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// The error message
        message: String,
        /// The underlying parsing error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A configuration source could not be read.
    #[error("Configuration source '{source_name}' error: {message}")]
    SourceError {
        /// The name of the source that encountered the error
        source_name: String,
        /// The error message
        message: String,
        /// The underlying error, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An I/O error occurred while reading configuration.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Coarse classification of a [`DiscoverError`].
///
/// Presentation layers map this to status codes instead of matching messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or missing configuration, including unreadable sources.
    Configuration,
    /// A resolved field failed validation.
    Validation,
    /// DNS discovery found nothing usable.
    Discovery,
    /// Domain not allow-listed.
    Access,
}

impl DiscoverError {
    /// Creates a `ConfigurationError`.
    pub fn configuration(message: impl Into<String>) -> Self {
        DiscoverError::ConfigurationError {
            message: message.into(),
        }
    }

    /// Creates a `ValidationError` for `field` rejecting `value`.
    ///
    /// `accepted` is rendered as a `|`-separated list.
    pub fn validation<I>(field: impl Into<String>, value: impl ToString, accepted: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let accepted = accepted
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join("|");
        DiscoverError::ValidationError {
            field: field.into(),
            value: value.to_string(),
            accepted,
        }
    }

    /// Creates a `DiscoveryError`.
    pub fn discovery(
        service: impl Into<String>,
        attempted: &[String],
        hint_key: impl Into<String>,
    ) -> Self {
        let attempted = if attempted.is_empty() {
            "no lookups".to_string()
        } else {
            attempted.join(", ")
        };
        DiscoverError::DiscoveryError {
            service: service.into(),
            attempted,
            hint_key: hint_key.into(),
        }
    }

    /// Creates an `AccessError` for `domain`.
    pub fn access(domain: impl Into<String>) -> Self {
        DiscoverError::AccessError {
            domain: domain.into(),
        }
    }

    /// Renames the field of a `ValidationError`; other variants pass through.
    ///
    /// Resolvers use this to report the configuration key a rejected value
    /// came from instead of the descriptor field it was meant for.
    pub fn for_field(self, field: impl Into<String>) -> Self {
        match self {
            DiscoverError::ValidationError {
                value, accepted, ..
            } => DiscoverError::ValidationError {
                field: field.into(),
                value,
                accepted,
            },
            other => other,
        }
    }

    /// Returns the coarse kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DiscoverError::ValidationError { .. } => ErrorKind::Validation,
            DiscoverError::DiscoveryError { .. } => ErrorKind::Discovery,
            DiscoverError::AccessError { .. } => ErrorKind::Access,
            DiscoverError::ConfigurationError { .. }
            | DiscoverError::ParseError { .. }
            | DiscoverError::SourceError { .. }
            | DiscoverError::IoError(_) => ErrorKind::Configuration,
        }
    }
}

/// A specialized Result type for resolution operations.
pub type Result<T> = std::result::Result<T, DiscoverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error() {
        let error = DiscoverError::configuration("no valid services found in `foo`");
        assert_eq!(
            error.to_string(),
            "Configuration error: no valid services found in `foo`"
        );
        assert_eq!(error.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_validation_error_lists_accepted_values() {
        let error = DiscoverError::validation("socketType", "STLS", &["SSL", "TLS", "STARTTLS", "PLAIN"]);
        assert_eq!(
            error.to_string(),
            "Invalid value `STLS` for `socketType` (valid values are SSL|TLS|STARTTLS|PLAIN)"
        );
        assert_eq!(error.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_discovery_error_names_hint_key() {
        let attempted = vec![
            "SRV _caldavs._tcp.example.com".to_string(),
            "SRV _caldav._tcp.example.com".to_string(),
        ];
        let error = DiscoverError::discovery("caldav", &attempted, "caldav_url");
        let message = error.to_string();
        assert!(message.contains("caldav_url"));
        assert!(message.contains("_caldavs._tcp.example.com"));
        assert_eq!(error.kind(), ErrorKind::Discovery);
    }

    #[test]
    fn test_discovery_error_without_attempts() {
        let error = DiscoverError::discovery("carddav", &[], "carddav_url");
        assert!(error.to_string().contains("no lookups"));
    }

    #[test]
    fn test_access_error() {
        let error = DiscoverError::access("unlisted.test");
        assert_eq!(error.kind(), ErrorKind::Access);
    }

    #[test]
    fn test_for_field_relabels_validation_only() {
        let error = DiscoverError::validation("socketType", "QUIC", ["SSL"]).for_field("outgoing_mail_socketType");
        assert!(error.to_string().contains("`outgoing_mail_socketType`"));

        let error = DiscoverError::access("unlisted.test").for_field("ignored");
        assert_eq!(error.kind(), ErrorKind::Access);
    }

    #[test]
    fn test_source_error() {
        let error = DiscoverError::SourceError {
            source_name: "yaml-file".to_string(),
            message: "Failed to read configuration file: config.yaml".to_string(),
            source: None,
        };
        assert_eq!(
            error.to_string(),
            "Configuration source 'yaml-file' error: Failed to read configuration file: config.yaml"
        );
        assert_eq!(error.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = DiscoverError::from(io_error);
        assert!(matches!(error, DiscoverError::IoError(_)));
        assert_eq!(error.kind(), ErrorKind::Configuration);
    }
}
