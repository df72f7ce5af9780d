// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for configuration source and section precedence.

mod common;

use common::{create_temp_yaml, init_tracing, MockConfigSource};
use maildiscover::prelude::*;
use std::env;

/// Helper to set and clean up environment variables
struct EnvGuard {
    keys: Vec<String>,
}

impl EnvGuard {
    fn new() -> Self {
        EnvGuard { keys: Vec::new() }
    }

    fn set(&mut self, key: &str, value: &str) {
        env::set_var(key, value);
        self.keys.push(key.to_string());
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for key in &self.keys {
            env::remove_var(key);
        }
    }
}

#[test]
#[cfg(all(feature = "env", feature = "yaml"))]
fn test_precedence_env_over_yaml() {
    let mut env_guard = EnvGuard::new();
    let yaml_file = create_temp_yaml(
        "allow_all_domains: true\nincoming_mail_server: imap.yaml.test\nincoming_mail_port: 143\n",
    );

    env_guard.set("PRECEDENCE_ENV_INCOMING_MAIL_SERVER", "imap.env.test");
    env_guard.set("PRECEDENCE_ENV_INCOMING_MAIL_SOCKETTYPE", "SSL");
    env_guard.set("PRECEDENCE_ENV_INCOMING_MAIL_PORT", "993");

    let resolver = AccountResolver::builder()
        .with_yaml_file(yaml_file.path())
        .unwrap()
        .with_env_prefix("PRECEDENCE_ENV_")
        .without_dns()
        .build()
        .unwrap();

    // Environment variables win (priority 2 > 1)
    let settings = resolver.resolve("jane@example.com", Some("email")).unwrap();
    let incoming = settings.incoming().unwrap();
    assert_eq!(incoming.hostname(), "imap.env.test");
    assert_eq!(incoming.socket_type(), SocketType::Ssl);
    assert_eq!(incoming.port(), 993);
}

#[test]
#[cfg(all(feature = "env", feature = "yaml"))]
fn test_env_disables_dns_lookups() {
    let mut env_guard = EnvGuard::new();
    let yaml_file = create_temp_yaml("allow_dns_lookup: true\n");

    env_guard.set("PRECEDENCE_DNS_ALLOW_DNS_LOOKUP", "0");

    let resolver = AccountResolver::builder()
        .with_yaml_file(yaml_file.path())
        .unwrap()
        .with_env_prefix("PRECEDENCE_DNS_")
        .without_dns()
        .build()
        .unwrap();

    assert!(!resolver.config().get_bool("allow_dns_lookup", true).unwrap());
}

#[test]
fn test_source_order_does_not_matter() {
    init_tracing();
    let low = MockConfigSource::new("low", 1).with_value("outgoing_mail_server", "smtp.low.test");
    let high = MockConfigSource::new("high", 3).with_value("outgoing_mail_server", "smtp.high.test");

    for sources in [
        vec![low.clone(), high.clone()],
        vec![high.clone(), low.clone()],
    ] {
        let mut builder = AccountResolver::builder().without_dns();
        for source in sources {
            builder = builder.with_source(Box::new(source));
        }
        let resolver = builder.build().unwrap();
        assert_eq!(
            resolver.config().get_text("outgoing_mail_server").as_deref(),
            Some("smtp.high.test")
        );
    }
}

#[test]
fn test_sources_overlay_initial_config() {
    let mut config = ConfigStore::new();
    config.insert("allow_all_domains", ConfigValue::from("0"));
    config.insert("outgoing_mail_server", ConfigValue::from("smtp.base.test"));

    let resolver = AccountResolver::builder()
        .with_config(config)
        .with_source(Box::new(
            MockConfigSource::new("override", 1).with_value("allow_all_domains", "1"),
        ))
        .without_dns()
        .build()
        .unwrap();

    let settings = resolver.resolve("jane@example.com", Some("email")).unwrap();
    assert_eq!(settings.outgoing().unwrap().hostname(), "smtp.base.test");
}

#[test]
#[cfg(feature = "yaml")]
fn test_domain_section_over_global() {
    let yaml_file = create_temp_yaml(
        r#"
incoming_mail_server: imap.global.test
incoming_mail_socketType: SSL
example.com:
  incoming_mail_server: imap.example.com
other.test: {}
"#,
    );

    let resolver = AccountResolver::builder()
        .with_yaml_file(yaml_file.path())
        .unwrap()
        .without_dns()
        .build()
        .unwrap();

    let settings = resolver.resolve("jane@example.com", Some("email")).unwrap();
    assert_eq!(settings.incoming().unwrap().hostname(), "imap.example.com");

    let settings = resolver.resolve("joe@other.test", Some("email")).unwrap();
    assert_eq!(settings.incoming().unwrap().hostname(), "imap.global.test");
    assert_eq!(settings.incoming().unwrap().port(), 993);
}

#[test]
#[cfg(feature = "yaml")]
fn test_domain_section_overrides_protocol() {
    let yaml_file = create_temp_yaml(
        r#"
example.com:
  incoming_mail_type: pop3
  incoming_mail_server: pop.example.com
  incoming_mail_port: 995
"#,
    );

    let resolver = AccountResolver::builder()
        .with_yaml_file(yaml_file.path())
        .unwrap()
        .without_dns()
        .build()
        .unwrap();

    let settings = resolver.resolve("jane@example.com", Some("email")).unwrap();
    let incoming = settings.incoming().unwrap();
    assert_eq!(incoming.protocol(), Protocol::Pop3);
    assert_eq!(incoming.socket_type(), SocketType::Ssl);
    assert!(incoming.ssl());
}

#[test]
fn test_resolution_leaves_global_config_untouched() {
    let mut section = ConfigStore::new();
    section.insert("incoming_mail_server", ConfigValue::from("imap.example.com"));
    let mut config = ConfigStore::new();
    config.insert("example.com", ConfigValue::Section(section));
    let before = config.clone();

    let resolver = AccountResolver::new(config, DnsResolver::disabled());
    resolver.resolve("jane@example.com", Some("email")).unwrap();

    assert_eq!(resolver.config(), &before);
    assert!(resolver.config().get("incoming_mail_server").is_none());
}
