//! Typed configuration built once at startup.
//!
//! Nothing in here touches the process environment directly: clap reads the
//! environment (see `cli::commands`) and hands the raw values over as
//! [`DbSettings`]. [`resolve`] turns those into a [`ConnectionConfig`] or
//! reports the configuration as absent.

use secrecy::SecretString;
use std::{env::consts, path::PathBuf};

pub const DEFAULT_DB_PORT: u16 = 3306;

/// Raw, unvalidated datastore settings as read from the environment/CLI
#[derive(Debug, Default)]
pub struct DbSettings {
    pub host: Option<String>,
    pub port: Option<String>,
    pub user: Option<String>,
    pub password: Option<SecretString>,
    pub database: Option<String>,
    pub ssl: Option<String>,
    pub ssl_ca: Option<PathBuf>,
}

/// Parameters required to attempt a datastore connection
#[derive(Debug)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: SecretString,
    pub database: String,
    pub use_encrypted_transport: bool,
    /// CA bundle used to verify the server when transport encryption is on
    pub ssl_ca: Option<PathBuf>,
}

/// Resolve the datastore configuration.
///
/// Returns `None` when any of host, user, password or database is missing or
/// empty, or when a port is given that is not a valid TCP port. An empty port
/// means [`DEFAULT_DB_PORT`]. Partial configurations are never accepted.
#[must_use]
pub fn resolve(settings: DbSettings) -> Option<ConnectionConfig> {
    use secrecy::ExposeSecret;

    let host = non_empty(settings.host)?;
    let user = non_empty(settings.user)?;
    let password = settings
        .password
        .filter(|p| !p.expose_secret().is_empty())?;
    let database = non_empty(settings.database)?;
    let port = match non_empty(settings.port) {
        Some(port) => port.parse::<u16>().ok()?,
        None => DEFAULT_DB_PORT,
    };

    Some(ConnectionConfig {
        host,
        port,
        user,
        password,
        database,
        use_encrypted_transport: parse_flag(settings.ssl.as_deref()),
        ssl_ca: settings.ssl_ca,
    })
}

/// A flag is on only for a literal `true`, compared case-insensitively
#[must_use]
pub fn parse_flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Process-wide, read-only service identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceMetadata {
    pub app_version: String,
    pub git_sha: String,
    pub hostname: String,
    pub runtime: String,
    pub feature_new_ui: bool,
}

impl ServiceMetadata {
    #[must_use]
    pub fn new(app_version: String, git_sha: String, feature_new_ui: bool) -> Self {
        Self {
            app_version,
            git_sha,
            hostname: hostname(),
            runtime: runtime_identifier(),
            feature_new_ui,
        }
    }

    #[must_use]
    pub const fn feature_message(&self) -> &'static str {
        if self.feature_new_ui {
            "New UI enabled (feature flag ON)"
        } else {
            "New UI disabled (feature flag OFF)"
        }
    }
}

#[must_use]
pub fn runtime_identifier() -> String {
    format!(
        "{}/{} ({}-{})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        consts::OS,
        consts::ARCH
    )
}

#[cfg(unix)]
fn hostname() -> String {
    nix::unistd::gethostname()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(not(unix))]
fn hostname() -> String {
    "unknown".to_string()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use secrecy::{ExposeSecret, Secret};

    fn full_settings() -> DbSettings {
        DbSettings {
            host: Some("db.internal".to_string()),
            port: None,
            user: Some("x".to_string()),
            password: Some(Secret::new("y".to_string())),
            database: Some("z".to_string()),
            ssl: None,
            ssl_ca: None,
        }
    }

    #[test]
    fn test_resolve_full() {
        let config = resolve(full_settings()).unwrap();
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, DEFAULT_DB_PORT);
        assert_eq!(config.user, "x");
        assert_eq!(config.password.expose_secret(), "y");
        assert_eq!(config.database, "z");
        assert!(!config.use_encrypted_transport);
        assert!(config.ssl_ca.is_none());
    }

    #[test]
    fn test_resolve_custom_port_and_ssl() {
        let settings = DbSettings {
            port: Some("3307".to_string()),
            ssl: Some("TRUE".to_string()),
            ssl_ca: Some(PathBuf::from("/etc/ssl/rds.pem")),
            ..full_settings()
        };
        let config = resolve(settings).unwrap();
        assert_eq!(config.port, 3307);
        assert!(config.use_encrypted_transport);
        assert_eq!(config.ssl_ca, Some(PathBuf::from("/etc/ssl/rds.pem")));
    }

    #[test]
    fn test_resolve_empty_host_is_absent() {
        let settings = DbSettings {
            host: Some(String::new()),
            ..full_settings()
        };
        assert!(resolve(settings).is_none());
    }

    #[test]
    fn test_resolve_any_missing_field_is_absent() {
        let without_host = DbSettings {
            host: None,
            ..full_settings()
        };
        let without_user = DbSettings {
            user: None,
            ..full_settings()
        };
        let without_password = DbSettings {
            password: Some(Secret::new(String::new())),
            ..full_settings()
        };
        let without_database = DbSettings {
            database: None,
            ..full_settings()
        };

        for settings in [without_host, without_user, without_password, without_database] {
            assert!(resolve(settings).is_none());
        }
        assert!(resolve(DbSettings::default()).is_none());
    }

    #[test]
    fn test_resolve_port() {
        let empty_port = DbSettings {
            port: Some(String::new()),
            ..full_settings()
        };
        assert_eq!(resolve(empty_port).unwrap().port, DEFAULT_DB_PORT);

        for bad in ["abc", "70000", "-1", "33 06"] {
            let settings = DbSettings {
                port: Some(bad.to_string()),
                ..full_settings()
            };
            assert!(resolve(settings).is_none(), "port {bad:?} should be rejected");
        }
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag(Some("true")));
        assert!(parse_flag(Some("True")));
        assert!(!parse_flag(Some("yes")));
        assert!(!parse_flag(Some("1")));
        assert!(!parse_flag(Some("")));
        assert!(!parse_flag(None));
    }

    #[test]
    fn test_password_is_redacted_in_debug() {
        let config = resolve(full_settings()).unwrap();
        let debug_str = format!("{config:?}");
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("password: \"y\""));
    }

    #[test]
    fn test_feature_message() {
        let on = ServiceMetadata::new("1.0.0".to_string(), "abc123".to_string(), true);
        let off = ServiceMetadata {
            feature_new_ui: false,
            ..on.clone()
        };
        assert_eq!(on.feature_message(), "New UI enabled (feature flag ON)");
        assert_eq!(off.feature_message(), "New UI disabled (feature flag OFF)");
        assert!(!on.hostname.is_empty());
        assert!(on.runtime.starts_with("svcprobe/"));
    }
}
