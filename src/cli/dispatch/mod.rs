use crate::{
    cli::actions::Action,
    config::{self, DbSettings, ServiceMetadata},
};
use anyhow::{Context, Result};
use clap::ArgMatches;
use secrecy::Secret;
use std::{net::IpAddr, path::PathBuf, time::Duration};
use tracing::warn;

const DEFAULT_PORT: u16 = 80;

fn get_string(matches: &ArgMatches, id: &str) -> Option<String> {
    matches.get_one::<String>(id).cloned()
}

/// Extract the raw datastore settings; validation happens in `config::resolve`
fn extract_db_settings(matches: &ArgMatches) -> DbSettings {
    DbSettings {
        host: get_string(matches, "db-host"),
        port: get_string(matches, "db-port"),
        user: get_string(matches, "db-user"),
        password: get_string(matches, "db-password").map(Secret::new),
        database: get_string(matches, "db-name"),
        ssl: get_string(matches, "db-ssl"),
        ssl_ca: matches
            .get_one::<String>("db-ssl-ca")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from),
    }
}

/// Convert `ArgMatches` into typed Action enum with validation
///
/// # Errors
///
/// Returns an error if the listen address or the listening port is invalid.
/// Datastore settings never fail here: a bad set only disables `/db`.
pub fn dispatch(matches: &ArgMatches) -> Result<Action> {
    // Extract and validate listen address
    let listen = matches
        .get_one::<String>("listen")
        .filter(|addr| !addr.is_empty())
        .map(|addr| {
            addr.parse::<IpAddr>()
                .with_context(|| format!("Invalid IP address: {addr}"))
        })
        .transpose()?;

    // empty PORT means the default
    let port = matches
        .get_one::<String>("port")
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<u16>().with_context(|| format!("Invalid port: {p}")))
        .transpose()?
        .unwrap_or(DEFAULT_PORT);

    let metadata = ServiceMetadata::new(
        get_string(matches, "app-version").unwrap_or_else(|| "local".to_string()),
        get_string(matches, "git-sha").unwrap_or_else(|| "unknown".to_string()),
        config::parse_flag(matches.get_one::<String>("feature-new-ui").map(String::as_str)),
    );

    let db = config::resolve(extract_db_settings(matches));
    if db.is_none() {
        warn!("datastore settings missing or invalid, /db will answer 400");
    }

    let probe_timeout = Duration::from_millis(
        matches
            .get_one::<u64>("db-timeout")
            .copied()
            .unwrap_or(crate::probe::DEFAULT_TIMEOUT_MS),
    );

    Ok(Action::Serve {
        listen,
        port,
        metadata,
        db,
        probe_timeout,
    })
}
