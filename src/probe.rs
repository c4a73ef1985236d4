use crate::config::ConnectionConfig;
use chrono::NaiveDateTime;
use futures::FutureExt;
use secrecy::ExposeSecret;
use sqlx::{
    ConnectOptions, Connection, MySqlConnection,
    mysql::{MySqlConnectOptions, MySqlSslMode},
};
use std::{
    panic::AssertUnwindSafe,
    sync::{
        OnceLock,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::time::{Instant, timeout, timeout_at};
use tracing::{debug, warn};

pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Upper bound for the graceful close, on top of the probe timeout
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Returns the server's current time and version in one round trip
const DIAGNOSTIC_QUERY: &str = "SELECT NOW() AS now, VERSION() AS version";

static OPEN_CONNECTIONS: AtomicUsize = AtomicUsize::new(0);
static CRYPTO_PROVIDER_INIT: OnceLock<()> = OnceLock::new();

/// Result of a single probe invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Success {
        server_time: NaiveDateTime,
        server_version: String,
    },
    ConfigMissing,
    ConnectionFailed(String),
    QueryFailed(String),
}

/// Number of probe connections currently held open by this process
#[must_use]
pub fn open_connections() -> usize {
    OPEN_CONNECTIONS.load(Ordering::SeqCst)
}

/// Install the ring crypto provider for rustls once per process
pub fn ensure_crypto_provider() {
    CRYPTO_PROVIDER_INIT.get_or_init(|| {
        if let Err(err) = rustls::crypto::ring::default_provider().install_default() {
            debug!("rustls crypto provider already installed: {err:?}");
        }
    });
}

/// Owns the one connection of a probe.
///
/// `release` closes it gracefully; if the guard is dropped while still holding
/// the connection (unwinding, cancelled task) the socket is dropped instead.
/// The open connection counter is decremented exactly once, on drop.
struct ProbeConnection {
    conn: Option<MySqlConnection>,
}

impl ProbeConnection {
    fn new(conn: MySqlConnection) -> Self {
        Self::track(Some(conn))
    }

    fn track(conn: Option<MySqlConnection>) -> Self {
        OPEN_CONNECTIONS.fetch_add(1, Ordering::SeqCst);
        Self { conn }
    }

    async fn query(
        &mut self,
        sql: &str,
        deadline: Instant,
        limit: Duration,
    ) -> Result<(NaiveDateTime, String), String> {
        let Some(conn) = self.conn.as_mut() else {
            return Err("connection already released".to_string());
        };

        let query = sqlx::query_as::<_, (NaiveDateTime, String)>(sql).fetch_one(conn);
        match timeout_at(deadline, query).await {
            Ok(Ok(row)) => Ok(row),
            Ok(Err(err)) => Err(err.to_string()),
            Err(_) => Err(format!("query timeout after {}ms", limit.as_millis())),
        }
    }

    /// Close faults are logged and swallowed, never returned
    async fn release(mut self) {
        if let Some(conn) = self.conn.take() {
            match timeout(CLOSE_TIMEOUT, conn.close()).await {
                Ok(Ok(())) => debug!("probe connection closed"),
                Ok(Err(err)) => warn!(error = %err, "failed to close probe connection"),
                Err(_) => warn!(
                    "closing probe connection timed out after {}ms",
                    CLOSE_TIMEOUT.as_millis()
                ),
            }
        }
    }
}

impl Drop for ProbeConnection {
    fn drop(&mut self) {
        if self.conn.take().is_some() {
            debug!("probe connection dropped without graceful close");
        }
        OPEN_CONNECTIONS.fetch_sub(1, Ordering::SeqCst);
    }
}

fn connect_options(config: &ConnectionConfig) -> MySqlConnectOptions {
    let options = MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(config.password.expose_secret())
        .database(&config.database);

    if config.use_encrypted_transport {
        let options = options.ssl_mode(MySqlSslMode::VerifyIdentity);
        match &config.ssl_ca {
            Some(ca_path) => options.ssl_ca(ca_path),
            None => options,
        }
    } else {
        options.ssl_mode(MySqlSslMode::Disabled)
    }
}

/// Open one connection, run the diagnostic query, release the connection.
///
/// Every exit path releases the connection. A single attempt is made; connect
/// and query together must finish within `limit`. Never returns
/// [`ProbeOutcome::ConfigMissing`].
pub async fn probe(config: &ConnectionConfig, limit: Duration) -> ProbeOutcome {
    probe_with_query(config, limit, DIAGNOSTIC_QUERY).await
}

/// Same as [`probe`] but runs `sql`, which must return one
/// `(DATETIME, string)` row.
pub async fn probe_with_query(
    config: &ConnectionConfig,
    limit: Duration,
    sql: &str,
) -> ProbeOutcome {
    let deadline = Instant::now() + limit;

    if config.use_encrypted_transport {
        ensure_crypto_provider();
    }

    debug!(host = %config.host, port = config.port, "connecting to datastore");

    // A timed out connect future is dropped together with any half-open socket
    let mut conn = match timeout_at(deadline, connect_options(config).connect()).await {
        Ok(Ok(conn)) => ProbeConnection::new(conn),
        Ok(Err(err)) => {
            warn!(error = %err, "datastore connection failed");
            return ProbeOutcome::ConnectionFailed(err.to_string());
        }
        Err(_) => {
            let message = format!("connect timeout after {}ms", limit.as_millis());
            warn!("datastore connection failed: {message}");
            return ProbeOutcome::ConnectionFailed(message);
        }
    };

    let outcome = match AssertUnwindSafe(conn.query(sql, deadline, limit))
        .catch_unwind()
        .await
    {
        Ok(Ok((server_time, server_version))) => ProbeOutcome::Success {
            server_time,
            server_version,
        },
        Ok(Err(message)) => {
            warn!(error = %message, "diagnostic query failed");
            ProbeOutcome::QueryFailed(message)
        }
        Err(_) => {
            warn!("diagnostic query panicked");
            ProbeOutcome::QueryFailed("diagnostic query panicked".to_string())
        }
    };

    conn.release().await;

    outcome
}
