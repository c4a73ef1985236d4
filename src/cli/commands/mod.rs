use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub const DEFAULT_LOG_FILTER: &str = "svcprobe=info,tower_http=info";

/// Pure clap command definitions with zero business logic
///
/// Every argument is backed by an environment variable so the service can be
/// configured entirely from the container environment.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new(env!("CARGO_PKG_NAME"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .default_value("80")
                .env("PORT")
                .help("listening port")
                .long("port")
                .short('p')
                .value_name("PORT"),
        )
        .arg(
            Arg::new("listen")
                .env("LISTEN")
                .help("IP address to bind to (default: [::]:port, accepts both IPv6 and IPv4)")
                .long("listen")
                .long_help(
                    "IP address to bind to:\n\
                    Not specified (default) binds to [::]:port which accepts both IPv6 and IPv4 connections.\n\
                    Falls back to 0.0.0.0:port if IPv6 is unavailable.\n\n\
                    Specific IPv4 examples: '0.0.0.0', '127.0.0.1'\n\
                    Specific IPv6: '::', '::1'"
                )
                .short('l')
                .value_name("IP"),
        )
        .arg(
            Arg::new("app-version")
                .default_value("local")
                .env("APP_VERSION")
                .help("application version reported by / and /version")
                .long("app-version"),
        )
        .arg(
            Arg::new("git-sha")
                .default_value("unknown")
                .env("GIT_SHA")
                .help("git commit reported by / and /version")
                .long("git-sha"),
        )
        .arg(
            Arg::new("feature-new-ui")
                .default_value("false")
                .env("FEATURE_NEW_UI")
                .help("enable the new UI feature flag (\"true\" enables it)")
                .long("feature-new-ui")
                .value_name("BOOL"),
        )
        .arg(
            Arg::new("db-host")
                .env("DB_HOST")
                .help("datastore host, required by /db")
                .long("db-host")
                .value_name("HOST"),
        )
        .arg(
            Arg::new("db-port")
                .env("DB_PORT")
                .help("datastore port [default: 3306]")
                .long("db-port")
                .value_name("PORT"),
        )
        .arg(
            Arg::new("db-user")
                .env("DB_USER")
                .help("datastore user, required by /db")
                .long("db-user")
                .value_name("USER"),
        )
        .arg(
            Arg::new("db-password")
                .env("DB_PASSWORD")
                .help("datastore password, required by /db")
                .hide_env_values(true)
                .long("db-password")
                .value_name("PASSWORD"),
        )
        .arg(
            Arg::new("db-name")
                .env("DB_NAME")
                .help("datastore database name, required by /db")
                .long("db-name")
                .value_name("DATABASE"),
        )
        .arg(
            Arg::new("db-ssl")
                .default_value("false")
                .env("DB_SSL")
                .help("use TLS with full certificate verification (\"true\" enables it)")
                .long("db-ssl")
                .value_name("BOOL"),
        )
        .arg(
            Arg::new("db-ssl-ca")
                .env("DB_SSL_CA")
                .help("Path to CA certificate file for TLS verification")
                .long("db-ssl-ca")
                .value_name("PATH"),
        )
        .arg(
            Arg::new("db-timeout")
                .default_value("5000")
                .env("DB_TIMEOUT_MS")
                .help("milliseconds allowed for connecting to and querying the datastore")
                .long("db-timeout")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("log-level")
                .default_value(DEFAULT_LOG_FILTER)
                .env("RUST_LOG")
                .help("log filter, e.g. \"svcprobe=debug,tower_http=info\"")
                .long("log-level")
                .value_name("FILTER"),
        )
}
