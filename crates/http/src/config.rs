//! Process configuration: `--port`/`--database`/`--api-token` flags
//! with environment-variable fallback, parsed with `clap`'s `env`
//! feature since this service's CLI surface is flag-first with env as
//! the fallback, not the other way around.

use clap::Parser;

const DEFAULT_DATABASE_PATH: &str = "tqs.sqlite3";

/// A small HTTP-accessible queue service.
#[derive(Debug, Clone, Parser)]
#[command(name = "tqs", version, about)]
pub struct Config {
    /// TCP port to listen on.
    #[arg(long, env = "TQS_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Path to the SQLite database file (created if absent).
    #[arg(long, env = "TQS_DATABASE", default_value = DEFAULT_DATABASE_PATH)]
    pub database: String,

    /// Shared-secret API token. When set, every route but `/`,
    /// `/version`, and `/healthz` requires a matching
    /// `Authentication: token <token>` header.
    #[arg(long, env = "TQS_API_TOKEN")]
    pub api_token: Option<String>,

    /// `tracing_subscriber::EnvFilter` directive.
    #[arg(long, env = "TQS_LOG_FILTER", default_value = "info")]
    pub log_filter: String,
}

impl Config {
    pub fn socket_addr(&self) -> std::net::SocketAddr {
        std::net::SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_design() {
        let cfg = Config::parse_from(["tqs"]);
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.database, DEFAULT_DATABASE_PATH);
        assert!(cfg.api_token.is_none());
        assert_eq!(cfg.log_filter, "info");
    }

    #[test]
    fn flags_override_defaults() {
        let cfg = Config::parse_from([
            "tqs",
            "--port",
            "9090",
            "--database",
            "/tmp/custom.sqlite3",
            "--api-token",
            "s3cr3t",
        ]);
        assert_eq!(cfg.port, 9090);
        assert_eq!(cfg.database, "/tmp/custom.sqlite3");
        assert_eq!(cfg.api_token.as_deref(), Some("s3cr3t"));
    }
}
