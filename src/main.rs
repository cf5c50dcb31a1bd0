//! cors-relay
//!
//! ```text
//!     Browser                        ┌──────────────────────────────────────┐
//!     ───────────────────────────────┼─▶ routing ──match──▶ proxy forwarder ─┼──▶ Upstream
//!                                    │      │                     │          │     origin
//!                                    │    miss                 3xx+Location  │
//!                                    │      ▼                     │  final   │
//!     ◀──────────────────────────────┼── fallback      pass-through  rebuild ◀┼───
//!                                    │                   (as-is)   cookies+CORS
//!                                    └──────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use cors_relay::config::{load_config, ConfigOverrides};
use cors_relay::observability::init_logging;
use cors_relay::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "cors-relay")]
#[command(about = "Relay API requests to an upstream origin with cross-site cookie rewriting", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Upstream origin, e.g. https://backend.example
    #[arg(long, env = "UPSTREAM_ORIGIN")]
    upstream_origin: Option<String>,

    /// Path prefix to relay.
    #[arg(long, env = "PROXY_PREFIX")]
    path_prefix: Option<String>,

    /// Strip the prefix before forwarding.
    #[arg(long, env = "STRIP_PREFIX")]
    strip_prefix: Option<bool>,

    /// Listener bind address.
    #[arg(long, env = "BIND_ADDRESS")]
    bind: Option<String>,
}

impl From<Cli> for ConfigOverrides {
    fn from(cli: Cli) -> Self {
        Self {
            upstream_origin: cli.upstream_origin,
            path_prefix: cli.path_prefix,
            strip_prefix: cli.strip_prefix,
            bind_address: cli.bind,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut cli = Cli::parse();
    let config_path = cli.config.take();
    let config = load_config(config_path.as_deref(), cli.into())?;

    init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "cors-relay starting");

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
