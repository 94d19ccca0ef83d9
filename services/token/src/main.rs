use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use token_issuer::config::Config;
use token_issuer::keystore::{FileKeySlot, KeyStore};
use token_issuer::telemetry::{self, TracingConfig};
use token_issuer::{http, shutdown, IssuanceService};

/// Issues short-lived RS256 JWTs and the JWK that verifies them.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Port to listen on (overrides PORT, default 5000)
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(port) = cli.port {
        config = config.with_port(port);
    }

    telemetry::init_tracing(&TracingConfig::from(&config));

    info!("Starting Token Issuer");

    let slot = FileKeySlot::new(&config.key_path);
    let store = KeyStore::new(Arc::new(slot)).with_key_bits(config.key_bits);
    let service = IssuanceService::new(Arc::new(store)).with_defaults(config.issuance_defaults());

    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;

    info!(
        %addr,
        key_path = %config.key_path.display(),
        "Token Issuer listening"
    );

    shutdown::serve_until(
        listener,
        http::router(service),
        shutdown::wait_for_signal(),
        config.shutdown_timeout,
    )
    .await?;

    info!("Token Issuer stopped");
    Ok(())
}
