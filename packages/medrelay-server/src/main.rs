mod app;
mod hub;
mod routes;
mod state;

use crate::hub::BroadcastHub;
use crate::state::RelayState;
use anyhow::Context;
use dotenvy::dotenv;
use std::{net::SocketAddr, sync::Arc};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_ADDR: &str = "0.0.0.0:4000";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let state = Arc::new(RelayState {
        hub: BroadcastHub::new(),
    });
    let app = app::axum_app(state);

    let addr = resolve_listen_addr()?;
    info!(%addr, "medrelay started");
    println!(
        "medrelay started at http://{}",
        addr.to_string().replace("0.0.0.0", "127.0.0.1")
    );
    let tcp_listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(tcp_listener, app).await?;
    Ok(())
}

fn resolve_listen_addr() -> anyhow::Result<SocketAddr> {
    let addr_text = std::env::var("MEDRELAY_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    addr_text
        .parse()
        .with_context(|| format!("invalid MEDRELAY_ADDR: {addr_text}"))
}
