//! # P2FK Node
//!
//! Watches the Bitcoin peer network for P2FK transactions and indexes the
//! messages, files and content references they carry.
//!
//! ```text
//! p2fk-node                       # testnet, direct P2P, ./p2fk.toml if present
//! P2FK_BACKEND=rpc p2fk-node      # poll a local node instead
//! P2FK_CONFIG=/etc/p2fk.toml p2fk-node
//! ```

use anyhow::{Context, Result};
use node_runtime::{NodeConfig, P2fkNode};
use p2fk_telemetry::{init_logging, TelemetryConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry = TelemetryConfig::from_env();
    init_logging(&telemetry).context("Failed to initialize logging")?;

    let config = NodeConfig::load().context("Failed to load configuration")?;
    let node = P2fkNode::new(config).context("Failed to build node")?;

    tokio::select! {
        started = node.start() => started?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C before the monitor started");
            node.shutdown().await;
            return Ok(());
        }
    }

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    node.shutdown().await;
    Ok(())
}
