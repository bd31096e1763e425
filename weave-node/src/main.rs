//! Replica binary: parses [`weave_node::ReplicaConfig`], starts a
//! [`weave_node::Replica`], and blocks until Ctrl-C (spec §6). Tracing
//! setup mirrors `privstack-relay::main`'s `FmtSubscriber` init, and the
//! startup banner follows the same shape.

use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use weave_node::{Replica, ReplicaConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = ReplicaConfig::parse();
    let log_level = if cfg.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    info!("weave-node starting...");
    let replica = Replica::start(cfg.clone()).await;

    println!("\n========================================");
    println!("  weave-node running");
    println!("========================================");
    println!("  Replica:      {}", replica.replica_id());
    println!("  Display name: {}", replica.display_name());
    println!("  Grid:         {}x{}", cfg.rows, cfg.cols);
    println!("  Base port:    {}", cfg.base_port);
    println!("========================================\n");

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    replica.shutdown().await;
    info!("weave-node stopped");

    Ok(())
}
