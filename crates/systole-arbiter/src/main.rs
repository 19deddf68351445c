//! Systole service binary
//!
//! Boots the organism: tracing, env configuration, optional mesh wiring,
//! then the beat loop until the configured beat budget is exhausted or a
//! shutdown signal arrives.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use systole_arbiter::{Arbiter, LogisticThreatModel, OrganismConfig};
use systole_mesh::{MeshConfig, P2PMesh};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("Starting Systole organism v{}", systole_common::VERSION);

    // Load configuration
    let config = OrganismConfig::load()?;
    info!("Loaded configuration: {:?}", config);

    let beats: i64 = std::env::var("SYSTOLE_BEATS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10);

    let mut arbiter = Arbiter::new(config.clone(), Arc::new(LogisticThreatModel))?;

    if config.mesh.enabled {
        let mesh = Arc::new(P2PMesh::new(MeshConfig::default()));
        if let Some(bind) = &config.mesh.bind_addr {
            let bind: SocketAddr = bind.parse()?;
            let local = mesh.listen(bind).await?;
            info!("Mesh listening on {}", local);
        }
        for peer in &config.mesh.peers {
            let addr: SocketAddr = peer.parse()?;
            mesh.add_peer(peer, addr);
        }
        info!(peers = mesh.peer_count(), "Mesh enabled");
        arbiter = arbiter.with_mesh(mesh);
    }

    let arbiter = Arc::new(arbiter);

    // Stop at the next beat boundary on CTRL+C
    let stopper = arbiter.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            stopper.stop();
        }
    });

    info!(beats, "Starting beat loop");
    arbiter.start(beats).await?;

    // Final status
    let status = arbiter.get_status();
    info!("Final status:");
    info!("  Beats completed: {}", status.beat_index);
    info!("  PID stable: {}", status.pid_stable);
    info!("  Ledger verified: {}", status.ledger_verified);
    info!(
        "  Weights: regen={:.4} balance={:.4} entropy={:.4} optimize={:.4}",
        status.weights.regen, status.weights.balance, status.weights.entropy, status.weights.optimize
    );

    // Ledger manifest for external auditors
    let manifest = arbiter.ledger().manifest();
    info!("Ledger manifest:");
    info!("  Chain length: {}", manifest.chain_length);
    info!("  Merkle root: {}", manifest.merkle_root);
    info!("  Genesis hash: {}", manifest.genesis_hash);
    info!("  Latest hash: {}", manifest.latest_hash);

    Ok(())
}
