//! Mesh node: peer registry, outbound queues, inbound listener
//!
//! Each registered peer gets a bounded FIFO queue and a dedicated worker
//! task. The worker applies an adaptive pre-dispatch delay: 0.3 ms when
//! the backlog exceeds the queue threshold, 1 ms otherwise. This is a
//! throttle/burst policy, not a correctness mechanism. Broadcast itself
//! only ever `try_send`s, so a slow or dead peer can never block the
//! caller.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use systole_common::{
    Genome, GenomeDelta, Result, MESH_DELAY_HIGH_QUEUE_US, MESH_DELAY_LOW_QUEUE_US,
    MESH_QUEUE_THRESHOLD,
};

/// Mesh node configuration
#[derive(Debug, Clone)]
pub struct MeshConfig {
    /// This node's identity, carried in every outbound delta
    pub node_id: String,
    /// Bounded capacity of each per-peer outbound queue
    pub queue_capacity: usize,
    /// Bounded capacity of the inbound delta channel
    pub inbound_capacity: usize,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            node_id: uuid::Uuid::now_v7().to_string(),
            queue_capacity: 1024,
            inbound_capacity: 256,
        }
    }
}

/// Delivery counters
#[derive(Debug, Default)]
pub struct MeshMetrics {
    /// Deltas handed to broadcast
    pub broadcasts: AtomicU64,
    /// Messages written to a peer socket
    pub delivered: AtomicU64,
    /// Messages dropped: full queue or transport failure
    pub dropped: AtomicU64,
}

/// One registered peer: its queue and backlog gauge
struct PeerLink {
    tx: mpsc::Sender<GenomeDelta>,
    backlog: Arc<AtomicUsize>,
}

/// Peer-to-peer mesh node
pub struct P2PMesh {
    config: MeshConfig,
    peers: DashMap<String, PeerLink>,
    inbound_tx: mpsc::Sender<GenomeDelta>,
    inbound_rx: std::sync::Mutex<Option<mpsc::Receiver<GenomeDelta>>>,
    metrics: Arc<MeshMetrics>,
}

impl P2PMesh {
    /// Create a mesh node; workers spawn lazily as peers are added
    pub fn new(config: MeshConfig) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(config.inbound_capacity);
        Self {
            config,
            peers: DashMap::new(),
            inbound_tx,
            inbound_rx: std::sync::Mutex::new(Some(inbound_rx)),
            metrics: Arc::new(MeshMetrics::default()),
        }
    }

    /// This node's identity
    pub fn node_id(&self) -> &str {
        &self.config.node_id
    }

    /// Delivery counters
    pub fn metrics(&self) -> &MeshMetrics {
        &self.metrics
    }

    /// Register a peer and spawn its outbound worker
    ///
    /// Registering self is a no-op: broadcast never loops back.
    pub fn add_peer(&self, peer_id: &str, addr: SocketAddr) {
        if peer_id == self.config.node_id {
            return;
        }

        let (tx, rx) = mpsc::channel(self.config.queue_capacity);
        let backlog = Arc::new(AtomicUsize::new(0));
        let link = PeerLink {
            tx,
            backlog: backlog.clone(),
        };

        let metrics = self.metrics.clone();
        let peer = peer_id.to_string();
        tokio::spawn(outbound_worker(peer, addr, rx, backlog, metrics));

        self.peers.insert(peer_id.to_string(), link);
        info!(peer_id, %addr, "mesh peer registered");
    }

    /// Drop a peer; its worker ends once the queue drains
    pub fn remove_peer(&self, peer_id: &str) {
        self.peers.remove(peer_id);
    }

    /// Number of registered peers
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Fire-and-forget fan-out to every registered peer except self
    ///
    /// Never blocks: a full peer queue drops the message with a warning.
    pub fn broadcast(&self, delta: &GenomeDelta) {
        self.metrics.broadcasts.fetch_add(1, Ordering::Relaxed);

        for peer in self.peers.iter() {
            if peer.key() == &delta.node_id {
                continue;
            }
            // Counted before enqueue so the worker's decrement can never
            // observe an empty gauge for an in-flight message
            peer.value().backlog.fetch_add(1, Ordering::Relaxed);
            match peer.value().tx.try_send(delta.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    peer.value().backlog.fetch_sub(1, Ordering::Relaxed);
                    self.metrics.dropped.fetch_add(1, Ordering::Relaxed);
                    warn!(peer_id = %peer.key(), "outbound queue full, delta dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    peer.value().backlog.fetch_sub(1, Ordering::Relaxed);
                    self.metrics.dropped.fetch_add(1, Ordering::Relaxed);
                    debug!(peer_id = %peer.key(), "outbound worker gone, delta dropped");
                }
            }
        }
    }

    /// Bind the inbound listener and start accepting peer connections
    ///
    /// Returns the bound address (useful with port 0). Each accepted
    /// connection is drained line by line; undecodable lines are skipped.
    pub async fn listen(&self, bind: SocketAddr) -> Result<SocketAddr> {
        let listener = TcpListener::bind(bind).await?;
        let local = listener.local_addr()?;
        let inbound = self.inbound_tx.clone();
        let node_id = self.config.node_id.clone();

        tokio::spawn(async move {
            info!(%local, %node_id, "mesh listener started");
            loop {
                match listener.accept().await {
                    Ok((stream, remote)) => {
                        let inbound = inbound.clone();
                        tokio::spawn(inbound_connection(stream, remote, inbound));
                    }
                    Err(e) => {
                        warn!(error = %e, "mesh accept failed");
                    }
                }
            }
        });

        Ok(local)
    }

    /// Take the inbound delta receiver; yields once, the Arbiter drains it
    /// at beat boundaries
    pub fn take_inbound(&self) -> Option<mpsc::Receiver<GenomeDelta>> {
        self.inbound_rx
            .lock()
            .ok()
            .and_then(|mut slot| slot.take())
    }

    /// Apply an incoming delta to a live genome
    ///
    /// The narrow injection path: the mesh proposes, the genome's owner
    /// calls this at a beat boundary.
    pub fn inject(genome: &mut Genome, delta: &GenomeDelta) {
        genome.risk.anomalies = genome.risk.anomalies.saturating_add(delta.anomalies_delta);
        genome.ml.weight = delta.ml_weight.clamp(0.0, 1.0);
    }
}

/// Per-peer delivery loop: adaptive delay, one JSON line per connection
async fn outbound_worker(
    peer_id: String,
    addr: SocketAddr,
    mut rx: mpsc::Receiver<GenomeDelta>,
    backlog: Arc<AtomicUsize>,
    metrics: Arc<MeshMetrics>,
) {
    while let Some(delta) = rx.recv().await {
        let pending = backlog
            .fetch_sub(1, Ordering::Relaxed)
            .saturating_sub(1);

        // Burst mode under backlog pressure, gentle pacing otherwise
        let delay = if pending > MESH_QUEUE_THRESHOLD {
            Duration::from_micros(MESH_DELAY_HIGH_QUEUE_US)
        } else {
            Duration::from_micros(MESH_DELAY_LOW_QUEUE_US)
        };
        tokio::time::sleep(delay).await;

        let line = match serde_json::to_string(&delta) {
            Ok(line) => line,
            Err(e) => {
                metrics.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(%peer_id, error = %e, "delta serialization failed");
                continue;
            }
        };

        match deliver(addr, &line).await {
            Ok(()) => {
                metrics.delivered.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                // Best-effort: failures are dropped, never retried
                metrics.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(%peer_id, %addr, error = %e, "mesh delivery failed");
            }
        }
    }
    debug!(%peer_id, "outbound worker stopped");
}

async fn deliver(addr: SocketAddr, line: &str) -> std::io::Result<()> {
    let mut stream = TcpStream::connect(addr).await?;
    stream.write_all(line.as_bytes()).await?;
    stream.write_all(b"\n").await?;
    stream.flush().await?;
    Ok(())
}

/// Decode newline-delimited deltas from one peer connection
async fn inbound_connection(
    stream: TcpStream,
    remote: SocketAddr,
    inbound: mpsc::Sender<GenomeDelta>,
) {
    let mut lines = BufReader::new(stream).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match serde_json::from_str::<GenomeDelta>(&line) {
                Ok(delta) => {
                    if inbound.send(delta).await.is_err() {
                        return;
                    }
                }
                Err(e) => {
                    debug!(%remote, error = %e, "undecodable mesh line skipped");
                }
            },
            Ok(None) => return,
            Err(e) => {
                debug!(%remote, error = %e, "mesh connection read failed");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(node_id: &str, anomalies: u64, ml_weight: f64) -> GenomeDelta {
        GenomeDelta {
            node_id: node_id.to_string(),
            anomalies_delta: anomalies,
            ml_weight,
        }
    }

    #[test]
    fn test_inject_applies_delta() {
        let mut genome = Genome::new();
        P2PMesh::inject(&mut genome, &delta("peer", 7, 0.4));
        assert_eq!(genome.risk.anomalies, 7);
        assert_eq!(genome.ml.weight, 0.4);
    }

    #[test]
    fn test_inject_clamps_ml_weight() {
        let mut genome = Genome::new();
        P2PMesh::inject(&mut genome, &delta("peer", 0, 3.5));
        assert_eq!(genome.ml.weight, 1.0);

        P2PMesh::inject(&mut genome, &delta("peer", 0, -1.0));
        assert_eq!(genome.ml.weight, 0.0);
    }

    #[test]
    fn test_inject_saturates_anomalies() {
        let mut genome = Genome::new();
        genome.risk.anomalies = u64::MAX - 1;
        P2PMesh::inject(&mut genome, &delta("peer", 10, 0.1));
        assert_eq!(genome.risk.anomalies, u64::MAX);
    }

    #[tokio::test]
    async fn test_add_peer_ignores_self() {
        let mesh = P2PMesh::new(MeshConfig {
            node_id: "self".to_string(),
            ..MeshConfig::default()
        });
        mesh.add_peer("self", "127.0.0.1:9".parse().unwrap());
        assert_eq!(mesh.peer_count(), 0);

        mesh.add_peer("other", "127.0.0.1:9".parse().unwrap());
        assert_eq!(mesh.peer_count(), 1);
    }

    #[tokio::test]
    async fn test_broadcast_skips_origin_peer() {
        let mesh = P2PMesh::new(MeshConfig {
            node_id: "self".to_string(),
            ..MeshConfig::default()
        });
        mesh.add_peer("origin", "127.0.0.1:9".parse().unwrap());

        // Delta originating from "origin" must not echo back to it
        mesh.broadcast(&delta("origin", 1, 0.1));
        assert_eq!(mesh.metrics().broadcasts.load(Ordering::Relaxed), 1);
        assert_eq!(mesh.metrics().dropped.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_broadcast_never_blocks_on_full_queue() {
        let mesh = P2PMesh::new(MeshConfig {
            node_id: "self".to_string(),
            queue_capacity: 1,
            ..MeshConfig::default()
        });
        // Unroutable peer: the worker stalls on connect timeouts, letting
        // the queue fill
        mesh.add_peer("slow", "127.0.0.1:9".parse().unwrap());

        for i in 0..50 {
            mesh.broadcast(&delta("self", i, 0.1));
        }
        // All broadcasts returned immediately; overflow was dropped
        assert_eq!(mesh.metrics().broadcasts.load(Ordering::Relaxed), 50);
        assert!(mesh.metrics().dropped.load(Ordering::Relaxed) > 0);
    }

    #[tokio::test]
    async fn test_round_trip_between_two_nodes() {
        let receiver = P2PMesh::new(MeshConfig {
            node_id: "receiver".to_string(),
            ..MeshConfig::default()
        });
        let addr = receiver
            .listen("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let mut inbound = receiver.take_inbound().unwrap();

        let sender = P2PMesh::new(MeshConfig {
            node_id: "sender".to_string(),
            ..MeshConfig::default()
        });
        sender.add_peer("receiver", addr);
        sender.broadcast(&delta("sender", 5, 0.2));

        let received = tokio::time::timeout(Duration::from_secs(5), inbound.recv())
            .await
            .expect("delivery within timeout")
            .expect("channel open");
        assert_eq!(received.node_id, "sender");
        assert_eq!(received.anomalies_delta, 5);
    }

    #[test]
    fn test_take_inbound_yields_once() {
        let mesh = P2PMesh::new(MeshConfig::default());
        assert!(mesh.take_inbound().is_some());
        assert!(mesh.take_inbound().is_none());
    }
}
