//! The Arbiter - beat-loop orchestrator
//!
//! A two-state machine (`Stopped` ⇄ `Running`) owning the genome, the
//! PID, and the ledger handle. Within a beat the steps are strictly
//! sequential; across beats, beat n+1 never starts before beat n's ledger
//! appends have completed, which keeps the chain's single-writer,
//! strictly-increasing-index invariant without extra coordination.
//!
//! Flow cores run as four tasks on the shared tokio runtime per beat (a
//! fixed-size fan-out, no unbounded task creation) and are harvested
//! against one common deadline. The stop signal is cooperative and only
//! honored at beat boundaries, so the ledger never records a partial
//! beat.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use systole_common::{
    Action, ActionRecord, CoreName, DecisionVector, Features, FlowResult, Genome, GenomeDelta,
    OrganismError, Pulse, Result, Weights,
};
use systole_control::{GenomicPID, PulseGenerator};
use systole_ledger::{ImmutableLedger, LedgerPayload};
use systole_mesh::P2PMesh;

use crate::config::OrganismConfig;
use crate::flows::{default_cores, FlowCore, ThreatModel};
use crate::source::{FeatureSource, NullFeatureSource};

/// Lifecycle state of the beat loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArbiterState {
    Stopped,
    Running,
}

/// Read-only snapshot returned by [`Arbiter::get_status`]
#[derive(Debug, Clone, Serialize)]
pub struct SystemStatus {
    /// Current lifecycle state
    pub state: ArbiterState,
    /// Beats completed so far
    pub beat_index: u64,
    /// Whether the latest PID step converged toward the target
    pub pid_stable: bool,
    /// Whether the chain verifies end to end right now
    pub ledger_verified: bool,
    /// Entries in the chain including genesis
    pub chain_length: u64,
    /// The genome weights as of the last recalibration
    pub weights: Weights,
}

/// The organism's orchestrator
pub struct Arbiter {
    config: OrganismConfig,
    pulse: PulseGenerator,
    pid: Mutex<GenomicPID>,
    genome: RwLock<Genome>,
    ledger: Arc<ImmutableLedger>,
    cores: Vec<Arc<dyn FlowCore>>,
    features: Arc<dyn FeatureSource>,
    mesh: Option<Arc<P2PMesh>>,
    inbound: std::sync::Mutex<Option<mpsc::Receiver<GenomeDelta>>>,
    beat_index: AtomicU64,
    running: AtomicBool,
    stop_flag: AtomicBool,
    pid_stable: AtomicBool,
}

impl Arbiter {
    /// Construct a stopped Arbiter
    ///
    /// Fails with a configuration error when `k*p <= 1`: the pulse
    /// formula is ill-posed and the organism must never enter `Running`.
    pub fn new(config: OrganismConfig, model: Arc<dyn ThreatModel>) -> Result<Self> {
        if !config.is_well_posed() {
            return Err(OrganismError::Config(format!(
                "pulse formula requires k*p > 1, got k={} p={}",
                config.k, config.p
            )));
        }

        let mut weights = config.initial_weights;
        if weights.min() < 0.0 || weights.sum() <= 0.0 {
            return Err(OrganismError::Config(
                "initial weights must be non-negative with a positive sum".to_string(),
            ));
        }
        weights.normalize();

        let genome = Genome {
            weights,
            risk: Default::default(),
            ml: systole_common::MlState {
                weight: config.initial_ml_weight.clamp(0.0, 1.0),
            },
        };

        let pulse = PulseGenerator::new(config.k, config.p, config.t1);
        let pid = GenomicPID::new(
            systole_common::PID_KP,
            systole_common::PID_KI,
            systole_common::PID_KD,
            config.stability_target,
        );

        Ok(Self {
            cores: default_cores(model),
            pulse,
            pid: Mutex::new(pid),
            genome: RwLock::new(genome),
            ledger: Arc::new(ImmutableLedger::new()),
            features: Arc::new(NullFeatureSource),
            mesh: None,
            inbound: std::sync::Mutex::new(None),
            beat_index: AtomicU64::new(0),
            running: AtomicBool::new(false),
            stop_flag: AtomicBool::new(false),
            pid_stable: AtomicBool::new(true),
            config,
        })
    }

    /// Wire a feature source in place of the null default
    pub fn with_feature_source(mut self, source: Arc<dyn FeatureSource>) -> Self {
        self.features = source;
        self
    }

    /// Wire a mesh node; its inbound deltas drain at beat boundaries
    pub fn with_mesh(self, mesh: Arc<P2PMesh>) -> Self {
        if let Ok(mut slot) = self.inbound.lock() {
            *slot = mesh.take_inbound();
        }
        Self {
            mesh: Some(mesh),
            ..self
        }
    }

    /// Handle for external ledger readers (signers, observability)
    pub fn ledger(&self) -> Arc<ImmutableLedger> {
        Arc::clone(&self.ledger)
    }

    /// Current lifecycle state
    pub fn state(&self) -> ArbiterState {
        if self.running.load(Ordering::SeqCst) {
            ArbiterState::Running
        } else {
            ArbiterState::Stopped
        }
    }

    /// Request a stop; takes effect at the next beat boundary
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    /// Read-only status; safe to call from another task while running
    pub fn get_status(&self) -> SystemStatus {
        SystemStatus {
            state: self.state(),
            beat_index: self.beat_index.load(Ordering::SeqCst),
            pid_stable: self.pid_stable.load(Ordering::SeqCst),
            ledger_verified: self.ledger.verify(),
            chain_length: self.ledger.len(),
            weights: self.genome.read().weights,
        }
    }

    /// Run the beat loop
    ///
    /// Executes `beats` iterations, or indefinitely when `beats < 0`,
    /// returning to `Stopped` on completion, stop signal, or fatal error.
    pub async fn start(&self, beats: i64) -> Result<()> {
        if !self.pulse.is_well_posed() {
            return Err(OrganismError::Config(
                "refusing to run with ill-posed pulse parameters".to_string(),
            ));
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(OrganismError::Internal(
                "arbiter is already running".to_string(),
            ));
        }
        self.stop_flag.store(false, Ordering::SeqCst);
        info!(beats, "arbiter entering RUNNING");

        let result = self.run_loop(beats).await;

        self.running.store(false, Ordering::SeqCst);
        match &result {
            Ok(()) => info!(
                beat_index = self.beat_index.load(Ordering::SeqCst),
                "arbiter returned to STOPPED"
            ),
            Err(e) => error!(error = %e, "arbiter stopped on fatal error"),
        }
        result
    }

    async fn run_loop(&self, beats: i64) -> Result<()> {
        let mut executed: i64 = 0;
        loop {
            // Cooperative cancellation, only ever between beats
            if self.stop_flag.load(Ordering::SeqCst) {
                info!("stop signal honored at beat boundary");
                break;
            }
            if beats >= 0 && executed >= beats {
                break;
            }

            self.execute_beat().await?;
            executed += 1;
        }
        Ok(())
    }

    /// One full beat, steps strictly in order
    async fn execute_beat(&self) -> Result<()> {
        let beat = self.beat_index.load(Ordering::SeqCst);

        // Mesh deltas and feature ingestion land before the snapshot so
        // the cores react to what arrived for this beat
        let features = self.features.collect(beat);
        self.ingest(&features);

        let pulse = self.pulse.next(beat);
        self.ledger.append(&LedgerPayload::Pulse {
            pulse: pulse.clone(),
        })?;

        let snapshot = self.genome.read().clone();
        let results = self.dispatch_cores(snapshot.clone(), features.clone()).await;
        for result in &results {
            self.ledger.append(&LedgerPayload::Flow {
                result: result.clone(),
            })?;
        }

        let decision = DecisionVector::aggregate(&results, &snapshot.weights);
        let action = self.decide(&decision);
        info!(
            beat,
            %action,
            pulse = pulse.value,
            threat = decision.raw_threat,
            "beat decided"
        );
        self.ledger.append(&LedgerPayload::Action {
            record: ActionRecord {
                action,
                decision: decision.clone(),
            },
        })?;

        self.recalibrate(&results, &pulse, &decision, beat);

        // The chain must verify after every beat's appends; a failure
        // here is unrecoverable and the loop stops without repair
        if self.config.audit_interval_beats != 0 && beat % self.config.audit_interval_beats == 0 {
            self.ledger.audit()?;
        }

        if self.config.mesh.enabled {
            if let Some(mesh) = &self.mesh {
                let ml_weight = self.genome.read().ml.weight;
                mesh.broadcast(&GenomeDelta {
                    node_id: mesh.node_id().to_string(),
                    anomalies_delta: features.anomalies,
                    ml_weight,
                });
            }
        }

        self.beat_index.fetch_add(1, Ordering::SeqCst);

        let delay = pulse.value * self.config.time_scale;
        if delay > 0.0 {
            tokio::time::sleep(Duration::from_secs_f64(delay)).await;
        }

        Ok(())
    }

    /// Apply pending mesh deltas, then this beat's feature contribution
    fn ingest(&self, features: &Features) {
        let mut genome = self.genome.write();

        if let Ok(mut slot) = self.inbound.lock() {
            if let Some(rx) = slot.as_mut() {
                while let Ok(delta) = rx.try_recv() {
                    debug!(from = %delta.node_id, "mesh delta injected");
                    P2PMesh::inject(&mut genome, &delta);
                }
            }
        }

        genome.risk.anomalies = genome.risk.anomalies.saturating_add(features.anomalies);
    }

    /// Fan the four cores out on the runtime and harvest them against one
    /// deadline; every core yields a result, failure included
    async fn dispatch_cores(&self, snapshot: Genome, features: Features) -> Vec<FlowResult> {
        let deadline =
            tokio::time::Instant::now() + Duration::from_millis(self.config.core_timeout_ms);

        let mut handles = Vec::with_capacity(self.cores.len());
        for core in &self.cores {
            let core = Arc::clone(core);
            let name = core.name();
            let genome = snapshot.clone();
            let features = features.clone();
            let handle = tokio::spawn(async move { core.execute(&genome, &features).await });
            handles.push((name, handle));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (name, mut handle) in handles {
            let result = match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok(Ok(recommendation))) => FlowResult::completed(name, recommendation),
                Ok(Ok(Err(e))) => {
                    warn!(core = %name, error = %e, "flow core failed");
                    FlowResult::failed(name, e.to_string())
                }
                Ok(Err(join_err)) => {
                    let reason = if join_err.is_panic() {
                        "core panicked during dispatch"
                    } else {
                        "core task cancelled"
                    };
                    warn!(core = %name, reason, "flow core lost");
                    FlowResult::failed(name, reason)
                }
                Err(_elapsed) => {
                    handle.abort();
                    warn!(core = %name, "flow core timed out");
                    FlowResult::failed(name, "dispatch deadline exceeded")
                }
            };
            results.push(result);
        }
        results
    }

    /// Fixed thresholds in priority order; first match wins
    fn decide(&self, decision: &DecisionVector) -> Action {
        let t = &self.config.thresholds;
        if decision.raw_threat >= t.quarantine {
            Action::Quarantine
        } else if decision.raw_threat >= t.alert {
            Action::Alert
        } else if decision.stability > t.stability && decision.repair < t.repair {
            Action::ApplyBalance
        } else if decision.gain > t.opt_gain {
            Action::ApplyOptimize
        } else {
            Action::Noop
        }
    }

    /// The beat's single genome write: PID-adjusted optimize weight,
    /// feedback-recomputed entropy weight, then one renormalization
    fn recalibrate(
        &self,
        results: &[FlowResult],
        pulse: &Pulse,
        decision: &DecisionVector,
        beat: u64,
    ) {
        let sample = {
            let mut pid = self.pid.lock();
            // Balance is the sole source of PID tuning
            for result in results {
                if result.core != CoreName::Balance {
                    continue;
                }
                if let Some(systole_common::Recommendation::Balance { kp, ki, kd, .. }) =
                    result.recommendation()
                {
                    pid.update_gains(*kp, *ki, *kd);
                }
            }
            pid.compute(pulse.value)
        };
        self.pid_stable.store(sample.stable, Ordering::SeqCst);

        let bounds = self.config.weight_bounds;
        let mut genome = self.genome.write();
        let weights = &mut genome.weights;

        weights.optimize = (weights.optimize + sample.weight_delta)
            .clamp(bounds.optimize_min, bounds.optimize_max);

        let threat = decision.raw_threat;
        let entropy = if threat > 0.5 {
            let decay = (-(beat as f64) / 50.0).exp();
            let optimize_factor = (1.0 - weights.optimize / 0.3).max(0.0);
            0.15 * threat * decay * optimize_factor
        } else {
            0.10
        };
        weights.entropy = entropy.clamp(bounds.entropy_min, bounds.entropy_max);

        weights.normalize();
        debug!(
            regen = weights.regen,
            balance = weights.balance,
            entropy = weights.entropy,
            optimize = weights.optimize,
            delta = sample.weight_delta,
            "weights recalibrated"
        );
    }
}
