//! Organism configuration
//!
//! All parameters are fixed at construction; there is no runtime
//! reconfiguration. `load()` starts from the defaults and applies
//! `SYSTOLE_*` environment variables, reading a `.env` file first when
//! present.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use systole_common::Weights;

/// Fixed action-selection thresholds, evaluated in priority order
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ActionThresholds {
    /// Raw threat score at or above which the beat quarantines
    pub quarantine: f64,
    /// Raw threat score at or above which the beat alerts
    pub alert: f64,
    /// Weighted stability above which a balance action applies
    pub stability: f64,
    /// Weighted repair score below which a balance action applies
    pub repair: f64,
    /// Weighted gain above which an optimize action applies
    pub opt_gain: f64,
}

impl Default for ActionThresholds {
    fn default() -> Self {
        Self {
            quarantine: systole_common::THREAT_QUARANTINE,
            alert: systole_common::THREAT_ALERT,
            stability: systole_common::STABILITY_THRESHOLD,
            repair: systole_common::REPAIR_THRESHOLD,
            opt_gain: systole_common::OPT_GAIN_THRESHOLD,
        }
    }
}

/// Clamp bounds applied during recalibration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeightBounds {
    pub optimize_min: f64,
    pub optimize_max: f64,
    pub entropy_min: f64,
    pub entropy_max: f64,
}

impl Default for WeightBounds {
    fn default() -> Self {
        Self {
            optimize_min: systole_common::OPTIMIZE_WEIGHT_MIN,
            optimize_max: systole_common::OPTIMIZE_WEIGHT_MAX,
            entropy_min: systole_common::ENTROPY_WEIGHT_MIN,
            entropy_max: systole_common::ENTROPY_WEIGHT_MAX,
        }
    }
}

/// Mesh wiring for this instance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshSettings {
    /// Whether genome deltas are broadcast at all
    pub enabled: bool,
    /// Inbound listener address, e.g. "127.0.0.1:9400"; None = outbound only
    pub bind_addr: Option<String>,
    /// Static peer addresses to register at startup
    pub peers: Vec<String>,
}

/// Complete organism configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganismConfig {
    /// Parallel flow count (pulse parameter k)
    pub k: u32,
    /// Node count (pulse parameter p)
    pub p: u32,
    /// Base time unit in seconds (pulse parameter t1)
    pub t1: f64,
    /// Pulse target the PID error is measured against
    pub stability_target: f64,
    /// Weight distribution the genome starts from
    pub initial_weights: Weights,
    /// Initial inference scale factor
    pub initial_ml_weight: f64,
    /// Deadline for one beat's core dispatch, in milliseconds
    pub core_timeout_ms: u64,
    /// Multiplier on the pulse value when sleeping between beats;
    /// 0 disables sleeping entirely (test mode)
    pub time_scale: f64,
    /// Chain audit cadence in beats; 0 disables the per-beat audit
    pub audit_interval_beats: u64,
    /// Action-selection thresholds
    pub thresholds: ActionThresholds,
    /// Recalibration clamp bounds
    pub weight_bounds: WeightBounds,
    /// Mesh wiring
    pub mesh: MeshSettings,
}

impl Default for OrganismConfig {
    fn default() -> Self {
        Self {
            k: 4,
            p: 5,
            t1: 0.001,
            stability_target: systole_common::STABILITY_TARGET,
            initial_weights: Weights::default(),
            initial_ml_weight: 0.12,
            core_timeout_ms: 250,
            time_scale: 1.0,
            audit_interval_beats: 1,
            thresholds: ActionThresholds::default(),
            weight_bounds: WeightBounds::default(),
            mesh: MeshSettings::default(),
        }
    }
}

impl OrganismConfig {
    /// Load configuration from environment variables over the defaults
    pub fn load() -> Result<Self> {
        // Pick up a .env file when present
        let _ = dotenvy::dotenv();

        let mut cfg = Self::default();

        if let Ok(val) = std::env::var("SYSTOLE_K") {
            if let Ok(v) = val.parse() {
                cfg.k = v;
            }
        }
        if let Ok(val) = std::env::var("SYSTOLE_P") {
            if let Ok(v) = val.parse() {
                cfg.p = v;
            }
        }
        if let Ok(val) = std::env::var("SYSTOLE_T1") {
            if let Ok(v) = val.parse() {
                cfg.t1 = v;
            }
        }
        if let Ok(val) = std::env::var("SYSTOLE_STABILITY_TARGET") {
            if let Ok(v) = val.parse() {
                cfg.stability_target = v;
            }
        }
        if let Ok(val) = std::env::var("SYSTOLE_CORE_TIMEOUT_MS") {
            if let Ok(v) = val.parse() {
                cfg.core_timeout_ms = v;
            }
        }
        if let Ok(val) = std::env::var("SYSTOLE_TIME_SCALE") {
            if let Ok(v) = val.parse() {
                cfg.time_scale = v;
            }
        }
        if let Ok(val) = std::env::var("SYSTOLE_AUDIT_INTERVAL_BEATS") {
            if let Ok(v) = val.parse() {
                cfg.audit_interval_beats = v;
            }
        }
        if let Ok(val) = std::env::var("SYSTOLE_MESH_ENABLED") {
            cfg.mesh.enabled = matches!(val.as_str(), "1" | "true" | "yes");
        }
        if let Ok(val) = std::env::var("SYSTOLE_MESH_BIND") {
            cfg.mesh.bind_addr = Some(val);
        }
        if let Ok(val) = std::env::var("SYSTOLE_MESH_PEERS") {
            cfg.mesh.peers = val
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }

        Ok(cfg)
    }

    /// The well-posedness condition for the pulse formula
    pub fn is_well_posed(&self) -> bool {
        self.k as u64 * self.p as u64 > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_well_posed() {
        let cfg = OrganismConfig::default();
        assert!(cfg.is_well_posed());
        assert_eq!(cfg.k, 4);
        assert_eq!(cfg.p, 5);
        assert!(cfg.initial_weights.is_normalized());
    }

    #[test]
    fn test_degenerate_parameters_detected() {
        let cfg = OrganismConfig {
            k: 1,
            p: 1,
            ..OrganismConfig::default()
        };
        assert!(!cfg.is_well_posed());
    }

    #[test]
    fn test_peer_list_parsing() {
        std::env::set_var("SYSTOLE_MESH_PEERS", "127.0.0.1:9401, 127.0.0.1:9402,");
        let cfg = OrganismConfig::load().unwrap();
        std::env::remove_var("SYSTOLE_MESH_PEERS");
        assert_eq!(cfg.mesh.peers.len(), 2);
        assert_eq!(cfg.mesh.peers[1], "127.0.0.1:9402");
    }
}
