//! Features - externally sourced per-beat input record
//!
//! Feature collection itself lives outside the core; the beat loop only
//! consumes a flat numeric record per iteration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// External observations ingested at the top of a beat
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Features {
    /// Anomaly count contribution for this beat
    pub anomalies: u64,
    /// Additional named numeric signals, passed through to the cores
    pub metrics: BTreeMap<String, f64>,
}

impl Features {
    /// Features carrying only an anomaly contribution
    pub fn with_anomalies(anomalies: u64) -> Self {
        Self {
            anomalies,
            metrics: BTreeMap::new(),
        }
    }

    /// Look up a named metric
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_lookup() {
        let mut features = Features::with_anomalies(3);
        features.metrics.insert("load".to_string(), 0.7);
        assert_eq!(features.metric("load"), Some(0.7));
        assert_eq!(features.metric("missing"), None);
        assert_eq!(features.anomalies, 3);
    }
}
