//! Feature input seam
//!
//! Where features come from is outside the core's scope; the beat loop
//! only asks a [`FeatureSource`] for one record per beat.

use systole_common::Features;

/// Per-beat provider of external observations
pub trait FeatureSource: Send + Sync {
    /// Produce the features for the given beat
    fn collect(&self, beat_index: u64) -> Features;
}

/// Source that reports nothing; the default when no collector is wired
pub struct NullFeatureSource;

impl FeatureSource for NullFeatureSource {
    fn collect(&self, _beat_index: u64) -> Features {
        Features::default()
    }
}

/// Source that replays the same record every beat
pub struct StaticFeatureSource {
    features: Features,
}

impl StaticFeatureSource {
    pub fn new(features: Features) -> Self {
        Self { features }
    }
}

impl FeatureSource for StaticFeatureSource {
    fn collect(&self, _beat_index: u64) -> Features {
        self.features.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_source_is_empty() {
        let features = NullFeatureSource.collect(3);
        assert_eq!(features.anomalies, 0);
        assert!(features.metrics.is_empty());
    }

    #[test]
    fn test_static_source_replays() {
        let source = StaticFeatureSource::new(Features::with_anomalies(5));
        assert_eq!(source.collect(0).anomalies, 5);
        assert_eq!(source.collect(7).anomalies, 5);
    }
}
