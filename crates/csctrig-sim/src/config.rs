//! Scenario configuration

use csctrig_core::ChamberId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid generator settings
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("chamber {0} has no valid geometry")]
    Geometry(ChamberId),

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// How individual tracks are drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    /// Largest |slope| in strips per layer
    pub max_slope: f64,
    /// Probability that a layer records the track
    pub layer_efficiency: f64,
    /// Gaussian smear of reconstructed positions, in strips
    pub position_smear: f64,
    /// Time bin of the earliest layer
    pub time_bin: u8,
    /// Extra per-layer delay drawn uniformly from `0..=time_jitter`
    pub time_jitter: u8,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            max_slope: 0.5,
            layer_efficiency: 1.0,
            position_smear: 0.0,
            time_bin: 7,
            time_jitter: 0,
        }
    }
}

/// Configuration for the scenario engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub chamber: ChamberId,
    /// Muon tracks per event
    pub tracks_per_event: usize,
    /// Mean number of uncorrelated noise hits per layer (Poisson)
    pub noise_per_layer: f64,
    /// Keep drawn tracks at least this many strips from the chamber edges
    pub edge_margin: f64,
    pub track: TrackConfig,
    /// Random seed for reproducibility
    pub seed: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            chamber: ChamberId::new(2, 2, 1, 9),
            tracks_per_event: 1,
            noise_per_layer: 0.0,
            edge_margin: 4.0,
            track: TrackConfig::default(),
            seed: 42,
        }
    }
}

impl ScenarioConfig {
    /// Check ranges before building an engine.
    pub fn validate(&self) -> Result<(), SimError> {
        let geometry = self.chamber.geometry().ok_or(SimError::Geometry(self.chamber))?;
        let strips = (geometry.n_half_strips / 2) as f64;
        if !(0.0..=1.0).contains(&self.track.layer_efficiency) {
            return Err(invalid("layer_efficiency", "must lie in [0, 1]"));
        }
        if !self.track.max_slope.is_finite() || self.track.max_slope < 0.0 {
            return Err(invalid("max_slope", "must be finite and non-negative"));
        }
        if !self.track.position_smear.is_finite() || self.track.position_smear < 0.0 {
            return Err(invalid("position_smear", "must be finite and non-negative"));
        }
        if !self.noise_per_layer.is_finite() || self.noise_per_layer < 0.0 {
            return Err(invalid("noise_per_layer", "must be finite and non-negative"));
        }
        if !(0.0..strips / 2.0).contains(&self.edge_margin) {
            return Err(invalid("edge_margin", format!("must lie in [0, {})", strips / 2.0)));
        }
        if u16::from(self.track.time_bin) + u16::from(self.track.time_jitter) >= 255 {
            return Err(invalid("time_jitter", "time bins must stay below 255"));
        }
        Ok(())
    }

    /// Strip range a track's key position is drawn from.
    pub fn key_range(&self) -> Option<(f64, f64)> {
        let geometry = self.chamber.geometry()?;
        let strips = (geometry.n_half_strips / 2) as f64;
        Some((self.edge_margin, strips - self.edge_margin))
    }
}

fn invalid(name: &'static str, reason: impl Into<String>) -> SimError {
    SimError::InvalidParameter {
        name,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = ScenarioConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.key_range(), Some((4.0, 76.0)));
    }

    #[test]
    fn test_rejects_bad_chamber() {
        let cfg = ScenarioConfig {
            chamber: ChamberId::new(9, 1, 1, 1),
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(SimError::Geometry(_))));
        assert_eq!(cfg.key_range(), None);
    }

    #[test]
    fn test_rejects_bad_efficiency() {
        let mut cfg = ScenarioConfig::default();
        cfg.track.layer_efficiency = 1.5;
        assert!(matches!(
            cfg.validate(),
            Err(SimError::InvalidParameter { name: "layer_efficiency", .. })
        ));
    }

    #[test]
    fn test_rejects_wide_margin() {
        let cfg = ScenarioConfig {
            edge_margin: 50.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
