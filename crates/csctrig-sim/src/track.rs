//! Straight muon tracks and their per-layer digis.
//!
//! Positions are in strips, measured in the staggered frame the extractor
//! fits in: a hit on staggered half-strip `u` sits at `u / 2` strips, and a
//! shifted layer reads that half-strip as `u - 1`.

use csctrig_core::constants::{KEY_LAYER, NLAYERS};
use csctrig_core::{ChamberId, ComparatorDigi, RecHit, WireDigi};
use serde::{Deserialize, Serialize};

/// One generated muon crossing a chamber.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MuonTrack {
    /// Position at the key layer, in strips
    pub key_strip: f64,
    /// Strips per layer
    pub slope: f64,
    pub key_wire_group: u16,
    /// Time bin of the earliest layer
    pub time_bin: u8,
}

impl MuonTrack {
    pub fn new(key_strip: f64, slope: f64, key_wire_group: u16, time_bin: u8) -> Self {
        Self {
            key_strip,
            slope,
            key_wire_group,
            time_bin,
        }
    }

    /// Track position on `layer` in the staggered frame.
    pub fn position(&self, layer: usize) -> f64 {
        self.key_strip + self.slope * (layer as f64 - KEY_LAYER as f64)
    }

    /// Staggered half-strip the track crosses on `layer`.
    fn staggered_half_strip(&self, layer: usize) -> i64 {
        (self.position(layer) * 2.0).floor() as i64
    }

    /// Readout half-strip on `layer`, or `None` outside the chamber.
    pub fn half_strip(&self, chamber: ChamberId, layer: usize) -> Option<u16> {
        let geometry = chamber.geometry()?;
        if layer >= NLAYERS {
            return None;
        }
        let hs = self.staggered_half_strip(layer) - i64::from(chamber.shift(layer));
        (0..geometry.n_half_strips as i64)
            .contains(&hs)
            .then_some(hs as u16)
    }

    pub fn comparator(&self, chamber: ChamberId, layer: usize, time_bin: u8) -> Option<ComparatorDigi> {
        self.half_strip(chamber, layer)
            .map(|hs| ComparatorDigi::new(layer as u8, hs, time_bin))
    }

    /// Reconstructed hit in the layer's own strip coordinate, displaced
    /// by `smear` strips.
    pub fn rechit(&self, chamber: ChamberId, layer: usize, time_bin: u8, smear: f64) -> Option<RecHit> {
        let geometry = chamber.geometry()?;
        if layer >= NLAYERS {
            return None;
        }
        let position = self.position(layer) - 0.5 * f64::from(u8::from(chamber.shift(layer))) + smear;
        let strips = (geometry.n_half_strips / 2) as f64;
        (0.0..strips)
            .contains(&position)
            .then(|| RecHit::new(layer as u8, position as f32, time_bin))
    }

    pub fn wire(&self, chamber: ChamberId, layer: usize, time_bin: u8) -> Option<WireDigi> {
        let geometry = chamber.geometry()?;
        (layer < NLAYERS && usize::from(self.key_wire_group) < geometry.n_wire_groups)
            .then(|| WireDigi::new(layer as u8, self.key_wire_group, time_bin))
    }

    /// Comparator digis on every layer at the track's own time bin.
    pub fn comparators(&self, chamber: ChamberId) -> Vec<ComparatorDigi> {
        (0..NLAYERS)
            .filter_map(|layer| self.comparator(chamber, layer, self.time_bin))
            .collect()
    }

    pub fn wires(&self, chamber: ChamberId) -> Vec<WireDigi> {
        (0..NLAYERS)
            .filter_map(|layer| self.wire(chamber, layer, self.time_bin))
            .collect()
    }
}
