//! Anode (wire-group) trigger: candidates, their chain, hit map and search.
//!
//! Wire patterns are narrow. The accelerator pattern looks straight down the
//! key wire group; the two collision patterns open outward towards one side,
//! following tracks from the interaction point.
//!
//! ```text
//!   accelerator    collision A     collision B
//!   ly0   x          xxx               xxx
//!   ly1   x           xx               xx
//!   ly2   x            x               x
//!   ly3   x            xx             xx
//!   ly4   x            xxx           xxx
//!   ly5   x            xxx           xxx
//! ```

pub mod chain;
pub mod extractor;
pub mod hits;

pub use chain::{AlctChain, Handle};
pub use extractor::AlctExtractor;
pub use hits::{AlctChamberHits, WireDigi};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::NLAYERS;

/// Wire-group offsets, relative to the key wire group, per layer.
type Envelope = [&'static [i32]; NLAYERS];

const ACCELERATOR: Envelope = [&[0], &[0], &[0], &[0], &[0], &[0]];
const COLLISION_A: Envelope = [&[-2, -1, 0], &[-1, 0], &[0], &[0, 1], &[0, 1, 2], &[0, 1, 2]];
const COLLISION_B: Envelope = [&[0, 1, 2], &[0, 1], &[0], &[-1, 0], &[-2, -1, 0], &[-2, -1, 0]];

/// Anode pattern type, numbered as in the trigger data format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlctPattern {
    Accelerator = 0,
    CollisionA = 1,
    CollisionB = 2,
}

impl AlctPattern {
    /// Patterns in match priority: on equal layer counts the earlier wins.
    pub const PRIORITY: [AlctPattern; 3] = [
        AlctPattern::CollisionA,
        AlctPattern::CollisionB,
        AlctPattern::Accelerator,
    ];

    pub fn id(self) -> u8 {
        self as u8
    }

    /// Offsets from the key wire group covered on `layer`.
    pub fn offsets(self, layer: usize) -> &'static [i32] {
        let envelope = match self {
            AlctPattern::Accelerator => &ACCELERATOR,
            AlctPattern::CollisionA => &COLLISION_A,
            AlctPattern::CollisionB => &COLLISION_B,
        };
        envelope.get(layer).copied().unwrap_or(&[])
    }

    pub fn is_collision(self) -> bool {
        !matches!(self, AlctPattern::Accelerator)
    }
}

/// An anode track-segment candidate at one key wire group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlctCandidate {
    pub pattern: AlctPattern,
    /// 1-based slot once selected, 0 before
    pub track_number: u8,
    /// Key wire group
    pub kwg: usize,
    /// Earliest hit time among the matched layers
    pub first_bx: u8,
    /// Second-earliest layer time, robust against one early noise hit
    pub first_bx_corrected: u8,
    /// Layer count minus three
    pub quality: u8,
    pub layers: u8,
    valid: bool,
}

impl AlctCandidate {
    pub fn new(pattern: AlctPattern, kwg: usize, layers: u8, first_bx: u8, first_bx_corrected: u8) -> Self {
        Self {
            pattern,
            track_number: 0,
            kwg,
            first_bx,
            first_bx_corrected,
            quality: layers.saturating_sub(3),
            layers,
            valid: true,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Mark invalid in place.
    pub fn flag(&mut self) {
        self.valid = false;
    }
}

impl fmt::Display for AlctCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "alct #{} {:?} kwg={} bx={} bx_corr={} q={}{}",
            self.track_number,
            self.pattern,
            self.kwg,
            self.first_bx,
            self.first_bx_corrected,
            self.quality,
            if self.valid { "" } else { " (flagged)" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collision_patterns_mirror() {
        for layer in 0..NLAYERS {
            let mut a: Vec<i32> = AlctPattern::CollisionA.offsets(layer).iter().map(|o| -o).collect();
            a.sort_unstable();
            assert_eq!(a, AlctPattern::CollisionB.offsets(layer));
        }
        assert!(AlctPattern::CollisionA.offsets(NLAYERS).is_empty());
    }

    #[test]
    fn test_candidate_quality_and_flag() {
        let mut cand = AlctCandidate::new(AlctPattern::CollisionA, 30, 6, 4, 5);
        assert_eq!(cand.quality, 3);
        assert!(cand.is_valid());
        cand.flag();
        assert!(!cand.is_valid());
        assert!(cand.to_string().contains("flagged"));
        assert_eq!(AlctCandidate::new(AlctPattern::Accelerator, 0, 2, 0, 0).quality, 0);
    }
}
