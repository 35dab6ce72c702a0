//! Chamber identification and readout geometry.
//!
//! Chambers are named `ME<endcap><station>/<ring>/<chamber>`. The geometry
//! table below covers every ring of the four endcap stations; ME1/1 is
//! reported under ring 1 (ME1/1b) and ring 4 (ME1/1a) and shares one
//! seven-CFEB readout.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{HALF_STRIPS_PER_CFEB, NLAYERS};

/// Identifies one chamber in the endcap muon system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChamberId {
    /// Station 1-4
    pub station: u8,
    /// Ring 1-3 (4 for ME1/1a)
    pub ring: u8,
    /// Endcap 1 (+z) or 2 (-z)
    pub endcap: u8,
    /// Chamber number within the ring, 1-36 (1-18 on ME2/1, ME3/1, ME4/1)
    pub chamber: u8,
}

/// Readout dimensions of a chamber type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChamberGeometry {
    /// Cathode front-end boards
    pub n_cfebs: usize,
    /// Comparator half-strips (before stagger)
    pub n_half_strips: usize,
    /// Anode wire groups
    pub n_wire_groups: usize,
    /// Whether odd/even layers are staggered by one half-strip
    pub staggered: bool,
}

impl ChamberId {
    pub const fn new(station: u8, ring: u8, endcap: u8, chamber: u8) -> Self {
        Self {
            station,
            ring,
            endcap,
            chamber,
        }
    }

    /// ME1/1, in either its `a` (ring 4) or `b` (ring 1) half.
    pub fn is_me11(&self) -> bool {
        self.station == 1 && (self.ring == 1 || self.ring == 4)
    }

    /// Readout dimensions, or `None` for a combination that does not exist.
    pub fn geometry(&self) -> Option<ChamberGeometry> {
        if !(1..=2).contains(&self.endcap) {
            return None;
        }
        let (n_cfebs, n_wire_groups, max_chamber) = match (self.station, self.ring) {
            (1, 1) | (1, 4) => (7, 48, 36),
            (1, 2) => (5, 64, 36),
            (1, 3) => (4, 32, 36),
            (2, 1) => (5, 112, 18),
            (3, 1) | (4, 1) => (5, 96, 18),
            (2, 2) | (3, 2) | (4, 2) => (5, 64, 36),
            _ => return None,
        };
        if self.chamber == 0 || self.chamber > max_chamber {
            return None;
        }
        Some(ChamberGeometry {
            n_cfebs,
            n_half_strips: n_cfebs * HALF_STRIPS_PER_CFEB,
            n_wire_groups,
            staggered: !self.is_me11(),
        })
    }

    /// Whether `layer` is offset by one half-strip in the staggered
    /// cathode plane. Layers 0, 2 and 4 are shifted everywhere except ME1/1.
    pub fn shift(&self, layer: usize) -> bool {
        layer < NLAYERS && layer % 2 == 0 && !self.is_me11()
    }

    /// Stable dense index used as the chamber id in flattened outputs.
    pub fn index(&self) -> u32 {
        let endcap = u32::from(self.endcap.saturating_sub(1));
        let station = u32::from(self.station.saturating_sub(1));
        let ring = u32::from(self.ring.saturating_sub(1));
        let chamber = u32::from(self.chamber.saturating_sub(1));
        ((endcap * 4 + station) * 4 + ring) * 36 + chamber
    }
}

impl ChamberGeometry {
    /// Horizontal indices a pattern scan visits: every half-strip, plus the
    /// stagger column on staggered chambers.
    pub fn scan_width(&self) -> usize {
        self.n_half_strips + usize::from(self.staggered)
    }
}

impl fmt::Display for ChamberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.endcap == 2 { '-' } else { '+' };
        write!(
            f,
            "ME{}{}/{}/{}",
            sign, self.station, self.ring, self.chamber
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_me11_geometry() {
        let id = ChamberId::new(1, 1, 1, 10);
        let geo = id.geometry().unwrap();
        assert_eq!(geo.n_cfebs, 7);
        assert_eq!(geo.n_half_strips, 224);
        assert!(!geo.staggered);
        assert_eq!(geo.scan_width(), 224);
        assert!((0..NLAYERS).all(|l| !id.shift(l)));
    }

    #[test]
    fn test_staggered_layers() {
        let id = ChamberId::new(2, 2, 2, 5);
        assert!(id.shift(0));
        assert!(!id.shift(1));
        assert!(id.shift(4));
        assert!(!id.shift(6));
        assert_eq!(id.geometry().unwrap().scan_width(), 161);
    }

    #[test]
    fn test_invalid_geometry() {
        assert!(ChamberId::new(5, 1, 1, 1).geometry().is_none());
        assert!(ChamberId::new(2, 3, 1, 1).geometry().is_none());
        assert!(ChamberId::new(2, 1, 1, 19).geometry().is_none());
        assert!(ChamberId::new(1, 2, 3, 1).geometry().is_none());
        assert!(ChamberId::new(1, 2, 1, 0).geometry().is_none());
    }

    #[test]
    fn test_index_unique() {
        let mut seen = std::collections::HashSet::new();
        for endcap in 1..=2 {
            for station in 1..=4 {
                for ring in 1..=4 {
                    for chamber in 1..=36 {
                        let id = ChamberId::new(station, ring, endcap, chamber);
                        assert!(seen.insert(id.index()));
                    }
                }
            }
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(ChamberId::new(1, 1, 2, 7).to_string(), "ME-1/1/7");
        assert_eq!(ChamberId::new(3, 2, 1, 30).to_string(), "ME+3/2/30");
    }
}
