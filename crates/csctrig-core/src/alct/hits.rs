//! Per-chamber anode occupancy over key wire groups.

use std::fmt;

use crate::chamber_hits::HitStats;
use crate::constants::{NLAYERS, N_KEY_WIRE_GROUPS, WIRE_HIT_PERSISTENCE};
use crate::error::HitMapError;
use crate::geometry::ChamberId;
use crate::grid::Grid;

/// One fired wire group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireDigi {
    /// Layer, 0-based
    pub layer: u8,
    pub wire_group: u16,
    pub time_bin: u8,
}

impl WireDigi {
    pub fn new(layer: u8, wire_group: u16, time_bin: u8) -> Self {
        Self {
            layer,
            wire_group,
            time_bin,
        }
    }
}

/// Anode hit map. Cells store `time_bin + 1`, zero for empty.
#[derive(Clone)]
pub struct AlctChamberHits {
    id: ChamberId,
    cells: Grid<u8, N_KEY_WIRE_GROUPS, NLAYERS>,
    stats: HitStats,
}

impl AlctChamberHits {
    pub fn new(id: ChamberId) -> Self {
        Self {
            id,
            cells: Grid::new(),
            stats: HitStats::default(),
        }
    }

    pub fn id(&self) -> ChamberId {
        self.id
    }

    /// Wire groups read out (0 for an unknown chamber).
    pub fn n_wire_groups(&self) -> usize {
        self.id.geometry().map_or(0, |g| g.n_wire_groups)
    }

    fn check(&self, digi: &WireDigi) -> Result<(), HitMapError> {
        if usize::from(digi.layer) >= NLAYERS {
            return Err(HitMapError::LayerOutOfRange(digi.layer));
        }
        let max = self
            .id
            .geometry()
            .map_or(N_KEY_WIRE_GROUPS, |g| g.n_wire_groups);
        let wire_group = usize::from(digi.wire_group);
        if wire_group >= max {
            return Err(HitMapError::WireGroupOutOfRange { wire_group, max });
        }
        if digi.time_bin == u8::MAX {
            return Err(HitMapError::TimeBinOutOfRange(digi.time_bin));
        }
        Ok(())
    }

    fn mark(&mut self, digi: &WireDigi) -> bool {
        let wg = usize::from(digi.wire_group);
        let Some(cell) = self.cells.get_mut(wg, usize::from(digi.layer)) else {
            return false;
        };
        let stored = digi.time_bin + 1;
        if *cell == 0 {
            *cell = stored;
            self.stats.add(wg);
            true
        } else {
            *cell = (*cell).min(stored);
            false
        }
    }

    /// Add every digi; returns newly occupied cells.
    pub fn fill(&mut self, digis: &[WireDigi]) -> Result<usize, HitMapError> {
        for d in digis {
            self.check(d)?;
        }
        Ok(digis.iter().filter(|d| self.mark(d)).count())
    }

    /// Add the digis still asserted at bunch crossing `bx`: fired at or
    /// before `bx` and within the hit persistence window.
    pub fn fill_at_time(&mut self, digis: &[WireDigi], bx: u8) -> Result<usize, HitMapError> {
        for d in digis {
            self.check(d)?;
        }
        Ok(digis
            .iter()
            .filter(|d| d.time_bin <= bx && bx - d.time_bin < WIRE_HIT_PERSISTENCE)
            .filter(|d| self.mark(d))
            .count())
    }

    /// Earliest time bin on a wire group, or `None` if empty.
    pub fn occupancy(&self, wire_group: usize, layer: usize) -> Option<u8> {
        match self.cells.get(wire_group, layer) {
            Some(0) | None => None,
            Some(t) => Some(t - 1),
        }
    }

    pub fn nhits(&self) -> usize {
        self.stats.nhits()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.nhits() == 0
    }

    pub fn min_wg(&self) -> Option<usize> {
        self.stats.min()
    }

    pub fn max_wg(&self) -> Option<usize> {
        self.stats.max()
    }

    pub fn mean_wg(&self) -> Option<f32> {
        self.stats.mean()
    }

    pub fn std_wg(&self) -> Option<f32> {
        self.stats.std()
    }
}

impl fmt::Debug for AlctChamberHits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlctChamberHits")
            .field("id", &self.id)
            .field("nhits", &self.nhits())
            .field("min_wg", &self.min_wg())
            .field("max_wg", &self.max_wg())
            .finish()
    }
}

impl fmt::Display for AlctChamberHits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} wires hits={}", self.id, self.nhits())?;
        let width = match self.n_wire_groups() {
            0 => N_KEY_WIRE_GROUPS,
            n => n,
        };
        for layer in 0..NLAYERS {
            let row: String = (0..width)
                .map(|wg| match self.occupancy(wg, layer) {
                    None => '-',
                    Some(t) => char::from_digit(u32::from(t), 16).unwrap_or('+'),
                })
                .collect();
            writeln!(f, "ly{} {}", layer, row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ME11: ChamberId = ChamberId::new(1, 1, 1, 2);

    #[test]
    fn test_fill_and_stats() {
        let mut hits = AlctChamberHits::new(ME11);
        assert_eq!(hits.n_wire_groups(), 48);
        let digis = [WireDigi::new(0, 10, 3), WireDigi::new(1, 12, 3), WireDigi::new(1, 12, 2)];
        assert_eq!(hits.fill(&digis).unwrap(), 2);
        assert_eq!(hits.occupancy(12, 1), Some(2));
        assert_eq!(hits.min_wg(), Some(10));
        assert_eq!(hits.max_wg(), Some(12));
        assert!((hits.mean_wg().unwrap() - 11.0).abs() < 1e-5);
        assert!((hits.std_wg().unwrap() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_out_of_range() {
        let mut hits = AlctChamberHits::new(ME11);
        assert_eq!(
            hits.fill(&[WireDigi::new(0, 48, 0)]),
            Err(HitMapError::WireGroupOutOfRange { wire_group: 48, max: 48 })
        );
        assert_eq!(
            hits.fill(&[WireDigi::new(9, 1, 0)]),
            Err(HitMapError::LayerOutOfRange(9))
        );
        assert!(hits.is_empty());
    }

    #[test]
    fn test_fill_at_time_window() {
        let digis = [
            WireDigi::new(0, 5, 2),
            WireDigi::new(1, 5, 8),
            WireDigi::new(2, 5, 9),
            WireDigi::new(3, 5, 3),
        ];
        let mut hits = AlctChamberHits::new(ME11);
        // bx 8 sees times 3..=8
        assert_eq!(hits.fill_at_time(&digis, 8).unwrap(), 2);
        assert_eq!(hits.occupancy(5, 0), None);
        assert_eq!(hits.occupancy(5, 1), Some(8));
        assert_eq!(hits.occupancy(5, 2), None);
        assert_eq!(hits.occupancy(5, 3), Some(3));
    }
}
