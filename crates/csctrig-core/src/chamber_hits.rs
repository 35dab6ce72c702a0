//! Per-chamber cathode occupancy.
//!
//! Hits are stored in a padded frame: column `hs + shift(layer) + PATTERN_PAD`
//! holds half-strip `hs` of `layer`. The pad lets a pattern be laid over any
//! scan offset without bounds arithmetic, and with it the scan offset of a
//! pattern equals the staggered half-strip under its centre column.
//!
//! Each cell stores `time_bin + 1`; zero means empty.

use std::fmt;
use std::ops::SubAssign;

use crate::clct::ClctCandidate;
use crate::constants::{MAX_CFEBS, HALF_STRIPS_PER_CFEB, NLAYERS, PADDED_HALF_STRIPS, PATTERN_PAD};
use crate::error::HitMapError;
use crate::geometry::{ChamberGeometry, ChamberId};
use crate::grid::Grid;

/// Padded occupancy grid, one column per half-strip.
pub type Occupancy = Grid<u8, PADDED_HALF_STRIPS, NLAYERS>;

/// Which raw collection a hit map was filled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitSource {
    Comparator,
    RecHit,
}

/// One fired half-strip comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComparatorDigi {
    /// Layer, 0-based
    pub layer: u8,
    pub half_strip: u16,
    pub time_bin: u8,
}

impl ComparatorDigi {
    pub fn new(layer: u8, half_strip: u16, time_bin: u8) -> Self {
        Self {
            layer,
            half_strip,
            time_bin,
        }
    }

    /// From a strip number and the left/right comparator bit. Out-of-range
    /// strips saturate and are then rejected on fill.
    pub fn from_strip(layer: u8, strip: u16, comparator: u8, time_bin: u8) -> Self {
        Self::new(
            layer,
            strip.saturating_mul(2).saturating_add(u16::from(comparator & 1)),
            time_bin,
        )
    }

    pub fn strip(&self) -> u16 {
        self.half_strip / 2
    }
}

/// A reconstructed cathode hit with a continuous strip coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecHit {
    /// Layer, 0-based
    pub layer: u8,
    /// Position in strips, 0 at the left edge of the first strip
    pub strip_position: f32,
    pub time: u8,
}

impl RecHit {
    pub fn new(layer: u8, strip_position: f32, time: u8) -> Self {
        Self {
            layer,
            strip_position,
            time,
        }
    }

    /// Half-strip containing the hit.
    pub fn half_strip(&self) -> Result<u16, HitMapError> {
        if !self.strip_position.is_finite() || self.strip_position < 0.0 {
            return Err(HitMapError::InvalidPosition(self.strip_position));
        }
        let hs = (self.strip_position * 2.0).floor();
        if hs > f32::from(u16::MAX) {
            return Err(HitMapError::InvalidPosition(self.strip_position));
        }
        Ok(hs as u16)
    }
}

/// Running position statistics over the occupied cells of a hit map.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct HitStats {
    nhits: usize,
    min: Option<usize>,
    max: Option<usize>,
    sum: f64,
    sum_sq: f64,
}

impl HitStats {
    pub(crate) fn add(&mut self, pos: usize) {
        self.nhits += 1;
        self.min = Some(self.min.map_or(pos, |m| m.min(pos)));
        self.max = Some(self.max.map_or(pos, |m| m.max(pos)));
        let p = pos as f64;
        self.sum += p;
        self.sum_sq += p * p;
    }

    pub(crate) fn from_positions(positions: impl IntoIterator<Item = usize>) -> Self {
        let mut stats = Self::default();
        for pos in positions {
            stats.add(pos);
        }
        stats
    }

    pub(crate) fn nhits(&self) -> usize {
        self.nhits
    }

    pub(crate) fn min(&self) -> Option<usize> {
        self.min
    }

    pub(crate) fn max(&self) -> Option<usize> {
        self.max
    }

    pub(crate) fn mean(&self) -> Option<f32> {
        (self.nhits > 0).then(|| (self.sum / self.nhits as f64) as f32)
    }

    pub(crate) fn std(&self) -> Option<f32> {
        if self.nhits == 0 {
            return None;
        }
        let n = self.nhits as f64;
        let mean = self.sum / n;
        let var = (self.sum_sq / n - mean * mean).max(0.0);
        Some(var.sqrt() as f32)
    }
}

/// Cathode hit map for one chamber in one event.
#[derive(Clone)]
pub struct ChamberHits {
    id: ChamberId,
    source: HitSource,
    cells: Occupancy,
    stats: HitStats,
}

impl ChamberHits {
    pub fn new(id: ChamberId, source: HitSource) -> Self {
        Self {
            id,
            source,
            cells: Occupancy::new(),
            stats: HitStats::default(),
        }
    }

    pub fn id(&self) -> ChamberId {
        self.id
    }

    pub fn source(&self) -> HitSource {
        self.source
    }

    pub fn geometry(&self) -> Option<ChamberGeometry> {
        self.id.geometry()
    }

    /// Cathode boards of the chamber (0 for an unknown chamber).
    pub fn n_cfebs(&self) -> usize {
        self.geometry().map_or(0, |g| g.n_cfebs)
    }

    /// Whether `layer` is staggered by one half-strip.
    pub fn shift(&self, layer: usize) -> bool {
        self.id.shift(layer)
    }

    /// Half-strips accepted by `fill_*`.
    fn half_strip_limit(&self) -> usize {
        self.geometry()
            .map_or(MAX_CFEBS * HALF_STRIPS_PER_CFEB, |g| g.n_half_strips)
    }

    fn padded_column(&self, half_strip: usize, layer: usize) -> usize {
        half_strip + usize::from(self.shift(layer)) + PATTERN_PAD
    }

    fn check(&self, layer: u8, half_strip: usize, time_bin: u8) -> Result<(), HitMapError> {
        if usize::from(layer) >= NLAYERS {
            return Err(HitMapError::LayerOutOfRange(layer));
        }
        let max = self.half_strip_limit();
        if half_strip >= max {
            return Err(HitMapError::HalfStripOutOfRange { half_strip, max });
        }
        if time_bin == u8::MAX {
            return Err(HitMapError::TimeBinOutOfRange(time_bin));
        }
        Ok(())
    }

    /// Mark one validated hit. Returns `false` when the cell was already
    /// occupied; the cell then keeps the earlier time.
    fn mark(&mut self, layer: usize, half_strip: usize, time_bin: u8) -> bool {
        let col = self.padded_column(half_strip, layer);
        let Some(cell) = self.cells.get_mut(col, layer) else {
            return false;
        };
        let stored = time_bin + 1;
        if *cell == 0 {
            *cell = stored;
            self.stats.add(half_strip);
            true
        } else {
            *cell = (*cell).min(stored);
            false
        }
    }

    /// Add comparator digis. All digis are validated before any is stored;
    /// returns the number of newly occupied cells.
    pub fn fill_comparators(&mut self, digis: &[ComparatorDigi]) -> Result<usize, HitMapError> {
        for d in digis {
            self.check(d.layer, usize::from(d.half_strip), d.time_bin)?;
        }
        let added = digis
            .iter()
            .filter(|d| self.mark(usize::from(d.layer), usize::from(d.half_strip), d.time_bin))
            .count();
        tracing::trace!(chamber = %self.id, digis = digis.len(), added, "filled comparators");
        Ok(added)
    }

    /// Add reconstructed hits, binned to half-strips.
    pub fn fill_rechits(&mut self, hits: &[RecHit]) -> Result<usize, HitMapError> {
        let mut binned = Vec::with_capacity(hits.len());
        for h in hits {
            let hs = usize::from(h.half_strip()?);
            self.check(h.layer, hs, h.time)?;
            binned.push((usize::from(h.layer), hs, h.time));
        }
        let added = binned
            .into_iter()
            .filter(|&(layer, hs, time)| self.mark(layer, hs, time))
            .count();
        tracing::trace!(chamber = %self.id, rechits = hits.len(), added, "filled rechits");
        Ok(added)
    }

    /// Clear the cells a candidate was built from and recompute the
    /// statistics over what is left. Clearing twice is harmless.
    pub fn subtract(&mut self, candidate: &ClctCandidate) {
        for (col, layer) in candidate.footprint() {
            if let Some(cell) = self.cells.get_mut(col, layer) {
                *cell = 0;
            }
        }
        self.recompute();
    }

    fn recompute(&mut self) {
        let positions: Vec<usize> = self
            .cells
            .cells()
            .filter(|&(_, _, t)| t != 0)
            .map(|(col, layer, _)| self.physical_half_strip(col, layer))
            .collect();
        self.stats = HitStats::from_positions(positions);
    }

    fn physical_half_strip(&self, col: usize, layer: usize) -> usize {
        col.saturating_sub(PATTERN_PAD + usize::from(self.shift(layer)))
    }

    /// Earliest time bin on a physical half-strip, or `None` if empty.
    pub fn occupancy(&self, half_strip: usize, layer: usize) -> Option<u8> {
        if layer >= NLAYERS {
            return None;
        }
        self.padded_time(self.padded_column(half_strip, layer), layer)
    }

    /// Earliest time bin at a padded column.
    #[inline]
    pub fn padded_time(&self, col: usize, layer: usize) -> Option<u8> {
        match self.cells.get(col, layer) {
            Some(0) | None => None,
            Some(t) => Some(t - 1),
        }
    }

    pub fn cells(&self) -> &Occupancy {
        &self.cells
    }

    pub fn nhits(&self) -> usize {
        self.stats.nhits()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.nhits() == 0
    }

    pub fn min_hs(&self) -> Option<usize> {
        self.stats.min()
    }

    pub fn max_hs(&self) -> Option<usize> {
        self.stats.max()
    }

    pub fn mean_hs(&self) -> Option<f32> {
        self.stats.mean()
    }

    pub fn std_hs(&self) -> Option<f32> {
        self.stats.std()
    }
}

impl SubAssign<&ClctCandidate> for ChamberHits {
    fn sub_assign(&mut self, candidate: &ClctCandidate) {
        self.subtract(candidate);
    }
}

impl fmt::Debug for ChamberHits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChamberHits")
            .field("id", &self.id)
            .field("source", &self.source)
            .field("nhits", &self.nhits())
            .field("min_hs", &self.min_hs())
            .field("max_hs", &self.max_hs())
            .finish()
    }
}

/// One row per layer, `-` for empty and the time bin (hex) for a hit.
impl fmt::Display for ChamberHits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {:?} hits={} cfebs={}",
            self.id,
            self.source,
            self.nhits(),
            self.n_cfebs()
        )?;
        let width = self.geometry().map_or(self.half_strip_limit(), |g| g.scan_width());
        for layer in 0..NLAYERS {
            let row: String = (PATTERN_PAD..PATTERN_PAD + width)
                .map(|col| match self.padded_time(col, layer) {
                    None => '-',
                    Some(t) => char::from_digit(u32::from(t), 16).unwrap_or('+'),
                })
                .collect();
            writeln!(f, "ly{} {}", layer, row)?;
        }
        Ok(())
    }
}
