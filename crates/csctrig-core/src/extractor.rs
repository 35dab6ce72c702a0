//! Cathode candidate search: pattern scan, ranking and ghost cancellation.
//!
//! ```text
//!   residual = hits
//!   repeat max_candidates times:
//!       scan residual at every offset with every pattern
//!       keep the best match (if none, stop)
//!       residual -= best
//! ```

use std::sync::Arc;

use crate::catalog::PatternCatalog;
use crate::chamber_hits::ChamberHits;
use crate::clct::{ClctCandidate, Ranking};
use crate::comparator_code::{ComparatorCode, HitMask};
use crate::config::ClctConfig;
use crate::constants::NLAYERS;
use crate::error::{ExtractError, TriggerResult};
use crate::geometry::ChamberId;
use crate::lut::{LinearFitBuilder, Lut, LutLoader};
use crate::pattern::Pattern;

/// Candidates found in one chamber.
#[derive(Debug, Clone)]
pub struct ChamberCandidates {
    pub chamber: ChamberId,
    pub candidates: Vec<ClctCandidate>,
}

/// Cathode extractor sharing a read-only catalog and LUT.
#[derive(Debug, Clone)]
pub struct ClctExtractor {
    catalog: Arc<PatternCatalog>,
    lut: Arc<Lut>,
    config: ClctConfig,
}

impl ClctExtractor {
    pub fn new(catalog: Arc<PatternCatalog>, lut: Arc<Lut>, config: ClctConfig) -> Self {
        Self {
            catalog,
            lut,
            config,
        }
    }

    /// Build the configured catalog and LUT.
    ///
    /// The LUT is read from `lut_path` when given, otherwise it is fitted
    /// from the catalog geometry.
    pub fn from_config(config: &ClctConfig, lut_path: Option<&std::path::Path>) -> TriggerResult<Self> {
        let catalog = config.catalog.build()?;
        let lut = match lut_path {
            Some(path) => {
                let mut loader = LutLoader::new();
                let n = loader.load_file(path)?;
                tracing::info!(path = %path.display(), entries = n, "loaded LUT");
                loader.make_final()
            }
            None => LinearFitBuilder::new(config.min_layers).linear_fits(&catalog)?,
        };
        Ok(Self::new(Arc::new(catalog), Arc::new(lut), config.clone()))
    }

    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    pub fn lut(&self) -> &Lut {
        &self.lut
    }

    pub fn config(&self) -> &ClctConfig {
        &self.config
    }

    pub fn ranking(&self) -> Ranking {
        self.config.ranking
    }

    /// One pass over the hit map: every pattern at every offset that reaches
    /// `min_layers`. Offsets outer, catalog order inner.
    pub fn scan(&self, hits: &ChamberHits) -> Result<Vec<ClctCandidate>, ExtractError> {
        let geometry = hits.geometry().ok_or(ExtractError::Geometry(hits.id()))?;
        let mut found = Vec::new();
        if hits.is_empty() {
            return Ok(found);
        }
        for offset in 0..geometry.scan_width() {
            for pattern in self.catalog.iter() {
                if let Some(candidate) = self.match_at(pattern, hits, offset) {
                    tracing::trace!(
                        chamber = %hits.id(),
                        pattern = pattern.id(),
                        offset,
                        layers = candidate.layer_count(),
                        "pattern matched"
                    );
                    found.push(candidate);
                }
            }
        }
        Ok(found)
    }

    /// Lay `pattern` over the padded frame at `offset`. In each layer the
    /// leftmost occupied template cell is the one reported.
    fn match_at(&self, pattern: &Arc<Pattern>, hits: &ChamberHits, offset: usize) -> Option<ClctCandidate> {
        let mut mask = HitMask::new();
        let mut start_time: Option<u8> = None;
        for layer in 0..NLAYERS {
            for (slot, col) in pattern.cells_in_layer(layer).enumerate() {
                if let Some(t) = hits.padded_time(offset + col, layer) {
                    mask.set(slot, layer, true);
                    start_time = Some(start_time.map_or(t, |s| s.min(t)));
                    break;
                }
            }
        }
        let code = ComparatorCode::from_hits(&mask).ok()?;
        if code.layers_matched() < self.config.min_layers {
            return None;
        }
        Some(ClctCandidate::new(pattern.clone(), offset, start_time?, code).with_lut(&self.lut))
    }

    /// Up to `max_candidates` candidates, best first, each found after
    /// cancelling the hits of the ones before it.
    pub fn extract(&self, hits: &ChamberHits) -> Result<Vec<ClctCandidate>, ExtractError> {
        if hits.geometry().is_none() {
            return Err(ExtractError::Geometry(hits.id()));
        }
        let mut out = Vec::with_capacity(self.config.max_candidates);
        if hits.is_empty() {
            return Ok(out);
        }
        let mut residual = hits.clone();
        while out.len() < self.config.max_candidates {
            let mut found = self.scan(&residual)?;
            let Some(best) = self.config.ranking.best(&found) else {
                break;
            };
            let best = found.swap_remove(best);
            residual -= &best;
            out.push(best);
        }
        tracing::debug!(chamber = %hits.id(), nhits = hits.nhits(), candidates = out.len(), "extracted CLCTs");
        Ok(out)
    }

    /// Extract every chamber of an event. Chambers without geometry are
    /// logged and skipped.
    pub fn extract_event(&self, chambers: &[ChamberHits]) -> Vec<ChamberCandidates> {
        chambers
            .iter()
            .filter_map(|hits| self.extract_chamber(hits))
            .collect()
    }

    pub(crate) fn extract_chamber(&self, hits: &ChamberHits) -> Option<ChamberCandidates> {
        match self.extract(hits) {
            Ok(candidates) => Some(ChamberCandidates {
                chamber: hits.id(),
                candidates,
            }),
            Err(e) => {
                tracing::warn!(chamber = %hits.id(), error = %e, "skipping chamber");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogKind;
    use crate::chamber_hits::{ComparatorDigi, HitSource};
    use crate::clct::Calibration;

    const ME11: ChamberId = ChamberId::new(1, 1, 1, 1);
    const ME22: ChamberId = ChamberId::new(2, 2, 1, 1);

    fn extractor(kind: CatalogKind) -> ClctExtractor {
        let config = ClctConfig {
            catalog: kind,
            ..ClctConfig::default()
        };
        ClctExtractor::from_config(&config, None).unwrap()
    }

    fn vertical(id: ChamberId, hs: u16, time: u8) -> Vec<ComparatorDigi> {
        (0..NLAYERS as u8)
            .map(|layer| {
                let shift = u16::from(id.shift(usize::from(layer)));
                ComparatorDigi::new(layer, hs - shift, time)
            })
            .collect()
    }

    fn chamber(id: ChamberId, digis: &[ComparatorDigi]) -> ChamberHits {
        let mut hits = ChamberHits::new(id, HitSource::Comparator);
        hits.fill_comparators(digis).unwrap();
        hits
    }

    #[test]
    fn test_vertical_track_legacy() {
        let ex = extractor(CatalogKind::Legacy);
        let hits = chamber(ME11, &vertical(ME11, 40, 6));
        let found = ex.extract(&hits).unwrap();
        assert!(!found.is_empty());
        let best = &found[0];
        assert_eq!(best.pattern_id(), 10);
        assert_eq!(best.horizontal_index(), 40);
        assert_eq!(best.layer_count(), 6);
        assert_eq!(best.start_time(), 6);
        assert!(best.slope().unwrap().abs() < 1e-6);
        assert!((best.position().unwrap() - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_vertical_track_staggered_upgrade() {
        let ex = extractor(CatalogKind::Upgrade);
        let hits = chamber(ME22, &vertical(ME22, 60, 3));
        let found = ex.extract(&hits).unwrap();
        let best = &found[0];
        assert_eq!(best.pattern_id(), 100);
        assert_eq!(best.horizontal_index(), 60);
        assert_eq!(best.layer_count(), 6);
        assert!(best.slope().unwrap().abs() < 1e-6);
        assert!((best.position().unwrap() - 30.0).abs() < 1e-6);
    }

    #[test]
    fn test_second_candidate_after_cancellation() {
        let ex = extractor(CatalogKind::Upgrade);
        let mut digis = vertical(ME22, 40, 5);
        // Weaker four-layer track well clear of the first
        digis.extend(vertical(ME22, 100, 5).into_iter().take(4));
        let hits = chamber(ME22, &digis);

        let found = ex.extract(&hits).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].layer_count(), 6);
        assert!((found[0].position().unwrap() - 20.0).abs() < 0.3);
        assert_eq!(found[1].layer_count(), 4);
        assert!((found[1].position().unwrap() - 50.0).abs() < 0.6);
    }

    #[test]
    fn test_vertical_track_upgrade_centred() {
        let ex = ClctExtractor::from_config(&ClctConfig::default(), None).unwrap();
        let found = ex.extract(&chamber(ME11, &vertical(ME11, 40, 2))).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pattern_id(), 100);
        assert_eq!(found[0].key_half_strip(), 40);
        // Centre slot on every layer
        assert_eq!(found[0].comparator_code_id(), Some(2730));
        assert!((found[0].position().unwrap() - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_overlapping_tracks_second_pass() {
        let ex = ClctExtractor::from_config(&ClctConfig::default(), None).unwrap();
        let mut digis = vertical(ME11, 40, 4);
        // Four-layer track two half-strips over, inside the first one's envelope
        digis.extend(vertical(ME11, 42, 4).into_iter().take(4));
        let found = ex.extract(&chamber(ME11, &digis)).unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].layer_count(), 6);
        assert_eq!(found[0].key_half_strip(), 40);
        assert!((found[0].position().unwrap() - 20.0).abs() < 1e-6);

        assert_eq!(found[1].layer_count(), 4);
        assert_eq!(found[1].key_half_strip(), 42);
        assert!((found[1].position().unwrap() - 21.0).abs() < 1e-6);
    }

    #[test]
    fn test_single_track_is_not_found_twice() {
        let ex = extractor(CatalogKind::Upgrade);
        let hits = chamber(ME22, &vertical(ME22, 80, 0));
        let found = ex.extract(&hits).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_below_threshold_and_empty() {
        let ex = extractor(CatalogKind::Upgrade);
        let hits = chamber(ME22, &vertical(ME22, 40, 0)[..2]);
        assert!(ex.extract(&hits).unwrap().is_empty());

        let empty = ChamberHits::new(ME22, HitSource::Comparator);
        assert!(ex.extract(&empty).unwrap().is_empty());
        assert!(ex.scan(&empty).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_geometry() {
        let ex = extractor(CatalogKind::Upgrade);
        let bogus = ChamberHits::new(ChamberId::new(5, 1, 1, 1), HitSource::Comparator);
        assert_eq!(
            ex.extract(&bogus).unwrap_err(),
            ExtractError::Geometry(ChamberId::new(5, 1, 1, 1))
        );

        let good = chamber(ME22, &vertical(ME22, 40, 0));
        let event = ex.extract_event(&[bogus, good]);
        assert_eq!(event.len(), 1);
        assert_eq!(event[0].chamber, ME22);
    }

    #[test]
    fn test_uncalibrated_without_lut() {
        let catalog = CatalogKind::Upgrade.build().unwrap();
        let ex = ClctExtractor::new(Arc::new(catalog), Arc::new(Lut::empty()), ClctConfig::default());
        let hits = chamber(ME22, &vertical(ME22, 40, 0));
        let found = ex.extract(&hits).unwrap();
        assert!(!found.is_empty());
        assert_eq!(found[0].calibration(), Calibration::Uncalibrated);
        assert_eq!(found[0].layer_count(), 6);
    }

    #[test]
    fn test_max_candidates() {
        let config = ClctConfig {
            max_candidates: 1,
            ..ClctConfig::default()
        };
        let ex = ClctExtractor::from_config(&config, None).unwrap();
        let mut digis = vertical(ME22, 40, 0);
        digis.extend(vertical(ME22, 100, 0));
        assert_eq!(ex.extract(&chamber(ME22, &digis)).unwrap().len(), 1);
    }
}
