//! Anode candidate search.
//!
//! Every key wire group is tested against the three wire patterns. Valid
//! matches go into the chain in wire-group order, neighbours that look like
//! ghosts of each other are flagged then nixed, and the best survivors get
//! track numbers.

use crate::config::AlctConfig;
use crate::constants::NLAYERS;
use crate::error::ExtractError;

use super::{AlctCandidate, AlctChain, AlctChamberHits, AlctPattern};

#[derive(Debug, Clone, Default)]
pub struct AlctExtractor {
    config: AlctConfig,
}

impl AlctExtractor {
    pub fn new(config: AlctConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AlctConfig {
        &self.config
    }

    /// Best pattern at one key wire group, if any reaches `min_layers`.
    pub fn match_kwg(&self, hits: &AlctChamberHits, kwg: usize) -> Option<AlctCandidate> {
        let n_wg = hits.n_wire_groups() as i64;
        let mut best: Option<(usize, AlctPattern, Vec<u8>)> = None;
        for pattern in AlctPattern::PRIORITY {
            // Earliest time per matched layer
            let mut times = Vec::with_capacity(NLAYERS);
            for layer in 0..NLAYERS {
                let earliest = pattern
                    .offsets(layer)
                    .iter()
                    .map(|&off| kwg as i64 + i64::from(off))
                    .filter(|&wg| (0..n_wg).contains(&wg))
                    .filter_map(|wg| hits.occupancy(wg as usize, layer))
                    .min();
                if let Some(t) = earliest {
                    times.push(t);
                }
            }
            let layers = times.len();
            if best.as_ref().map_or(true, |(n, _, _)| layers > *n) {
                best = Some((layers, pattern, times));
            }
        }
        let (layers, pattern, mut times) = best?;
        if layers < self.config.min_layers || layers == 0 {
            return None;
        }
        times.sort_unstable();
        let first_bx = times[0];
        let first_bx_corrected = times.get(1).copied().unwrap_or(first_bx);
        Some(AlctCandidate::new(
            pattern,
            kwg,
            layers as u8,
            first_bx,
            first_bx_corrected,
        ))
    }

    /// All valid matches in key-wire-group order.
    pub fn build_chain(&self, hits: &AlctChamberHits) -> Result<AlctChain, ExtractError> {
        let geometry = hits.id().geometry().ok_or(ExtractError::Geometry(hits.id()))?;
        let mut chain = AlctChain::new(self.config.chain_depth);
        if hits.is_empty() {
            return Ok(chain);
        }
        for kwg in 0..geometry.n_wire_groups {
            let Some(cand) = self.match_kwg(hits, kwg) else {
                continue;
            };
            if let Err(e) = chain.push_back(cand) {
                tracing::debug!(chamber = %hits.id(), kwg, error = %e, "chain full, dropping remaining wire groups");
                break;
            }
        }
        Ok(chain)
    }

    /// Flag the worse of each pair of adjacent key wire groups whose first
    /// bunch crossings are within the ghost window, then nix the flagged.
    /// Flagged nodes still take part in later comparisons. Returns the
    /// number removed.
    pub fn cancel_ghosts(&self, chain: &mut AlctChain) -> usize {
        let handles = chain.handles();
        for pair in handles.windows(2) {
            let (Some(n), Some(m)) = (chain.get(pair[0]).copied(), chain.get(pair[1]).copied()) else {
                continue;
            };
            if m.kwg != n.kwg + 1 || n.first_bx.abs_diff(m.first_bx) > self.config.ghost_window {
                continue;
            }
            let worse = if n.quality >= m.quality { pair[1] } else { pair[0] };
            // Both handles came from `handles()` and nothing is nixed yet.
            let _ = chain.flag(worse);
        }
        chain.nix_flagged()
    }

    /// Build, cancel and select. The chain is returned alongside the
    /// selected candidates, which also carry their track numbers in it.
    pub fn extract_with_chain(&self, hits: &AlctChamberHits) -> Result<(Vec<AlctCandidate>, AlctChain), ExtractError> {
        let mut chain = self.build_chain(hits)?;
        let ghosts = self.cancel_ghosts(&mut chain);

        let mut ranked: Vec<_> = chain.iter_valid().map(|(h, c)| (h, c.quality, c.kwg)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

        let mut selected = Vec::with_capacity(self.config.max_candidates);
        for (track, &(handle, _, _)) in ranked.iter().take(self.config.max_candidates).enumerate() {
            if let Some(cand) = chain.get_mut(handle) {
                cand.track_number = track as u8 + 1;
                selected.push(*cand);
            }
        }
        tracing::debug!(
            chamber = %hits.id(),
            matches = chain.len() + ghosts,
            ghosts,
            selected = selected.len(),
            "extracted ALCTs"
        );
        Ok((selected, chain))
    }

    /// Best anode candidates of a chamber, track number order.
    pub fn extract(&self, hits: &AlctChamberHits) -> Result<Vec<AlctCandidate>, ExtractError> {
        self.extract_with_chain(hits).map(|(selected, _)| selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alct::WireDigi;
    use crate::geometry::ChamberId;

    const ME21: ChamberId = ChamberId::new(2, 1, 1, 4);

    fn straight(kwg: u16, layers: u8, time: u8) -> Vec<WireDigi> {
        (0..layers).map(|l| WireDigi::new(l, kwg, time)).collect()
    }

    fn hits(digis: &[WireDigi]) -> AlctChamberHits {
        let mut h = AlctChamberHits::new(ME21);
        h.fill(digis).unwrap();
        h
    }

    #[test]
    fn test_straight_track() {
        let ex = AlctExtractor::default();
        let h = hits(&straight(50, 6, 4));
        let cand = ex.match_kwg(&h, 50).unwrap();
        assert_eq!(cand.layers, 6);
        assert_eq!(cand.quality, 3);
        assert_eq!(cand.first_bx, 4);
        // All three patterns see six layers; collision A has priority
        assert_eq!(cand.pattern, AlctPattern::CollisionA);
    }

    #[test]
    fn test_first_bx_corrected() {
        let ex = AlctExtractor::default();
        let mut digis = straight(20, 6, 7);
        digis[3].time_bin = 2;
        let cand = ex.match_kwg(&hits(&digis), 20).unwrap();
        assert_eq!(cand.first_bx, 2);
        assert_eq!(cand.first_bx_corrected, 7);
    }

    #[test]
    fn test_collision_pattern_preferred_for_inclined_track() {
        let ex = AlctExtractor::default();
        // Wire groups drift up with layer, following collision A
        let digis: Vec<_> = [(0u8, 28u16), (1, 29), (2, 30), (3, 31), (4, 32), (5, 32)]
            .iter()
            .map(|&(l, wg)| WireDigi::new(l, wg, 0))
            .collect();
        let cand = ex.match_kwg(&hits(&digis), 30).unwrap();
        assert_eq!(cand.pattern, AlctPattern::CollisionA);
        assert_eq!(cand.layers, 6);
    }

    #[test]
    fn test_ghosts_cancelled() {
        let ex = AlctExtractor::default();
        let (selected, chain) = ex.extract_with_chain(&hits(&straight(60, 6, 3))).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].track_number, 1);
        assert_eq!(chain.len(), chain.len_valid());
        // Neighbours all see the same hits; only one survives per cluster
        assert!(chain.iter().all(|(_, c)| c.kwg.abs_diff(60) <= 2));
    }

    #[test]
    fn test_two_tracks() {
        let ex = AlctExtractor::default();
        let mut digis = straight(20, 6, 3);
        digis.extend(straight(80, 4, 5));
        let found = ex.extract(&hits(&digis)).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].track_number, 1);
        assert_eq!(found[0].quality, 3);
        assert!(found[0].kwg.abs_diff(20) <= 2);
        assert_eq!(found[1].track_number, 2);
        assert_eq!(found[1].quality, 1);
        assert!(found[1].kwg.abs_diff(80) <= 2);
    }

    #[test]
    fn test_out_of_time_neighbours_kept() {
        let ex = AlctExtractor::default();
        let mut chain = AlctChain::new(8);
        chain.push_back(AlctCandidate::new(AlctPattern::Accelerator, 10, 5, 0, 0)).unwrap();
        chain.push_back(AlctCandidate::new(AlctPattern::Accelerator, 11, 6, 9, 9)).unwrap();
        chain.push_back(AlctCandidate::new(AlctPattern::Accelerator, 12, 4, 9, 9)).unwrap();
        assert_eq!(ex.cancel_ghosts(&mut chain), 1);
        let kwgs: Vec<_> = chain.iter().map(|(_, c)| c.kwg).collect();
        assert_eq!(kwgs, vec![10, 11]);
    }

    #[test]
    fn test_below_threshold_and_invalid() {
        let ex = AlctExtractor::default();
        assert!(ex.extract(&hits(&straight(40, 3, 0))).unwrap().is_empty());
        assert!(ex.extract(&AlctChamberHits::new(ME21)).unwrap().is_empty());

        let bogus = AlctChamberHits::new(ChamberId::new(1, 1, 3, 1));
        assert!(matches!(ex.extract(&bogus), Err(ExtractError::Geometry(_))));
    }
}
