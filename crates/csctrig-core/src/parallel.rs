//! Parallel Processing Module
//!
//! Chambers of one event are independent: each has its own hit map and
//! candidate list, and the catalog and LUT are read-only once built. This
//! module fans chambers (or whole events) out over a Rayon pool.
//! Enable with the `parallel` feature flag (on by default).
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! csctrig-core = { version = "0.1", features = ["parallel"] }
//! ```
//!
//! ## Performance Considerations
//!
//! A single chamber scan is a few thousand pattern placements, so the pool
//! overhead only pays off for events with many hit chambers or for batches
//! of events.

use rayon::prelude::*;

use crate::alct::{AlctCandidate, AlctChamberHits, AlctExtractor};
use crate::chamber_hits::ChamberHits;
use crate::extractor::{ChamberCandidates, ClctExtractor};
use crate::geometry::ChamberId;

/// Cathode candidates for every chamber of an event, in input order.
/// Chambers without geometry are logged and skipped.
pub fn extract_chambers(extractor: &ClctExtractor, chambers: &[ChamberHits]) -> Vec<ChamberCandidates> {
    chambers
        .par_iter()
        .filter_map(|hits| extractor.extract_chamber(hits))
        .collect()
}

/// Cathode candidates for a batch of events.
pub fn extract_events(extractor: &ClctExtractor, events: &[Vec<ChamberHits>]) -> Vec<Vec<ChamberCandidates>> {
    events
        .par_iter()
        .map(|chambers| extractor.extract_event(chambers))
        .collect()
}

/// Anode candidates for every chamber of an event, in input order.
pub fn extract_anode_chambers(
    extractor: &AlctExtractor,
    chambers: &[AlctChamberHits],
) -> Vec<(ChamberId, Vec<AlctCandidate>)> {
    chambers
        .par_iter()
        .filter_map(|hits| match extractor.extract(hits) {
            Ok(found) => Some((hits.id(), found)),
            Err(e) => {
                tracing::warn!(chamber = %hits.id(), error = %e, "skipping chamber");
                None
            }
        })
        .collect()
}
