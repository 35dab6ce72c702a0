//! Both trigger halves behind one configuration.

use crate::alct::{AlctCandidate, AlctChamberHits, AlctExtractor};
use crate::chamber_hits::ChamberHits;
use crate::config::TriggerConfig;
use crate::error::TriggerResult;
use crate::extractor::{ChamberCandidates, ClctExtractor};
use crate::geometry::ChamberId;

/// Candidates of one event.
#[derive(Debug, Clone, Default)]
pub struct EventCandidates {
    pub clct: Vec<ChamberCandidates>,
    pub alct: Vec<(ChamberId, Vec<AlctCandidate>)>,
}

/// Cathode and anode extractors built from a [`TriggerConfig`].
#[derive(Debug, Clone)]
pub struct TriggerEmulator {
    clct: ClctExtractor,
    alct: AlctExtractor,
}

impl TriggerEmulator {
    /// Validate `config`, then build the catalog and LUT. Any failure here
    /// is a configuration error.
    pub fn from_config(config: &TriggerConfig) -> TriggerResult<Self> {
        config.validate()?;
        let clct = ClctExtractor::from_config(&config.clct, config.lut.path.as_deref())?;
        tracing::info!(
            patterns = clct.catalog().len(),
            lut_entries = clct.lut().len(),
            "trigger emulator ready"
        );
        Ok(Self {
            clct,
            alct: AlctExtractor::new(config.alct.clone()),
        })
    }

    pub fn clct(&self) -> &ClctExtractor {
        &self.clct
    }

    pub fn alct(&self) -> &AlctExtractor {
        &self.alct
    }

    /// Run both searches over one event.
    pub fn process(&self, cathodes: &[ChamberHits], anodes: &[AlctChamberHits]) -> EventCandidates {
        #[cfg(feature = "parallel")]
        {
            let (clct, alct) = rayon::join(
                || crate::parallel::extract_chambers(&self.clct, cathodes),
                || crate::parallel::extract_anode_chambers(&self.alct, anodes),
            );
            EventCandidates { clct, alct }
        }
        #[cfg(not(feature = "parallel"))]
        {
            let alct = anodes
                .iter()
                .filter_map(|hits| match self.alct.extract(hits) {
                    Ok(found) => Some((hits.id(), found)),
                    Err(e) => {
                        tracing::warn!(chamber = %hits.id(), error = %e, "skipping chamber");
                        None
                    }
                })
                .collect();
            EventCandidates {
                clct: self.clct.extract_event(cathodes),
                alct,
            }
        }
    }
}
