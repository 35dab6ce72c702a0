//! # CSC Trigger Emulation Core
//!
//! Software emulation of the local trigger of the CMS Cathode Strip
//! Chambers. For every chamber of an event the cathode side scans the
//! half-strip hit map with a catalog of bend patterns, encodes which cells of
//! each matched pattern fired as a comparator code, and calibrates the match
//! through a lookup table of straight-line fits. The anode side does the same
//! on wire groups and keeps its candidates in a bounded linked chain.
//!
//! ## Overview
//!
//! - **Comparator codes**: one base-4 digit per layer ([`ComparatorCode`])
//! - **Patterns**: 11 × 6 acceptance templates and their mirror images ([`PatternCatalog`])
//! - **LUT**: (pattern, code) → position, slope, chi2 ([`LutLoader`], [`Lut`])
//! - **Hit maps**: staggered, padded occupancy with cancellation ([`ChamberHits`])
//! - **Cathode search**: scan, rank, cancel, repeat ([`ClctExtractor`])
//! - **Anode search**: wire patterns, ghost flagging, chain ([`alct`])
//!
//! ## Signal Flow
//!
//! ```text
//! digis → ChamberHits → scan(patterns × offsets) → ComparatorCode → Lut → ClctCandidate
//!                ▲                                                           │
//!                └──────────────── residual -= best ◀────────────────────────┘
//!
//! wires → AlctChamberHits → match kwg → AlctChain → flag ghosts → nix → track numbers
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use csctrig_core::prelude::*;
//!
//! let emulator = TriggerEmulator::from_config(&TriggerConfig::default())?;
//!
//! let id = ChamberId::new(2, 2, 1, 7);
//! let mut hits = ChamberHits::new(id, HitSource::Comparator);
//! hits.fill_comparators(&[
//!     ComparatorDigi::new(0, 40, 6),
//!     ComparatorDigi::new(1, 41, 6),
//!     ComparatorDigi::new(2, 40, 7),
//!     ComparatorDigi::new(3, 41, 7),
//! ])?;
//!
//! for candidate in emulator.clct().extract(&hits)? {
//!     println!("{}", candidate);
//! }
//! # Ok::<(), csctrig_core::TriggerError>(())
//! ```

pub mod alct;
pub mod catalog;
pub mod chamber_hits;
pub mod clct;
pub mod collection;
pub mod comparator_code;
pub mod config;
pub mod constants;
pub mod emulator;
pub mod error;
pub mod extractor;
pub mod geometry;
pub mod grid;
pub mod lut;
pub mod observe;
pub mod pattern;

#[cfg(feature = "parallel")]
pub mod parallel;

// Re-export main types
pub use alct::{AlctCandidate, AlctChain, AlctChamberHits, AlctExtractor, AlctPattern, WireDigi};
pub use catalog::{CatalogKind, PatternCatalog};
pub use chamber_hits::{ChamberHits, ComparatorDigi, HitSource, RecHit};
pub use clct::{Calibration, ClctCandidate, Ranking};
pub use collection::{ClctCandidateCollection, CollectionPrefix};
pub use comparator_code::{ComparatorCode, HitMask};
pub use config::{AlctConfig, ClctConfig, LutConfig, TriggerConfig};
pub use emulator::{EventCandidates, TriggerEmulator};
pub use error::{
    ChainError, CodecError, ConfigError, ExtractError, HitMapError, LutError, PatternError,
    TriggerError, TriggerResult,
};
pub use extractor::{ChamberCandidates, ClctExtractor};
pub use geometry::{ChamberGeometry, ChamberId};
pub use grid::Grid;
pub use lut::{LinearFitBuilder, Lut, LutEntry, LutKey, LutLoader, LutState};
pub use pattern::{Pattern, PatternTemplate};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::alct::{AlctCandidate, AlctChamberHits, AlctExtractor, WireDigi};
    pub use crate::catalog::{CatalogKind, PatternCatalog};
    pub use crate::chamber_hits::{ChamberHits, ComparatorDigi, HitSource, RecHit};
    pub use crate::clct::{Calibration, ClctCandidate, Ranking};
    pub use crate::config::TriggerConfig;
    pub use crate::emulator::TriggerEmulator;
    pub use crate::error::{TriggerError, TriggerResult};
    pub use crate::extractor::ClctExtractor;
    pub use crate::geometry::ChamberId;
    pub use crate::lut::{Lut, LutLoader};
}
