//! Synthetic events for the csctrig trigger emulation.
//!
//! The generator draws straight muon tracks through one chamber, converts
//! them into comparator digis, reconstructed cathode hits and wire digis,
//! and sprinkles uncorrelated noise on top. Every event carries its truth
//! tracks so tests can compare extracted candidates against what was put in.
//!
//! ```
//! use csctrig_sim::{ScenarioConfig, ScenarioEngine};
//!
//! let mut engine = ScenarioEngine::new(ScenarioConfig::default()).unwrap();
//! let event = engine.next_event();
//! assert_eq!(event.truth.len(), 1);
//! ```

pub mod config;
pub mod engine;
pub mod track;

pub use config::{ScenarioConfig, SimError, TrackConfig};
pub use engine::{ScenarioEngine, SimEvent, TrackGenerator};
pub use track::MuonTrack;
