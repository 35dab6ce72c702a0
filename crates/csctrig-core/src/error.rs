//! Error types for the trigger emulation.
//!
//! Each stage has its own enum. Only construction-time failures (patterns,
//! catalogs, LUT loading, configuration) are meant to reach the caller;
//! matching-time conditions are absorbed where they happen.

use std::io;
use thiserror::Error;

use crate::constants::N_COMPARATOR_CODES;
use crate::geometry::ChamberId;
use crate::lut::LutKey;

/// Result type for fallible trigger operations
pub type TriggerResult<T> = Result<T, TriggerError>;

/// Comparator-code encoding and decoding failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Integer code outside the base-4 range
    #[error("comparator code {} out of range (max {})", .0, N_COMPARATOR_CODES - 1)]
    IdOutOfRange(u32),

    /// A layer reported more positions than one digit can hold
    #[error("layer {layer} has {count} slots set, a code digit holds at most one")]
    MultipleSlots { layer: usize, count: usize },
}

/// Pattern template and catalog construction failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// Template has no cells at all
    #[error("pattern {id}: template is empty")]
    EmptyTemplate { id: u32 },

    /// Template has no cell on the key layer centre column
    #[error("pattern {id}: key layer does not cover the centre column")]
    MissingKeyCell { id: u32 },

    /// A layer row is wider than a comparator-code digit can address
    #[error("pattern {id}: layer {layer} has {count} cells (max 3)")]
    TooManyCells { id: u32, layer: usize, count: usize },

    /// Catalog already contains this id
    #[error("duplicate pattern id {0}")]
    DuplicateId(u32),

    /// The code names a position the pattern row does not have
    #[error("code {code_id} is not a valid combination for pattern {pattern_id} (layer {layer})")]
    CodeNotInPattern {
        pattern_id: u32,
        code_id: u32,
        layer: usize,
    },
}

/// Lookup-table loading failures
#[derive(Error, Debug)]
pub enum LutError {
    /// The same key was inserted twice
    #[error("duplicate LUT entry for {0}")]
    DuplicateKey(LutKey),

    /// Malformed record in a text table
    #[error("LUT line {line}: {reason}")]
    Parse { line: usize, reason: String },

    /// Underlying read or write failed
    #[error("LUT I/O error: {0}")]
    Io(#[from] io::Error),

    /// Pattern/code combination problem while fitting
    #[error("LUT fit failed: {0}")]
    Pattern(#[from] PatternError),
}

/// Raw hit ingestion failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HitMapError {
    /// Layer index beyond the chamber
    #[error("layer {0} out of range")]
    LayerOutOfRange(u8),

    /// Half-strip beyond the chamber readout
    #[error("half-strip {half_strip} out of range (chamber has {max})")]
    HalfStripOutOfRange { half_strip: usize, max: usize },

    /// Wire group beyond the chamber readout
    #[error("wire group {wire_group} out of range (chamber has {max})")]
    WireGroupOutOfRange { wire_group: usize, max: usize },

    /// Time bin that cannot be stored in the occupancy cell
    #[error("time bin {0} out of range")]
    TimeBinOutOfRange(u8),

    /// Reconstructed hit with a negative or non-finite position
    #[error("invalid rechit position {0}")]
    InvalidPosition(f32),
}

/// Per-chamber extraction failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// Station/ring/chamber combination with no known geometry
    #[error("chamber {0} has no valid geometry")]
    Geometry(ChamberId),
}

/// Anode candidate chain failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// Chain already holds its maximum number of candidates
    #[error("candidate chain is full (capacity {capacity})")]
    Full { capacity: usize },

    /// Handle was never issued by this chain
    #[error("invalid candidate handle {0}")]
    InvalidHandle(usize),

    /// Handle refers to a candidate that was already removed
    #[error("candidate {0} was already removed from the chain")]
    Removed(usize),
}

/// Configuration loading failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("config not found: {0}")]
    NotFound(String),

    /// Failed to read or write configuration file
    #[error("failed to read config: {0}")]
    ReadError(String),

    /// Failed to parse configuration
    #[error("failed to parse config: {0}")]
    ParseError(String),

    /// Invalid configuration value
    #[error("invalid config: {0}")]
    ValidationError(String),
}

/// Top-level error for the emulation
#[derive(Error, Debug)]
pub enum TriggerError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error(transparent)]
    Lut(#[from] LutError),

    #[error(transparent)]
    HitMap(#[from] HitMapError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl TriggerError {
    /// Whether this error belongs to the construction phase (catalog, LUT,
    /// configuration) and should stop the job.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            TriggerError::Pattern(_) | TriggerError::Lut(_) | TriggerError::Config(_)
        )
    }
}
