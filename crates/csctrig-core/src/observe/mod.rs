//! # Observability
//!
//! Logging only: the trigger stages emit `tracing` events and
//! [`init_logging`] installs a `tracing-subscriber` pipeline for them.
//!
//! ```text
//!   ClctExtractor / AlctExtractor / LinearFitBuilder
//!        │ tracing::{trace,debug,info,warn}!
//!        ▼
//!   EnvFilter (filter / RUST_LOG / level)
//!        │
//!        ▼
//!   fmt layer: json | pretty | compact  ──▶ stdout
//! ```

pub mod logging;

pub use logging::{init_logging, try_init_logging, LogConfig, LogFormat, LogLevel};
