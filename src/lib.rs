//! machoscope — structural analyzer for Mach-O binaries.
//!
//! The decoding work lives in the `machoscope-core` crate; this crate adds
//! the CLI surface, persistent configuration, and the presentation layer
//! that turns raw header words into human-readable names.

pub mod config;
pub mod error;
pub mod report;

pub use error::{Error, Result};

/// Crate version, reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
