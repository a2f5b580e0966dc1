//! Dualshot Common Utilities
//!
//! Shared infrastructure for all Dualshot crates:
//! - Error types and result aliases
//! - Camera facing directions
//! - Fixed capture configuration
//! - Sequence timing
//! - Tracing/logging initialization

pub mod clock;
pub mod config;
pub mod error;
pub mod facing;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
pub use facing::*;
