//! sw-core: stable foundation for stimwave.
//!
//! Contains:
//! - limits (hardware bounds: DAC range, hold-time floor)
//! - numeric (clipping, rounding, linspace helpers)
//! - error (shared validation / division errors)

pub mod error;
pub mod limits;
pub mod numeric;

// Re-exports: nice ergonomics for downstream crates
pub use error::{SwError, SwResult, ValidationError};
pub use limits::*;
pub use numeric::*;
