//! sw-store: the named, ordered waveform collection.
//!
//! [`WaveformStore`] owns the canonical name order, the committed records and
//! the working copies. Display and configuration layers only ever go through
//! its operations; none of them hold the underlying maps.

pub mod confirm;
pub mod store;

pub use confirm::{AlwaysConfirm, Confirm, NeverConfirm};
pub use store::{WaveformStore, WaveformSummary};

use std::path::PathBuf;
use sw_core::{SwError, ValidationError};
use sw_project::ProjectError;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] ProjectError),

    #[error("Refusing to save to {path}: it failed to load; retarget the store first")]
    BrokenTarget { path: PathBuf },

    #[error("No waveform named {name}")]
    UnknownWaveform { name: String },

    #[error("Waveform error: {0}")]
    Waveform(#[from] SwError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
