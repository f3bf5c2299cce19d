//! Waveform model and editing engine for stimwave.
//!
//! A stimulation waveform is a piecewise-constant step function: consecutive
//! `(holdTime, voltage)` pairs played back by the stimulator DAC.
//!
//! # Architecture
//!
//! - [`WaveformRecord`] is the committed, validated value that gets persisted.
//! - [`EditableWaveform`] is a working copy with derived arrays
//!   (`cumulative_time`, `level_sequence`) and validated in-place mutators.
//! - [`generators`] build template arrays (square, triangle, sine).
//! - Mutations are announced through [`observer`] subscriptions, so display
//!   layers redraw without the core calling into them.
//!
//! Every mutator validates first and then updates all arrays together; a
//! failed call leaves the waveform untouched.

pub mod editable;
pub mod generators;
pub mod observer;
pub mod record;
pub mod source;

pub use editable::EditableWaveform;
pub use generators::Template;
pub use observer::{ChangeKind, Listener, SubscriptionId};
pub use record::WaveformRecord;
pub use source::SourceType;
