//! Confirmation hooks consulted by [`crate::WaveformStore::save`].

use std::path::Path;

/// Answers the questions `save` has to ask before touching the disk.
pub trait Confirm {
    /// Persist pending edits of waveform `name`?
    fn confirm_persist(&mut self, name: &str) -> bool;

    /// Replace the existing database at `path`?
    fn confirm_overwrite(&mut self, path: &Path) -> bool;
}

/// Says yes to everything. Used for non-interactive saves.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm_persist(&mut self, _name: &str) -> bool {
        true
    }

    fn confirm_overwrite(&mut self, _path: &Path) -> bool {
        true
    }
}

/// Says no to everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverConfirm;

impl Confirm for NeverConfirm {
    fn confirm_persist(&mut self, _name: &str) -> bool {
        false
    }

    fn confirm_overwrite(&mut self, _path: &Path) -> bool {
        false
    }
}
