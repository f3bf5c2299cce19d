//! Waveform store API.

use crate::confirm::Confirm;
use crate::{StoreError, StoreResult};
use std::collections::HashMap;
use std::f64::consts::TAU;
use std::fs;
use std::path::{Path, PathBuf};
use sw_core::ValidationError;
use sw_waveform::{
    EditableWaveform, Listener, SourceType, SubscriptionId, Template, WaveformRecord, generators,
};
use tracing::{debug, info, warn};

/// Name, type and segment count of one waveform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveformSummary {
    pub name: String,
    pub source_type: SourceType,
    pub size: usize,
}

/// Ordered, persisted collection of waveforms.
///
/// - `ordered_names` is append-only and fixes the file layout.
/// - `records_by_name` holds the committed records written on save.
/// - `working_by_name` holds the editable copies.
/// - `view_order` is the working listing: `ordered_names` followed by
///   creations whose registration is deferred to the next save.
#[derive(Debug)]
pub struct WaveformStore {
    path: PathBuf,
    broken: bool,
    ordered_names: Vec<String>,
    records_by_name: HashMap<String, WaveformRecord>,
    working_by_name: HashMap<String, EditableWaveform>,
    view_order: Vec<String>,
    selection: Option<String>,
}

impl WaveformStore {
    /// Empty store bound to `path`. Nothing is read until [`Self::load`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            broken: false,
            ordered_names: Vec::new(),
            records_by_name: HashMap::new(),
            working_by_name: HashMap::new(),
            view_order: Vec::new(),
            selection: None,
        }
    }

    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let mut store = Self::new(path);
        store.load()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when the last load failed; saving is refused until [`Self::retarget`].
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Read the backing file, replacing the in-memory contents.
    ///
    /// A missing file is created empty and the store is seeded with the
    /// `TemplateSquare` record. On a parse failure the in-memory state is left
    /// as it was and the path is marked broken.
    pub fn load(&mut self) -> StoreResult<()> {
        if !self.path.exists() {
            fs::File::create(&self.path)?;
            info!(path = %self.path.display(), "created new signal database with template");
            self.replace_all(vec![WaveformRecord::template_square()]);
            self.broken = false;
            return Ok(());
        }

        match sw_project::load_yaml(&self.path) {
            Ok(records) => {
                info!(path = %self.path.display(), count = records.len(), "loaded signal database");
                self.replace_all(records);
                self.broken = false;
                Ok(())
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "signal database failed to load");
                self.broken = true;
                Err(StoreError::Persistence(err))
            }
        }
    }

    /// Point the store at a different file. Clears the broken flag.
    pub fn retarget(&mut self, path: impl Into<PathBuf>) {
        self.path = path.into();
        self.broken = false;
        debug!(path = %self.path.display(), "store retargeted");
    }

    /// Add a new waveform seeded from the generator matching `source_type`.
    ///
    /// Without an active selection the name joins the persisted order right
    /// away; otherwise it is registered on the next save.
    pub fn create(
        &mut self,
        name: &str,
        source_type: SourceType,
    ) -> StoreResult<&mut EditableWaveform> {
        let source_type = source_type.ensure_constructible()?;
        self.ensure_free(name)?;
        let (hold_time, voltage) = seed_template(source_type)?.into_parts();
        let record = WaveformRecord::new(name, source_type, hold_time, voltage)?;
        let deferred = self.selection.is_some();
        info!(name, %source_type, deferred, "created waveform");
        Ok(self.register(record, false))
    }

    /// Append records from a legacy line-format file as pending edits.
    pub fn import_legacy(&mut self, path: &Path) -> StoreResult<usize> {
        let records = sw_project::load_legacy(path)?;
        for (i, record) in records.iter().enumerate() {
            self.ensure_free(record.name())?;
            if records[..i].iter().any(|r| r.name() == record.name()) {
                return Err(ValidationError::DuplicateName {
                    name: record.name().to_string(),
                }
                .into());
            }
        }
        let count = records.len();
        for record in records {
            self.register(record, true);
        }
        info!(path = %path.display(), count, "imported legacy waveforms");
        Ok(count)
    }

    /// Bind the display to `name`. Unknown names leave the selection alone.
    pub fn select(&mut self, name: &str) -> bool {
        if self.working_by_name.contains_key(name) {
            self.selection = Some(name.to_string());
            true
        } else {
            debug!(name, "select ignored: unknown waveform");
            false
        }
    }

    pub fn active_name(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn active(&self) -> Option<&EditableWaveform> {
        self.selection
            .as_ref()
            .and_then(|name| self.working_by_name.get(name))
    }

    pub fn active_mut(&mut self) -> Option<&mut EditableWaveform> {
        self.selection
            .as_ref()
            .and_then(|name| self.working_by_name.get_mut(name))
    }

    /// Working order, including creations not yet saved.
    pub fn list_names(&self) -> Vec<String> {
        self.view_order.clone()
    }

    /// Canonical persisted order.
    pub fn ordered_names(&self) -> Vec<String> {
        self.ordered_names.clone()
    }

    pub fn get(&self, name: &str) -> Option<&EditableWaveform> {
        self.working_by_name.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut EditableWaveform> {
        self.working_by_name.get_mut(name)
    }

    /// Last committed record for `name`.
    pub fn record(&self, name: &str) -> Option<&WaveformRecord> {
        self.records_by_name.get(name)
    }

    pub fn persisted_summaries(&self) -> Vec<WaveformSummary> {
        self.ordered_names
            .iter()
            .filter_map(|name| self.records_by_name.get(name))
            .map(|r| WaveformSummary {
                name: r.name().to_string(),
                source_type: r.source_type(),
                size: r.size(),
            })
            .collect()
    }

    pub fn working_summaries(&self) -> Vec<WaveformSummary> {
        self.view_order
            .iter()
            .filter_map(|name| self.working_by_name.get(name))
            .map(|w| WaveformSummary {
                name: w.name().to_string(),
                source_type: w.source_type(),
                size: w.size(),
            })
            .collect()
    }

    /// Names with uncommitted edits, in working order.
    pub fn dirty_names(&self) -> Vec<String> {
        self.view_order
            .iter()
            .filter(|name| self.working_by_name.get(*name).is_some_and(|w| w.is_dirty()))
            .cloned()
            .collect()
    }

    pub fn subscribe(&mut self, name: &str, listener: Listener) -> StoreResult<SubscriptionId> {
        self.working_by_name
            .get_mut(name)
            .map(|w| w.subscribe(listener))
            .ok_or_else(|| StoreError::UnknownWaveform {
                name: name.to_string(),
            })
    }

    /// Persist confirmed edits.
    ///
    /// Every dirty waveform is offered to `confirm`; accepted ones are
    /// committed into fresh records and new names are appended to the
    /// canonical order. The whole collection is then written in that order.
    /// An existing file is only replaced after `confirm_overwrite`.
    ///
    /// Returns `false` when nothing was written. In-memory commits only take
    /// effect once the file write succeeded.
    pub fn save(&mut self, confirm: &mut dyn Confirm) -> StoreResult<bool> {
        if self.broken {
            return Err(StoreError::BrokenTarget {
                path: self.path.clone(),
            });
        }

        let dirty = self.dirty_names();
        if dirty.is_empty() {
            debug!("save skipped: no pending edits");
            return Ok(false);
        }

        let chosen: Vec<String> = dirty
            .into_iter()
            .filter(|name| confirm.confirm_persist(name))
            .collect();
        if chosen.is_empty() {
            info!("save skipped: no waveform confirmed");
            return Ok(false);
        }

        if self.path.exists() && !confirm.confirm_overwrite(&self.path) {
            info!(path = %self.path.display(), "save skipped: overwrite declined");
            return Ok(false);
        }

        let mut records = self.records_by_name.clone();
        let mut order = self.ordered_names.clone();
        for name in &chosen {
            let Some(waveform) = self.working_by_name.get(name) else {
                continue;
            };
            records.insert(name.clone(), waveform.to_record()?);
            if !order.contains(name) {
                order.push(name.clone());
            }
        }

        let ordered: Vec<&WaveformRecord> =
            order.iter().filter_map(|name| records.get(name)).collect();
        sw_project::save_yaml(&self.path, ordered)?;

        for name in &chosen {
            if let Some(waveform) = self.working_by_name.get_mut(name) {
                waveform.mark_clean();
            }
        }
        self.records_by_name = records;
        self.ordered_names = order;
        info!(
            path = %self.path.display(),
            committed = chosen.len(),
            total = self.ordered_names.len(),
            "saved signal database"
        );
        Ok(true)
    }

    fn replace_all(&mut self, records: Vec<WaveformRecord>) {
        self.ordered_names.clear();
        self.records_by_name.clear();
        self.working_by_name.clear();
        self.view_order.clear();
        self.selection = None;
        for record in records {
            let name = record.name().to_string();
            self.working_by_name
                .insert(name.clone(), EditableWaveform::new(&record));
            self.records_by_name.insert(name.clone(), record);
            self.ordered_names.push(name.clone());
            self.view_order.push(name);
        }
    }

    fn ensure_free(&self, name: &str) -> Result<(), ValidationError> {
        if self.working_by_name.contains_key(name) || self.records_by_name.contains_key(name) {
            return Err(ValidationError::DuplicateName {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn register(&mut self, record: WaveformRecord, pending: bool) -> &mut EditableWaveform {
        let name = record.name().to_string();
        let mut waveform = EditableWaveform::new(&record);
        if pending {
            waveform.mark_dirty();
        }
        if self.selection.is_none() {
            self.ordered_names.push(name.clone());
            self.records_by_name.insert(name.clone(), record);
        }
        self.view_order.push(name.clone());
        self.working_by_name.entry(name).or_insert(waveform)
    }
}

/// Initial arrays for a freshly created waveform.
fn seed_template(source_type: SourceType) -> Result<Template, ValidationError> {
    match source_type {
        SourceType::Stored => generators::sine(0.0, TAU, 2047.0, 2048.0, 32, 100),
        SourceType::Square => generators::square(0, 2047, 1000, 0.5),
        SourceType::Reserved => Err(ValidationError::ReservedSourceType {
            code: source_type.code(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_seed_matches_template() {
        let template = seed_template(SourceType::Square).unwrap();
        let record = WaveformRecord::template_square();
        assert_eq!(template.hold_time, record.hold_time());
        assert_eq!(template.voltage, record.voltage());
    }

    #[test]
    fn stored_seed_is_a_full_sine_period() {
        let template = seed_template(SourceType::Stored).unwrap();
        assert_eq!(template.len(), 32);
        assert_eq!(template.voltage[0], 2048);
        assert!(template.voltage.iter().all(|&v| (0..=4095).contains(&v)));
    }

    #[test]
    fn unloaded_store_is_empty() {
        let store = WaveformStore::new("unused.yaml");
        assert!(store.list_names().is_empty());
        assert!(store.active().is_none());
        assert!(!store.is_broken());
    }
}
