//! Change subscriptions for working waveforms.
//!
//! Mutators emit one event per successful change. Display layers subscribe
//! here instead of being called directly from the editing code.

use crate::editable::EditableWaveform;

/// Which mutator produced a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    SetData,
    ScaleVoltage,
    ScaleTime,
    OffsetVoltage,
    Invert,
}

/// Handle returned by [`EditableWaveform::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Callback invoked with the waveform after its derived arrays changed.
pub type Listener = Box<dyn FnMut(&EditableWaveform, ChangeKind)>;

#[derive(Default)]
pub(crate) struct Listeners {
    next_id: u64,
    entries: Vec<(SubscriptionId, Listener)>,
}

impl Listeners {
    pub(crate) fn add(&mut self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub(crate) fn emit(&mut self, waveform: &EditableWaveform, kind: ChangeKind) {
        for (_, listener) in self.entries.iter_mut() {
            listener(waveform, kind);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}
