//! Working copies of waveform records.

use crate::generators::Template;
use crate::observer::{ChangeKind, Listener, Listeners, SubscriptionId};
use crate::record::WaveformRecord;
use crate::source::SourceType;
use sw_core::{
    MICROS_PER_SECOND, MIN_HOLD_TIME, SwError, SwResult, ValidationError, clip_real, clip_voltage,
    cumulative, ensure_hold_times, ensure_shape,
};
use tracing::debug;

/// Editable working copy of one [`WaveformRecord`].
///
/// Holds the raw arrays plus two projections recomputed on every change:
/// - `cumulative_time`: prefix sum of `hold_time` with a leading 0
///   (transition boundaries, length `size + 1`)
/// - `level_sequence`: `voltage` with its last value prepended
///   (the flat pre-roll before time 0, length `size + 1`)
///
/// Voltages are always kept inside the DAC range.
#[derive(Debug)]
pub struct EditableWaveform {
    name: String,
    source_type: SourceType,
    hold_time: Vec<u32>,
    voltage: Vec<i32>,
    cumulative_time: Vec<u64>,
    level_sequence: Vec<i32>,
    dirty: bool,
    listeners: Listeners,
}

impl EditableWaveform {
    pub fn new(record: &WaveformRecord) -> Self {
        let mut waveform = Self {
            name: record.name().to_string(),
            source_type: record.source_type(),
            hold_time: record.hold_time().to_vec(),
            voltage: clip_all(record.voltage()),
            cumulative_time: Vec::new(),
            level_sequence: Vec::new(),
            dirty: false,
            listeners: Listeners::default(),
        };
        waveform.recompute();
        waveform
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    pub fn size(&self) -> usize {
        self.hold_time.len()
    }

    pub fn hold_time(&self) -> &[u32] {
        &self.hold_time
    }

    pub fn voltage(&self) -> &[i32] {
        &self.voltage
    }

    pub fn cumulative_time(&self) -> &[u64] {
        &self.cumulative_time
    }

    pub fn level_sequence(&self) -> &[i32] {
        &self.level_sequence
    }

    /// True once edited since construction or the last commit.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn min_voltage(&self) -> i32 {
        self.voltage.iter().copied().min().unwrap_or_default()
    }

    pub fn max_voltage(&self) -> i32 {
        self.voltage.iter().copied().max().unwrap_or_default()
    }

    /// Total duration in microseconds.
    pub fn period(&self) -> u64 {
        self.cumulative_time.last().copied().unwrap_or_default()
    }

    /// Repetition rate in Hz.
    pub fn frequency(&self) -> SwResult<f64> {
        let period = self.period();
        if period == 0 {
            return Err(SwError::Division {
                what: "frequency of a zero-duration waveform",
            });
        }
        Ok(MICROS_PER_SECOND / period as f64)
    }

    /// Replace both arrays at once. Voltages are clipped into the DAC range.
    ///
    /// Rejects mismatched or empty arrays and hold entries below the hardware
    /// floor without touching the waveform.
    pub fn set_data(&mut self, hold_time: Vec<u32>, voltage: Vec<i32>) -> Result<(), ValidationError> {
        if let Err(err) = ensure_shape(hold_time.len(), voltage.len())
            .and_then(|()| ensure_hold_times(&hold_time, "holdTime"))
        {
            debug!(waveform = %self.name, error = %err, "set_data rejected");
            return Err(err);
        }
        let voltage = clip_all(&voltage);
        self.replace(hold_time, voltage, ChangeKind::SetData);
        Ok(())
    }

    /// Load a generator output into this waveform.
    pub fn apply_template(&mut self, template: Template) -> Result<(), ValidationError> {
        let (hold_time, voltage) = template.into_parts();
        self.set_data(hold_time, voltage)
    }

    pub fn scale_voltage(&mut self, factor: f64) {
        let voltage = self
            .voltage
            .iter()
            .map(|&v| clip_real(v as f64 * factor))
            .collect();
        let hold_time = self.hold_time.clone();
        self.replace(hold_time, voltage, ChangeKind::ScaleVoltage);
    }

    /// Stretch or compress every hold entry by `factor`, all or nothing.
    pub fn scale_time(&mut self, factor: f64) -> Result<(), ValidationError> {
        if !(factor.is_finite() && factor > 0.0) {
            debug!(waveform = %self.name, factor, "scale_time rejected");
            return Err(ValidationError::invalid_arg(
                "time factor",
                factor,
                "must be positive",
            ));
        }
        let shortest = self.hold_time.iter().copied().min().unwrap_or_default() as f64 * factor;
        if shortest < MIN_HOLD_TIME as f64 {
            debug!(waveform = %self.name, factor, shortest, "scale_time rejected");
            return Err(ValidationError::HoldTimeTooShort {
                what: "scaled holdTime",
                value: shortest,
                min: MIN_HOLD_TIME,
            });
        }
        let longest = self.hold_time.iter().copied().max().unwrap_or_default() as f64 * factor;
        let longest = longest.round();
        if longest > u32::MAX as f64 {
            debug!(waveform = %self.name, factor, longest, "scale_time rejected");
            return Err(ValidationError::invalid_arg(
                "scaled holdTime",
                longest,
                "must fit in u32 microseconds",
            ));
        }
        let hold_time = self
            .hold_time
            .iter()
            .map(|&h| (h as f64 * factor).round() as u32)
            .collect();
        let voltage = self.voltage.clone();
        self.replace(hold_time, voltage, ChangeKind::ScaleTime);
        Ok(())
    }

    pub fn offset_voltage(&mut self, offset: i32) {
        let voltage = self
            .voltage
            .iter()
            .map(|&v| clip_voltage(v as i64 + offset as i64))
            .collect();
        let hold_time = self.hold_time.clone();
        self.replace(hold_time, voltage, ChangeKind::OffsetVoltage);
    }

    /// Negate and clip. On the unsigned DAC range every positive level
    /// becomes 0.
    pub fn invert(&mut self) {
        let voltage = self
            .voltage
            .iter()
            .map(|&v| clip_voltage(-(v as i64)))
            .collect();
        let hold_time = self.hold_time.clone();
        self.replace(hold_time, voltage, ChangeKind::Invert);
    }

    /// Fresh record holding the current arrays. Leaves the dirty flag alone.
    pub fn to_record(&self) -> Result<WaveformRecord, ValidationError> {
        WaveformRecord::new(
            self.name.clone(),
            self.source_type,
            self.hold_time.clone(),
            self.voltage.clone(),
        )
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Flag the copy as pending without touching its arrays or notifying.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Snapshot into a record and clear the dirty flag.
    pub fn commit(&mut self) -> Result<WaveformRecord, ValidationError> {
        let record = self.to_record()?;
        self.mark_clean();
        Ok(record)
    }

    pub fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        self.listeners.add(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.remove(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    fn replace(&mut self, hold_time: Vec<u32>, voltage: Vec<i32>, kind: ChangeKind) {
        self.hold_time = hold_time;
        self.voltage = voltage;
        self.recompute();
        self.dirty = true;
        self.notify(kind);
    }

    fn recompute(&mut self) {
        self.cumulative_time = cumulative(&self.hold_time);
        let mut levels = Vec::with_capacity(self.voltage.len() + 1);
        if let Some(&last) = self.voltage.last() {
            levels.push(last);
        }
        levels.extend_from_slice(&self.voltage);
        self.level_sequence = levels;
    }

    fn notify(&mut self, kind: ChangeKind) {
        let mut listeners = std::mem::take(&mut self.listeners);
        listeners.emit(self, kind);
        self.listeners = listeners;
    }
}

fn clip_all(voltage: &[i32]) -> Vec<i32> {
    voltage.iter().map(|&v| clip_voltage(v as i64)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn waveform(hold: Vec<u32>, voltage: Vec<i32>) -> EditableWaveform {
        let record = WaveformRecord::new("w", SourceType::Stored, hold, voltage).unwrap();
        EditableWaveform::new(&record)
    }

    #[test]
    fn construction_clips_and_projects() {
        let w = waveform(vec![100, 200, 300], vec![-5, 5000, 12]);
        assert_eq!(w.voltage(), &[0, 4095, 12]);
        assert_eq!(w.cumulative_time(), &[0, 100, 300, 600]);
        assert_eq!(w.level_sequence(), &[12, 0, 4095, 12]);
        assert!(!w.is_dirty());
        assert_eq!(w.period(), 600);
    }

    #[test]
    fn set_data_mismatch_leaves_state() {
        let mut w = waveform(vec![100, 100], vec![1, 2]);
        let err = w.set_data(vec![100, 100, 100], vec![1]).unwrap_err();
        assert!(matches!(err, ValidationError::LengthMismatch { .. }));
        assert_eq!(w.hold_time(), &[100, 100]);
        assert_eq!(w.voltage(), &[1, 2]);
        assert!(!w.is_dirty());
    }

    #[test]
    fn set_data_replaces_and_notifies_once() {
        let mut w = waveform(vec![100], vec![1]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        w.subscribe(Box::new(move |w: &EditableWaveform, kind| {
            sink.borrow_mut().push((kind, w.size()));
        }));
        w.set_data(vec![60, 70], vec![9000, 3]).unwrap();
        assert_eq!(w.voltage(), &[4095, 3]);
        assert_eq!(w.level_sequence(), &[3, 4095, 3]);
        assert!(w.is_dirty());
        assert_eq!(*seen.borrow(), vec![(ChangeKind::SetData, 2)]);
    }

    #[test]
    fn rejected_mutation_does_not_notify() {
        let mut w = waveform(vec![140, 140], vec![0, 4095]);
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        let id = w.subscribe(Box::new(move |_: &EditableWaveform, _| *sink.borrow_mut() += 1));
        assert!(w.scale_time(0.3).is_err());
        assert_eq!(*count.borrow(), 0);
        w.invert();
        assert_eq!(*count.borrow(), 1);
        assert!(w.unsubscribe(id));
        w.invert();
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn scale_time_rejects_below_floor() {
        let mut w = waveform(vec![140, 140], vec![0, 4095]);
        let err = w.scale_time(0.3).unwrap_err();
        match err {
            ValidationError::HoldTimeTooShort { value, min, .. } => {
                assert!((value - 42.0).abs() < 1e-9);
                assert_eq!(min, 50);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(w.hold_time(), &[140, 140]);
        assert!(!w.is_dirty());
        assert!(w.scale_time(0.0).is_err());
        assert!(w.scale_time(-2.0).is_err());
    }

    #[test]
    fn scale_time_rejects_overflowing_holds() {
        let mut w = waveform(vec![100, 200], vec![0, 1]);
        let err = w.scale_time(1e9).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidArg { what: "scaled holdTime", .. }
        ));
        assert_eq!(w.hold_time(), &[100, 200]);
        assert!(!w.is_dirty());

        w.scale_time(2e7).unwrap();
        assert_eq!(w.hold_time(), &[2_000_000_000, 4_000_000_000]);
    }

    #[test]
    fn mark_dirty_is_silent() {
        let mut w = waveform(vec![100], vec![1]);
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        w.subscribe(Box::new(move |_: &EditableWaveform, _| *sink.borrow_mut() += 1));
        w.mark_dirty();
        assert!(w.is_dirty());
        assert_eq!(w.hold_time(), &[100]);
        assert_eq!(*count.borrow(), 0);
        w.mark_clean();
        assert!(!w.is_dirty());
    }

    #[test]
    fn scale_time_rounds_each_entry() {
        let mut w = waveform(vec![100, 155], vec![0, 1]);
        w.scale_time(1.5).unwrap();
        assert_eq!(w.hold_time(), &[150, 233]);
        assert_eq!(w.cumulative_time(), &[0, 150, 383]);
        assert!(w.is_dirty());
    }

    #[test]
    fn voltage_edits_stay_in_range() {
        let mut w = waveform(vec![100, 100, 100], vec![0, 2000, 4000]);
        w.scale_voltage(1.5);
        assert_eq!(w.voltage(), &[0, 3000, 4095]);
        w.offset_voltage(-3500);
        assert_eq!(w.voltage(), &[0, 0, 595]);
        w.offset_voltage(i32::MAX);
        assert_eq!(w.voltage(), &[4095, 4095, 4095]);
        w.scale_voltage(-1.0);
        assert_eq!(w.voltage(), &[0, 0, 0]);
    }

    #[test]
    fn invert_collapses_to_zero() {
        let mut w = waveform(vec![100, 100], vec![3000, 0]);
        w.invert();
        assert_eq!(w.voltage(), &[0, 0]);
        assert!(w.is_dirty());
    }

    #[test]
    fn frequency_from_period() {
        let w = waveform(vec![500, 500], vec![0, 2047]);
        assert_eq!(w.frequency().unwrap(), 1000.0);
    }

    #[test]
    fn commit_clears_dirty() {
        let mut w = waveform(vec![100], vec![1]);
        w.offset_voltage(10);
        let record = w.commit().unwrap();
        assert_eq!(record.voltage(), &[11]);
        assert!(!w.is_dirty());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arrays() -> impl Strategy<Value = (Vec<u32>, Vec<i32>)> {
        prop::collection::vec((50u32..10_000, -5000i32..9000), 1..64)
            .prop_map(|pairs| pairs.into_iter().unzip())
    }

    fn check_projection(w: &EditableWaveform) -> Result<(), TestCaseError> {
        let cum = w.cumulative_time();
        let levels = w.level_sequence();
        prop_assert_eq!(cum.len(), w.hold_time().len() + 1);
        prop_assert_eq!(cum[0], 0);
        prop_assert_eq!(
            *cum.last().unwrap(),
            w.hold_time().iter().map(|&h| h as u64).sum::<u64>()
        );
        prop_assert_eq!(levels.len(), w.voltage().len() + 1);
        prop_assert_eq!(levels[0], *w.voltage().last().unwrap());
        prop_assert!(w.voltage().iter().all(|&v| (0..=4095).contains(&v)));
        Ok(())
    }

    proptest! {
        #[test]
        fn projections_hold_after_edits(
            (hold, voltage) in arrays(),
            factor in -3.0f64..3.0,
            offset in -5000i32..5000,
            time_factor in 0.01f64..4.0,
        ) {
            let record = WaveformRecord::new("p", SourceType::Stored, hold, voltage).unwrap();
            let mut w = EditableWaveform::new(&record);
            check_projection(&w)?;
            w.scale_voltage(factor);
            check_projection(&w)?;
            w.offset_voltage(offset);
            check_projection(&w)?;
            let before = w.hold_time().to_vec();
            let shortest = *before.iter().min().unwrap() as f64 * time_factor;
            match w.scale_time(time_factor) {
                Ok(()) => {
                    prop_assert!(shortest >= MIN_HOLD_TIME as f64);
                    let expected: Vec<u32> =
                        before.iter().map(|&h| (h as f64 * time_factor).round() as u32).collect();
                    prop_assert_eq!(w.hold_time(), expected.as_slice());
                }
                Err(_) => {
                    prop_assert!(shortest < MIN_HOLD_TIME as f64);
                    prop_assert_eq!(w.hold_time(), before.as_slice());
                }
            }
            check_projection(&w)?;
            w.invert();
            check_projection(&w)?;
        }
    }
}
