//! Committed waveform records.

use crate::source::SourceType;
use sw_core::{ValidationError, ensure_hold_times, ensure_shape};

/// A validated, immutable waveform.
///
/// Invariant: `hold_time` and `voltage` have the same non-zero length and
/// every hold entry is at least [`sw_core::MIN_HOLD_TIME`]. A record is never
/// edited in place; saving replaces it with a fresh one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveformRecord {
    name: String,
    source_type: SourceType,
    hold_time: Vec<u32>,
    voltage: Vec<i32>,
}

impl WaveformRecord {
    /// Name of the record seeded into an empty database.
    pub const TEMPLATE_NAME: &'static str = "TemplateSquare";

    pub fn new(
        name: impl Into<String>,
        source_type: SourceType,
        hold_time: Vec<u32>,
        voltage: Vec<i32>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::invalid_arg(
                "name",
                format!("{name:?}"),
                "must not be blank",
            ));
        }
        let source_type = source_type.ensure_constructible()?;
        ensure_shape(hold_time.len(), voltage.len())?;
        ensure_hold_times(&hold_time, "holdTime")?;
        Ok(Self {
            name,
            source_type,
            hold_time,
            voltage,
        })
    }

    /// The 2-point square every new database starts with.
    pub fn template_square() -> Self {
        Self {
            name: Self::TEMPLATE_NAME.to_string(),
            source_type: SourceType::Square,
            hold_time: vec![500, 500],
            voltage: vec![0, 2047],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    /// Segment count.
    pub fn size(&self) -> usize {
        self.hold_time.len()
    }

    pub fn hold_time(&self) -> &[u32] {
        &self.hold_time
    }

    pub fn voltage(&self) -> &[i32] {
        &self.voltage
    }

    /// Total duration in microseconds.
    pub fn period(&self) -> u64 {
        self.hold_time.iter().map(|&h| h as u64).sum()
    }

    pub fn min_voltage(&self) -> i32 {
        self.voltage.iter().copied().min().unwrap_or_default()
    }

    pub fn max_voltage(&self) -> i32 {
        self.voltage.iter().copied().max().unwrap_or_default()
    }
}
