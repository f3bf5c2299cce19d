//! On-disk document layout for waveform records.
//!
//! One document per record, fields in the fixed order
//! `name, sourceType, size, holdTime, voltage`. The mapping to
//! [`WaveformRecord`] is spelled out field by field in both directions.

use crate::coerce;
use crate::{ProjectError, ProjectResult};
use serde::{Deserialize, Serialize};
use sw_waveform::{SourceType, WaveformRecord};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WaveformDoc {
    pub name: String,
    #[serde(deserialize_with = "coerce::int_scalar")]
    pub source_type: i64,
    #[serde(deserialize_with = "coerce::int_scalar")]
    pub size: i64,
    #[serde(deserialize_with = "coerce::int_array")]
    pub hold_time: Vec<i64>,
    #[serde(deserialize_with = "coerce::int_array")]
    pub voltage: Vec<i64>,
}

impl From<&WaveformRecord> for WaveformDoc {
    fn from(record: &WaveformRecord) -> Self {
        Self {
            name: record.name().to_string(),
            source_type: record.source_type().code() as i64,
            size: record.size() as i64,
            hold_time: record.hold_time().iter().map(|&h| h as i64).collect(),
            voltage: record.voltage().iter().map(|&v| v as i64).collect(),
        }
    }
}

impl WaveformDoc {
    /// Convert into a validated record. `document` is the position in the
    /// file, used for error reporting.
    pub fn into_record(self, document: usize) -> ProjectResult<WaveformRecord> {
        let malformed = |reason: String| ProjectError::Malformed { document, reason };

        let code = u8::try_from(self.source_type)
            .map_err(|_| malformed(format!("sourceType {} out of range", self.source_type)))?;
        let source_type = SourceType::try_from(code)
            .map_err(|source| ProjectError::Invalid { document, source })?;

        if self.size != self.hold_time.len() as i64 || self.size != self.voltage.len() as i64 {
            return Err(malformed(format!(
                "size {} does not match holdTime ({}) / voltage ({}) lengths",
                self.size,
                self.hold_time.len(),
                self.voltage.len()
            )));
        }

        let hold_time = self
            .hold_time
            .iter()
            .map(|&h| {
                u32::try_from(h).map_err(|_| malformed(format!("holdTime entry {h} out of range")))
            })
            .collect::<ProjectResult<Vec<u32>>>()?;
        let voltage = self
            .voltage
            .iter()
            .map(|&v| {
                i32::try_from(v).map_err(|_| malformed(format!("voltage entry {v} out of range")))
            })
            .collect::<ProjectResult<Vec<i32>>>()?;

        WaveformRecord::new(self.name, source_type, hold_time, voltage)
            .map_err(|source| ProjectError::Invalid { document, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_serialize_in_declared_order() {
        let doc = WaveformDoc::from(&WaveformRecord::template_square());
        let text = serde_yaml::to_string(&doc).unwrap();
        let keys: Vec<&str> = text
            .lines()
            .filter(|l| !l.starts_with('-'))
            .filter_map(|l| l.split(':').next())
            .collect();
        assert_eq!(keys, vec!["name", "sourceType", "size", "holdTime", "voltage"]);
    }

    #[test]
    fn size_mismatch_is_malformed() {
        let doc = WaveformDoc {
            name: "a".to_string(),
            source_type: 0,
            size: 3,
            hold_time: vec![100, 100],
            voltage: vec![1, 2],
        };
        assert!(matches!(
            doc.into_record(4),
            Err(ProjectError::Malformed { document: 4, .. })
        ));
    }

    #[test]
    fn negative_hold_time_is_malformed() {
        let doc = WaveformDoc {
            name: "a".to_string(),
            source_type: 2,
            size: 1,
            hold_time: vec![-100],
            voltage: vec![1],
        };
        assert!(matches!(doc.into_record(0), Err(ProjectError::Malformed { .. })));
    }

    #[test]
    fn reserved_source_type_is_invalid() {
        let doc = WaveformDoc {
            name: "a".to_string(),
            source_type: 1,
            size: 1,
            hold_time: vec![100],
            voltage: vec![1],
        };
        assert!(matches!(doc.into_record(0), Err(ProjectError::Invalid { .. })));
    }
}
