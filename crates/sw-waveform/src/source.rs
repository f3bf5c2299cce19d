//! Waveform source classification.

use serde::{Deserialize, Serialize};
use sw_core::ValidationError;

/// How a waveform was originally produced.
///
/// Serialized as its integer code. Beyond choosing the seed generator for new
/// waveforms the value is opaque to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum SourceType {
    /// Template-seeded, then freely edited.
    Stored = 0,
    /// Reserved code. Never constructed.
    Reserved = 1,
    /// Square template original.
    Square = 2,
}

impl SourceType {
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Reject the reserved code.
    pub fn ensure_constructible(self) -> Result<Self, ValidationError> {
        match self {
            Self::Reserved => Err(ValidationError::ReservedSourceType { code: self.code() }),
            other => Ok(other),
        }
    }
}

impl TryFrom<u8> for SourceType {
    type Error = ValidationError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Stored),
            1 => Ok(Self::Reserved),
            2 => Ok(Self::Square),
            _ => Err(ValidationError::UnknownSourceType { code }),
        }
    }
}

impl From<SourceType> for u8 {
    fn from(source: SourceType) -> Self {
        source.code()
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Stored => "stored",
            Self::Reserved => "reserved",
            Self::Square => "square",
        };
        write!(f, "{label}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_both_ways() {
        for code in 0u8..=2 {
            let source = SourceType::try_from(code).unwrap();
            assert_eq!(u8::from(source), code);
        }
        assert_eq!(
            SourceType::try_from(7),
            Err(ValidationError::UnknownSourceType { code: 7 })
        );
    }

    #[test]
    fn reserved_is_not_constructible() {
        assert!(SourceType::Reserved.ensure_constructible().is_err());
        assert_eq!(
            SourceType::Square.ensure_constructible(),
            Ok(SourceType::Square)
        );
    }
}
