use thiserror::Error;

pub type SwResult<T> = Result<T, SwError>;

/// Rejected input. Raised before any state is touched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Length mismatch: holdTime has {hold_len} entries, voltage has {voltage_len}")]
    LengthMismatch { hold_len: usize, voltage_len: usize },

    #[error("Empty waveform: at least one segment is required")]
    Empty,

    #[error("Hold time too short for {what}: {value} < {min} us")]
    HoldTimeTooShort {
        what: &'static str,
        value: f64,
        min: u32,
    },

    #[error("Invalid argument: {what} = {value} ({bound})")]
    InvalidArg {
        what: &'static str,
        value: String,
        bound: &'static str,
    },

    #[error("Duplicate waveform name: {name}")]
    DuplicateName { name: String },

    #[error("Reserved source type {code} cannot be constructed")]
    ReservedSourceType { code: u8 },

    #[error("Unknown source type: {code}")]
    UnknownSourceType { code: u8 },
}

impl ValidationError {
    pub fn invalid_arg(what: &'static str, value: impl ToString, bound: &'static str) -> Self {
        Self::InvalidArg {
            what,
            value: value.to_string(),
            bound,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SwError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Division by zero: {what}")]
    Division { what: &'static str },
}
