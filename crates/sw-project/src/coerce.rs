//! Integer coercion at the load boundary.
//!
//! Files edited by hand or by numeric tooling tend to come back with
//! `500.0` where `500` was written. Integral floats are accepted silently,
//! fractional ones are rounded to nearest with a warning, non-finite values
//! are rejected.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use tracing::warn;

#[derive(Deserialize)]
#[serde(untagged)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn to_int(&self) -> Result<i64, String> {
        match *self {
            Number::Int(v) => Ok(v),
            Number::Float(v) if !v.is_finite() => Err(format!("non-finite number {v}")),
            Number::Float(v) if v.abs() >= i64::MAX as f64 => Err(format!("number {v} out of range")),
            Number::Float(v) => {
                let rounded = v.round();
                if rounded != v {
                    warn!(value = v, coerced = rounded, "rounded non-integral value");
                }
                Ok(rounded as i64)
            }
        }
    }
}

pub fn int_scalar<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Number::deserialize(deserializer)?
        .to_int()
        .map_err(D::Error::custom)
}

pub fn int_array<'de, D>(deserializer: D) -> Result<Vec<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<Number>::deserialize(deserializer)?
        .iter()
        .map(Number::to_int)
        .collect::<Result<Vec<_>, _>>()
        .map_err(D::Error::custom)
}
