//! Deterministic template builders.
//!
//! Every generator is a pure function of its arguments: identical inputs give
//! bit-identical arrays. Output levels are not clipped here; clipping happens
//! when a template is loaded into an [`crate::EditableWaveform`].

use sw_core::{MIN_HOLD_TIME, ValidationError, linspace, round_i32};

/// Raw `(holdTime, voltage)` arrays produced by a generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub hold_time: Vec<u32>,
    pub voltage: Vec<i32>,
}

impl Template {
    pub fn len(&self) -> usize {
        self.hold_time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hold_time.is_empty()
    }

    pub fn period(&self) -> u64 {
        self.hold_time.iter().map(|&h| h as u64).sum()
    }

    pub fn into_parts(self) -> (Vec<u32>, Vec<i32>) {
        (self.hold_time, self.voltage)
    }

    fn uniform(levels: Vec<f64>, resolution: u32) -> Self {
        Self {
            hold_time: vec![resolution; levels.len()],
            voltage: levels.into_iter().map(round_i32).collect(),
        }
    }
}

fn ensure_resolution(resolution: u32) -> Result<(), ValidationError> {
    if resolution < MIN_HOLD_TIME {
        return Err(ValidationError::HoldTimeTooShort {
            what: "resolution",
            value: resolution as f64,
            min: MIN_HOLD_TIME,
        });
    }
    Ok(())
}

/// One period of a square wave starting low.
///
/// The floor check runs on the exact split `period * pulse_width` and its
/// complement. Only the output is rounded: `on = round(period * pulse_width)`,
/// `off = period - on`, so the two hold entries always sum to `period`.
pub fn square(
    off_level: i32,
    on_level: i32,
    period: u32,
    pulse_width: f64,
) -> Result<Template, ValidationError> {
    if !(pulse_width > 0.0 && pulse_width < 1.0) {
        return Err(ValidationError::invalid_arg(
            "pulse_width",
            pulse_width,
            "must lie in (0, 1)",
        ));
    }
    let on_exact = period as f64 * pulse_width;
    let off_exact = period as f64 - on_exact;
    let shortest = on_exact.min(off_exact);
    if shortest < MIN_HOLD_TIME as f64 {
        return Err(ValidationError::HoldTimeTooShort {
            what: "square min(onTime, offTime)",
            value: shortest,
            min: MIN_HOLD_TIME,
        });
    }
    let on_time = (on_exact.round() as u32).min(period);
    let off_time = period - on_time;
    Ok(Template {
        hold_time: vec![off_time, on_time],
        voltage: vec![off_level, on_level],
    })
}

/// Two linear ramps, `left -> middle` then `middle -> right`.
///
/// The left ramp spans `left_units` samples including both ends; the right
/// ramp adds `right_units` samples after the shared `middle` sample. With
/// `left_units == 0` the result is a single ramp `middle -> right` of
/// `right_units` samples, `middle` being its first sample.
pub fn triangle(
    left_level: i32,
    middle_level: i32,
    right_level: i32,
    left_units: usize,
    right_units: usize,
    resolution: u32,
) -> Result<Template, ValidationError> {
    if left_units == 0 && right_units == 0 {
        return Err(ValidationError::invalid_arg(
            "left_units + right_units",
            0,
            "at least one ramp needs samples",
        ));
    }
    ensure_resolution(resolution)?;

    let (left, middle, right) = (left_level as f64, middle_level as f64, right_level as f64);
    let levels = if left_units == 0 {
        linspace(middle, right, right_units)
    } else {
        let mut levels = linspace(left, middle, left_units);
        if right_units > 0 {
            levels.extend(linspace(middle, right, right_units + 1).into_iter().skip(1));
        }
        levels
    };
    Ok(Template::uniform(levels, resolution))
}

/// `units` samples of `sin(angle) * scale + offset` over `[start, end]`.
pub fn sine(
    start_angle: f64,
    end_angle: f64,
    scale: f64,
    offset: f64,
    units: usize,
    resolution: u32,
) -> Result<Template, ValidationError> {
    if !(start_angle.is_finite() && end_angle.is_finite() && start_angle < end_angle) {
        return Err(ValidationError::invalid_arg(
            "angle range",
            format!("[{start_angle}, {end_angle}]"),
            "start must be below end",
        ));
    }
    if units == 0 {
        return Err(ValidationError::invalid_arg("units", units, "must be >= 1"));
    }
    ensure_resolution(resolution)?;

    let levels = linspace(start_angle, end_angle, units)
        .into_iter()
        .map(|angle| angle.sin() * scale + offset)
        .collect();
    Ok(Template::uniform(levels, resolution))
}

/// Diagnostic ramp: `units` holds of `resolution` paired with `0..units`.
pub fn constant_hold(units: usize, resolution: u32) -> Template {
    Template {
        hold_time: vec![resolution; units],
        voltage: (0..units).map(|i| i as i32).collect(),
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn square_sums_to_period(period in 0u32..200_000, pw in 0.001f64..0.999) {
            match square(0, 4095, period, pw) {
                Ok(t) => {
                    prop_assert_eq!(t.period(), period as u64);
                    prop_assert!(t.hold_time.iter().all(|&h| h >= MIN_HOLD_TIME));
                    let exact = period as f64 * pw;
                    prop_assert!(exact.min(period as f64 - exact) >= MIN_HOLD_TIME as f64);
                }
                Err(ValidationError::HoldTimeTooShort { value, .. }) => {
                    prop_assert!(value < MIN_HOLD_TIME as f64);
                    let exact = period as f64 * pw;
                    prop_assert_eq!(value, exact.min(period as f64 - exact));
                }
                Err(other) => prop_assert!(false, "unexpected error {other}"),
            }
        }

        #[test]
        fn generators_are_deterministic(
            a in -10.0f64..10.0,
            span in 0.01f64..10.0,
            units in 1usize..200,
        ) {
            let first = sine(a, a + span, 2047.0, 2048.0, units, 50).unwrap();
            let second = sine(a, a + span, 2047.0, 2048.0, units, 50).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn triangle_length(left in 0usize..50, right in 0usize..50) {
            prop_assume!(left + right > 0);
            let t = triangle(0, 4095, 0, left, right, 50).unwrap();
            prop_assert_eq!(t.len(), left + right);
        }
    }
}
