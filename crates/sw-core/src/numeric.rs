use crate::ValidationError;
use crate::limits::{DAC_MAX, DAC_MIN, MIN_HOLD_TIME};

/// Clamp a DAC code into the 12-bit output range.
#[inline]
pub fn clip_voltage(code: i64) -> i32 {
    code.clamp(DAC_MIN as i64, DAC_MAX as i64) as i32
}

/// Round a real-valued level to the nearest code, then clamp it.
///
/// Non-finite input saturates through the integer cast (NaN maps to 0).
#[inline]
pub fn clip_real(level: f64) -> i32 {
    clip_voltage(level.round() as i64)
}

/// Round half away from zero into `i32`, saturating at the type bounds.
#[inline]
pub fn round_i32(v: f64) -> i32 {
    v.round() as i32
}

/// `n` evenly spaced samples over `[start, end]`, both ends included.
///
/// The last sample is exactly `end` so ramps land on their target level.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            out[n - 1] = end;
            out
        }
    }
}

/// Shape check shared by records and working copies.
pub fn ensure_shape(hold_len: usize, voltage_len: usize) -> Result<(), ValidationError> {
    if hold_len != voltage_len {
        return Err(ValidationError::LengthMismatch {
            hold_len,
            voltage_len,
        });
    }
    if hold_len == 0 {
        return Err(ValidationError::Empty);
    }
    Ok(())
}

/// Every segment must respect the hardware floor. Reports the smallest entry.
pub fn ensure_hold_times(hold_time: &[u32], what: &'static str) -> Result<(), ValidationError> {
    match hold_time.iter().copied().min() {
        Some(min) if min < MIN_HOLD_TIME => Err(ValidationError::HoldTimeTooShort {
            what,
            value: min as f64,
            min: MIN_HOLD_TIME,
        }),
        _ => Ok(()),
    }
}

/// Prefix sum with a leading zero: the closed timeline of transition boundaries.
pub fn cumulative(hold_time: &[u32]) -> Vec<u64> {
    let mut out = Vec::with_capacity(hold_time.len() + 1);
    let mut acc = 0u64;
    out.push(acc);
    for &h in hold_time {
        acc += h as u64;
        out.push(acc);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_bounds() {
        assert_eq!(clip_voltage(-3000), 0);
        assert_eq!(clip_voltage(5000), 4095);
        assert_eq!(clip_voltage(1234), 1234);
        assert_eq!(clip_real(f64::NAN), 0);
        assert_eq!(clip_real(f64::INFINITY), 4095);
        assert_eq!(clip_real(2047.5), 2048);
    }

    #[test]
    fn linspace_endpoints() {
        assert_eq!(linspace(0.0, 10.0, 0), Vec::<f64>::new());
        assert_eq!(linspace(3.0, 10.0, 1), vec![3.0]);
        assert_eq!(linspace(0.0, 10.0, 3), vec![0.0, 5.0, 10.0]);
        let ramp = linspace(0.1, 0.7, 7);
        assert_eq!(ramp[6], 0.7);
    }

    #[test]
    fn shape_errors() {
        assert_eq!(
            ensure_shape(2, 3),
            Err(ValidationError::LengthMismatch {
                hold_len: 2,
                voltage_len: 3
            })
        );
        assert_eq!(ensure_shape(0, 0), Err(ValidationError::Empty));
        assert!(ensure_shape(4, 4).is_ok());
    }

    #[test]
    fn hold_time_floor_reports_minimum() {
        let err = ensure_hold_times(&[500, 49, 60], "holdTime").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("49"));
        assert!(ensure_hold_times(&[50, 50], "holdTime").is_ok());
    }

    #[test]
    fn cumulative_has_leading_zero() {
        assert_eq!(cumulative(&[500, 500]), vec![0, 500, 1000]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn clipped_code_in_range(v in any::<i64>()) {
            let c = clip_voltage(v);
            prop_assert!((DAC_MIN..=DAC_MAX).contains(&c));
        }

        #[test]
        fn cumulative_ends_at_sum(hold in prop::collection::vec(50u32..100_000, 1..64)) {
            let cum = cumulative(&hold);
            prop_assert_eq!(cum.len(), hold.len() + 1);
            prop_assert_eq!(cum[0], 0);
            prop_assert_eq!(*cum.last().unwrap(), hold.iter().map(|&h| h as u64).sum::<u64>());
        }
    }
}
