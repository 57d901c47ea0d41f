//! Decibel and time conversion helpers shared by the analysis and effect code.
//!
//! # Examples
//!
//! ```rust
//! use audio_dynamics::audio_math::{amplitude_to_db, db_to_amplitude, round_to};
//!
//! let db = amplitude_to_db(0.5f64); // ≈ -6.02 dB
//! assert_eq!(round_to(db, 2), -6.02);
//! assert!((db_to_amplitude(-20.0f64) - 0.1).abs() < 1e-12);
//! ```

use num_traits::Float;

/// Converts a linear amplitude ratio to decibels.
///
/// Uses `dB = 20 * log10(amplitude)`. Unlike a display meter this does not
/// floor the result: a zero amplitude yields negative infinity, which callers
/// turn into an explicit silence sentinel.
///
/// # Examples
///
/// ```rust
/// use audio_dynamics::audio_math::amplitude_to_db;
///
/// assert_eq!(amplitude_to_db(1.0f64), 0.0);
/// assert_eq!(amplitude_to_db(0.0f64), f64::NEG_INFINITY);
/// ```
pub fn amplitude_to_db<F: Float>(amplitude: F) -> F {
    F::from(20.0).unwrap_or_else(F::one) * amplitude.log10()
}

/// Converts decibels to a linear amplitude ratio, `10^(dB / 20)`.
pub fn db_to_amplitude<F: Float>(db: F) -> F {
    let ten = F::from(10.0).unwrap_or_else(F::one);
    let twenty = F::from(20.0).unwrap_or_else(F::one);
    ten.powf(db / twenty)
}

/// Level of `amplitude` relative to `full_scale` in dBFS.
///
/// `amplitude == 0` gives negative infinity.
pub fn amplitude_to_dbfs(amplitude: f64, full_scale: f64) -> f64 {
    amplitude_to_db(amplitude / full_scale)
}

/// Absolute amplitude corresponding to `db` dBFS.
pub fn dbfs_to_amplitude(db: f64, full_scale: f64) -> f64 {
    full_scale * db_to_amplitude(db)
}

/// Rounds `value` to `digits` decimal places; non-finite values pass through.
pub fn round_to(value: f64, digits: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let scale = 10f64.powi(digits);
    (value * scale).round() / scale
}

/// Converts whole seconds (fractional allowed) to whole milliseconds, rounding down.
///
/// Negative and NaN inputs map to zero; the caller clamps the upper end.
pub fn seconds_to_ms(seconds: f64) -> u64 {
    let ms = (seconds * 1000.0).floor();
    if ms.is_nan() || ms <= 0.0 {
        0
    } else if ms >= u64::MAX as f64 {
        u64::MAX
    } else {
        ms as u64
    }
}

/// One-pole smoothing coefficient for a time constant of `time_ms` at `sample_rate`.
///
/// A non-positive time constant gives a coefficient of zero, i.e. no smoothing.
pub fn time_constant_coeff(time_ms: f64, sample_rate: f64) -> f64 {
    if time_ms > 0.0 {
        (-1.0 / (time_ms * 0.001 * sample_rate)).exp()
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amplitude_db_conversions() {
        assert!((amplitude_to_db(1.0f64) - 0.0f64).abs() < 0.001f64);
        assert!((db_to_amplitude(0.0f64) - 1.0f64).abs() < 0.001f64);

        assert!((amplitude_to_db(0.5f64) + 6.02f64).abs() < 0.01f64);
        assert!((db_to_amplitude(-6.0f32) - 0.501f32).abs() < 0.01f32);

        let amp = 0.3f64;
        assert!((amp - db_to_amplitude(amplitude_to_db(amp))).abs() < 1e-12);
    }

    #[test]
    fn test_dbfs_of_silence_is_negative_infinity() {
        assert_eq!(amplitude_to_dbfs(0.0, 32_768.0), f64::NEG_INFINITY);
        assert!((amplitude_to_dbfs(16_384.0, 32_768.0) + 6.0206).abs() < 1e-3);
        assert!((dbfs_to_amplitude(-50.0, 32_768.0) - 103.62).abs() < 0.01);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(-6.0206, 2), -6.02);
        assert_eq!(round_to(1.005_001, 2), 1.01);
        assert_eq!(round_to(f64::NEG_INFINITY, 2), f64::NEG_INFINITY);
    }

    #[test]
    fn test_seconds_to_ms() {
        assert_eq!(seconds_to_ms(1.0), 1000);
        assert_eq!(seconds_to_ms(2.9999), 2999);
        assert_eq!(seconds_to_ms(-3.0), 0);
        assert_eq!(seconds_to_ms(f64::NAN), 0);
        assert_eq!(seconds_to_ms(f64::INFINITY), u64::MAX);
    }

    #[test]
    fn test_time_constant_coeff() {
        assert_eq!(time_constant_coeff(0.0, 44_100.0), 0.0);
        let coeff = time_constant_coeff(5.0, 44_100.0);
        assert!(coeff > 0.99 && coeff < 1.0);
    }
}
