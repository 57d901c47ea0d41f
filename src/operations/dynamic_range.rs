//! Dynamic range processing implementation.
//!
//! This module provides a feed-forward compressor and a limiter built on it.
//! The detector is the per-frame peak across all channels (linked stereo), so
//! every channel of a frame receives the same gain and the stereo image is
//! preserved.

use ndarray::Axis;
use tracing::debug;

use crate::operations::traits::{AudioDynamicRange, AudioProcessing};
use crate::operations::types::{CompressorConfig, LIMITER_HEADROOM_DB, LimiterConfig};
use crate::utils::audio_math::{amplitude_to_dbfs, db_to_amplitude, time_constant_coeff};
use crate::{AudioResult, PcmBuffer};

/// One-pole smoother for gain reduction with separate attack and release.
///
/// The attack coefficient is used while the target reduction rises and the
/// release coefficient while it falls.
#[derive(Debug, Clone)]
pub struct GainSmoother {
    /// Current gain reduction in dB (non-negative)
    reduction_db: f64,
    /// Attack coefficient (0.0 to 1.0)
    attack_coeff: f64,
    /// Release coefficient (0.0 to 1.0)
    release_coeff: f64,
}

impl GainSmoother {
    /// Create a new smoother.
    ///
    /// # Arguments
    /// * `attack_ms` - Attack time in milliseconds
    /// * `release_ms` - Release time in milliseconds
    /// * `sample_rate` - Sample rate in Hz
    pub fn new(attack_ms: f64, release_ms: f64, sample_rate: f64) -> Self {
        Self {
            reduction_db: 0.0,
            attack_coeff: time_constant_coeff(attack_ms, sample_rate),
            release_coeff: time_constant_coeff(release_ms, sample_rate),
        }
    }

    /// Advance one frame towards `target_db` and return the smoothed reduction.
    pub fn process(&mut self, target_db: f64) -> f64 {
        let coeff = if target_db > self.reduction_db {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.reduction_db = coeff * self.reduction_db + (1.0 - coeff) * target_db;
        self.reduction_db
    }

    /// Current gain reduction in dB.
    pub const fn reduction_db(&self) -> f64 {
        self.reduction_db
    }
}

/// Static compression curve: reduction in dB for a detector level in dBFS.
///
/// Levels at or below the threshold (including silence at `-inf`) get none.
pub fn compression_gain_db(level_db: f64, threshold_db: f64, ratio: f64) -> f64 {
    if level_db > threshold_db {
        (level_db - threshold_db) * (1.0 - 1.0 / ratio)
    } else {
        0.0
    }
}

/// Returns a compressed copy of `buffer`.
///
/// # Errors
/// Returns an error when `config` fails validation.
pub fn compress(buffer: &PcmBuffer, config: &CompressorConfig) -> AudioResult<PcmBuffer> {
    let mut out = buffer.clone();
    out.apply_compressor(config)?;
    Ok(out)
}

/// Returns a limited copy of `buffer`.
///
/// # Errors
/// Returns an error when `config` fails validation.
pub fn limit(buffer: &PcmBuffer, config: &LimiterConfig) -> AudioResult<PcmBuffer> {
    let mut out = buffer.clone();
    out.apply_limiter(config)?;
    Ok(out)
}

impl AudioDynamicRange for PcmBuffer {
    fn apply_compressor(&mut self, config: &CompressorConfig) -> AudioResult<()> {
        config.validate()?;

        let width = self.sample_width();
        let full_scale = width.full_scale();
        let mut smoother = GainSmoother::new(config.attack_ms, config.release_ms, f64::from(self.frame_rate()));
        let mut max_reduction = 0.0f64;

        let peaks = self.frame_peaks();
        for (mut frame, peak) in self.samples_mut().axis_iter_mut(Axis(1)).zip(peaks) {
            let level_db = amplitude_to_dbfs(f64::from(peak), full_scale);
            let target = compression_gain_db(level_db, config.threshold_db, config.ratio);
            let reduction = smoother.process(target);
            max_reduction = max_reduction.max(reduction);

            let gain = db_to_amplitude(-reduction);
            frame.mapv_inplace(|s| width.clip(f64::from(s) * gain));
        }

        debug!(
            threshold_db = config.threshold_db,
            ratio = config.ratio,
            max_reduction_db = max_reduction,
            "compressor applied"
        );
        Ok(())
    }

    fn apply_limiter(&mut self, config: &LimiterConfig) -> AudioResult<()> {
        config.validate()?;
        self.apply_compressor(&config.as_compressor())?;
        self.normalize(LIMITER_HEADROOM_DB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SampleWidth;
    use crate::utils::generation::{concatenate_buffers, constant, silence, sine_wave};
    use approx_eq::assert_approx_eq;
    use std::time::Duration;

    const RATE: u32 = 8_000;

    fn peak_dbfs(buffer: &PcmBuffer) -> f64 {
        amplitude_to_dbfs(f64::from(buffer.peak_amplitude()), buffer.sample_width().full_scale())
    }

    #[test]
    fn test_gain_smoother_attack_and_release() {
        let mut smoother = GainSmoother::new(1.0, 10.0, 1_000.0);
        // One-sample attack constant: e^-1 of the gap remains after a step.
        let first = smoother.process(10.0);
        assert!((first - 10.0 * (1.0 - (-1.0f64).exp())).abs() < 1e-9);

        for _ in 0..50 {
            smoother.process(10.0);
        }
        assert!((smoother.reduction_db() - 10.0).abs() < 1e-6);

        let released = smoother.process(0.0);
        assert!((released - 10.0 * (-0.1f64).exp()).abs() < 1e-9);
    }

    #[test]
    fn test_compression_curve() {
        assert_eq!(compression_gain_db(-30.0, -20.0, 4.0), 0.0);
        assert_eq!(compression_gain_db(f64::NEG_INFINITY, -20.0, 4.0), 0.0);
        assert_approx_eq!(compression_gain_db(-6.0, -20.0, 4.0), 10.5);
        assert_eq!(compression_gain_db(-6.0, -20.0, 1.0), 0.0);
    }

    #[test]
    fn test_steady_level_reaches_static_curve() {
        let level = (32_768.0 * 10f64.powf(-6.0 / 20.0)).round() as i32;
        let audio = constant(level, Duration::from_secs(1), RATE, SampleWidth::Two, 2).unwrap();
        let compressed = compress(&audio, &CompressorConfig::new()).unwrap();

        let last = compressed.samples()[[1, compressed.frames() - 1]];
        let reduction = 20.0 * (f64::from(level) / f64::from(last)).log10();
        assert!((reduction - 10.5).abs() < 0.05, "reduction was {reduction}");
    }

    #[test]
    fn test_default_compressor_on_tone() {
        let audio = sine_wave(440.0, Duration::from_secs(2), RATE, -6.0, SampleWidth::Two, 1).unwrap();
        let compressed = compress(&audio, &CompressorConfig::new()).unwrap();

        let settled = compressed.slice_ms(1_000, 2_000);
        let reduction = peak_dbfs(&audio) - peak_dbfs(&settled);
        assert!((8.0..11.5).contains(&reduction), "reduction was {reduction}");
        assert_eq!(compressed.frames(), audio.frames());
        assert_eq!(compressed.sample_width(), audio.sample_width());
    }

    #[test]
    fn test_quiet_signal_passes_through() {
        let audio = sine_wave(440.0, Duration::from_millis(500), RATE, -30.0, SampleWidth::Two, 2).unwrap();
        let compressed = compress(&audio, &CompressorConfig::new()).unwrap();
        assert_eq!(compressed, audio);
    }

    #[test]
    fn test_channels_share_gain() {
        let loud = sine_wave(440.0, Duration::from_millis(500), RATE, -3.0, SampleWidth::Two, 1).unwrap();
        let left = loud.samples().row(0).to_owned();
        let right = left.mapv(|s| s / 2);
        let samples = ndarray::stack(Axis(0), &[left.view(), right.view()]).unwrap();
        let audio = PcmBuffer::new(samples, SampleWidth::Two, RATE).unwrap();
        let compressed = compress(&audio, &CompressorConfig::new()).unwrap();

        for n in [1_000, 2_345, 3_999] {
            let left = f64::from(compressed.samples()[[0, n]]);
            let right = f64::from(compressed.samples()[[1, n]]);
            assert!((left / 2.0 - right).abs() <= 1.0, "frame {n}: {left} vs {right}");
        }
    }

    #[test]
    fn test_limiter_respects_headroom() {
        let audio = sine_wave(440.0, Duration::from_secs(1), RATE, 0.0, SampleWidth::Two, 2).unwrap();
        let limited = limit(&audio, &LimiterConfig::new()).unwrap();
        assert!(peak_dbfs(&limited) <= -LIMITER_HEADROOM_DB);
        assert!(peak_dbfs(&limited) > -0.2);
    }

    #[test]
    fn test_limiter_on_mixed_material() {
        let parts = [
            silence(Duration::from_millis(300), RATE, SampleWidth::Four, 1).unwrap(),
            sine_wave(220.0, Duration::from_millis(700), RATE, -0.5, SampleWidth::Four, 1).unwrap(),
        ];
        let audio = concatenate_buffers(&parts).unwrap();
        let limited = limit(&audio, &LimiterConfig::new()).unwrap();
        assert!(peak_dbfs(&limited) <= -LIMITER_HEADROOM_DB);
        assert!(limited.samples().iter().take(2_400).all(|&s| s == 0));
    }

    #[test]
    fn test_zero_length_input() {
        let empty = PcmBuffer::empty(SampleWidth::Two, RATE, 2).unwrap();
        assert!(compress(&empty, &CompressorConfig::new()).unwrap().is_empty());
        let limited = limit(&empty, &LimiterConfig::new()).unwrap();
        assert!(limited.is_empty());
        assert_eq!(limited.channels(), 2);
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        let audio = silence(Duration::from_millis(10), RATE, SampleWidth::Two, 1).unwrap();
        let bad_ratio = CompressorConfig {
            ratio: 0.5,
            ..CompressorConfig::new()
        };
        assert!(compress(&audio, &bad_ratio).is_err());

        let bad_release = LimiterConfig {
            release_ms: -5.0,
            ..LimiterConfig::new()
        };
        assert!(limit(&audio, &bad_release).is_err());
    }
}
