//! Synthetic PCM signal generation.
//!
//! These builders produce deterministic buffers for tests, benchmarks and the
//! demo without going through a decoder.

use std::f64::consts::PI;
use std::time::Duration;

use ndarray::{Array2, Axis, concatenate};

use crate::utils::audio_math::dbfs_to_amplitude;
use crate::{AudioError, AudioResult, PcmBuffer, SampleWidth};

fn frame_count(duration: Duration, sample_rate: u32) -> usize {
    (duration.as_secs_f64() * sample_rate as f64).round() as usize
}

/// Generates a sine wave whose peak sits at `peak_dbfs`.
///
/// Every channel carries the same signal.
///
/// # Arguments
/// * `frequency` - Frequency of the sine wave in Hz
/// * `duration` - Duration of the signal
/// * `sample_rate` - Sample rate in Hz
/// * `peak_dbfs` - Peak level relative to full scale (0.0 = full scale)
/// * `sample_width` - Output sample width
/// * `channels` - Number of identical channels
///
/// # Errors
/// Returns an error when `channels` or `sample_rate` is zero.
pub fn sine_wave(
    frequency: f64,
    duration: Duration,
    sample_rate: u32,
    peak_dbfs: f64,
    sample_width: SampleWidth,
    channels: usize,
) -> AudioResult<PcmBuffer> {
    let frames = frame_count(duration, sample_rate);
    let amplitude = dbfs_to_amplitude(peak_dbfs, sample_width.full_scale());
    let omega = 2.0 * PI * frequency / sample_rate as f64;

    let samples = Array2::from_shape_fn((channels, frames), |(_, n)| {
        sample_width.clip(amplitude * (omega * n as f64).sin())
    });
    PcmBuffer::new(samples, sample_width, sample_rate)
}

/// Generates digital silence.
///
/// # Errors
/// Returns an error when `channels` or `sample_rate` is zero.
pub fn silence(
    duration: Duration,
    sample_rate: u32,
    sample_width: SampleWidth,
    channels: usize,
) -> AudioResult<PcmBuffer> {
    constant(0, duration, sample_rate, sample_width, channels)
}

/// Generates a buffer where every sample equals `value`.
///
/// # Errors
/// Returns an error when `channels` or `sample_rate` is zero, or when `value`
/// does not fit in `sample_width`.
pub fn constant(
    value: i32,
    duration: Duration,
    sample_rate: u32,
    sample_width: SampleWidth,
    channels: usize,
) -> AudioResult<PcmBuffer> {
    let frames = frame_count(duration, sample_rate);
    PcmBuffer::new(
        Array2::from_elem((channels, frames), value),
        sample_width,
        sample_rate,
    )
}

/// Joins buffers end to end.
///
/// # Errors
/// Returns an error when `parts` is empty or the parts disagree on format.
pub fn concatenate_buffers(parts: &[PcmBuffer]) -> AudioResult<PcmBuffer> {
    let first = parts
        .first()
        .ok_or_else(|| AudioError::invalid_parameter("Nothing to concatenate"))?;

    if let Some(other) = parts.iter().find(|p| {
        p.channels() != first.channels()
            || p.frame_rate() != first.frame_rate()
            || p.sample_width() != first.sample_width()
    }) {
        return Err(AudioError::DimensionMismatch(format!(
            "cannot join {}ch/{}Hz/{:?} with {}ch/{}Hz/{:?}",
            first.channels(),
            first.frame_rate(),
            first.sample_width(),
            other.channels(),
            other.frame_rate(),
            other.sample_width()
        )));
    }

    let views: Vec<_> = parts.iter().map(PcmBuffer::samples).collect();
    let joined = concatenate(Axis(1), &views)
        .map_err(|e| AudioError::DimensionMismatch(e.to_string()))?;
    PcmBuffer::new(joined, first.sample_width(), first.frame_rate())
}
