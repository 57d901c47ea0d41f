//! Core PCM buffer representation.
//!
//! [`PcmBuffer`] is what the decoder collaborator hands to the core and what the
//! encoder collaborator receives back. Samples are held planar in an
//! [`ndarray::Array2`] of shape `(channels, frames)`; interleaving only exists at
//! the byte boundary (see [`PcmBuffer::from_interleaved_bytes`] and
//! [`PcmBuffer::to_interleaved_bytes`]).
//!
//! Every sample is stored widened to `i32` regardless of its on-the-wire width,
//! and the original width is kept in [`SampleWidth`] so that dBFS conversions and
//! clipping use the right full-scale value.

use ndarray::{Array2, ArrayView2, ArrayViewMut2, Axis, s};
use serde::{Deserialize, Serialize};

use crate::{AudioError, AudioResult};

/// Bytes per sample of signed little-endian integer PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleWidth {
    /// 8-bit signed samples.
    One,
    /// 16-bit signed samples.
    Two,
    /// 32-bit signed samples.
    Four,
}

impl SampleWidth {
    /// Resolve a width in bytes, as reported by a decoder.
    ///
    /// # Errors
    /// Returns [`AudioError::UnsupportedSampleWidth`] for anything other than 1, 2 or 4.
    pub fn from_bytes(bytes: usize) -> AudioResult<Self> {
        match bytes {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            4 => Ok(Self::Four),
            other => Err(AudioError::UnsupportedSampleWidth(other)),
        }
    }

    /// Width in bytes.
    pub const fn bytes(self) -> usize {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Four => 4,
        }
    }

    /// Full-scale amplitude `2^(8 * width - 1)`, the 0 dBFS reference.
    pub const fn full_scale(self) -> f64 {
        match self {
            Self::One => 128.0,
            Self::Two => 32_768.0,
            Self::Four => 2_147_483_648.0,
        }
    }

    /// Smallest representable sample.
    pub const fn min_value(self) -> i32 {
        match self {
            Self::One => i8::MIN as i32,
            Self::Two => i16::MIN as i32,
            Self::Four => i32::MIN,
        }
    }

    /// Largest representable sample.
    pub const fn max_value(self) -> i32 {
        match self {
            Self::One => i8::MAX as i32,
            Self::Two => i16::MAX as i32,
            Self::Four => i32::MAX,
        }
    }

    /// Round a floating-point sample and saturate it into the representable range.
    pub fn clip(self, value: f64) -> i32 {
        let rounded = value.round();
        if rounded <= self.min_value() as f64 {
            self.min_value()
        } else if rounded >= self.max_value() as f64 {
            self.max_value()
        } else {
            rounded as i32
        }
    }
}

/// Decoded PCM audio with its format metadata.
///
/// A `PcmBuffer` owns its samples. Slicing always produces an independent copy,
/// so chunks cut from the same buffer can be handed to different worker
/// threads without sharing memory.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    samples: Array2<i32>,
    sample_width: SampleWidth,
    frame_rate: u32,
}

impl PcmBuffer {
    /// Create a buffer from planar samples of shape `(channels, frames)`.
    ///
    /// # Errors
    /// Returns an error when the buffer has no channels, the frame rate is zero,
    /// or a sample does not fit in `sample_width`.
    pub fn new(samples: Array2<i32>, sample_width: SampleWidth, frame_rate: u32) -> AudioResult<Self> {
        if samples.nrows() == 0 {
            return Err(AudioError::invalid_parameter(
                "PCM buffer must have at least one channel",
            ));
        }
        if frame_rate == 0 {
            return Err(AudioError::invalid_parameter("Frame rate must be > 0"));
        }
        let (lo, hi) = (sample_width.min_value(), sample_width.max_value());
        if let Some(bad) = samples.iter().find(|&&v| v < lo || v > hi) {
            return Err(AudioError::invalid_parameter(format!(
                "Sample {bad} does not fit in {} byte(s)",
                sample_width.bytes()
            )));
        }

        Ok(Self {
            samples,
            sample_width,
            frame_rate,
        })
    }

    /// Create a zero-length buffer with the given format.
    ///
    /// # Errors
    /// Returns an error when `channels` or `frame_rate` is zero.
    pub fn empty(sample_width: SampleWidth, frame_rate: u32, channels: usize) -> AudioResult<Self> {
        Self::new(Array2::zeros((channels, 0)), sample_width, frame_rate)
    }

    /// Create a buffer from interleaved samples (`LRLRLR...`).
    ///
    /// # Errors
    /// Returns [`AudioError::DimensionMismatch`] when the sample count is not a
    /// multiple of `channels`, plus the errors of [`PcmBuffer::new`].
    pub fn from_interleaved(
        interleaved: &[i32],
        channels: usize,
        sample_width: SampleWidth,
        frame_rate: u32,
    ) -> AudioResult<Self> {
        if channels == 0 {
            return Err(AudioError::invalid_parameter(
                "PCM buffer must have at least one channel",
            ));
        }
        if interleaved.len() % channels != 0 {
            return Err(AudioError::DimensionMismatch(format!(
                "{} samples cannot be split into {channels} channels",
                interleaved.len()
            )));
        }

        let frames = interleaved.len() / channels;
        let samples = Array2::from_shape_fn((channels, frames), |(ch, frame)| {
            interleaved[frame * channels + ch]
        });
        Self::new(samples, sample_width, frame_rate)
    }

    /// Wrap raw little-endian PCM bytes as produced by the decoder collaborator.
    ///
    /// # Errors
    /// Returns an error for unsupported widths, zero channels or frame rate, and
    /// byte buffers that are not a whole number of frames.
    pub fn from_interleaved_bytes(
        bytes: &[u8],
        sample_width: usize,
        frame_rate: u32,
        channels: usize,
    ) -> AudioResult<Self> {
        let width = SampleWidth::from_bytes(sample_width)?;
        if channels == 0 {
            return Err(AudioError::invalid_parameter(
                "PCM buffer must have at least one channel",
            ));
        }
        let frame_bytes = width.bytes() * channels;
        if bytes.len() % frame_bytes != 0 {
            return Err(AudioError::DimensionMismatch(format!(
                "{} bytes is not a whole number of {frame_bytes}-byte frames",
                bytes.len()
            )));
        }

        let interleaved: Vec<i32> = match width {
            SampleWidth::One => bytes.iter().map(|&b| b as i8 as i32).collect(),
            SampleWidth::Two => bytes
                .chunks_exact(2)
                .map(|b| i16::from_le_bytes([b[0], b[1]]) as i32)
                .collect(),
            SampleWidth::Four => bytes
                .chunks_exact(4)
                .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect(),
        };

        Self::from_interleaved(&interleaved, channels, width, frame_rate)
    }

    /// Build a buffer with this buffer's format around new samples.
    ///
    /// Callers guarantee the samples are already within the width's range.
    pub(crate) fn spawn(&self, samples: Array2<i32>) -> Self {
        Self {
            samples,
            sample_width: self.sample_width,
            frame_rate: self.frame_rate,
        }
    }

    /// Planar view of the samples, shape `(channels, frames)`.
    pub fn samples(&self) -> ArrayView2<'_, i32> {
        self.samples.view()
    }

    /// Mutable planar view of the samples.
    pub(crate) fn samples_mut(&mut self) -> ArrayViewMut2<'_, i32> {
        self.samples.view_mut()
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.samples.nrows()
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.ncols()
    }

    /// Frame rate in Hz.
    pub const fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    /// Sample width.
    pub const fn sample_width(&self) -> SampleWidth {
        self.sample_width
    }

    /// True when the buffer holds no frames.
    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    /// Whole milliseconds of audio, `frames * 1000 / frame_rate` rounded down.
    pub fn duration_ms(&self) -> u64 {
        self.frames() as u64 * 1000 / self.frame_rate as u64
    }

    /// Exact duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.frames() as f64 / self.frame_rate as f64
    }

    /// Frame index at millisecond offset `ms`, clamped to the buffer.
    ///
    /// Offsets at or past [`PcmBuffer::duration_ms`] map to the final frame so
    /// that a slice ending at the duration also covers the sub-millisecond tail.
    pub fn ms_to_frame(&self, ms: u64) -> usize {
        if ms >= self.duration_ms() {
            return self.frames();
        }
        (ms * self.frame_rate as u64 / 1000) as usize
    }

    /// Copy of the frames in `[start_ms, end_ms)`, both clamped into the buffer.
    pub fn slice_ms(&self, start_ms: u64, end_ms: u64) -> Self {
        let start = self.ms_to_frame(start_ms);
        let end = self.ms_to_frame(end_ms).max(start);
        self.slice_frames(start, end)
    }

    /// Copy of the frames in `[start, end)`, both clamped into the buffer.
    pub fn slice_frames(&self, start: usize, end: usize) -> Self {
        let end = end.min(self.frames());
        let start = start.min(end);
        self.spawn(self.samples.slice(s![.., start..end]).to_owned())
    }

    /// Largest absolute sample value across all channels.
    pub fn peak_amplitude(&self) -> u32 {
        self.samples
            .iter()
            .map(|s| s.unsigned_abs())
            .max()
            .unwrap_or(0)
    }

    /// Peak of each frame across channels, one value per frame.
    pub(crate) fn frame_peaks(&self) -> Vec<u32> {
        self.samples
            .axis_iter(Axis(1))
            .map(|frame| frame.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0))
            .collect()
    }

    /// Samples in interleaved order.
    pub fn to_interleaved(&self) -> Vec<i32> {
        // Transposed iteration walks frame by frame.
        self.samples.t().iter().copied().collect()
    }

    /// Raw little-endian bytes for the encoder collaborator.
    pub fn to_interleaved_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.samples.len() * self.sample_width.bytes());
        for &sample in self.samples.t().iter() {
            match self.sample_width {
                SampleWidth::One => out.push(sample as i8 as u8),
                SampleWidth::Two => out.extend_from_slice(&(sample as i16).to_le_bytes()),
                SampleWidth::Four => out.extend_from_slice(&sample.to_le_bytes()),
            }
        }
        out
    }
}
