//! Trait definitions for the operations available on a
//! [`PcmBuffer`](crate::PcmBuffer).
//!
//! Each trait has a single responsibility and is implemented in its own
//! module. Analysis traits borrow the buffer; effect traits mutate it in place
//! and leave format (width, rate, channels) untouched.

use std::borrow::Cow;

use super::types::{AnalysisConfig, CompressorConfig, LimiterConfig, StatisticsRecord};
use crate::AudioResult;

/// Loudness and duration analysis.
pub trait AudioStatistics {
    /// Computes the statistics record with the default analysis settings and
    /// the process-wide worker count.
    ///
    /// # Errors
    /// Returns an error when a chunk worker fails.
    fn statistics(&self) -> AudioResult<StatisticsRecord>;

    /// Computes the statistics record with explicit analysis settings.
    ///
    /// # Errors
    /// Returns [`AudioError::InvalidParameter`](crate::AudioError::InvalidParameter)
    /// for an invalid `config`, or a chunk failure from the reduction.
    fn statistics_with(&self, config: &AnalysisConfig) -> AudioResult<StatisticsRecord>;
}

/// Time-range editing.
pub trait AudioEditing: Clone {
    /// Extracts the segment between `start_seconds` and `end_seconds`.
    ///
    /// With neither bound set the buffer itself is returned, borrowed.
    /// Otherwise a missing start means the beginning and a missing end means
    /// the full duration. Bounds are truncated to whole milliseconds and
    /// clamped into the buffer, with the end never before the start.
    ///
    /// # Arguments
    /// * `start_seconds` - Segment start, in seconds
    /// * `end_seconds` - Segment end, in seconds
    fn extract_segment(&self, start_seconds: Option<f64>, end_seconds: Option<f64>) -> Cow<'_, Self>;
}

/// Level normalization.
pub trait AudioProcessing {
    /// Scales the buffer so its peak sits `headroom_db` below full scale.
    ///
    /// Silent buffers are left unchanged.
    ///
    /// # Errors
    /// Returns an error when `headroom_db` is negative or not finite.
    fn normalize(&mut self, headroom_db: f64) -> AudioResult<()>;
}

/// Compressor and limiter effects.
pub trait AudioDynamicRange {
    /// Applies downward compression in place.
    ///
    /// # Errors
    /// Returns an error when `config` fails validation.
    fn apply_compressor(&mut self, config: &CompressorConfig) -> AudioResult<()>;

    /// Applies peak limiting in place: a fast, high-ratio compressor followed
    /// by normalization to a fixed headroom.
    ///
    /// # Errors
    /// Returns an error when `config` fails validation.
    fn apply_limiter(&mut self, config: &LimiterConfig) -> AudioResult<()>;
}
