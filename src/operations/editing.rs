//! Segment extraction.
//!
//! This module implements the [`AudioEditing`] trait for [`PcmBuffer`].
//! Extraction never fails: out-of-range, negative and non-finite bounds are
//! clamped like any other value.

use std::borrow::Cow;

use tracing::trace;

use crate::PcmBuffer;
use crate::operations::traits::AudioEditing;
use crate::utils::audio_math::seconds_to_ms;

/// Resolves optional second bounds into a clamped `[start_ms, end_ms)` range.
fn segment_bounds(start_seconds: Option<f64>, end_seconds: Option<f64>, duration_ms: u64) -> (u64, u64) {
    let start_ms = start_seconds.map_or(0, seconds_to_ms).min(duration_ms);
    let end_ms = end_seconds
        .map_or(duration_ms, seconds_to_ms)
        .clamp(start_ms, duration_ms);
    (start_ms, end_ms)
}

impl AudioEditing for PcmBuffer {
    fn extract_segment(&self, start_seconds: Option<f64>, end_seconds: Option<f64>) -> Cow<'_, Self> {
        if start_seconds.is_none() && end_seconds.is_none() {
            return Cow::Borrowed(self);
        }

        let (start_ms, end_ms) = segment_bounds(start_seconds, end_seconds, self.duration_ms());
        trace!(start_ms, end_ms, "extracting segment");
        Cow::Owned(self.slice_ms(start_ms, end_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SampleWidth;
    use crate::utils::generation::{silence, sine_wave};
    use std::time::Duration;

    fn five_seconds() -> PcmBuffer {
        sine_wave(220.0, Duration::from_millis(5_000), 8_000, -3.0, SampleWidth::Two, 2).unwrap()
    }

    #[test]
    fn test_no_bounds_borrows_input() {
        let audio = five_seconds();
        let segment = audio.extract_segment(None, None);
        assert!(matches!(segment, Cow::Borrowed(_)));
        assert!(std::ptr::eq(segment.as_ref(), &audio));
    }

    #[test]
    fn test_extract_middle_segment() {
        let audio = five_seconds();
        let segment = audio.extract_segment(Some(1.0), Some(3.0));
        assert_eq!(segment.duration_ms(), 2_000);
        assert_eq!(segment.channels(), 2);
        assert_eq!(segment.frame_rate(), 8_000);
        assert_eq!(segment.samples()[[0, 0]], audio.samples()[[0, 8_000]]);
    }

    #[test]
    fn test_open_bounds_default_to_buffer_edges() {
        let audio = five_seconds();
        assert_eq!(audio.extract_segment(Some(4.0), None).duration_ms(), 1_000);
        assert_eq!(audio.extract_segment(None, Some(0.25)).duration_ms(), 250);
    }

    #[test]
    fn test_bounds_are_clamped() {
        let audio = five_seconds();

        let segment = audio.extract_segment(Some(-2.0), Some(99.0));
        assert_eq!(segment.frames(), audio.frames());

        let inverted = audio.extract_segment(Some(3.0), Some(1.0));
        assert_eq!(inverted.duration_ms(), 0);

        let past_end = audio.extract_segment(Some(10.0), Some(20.0));
        assert!(past_end.is_empty());

        let nan = audio.extract_segment(Some(f64::NAN), Some(f64::INFINITY));
        assert_eq!(nan.frames(), audio.frames());
    }

    #[test]
    fn test_extracted_duration_matches_clamped_bounds() {
        let audio = silence(Duration::from_millis(7_321), 11_025, SampleWidth::One, 1).unwrap();
        let duration = audio.duration_ms() as i64;

        for (start, end) in [(0.0, 1.0), (0.5, 0.75), (2.2, 9.0), (7.0, 7.321), (-1.0, 0.1)] {
            let segment = audio.extract_segment(Some(start), Some(end));
            let start_ms = ((start * 1000.0f64).floor() as i64).clamp(0, duration);
            let end_ms = ((end * 1000.0f64).floor() as i64).clamp(start_ms, duration);
            let expected = (end_ms - start_ms) as u64;
            let actual = segment.duration_ms();
            // Frame rounding at 11.025 kHz can shift a boundary by one millisecond.
            assert!(actual.abs_diff(expected) <= 1, "{start}..{end}: {actual} vs {expected}");
        }
    }

    #[test]
    fn test_segment_is_independent_copy() {
        let audio = five_seconds();
        let mut segment = audio.extract_segment(Some(0.0), Some(1.0)).into_owned();
        segment.samples_mut().fill(0);
        assert_ne!(audio.samples()[[0, 100]], 0);
    }
}
