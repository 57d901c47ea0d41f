//! Silence scanning over millisecond windows.
//!
//! A window of `min_silence_len_ms` slides over the buffer in steps of
//! `seek_step_ms`. Windows whose level is at or below the threshold amplitude
//! are silent; runs of silent windows are merged into silent ranges, and the
//! non-silent ranges are their complement.
//!
//! Levels are computed once per millisecond block. Window peaks come from a
//! sliding maximum over the block peaks and window RMS from prefix sums over
//! the block energies, so a scan costs one pass over the samples plus one
//! pass over the blocks.

use std::collections::VecDeque;

use ndarray::s;
use tracing::trace;

use crate::operations::types::{SilenceConfig, SilenceMeasure};
use crate::utils::audio_math::dbfs_to_amplitude;
use crate::{AudioResult, PcmBuffer};

/// Per-millisecond loudness summary of a buffer.
struct BlockLevels {
    peaks: Vec<u32>,
    /// Prefix sums of squared samples; `energy[k]` covers blocks `[0, k)`.
    energy: Vec<f64>,
    /// Prefix sums of sample counts, aligned with `energy`.
    counts: Vec<usize>,
}

impl BlockLevels {
    fn measure(buffer: &PcmBuffer) -> Self {
        let blocks = buffer.duration_ms() as usize;
        let samples = buffer.samples();

        let mut peaks = Vec::with_capacity(blocks);
        let mut energy = Vec::with_capacity(blocks + 1);
        let mut counts = Vec::with_capacity(blocks + 1);
        energy.push(0.0);
        counts.push(0);

        for k in 0..blocks as u64 {
            let start = buffer.ms_to_frame(k);
            let end = buffer.ms_to_frame(k + 1).max(start);
            let block = samples.slice(s![.., start..end]);

            let mut peak = 0u32;
            let mut sum_sq = 0.0f64;
            for &sample in block.iter() {
                peak = peak.max(sample.unsigned_abs());
                sum_sq += f64::from(sample) * f64::from(sample);
            }

            peaks.push(peak);
            energy.push(energy[energy.len() - 1] + sum_sq);
            counts.push(counts[counts.len() - 1] + block.len());
        }

        Self {
            peaks,
            energy,
            counts,
        }
    }

    fn rms(&self, start: usize, end: usize) -> f64 {
        let n = self.counts[end] - self.counts[start];
        if n == 0 {
            return 0.0;
        }
        ((self.energy[end] - self.energy[start]) / n as f64).sqrt()
    }
}

/// Maximum of every length-`window` run of `values`, one per start position.
fn sliding_max(values: &[u32], window: usize) -> Vec<u32> {
    if window == 0 || values.len() < window {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(values.len() - window + 1);
    let mut candidates: VecDeque<usize> = VecDeque::new();

    for (i, &value) in values.iter().enumerate() {
        while candidates.back().is_some_and(|&j| values[j] <= value) {
            candidates.pop_back();
        }
        candidates.push_back(i);
        if candidates.front().is_some_and(|&j| j + window <= i) {
            candidates.pop_front();
        }
        if i + 1 >= window {
            if let Some(&j) = candidates.front() {
                out.push(values[j]);
            }
        }
    }
    out
}

/// Window start offsets: every `step` ms up to `last`, plus `last` itself.
fn window_starts(last: usize, step: usize) -> impl Iterator<Item = usize> {
    let tail = (last % step != 0).then_some(last);
    (0..=last).step_by(step).chain(tail)
}

/// Level of the whole buffer under `measure`, in sample units.
fn whole_buffer_level(buffer: &PcmBuffer, measure: SilenceMeasure) -> f64 {
    match measure {
        SilenceMeasure::Peak => f64::from(buffer.peak_amplitude()),
        SilenceMeasure::Rms => {
            let samples = buffer.samples();
            if samples.is_empty() {
                return 0.0;
            }
            let sum_sq: f64 = samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
            (sum_sq / samples.len() as f64).sqrt()
        }
    }
}

/// Finds the silent ranges of `buffer`, in milliseconds relative to its start.
///
/// Silent window starts closer together than one window length are merged
/// into a single range. A buffer shorter than one window is judged as a whole:
/// it is either one silent range or none.
///
/// # Errors
/// Returns [`AudioError::InvalidParameter`](crate::AudioError::InvalidParameter)
/// when `config` fails validation.
pub fn detect_silence(buffer: &PcmBuffer, config: &SilenceConfig) -> AudioResult<Vec<(u64, u64)>> {
    config.validate()?;

    let len_ms = buffer.duration_ms();
    if len_ms == 0 {
        return Ok(Vec::new());
    }

    let threshold = dbfs_to_amplitude(config.threshold_db, buffer.sample_width().full_scale());
    let window_ms = config.min_silence_len_ms;

    if len_ms < window_ms {
        let silent = whole_buffer_level(buffer, config.measure) <= threshold;
        return Ok(if silent { vec![(0, len_ms)] } else { Vec::new() });
    }

    let levels = BlockLevels::measure(buffer);
    let window = window_ms as usize;
    let step = config.seek_step_ms as usize;
    let last = len_ms as usize - window;

    let window_peaks = match config.measure {
        SilenceMeasure::Peak => sliding_max(&levels.peaks, window),
        SilenceMeasure::Rms => Vec::new(),
    };
    let level_at = |start: usize| match config.measure {
        SilenceMeasure::Peak => f64::from(window_peaks[start]),
        SilenceMeasure::Rms => levels.rms(start, start + window),
    };

    let mut silent_starts = window_starts(last, step).filter(|&start| level_at(start) <= threshold);

    let Some(first) = silent_starts.next() else {
        return Ok(Vec::new());
    };

    let mut ranges = Vec::new();
    let mut range_start = first;
    let mut prev = first;
    for start in silent_starts {
        let continuous = start == prev + step;
        let has_gap = start > prev + window;
        if !continuous && has_gap {
            ranges.push((range_start as u64, (prev + window) as u64));
            range_start = start;
        }
        prev = start;
    }
    ranges.push((range_start as u64, (prev + window) as u64));

    trace!(len_ms, silent_ranges = ranges.len(), "silence scan complete");
    Ok(ranges)
}

/// Finds the non-silent ranges of `buffer`, the complement of [`detect_silence`].
///
/// Ranges are ordered, non-overlapping and relative to the buffer start. A
/// wholly silent buffer of any length yields no ranges.
///
/// # Errors
/// Returns [`AudioError::InvalidParameter`](crate::AudioError::InvalidParameter)
/// when `config` fails validation.
pub fn detect_nonsilent(buffer: &PcmBuffer, config: &SilenceConfig) -> AudioResult<Vec<(u64, u64)>> {
    let silent = detect_silence(buffer, config)?;
    let len_ms = buffer.duration_ms();

    if len_ms == 0 {
        return Ok(Vec::new());
    }
    if silent.is_empty() {
        return Ok(vec![(0, len_ms)]);
    }
    if silent[0] == (0, len_ms) {
        return Ok(Vec::new());
    }

    let mut ranges = Vec::with_capacity(silent.len() + 1);
    let mut prev_end = 0;
    for &(start, end) in &silent {
        ranges.push((prev_end, start));
        prev_end = end;
    }
    if prev_end != len_ms {
        ranges.push((prev_end, len_ms));
    }
    if ranges.first() == Some(&(0, 0)) {
        ranges.remove(0);
    }
    Ok(ranges)
}

/// Total length of the non-silent ranges of `buffer`, in milliseconds.
///
/// # Errors
/// Same conditions as [`detect_nonsilent`].
pub fn nonsilent_ms(buffer: &PcmBuffer, config: &SilenceConfig) -> AudioResult<u64> {
    Ok(detect_nonsilent(buffer, config)?
        .iter()
        .map(|(start, end)| end - start)
        .sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::generation::{concatenate_buffers, silence, sine_wave};
    use crate::{AudioError, SampleWidth};
    use std::time::Duration;

    const RATE: u32 = 8_000;

    fn tone(ms: u64) -> PcmBuffer {
        sine_wave(440.0, Duration::from_millis(ms), RATE, -6.0, SampleWidth::Two, 1).unwrap()
    }

    fn quiet(ms: u64) -> PcmBuffer {
        silence(Duration::from_millis(ms), RATE, SampleWidth::Two, 1).unwrap()
    }

    fn join(parts: &[PcmBuffer]) -> PcmBuffer {
        concatenate_buffers(parts).unwrap()
    }

    #[test]
    fn test_sliding_max() {
        assert_eq!(sliding_max(&[1, 3, 2, 5, 4, 1], 3), vec![3, 5, 5, 5]);
        assert_eq!(sliding_max(&[7, 1], 1), vec![7, 1]);
        assert!(sliding_max(&[1, 2], 3).is_empty());
    }

    #[test]
    fn test_window_starts_include_last() {
        assert_eq!(window_starts(25, 10).collect::<Vec<_>>(), vec![0, 10, 20, 25]);
        assert_eq!(window_starts(20, 10).collect::<Vec<_>>(), vec![0, 10, 20]);
        assert_eq!(window_starts(0, 1).collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_silent_buffer_has_no_nonsilent_ranges() {
        let config = SilenceConfig::new();
        let audio = quiet(5_000);
        assert_eq!(detect_silence(&audio, &config).unwrap(), vec![(0, 5_000)]);
        assert!(detect_nonsilent(&audio, &config).unwrap().is_empty());
    }

    #[test]
    fn test_loud_buffer_is_one_range() {
        let audio = tone(2_000);
        assert_eq!(
            detect_nonsilent(&audio, &SilenceConfig::new()).unwrap(),
            vec![(0, 2_000)]
        );
    }

    #[test]
    fn test_gap_splits_ranges() {
        let audio = join(&[tone(1_000), quiet(1_000), tone(1_000)]);
        let config = SilenceConfig::new();
        assert_eq!(detect_silence(&audio, &config).unwrap(), vec![(1_000, 2_000)]);
        assert_eq!(
            detect_nonsilent(&audio, &config).unwrap(),
            vec![(0, 1_000), (2_000, 3_000)]
        );
        assert_eq!(nonsilent_ms(&audio, &config).unwrap(), 2_000);
    }

    #[test]
    fn test_leading_and_trailing_silence() {
        let config = SilenceConfig::new();

        let leading = join(&[quiet(500), tone(500)]);
        assert_eq!(detect_nonsilent(&leading, &config).unwrap(), vec![(500, 1_000)]);

        let trailing = join(&[tone(500), quiet(500)]);
        assert_eq!(detect_nonsilent(&trailing, &config).unwrap(), vec![(0, 500)]);
    }

    #[test]
    fn test_short_gap_does_not_split() {
        let audio = join(&[tone(500), quiet(50), tone(500)]);
        assert_eq!(
            detect_nonsilent(&audio, &SilenceConfig::new()).unwrap(),
            vec![(0, 1_050)]
        );
    }

    #[test]
    fn test_short_buffer_is_judged_whole() {
        let config = SilenceConfig::new();
        assert!(detect_nonsilent(&quiet(50), &config).unwrap().is_empty());
        assert_eq!(detect_nonsilent(&tone(50), &config).unwrap(), vec![(0, 50)]);

        let empty = PcmBuffer::empty(SampleWidth::Two, RATE, 1).unwrap();
        assert!(detect_nonsilent(&empty, &config).unwrap().is_empty());
        assert!(detect_silence(&empty, &config).unwrap().is_empty());
    }

    #[test]
    fn test_last_window_is_always_evaluated() {
        let config = SilenceConfig {
            seek_step_ms: 10,
            ..SilenceConfig::new()
        };
        let audio = quiet(1_005);
        assert_eq!(detect_silence(&audio, &config).unwrap(), vec![(0, 1_005)]);
        assert!(detect_nonsilent(&audio, &config).unwrap().is_empty());
    }

    #[test]
    fn test_peak_and_rms_measures_differ_on_clicks() {
        let mut audio = quiet(1_000);
        audio.samples_mut()[[0, 4_000]] = 2_000;

        let peak = SilenceConfig::new();
        assert_eq!(detect_nonsilent(&audio, &peak).unwrap(), vec![(500, 501)]);

        let rms = SilenceConfig {
            measure: SilenceMeasure::Rms,
            ..SilenceConfig::new()
        };
        assert!(detect_nonsilent(&audio, &rms).unwrap().is_empty());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        // -50 dBFS of 32768 is ~103.6; a constant 103 sits just under it.
        let mut audio = quiet(300);
        audio.samples_mut().fill(103);
        assert!(detect_nonsilent(&audio, &SilenceConfig::new()).unwrap().is_empty());

        audio.samples_mut().fill(104);
        assert_eq!(
            detect_nonsilent(&audio, &SilenceConfig::new()).unwrap(),
            vec![(0, 300)]
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = SilenceConfig {
            seek_step_ms: 0,
            ..SilenceConfig::new()
        };
        assert!(matches!(
            detect_nonsilent(&quiet(200), &config),
            Err(AudioError::InvalidParameter(_))
        ));
    }
}
