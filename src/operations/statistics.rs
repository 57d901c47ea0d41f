//! Statistical analysis operations for [`PcmBuffer`].
//!
//! This module implements the [`AudioStatistics`] trait. The record is built
//! from three independent chunk-parallel reductions over the buffer (peak
//! level, quietest non-zero level, non-silent time) plus the duration, which
//! is read directly.
//!
//! Non-silent time is measured per chunk and summed, so a silent gap straddling
//! a chunk boundary may be split into two pieces shorter than the minimum
//! silence length and counted as sound.

use tracing::debug;

use super::silence::nonsilent_ms;
use super::traits::AudioStatistics;
use super::types::{AnalysisConfig, Level, StatisticsRecord};
use crate::parallel::ChunkReducer;
use crate::utils::audio_math::{amplitude_to_dbfs, round_to};
use crate::{AudioResult, PcmBuffer};

const DECIMALS: i32 = 2;

fn reducer_for(config: &AnalysisConfig) -> ChunkReducer {
    let reducer = ChunkReducer::new().with_min_chunk_ms(config.min_chunk_ms);
    match config.num_threads {
        Some(workers) => reducer.with_workers(workers),
        None => reducer,
    }
}

fn chunk_peak_db(chunk: &PcmBuffer, full_scale: f64) -> f64 {
    amplitude_to_dbfs(f64::from(chunk.peak_amplitude()), full_scale)
}

/// Smallest non-zero magnitude in `chunk`, if any.
fn chunk_floor(chunk: &PcmBuffer) -> Option<u32> {
    chunk
        .samples()
        .iter()
        .filter(|&&s| s != 0)
        .map(|s| s.unsigned_abs())
        .min()
}

fn floor_level(quietest: Option<u32>, full_scale: f64) -> Level {
    let Some(quietest) = quietest else {
        return Level::NegativeInfinity;
    };

    let ratio = f64::from(quietest) / full_scale;
    if ratio == 0.0 {
        return Level::Undefined;
    }
    Level::from_db(amplitude_to_dbfs(ratio, 1.0))
}

/// Peak level of the buffer, the maximum of the per-chunk peak levels.
fn max_dbfs(buffer: &PcmBuffer, reducer: &ChunkReducer) -> AudioResult<Level> {
    let full_scale = buffer.sample_width().full_scale();
    let levels = reducer.map_chunks(buffer, |chunk| Ok(chunk_peak_db(chunk, full_scale)))?;

    let peak = levels.into_iter().fold(f64::NEG_INFINITY, f64::max);
    Ok(Level::from_db(peak))
}

/// Level of the quietest non-zero sample of the buffer.
fn min_dbfs(buffer: &PcmBuffer, reducer: &ChunkReducer) -> AudioResult<Level> {
    let minima = reducer.map_chunks(buffer, |chunk| Ok(chunk_floor(chunk)))?;
    let quietest = minima.into_iter().flatten().min();
    Ok(floor_level(quietest, buffer.sample_width().full_scale()))
}

/// Time spent above the silence threshold, summed over chunks, in milliseconds.
fn non_silence_ms(buffer: &PcmBuffer, reducer: &ChunkReducer, config: &AnalysisConfig) -> AudioResult<u64> {
    let per_chunk = reducer.map_chunks(buffer, |chunk| nonsilent_ms(chunk, &config.silence))?;
    Ok(per_chunk.into_iter().sum())
}

impl AudioStatistics for PcmBuffer {
    fn statistics(&self) -> AudioResult<StatisticsRecord> {
        self.statistics_with(&AnalysisConfig::new())
    }

    fn statistics_with(&self, config: &AnalysisConfig) -> AudioResult<StatisticsRecord> {
        config.validate()?;

        let duration_ms = self.duration_ms();
        let (max_level, min_level, non_silence) = if self.is_empty() {
            (Level::NegativeInfinity, Level::NegativeInfinity, 0)
        } else if duration_ms == 0 {
            // Under a millisecond: no chunk to scan for sound, but the samples
            // still have a level.
            let full_scale = self.sample_width().full_scale();
            (
                Level::from_db(chunk_peak_db(self, full_scale)),
                floor_level(chunk_floor(self), full_scale),
                0,
            )
        } else {
            let reducer = reducer_for(config);
            (
                max_dbfs(self, &reducer)?,
                min_dbfs(self, &reducer)?,
                non_silence_ms(self, &reducer, config)?,
            )
        };

        let record = StatisticsRecord {
            max_dbfs: max_level.rounded(DECIMALS),
            min_dbfs: min_level.rounded(DECIMALS),
            duration_seconds: round_to(duration_ms as f64 / 1000.0, DECIMALS),
            non_silence_seconds: round_to(non_silence as f64 / 1000.0, DECIMALS),
            silence_threshold_db: config.silence.threshold_db,
            sample_rate: self.frame_rate(),
            channels: self.channels(),
            sample_width: self.sample_width().bytes(),
        };

        debug!(
            duration_ms,
            max_dbfs = %record.max_dbfs,
            min_dbfs = %record.min_dbfs,
            non_silence_seconds = record.non_silence_seconds,
            "statistics computed"
        );
        Ok(record)
    }
}
