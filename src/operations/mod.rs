//! Audio analysis and dynamics operations.
//!
//! This module provides the analysis and processing capabilities organized
//! into focused traits. Each trait handles one aspect of the work.
//!
//! ## Module Organization
//!
//! - [`traits`] - Core trait definitions
//! - [`statistics`] - Chunk-parallel loudness and duration analysis
//! - [`silence`] - Silent and non-silent range detection
//! - [`editing`] - Segment extraction
//! - [`processing`] - Normalization
//! - [`dynamic_range`] - Compressor and limiter
//! - [`types`] - Supporting types and configuration
//!
//! ## Quick Start
//!
//! ```rust
//! use audio_dynamics::operations::*;
//! use audio_dynamics::{SampleWidth, sine_wave};
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), audio_dynamics::AudioError> {
//! let audio = sine_wave(440.0, Duration::from_secs(5), 44_100, -6.0, SampleWidth::Two, 2)?;
//!
//! // Analysis of the first two seconds
//! let intro = audio.extract_segment(Some(0.0), Some(2.0));
//! let stats = intro.statistics()?;
//! assert_eq!(stats.duration_seconds, 2.0);
//!
//! // Effects
//! let mut mastered = audio.clone();
//! mastered.apply_compressor(&CompressorConfig::new())?;
//! mastered.apply_limiter(&LimiterConfig::new())?;
//! # Ok(())
//! # }
//! ```

pub mod traits;
pub mod types;

pub mod dynamic_range;
pub mod editing;
pub mod processing;
pub mod silence;
pub mod statistics;

pub use traits::{AudioDynamicRange, AudioEditing, AudioProcessing, AudioStatistics};

pub use types::{
    AnalysisConfig, CompressorConfig, DEFAULT_MIN_SILENCE_LEN_MS, DEFAULT_SILENCE_THRESHOLD_DB,
    LIMITER_ATTACK_MS, LIMITER_HEADROOM_DB, LIMITER_RATIO, Level, LimiterConfig, SilenceConfig,
    SilenceMeasure, StatisticsRecord,
};

pub use dynamic_range::{GainSmoother, compress, limit};
pub use silence::{detect_nonsilent, detect_silence};
