// Correctness and logic
#![warn(clippy::unit_cmp)] // Detects comparing unit types
#![warn(clippy::match_same_arms)]
// Duplicate match arms

// Performance-focused
#![warn(clippy::inefficient_to_string)] // `format!("{}", x)` vs `x.to_string()`
#![warn(clippy::map_clone)] // Cloning inside `map()` unnecessarily
#![warn(clippy::unnecessary_to_owned)] // Detects redundant `.to_owned()` or `.clone()`
#![warn(clippy::large_stack_arrays)] // Helps avoid stack overflows
#![warn(clippy::needless_collect)] // Avoids `.collect().iter()` chains

// Style and idiomatic Rust
#![warn(clippy::redundant_clone)] // Detects unnecessary `.clone()`
#![warn(clippy::identity_op)] // e.g., `x + 0`, `x * 1`
#![warn(clippy::needless_return)] // Avoids `return` at the end of functions
#![warn(clippy::let_unit_value)] // Avoids binding `()` to variables
#![warn(clippy::manual_map)] // Use `.map()` instead of manual `match`
#![cfg_attr(not(test), warn(clippy::unwrap_used))] // Avoids using `unwrap()`

// Maintainability
#![warn(clippy::missing_panics_doc)] // Docs for functions that might panic
#![warn(clippy::missing_const_for_fn)] // Suggests making eligible functions `const`
#![deny(missing_docs)] // Documentation is a must for release

//! # audio_dynamics
//!
//! Parallel loudness analysis and dynamic range effects for integer PCM audio.
//!
//! ## Overview
//!
//! Buffers arrive from a decoder as little-endian signed PCM (1, 2 or 4 bytes
//! per sample) and are stored planar as a [`PcmBuffer`]. On top of that the
//! crate provides:
//!
//! - segment extraction by time range ([`AudioEditing`]);
//! - a statistics record (peak level, quietest non-zero level, duration and
//!   non-silent time) computed by chunk-parallel reductions
//!   ([`AudioStatistics`]);
//! - pydub-style silence scanning ([`operations::silence`]);
//! - a compressor, a limiter and peak normalization ([`AudioDynamicRange`],
//!   [`AudioProcessing`]).
//!
//! The number of workers used by the reductions is a process-wide setting,
//! see [`get_num_threads`] and [`set_num_threads`].
//!
//! ## Error Handling
//!
//! Every fallible operation returns an [`AudioResult`]. Empty and silent
//! buffers are not errors: they produce [`Level::NegativeInfinity`] levels and
//! zero durations.
//!
//! ```rust
//! use audio_dynamics::{AudioError, CompressorConfig, PcmBuffer, SampleWidth};
//! use audio_dynamics::operations::compress;
//!
//! let audio = PcmBuffer::empty(SampleWidth::Two, 44_100, 2).unwrap();
//! let config = CompressorConfig { ratio: 0.5, ..CompressorConfig::new() };
//!
//! match compress(&audio, &config) {
//!     Ok(_) => unreachable!(),
//!     Err(AudioError::InvalidParameter(msg)) => eprintln!("Invalid parameter: {msg}"),
//!     Err(other) => eprintln!("Other error: {other}"),
//! }
//! ```
//!
//! ## Quick Start
//!
//! ### Decoding and Statistics
//!
//! ```rust
//! use audio_dynamics::{AudioStatistics, Level, PcmBuffer};
//!
//! # fn main() -> Result<(), audio_dynamics::AudioError> {
//! // One second of 16-bit stereo frames holding (16384, -16384)
//! let bytes = [0x00, 0x40, 0x00, 0xC0].repeat(8_000);
//! let audio = PcmBuffer::from_interleaved_bytes(&bytes, 2, 8_000, 2)?;
//!
//! let stats = audio.statistics()?;
//! assert_eq!(stats.max_dbfs, Level::Finite(-6.02));
//! assert_eq!(stats.channels, 2);
//! assert_eq!(stats.duration_seconds, 1.0);
//! # Ok(())
//! # }
//! ```
//!
//! ### Effects
//!
//! ```rust
//! use audio_dynamics::{AudioDynamicRange, LimiterConfig, SampleWidth, sine_wave};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), audio_dynamics::AudioError> {
//! let mut audio = sine_wave(440.0, Duration::from_secs(1), 44_100, 0.0, SampleWidth::Two, 1)?;
//! audio.apply_limiter(&LimiterConfig::new())?;
//! assert!(audio.peak_amplitude() < 32_768);
//! # Ok(())
//! # }
//! ```

mod error;
pub mod operations;
pub mod parallel;
mod repr;
pub mod utils;

pub use crate::error::{AudioError, AudioResult};
pub use crate::operations::{
    AnalysisConfig, AudioDynamicRange, AudioEditing, AudioProcessing, AudioStatistics,
    CompressorConfig, Level, LimiterConfig, SilenceConfig, SilenceMeasure, StatisticsRecord,
};
pub use crate::parallel::{get_max_threads, get_num_threads, set_num_threads};
pub use crate::repr::{PcmBuffer, SampleWidth};
pub use crate::utils::audio_math;
pub use crate::utils::generation::{concatenate_buffers, constant, silence, sine_wave};
