//! Supporting types for analysis and dynamics operations.
//!
//! Configuration structs follow one pattern: public fields, a `const fn new()`
//! holding the defaults, a `Default` impl, and `validate()`. All of them
//! (de)serialize with serde so a settings layer can read them straight from a
//! request body.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::parallel::DEFAULT_MIN_CHUNK_MS;
use crate::utils::audio_math::round_to;
use crate::{AudioError, AudioResult};

/// Compression ratio the limiter runs its compressor at.
pub const LIMITER_RATIO: f64 = 100.0;

/// Attack time the limiter runs its compressor with, in milliseconds.
pub const LIMITER_ATTACK_MS: f64 = 0.1;

/// Headroom left below full scale by the limiter's normalization pass, in dB.
pub const LIMITER_HEADROOM_DB: f64 = 0.1;

/// Level below which audio counts as silence in the statistics record, in dBFS.
pub const DEFAULT_SILENCE_THRESHOLD_DB: f64 = -50.0;

/// Shortest gap of silence that splits two non-silent ranges, in milliseconds.
pub const DEFAULT_MIN_SILENCE_LEN_MS: u64 = 100;

/// A level in dBFS, with explicit variants for the non-finite cases.
///
/// `NegativeInfinity` means "no signal" (every sample was zero). `Undefined`
/// means the conversion itself had no meaningful answer. Both serialize as
/// `null`; finite levels serialize as plain numbers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Level {
    /// A finite level in dBFS.
    Finite(f64),
    /// Digital silence.
    NegativeInfinity,
    /// No meaningful level could be computed.
    Undefined,
}

impl Level {
    /// Classifies a raw dB value. `+inf` and NaN are `Undefined`.
    pub fn from_db(db: f64) -> Self {
        if db.is_finite() {
            Self::Finite(db)
        } else if db == f64::NEG_INFINITY {
            Self::NegativeInfinity
        } else {
            Self::Undefined
        }
    }

    /// The level in dB when finite.
    pub const fn db(&self) -> Option<f64> {
        match self {
            Self::Finite(db) => Some(*db),
            Self::NegativeInfinity | Self::Undefined => None,
        }
    }

    /// True for [`Level::Finite`].
    pub const fn is_finite(&self) -> bool {
        matches!(self, Self::Finite(_))
    }

    /// Rounds a finite level to `digits` decimals; sentinels are unchanged.
    pub fn rounded(self, digits: i32) -> Self {
        match self {
            Self::Finite(db) => Self::Finite(round_to(db, digits)),
            other => other,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite(db) => write!(f, "{db:.2} dBFS"),
            Self::NegativeInfinity => write!(f, "-inf dBFS"),
            Self::Undefined => write!(f, "undefined"),
        }
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Finite(db) => serializer.serialize_f64(*db),
            Self::NegativeInfinity | Self::Undefined => serializer.serialize_none(),
        }
    }
}

/// Loudness and duration summary of a buffer.
///
/// All numeric fields are rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsRecord {
    /// Peak level.
    pub max_dbfs: Level,
    /// Level of the quietest non-zero sample.
    pub min_dbfs: Level,
    /// Total duration in seconds.
    pub duration_seconds: f64,
    /// Time spent above the silence threshold, in seconds.
    pub non_silence_seconds: f64,
    /// Threshold used for the silence scan, in dBFS.
    pub silence_threshold_db: f64,
    /// Frame rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: usize,
    /// Bytes per sample.
    pub sample_width: usize,
}

/// How a silence-scan window's loudness is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SilenceMeasure {
    /// Largest absolute sample in the window.
    #[default]
    Peak,
    /// Root mean square over every sample in the window.
    Rms,
}

/// Parameters of the non-silent range scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SilenceConfig {
    /// Windows at or below this level are silent, in dBFS.
    pub threshold_db: f64,
    /// Window length; also the shortest silent gap that splits two ranges.
    pub min_silence_len_ms: u64,
    /// Distance between consecutive window starts.
    pub seek_step_ms: u64,
    /// Window loudness measure.
    pub measure: SilenceMeasure,
}

impl SilenceConfig {
    /// −50 dBFS threshold, 100 ms windows, 1 ms steps, peak measure.
    pub const fn new() -> Self {
        Self {
            threshold_db: DEFAULT_SILENCE_THRESHOLD_DB,
            min_silence_len_ms: DEFAULT_MIN_SILENCE_LEN_MS,
            seek_step_ms: 1,
            measure: SilenceMeasure::Peak,
        }
    }

    /// Validate the scan parameters.
    ///
    /// # Errors
    /// Returns [`AudioError::InvalidParameter`] for a non-finite threshold or a
    /// zero window length or step.
    pub fn validate(&self) -> AudioResult<()> {
        if !self.threshold_db.is_finite() {
            return Err(AudioError::invalid_parameter(
                "Silence threshold must be a finite dB value",
            ));
        }
        if self.min_silence_len_ms == 0 {
            return Err(AudioError::invalid_parameter(
                "Minimum silence length must be > 0 ms",
            ));
        }
        if self.seek_step_ms == 0 {
            return Err(AudioError::invalid_parameter("Seek step must be > 0 ms"));
        }
        Ok(())
    }
}

impl Default for SilenceConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Parameters of the statistics engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Silence scan run on each chunk.
    pub silence: SilenceConfig,
    /// Smallest chunk handed to a worker, in milliseconds.
    pub min_chunk_ms: u64,
    /// Worker count override; `None` reads the process-wide setting. The pool
    /// running the chunks is capped at the core count either way.
    pub num_threads: Option<usize>,
}

impl AnalysisConfig {
    /// Default silence scan, 10 s minimum chunks, global worker count.
    pub const fn new() -> Self {
        Self {
            silence: SilenceConfig::new(),
            min_chunk_ms: DEFAULT_MIN_CHUNK_MS,
            num_threads: None,
        }
    }

    /// Same configuration with a pinned worker count.
    pub const fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    /// Returns [`AudioError::InvalidParameter`] for a zero chunk length, a zero
    /// worker override, or an invalid silence scan.
    pub fn validate(&self) -> AudioResult<()> {
        if self.min_chunk_ms == 0 {
            return Err(AudioError::invalid_parameter(
                "Minimum chunk length must be > 0 ms",
            ));
        }
        if self.num_threads == Some(0) {
            return Err(AudioError::invalid_parameter(
                "Worker count override must be > 0",
            ));
        }
        self.silence.validate()
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Compressor configuration parameters.
///
/// Levels above the threshold have their excess divided by the ratio. Gain
/// reduction engages with the attack time constant and relaxes with the
/// release time constant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressorConfig {
    /// Threshold level in dBFS. Signal levels above this will be compressed.
    pub threshold_db: f64,
    /// Compression ratio (1.0 = no compression, >1.0 = compression).
    pub ratio: f64,
    /// Attack time in milliseconds.
    pub attack_ms: f64,
    /// Release time in milliseconds.
    pub release_ms: f64,
}

impl CompressorConfig {
    /// −20 dBFS threshold, 4:1, 5 ms attack, 50 ms release.
    pub const fn new() -> Self {
        Self {
            threshold_db: -20.0,
            ratio: 4.0,
            attack_ms: 5.0,
            release_ms: 50.0,
        }
    }

    /// Validate compressor configuration.
    ///
    /// # Errors
    /// Returns [`AudioError::InvalidParameter`] when a value is non-finite, the
    /// threshold is above 0 dBFS, the ratio is below 1, or a time is not positive.
    pub fn validate(&self) -> AudioResult<()> {
        if !self.threshold_db.is_finite() || self.threshold_db > 0.0 {
            return Err(AudioError::invalid_parameter(format!(
                "Threshold must be a finite level at or below 0 dBFS, got {}",
                self.threshold_db
            )));
        }
        if !self.ratio.is_finite() || self.ratio < 1.0 {
            return Err(AudioError::invalid_parameter(format!(
                "Ratio must be >= 1.0, got {}",
                self.ratio
            )));
        }
        if !self.attack_ms.is_finite() || self.attack_ms <= 0.0 {
            return Err(AudioError::invalid_parameter(format!(
                "Attack time must be > 0 ms, got {}",
                self.attack_ms
            )));
        }
        if !self.release_ms.is_finite() || self.release_ms <= 0.0 {
            return Err(AudioError::invalid_parameter(format!(
                "Release time must be > 0 ms, got {}",
                self.release_ms
            )));
        }
        Ok(())
    }
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Limiter configuration parameters.
///
/// Ratio and attack are fixed ([`LIMITER_RATIO`], [`LIMITER_ATTACK_MS`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimiterConfig {
    /// Threshold level in dBFS.
    pub threshold_db: f64,
    /// Release time in milliseconds.
    pub release_ms: f64,
}

impl LimiterConfig {
    /// −1 dBFS threshold, 50 ms release.
    pub const fn new() -> Self {
        Self {
            threshold_db: -1.0,
            release_ms: 50.0,
        }
    }

    /// The compressor settings the limiter runs.
    pub const fn as_compressor(&self) -> CompressorConfig {
        CompressorConfig {
            threshold_db: self.threshold_db,
            ratio: LIMITER_RATIO,
            attack_ms: LIMITER_ATTACK_MS,
            release_ms: self.release_ms,
        }
    }

    /// Validate limiter configuration.
    ///
    /// # Errors
    /// Same conditions as [`CompressorConfig::validate`].
    pub fn validate(&self) -> AudioResult<()> {
        self.as_compressor().validate()
    }
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_classification() {
        assert_eq!(Level::from_db(-3.5), Level::Finite(-3.5));
        assert_eq!(Level::from_db(f64::NEG_INFINITY), Level::NegativeInfinity);
        assert_eq!(Level::from_db(f64::NAN), Level::Undefined);
        assert_eq!(Level::from_db(f64::INFINITY), Level::Undefined);
        assert_eq!(Level::Finite(-3.456).rounded(2), Level::Finite(-3.46));
        assert_eq!(Level::NegativeInfinity.rounded(2), Level::NegativeInfinity);
        assert_eq!(Level::Undefined.db(), None);
    }

    #[test]
    fn test_level_serializes_sentinels_as_null() {
        let json = serde_json::to_string(&[
            Level::Finite(-6.02),
            Level::NegativeInfinity,
            Level::Undefined,
        ])
        .unwrap();
        assert_eq!(json, "[-6.02,null,null]");
    }

    #[test]
    fn test_compressor_config_validation() {
        let mut config = CompressorConfig::new();
        assert!(config.validate().is_ok());

        config.threshold_db = 5.0;
        assert!(config.validate().is_err());

        config.threshold_db = -12.0;
        config.ratio = 0.5;
        assert!(config.validate().is_err());

        config.ratio = 2.0;
        config.release_ms = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_limiter_uses_fixed_ratio_and_attack() {
        let limiter = LimiterConfig {
            threshold_db: -3.0,
            release_ms: 80.0,
        };
        let compressor = limiter.as_compressor();
        assert_eq!(compressor.ratio, LIMITER_RATIO);
        assert_eq!(compressor.attack_ms, LIMITER_ATTACK_MS);
        assert_eq!(compressor.threshold_db, -3.0);
        assert_eq!(compressor.release_ms, 80.0);
        assert!(limiter.validate().is_ok());
    }

    #[test]
    fn test_configs_deserialize_with_defaults() {
        let compressor: CompressorConfig = serde_json::from_str(r#"{"ratio": 8.0}"#).unwrap();
        assert_eq!(compressor.ratio, 8.0);
        assert_eq!(compressor.threshold_db, -20.0);

        let analysis: AnalysisConfig =
            serde_json::from_str(r#"{"silence": {"measure": "rms"}, "num_threads": 2}"#).unwrap();
        assert_eq!(analysis.silence.measure, SilenceMeasure::Rms);
        assert_eq!(analysis.silence.min_silence_len_ms, 100);
        assert_eq!(analysis.num_threads, Some(2));
        assert!(analysis.validate().is_ok());
    }

    #[test]
    fn test_analysis_config_validation() {
        assert!(AnalysisConfig::new().with_threads(0).validate().is_err());

        let mut config = AnalysisConfig::new();
        config.silence.seek_step_ms = 0;
        assert!(config.validate().is_err());
    }
}
