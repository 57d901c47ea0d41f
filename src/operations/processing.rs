//! Level normalization for [`PcmBuffer`].
//!
//! This module implements the [`AudioProcessing`] trait.

use tracing::debug;

use super::traits::AudioProcessing;
use crate::utils::audio_math::dbfs_to_amplitude;
use crate::{AudioError, AudioResult, PcmBuffer};

impl AudioProcessing for PcmBuffer {
    /// Scales the buffer so its peak lands at `full_scale * 10^(-headroom_db / 20)`.
    ///
    /// Scaled samples are rounded and then clamped to the integer ceiling at or
    /// below that target, so the resulting peak never exceeds it.
    fn normalize(&mut self, headroom_db: f64) -> AudioResult<()> {
        if !headroom_db.is_finite() || headroom_db < 0.0 {
            return Err(AudioError::invalid_parameter(format!(
                "Headroom must be a finite, non-negative dB value, got {headroom_db}"
            )));
        }

        let peak = self.peak_amplitude();
        if peak == 0 {
            return Ok(());
        }

        let width = self.sample_width();
        let target = dbfs_to_amplitude(-headroom_db, width.full_scale());
        let ceiling = target.floor().min(f64::from(width.max_value()));
        let gain = target / f64::from(peak);

        debug!(peak, target, gain, "normalizing");
        self.samples_mut().mapv_inplace(|s| {
            let scaled = (f64::from(s) * gain).round().clamp(-ceiling, ceiling);
            width.clip(scaled)
        });
        Ok(())
    }
}
