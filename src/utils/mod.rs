//! Utility functions for PCM analysis and processing.
//!
//! # Modules
//!
//! - [`audio_math`] - dB, dBFS and time conversions
//! - [`generation`] - Synthetic signal generation for tests and demos

pub mod audio_math;
pub mod generation;

pub use generation::*;
