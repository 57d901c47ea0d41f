//! End-to-end tour: decode raw PCM, analyse it, extract a segment, then run
//! the compressor and limiter and analyse the results.
//!
//! Run with `RUST_LOG=audio_dynamics=debug` to see partition plans and
//! effect summaries.

use audio_dynamics::{
    AudioDynamicRange, AudioEditing, AudioStatistics, CompressorConfig, LimiterConfig, PcmBuffer,
    SampleWidth, StatisticsRecord, concatenate_buffers, get_max_threads, set_num_threads, silence,
    sine_wave,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn print_record(label: &str, record: &StatisticsRecord) {
    println!(
        "{label:<12} peak {:>12}  floor {:>12}  length {:>6.2}s  sound {:>6.2}s",
        record.max_dbfs.to_string(),
        record.min_dbfs.to_string(),
        record.duration_seconds,
        record.non_silence_seconds
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let workers = set_num_threads(Some(get_max_threads()));
    println!("Using {workers} of {} workers", get_max_threads());

    // Build a program and round-trip it through the byte codec the decoder uses.
    let rate = 44_100;
    let program = concatenate_buffers(&[
        sine_wave(220.0, Duration::from_secs(20), rate, -3.0, SampleWidth::Two, 2)?,
        silence(Duration::from_secs(5), rate, SampleWidth::Two, 2)?,
        sine_wave(330.0, Duration::from_secs(15), rate, -18.0, SampleWidth::Two, 2)?,
    ])?;
    let bytes = program.to_interleaved_bytes();
    let audio = PcmBuffer::from_interleaved_bytes(&bytes, 2, rate, 2)?;

    let original = audio.statistics()?;
    print_record("original", &original);
    println!("{}", serde_json::to_string_pretty(&original)?);

    let segment = audio.extract_segment(Some(15.0), Some(30.0));
    print_record("15s..30s", &segment.statistics()?);

    let mut compressed = segment.into_owned();
    compressed.apply_compressor(&CompressorConfig::new())?;
    print_record("compressed", &compressed.statistics()?);

    let mut limited = audio.clone();
    limited.apply_limiter(&LimiterConfig::new())?;
    print_record("limited", &limited.statistics()?);

    set_num_threads(None);
    Ok(())
}
