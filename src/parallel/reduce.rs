//! Chunk-parallel map over a PCM buffer.
//!
//! A buffer is partitioned into contiguous, non-overlapping time slices. Each
//! slice is copied and handed to a pure per-chunk function running on a rayon
//! pool sized from [`ThreadConfig`](super::threads::ThreadConfig). Results come
//! back in chunk order and the caller folds them (max, filtered min, sum).
//!
//! ```rust
//! use audio_dynamics::parallel::ChunkReducer;
//! use audio_dynamics::{SampleWidth, silence};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), audio_dynamics::AudioError> {
//! let audio = silence(Duration::from_secs(30), 8_000, SampleWidth::Two, 1)?;
//! let frames: Vec<usize> = ChunkReducer::new()
//!     .with_workers(3)
//!     .map_chunks(&audio, |chunk| Ok(chunk.frames()))?;
//!
//! assert_eq!(frames, vec![80_000, 80_000, 80_000]);
//! # Ok(())
//! # }
//! ```

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use rayon::prelude::*;
use tracing::{debug, trace};

use super::threads::{get_max_threads, get_num_threads};
use crate::{AudioError, AudioResult, PcmBuffer};

/// Smallest chunk the partitioner will produce, in milliseconds.
pub const DEFAULT_MIN_CHUNK_MS: u64 = 10_000;

/// A time slice of the buffer being reduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpan {
    /// Position in partition order.
    pub index: usize,
    /// Inclusive start offset in milliseconds.
    pub start_ms: u64,
    /// Exclusive end offset in milliseconds.
    pub end_ms: u64,
}

impl ChunkSpan {
    /// Length of the span in milliseconds.
    pub const fn len_ms(&self) -> u64 {
        self.end_ms - self.start_ms
    }
}

/// Partitions `[0, duration_ms)` into chunks of
/// `max(min_chunk_ms, duration_ms / workers)` milliseconds.
///
/// The last chunk is truncated to the remainder. A zero duration yields no
/// chunks. The chunk size never drops below `min_chunk_ms`, even when that
/// produces fewer chunks than workers.
pub fn plan_chunks(duration_ms: u64, min_chunk_ms: u64, workers: usize) -> Vec<ChunkSpan> {
    let workers = workers.max(1) as u64;
    let chunk_ms = min_chunk_ms.max(duration_ms / workers).max(1);

    (0..duration_ms)
        .step_by(chunk_ms as usize)
        .enumerate()
        .map(|(index, start_ms)| ChunkSpan {
            index,
            start_ms,
            end_ms: (start_ms + chunk_ms).min(duration_ms),
        })
        .collect()
}

/// Runs a per-chunk function over a partitioned buffer.
///
/// By default the worker count is read from the process-wide configuration
/// each time [`ChunkReducer::map_chunks`] is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkReducer {
    min_chunk_ms: u64,
    workers: Option<usize>,
}

impl ChunkReducer {
    /// Reducer with a 10 second minimum chunk and the global worker count.
    pub const fn new() -> Self {
        Self {
            min_chunk_ms: DEFAULT_MIN_CHUNK_MS,
            workers: None,
        }
    }

    /// Sets the minimum chunk length.
    pub const fn with_min_chunk_ms(mut self, min_chunk_ms: u64) -> Self {
        self.min_chunk_ms = min_chunk_ms;
        self
    }

    /// Pins the worker count instead of reading the global configuration.
    ///
    /// The pinned count sets how finely the buffer is partitioned. The pool
    /// that runs the chunks never exceeds [`get_max_threads`] threads.
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Worker count the next dispatch will partition for.
    pub fn workers(&self) -> usize {
        self.workers.map_or_else(get_num_threads, |n| n.max(1))
    }

    /// Pool size for `chunks` chunks, in `[1, min(workers, cores, chunks)]`.
    pub fn pool_threads(&self, chunks: usize) -> usize {
        self.workers().min(get_max_threads()).min(chunks).max(1)
    }

    /// Applies `per_chunk` to every chunk of `buffer` and returns the results in
    /// chunk order, one per chunk.
    ///
    /// A single chunk is processed on the calling thread. Several chunks are
    /// processed on a dedicated pool of [`ChunkReducer::pool_threads`] threads;
    /// each worker receives its own copy of the chunk's samples.
    ///
    /// # Errors
    /// The first failing chunk aborts the call with [`AudioError::ChunkFailed`].
    /// A panicking worker is reported the same way. Pool construction failures
    /// surface as [`AudioError::ThreadPool`].
    pub fn map_chunks<R, F>(&self, buffer: &PcmBuffer, per_chunk: F) -> AudioResult<Vec<R>>
    where
        R: Send,
        F: Fn(&PcmBuffer) -> AudioResult<R> + Sync,
    {
        let workers = self.workers();
        let spans = plan_chunks(buffer.duration_ms(), self.min_chunk_ms, workers);
        debug!(
            duration_ms = buffer.duration_ms(),
            workers,
            chunks = spans.len(),
            "partitioned buffer"
        );

        match spans.as_slice() {
            [] => Ok(Vec::new()),
            [span] => {
                let chunk = buffer.slice_ms(span.start_ms, span.end_ms);
                Ok(vec![run_chunk(*span, &chunk, &per_chunk)?])
            }
            _ => {
                let threads = self.pool_threads(spans.len());
                trace!(threads, "building chunk pool");
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("audio-chunk-{i}"))
                    .build()
                    .map_err(|e| AudioError::ThreadPool(format!("Thread pool creation failed: {e}")))?;

                pool.install(|| {
                    spans
                        .into_par_iter()
                        .map(|span| {
                            let chunk = buffer.slice_ms(span.start_ms, span.end_ms);
                            run_chunk(span, &chunk, &per_chunk)
                        })
                        .collect()
                })
            }
        }
    }
}

impl Default for ChunkReducer {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps `per_chunk` over `buffer` using the global worker count.
///
/// Shorthand for `ChunkReducer::new().with_min_chunk_ms(min_chunk_ms).map_chunks(..)`.
pub fn reduce_chunks<R, F>(buffer: &PcmBuffer, min_chunk_ms: u64, per_chunk: F) -> AudioResult<Vec<R>>
where
    R: Send,
    F: Fn(&PcmBuffer) -> AudioResult<R> + Sync,
{
    ChunkReducer::new()
        .with_min_chunk_ms(min_chunk_ms)
        .map_chunks(buffer, per_chunk)
}

fn run_chunk<R, F>(span: ChunkSpan, chunk: &PcmBuffer, per_chunk: &F) -> AudioResult<R>
where
    F: Fn(&PcmBuffer) -> AudioResult<R>,
{
    trace!(
        index = span.index,
        start_ms = span.start_ms,
        end_ms = span.end_ms,
        "processing chunk"
    );
    match catch_unwind(AssertUnwindSafe(|| per_chunk(chunk))) {
        Ok(result) => result.map_err(|e| AudioError::chunk_failed(span.index, e)),
        Err(payload) => Err(AudioError::chunk_failed(
            span.index,
            AudioError::ThreadPool(format!("worker panicked: {}", panic_message(payload.as_ref()))),
        )),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
