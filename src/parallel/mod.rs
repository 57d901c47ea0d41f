//! Parallel execution support: the worker-count policy and the chunked map
//! used by the statistics engine.

pub mod reduce;
pub mod threads;

pub use reduce::{ChunkReducer, ChunkSpan, DEFAULT_MIN_CHUNK_MS, plan_chunks, reduce_chunks};
pub use threads::{FALLBACK_CORE_COUNT, ThreadConfig, get_max_threads, get_num_threads, set_num_threads};
