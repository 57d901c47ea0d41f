//! Process-wide worker-count policy.
//!
//! Every chunked reduction reads the configured worker count at dispatch time,
//! so a change made through [`set_num_threads`] takes effect on the next call.
//! The value is a single atomic scalar and needs no locking.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

/// Core count assumed when the host reports none.
pub const FALLBACK_CORE_COUNT: usize = 2;

/// Detected core count, or [`FALLBACK_CORE_COUNT`] when detection yields zero.
pub const fn resolve_core_count(detected: usize) -> usize {
    if detected == 0 { FALLBACK_CORE_COUNT } else { detected }
}

/// Worker-count setting clamped to `[1, max_threads]`.
///
/// The process-wide instance is reached through [`global`] and the free
/// functions of this module. Independent instances can be created with
/// [`ThreadConfig::with_max_threads`], which is how the clamping rules are
/// exercised without depending on the host's core count.
#[derive(Debug)]
pub struct ThreadConfig {
    num_threads: AtomicUsize,
    max_threads: usize,
}

impl ThreadConfig {
    /// Creates a configuration for a machine with `max_threads` cores.
    ///
    /// A core count of zero is treated as one.
    pub fn with_max_threads(max_threads: usize) -> Self {
        let max_threads = max_threads.max(1);
        Self {
            num_threads: AtomicUsize::new(Self::default_threads_for(max_threads)),
            max_threads,
        }
    }

    /// Creates a configuration sized from the cores `num_cpus` reports.
    ///
    /// An undetectable core count falls back to [`FALLBACK_CORE_COUNT`].
    pub fn detect() -> Self {
        Self::with_max_threads(resolve_core_count(num_cpus::get()))
    }

    /// Default worker count for `max_threads` cores: half the cores, at least one.
    pub const fn default_threads_for(max_threads: usize) -> usize {
        let half = max_threads / 2;
        if half == 0 { 1 } else { half }
    }

    /// Current worker count.
    pub fn num_threads(&self) -> usize {
        self.num_threads.load(Ordering::Relaxed)
    }

    /// Number of cores available to the pool.
    pub const fn max_threads(&self) -> usize {
        self.max_threads
    }

    /// Default worker count for this configuration's core count.
    pub const fn default_threads(&self) -> usize {
        Self::default_threads_for(self.max_threads)
    }

    /// Sets the worker count and returns the value actually stored.
    ///
    /// `None` restores the default. Explicit values are clamped silently into
    /// `[1, max_threads]`; rejecting out-of-range input is the caller's job.
    pub fn set_num_threads(&self, num_threads: Option<usize>) -> usize {
        let applied = match num_threads {
            Some(n) => n.clamp(1, self.max_threads),
            None => self.default_threads(),
        };
        self.num_threads.store(applied, Ordering::Relaxed);
        debug!(requested = ?num_threads, applied, "worker count updated");
        applied
    }
}

impl Default for ThreadConfig {
    fn default() -> Self {
        Self::detect()
    }
}

static GLOBAL: OnceLock<ThreadConfig> = OnceLock::new();

/// The process-wide configuration, initialized on first access.
pub fn global() -> &'static ThreadConfig {
    GLOBAL.get_or_init(ThreadConfig::detect)
}

/// Current process-wide worker count, always in `[1, get_max_threads()]`.
pub fn get_num_threads() -> usize {
    global().num_threads()
}

/// Updates the process-wide worker count; see [`ThreadConfig::set_num_threads`].
pub fn set_num_threads(num_threads: Option<usize>) -> usize {
    global().set_num_threads(num_threads)
}

/// Number of cores available to the worker pool.
pub fn get_max_threads() -> usize {
    global().max_threads()
}
