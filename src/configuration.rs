//! Conversion configuration.
//!
//! [`ConvertOptions`] is a builder that threads progress callbacks,
//! cancellation tokens, and worker-pool sizing through
//! [`convert_with_options`](crate::convert_with_options) without polluting
//! its signature.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tiff2jpeg::{CancellationToken, ConvertOptions, ProgressCallback, ProgressInfo};
//!
//! struct LogProgress;
//! impl ProgressCallback for LogProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{}/{} pages done", info.current, info.total);
//!     }
//! }
//!
//! let token = CancellationToken::new();
//! let options = ConvertOptions::new()
//!     .with_progress(Arc::new(LogProgress))
//!     .with_cancellation(token.clone())
//!     .with_threads(4)
//!     .with_batch_size(10);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread;

use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// Configuration for a conversion run.
///
/// All fields have defaults; a default-constructed value behaves exactly
/// like [`convert`](crate::convert).
#[derive(Clone)]
pub struct ConvertOptions {
    /// Progress callback. Defaults to a no-op.
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// Cancellation token. `None` means never cancelled.
    pub(crate) cancellation: Option<CancellationToken>,
    /// How often to fire the progress callback (every N pages).
    pub(crate) batch_size: u64,
    /// Worker count. `None` uses the available hardware parallelism.
    pub(crate) threads: Option<NonZeroUsize>,
}

impl Debug for ConvertOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ConvertOptions")
            .field("has_progress", &true)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .field("threads", &self.threads)
            .finish()
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ConvertOptions {
    /// Create a new configuration with default settings.
    ///
    /// Defaults: no progress callback, no cancellation, batch size 1,
    /// one worker per available hardware thread.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
            threads: None,
        }
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// Pages that have not started when the token is cancelled are skipped
    /// and listed in [`ConversionSummary::cancelled`](crate::ConversionSummary::cancelled).
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set how often the progress callback fires.
    ///
    /// A value of 1 means every page; 10 means every 10th page. Clamped to
    /// a minimum of 1. A final report is always emitted.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Set the number of worker threads. Zero restores the default.
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = NonZeroUsize::new(threads);
        self
    }

    /// Number of workers the pool will be built with.
    pub fn worker_count(&self) -> usize {
        self.threads
            .or_else(|| thread::available_parallelism().ok())
            .map_or(1, NonZeroUsize::get)
    }

    /// Returns `true` if cancellation has been requested.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
