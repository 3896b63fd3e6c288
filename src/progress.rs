//! Progress reporting and cancellation support.
//!
//! This module provides [`ProgressCallback`] for monitoring a conversion,
//! [`CancellationToken`] for cooperative cancellation, and [`ProgressInfo`]
//! for progress snapshots.
//!
//! Pages complete in any order, so progress counts finished pages rather
//! than tracking a position. Every page is counted exactly once, whether it
//! was written, failed, or skipped after cancellation.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tiff2jpeg::{ConvertError, ConvertOptions, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("{pct:.1}% complete");
//!         }
//!     }
//! }
//!
//! let options = ConvertOptions::new().with_progress(Arc::new(PrintProgress));
//! let summary = tiff2jpeg::convert_with_options("scan.tif", "pages", &options)?;
//! # Ok::<(), ConvertError>(())
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// A snapshot of conversion progress.
///
/// Delivered to [`ProgressCallback::on_progress`] at a cadence controlled
/// by [`ConvertOptions::with_batch_size`](crate::ConvertOptions::with_batch_size).
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// How many pages have completed so far.
    pub current: u64,
    /// Total pages in the container.
    pub total: u64,
    /// Completion percentage (0.0 – 100.0). `None` for an empty container.
    pub percentage: Option<f32>,
    /// How many of the completed pages failed.
    pub failed: u64,
    /// Wall-clock time elapsed since the conversion started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
    /// The page whose completion triggered this report.
    pub page: Option<u32>,
}

/// Trait for receiving progress updates during a conversion.
///
/// Implementations must be [`Send`] and [`Sync`]; the pipeline hands the
/// callback to worker threads through its options.
///
/// Progress callbacks are **infallible**: they observe but cannot halt
/// the operation. Use [`CancellationToken`] for cooperative cancellation.
pub trait ProgressCallback: Send + Sync {
    /// Called once before any page is dispatched, with the page count.
    fn on_start(&self, _total: u64) {}

    /// Called as pages complete.
    fn on_progress(&self, info: &ProgressInfo);
}

/// A no-op implementation that discards all progress notifications.
///
/// This is the default when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone this token and share it between threads; call
/// [`cancel`](CancellationToken::cancel) from any thread to stop pages that
/// have not started yet. Pages already in flight finish normally.
///
/// # Example
///
/// ```
/// use tiff2jpeg::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation.
    ///
    /// All clones of this token will observe the cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Completion counter owned by the single consumer of job results.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    total: u64,
    current: u64,
    failed: u64,
    batch_size: u64,
    start_time: Instant,
    items_since_last_report: u64,
}

impl ProgressTracker {
    /// Create a tracker and announce the total to the callback.
    pub(crate) fn start(callback: Arc<dyn ProgressCallback>, total: u64, batch_size: u64) -> Self {
        callback.on_start(total);
        Self {
            callback,
            total,
            current: 0,
            failed: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            items_since_last_report: 0,
        }
    }

    /// Record one completed page and fire the callback if the batch
    /// threshold is reached.
    pub(crate) fn advance(&mut self, page: u32, failed: bool) {
        debug_assert!(self.current < self.total, "progress overran page count");
        self.current += 1;
        if failed {
            self.failed += 1;
        }
        self.items_since_last_report += 1;

        if self.items_since_last_report >= self.batch_size {
            self.report(Some(page));
            self.items_since_last_report = 0;
        }
    }

    /// Emit a final report unless the last advance already did.
    pub(crate) fn finish(&mut self) {
        if self.items_since_last_report > 0 || self.current == 0 {
            self.report(None);
            self.items_since_last_report = 0;
        }
    }

    pub(crate) fn current(&self) -> u64 {
        self.current
    }

    fn report(&self, page: Option<u32>) {
        let elapsed = self.start_time.elapsed();

        let percentage = Some(self.total)
            .filter(|&t| t > 0)
            .map(|t| (self.current as f32 / t as f32) * 100.0);

        let estimated_remaining = if self.current > 0 {
            let remaining = self.total.saturating_sub(self.current);
            let per_item = elapsed / self.current as u32;
            Some(per_item * remaining as u32)
        } else {
            None
        };

        let info = ProgressInfo {
            current: self.current,
            total: self.total,
            percentage,
            failed: self.failed,
            elapsed,
            estimated_remaining,
            page,
        };

        self.callback.on_progress(&info);
    }
}
