//! Concurrent page-to-JPEG conversion.
//!
//! [`convert`] opens a container once, then runs one job per page on a
//! worker pool. Each job takes the container's exclusive section only long
//! enough to copy its page out; color conversion, JPEG encoding, and the
//! file write all run in parallel with other jobs.
//!
//! Job results flow back over a channel to the calling thread, which is the
//! only place progress is counted. A failed page never stops its siblings,
//! even when its job panics; it is recorded in the returned
//! [`ConversionSummary`].

use std::{
    fs,
    any::Any,
    io::{self, ErrorKind},
    panic::{self, AssertUnwindSafe},
    path::{Path, PathBuf},
    sync::{Arc, mpsc},
    time::Instant,
};

use crate::{
    configuration::ConvertOptions,
    container::TiffContainer,
    error::ConvertError,
    progress::ProgressTracker,
    summary::{ConversionSummary, PageFailure, WrittenPage},
};

/// What happened to one page.
enum PageOutcome {
    Written(WrittenPage),
    Failed(ConvertError),
    Cancelled,
}

/// Output file for `page`: `<output_dir>/<page zero-padded to 5 digits>.jpg`.
///
/// ```
/// use std::path::Path;
///
/// let path = tiff2jpeg::output_path(Path::new("out"), 42);
/// assert_eq!(path, Path::new("out").join("00042.jpg"));
/// ```
pub fn output_path(output_dir: &Path, page: u32) -> PathBuf {
    output_dir.join(format!("{page:05}.jpg"))
}

/// Convert every page of `input` into `output_dir/%05d.jpg` with default
/// options.
///
/// # Errors
///
/// Only fatal errors are returned: [`ConvertError::OutputDirectory`] when
/// the directory cannot be created and [`ConvertError::FileOpen`] when the
/// input cannot be opened. The output directory is created before the input
/// is opened. Per-page failures are reported in the summary.
///
/// # Example
///
/// ```no_run
/// let summary = tiff2jpeg::convert("scan.tif", "pages")?;
/// println!("{} of {} pages written", summary.succeeded_count(), summary.page_count);
/// # Ok::<(), tiff2jpeg::ConvertError>(())
/// ```
pub fn convert<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output_dir: Q,
) -> Result<ConversionSummary, ConvertError> {
    convert_with_options(input, output_dir, &ConvertOptions::default())
}

/// Like [`convert`], with progress reporting, cancellation, and worker
/// count taken from `options`.
pub fn convert_with_options<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output_dir: Q,
    options: &ConvertOptions,
) -> Result<ConversionSummary, ConvertError> {
    let input = input.as_ref();
    let output_dir = output_dir.as_ref();
    let start_time = Instant::now();

    fs::create_dir_all(output_dir).map_err(|source| ConvertError::OutputDirectory {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let container = Arc::new(TiffContainer::open(input)?);
    let result = run_jobs(&container, output_dir, options);
    container.close();

    let summary = result?.finalize(start_time.elapsed());
    log::info!(
        "Converted {}: {} written, {} failed, {} cancelled in {:.2?}",
        input.display(),
        summary.succeeded_count(),
        summary.failed_count(),
        summary.cancelled.len(),
        summary.elapsed,
    );
    Ok(summary)
}

fn run_jobs(
    container: &Arc<TiffContainer>,
    output_dir: &Path,
    options: &ConvertOptions,
) -> Result<ConversionSummary, ConvertError> {
    let page_count = container.page_count();
    let pool = build_worker_pool(options)?;
    log::debug!(
        "Dispatching {page_count} page(s) to {} worker(s)",
        pool.current_num_threads()
    );

    let mut tracker = ProgressTracker::start(
        Arc::clone(&options.progress),
        u64::from(page_count),
        options.batch_size,
    );
    let output_dir: Arc<Path> = Arc::from(output_dir);
    let (sender, receiver) = mpsc::channel();

    for page in 0..page_count {
        let container = Arc::clone(container);
        let output_dir = Arc::clone(&output_dir);
        let options = options.clone();
        let sender = sender.clone();

        pool.spawn(move || {
            let outcome = if options.is_cancelled() {
                discard_stale_output(&output_dir, page);
                PageOutcome::Cancelled
            } else {
                match isolate_panic(page, || convert_page(&container, page, &output_dir)) {
                    Ok(written) => PageOutcome::Written(written),
                    Err(error) => {
                        discard_stale_output(&output_dir, page);
                        PageOutcome::Failed(error)
                    }
                }
            };
            // The receiver outlives every job; a send cannot fail here.
            let _ = sender.send((page, outcome));
        });
    }
    drop(sender);

    let mut summary = ConversionSummary::new(page_count);
    for (page, outcome) in receiver {
        match outcome {
            PageOutcome::Written(written) => {
                log::debug!("Wrote page {page} -> {}", written.path.display());
                tracker.advance(page, false);
                summary.succeeded.push(written);
            }
            PageOutcome::Failed(error) => {
                log::warn!("Page {page} failed: {error}");
                tracker.advance(page, true);
                summary.failed.push(PageFailure { page, error });
            }
            PageOutcome::Cancelled => {
                tracker.advance(page, false);
                summary.cancelled.push(page);
            }
        }
    }
    tracker.finish();
    debug_assert_eq!(tracker.current(), u64::from(page_count));

    Ok(summary)
}

/// One job: copy the page out under the lock, then encode and write
/// without it.
fn convert_page(
    container: &TiffContainer,
    page: u32,
    output_dir: &Path,
) -> Result<WrittenPage, ConvertError> {
    let frame = container.extract_page(page)?;
    let encoded = frame.to_jpeg()?;
    drop(frame);

    let path = output_path(output_dir, page);
    write_whole_file(&path, &encoded).map_err(|source| ConvertError::Write {
        page,
        path: path.clone(),
        source,
    })?;

    Ok(WrittenPage {
        page,
        path,
        bytes: encoded.len() as u64,
    })
}

/// Run one page job, turning a panic into a failure for that page only.
///
/// The container recovers its lock from poisoning and re-seeks on every
/// entry, so no state observed after the unwind is broken.
fn isolate_panic<T>(
    page: u32,
    job: impl FnOnce() -> Result<T, ConvertError>,
) -> Result<T, ConvertError> {
    panic::catch_unwind(AssertUnwindSafe(job)).unwrap_or_else(|payload| {
        Err(ConvertError::JobPanicked {
            page,
            message: panic_message(payload.as_ref()),
        })
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Write `bytes` in one call; remove the file if the write fails part way.
fn write_whole_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    fs::write(path, bytes).inspect_err(|_| {
        let _ = fs::remove_file(path);
    })
}

/// A failed page must not leave an output from an earlier run behind.
fn discard_stale_output(output_dir: &Path, page: u32) {
    let path = output_path(output_dir, page);
    match fs::remove_file(&path) {
        Ok(()) => log::debug!("Removed stale output {}", path.display()),
        Err(error) if error.kind() == ErrorKind::NotFound => {}
        Err(error) => log::warn!("Could not remove stale output {}: {error}", path.display()),
    }
}

fn build_worker_pool(options: &ConvertOptions) -> Result<rayon::ThreadPool, ConvertError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(options.worker_count())
        .thread_name(|index| format!("tiff2jpeg-worker-{index}"))
        .build()
        .map_err(|error| ConvertError::WorkerPool(error.to_string()))
}
