//! ConvertOptions builder tests.

use std::sync::Arc;

use tiff2jpeg::{CancellationToken, ConvertOptions, ProgressCallback, ProgressInfo};

struct Silent;

impl ProgressCallback for Silent {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

#[test]
fn options_defaults() {
    let options = ConvertOptions::new();
    let debug = format!("{options:?}");
    assert!(debug.contains("ConvertOptions"));
    assert!(debug.contains("has_cancellation: false"));
    assert!(debug.contains("batch_size: 1"));
    assert!(debug.contains("threads: None"));
    assert!(options.worker_count() >= 1);
}

#[test]
fn options_with_batch_size_clamps_zero() {
    let options = ConvertOptions::new().with_batch_size(0);
    let debug = format!("{options:?}");
    assert!(debug.contains("batch_size: 1"));
}

#[test]
fn options_with_threads() {
    let options = ConvertOptions::new().with_threads(3);
    assert_eq!(options.worker_count(), 3);

    let default_count = ConvertOptions::new().worker_count();
    let reset = options.with_threads(0);
    assert_eq!(reset.worker_count(), default_count);
}

#[test]
fn options_with_cancellation_and_progress() {
    let options = ConvertOptions::default()
        .with_cancellation(CancellationToken::new())
        .with_progress(Arc::new(Silent));
    let debug = format!("{options:?}");
    assert!(debug.contains("has_cancellation: true"));
    assert!(debug.contains("has_progress: true"));
}
