//! Progress-callback trait for per-segment edit events.
//!
//! Inject an [`Arc<dyn EditProgressCallback>`] via
//! [`crate::config::EditConfigBuilder::progress_callback`] to receive events
//! as the pipeline dispatches each segment.
//!
//! # Example
//!
//! ```rust
//! use edgequake_docedit::{EditConfig, EditProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl EditProgressCallback for CountingCallback {
//!     fn on_segment_complete(&self, ordinal: usize, total: usize, output_words: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Segment {}/{} done ({} words)", ordinal, total, output_words);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = EditConfig::builder()
//!     .progress_callback(counter as Arc<dyn EditProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the edit pipeline as it dispatches each segment.
///
/// Segments are dispatched strictly in order, so events for segment `n + 1`
/// never precede the completion of segment `n`. All methods default to
/// no-ops.
pub trait EditProgressCallback: Send + Sync {
    /// Called once after chunking, before the first request is sent.
    ///
    /// # Arguments
    /// * `total_segments`: number of completion requests the run will issue
    /// * `input_words`   : word count of the whole document
    fn on_run_start(&self, total_segments: usize, input_words: usize) {
        let _ = (total_segments, input_words);
    }

    /// Called before the instruction-enhancement request, when one is made.
    fn on_enhance_start(&self) {}

    /// Called just before the completion request for a segment is sent.
    fn on_segment_start(&self, ordinal: usize, total: usize) {
        let _ = (ordinal, total);
    }

    /// Called when a segment comes back from the endpoint.
    ///
    /// # Arguments
    /// * `ordinal`     : 1-indexed segment position
    /// * `total`       : total segments
    /// * `output_words`: word count of the edited segment
    fn on_segment_complete(&self, ordinal: usize, total: usize, output_words: usize) {
        let _ = (ordinal, total, output_words);
    }

    /// Called when a segment fails. The run aborts right after this event.
    fn on_segment_error(&self, ordinal: usize, total: usize, error: &str) {
        let _ = (ordinal, total, error);
    }

    /// Called after recombination, just before the Safety Gate runs.
    fn on_gating(&self, input_words: usize, output_words: usize) {
        let _ = (input_words, output_words);
    }

    /// Called once after the Safety Gate has decided.
    ///
    /// # Arguments
    /// * `accepted`    : whether the recombined text was accepted
    /// * `output_words`: word count of the recombined text
    fn on_run_complete(&self, accepted: bool, output_words: usize) {
        let _ = (accepted, output_words);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl EditProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::EditConfig`].
pub type ProgressCallback = Arc<dyn EditProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        planned: AtomicUsize,
    }

    impl EditProgressCallback for TrackingCallback {
        fn on_run_start(&self, total_segments: usize, _input_words: usize) {
            self.planned.store(total_segments, Ordering::SeqCst);
        }

        fn on_segment_start(&self, _ordinal: usize, _total: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_segment_complete(&self, _ordinal: usize, _total: usize, _output_words: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_segment_error(&self, _ordinal: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_enhance_start();
        cb.on_run_start(2, 4000);
        cb.on_segment_start(1, 2);
        cb.on_segment_complete(1, 2, 3500);
        cb.on_segment_error(2, 2, "HTTP 500");
        cb.on_run_complete(false, 0);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_run_start(2, 4000);
        tracker.on_segment_start(1, 2);
        tracker.on_segment_complete(1, 2, 3490);
        tracker.on_segment_start(2, 2);
        tracker.on_segment_error(2, 2, "HTTP 503");

        assert_eq!(tracker.planned.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
    }
}
