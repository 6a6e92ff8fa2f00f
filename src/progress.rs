//! Progress-callback trait for per-page extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! real-time events as the pipeline works through the page range.
//!
//! The callback approach is the least-invasive integration point: callers
//! can forward events to a terminal progress bar, a log file, or a UI
//! without the library knowing anything about how the host application
//! communicates. Pages are processed strictly sequentially, so unlike a
//! concurrent pipeline the events for one page always arrive before any
//! event of the next page — implementations still must be `Send + Sync`
//! because the run itself executes on a tokio worker thread.

use std::sync::Arc;

/// Called by the extraction pipeline as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The three per-page terminal events are mutually
/// exclusive: a page either produced questions, produced none, or failed.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once before any VLM call, after rendering finished.
    ///
    /// # Arguments
    /// * `total_pages` — number of pages that will be processed
    fn on_run_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before the VLM request is sent for a page.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page yielded one or more questions.
    fn on_page_questions(&self, page_num: usize, total_pages: usize, count: usize) {
        let _ = (page_num, total_pages, count);
    }

    /// Called when the model replied but no questions could be recovered.
    ///
    /// The page may genuinely be blank, or the reply was unparseable; either
    /// way the run continues and the page is recorded as empty.
    fn on_page_empty(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page failed after all retries were exhausted.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after all pages have been attempted.
    ///
    /// # Arguments
    /// * `total_pages`     — pages attempted
    /// * `total_questions` — questions accumulated across all pages
    fn on_run_complete(&self, total_pages: usize, total_questions: usize) {
        let _ = (total_pages, total_questions);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        pages: AtomicUsize,
        questions: AtomicUsize,
        empties: AtomicUsize,
    }

    impl ExtractionProgressCallback for TrackingCallback {
        fn on_page_questions(&self, _page: usize, _total: usize, count: usize) {
            self.pages.fetch_add(1, Ordering::SeqCst);
            self.questions.fetch_add(count, Ordering::SeqCst);
        }

        fn on_page_empty(&self, _page: usize, _total: usize) {
            self.empties.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn tracking_callback_counts_events() {
        let cb = TrackingCallback {
            pages: AtomicUsize::new(0),
            questions: AtomicUsize::new(0),
            empties: AtomicUsize::new(0),
        };
        cb.on_page_questions(1, 3, 3);
        cb.on_page_empty(2, 3);
        cb.on_page_questions(3, 3, 2);
        assert_eq!(cb.pages.load(Ordering::SeqCst), 2);
        assert_eq!(cb.questions.load(Ordering::SeqCst), 5);
        assert_eq!(cb.empties.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn noop_callback_accepts_all_events() {
        let cb = NoopProgressCallback;
        cb.on_run_start(3);
        cb.on_page_start(1, 3);
        cb.on_page_error(1, 3, "boom");
        cb.on_run_complete(3, 0);
    }
}
