//! Output types: per-page reports, run statistics, and the final artifact.

use crate::error::PageError;
use crate::record::QuestionRecord;
use serde::{Deserialize, Serialize};

/// The result of one extraction run.
///
/// Returned by [`crate::extract::extract`] even when some pages failed —
/// the workbook is compiled from whatever was accumulated, and
/// [`RunOutput::pages`] records which pages contributed nothing. Check
/// `stats.failed_pages` / `stats.empty_pages` to decide whether the
/// artifact is complete.
pub struct RunOutput {
    /// The finished `.xlsx` workbook, ready to write to disk.
    pub workbook: Vec<u8>,

    /// All accumulated question records, in page order.
    pub records: Vec<QuestionRecord>,

    /// Per-page reports, sorted by page number.
    pub pages: Vec<PageReport>,

    /// Document metadata read before rendering.
    pub metadata: DocumentMetadata,

    /// Aggregate run statistics.
    pub stats: RunStats,
}

/// What happened on a single page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageReport {
    /// 1-indexed page number.
    pub page_num: usize,

    /// Questions extracted from this page. Empty for blank/unparseable
    /// pages and for failed pages.
    pub questions: Vec<QuestionRecord>,

    /// Prompt tokens consumed by the VLM call (0 on failure).
    pub input_tokens: u32,

    /// Completion tokens produced by the VLM call (0 on failure).
    pub output_tokens: u32,

    /// Wall-clock duration of the VLM call including retries, in ms.
    pub duration_ms: u64,

    /// Retries performed before success or giving up.
    pub retries: u8,

    /// Set when the page failed after all retries.
    pub error: Option<PageError>,
}

impl PageReport {
    /// A page counts as empty when it neither failed nor produced questions.
    pub fn is_empty(&self) -> bool {
        self.error.is_none() && self.questions.is_empty()
    }
}

/// Aggregate statistics for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Total pages in the source document.
    pub total_pages: usize,
    /// Pages that produced at least one question.
    pub processed_pages: usize,
    /// Pages that were attempted but yielded zero questions.
    pub empty_pages: usize,
    /// Pages that failed after all retries.
    pub failed_pages: usize,
    /// Questions accumulated across all pages.
    pub total_questions: usize,
    /// Sum of prompt tokens across all VLM calls.
    pub total_input_tokens: u64,
    /// Sum of completion tokens across all VLM calls.
    pub total_output_tokens: u64,
    /// End-to-end wall-clock duration, in ms.
    pub total_duration_ms: u64,
    /// Time spent rasterising pages, in ms.
    pub render_duration_ms: u64,
    /// Time spent in VLM calls (including pacing sleeps), in ms.
    pub llm_duration_ms: u64,
}

/// PDF document metadata, extracted without rendering any page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_page_classification() {
        let report = PageReport {
            page_num: 2,
            questions: vec![],
            input_tokens: 900,
            output_tokens: 4,
            duration_ms: 1200,
            retries: 0,
            error: None,
        };
        assert!(report.is_empty());

        let failed = PageReport {
            error: Some(PageError::LlmFailed {
                page: 2,
                retries: 3,
                detail: "timeout".into(),
            }),
            ..report
        };
        assert!(!failed.is_empty());
    }
}
