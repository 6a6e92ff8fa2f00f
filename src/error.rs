//! Error types for the pdf2quiz library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Pdf2QuizError`] — **Fatal**: the run cannot proceed at all (bad input
//!   file, wrong password, provider not configured, workbook write failure).
//!   Returned as `Err(Pdf2QuizError)` from the top-level `extract*` functions.
//!
//! * [`PageError`] — **Non-fatal**: a single page failed (encode glitch,
//!   transient API error) but the remaining pages are fine. Stored inside
//!   [`crate::output::PageReport`] so callers can inspect partial success
//!   rather than losing the whole run to one bad page.
//!
//! A model reply that yields zero questions is *not* an error at either
//! level: it is recorded as an empty page and the run continues. Only a run
//! where no page produced any question is fatal
//! ([`Pdf2QuizError::NoQuestionsExtracted`]).

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2quiz library.
///
/// Page-level failures use [`PageError`] and are stored in
/// [`crate::output::PageReport`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Pdf2QuizError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// Selected page numbers exceed the actual page count.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// No page in the run produced a single question; there is nothing to
    /// put in the workbook.
    #[error("No questions were extracted from any of the {pages} selected pages.\n\
             The pages may be blank, decorative, or unreadable at the current DPI.")]
    NoQuestionsExtracted { pages: usize },

    // ── Output errors ─────────────────────────────────────────────────────
    /// rust_xlsxwriter failed to serialise the workbook.
    #[error("Failed to build the .xlsx workbook: {detail}")]
    WorkbookFailed { detail: String },

    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// Stored alongside [`crate::output::PageReport`] when a page fails.
/// The overall run continues; the workbook is compiled from whatever the
/// healthy pages produced.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// JPEG encoding of the rendered page failed.
    #[error("Page {page}: image encoding failed: {detail}")]
    EncodeFailed { page: usize, detail: String },

    /// LLM call failed after retries.
    #[error("Page {page}: LLM call failed after {retries} retries: {detail}")]
    LlmFailed {
        page: usize,
        retries: u8,
        detail: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_questions_display() {
        let e = Pdf2QuizError::NoQuestionsExtracted { pages: 7 };
        let msg = e.to_string();
        assert!(msg.contains("7 selected pages"), "got: {msg}");
    }

    #[test]
    fn page_out_of_range_display() {
        let e = Pdf2QuizError::PageOutOfRange { page: 12, total: 9 };
        assert!(e.to_string().contains("Page 12"));
        assert!(e.to_string().contains("9 pages"));
    }

    #[test]
    fn llm_failed_display() {
        let e = PageError::LlmFailed {
            page: 3,
            retries: 2,
            detail: "HTTP 429".into(),
        };
        assert!(e.to_string().contains("Page 3"));
        assert!(e.to_string().contains("2 retries"));
        assert!(e.to_string().contains("HTTP 429"));
    }

    #[test]
    fn workbook_failed_display() {
        let e = Pdf2QuizError::WorkbookFailed {
            detail: "worksheet name too long".into(),
        };
        assert!(e.to_string().contains("worksheet name too long"));
    }
}
