//! # pdf2quiz
//!
//! Generate multiple-choice quiz spreadsheets from PDF pages using Vision
//! Language Models (VLMs).
//!
//! ## Why this crate?
//!
//! Traditional PDF text extractors mangle scanned textbooks — especially
//! right-to-left Arabic material where glyph shaping and reading order come
//! out garbled. Instead this crate rasterises each page into a JPEG and lets
//! a VLM read it as a human would, asking it to produce a fixed number of
//! multiple-choice questions per page as a JSON array. The extracted
//! questions are compiled into a single `.xlsx` workbook where the correct
//! option cell is highlighted green for quick review.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     resolve local file or download from URL
//!  ├─ 2. Render    rasterise pages via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. Encode    JPEG → base64 ImageData
//!  ├─ 4. VLM       one paced call per page, strictly in page order
//!  ├─ 5. Normalize recover the JSON array from the model reply
//!  └─ 6. Workbook  colour-coded .xlsx with the answer cell highlighted
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2quiz::{extract_to_file, ExtractionConfig, PageSelection};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let config = ExtractionConfig::builder()
//!         .pages(PageSelection::Range(1, 5))
//!         .questions_per_page(3)
//!         .build()?;
//!     let stats = extract_to_file("textbook.pdf", "questions.xlsx", &config).await?;
//!     eprintln!("{} questions from {} pages",
//!         stats.total_questions, stats.processed_pages);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2quiz` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2quiz = { version = "0.1", default-features = false }
//! ```
//!
//! ## A note on pacing
//!
//! Pages are processed one at a time with a fixed delay between API calls
//! (default 1 s). Free-tier vision endpoints rate-limit aggressively and a
//! book run is latency-tolerant, so the pipeline trades wall-clock time for
//! never tripping HTTP 429.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod record;
pub mod workbook;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, PageSelection};
pub use error::{PageError, Pdf2QuizError};
pub use extract::{extract, extract_from_bytes, extract_sync, extract_to_file, inspect};
pub use output::{DocumentMetadata, PageReport, RunOutput, RunStats};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use record::QuestionRecord;
pub use workbook::compile_workbook;
