//! Pipeline stages for PDF-to-quiz extraction.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. switch rendering backend) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ llm ──▶ normalize
//! (URL/path)  (pdfium)  (jpeg/b64) (VLM)  (JSON recovery)
//! ```
//!
//! 1. [`input`]     — canonicalise the user-supplied path or URL to a local file
//! 2. [`render`]    — rasterise selected pages; runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 3. [`encode`]    — JPEG-encode and base64-wrap each `DynamicImage` for the
//!    multimodal API request body
//! 4. [`llm`]       — drive the VLM call with retry/backoff; the only stage with
//!    network I/O
//! 5. [`normalize`] — recover a JSON array of question objects from whatever
//!    text the model returned (fences, prose, or clean JSON)

pub mod encode;
pub mod input;
pub mod llm;
pub mod normalize;
pub mod render;
