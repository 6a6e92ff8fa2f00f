//! Configuration types for quiz extraction.
//!
//! All run behaviour is controlled through [`ExtractionConfig`], built via
//! its [`ExtractionConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across threads, serialise them for logging, and
//! diff two runs to understand why their outputs differ.
//!
//! There is deliberately no ambient global state: the API credential comes
//! from the environment through the provider factory, and everything else is
//! an explicit field handed to [`crate::extract::extract`] at run start.

use crate::error::Pdf2QuizError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for one extraction run.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2quiz::{ExtractionConfig, PageSelection};
///
/// let config = ExtractionConfig::builder()
///     .pages(PageSelection::Range(1, 10))
///     .questions_per_page(5)
///     .dpi(300)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Rendering DPI used when rasterising each PDF page. Range: 72–400. Default: 300.
    ///
    /// 300 DPI is deliberately high for this workload: textbook pages carry
    /// small Arabic print and diacritics, and the VLM's answer-option
    /// transcription has to be character-exact for the workbook highlight to
    /// match. Drop to 150 for large-print material if upload size matters.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 2600.
    ///
    /// A safety cap independent of DPI so an oversized page cannot exhaust
    /// memory or blow past API upload limits. The cap scales the other
    /// dimension proportionally.
    pub max_rendered_pixels: u32,

    /// JPEG quality (1–100) for the encoded page image. Default: 85.
    ///
    /// JPEG rather than PNG keeps a 300-DPI page under typical request-size
    /// limits; 85 is visually lossless for printed text.
    pub jpeg_quality: u8,

    /// How many questions to ask the model for per page. Range: 1–10. Default: 3.
    pub questions_per_page: u8,

    /// Page selection. Default: all pages.
    pub pages: PageSelection,

    /// Tag written into the unit column of every row. Default: "Vision AI".
    pub source_label: String,

    /// Worksheet name. Default: "بنك الأسئلة" (question bank).
    pub sheet_name: String,

    /// LLM model identifier, e.g. "gpt-4.1-nano", "google/gemini-flash-1.5".
    /// If None, uses provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "openrouter", "gemini").
    /// If None along with `provider`, uses `ProviderFactory::from_env()`.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for the LLM completion. Default: 0.1.
    ///
    /// Near-zero keeps the model faithful to the page text; creative answer
    /// options defeat the purpose of an extraction run.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate per page. Default: 4096.
    pub max_tokens: usize,

    /// Maximum retry attempts on a failed VLM call. Default: 3.
    ///
    /// Every per-page failure is retried then skipped; a failed page never
    /// aborts the run.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    pub retry_backoff_ms: u64,

    /// Fixed delay inserted after each VLM call, in milliseconds. Default: 1000.
    ///
    /// Pure pacing to stay under upstream rate limits; not a scheduling
    /// guarantee. Set to 0 when calling a local model.
    pub pacing_ms: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Custom extraction prompt. `{n}` is replaced with `questions_per_page`.
    /// If None, uses the built-in default from [`crate::prompts`].
    pub prompt: Option<String>,

    /// When set, every rendered page JPEG is also written to this directory
    /// as `page-NNN.jpg` so the user can verify what the model actually sees.
    pub dump_pages_dir: Option<PathBuf>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Per-VLM-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Optional progress callback fired per page.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            dpi: 300,
            max_rendered_pixels: 2600,
            jpeg_quality: 85,
            questions_per_page: 3,
            pages: PageSelection::default(),
            source_label: "Vision AI".to_string(),
            sheet_name: crate::workbook::DEFAULT_SHEET_NAME.to_string(),
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.1,
            max_tokens: 4096,
            max_retries: 3,
            retry_backoff_ms: 500,
            pacing_ms: 1000,
            password: None,
            prompt: None,
            dump_pages_dir: None,
            download_timeout_secs: 120,
            api_timeout_secs: 60,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("questions_per_page", &self.questions_per_page)
            .field("pages", &self.pages)
            .field("source_label", &self.source_label)
            .field("sheet_name", &self.sheet_name)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("pacing_ms", &self.pacing_ms)
            .field("dump_pages_dir", &self.dump_pages_dir)
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    pub fn questions_per_page(mut self, n: u8) -> Self {
        self.config.questions_per_page = n.clamp(1, 10);
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn source_label(mut self, label: impl Into<String>) -> Self {
        self.config.source_label = label.into();
        self
    }

    pub fn sheet_name(mut self, name: impl Into<String>) -> Self {
        self.config.sheet_name = name.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn pacing_ms(mut self, ms: u64) -> Self {
        self.config.pacing_ms = ms;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = Some(prompt.into());
        self
    }

    pub fn dump_pages_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.dump_pages_dir = Some(dir.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, Pdf2QuizError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 400 {
            return Err(Pdf2QuizError::InvalidConfig(format!(
                "DPI must be 72–400, got {}",
                c.dpi
            )));
        }
        if c.questions_per_page == 0 {
            return Err(Pdf2QuizError::InvalidConfig(
                "questions_per_page must be ≥ 1".into(),
            ));
        }
        if let PageSelection::Range(start, end) = c.pages {
            if start == 0 || start > end {
                return Err(Pdf2QuizError::InvalidConfig(format!(
                    "Invalid page range {start}-{end}: pages are 1-indexed and start ≤ end"
                )));
            }
        }
        if c.sheet_name.is_empty() {
            return Err(Pdf2QuizError::InvalidConfig(
                "Worksheet name must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Specifies which pages of the PDF to process.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub enum PageSelection {
    /// Process all pages (default).
    #[default]
    All,
    /// Process a single page (1-indexed).
    Single(usize),
    /// Process a contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
}

impl PageSelection {
    /// Expand the selection into a sorted list of 0-indexed page numbers.
    ///
    /// Out-of-range pages are dropped silently here; the orchestrator treats
    /// a fully empty expansion as fatal.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
        }
    }

    /// First page (1-indexed) the selection asks for, for error reporting
    /// when the expansion against the real document comes back empty.
    pub fn first_requested(&self) -> usize {
        match self {
            PageSelection::All => 1,
            PageSelection::Single(p) => *p,
            PageSelection::Range(start, _) => *start,
        }
    }
}
