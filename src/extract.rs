//! Eager (full-run) extraction entry points.
//!
//! The run is strictly sequential: pages are rasterised up front, then sent
//! to the VLM one at a time in page order with a fixed pacing delay between
//! calls. Per-page failures are retried and then skipped, and the workbook
//! is always compiled from whatever accumulated — a crash of page 7 must
//! not throw away the questions already extracted from pages 1–6. Only a
//! run where *no* page produced a question fails outright.

use crate::config::ExtractionConfig;
use crate::error::Pdf2QuizError;
use crate::output::{DocumentMetadata, PageReport, RunOutput, RunStats};
use crate::pipeline::{encode, input, llm, render};
use crate::record::QuestionRecord;
use crate::workbook::compile_workbook;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

/// Extract quiz questions from a PDF file or URL into an `.xlsx` workbook.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input_str` — Local file path or HTTP/HTTPS URL to a PDF
/// * `config`    — Extraction configuration
///
/// # Returns
/// `Ok(RunOutput)` on success, even if some pages failed or were empty
/// (check `output.stats.failed_pages` / `empty_pages`).
///
/// # Errors
/// Returns `Err(Pdf2QuizError)` only for fatal errors:
/// - File not found / permission denied / not a valid PDF
/// - No LLM provider configured
/// - Page selection outside the document
/// - Zero questions extracted across the entire run
pub async fn extract(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<RunOutput, Pdf2QuizError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting extraction run: {}", input_str);

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let pdf_path = resolved.path().to_path_buf();

    // ── Step 2: Get/create provider ──────────────────────────────────────
    let provider = resolve_provider(config)?;

    // ── Step 3: Extract metadata ─────────────────────────────────────────
    let metadata = render::extract_metadata(&pdf_path, config.password.as_deref()).await?;
    let total_pages = metadata.page_count;
    info!("PDF has {} pages", total_pages);

    // ── Step 4: Compute page indices ─────────────────────────────────────
    let page_indices = config.pages.to_indices(total_pages);
    if page_indices.is_empty() {
        return Err(Pdf2QuizError::PageOutOfRange {
            page: config.pages.first_requested(),
            total: total_pages,
        });
    }
    debug!("Selected {} pages for extraction", page_indices.len());

    // ── Step 5: Rasterise pages ──────────────────────────────────────────
    let render_start = Instant::now();
    let rendered = render::render_pages(&pdf_path, config, &page_indices).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    info!(
        "Rendered {} pages in {}ms",
        rendered.len(),
        render_duration_ms
    );

    // ── Step 6: Encode images to base64 JPEG ─────────────────────────────
    let mut encoded: Vec<(usize, edgequake_llm::ImageData)> = Vec::with_capacity(rendered.len());
    let mut reports: Vec<PageReport> = Vec::new();

    for (idx, img) in &rendered {
        match encode::encode_jpeg(img, config.jpeg_quality) {
            Ok(jpeg) => {
                if let Some(ref dir) = config.dump_pages_dir {
                    dump_page(dir, idx + 1, &jpeg);
                }
                encoded.push((*idx, encode::to_image_data(&jpeg)));
            }
            Err(e) => {
                warn!("Failed to encode page {}: {}", idx + 1, e);
                reports.push(PageReport {
                    page_num: idx + 1,
                    questions: Vec::new(),
                    input_tokens: 0,
                    output_tokens: 0,
                    duration_ms: 0,
                    retries: 0,
                    error: Some(crate::error::PageError::EncodeFailed {
                        page: idx + 1,
                        detail: e.to_string(),
                    }),
                });
            }
        }
    }

    // ── Step 7: Sequential paced VLM loop ────────────────────────────────
    let selected = encoded.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(selected);
    }

    let llm_start = Instant::now();
    let mut records: Vec<QuestionRecord> = Vec::new();

    for (i, (idx, img_data)) in encoded.into_iter().enumerate() {
        let page_num = idx + 1;
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page_num, selected);
        }

        let report = llm::generate_questions(&provider, page_num, img_data, config).await;

        if let Some(ref cb) = config.progress_callback {
            match (&report.error, report.questions.len()) {
                (Some(e), _) => cb.on_page_error(page_num, selected, &e.to_string()),
                (None, 0) => cb.on_page_empty(page_num, selected),
                (None, n) => cb.on_page_questions(page_num, selected, n),
            }
        }

        records.extend(report.questions.iter().cloned());
        reports.push(report);

        // Pace the next call to stay under upstream rate limits.
        if config.pacing_ms > 0 && i + 1 < selected {
            sleep(Duration::from_millis(config.pacing_ms)).await;
        }
    }
    let llm_duration_ms = llm_start.elapsed().as_millis() as u64;

    reports.sort_by_key(|r| r.page_num);

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(selected, records.len());
    }

    // ── Step 8: Compile the workbook ─────────────────────────────────────
    if records.is_empty() {
        return Err(Pdf2QuizError::NoQuestionsExtracted {
            pages: page_indices.len(),
        });
    }
    let workbook = compile_workbook(&records, &config.sheet_name)?;

    // ── Step 9: Compute stats ────────────────────────────────────────────
    let processed = reports
        .iter()
        .filter(|r| !r.questions.is_empty())
        .count();
    let empty = reports.iter().filter(|r| r.is_empty()).count();
    let failed = reports.iter().filter(|r| r.error.is_some()).count();

    let stats = RunStats {
        total_pages,
        processed_pages: processed,
        empty_pages: empty,
        failed_pages: failed,
        total_questions: records.len(),
        total_input_tokens: reports.iter().map(|r| r.input_tokens as u64).sum(),
        total_output_tokens: reports.iter().map(|r| r.output_tokens as u64).sum(),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        render_duration_ms,
        llm_duration_ms,
    };

    info!(
        "Run complete: {} questions from {}/{} pages, {}ms total",
        stats.total_questions,
        processed,
        page_indices.len(),
        stats.total_duration_ms
    );

    Ok(RunOutput {
        workbook,
        records,
        pages: reports,
        metadata,
        stats,
    })
}

/// Extract questions and write the workbook directly to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn extract_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<RunStats, Pdf2QuizError> {
    let output = extract(input_str, config).await?;
    let path = output_path.as_ref();

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Pdf2QuizError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("xlsx.tmp");
    tokio::fs::write(&tmp_path, &output.workbook)
        .await
        .map_err(|e| Pdf2QuizError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Pdf2QuizError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(output.stats)
}

/// Extract questions from PDF bytes in memory.
///
/// Internally the library writes `bytes` to a managed [`tempfile`] and
/// cleans it up automatically on return or panic. This is the recommended
/// API when PDF data comes from a database, upload, or in-memory buffer
/// rather than a file on disk.
pub async fn extract_from_bytes(
    bytes: &[u8],
    config: &ExtractionConfig,
) -> Result<RunOutput, Pdf2QuizError> {
    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| Pdf2QuizError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| Pdf2QuizError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    // `tmp` is dropped (and the file deleted) when `extract` returns
    extract(&path, config).await
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<RunOutput, Pdf2QuizError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2QuizError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract(input_str, config))
}

/// Extract PDF metadata without calling the VLM.
///
/// Does not require an LLM provider or API key.
pub async fn inspect(input_str: impl AsRef<str>) -> Result<DocumentMetadata, Pdf2QuizError> {
    let resolved = input::resolve_input(input_str.as_ref(), 120).await?;
    let pdf_path = resolved.path().to_path_buf();
    render::extract_metadata(&pdf_path, None).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Write a rendered page JPEG into the dump directory for manual review.
///
/// Best-effort: a dump failure is logged, never fatal.
fn dump_page(dir: &Path, page_num: usize, jpeg: &[u8]) {
    let path = dir.join(format!("page-{page_num:03}.jpg"));
    if let Err(e) = std::fs::create_dir_all(dir).and_then(|_| std::fs::write(&path, jpeg)) {
        warn!("Failed to dump page {} to {}: {}", page_num, path.display(), e);
    } else {
        debug!("Dumped page {} → {}", page_num, path.display());
    }
}

/// Instantiate a named provider with the given model.
fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, Pdf2QuizError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        Pdf2QuizError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// The fallback chain lets library users and CLI users each set exactly as
/// much or as little as they need:
///
/// 1. **Pre-built provider** (`config.provider`) — the caller constructed
///    and configured the provider entirely; we use it as-is. Useful in
///    tests or when the caller needs custom middleware.
///
/// 2. **Named provider + model** (`config.provider_name`) — the factory
///    reads the corresponding API key (`OPENAI_API_KEY`,
///    `OPENROUTER_API_KEY`, etc.) from the environment.
///
/// 3. **Environment pair** (`PDF2QUIZ_PROVIDER` + `PDF2QUIZ_MODEL`) —
///    a provider/model choice made at the execution-environment level
///    (Makefile, shell script, CI). Checked before full auto-detection so
///    the model choice is honoured even when multiple API keys are present.
///
/// 4. **Full auto-detection** (`ProviderFactory::from_env`) — the factory
///    scans all known API key variables and picks the first available
///    provider. Convenient for `pdf2quiz book.pdf` with no other setup.
fn resolve_provider(config: &ExtractionConfig) -> Result<Arc<dyn LLMProvider>, Pdf2QuizError> {
    // 1) User-provided provider takes priority
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    // 2) Provider name + model
    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or("gpt-4.1-nano");
        return create_vision_provider(name, model);
    }

    // 3) Environment pair
    if let (Ok(prov), Ok(model)) = (
        std::env::var("PDF2QUIZ_PROVIDER"),
        std::env::var("PDF2QUIZ_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_vision_provider(&prov, &model);
        }
    }

    // Prefer OpenAI explicitly when an OpenAI API key is present, so users
    // with multiple provider keys get a deterministic default.
    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or("gpt-4.1-nano");
            return create_vision_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| Pdf2QuizError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, OPENROUTER_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
