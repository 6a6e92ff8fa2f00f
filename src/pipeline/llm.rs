//! VLM interaction: build the vision request and call the provider.
//!
//! This module converts one rasterised page image into a VLM API call and
//! returns a typed [`PageReport`]. It is intentionally thin — the prompt
//! lives in [`crate::prompts`] and the reply recovery in
//! [`super::normalize`], so retry and error handling stay isolated here.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 errors from LLM APIs are transient. Exponential backoff
//! (`retry_backoff_ms * 2^attempt`) gives the endpoint room to recover:
//! with 500 ms base and 3 retries the wait sequence is 500 ms → 1 s → 2 s.
//! Every per-page failure follows the same retry-then-skip policy — a page
//! that still fails after the last retry is recorded in the report and the
//! run moves on. A reply that parses to zero questions is *not* retried:
//! the page may genuinely hold no usable content, and re-asking the model
//! about a blank page just burns tokens.

use crate::config::ExtractionConfig;
use crate::error::PageError;
use crate::output::PageReport;
use crate::pipeline::normalize;
use crate::prompts::extraction_prompt;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// Ask the VLM for questions from a single page image.
///
/// The request is one user message carrying the extraction prompt (with the
/// desired question count already substituted) plus the base64 JPEG of the
/// page — mirroring how a human would paste a photo into a chat.
///
/// Always returns a `PageReport` — never propagates the error upward, so a
/// single bad page doesn't abort the run. The report encodes the three-way
/// outcome callers need to distinguish: `questions` non-empty (success),
/// `questions` empty with `error: None` (page had nothing recoverable),
/// or `error: Some(..)` (transport failure after retries).
pub async fn generate_questions(
    provider: &Arc<dyn LLMProvider>,
    page_num: usize,
    image_data: ImageData,
    config: &ExtractionConfig,
) -> PageReport {
    let start = Instant::now();
    let prompt = extraction_prompt(config.prompt.as_deref(), config.questions_per_page);

    let messages = vec![ChatMessage::user_with_images(&prompt, vec![image_data])];
    let options = build_options(config);

    let mut last_err: Option<String> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config.retry_backoff_ms * 2u64.pow(attempt - 1);
            warn!(
                "Page {}: retry {}/{} after {}ms",
                page_num, attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        match provider.chat(&messages, Some(&options)).await {
            Ok(response) => {
                let duration = start.elapsed();
                debug!(
                    "Page {}: {} input tokens, {} output tokens, {:?}",
                    page_num, response.prompt_tokens, response.completion_tokens, duration
                );

                let mut questions = normalize::parse_records(&response.content);
                for q in &mut questions {
                    q.source_label = config.source_label.clone();
                }
                if questions.is_empty() {
                    warn!(
                        "Page {}: no questions recovered from a {}-char reply",
                        page_num,
                        response.content.len()
                    );
                }

                return PageReport {
                    page_num,
                    questions,
                    input_tokens: response.prompt_tokens as u32,
                    output_tokens: response.completion_tokens as u32,
                    duration_ms: duration.as_millis() as u64,
                    retries: attempt as u8,
                    error: None,
                };
            }
            Err(e) => {
                let err_msg = format!("{}", e);
                warn!(
                    "Page {}: attempt {} failed — {}",
                    page_num,
                    attempt + 1,
                    err_msg
                );
                last_err = Some(err_msg);
            }
        }
    }

    // All retries exhausted
    let duration = start.elapsed();
    let err_msg = last_err.unwrap_or_else(|| "Unknown error".to_string());

    PageReport {
        page_num,
        questions: Vec::new(),
        input_tokens: 0,
        output_tokens: 0,
        duration_ms: duration.as_millis() as u64,
        retries: config.max_retries as u8,
        error: Some(PageError::LlmFailed {
            page: page_num,
            retries: config.max_retries as u8,
            detail: err_msg,
        }),
    }
}

/// Build `CompletionOptions` from the extraction config.
fn build_options(config: &ExtractionConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_defaults() {
        let config = ExtractionConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.1));
        assert_eq!(opts.max_tokens, Some(4096));
    }
}
