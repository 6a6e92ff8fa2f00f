//! Extraction prompts for VLM-based question generation.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — tweaking the extraction instructions
//!    requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect the rendered prompt directly
//!    without spinning up a real VLM.
//!
//! Callers can override the template via
//! [`crate::config::ExtractionConfig::prompt`]; the constant here is used
//! only when no override is provided.

/// Default extraction prompt template.
///
/// `{n}` is replaced with the per-page question count before the call.
/// The JSON format line doubles as a schema the normaliser relies on:
/// a top-level array of `{question, options[4], answer}` objects, where
/// `answer` must copy one option verbatim (the workbook highlight is an
/// exact post-trim string match).
pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"You are a visual expert and a professional teacher.
1. Examine the image with high precision (the text is in Arabic).
2. Ignore any visual noise; focus on the textual content.
3. Extract {n} multiple-choice questions from the page content.
4. Each question has exactly 4 options, and "answer" must repeat one of the options verbatim, character for character.
5. Reply with a JSON list ONLY — no commentary, no markdown fences.
Format: [{"question": "...", "options": ["...", "...", "...", "..."], "answer": "..."}]"#;

/// Render the extraction prompt for the given question count.
///
/// Uses `template` when provided (library callers may supply a
/// domain-specific prompt), falling back to [`DEFAULT_PROMPT_TEMPLATE`].
pub fn extraction_prompt(template: Option<&str>, questions_per_page: u8) -> String {
    template
        .unwrap_or(DEFAULT_PROMPT_TEMPLATE)
        .replace("{n}", &questions_per_page.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prompt_embeds_count() {
        let p = extraction_prompt(None, 5);
        assert!(p.contains("Extract 5 multiple-choice questions"));
        assert!(!p.contains("{n}"));
    }

    #[test]
    fn default_prompt_demands_bare_json() {
        let p = extraction_prompt(None, 3);
        assert!(p.contains("JSON list ONLY"));
        assert!(p.contains(r#""options""#));
    }

    #[test]
    fn custom_template_used_verbatim() {
        let p = extraction_prompt(Some("give me {n} things"), 2);
        assert_eq!(p, "give me 2 things");
    }
}
