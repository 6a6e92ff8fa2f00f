//! Response normalisation: recover a JSON array from a free-text VLM reply.
//!
//! Vision models rarely return the bare JSON array the prompt asks for.
//! The two failure shapes seen in practice are a markdown code fence
//! (```json … ```) wrapped around the array, and explanatory prose before
//! or after it ("Here are the questions you requested: […] Let me know…").
//!
//! Two recovery strategies are applied in order:
//!
//! 1. **Fence extraction** — take the body of the first fenced block,
//!    preferring a fence tagged `json`, and discard everything outside it.
//! 2. **Bracket scan** — slice from the first `[` to the last `]`
//!    inclusive.
//!
//! Both are attempted before giving up; a candidate that fails to parse
//! falls through to the next strategy. This is deliberately a heuristic,
//! not a grammar: the variability lives in the upstream model, and two
//! string slices catch everything it actually produces.
//!
//! Every failure mode — no brackets, invalid JSON, a top-level object
//! instead of an array — yields an empty vec. The caller treats that as
//! "zero questions extracted from this page", never as an error.

use crate::record::QuestionRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

static RE_JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```json\s*(.*?)```").unwrap());

static RE_ANY_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[a-zA-Z]*\s*(.*?)```").unwrap());

/// Parse a raw VLM reply into question records.
///
/// Elements of the recovered array are deserialised independently, so a
/// single malformed item (missing `answer`, `options` as a string, …)
/// is skipped with a warning instead of discarding its siblings.
pub fn parse_records(raw: &str) -> Vec<QuestionRecord> {
    let Some(items) = recover_json_array(raw) else {
        return Vec::new();
    };

    let mut records = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<QuestionRecord>(item) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping malformed question object #{}: {}", i + 1, e),
        }
    }
    records
}

/// Recover the first parseable JSON array from the reply.
///
/// Returns `None` when neither strategy produces valid JSON, or when the
/// recovered value is not an array.
pub fn recover_json_array(raw: &str) -> Option<Vec<Value>> {
    for candidate in [fence_candidate(raw), bracket_candidate(raw)]
        .into_iter()
        .flatten()
    {
        match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Array(items)) => return Some(items),
            Ok(other) => {
                debug!("Recovered JSON is not an array: {}", type_name(&other));
            }
            Err(e) => {
                debug!("Candidate substring is not valid JSON: {}", e);
            }
        }
    }
    None
}

/// The body of the first fenced block, preferring a fence tagged `json`.
fn fence_candidate(raw: &str) -> Option<&str> {
    RE_JSON_FENCE
        .captures(raw)
        .or_else(|| RE_ANY_FENCE.captures(raw))
        .map(|caps| caps.get(1).unwrap().as_str().trim())
}

/// The substring from the first `[` to the last `]`, inclusive.
fn bracket_candidate(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        return Some(trimmed);
    }
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    (start < end).then(|| &raw[start..=end])
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAN: &str =
        r#"[{"question":"Q1","options":["A","B","C","D"],"answer":"B"}]"#;

    #[test]
    fn clean_array_passes_through() {
        let records = parse_records(CLEAN);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].answer, "B");
    }

    #[test]
    fn json_fence_is_unwrapped() {
        let raw = format!("Here you go:\n```json\n{CLEAN}\n```\nEnjoy!");
        let records = parse_records(&raw);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].question, "Q1");
    }

    #[test]
    fn bare_fence_is_unwrapped() {
        let raw = format!("```\n{CLEAN}\n```");
        assert_eq!(parse_records(&raw).len(), 1);
    }

    #[test]
    fn surrounding_prose_is_discarded() {
        let raw = format!("Sure! The questions are: {CLEAN} — let me know if you need more.");
        let records = parse_records(&raw);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn garbage_yields_empty() {
        assert!(parse_records("I could not read this page, sorry.").is_empty());
        assert!(parse_records("").is_empty());
        assert!(parse_records("]mismatched[").is_empty());
    }

    #[test]
    fn invalid_json_between_brackets_yields_empty() {
        assert!(parse_records("prefix [not json at all] suffix").is_empty());
    }

    #[test]
    fn top_level_object_yields_empty() {
        assert!(parse_records(r#"{"question":"Q"}"#).is_empty());
    }

    #[test]
    fn unparseable_fence_falls_back_to_bracket_scan() {
        // The fence holds prose, but a valid array sits outside it.
        let raw = format!("```\nthinking...\n``` here: {CLEAN}");
        assert_eq!(parse_records(&raw).len(), 1);
    }

    #[test]
    fn malformed_items_are_skipped_not_fatal() {
        let raw = r#"[
            {"question":"Q1","options":["A","B","C","D"],"answer":"A"},
            {"question":"broken"},
            {"question":"Q3","options":["W","X","Y","Z"],"answer":"Z"}
        ]"#;
        let records = parse_records(raw);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].question, "Q1");
        assert_eq!(records[1].answer, "Z");
    }

    #[test]
    fn round_trip_is_stable() {
        let records = parse_records(CLEAN);
        let emitted = serde_json::to_string(&records).unwrap();
        let reparsed = parse_records(&emitted);
        assert_eq!(records, reparsed);
    }
}
