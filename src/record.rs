//! The question data model shared by the normaliser and the workbook.

use serde::{Deserialize, Serialize};

/// One multiple-choice question extracted from a page image.
///
/// The VLM returns `question`, `options`, and `answer`; `source_label` is
/// stamped by the orchestrator after parsing (it tags which extraction
/// method produced the row and ends up in the workbook's unit column).
///
/// By convention `options` holds exactly four strings and `answer` equals
/// one of them verbatim. Neither is enforced at parse time: a five-option
/// question is still written out, and an answer that matches no option
/// simply leaves the row unhighlighted (see
/// [`QuestionRecord::matched_option`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// The question text.
    pub question: String,

    /// Ordered candidate answers. Four by convention.
    pub options: Vec<String>,

    /// The correct answer, expected to equal one option after trimming.
    pub answer: String,

    /// Informational tag identifying the extraction method. Never returned
    /// by the model; filled in from the run configuration.
    #[serde(default)]
    pub source_label: String,
}

impl QuestionRecord {
    /// Index of the option matching `answer` under trimmed exact string
    /// comparison, or `None` when no option matches.
    ///
    /// Trimming tolerates the most common model artefact (stray whitespace
    /// around the copied option text) while deliberately *not* matching
    /// deeper mismatches like trailing punctuation — those rows stay
    /// unhighlighted so a human reviewer notices them.
    pub fn matched_option(&self) -> Option<usize> {
        let answer = self.answer.trim();
        self.options.iter().position(|opt| opt.trim() == answer)
    }

    /// Whether the record carries enough data to produce a workbook row.
    pub fn is_complete(&self) -> bool {
        !self.question.trim().is_empty() && !self.options.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(options: &[&str], answer: &str) -> QuestionRecord {
        QuestionRecord {
            question: "Q".into(),
            options: options.iter().map(|s| s.to_string()).collect(),
            answer: answer.into(),
            source_label: String::new(),
        }
    }

    #[test]
    fn matched_option_exact() {
        let r = record(&["A", "B", "C", "D"], "B");
        assert_eq!(r.matched_option(), Some(1));
    }

    #[test]
    fn matched_option_trims_whitespace() {
        let r = record(&["A ", " B", "C", "D"], "  B ");
        assert_eq!(r.matched_option(), Some(1));
    }

    #[test]
    fn matched_option_punctuation_mismatch() {
        let r = record(&["A", "B", "C", "D"], "B.");
        assert_eq!(r.matched_option(), None);
    }

    #[test]
    fn matched_option_none_on_foreign_answer() {
        let r = record(&["A", "B", "C", "D"], "E");
        assert_eq!(r.matched_option(), None);
    }

    #[test]
    fn completeness() {
        assert!(record(&["A"], "A").is_complete());
        assert!(!record(&[], "A").is_complete());
        let mut r = record(&["A"], "A");
        r.question = "   ".into();
        assert!(!r.is_complete());
    }

    #[test]
    fn deserialises_without_source_label() {
        let r: QuestionRecord = serde_json::from_str(
            r#"{"question":"Q1","options":["A","B","C","D"],"answer":"A"}"#,
        )
        .unwrap();
        assert_eq!(r.source_label, "");
        assert_eq!(r.options.len(), 4);
    }
}
