//! Spreadsheet compilation: question records → colour-coded `.xlsx` bytes.
//!
//! ## Column layout
//!
//! | col | header    | content                                      |
//! |-----|-----------|----------------------------------------------|
//! | A   | `الوحدة`  | the record's `source_label`                  |
//! | B   | `السؤال`  | question text                                |
//! | C   | `فراغ`    | always empty — reserved for manual annotation |
//! | D–G | `Opt1..4` | the four options                             |
//!
//! The ground-truth `answer` is never written as its own column; it exists
//! only as the colouring key. Each option cell is compared to the answer
//! independently under trimmed exact equality: the matching cell gets a
//! solid green fill with a border, the rest get a plain border. Normally
//! exactly one cell per row is green; zero when the model's answer doesn't
//! repeat any option verbatim (logged, not an error — a reviewer spots the
//! uncoloured row immediately).

use crate::error::Pdf2QuizError;
use crate::record::QuestionRecord;
use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook};
use tracing::warn;

/// Default worksheet name ("question bank", kept from the workbook format
/// this crate replaces).
pub const DEFAULT_SHEET_NAME: &str = "بنك الأسئلة";

/// Header row. Unit, question, and spacer headers stay Arabic to match the
/// downstream template the spreadsheets are imported into.
const HEADERS: [&str; 7] = ["الوحدة", "السؤال", "فراغ", "Opt1", "Opt2", "Opt3", "Opt4"];

/// Column indices for the option block (D through G).
const FIRST_OPTION_COL: u16 = 3;
const OPTION_COLS: usize = 4;

/// Fill colour for the correct option cell.
const HIGHLIGHT_GREEN: Color = Color::RGB(0x00FF00);

/// Whether this option cell should be highlighted as the correct answer.
pub(crate) fn is_correct_option(option: &str, answer: &str) -> bool {
    option.trim() == answer.trim()
}

/// Compile all accumulated records into a single-worksheet `.xlsx`.
///
/// Records missing a question or options are skipped with a warning — one
/// malformed model reply must not cost the user the whole workbook.
///
/// # Returns
/// The serialised workbook bytes, ready to write to disk or stream out.
pub fn compile_workbook(
    records: &[QuestionRecord],
    sheet_name: &str,
) -> Result<Vec<u8>, Pdf2QuizError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name).map_err(to_workbook_err)?;

    let header_fmt = Format::new().set_bold().set_border(FormatBorder::Thin);
    let green_fmt = Format::new()
        .set_background_color(HIGHLIGHT_GREEN)
        .set_border(FormatBorder::Thin);
    let border_fmt = Format::new().set_border(FormatBorder::Thin);

    for (col, header) in HEADERS.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *header, &header_fmt)
            .map_err(to_workbook_err)?;
    }

    // Readable defaults: wide question column, medium option columns.
    sheet.set_column_width(1, 60).map_err(to_workbook_err)?;
    for col in FIRST_OPTION_COL..FIRST_OPTION_COL + OPTION_COLS as u16 {
        sheet.set_column_width(col, 24).map_err(to_workbook_err)?;
    }

    let mut row: u32 = 1;
    for record in records {
        if !record.is_complete() {
            warn!(
                "Skipping record with missing fields (question: {:?})",
                record.question
            );
            continue;
        }
        if record.matched_option().is_none() {
            warn!(
                "Answer {:?} matches no option; row {} will have no highlight",
                record.answer, row
            );
        }

        sheet
            .write_string(row, 0, &record.source_label)
            .map_err(to_workbook_err)?;
        sheet
            .write_string(row, 1, &record.question)
            .map_err(to_workbook_err)?;
        // Column C stays unwritten: the spacer is genuinely empty.

        for (i, option) in record.options.iter().take(OPTION_COLS).enumerate() {
            let fmt = if is_correct_option(option, &record.answer) {
                &green_fmt
            } else {
                &border_fmt
            };
            sheet
                .write_string_with_format(row, FIRST_OPTION_COL + i as u16, option, fmt)
                .map_err(to_workbook_err)?;
        }

        row += 1;
    }

    workbook.save_to_buffer().map_err(to_workbook_err)
}

fn to_workbook_err(e: rust_xlsxwriter::XlsxError) -> Pdf2QuizError {
    Pdf2QuizError::WorkbookFailed {
        detail: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn record(question: &str, options: &[&str], answer: &str) -> QuestionRecord {
        QuestionRecord {
            question: question.into(),
            options: options.iter().map(|s| s.to_string()).collect(),
            answer: answer.into(),
            source_label: "Vision AI".into(),
        }
    }

    #[test]
    fn highlight_predicate() {
        assert!(is_correct_option("B", "B"));
        assert!(is_correct_option(" B ", "B"));
        assert!(!is_correct_option("B.", "B"));
        assert!(!is_correct_option("A", "B"));
    }

    #[test]
    fn exactly_one_option_matches_per_row() {
        let r = record("Q1", &["A", "B", "C", "D"], "B");
        let mask: Vec<bool> = r
            .options
            .iter()
            .map(|o| is_correct_option(o, &r.answer))
            .collect();
        assert_eq!(mask, vec![false, true, false, false]);
    }

    #[test]
    fn no_option_matches_on_punctuation_mismatch() {
        let r = record("Q1", &["A", "B", "C", "D"], "B.");
        assert!(r
            .options
            .iter()
            .all(|o| !is_correct_option(o, &r.answer)));
    }

    #[test]
    fn compiles_two_row_workbook() {
        let records = vec![
            record("Q1", &["A", "B", "C", "D"], "B"),
            record("Q2", &["W", "X", "Y", "Z"], "Z"),
        ];
        let bytes = compile_workbook(&records, DEFAULT_SHEET_NAME).unwrap();
        // .xlsx is a zip container.
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn malformed_records_are_skipped_not_fatal() {
        let records = vec![
            record("Q1", &["A", "B", "C", "D"], "A"),
            record("", &["A"], "A"),
            record("Q3", &[], "A"),
        ];
        let bytes = compile_workbook(&records, DEFAULT_SHEET_NAME).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn empty_record_set_still_produces_a_workbook() {
        let bytes = compile_workbook(&[], DEFAULT_SHEET_NAME).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn unmatched_answer_is_not_fatal() {
        let records = vec![record("Q1", &["A", "B", "C", "D"], "E")];
        assert!(compile_workbook(&records, DEFAULT_SHEET_NAME).is_ok());
    }

    #[test]
    fn rejects_oversized_sheet_name() {
        // Excel caps worksheet names at 31 characters.
        let err = compile_workbook(&[], &"x".repeat(40)).unwrap_err();
        assert!(matches!(err, Pdf2QuizError::WorkbookFailed { .. }));
    }

    /// Read one entry of the produced .xlsx (a zip archive) as a string.
    fn read_zip_entry(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        let mut entry = archive.by_name(name).unwrap();
        let mut xml = String::new();
        entry.read_to_string(&mut xml).unwrap();
        xml
    }

    /// Extract the style index (`s` attribute) of a cell in the sheet XML.
    fn cell_style(sheet_xml: &str, cell: &str) -> String {
        let re = regex::Regex::new(&format!(r#"<c r="{cell}" s="(\d+)""#)).unwrap();
        re.captures(sheet_xml)
            .map(|c| c[1].to_string())
            .unwrap_or_else(|| panic!("cell {cell} not found or has no style"))
    }

    #[test]
    fn green_fill_lands_on_the_matched_option_cell() {
        // Answer "B" matches Opt2, which lives in column E of the data row.
        let records = vec![record("Q1", &["A", "B", "C", "D"], "B")];
        let bytes = compile_workbook(&records, DEFAULT_SHEET_NAME).unwrap();

        let styles = read_zip_entry(&bytes, "xl/styles.xml");
        assert!(
            styles.contains("FF00FF00"),
            "green fill must be registered in the style table"
        );

        let sheet = read_zip_entry(&bytes, "xl/worksheets/sheet1.xml");
        let d2 = cell_style(&sheet, "D2");
        let e2 = cell_style(&sheet, "E2");
        let f2 = cell_style(&sheet, "F2");
        let g2 = cell_style(&sheet, "G2");

        assert_ne!(e2, d2, "the matched cell must carry its own format");
        assert_eq!(d2, f2, "non-matching option cells share the border format");
        assert_eq!(d2, g2, "non-matching option cells share the border format");
    }

    #[test]
    fn no_green_fill_when_answer_matches_no_option() {
        let records = vec![record("Q1", &["A", "B", "C", "D"], "E")];
        let bytes = compile_workbook(&records, DEFAULT_SHEET_NAME).unwrap();

        let styles = read_zip_entry(&bytes, "xl/styles.xml");
        assert!(
            !styles.contains("FF00FF00"),
            "an unmatched answer must leave the row uncoloured"
        );
    }
}
