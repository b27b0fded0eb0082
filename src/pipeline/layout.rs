//! Renderer-independent layout rules shared by the PDF and DOCX writers.
//!
//! These are deliberately heuristics, and their outputs are part of the
//! observable contract:
//!
//! * a line is a heading when it starts with an uppercase ASCII letter and
//!   contains no `.` anywhere,
//! * the page count is `ceil(len(text) / 3000)`, independent of the real
//!   layout,
//! * filenames are derived from the title by stripping everything outside
//!   `[A-Za-z0-9 _-]` and turning whitespace runs into `_`.

use crate::job::OutputFormat;
use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::Regex;

/// Characters of extracted text assumed to fill one page.
pub const CHARS_PER_PAGE: usize = 3000;

/// Stem used when a title sanitises to nothing.
pub const FALLBACK_STEM: &str = "Untitled";

static RE_DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9\s_-]").unwrap());
static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z][^.]*$").unwrap());

/// Everything a writer lays out: the header block and the body text.
#[derive(Debug, Clone, Copy)]
pub struct Document<'a> {
    pub title: &'a str,
    pub text: &'a str,
    pub source_url: &'a str,
    /// Pre-formatted generation date, see [`generated_on`].
    pub generated: &'a str,
}

impl Document<'_> {
    pub fn source_line(&self) -> String {
        format!("Source: {}", self.source_url)
    }

    pub fn generated_line(&self) -> String {
        format!("Generated: {}", self.generated)
    }

    pub fn blocks(&self) -> Vec<Block<'_>> {
        classify(self.text)
    }
}

/// One line of body text after classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block<'a> {
    /// Empty or whitespace-only line: vertical space, no text.
    Blank,
    /// Bold, larger, left-aligned.
    Heading(&'a str),
    /// Normal weight, justified.
    Body(&'a str),
}

/// Split structured text on `\n` and classify every line.
pub fn classify(text: &str) -> Vec<Block<'_>> {
    text.split('\n').map(classify_line).collect()
}

pub fn classify_line(line: &str) -> Block<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        Block::Blank
    } else if is_heading(line) {
        Block::Heading(trimmed)
    } else {
        Block::Body(trimmed)
    }
}

/// The heading heuristic, applied to the untrimmed line.
pub fn is_heading(line: &str) -> bool {
    RE_HEADING.is_match(line)
}

/// Reduce a title to a filesystem-safe stem.
///
/// Deterministic and idempotent: `sanitize_title(sanitize_title(t)) ==
/// sanitize_title(t)`.
pub fn sanitize_title(title: &str) -> String {
    let kept = RE_DISALLOWED.replace_all(title, "");
    let stem = RE_WHITESPACE.replace_all(&kept, "_").into_owned();
    if stem.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        stem
    }
}

/// `<sanitized-title>.<ext>`. Equal titles map to equal names; a later
/// artifact overwrites an earlier one.
pub fn artifact_filename(title: &str, format: OutputFormat) -> String {
    format!("{}.{}", sanitize_title(title), format.extension())
}

/// Estimated page count: `ceil(len / 3000)`, at least 1.
///
/// Length is counted in UTF-16 code units, the unit browsers report for
/// extracted text.
pub fn estimate_pages(text: &str) -> u32 {
    let len = text.encode_utf16().count();
    len.div_ceil(CHARS_PER_PAGE).max(1) as u32
}

/// Human-readable generation date, e.g. `10/18/2026`.
pub fn generated_on(now: DateTime<Local>) -> String {
    now.format("%-m/%-d/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn page_estimate_is_ceiling_of_length_over_3000() {
        assert_eq!(estimate_pages(&"a".repeat(9000)), 3);
        assert_eq!(estimate_pages(&"a".repeat(9001)), 4);
        assert_eq!(estimate_pages("a"), 1);
        assert_eq!(estimate_pages(&"a".repeat(3000)), 1);
        assert_eq!(estimate_pages(&"a".repeat(3001)), 2);
    }

    #[test]
    fn page_estimate_never_below_one() {
        assert_eq!(estimate_pages(""), 1);
    }

    #[test]
    fn sanitize_strips_and_underscores() {
        assert_eq!(sanitize_title("Hello, World!"), "Hello_World");
        assert_eq!(sanitize_title("Rust  —  The Book (2nd ed.)"), "Rust_The_Book_2nd_ed");
        assert_eq!(sanitize_title("a-b c"), "a-b_c");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for title in ["Hello, World!", "  spaced   out  ", "Ünïcödé title", "already_clean-name", "???"] {
            let once = sanitize_title(title);
            assert_eq!(sanitize_title(&once), once, "title: {title:?}");
        }
    }

    #[test]
    fn sanitize_empty_result_falls_back() {
        assert_eq!(sanitize_title("???"), FALLBACK_STEM);
        assert_eq!(sanitize_title(""), FALLBACK_STEM);
    }

    #[test]
    fn filename_uses_format_extension() {
        assert_eq!(artifact_filename("My Page", OutputFormat::Pdf), "My_Page.pdf");
        assert_eq!(artifact_filename("My Page", OutputFormat::Docx), "My_Page.docx");
    }

    #[test]
    fn heading_heuristic() {
        assert!(is_heading("Introduction"));
        assert!(is_heading("Getting Started With Rust"));
        assert!(!is_heading("Ends with a period."));
        assert!(!is_heading("lowercase start"));
        assert!(!is_heading("Version 1.2 notes"));
        assert!(!is_heading(" Leading space"));
        assert!(!is_heading("• Bullet item"));
    }

    #[test]
    fn classify_lines() {
        let blocks = classify("Title Line\n\nSome body text. More.\n  ");
        assert_eq!(
            blocks,
            vec![
                Block::Heading("Title Line"),
                Block::Blank,
                Block::Body("Some body text. More."),
                Block::Blank,
            ]
        );
    }

    #[test]
    fn generated_date_format() {
        let d = Local.with_ymd_and_hms(2026, 3, 7, 12, 0, 0).unwrap();
        assert_eq!(generated_on(d), "3/7/2026");
    }
}
