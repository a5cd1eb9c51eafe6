//! Decorating SQL text around matched ranges.

use crate::source::buffer::SourceBuffer;
use crate::source::range::{SourceRange, merge_ranges};
use itertools::Itertools;

/// Delimiter pair wrapped around each matched range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Style {
    /// Bold red + reset.
    #[display("ansi")]
    Ansi,
    /// `<mark>` tags; all text is HTML-escaped.
    #[display("html")]
    Html,
    /// `**` emphasis.
    #[display("markdown")]
    Markdown,
}

impl Style {
    const fn prefix(self) -> &'static str {
        match self {
            Style::Ansi => "\x1b[1;31m",
            Style::Html => "<mark>",
            Style::Markdown => "**",
        }
    }

    const fn suffix(self) -> &'static str {
        match self {
            Style::Ansi => "\x1b[0m",
            Style::Html => "</mark>",
            Style::Markdown => "**",
        }
    }

    fn escape(self, text: &str) -> String {
        match self {
            Style::Html => text
                .replace('&', "&amp;")
                .replace('<', "&lt;")
                .replace('>', "&gt;"),
            _ => text.to_string(),
        }
    }
}

/// Wrap every range with the style's delimiters. Overlapping or touching
/// ranges are merged first, so equal coverage gives equal output.
pub fn highlight(sql: &str, ranges: &[SourceRange], style: Style) -> String {
    let merged = merge_ranges(ranges.to_vec());
    decorate_span(sql, SourceRange::new(0, sql.len()), &merged, style)
}

/// Context mode: only lines touched by a range, with `context_lines` of
/// surrounding lines, and `...` markers standing in for elided stretches.
pub fn highlight_context(
    sql: &str,
    ranges: &[SourceRange],
    style: Style,
    context_lines: usize,
) -> String {
    let merged = merge_ranges(ranges.to_vec());
    if merged.is_empty() {
        return String::new();
    }
    let buffer = SourceBuffer::new(sql);

    let wanted: Vec<usize> = merged
        .iter()
        .flat_map(|range| {
            let first = buffer.line_of(range.start);
            let last = buffer.line_of(range.end.saturating_sub(1).max(range.start));
            first.saturating_sub(context_lines).max(1)
                ..=(last + context_lines).min(buffer.line_count())
        })
        .sorted()
        .dedup()
        .collect();

    let mut out = String::new();
    let mut previous: Option<usize> = None;
    for line in wanted {
        if previous.is_some_and(|p| line > p + 1) {
            out.push_str("...\n");
        }
        let span = buffer.line_span(line);
        out.push_str(&decorate_span(sql, span, &merged, style));
        out.push('\n');
        previous = Some(line);
    }
    out
}

/// Decorate the `window` slice of `sql`, wrapping the parts of `ranges`
/// that fall inside it. `ranges` must be disjoint and ascending.
fn decorate_span(sql: &str, window: SourceRange, ranges: &[SourceRange], style: Style) -> String {
    let mut out = String::new();
    let mut pos = window.start;
    for range in ranges {
        let Some(clipped) = range.clip(&window) else {
            continue;
        };
        out.push_str(&style.escape(&sql[pos..clipped.start]));
        out.push_str(style.prefix());
        out.push_str(&style.escape(&sql[clipped.start..clipped.end]));
        out.push_str(style.suffix());
        pos = clipped.end;
    }
    out.push_str(&style.escape(&sql[pos..window.end]));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn r(start: usize, end: usize) -> SourceRange {
        SourceRange::new(start, end)
    }

    #[rstest]
    #[case(Style::Ansi, "SELECT * FROM \x1b[1;31musers\x1b[0m")]
    #[case(Style::Html, "SELECT * FROM <mark>users</mark>")]
    #[case(Style::Markdown, "SELECT * FROM **users**")]
    fn wraps_a_single_range(#[case] style: Style, #[case] expected: &str) {
        assert_eq!(
            highlight("SELECT * FROM users", &[r(14, 19)], style),
            expected
        );
    }

    #[test]
    fn html_escapes_the_unmatched_text() {
        assert_eq!(
            highlight("a < b", &[r(0, 1)], Style::Html),
            "<mark>a</mark> &lt; b"
        );
    }

    #[test]
    fn overlapping_ranges_equal_their_merged_form() {
        let sql = "SELECT * FROM users";
        let overlapping = highlight(sql, &[r(14, 17), r(15, 19)], Style::Markdown);
        let merged = highlight(sql, &[r(14, 19)], Style::Markdown);
        assert_eq!(overlapping, merged);
    }

    #[test]
    fn no_ranges_returns_the_text_untouched() {
        assert_eq!(highlight("SELECT 1", &[], Style::Ansi), "SELECT 1");
    }

    #[test]
    fn context_mode_keeps_nearby_lines_and_elides_the_rest() {
        let sql = "line one\nline two\nline three\nline four\nline five\nline six";
        // Highlight "two" (offsets 14..17) and "six" (offsets 54..57).
        let out = highlight_context(sql, &[r(14, 17), r(54, 57)], Style::Markdown, 1);
        assert_eq!(
            out,
            "line one\nline **two**\nline three\n...\nline five\nline **six**\n"
        );
    }

    #[test]
    fn context_mode_with_no_ranges_is_empty() {
        assert_eq!(
            highlight_context("SELECT 1", &[], Style::Ansi, 2),
            String::new()
        );
    }
}
