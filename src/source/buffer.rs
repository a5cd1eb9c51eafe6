//! Line bookkeeping over a SQL string.

use crate::source::range::SourceRange;

/// Precomputed line starts over a borrowed text, for offset to line/column
/// mapping by binary search.
pub struct SourceBuffer<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> SourceBuffer<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { text, line_starts }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// 1-based line containing `offset`.
    pub fn line_of(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|start| *start <= offset)
    }

    /// 1-based `(line, column)` of `offset`; columns count bytes.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = self.line_of(offset);
        (line, offset - self.line_starts[line - 1] + 1)
    }

    /// Content span of a 1-based line, excluding the newline.
    pub fn line_span(&self, line: usize) -> SourceRange {
        let start = self.line_starts[line - 1];
        let end = self
            .line_starts
            .get(line)
            .map(|next| next - 1)
            .unwrap_or(self.text.len());
        SourceRange::new(start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SQL: &str = "SELECT *\nFROM users\nWHERE id = 1";

    #[rstest]
    #[case(0, (1, 1))]
    #[case(7, (1, 8))]
    #[case(9, (2, 1))]
    #[case(14, (2, 6))]
    #[case(20, (3, 1))]
    fn maps_offsets_to_line_and_column(#[case] offset: usize, #[case] expected: (usize, usize)) {
        assert_eq!(SourceBuffer::new(SQL).line_col(offset), expected);
    }

    #[test]
    fn line_spans_exclude_newlines() {
        let buf = SourceBuffer::new(SQL);
        assert_eq!(buf.line_count(), 3);
        for (line, expected) in [(1, "SELECT *"), (2, "FROM users"), (3, "WHERE id = 1")] {
            let span = buf.line_span(line);
            assert_eq!(&SQL[span.start..span.end], expected);
        }
    }

    #[test]
    fn single_line_text() {
        let buf = SourceBuffer::new("SELECT 1");
        assert_eq!(buf.line_count(), 1);
        assert_eq!(buf.line_col(5), (1, 6));
        let span = buf.line_span(1);
        assert_eq!((span.start, span.end), (0, 8));
    }
}
