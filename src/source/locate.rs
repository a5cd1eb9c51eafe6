//! Byte-range recovery for matched nodes.
//!
//! The parser records only a start offset per node. End offsets are
//! estimated by scanning the original text from that offset with a
//! heuristic chosen by node kind: identifiers (with dotted qualification
//! and quoting), string and numeric constants, function calls with their
//! argument parentheses, and the leading keyword for whole statements.
//! The start is authoritative; the end is best effort.

use crate::ast::node::Node;
use crate::ast::schema;
use crate::source::range::{SourceRange, merge_ranges};

/// Characters that terminate the fallback scan.
const DELIMITERS: &[u8] = b".,;()[]{}=<>+-*/%";

/// Byte range of `node` within `sql`, when the node carries a usable start
/// offset.
pub fn locate(sql: &str, node: &Node) -> Option<SourceRange> {
    let start = node.location()?;
    if start >= sql.len() {
        return None;
    }
    let end = estimate_end(sql, start, node.type_name());
    Some(SourceRange::new(start, end))
}

/// Ranges for a batch of nodes, merged into a disjoint list.
pub fn locate_all<'a>(sql: &str, nodes: impl IntoIterator<Item = &'a Node>) -> Vec<SourceRange> {
    merge_ranges(
        nodes
            .into_iter()
            .filter_map(|node| locate(sql, node))
            .collect(),
    )
}

fn estimate_end(sql: &str, start: usize, type_name: &str) -> usize {
    match schema::canonical(type_name).as_str() {
        "rangevar" | "columnref" | "string" | "alias" | "typename" | "paramref" => {
            scan_identifier(sql, start)
        }
        "aconst" => scan_constant(sql, start),
        "integer" | "float" => scan_number(sql, start),
        "boolean" => scan_identifier(sql, start),
        "funccall" => scan_call(sql, start),
        "selectstmt" | "insertstmt" | "updatestmt" | "deletestmt" | "createstmt" | "dropstmt"
        | "altertablestmt" | "truncatestmt" | "grantstmt" | "dostmt" => scan_word(sql, start),
        _ => scan_fallback(sql, start),
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

fn scan_word(sql: &str, start: usize) -> usize {
    let bytes = sql.as_bytes();
    let mut i = start;
    while i < bytes.len() && is_ident_byte(bytes[i]) {
        i += 1;
    }
    if i == start { start + 1 } else { i }
}

/// One identifier segment: a bare word or a `"…"` quoted name.
fn scan_segment(sql: &str, start: usize) -> usize {
    let bytes = sql.as_bytes();
    if bytes.get(start) == Some(&b'"') {
        let mut i = start + 1;
        while i < bytes.len() && bytes[i] != b'"' {
            i += 1;
        }
        return (i + 1).min(sql.len());
    }
    scan_word(sql, start)
}

/// Identifier with optional dotted qualification: `schema.table`,
/// `t."Column"`, `a.b.c`.
fn scan_identifier(sql: &str, start: usize) -> usize {
    let bytes = sql.as_bytes();
    let mut i = scan_segment(sql, start);
    while bytes.get(i) == Some(&b'.')
        && bytes
            .get(i + 1)
            .is_some_and(|b| is_ident_byte(*b) || *b == b'"' || *b == b'*')
    {
        if bytes.get(i + 1) == Some(&b'*') {
            return i + 2;
        }
        i = scan_segment(sql, i + 1);
    }
    i
}

fn scan_number(sql: &str, start: usize) -> usize {
    let bytes = sql.as_bytes();
    let mut i = start;
    if matches!(bytes.get(i), Some(b'+') | Some(b'-')) {
        i += 1;
    }
    let digits_from = i;
    while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
        i += 1;
    }
    if i == digits_from { start + 1 } else { i }
}

/// A `'…'` string constant with doubled-quote and backslash escapes.
fn scan_string(sql: &str, start: usize) -> usize {
    let bytes = sql.as_bytes();
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\'' => {
                if bytes.get(i + 1) == Some(&b'\'') {
                    i += 2;
                } else {
                    return i + 1;
                }
            }
            _ => i += 1,
        }
    }
    sql.len()
}

/// Constant of unknown flavour: dispatch on the first character.
fn scan_constant(sql: &str, start: usize) -> usize {
    match sql.as_bytes().get(start) {
        Some(b'\'') => scan_string(sql, start),
        Some(b) if b.is_ascii_digit() || *b == b'+' || *b == b'-' => scan_number(sql, start),
        _ => scan_word(sql, start),
    }
}

/// Function name plus its balanced argument list, when one follows.
fn scan_call(sql: &str, start: usize) -> usize {
    let bytes = sql.as_bytes();
    let mut i = scan_identifier(sql, start);
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    if bytes.get(i) != Some(&b'(') {
        return scan_identifier(sql, start);
    }
    let mut depth = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b'\'' => {
                i = scan_string(sql, i);
                continue;
            }
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    sql.len()
}

fn scan_fallback(sql: &str, start: usize) -> usize {
    let bytes = sql.as_bytes();
    let mut i = start;
    while i < bytes.len() && !bytes[i].is_ascii_whitespace() && !DELIMITERS.contains(&bytes[i]) {
        i += 1;
    }
    if i == start { start + 1 } else { i }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::node::NodeBuilder;
    use rstest::rstest;

    fn node_at(type_name: &str, location: i64) -> Node {
        NodeBuilder::new(type_name)
            .scalar("location", location)
            .build()
    }

    fn located<'a>(sql: &'a str, type_name: &str, location: i64) -> Option<&'a str> {
        locate(sql, &node_at(type_name, location)).map(|r| &sql[r.start..r.end])
    }

    #[rstest]
    #[case("SELECT * FROM users", "RangeVar", 14, "users")]
    #[case("SELECT * FROM public.users u", "RangeVar", 14, "public.users")]
    #[case("SELECT * FROM \"Users\"", "RangeVar", 14, "\"Users\"")]
    #[case("SELECT a.b FROM t", "ColumnRef", 7, "a.b")]
    #[case("SELECT t.* FROM t", "ColumnRef", 7, "t.*")]
    fn identifier_scans(
        #[case] sql: &str,
        #[case] type_name: &str,
        #[case] location: i64,
        #[case] expected: &str,
    ) {
        assert_eq!(located(sql, type_name, location), Some(expected));
    }

    #[rstest]
    #[case("SELECT 'it''s'", 7, "'it''s'")]
    #[case("SELECT 'a\\'b'", 7, "'a\\'b'")]
    #[case("WHERE x = 42 AND y", 10, "42")]
    #[case("WHERE x = -7", 10, "-7")]
    fn constant_scans(#[case] sql: &str, #[case] location: i64, #[case] expected: &str) {
        assert_eq!(located(sql, "A_Const", location), Some(expected));
    }

    #[test]
    fn call_scan_takes_balanced_parens() {
        let sql = "SELECT lower(concat(a, ')')) FROM t";
        assert_eq!(located(sql, "FuncCall", 7), Some("lower(concat(a, ')'))"));
    }

    #[test]
    fn call_without_parens_degrades_to_identifier() {
        assert_eq!(located("SELECT now FROM t", "FuncCall", 7), Some("now"));
    }

    #[test]
    fn statement_kinds_cover_the_leading_keyword() {
        assert_eq!(located("SELECT * FROM t", "SelectStmt", 0), Some("SELECT"));
    }

    #[test]
    fn fallback_stops_at_delimiters() {
        assert_eq!(located("a@b, c", "Unknown", 0), Some("a@b"));
    }

    #[test]
    fn missing_or_out_of_range_locations_yield_nothing() {
        assert_eq!(locate("SELECT 1", &node_at("RangeVar", -1)), None);
        assert_eq!(locate("short", &node_at("RangeVar", 99)), None);
        let no_location = NodeBuilder::new("SelectStmt").build();
        assert_eq!(locate("SELECT 1", &no_location), None);
    }

    #[test]
    fn batch_location_merges_overlaps() {
        let sql = "SELECT * FROM users";
        let nodes = [node_at("RangeVar", 14), node_at("RangeVar", 14)];
        let ranges = locate_all(sql, nodes.iter());
        assert_eq!(ranges, vec![SourceRange::new(14, 19)]);
    }
}
