//! Extraction of nested SQL from procedural blocks.
//!
//! A `DO $$ … $$` statement carries its body as a string argument; any SQL
//! inside is invisible to a structural search of the outer tree. This
//! module digs the body text out of the block node and produces candidate
//! statements for the driver to re-parse. Two extractors:
//!
//! - the PL/pgSQL parser, whose JSON output carries every embedded query
//!   expression verbatim;
//! - a keyword splitter that cuts the body on `;` and keeps each piece
//!   from its first statement-head keyword on.
//!
//! Every failure in here is absorbed: a block that cannot be read or parsed
//! contributes nothing and the outer search continues.

use crate::ast::node::{FieldValue, Node};
use crate::ast::schema;
use crate::search::keyword::StatementKeyword;
use crate::*;
use serde_json::Value;

/// The SQL-as-string body of a procedural block node, read from the
/// `DefElem` argument named `"as"`.
pub(crate) fn block_body(node: &Node) -> Option<String> {
    let FieldValue::Messages(args) = node.get_field("args")? else {
        return None;
    };
    args.iter().find_map(|def| {
        if !schema::names_match(def.type_name(), "DefElem") {
            return None;
        }
        if def.scalar_str("defname")? != "as" {
            return None;
        }
        let FieldValue::Message(arg) = def.get_field("arg")? else {
            return None;
        };
        arg.scalar_str("sval").map(str::to_string)
    })
}

/// Candidate statements inside `body`, best effort.
pub(crate) fn candidates(body: &str) -> Vec<String> {
    if config().plpgsql_json {
        if let Some(found) = plpgsql_candidates(body) {
            if !found.is_empty() {
                return found;
            }
        }
        debug!("plpgsql extraction found nothing, falling back to splitter");
    }
    split_candidates(body)
}

/// Run the body through the PL/pgSQL parser and collect every query
/// expression from the resulting document. `None` when the parser rejects
/// the reconstructed block.
fn plpgsql_candidates(body: &str) -> Option<Vec<String>> {
    // The procedural parser wants a complete statement, not a bare body.
    if body.contains("$sqlgrep$") {
        return None;
    }
    let wrapped = format!("DO $sqlgrep$ {body} $sqlgrep$;");
    let doc = pg_query::parse_plpgsql(&wrapped).ok()?;
    let mut queries = Vec::new();
    collect_queries(&doc, &mut queries);
    queries.retain(|q| leading_keyword(q).is_some());
    Some(queries)
}

fn collect_queries(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                if key == "query" {
                    if let Value::String(query) = inner {
                        out.push(query.clone());
                        continue;
                    }
                }
                collect_queries(inner, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_queries(item, out);
            }
        }
        _ => {}
    }
}

/// Cut the body on `;` and keep each piece from its first statement-head
/// keyword, dropping procedural scaffolding like `BEGIN` or `IF … THEN`.
fn split_candidates(body: &str) -> Vec<String> {
    body.split(';')
        .filter_map(|segment| {
            let start = first_statement_start(segment)?;
            let stmt = segment[start..].trim();
            (!stmt.is_empty()).then(|| stmt.to_string())
        })
        .collect()
}

/// Byte offset of the first word in `segment` that can begin a statement.
fn first_statement_start(segment: &str) -> Option<usize> {
    let bytes = segment.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_alphabetic() {
            let mut j = i + 1;
            while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_') {
                j += 1;
            }
            if StatementKeyword::from_lower(&segment[i..j].to_ascii_lowercase()).is_some() {
                return Some(i);
            }
            i = j;
        } else {
            i += 1;
        }
    }
    None
}

fn leading_keyword(statement: &str) -> Option<StatementKeyword> {
    let trimmed = statement.trim_start();
    let end = trimmed
        .bytes()
        .position(|b| !b.is_ascii_alphabetic())
        .unwrap_or(trimmed.len());
    StatementKeyword::from_lower(&trimmed[..end].to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::node::NodeBuilder;

    fn do_block(body: &str) -> Node {
        let string_node = NodeBuilder::new("String").scalar("sval", body).build();
        let def_elem = NodeBuilder::new("DefElem")
            .scalar("defname", "as")
            .child("arg", string_node)
            .scalar("defaction", 0i64)
            .build();
        NodeBuilder::new("DoStmt")
            .children("args", vec![def_elem])
            .build()
    }

    #[test]
    fn reads_the_body_out_of_a_block() {
        let node = do_block("BEGIN INSERT INTO t VALUES (7); END");
        assert_eq!(
            block_body(&node),
            Some("BEGIN INSERT INTO t VALUES (7); END".to_string())
        );
    }

    #[test]
    fn blocks_without_a_body_are_skipped() {
        let bare = NodeBuilder::new("DoStmt").children("args", vec![]).build();
        assert_eq!(block_body(&bare), None);

        let wrong_name = NodeBuilder::new("DoStmt")
            .children(
                "args",
                vec![
                    NodeBuilder::new("DefElem")
                        .scalar("defname", "language")
                        .build(),
                ],
            )
            .build();
        assert_eq!(block_body(&wrong_name), None);
    }

    #[test]
    fn splitter_skips_procedural_scaffolding() {
        let found = split_candidates("BEGIN INSERT INTO t VALUES (7); END");
        assert_eq!(found, vec!["INSERT INTO t VALUES (7)".to_string()]);
    }

    #[test]
    fn splitter_takes_one_candidate_per_segment() {
        let found = split_candidates(
            "DECLARE x int;\nBEGIN\n  SELECT 1 INTO x;\n  UPDATE t SET a = x;\nEND",
        );
        assert_eq!(
            found,
            vec!["SELECT 1 INTO x".to_string(), "UPDATE t SET a = x".to_string()]
        );
    }

    #[test]
    fn splitter_yields_nothing_without_statement_keywords() {
        assert!(split_candidates("BEGIN NULL; END").is_empty());
        assert!(split_candidates("").is_empty());
    }

    #[test]
    fn keyword_probe_ignores_identifier_prefixes() {
        // "reselect" must not count as SELECT.
        assert!(split_candidates("BEGIN reselect; END").is_empty());
        assert_eq!(
            split_candidates("BEGIN reselect into x; SELECT 2; END"),
            vec!["SELECT 2".to_string()]
        );
    }
}
