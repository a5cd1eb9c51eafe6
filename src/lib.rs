//! Structural search over PostgreSQL SQL.
//!
//! Queries are parsed with the real PostgreSQL grammar and searched with a
//! compact s-expression pattern language: node types, field dispatch,
//! wildcards, captures, and a subtree gap operator.
//!
//! ```rust
//! let sql = "SELECT * FROM users";
//! let hits = sqlgrep::search("(relname _)", sql).unwrap();
//! assert_eq!(hits.len(), 1);
//!
//! let decorated = sqlgrep::highlight(sql, &hits, sqlgrep::Style::Markdown);
//! assert_eq!(decorated, "SELECT * FROM **users**");
//! ```
//!
//! The free functions cover the common path with a process-wide pattern
//! cache; [`Searcher`] is the configurable form (own cache, cancellation,
//! embedded-block bridging).

reexport!(testing, test);
reexport!(error);
reexport!(config);
#[allow(unused_imports)]
pub(crate) use tracing::{debug, error, info, span, trace, warn};

pub mod ast;
pub mod matcher;
pub mod pattern;
pub mod search;
pub mod source;

pub use ast::node::{FieldValue, Node, NodeBuilder, NodeData, Scalar};
pub use ast::parser::parse_sql;
pub use matcher::{CaptureSlot, Captures};
pub use pattern::{CaptureKey, Expr, ExprCache};
pub use search::{CancelToken, Hit, Origin, Searcher};
pub use source::{SourceBuffer, SourceRange, Style};

use std::sync::OnceLock;

fn default_searcher() -> &'static Searcher {
    static INSTANCE: OnceLock<Searcher> = OnceLock::new();
    INSTANCE.get_or_init(Searcher::new)
}

/// Compile a pattern without caching. The error carries the byte position
/// of the offending token.
pub fn compile(pattern: &str) -> Result<Expr> {
    pattern::compile(pattern)
}

/// All nodes in `sql` matching `pattern`, in pre-order; see
/// [`Searcher::search`].
pub fn search(pattern: &str, sql: &str) -> Result<Vec<Hit>> {
    default_searcher().search(pattern, sql)
}

/// Matches plus everything the pattern's captures bound; see
/// [`Searcher::search_with_captures`].
pub fn search_with_captures(pattern: &str, sql: &str) -> Result<(Vec<Hit>, Captures)> {
    default_searcher().search_with_captures(pattern, sql)
}

/// Evaluate `pattern` against one node.
pub fn matches(pattern: &str, node: &Node) -> Result<bool> {
    default_searcher().matches(pattern, node)
}

/// Byte range of `node` within `sql`: authoritative start from the parser,
/// best-effort end.
pub fn locate(sql: &str, node: &Node) -> Option<SourceRange> {
    source::locate::locate(sql, node)
}

/// Wrap the located ranges of `hits` in the style's delimiters. Hits from
/// embedded blocks are skipped; their offsets index the block body (see
/// [`Hit::body`]), not `sql`.
pub fn highlight(sql: &str, hits: &[Hit], style: Style) -> String {
    source::highlight::highlight(sql, &hit_ranges(sql, hits), style)
}

/// Context-mode variant of [`highlight`]: only affected lines, with the
/// configured number of context lines and `...` markers between gaps.
pub fn highlight_context(sql: &str, hits: &[Hit], style: Style) -> String {
    source::highlight::highlight_context(
        sql,
        &hit_ranges(sql, hits),
        style,
        config().context_lines,
    )
}

fn hit_ranges(sql: &str, hits: &[Hit]) -> Vec<SourceRange> {
    source::locate::locate_all(
        sql,
        hits.iter()
            .filter(|hit| !hit.is_embedded())
            .map(|hit| &hit.node),
    )
}

#[macro_export]
macro_rules! reexport {
    ($module:ident) => {
        $crate::reexport!($module, false);
    };
    ($module:ident, test) => {
        $crate::reexport!($module, true);
    };
    ($module:ident, $is_test:literal) => {
        #[cfg_attr($is_test, cfg(test))]
        mod $module;
        #[cfg_attr($is_test, cfg(test))]
        #[allow(unused_imports)]
        pub use $module::*;
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlight_wraps_matched_tables() {
        testing::common_init();
        let sql = "SELECT * FROM users";
        let hits = search("(relname _)", sql).expect("search runs");
        assert_eq!(
            highlight(sql, &hits, Style::Ansi),
            "SELECT * FROM \x1b[1;31musers\x1b[0m"
        );
    }

    #[test]
    fn locate_prefers_the_parser_start() {
        testing::common_init();
        let sql = "SELECT * FROM users";
        let hits = search("(relname \"users\")", sql).expect("search runs");
        let range = locate(sql, &hits[0].node).expect("a range");
        assert_eq!(&sql[range.start..range.end], "users");
    }

    #[test]
    fn embedded_hits_do_not_disturb_outer_highlighting() {
        testing::common_init();
        let sql = "DO $$ BEGIN INSERT INTO t VALUES (7); END $$;";
        let hits = search("A_Const", sql).expect("search runs");
        assert!(hits.iter().all(|h| h.is_embedded()));
        assert_eq!(highlight(sql, &hits, Style::Markdown), sql);
    }

    #[test]
    fn compile_surfaces_positions() {
        match compile("{SelectStmt") {
            Err(Error::Compile { position, .. }) => assert_eq!(position, 0),
            other => panic!("expected a compile error, got {other:?}"),
        }
    }
}
