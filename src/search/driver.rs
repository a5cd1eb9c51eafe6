//! The search driver: walk every node, apply the compiled pattern, collect
//! hits in traversal order.

use crate::ast::node::{self, Node};
use crate::ast::schema;
use crate::matcher::context::CaptureContext;
use crate::matcher::{self, Captures};
use crate::pattern::{Expr, ExprCache};
use crate::search::embedded;
use crate::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Where a hit came from, and which text its locations index.
#[derive(Debug, Clone)]
pub enum Origin {
    /// A top-level statement; locations index the searched SQL.
    Statement,
    /// A statement found inside a procedural block; locations index the
    /// carried statement text, not the outer SQL.
    Embedded { body: Arc<str> },
}

/// One matching node together with its origin.
#[derive(Debug, Clone)]
pub struct Hit {
    pub node: Node,
    pub origin: Origin,
}

impl Hit {
    pub fn is_embedded(&self) -> bool {
        matches!(self.origin, Origin::Embedded { .. })
    }

    /// The embedded statement text this hit's locations refer to.
    pub fn body(&self) -> Option<&str> {
        match &self.origin {
            Origin::Embedded { body } => Some(body),
            Origin::Statement => None,
        }
    }
}

/// Cooperative cancellation flag, checked by the driver between node
/// visits. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A configured search entry point. The zero-config free functions at the
/// crate root delegate to a process-wide instance of this; build one
/// explicitly to control caching, cancellation, or the embedded bridge.
#[derive(Clone)]
pub struct Searcher {
    cache: ExprCache,
    embedded_sql: bool,
    cancel: Option<CancelToken>,
}

impl Default for Searcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Searcher {
    pub fn new() -> Self {
        Self {
            cache: ExprCache::default(),
            embedded_sql: config().embedded_sql,
            cancel: None,
        }
    }

    /// Toggle descending into procedural-block bodies.
    pub fn embedded_sql(mut self, enabled: bool) -> Self {
        self.embedded_sql = enabled;
        self
    }

    /// Install a cancellation flag polled before each node visit.
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn cache(&self) -> &ExprCache {
        &self.cache
    }

    /// All nodes matching `pattern` in `sql`, in pre-order. A SQL string the
    /// parser rejects yields an empty list; only pattern errors surface.
    pub fn search(&self, pattern: &str, sql: &str) -> Result<Vec<Hit>> {
        self.search_with_captures(pattern, sql).map(|(hits, _)| hits)
    }

    /// Like [`search`](Self::search), also returning everything the
    /// pattern's captures bound, keyed by name or position.
    pub fn search_with_captures(&self, pattern: &str, sql: &str) -> Result<(Vec<Hit>, Captures)> {
        let expr = self.cache.get_or_compile(pattern)?;
        let statements = match ast::parse_sql(sql) {
            Ok(statements) => statements,
            Err(error) => {
                debug!(%error, "query did not parse, returning no matches");
                return Ok((Vec::new(), Captures::default()));
            }
        };
        Ok(self.run(&expr, &statements))
    }

    /// Search statements the caller already parsed, reusing one parse
    /// across many patterns.
    pub fn search_parsed(&self, pattern: &str, statements: &[Node]) -> Result<Vec<Hit>> {
        let expr = self.cache.get_or_compile(pattern)?;
        Ok(self.run(&expr, statements).0)
    }

    /// Evaluate `pattern` against a single node.
    pub fn matches(&self, pattern: &str, node: &Node) -> Result<bool> {
        let expr = self.cache.get_or_compile(pattern)?;
        Ok(matcher::match_node(
            &expr,
            node,
            &mut CaptureContext::new(),
        ))
    }

    fn run(&self, expr: &Expr, statements: &[Node]) -> (Vec<Hit>, Captures) {
        let mut collector = Collector {
            hits: Vec::new(),
            captures: Captures::default(),
            seen: HashSet::new(),
        };
        for root in statements {
            if !self.visit_statement(expr, root, &Origin::Statement, &mut collector) {
                break;
            }
        }
        (collector.hits, collector.captures)
    }

    /// Walk one statement; embedded blocks found along the way are searched
    /// after the statement's own nodes, so their hits sort behind the
    /// block's direct results. Returns false once cancelled.
    fn visit_statement(
        &self,
        expr: &Expr,
        root: &Node,
        origin: &Origin,
        collector: &mut Collector,
    ) -> bool {
        let mut block_bodies = Vec::new();
        for current in node::walk(root) {
            if self.cancelled() {
                debug!("search cancelled, returning collected prefix");
                return false;
            }
            let mut ctx = CaptureContext::new();
            if matcher::match_node(expr, &current, &mut ctx) {
                collector.record(&current, origin, ctx);
            }
            if self.bridges(origin) && is_block(&current) {
                if let Some(body) = embedded::block_body(&current) {
                    debug!(bytes = body.len(), "found procedural block body");
                    block_bodies.push(body);
                }
            }
        }
        for body in block_bodies {
            if !self.visit_block(expr, &body, collector) {
                return false;
            }
        }
        true
    }

    fn visit_block(&self, expr: &Expr, body: &str, collector: &mut Collector) -> bool {
        for candidate in embedded::candidates(body) {
            let statements = match ast::parse_sql(&candidate) {
                Ok(statements) => statements,
                Err(error) => {
                    debug!(%error, %candidate, "embedded candidate did not parse");
                    continue;
                }
            };
            let origin = Origin::Embedded {
                body: Arc::from(candidate.as_str()),
            };
            for root in &statements {
                if !self.visit_statement(expr, root, &origin, collector) {
                    return false;
                }
            }
        }
        true
    }

    fn cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// The bridge runs only from the outer tree; a block inside an embedded
    /// statement is left alone.
    fn bridges(&self, origin: &Origin) -> bool {
        self.embedded_sql && matches!(origin, Origin::Statement)
    }
}

fn is_block(node: &Node) -> bool {
    schema::names_match(node.type_name(), &config().procedural_block_type)
}

struct Collector {
    hits: Vec<Hit>,
    captures: Captures,
    seen: HashSet<*const ()>,
}

impl Collector {
    fn record(&mut self, node: &Node, origin: &Origin, ctx: CaptureContext) {
        if self.seen.insert(Arc::as_ptr(node).cast()) {
            self.hits.push(Hit {
                node: node.clone(),
                origin: origin.clone(),
            });
        }
        self.captures.absorb(ctx);
    }
}
