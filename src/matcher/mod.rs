//! Pattern evaluation against nodes.
//!
//! A single recursive function over the expression variants, with a scalar
//! twin for attribute dispatch onto leaf values. Two disciplines hold
//! everywhere:
//!
//! - a branch that fails leaves no trace: every entry point marks the
//!   capture log and rolls back on a `false` result;
//! - a failed branch is never an error. Unknown fields and type names make
//!   the pattern not match, they do not fail the search.

pub mod context;

pub use context::{Captures, CaptureSlot};

use crate::ast::node::{self, FieldValue, Node, Scalar, structural_eq};
use crate::ast::schema;
use crate::pattern::expr::{Expr, Lit};
use context::CaptureContext;

/// Evaluate `expr` against `node`. Captures recorded in `ctx` survive only
/// when the overall result is true.
pub fn match_node(expr: &Expr, node: &Node, ctx: &mut CaptureContext) -> bool {
    let mark = ctx.mark();
    let matched = eval_node(expr, node, ctx);
    if !matched {
        ctx.rollback(mark);
    }
    matched
}

fn eval_node(expr: &Expr, node: &Node, ctx: &mut CaptureContext) -> bool {
    match expr {
        // A concrete node is never null.
        Expr::Wildcard => true,
        Expr::Nil => false,
        Expr::AnyChildren | Expr::Ellipsis => node.has_children(),
        Expr::NodeType(name) => schema::names_match(name, node.type_name()),
        Expr::Literal(lit) => any_scalar_field(node, lit),
        Expr::Attribute(name, inner) => match node.get_field(name) {
            None => false,
            Some(FieldValue::Scalar(value)) => match_scalar(inner, value, ctx),
            Some(FieldValue::Message(child)) => match_node(inner, child, ctx),
            Some(FieldValue::Messages(children)) => {
                children.iter().any(|child| match_node(inner, child, ctx))
            }
            Some(FieldValue::Scalars(values)) => {
                values.iter().any(|value| match_scalar(inner, value, ctx))
            }
        },
        Expr::Not(inner) => {
            let mark = ctx.mark();
            let matched = match_node(inner, node, ctx);
            // Captures inside a negation are discarded either way.
            ctx.rollback(mark);
            !matched
        }
        Expr::Maybe(inner) => match_node(inner, node, ctx),
        Expr::Any(options) => options.iter().any(|option| match_node(option, node, ctx)),
        Expr::All(parts) => parts.iter().all(|part| match_node(part, node, ctx)),
        Expr::Seq(items) => eval_seq(items, node, ctx),
        Expr::Capture(key, inner) => {
            if match_node(inner, node, ctx) {
                ctx.record_node(key, node);
                true
            } else {
                false
            }
        }
        Expr::Backref(index) => {
            let earlier: Vec<Node> = ctx.nodes_at_index(*index).cloned().collect();
            earlier.iter().any(|captured| structural_eq(captured, node))
        }
        Expr::HasChild(inner) => node
            .children()
            .iter()
            .any(|child| match_node(inner, child, ctx)),
    }
}

/// Parenthesised form: head against the node, body against its children.
fn eval_seq(items: &[Expr], node: &Node, ctx: &mut CaptureContext) -> bool {
    let Some((head, body)) = items.split_first() else {
        return true;
    };
    if !match_node(head, node, ctx) {
        return false;
    }
    let children = node.children();
    match_children(body, &children, ctx)
}

/// Positional matching of a pattern list against a child list.
///
/// Adjacent patterns consume adjacent children. A gap (`...`) consumes any
/// number of children, and the pattern after it may land on a later child
/// or anywhere inside one; consumption is greedy, so the latest viable
/// child is tried first. Trailing children beyond the pattern list are
/// allowed.
fn match_children(patterns: &[Expr], children: &[Node], ctx: &mut CaptureContext) -> bool {
    let Some((first, rest)) = patterns.split_first() else {
        return true;
    };

    if matches!(first, Expr::Ellipsis) {
        let Some((next, after)) = rest.split_first() else {
            return true;
        };
        for j in (0..children.len()).rev() {
            let mark = ctx.mark();
            let landed = match_node(next, &children[j], ctx)
                || match_in_subtree(next, &children[j], ctx);
            if landed && match_children(after, &children[j + 1..], ctx) {
                return true;
            }
            ctx.rollback(mark);
        }
        return false;
    }

    match children.split_first() {
        None => false,
        Some((child, remaining)) => {
            let mark = ctx.mark();
            if match_node(first, child, ctx) && match_children(rest, remaining, ctx) {
                true
            } else {
                ctx.rollback(mark);
                false
            }
        }
    }
}

/// Does any strict descendant of `node` satisfy `expr`?
fn match_in_subtree(expr: &Expr, node: &Node, ctx: &mut CaptureContext) -> bool {
    node::walk(node)
        .skip(1)
        .any(|descendant| match_node(expr, &descendant, ctx))
}

/// Evaluate `expr` as a predicate over a leaf value.
pub(crate) fn match_scalar(expr: &Expr, value: &Scalar, ctx: &mut CaptureContext) -> bool {
    let mark = ctx.mark();
    let matched = eval_scalar(expr, value, ctx);
    if !matched {
        ctx.rollback(mark);
    }
    matched
}

fn eval_scalar(expr: &Expr, value: &Scalar, ctx: &mut CaptureContext) -> bool {
    match expr {
        Expr::Literal(lit) => lit_matches(lit, value),
        Expr::Wildcard => !value.is_null(),
        Expr::Nil => value.is_null(),
        Expr::Not(inner) => {
            let mark = ctx.mark();
            let matched = match_scalar(inner, value, ctx);
            ctx.rollback(mark);
            !matched
        }
        Expr::Maybe(inner) => value.is_null() || match_scalar(inner, value, ctx),
        Expr::Any(options) => options
            .iter()
            .any(|option| match_scalar(option, value, ctx)),
        Expr::All(parts) => parts.iter().all(|part| match_scalar(part, value, ctx)),
        Expr::Capture(key, inner) => {
            if match_scalar(inner, value, ctx) {
                ctx.record_value(key, value);
                true
            } else {
                false
            }
        }
        Expr::Backref(index) => {
            let earlier: Vec<Scalar> = ctx.values_at_index(*index).cloned().collect();
            earlier.iter().any(|captured| captured == value)
        }
        // Structural patterns cannot hold of a leaf value.
        Expr::NodeType(_)
        | Expr::Attribute(..)
        | Expr::Seq(_)
        | Expr::HasChild(_)
        | Expr::AnyChildren
        | Expr::Ellipsis => false,
    }
}

/// Scalar-against-literal comparison. Numbers compare by value whatever
/// their representation; booleans tolerate text spellings either way the
/// parser capitalises them.
fn lit_matches(lit: &Lit, value: &Scalar) -> bool {
    match (lit, value) {
        (Lit::Str(s), Scalar::Str(v)) => s == v,
        (Lit::Bool(b), Scalar::Bool(v)) => b == v,
        (Lit::Bool(b), Scalar::Str(v)) => {
            v.eq_ignore_ascii_case(if *b { "true" } else { "false" })
        }
        (Lit::Int(i), Scalar::Int(v)) => i == v,
        (Lit::Int(i), _) => value.as_number() == Some(*i as f64),
        (Lit::Float(f), _) => value.as_number() == Some(*f),
        _ => false,
    }
}

/// Convenience semantics for a bare literal applied to a message: true if
/// any scalar field of the node carries the value.
fn any_scalar_field(node: &Node, lit: &Lit) -> bool {
    node.fields().any(|(_, field)| match field {
        FieldValue::Scalar(value) => lit_matches(lit, value),
        FieldValue::Scalars(values) => values.iter().any(|value| lit_matches(lit, value)),
        _ => false,
    })
}
