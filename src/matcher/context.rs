//! Capture bookkeeping for a single match or search invocation.
//!
//! Bindings are recorded in an append-only log so a failing branch can be
//! undone by truncating to a mark; nothing from an unsuccessful branch ever
//! leaks into the surviving result. The log is folded into an ordered
//! per-key view (`Captures`) once matching is done.

use crate::ast::node::{Node, Scalar, structural_eq};
use crate::pattern::expr::CaptureKey;

#[derive(Debug, Clone)]
pub enum Binding {
    Node(Node),
    Value(Scalar),
}

/// Per-invocation capture state. Created at the entry point, never shared
/// across invocations.
#[derive(Debug, Default)]
pub struct CaptureContext {
    log: Vec<(CaptureKey, Binding)>,
}

impl CaptureContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn mark(&self) -> usize {
        self.log.len()
    }

    pub(crate) fn rollback(&mut self, mark: usize) {
        self.log.truncate(mark);
    }

    /// Bind a node under `key`, unless a structurally equal node is already
    /// bound there.
    pub(crate) fn record_node(&mut self, key: &CaptureKey, node: &Node) {
        let duplicate = self.log.iter().any(|(k, b)| {
            k == key && matches!(b, Binding::Node(existing) if structural_eq(existing, node))
        });
        if !duplicate {
            self.log.push((key.clone(), Binding::Node(node.clone())));
        }
    }

    /// Bind a scalar value under `key`, with the same deduplication.
    pub(crate) fn record_value(&mut self, key: &CaptureKey, value: &Scalar) {
        let duplicate = self
            .log
            .iter()
            .any(|(k, b)| k == key && matches!(b, Binding::Value(existing) if existing == value));
        if !duplicate {
            self.log.push((key.clone(), Binding::Value(value.clone())));
        }
    }

    pub(crate) fn nodes_at_index(&self, index: usize) -> impl Iterator<Item = &Node> {
        self.log.iter().filter_map(move |(k, b)| match (k, b) {
            (CaptureKey::Index(i), Binding::Node(n)) if *i == index => Some(n),
            _ => None,
        })
    }

    pub(crate) fn values_at_index(&self, index: usize) -> impl Iterator<Item = &Scalar> {
        self.log.iter().filter_map(move |(k, b)| match (k, b) {
            (CaptureKey::Index(i), Binding::Value(v)) if *i == index => Some(v),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }
}

/// What a capture slot accumulated: matched nodes, and scalar values bound
/// through attribute positions.
#[derive(Debug, Default)]
pub struct CaptureSlot {
    pub nodes: Vec<Node>,
    pub values: Vec<Scalar>,
}

/// Ordered per-key view of everything captured, keyed by name or by
/// positional index, in order of first appearance.
#[derive(Debug, Default)]
pub struct Captures {
    entries: Vec<(CaptureKey, CaptureSlot)>,
}

impl Captures {
    pub fn get(&self, name: &str) -> Option<&CaptureSlot> {
        self.entries.iter().find_map(|(k, slot)| match k {
            CaptureKey::Named(n) if n == name => Some(slot),
            _ => None,
        })
    }

    pub fn get_index(&self, index: usize) -> Option<&CaptureSlot> {
        self.entries.iter().find_map(|(k, slot)| match k {
            CaptureKey::Index(i) if *i == index => Some(slot),
            _ => None,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CaptureKey, &CaptureSlot)> {
        self.entries.iter().map(|(k, s)| (k, s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fold one invocation's log into this view, deduplicating per key.
    pub(crate) fn absorb(&mut self, ctx: CaptureContext) {
        for (key, binding) in ctx.log {
            let index = match self.entries.iter().position(|(k, _)| *k == key) {
                Some(index) => index,
                None => {
                    self.entries.push((key, CaptureSlot::default()));
                    self.entries.len() - 1
                }
            };
            let slot = &mut self.entries[index].1;
            match binding {
                Binding::Node(node) => {
                    if !slot.nodes.iter().any(|n| structural_eq(n, &node)) {
                        slot.nodes.push(node);
                    }
                }
                Binding::Value(value) => {
                    if !slot.values.contains(&value) {
                        slot.values.push(value);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::node::NodeBuilder;

    fn key(name: &str) -> CaptureKey {
        CaptureKey::Named(name.into())
    }

    #[test]
    fn rollback_discards_branch_bindings() {
        let mut ctx = CaptureContext::new();
        let n = NodeBuilder::new("RangeVar").scalar("relname", "a").build();
        let mark = ctx.mark();
        ctx.record_node(&key("x"), &n);
        assert!(!ctx.is_empty());
        ctx.rollback(mark);
        assert!(ctx.is_empty());
    }

    #[test]
    fn structurally_equal_nodes_bind_once() {
        let mut ctx = CaptureContext::new();
        let a = NodeBuilder::new("RangeVar")
            .scalar("relname", "t")
            .scalar("location", 3i64)
            .build();
        let b = NodeBuilder::new("RangeVar")
            .scalar("relname", "t")
            .scalar("location", 30i64)
            .build();
        ctx.record_node(&key("x"), &a);
        ctx.record_node(&key("x"), &b);
        let mut captures = Captures::default();
        captures.absorb(ctx);
        assert_eq!(captures.get("x").map(|s| s.nodes.len()), Some(1));
    }

    #[test]
    fn positional_and_named_slots_are_distinct() {
        let mut ctx = CaptureContext::new();
        let n = NodeBuilder::new("RangeVar").build();
        ctx.record_node(&CaptureKey::Index(1), &n);
        ctx.record_value(&key("v"), &Scalar::Str("users".into()));
        assert_eq!(ctx.nodes_at_index(1).count(), 1);
        assert_eq!(ctx.nodes_at_index(2).count(), 0);

        let mut captures = Captures::default();
        captures.absorb(ctx);
        assert!(captures.get_index(1).is_some());
        assert_eq!(
            captures.get("v").map(|s| s.values.as_slice()),
            Some(&[Scalar::Str("users".into())][..])
        );
    }
}
