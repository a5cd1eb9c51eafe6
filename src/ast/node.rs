//! Dynamic node model for parsed statements.
//!
//! The external parser describes statements as protobuf messages. Rather than
//! matching over hundreds of generated types, the whole tree is converted once
//! into this uniform shape: a node is a type name plus ordered named fields,
//! each field a scalar, a nested node, or a repeated list of either. Field
//! order follows the parser's declared order, which keeps traversal and
//! positional matching deterministic.
//!
//! Nodes are shared through `Arc`, so search results are cheap clones and two
//! results can be compared for identity with `Arc::ptr_eq`.

use crate::ast::schema;
use std::fmt;
use std::sync::Arc;

pub type Node = Arc<NodeData>;

/// Leaf value carried by a field.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Numeric view of the value, if it has one. String scalars holding a
    /// numeric literal count: the parser stores float constants as text.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            Scalar::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(v) => write!(f, "{v}"),
            Scalar::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Str(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Str(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

/// Value of a named field: one of the four cardinalities the parser's schema
/// can produce.
#[derive(Debug, Clone)]
pub enum FieldValue {
    Scalar(Scalar),
    Message(Node),
    Messages(Vec<Node>),
    Scalars(Vec<Scalar>),
}

#[derive(Debug)]
pub struct NodeData {
    type_name: String,
    fields: Vec<(String, FieldValue)>,
}

impl NodeData {
    /// The node kind as the parser spells it (e.g. `SelectStmt`).
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Ordered named fields.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Field lookup under name normalisation, so `targetList`, `target_list`
    /// and `TARGET_LIST` all reach the same field.
    pub fn get_field(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| schema::names_match(n, name))
            .map(|(_, v)| v)
    }

    /// String content of a scalar field, if present.
    pub fn scalar_str(&self, name: &str) -> Option<&str> {
        match self.get_field(name)? {
            FieldValue::Scalar(s) => s.as_str(),
            _ => None,
        }
    }

    /// Directly contained nodes, in field order. Repeated message fields are
    /// flattened in place; scalar fields contribute nothing.
    pub fn children(&self) -> Vec<Node> {
        let mut out = Vec::new();
        for (_, value) in &self.fields {
            match value {
                FieldValue::Message(n) => out.push(n.clone()),
                FieldValue::Messages(ns) => out.extend(ns.iter().cloned()),
                FieldValue::Scalar(_) | FieldValue::Scalars(_) => {}
            }
        }
        out
    }

    pub fn has_children(&self) -> bool {
        self.fields.iter().any(|(_, value)| match value {
            FieldValue::Message(_) => true,
            FieldValue::Messages(ns) => !ns.is_empty(),
            _ => false,
        })
    }

    /// Start byte offset into the original SQL, when the parser recorded one.
    pub fn location(&self) -> Option<usize> {
        match self.get_field("location")? {
            FieldValue::Scalar(Scalar::Int(i)) if *i >= 0 => Some(*i as usize),
            _ => None,
        }
    }
}

/// Pre-order traversal of a subtree, root included.
pub fn walk(node: &Node) -> Walk {
    Walk {
        stack: vec![node.clone()],
    }
}

pub struct Walk {
    stack: Vec<Node>,
}

impl Iterator for Walk {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        let node = self.stack.pop()?;
        let children = node.children();
        self.stack.extend(children.into_iter().rev());
        Some(node)
    }
}

/// Structural equality over type and fields, recursively. Position fields
/// (`location`, `stmt_location`) are skipped so two occurrences of the same
/// construct at different places in the query compare equal.
pub fn structural_eq(a: &NodeData, b: &NodeData) -> bool {
    if a.type_name != b.type_name {
        return false;
    }
    let significant = |fields: &[(String, FieldValue)]| -> Vec<(String, FieldValue)> {
        fields
            .iter()
            .filter(|(n, _)| !schema::is_position_field(n))
            .cloned()
            .collect()
    };
    let fa = significant(&a.fields);
    let fb = significant(&b.fields);
    fa.len() == fb.len()
        && fa
            .iter()
            .zip(fb.iter())
            .all(|((na, va), (nb, vb))| schema::names_match(na, nb) && field_eq(va, vb))
}

fn field_eq(a: &FieldValue, b: &FieldValue) -> bool {
    match (a, b) {
        (FieldValue::Scalar(x), FieldValue::Scalar(y)) => x == y,
        (FieldValue::Message(x), FieldValue::Message(y)) => structural_eq(x, y),
        (FieldValue::Messages(xs), FieldValue::Messages(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| structural_eq(x, y))
        }
        (FieldValue::Scalars(xs), FieldValue::Scalars(ys)) => xs == ys,
        _ => false,
    }
}

/// Incremental construction of a `Node`, used by the parser adapter and by
/// callers assembling synthetic trees.
#[derive(Debug, Default)]
pub struct NodeBuilder {
    type_name: String,
    fields: Vec<(String, FieldValue)>,
}

impl NodeBuilder {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.push((name.into(), value));
        self
    }

    pub fn scalar(self, name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.field(name, FieldValue::Scalar(value.into()))
    }

    pub fn child(self, name: impl Into<String>, node: Node) -> Self {
        self.field(name, FieldValue::Message(node))
    }

    pub fn children(self, name: impl Into<String>, nodes: Vec<Node>) -> Self {
        self.field(name, FieldValue::Messages(nodes))
    }

    pub fn build(self) -> Node {
        Arc::new(NodeData {
            type_name: self.type_name,
            fields: self.fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range_var(relname: &str, location: i64) -> Node {
        NodeBuilder::new("RangeVar")
            .scalar("relname", relname)
            .scalar("inh", true)
            .scalar("location", location)
            .build()
    }

    #[test]
    fn field_lookup_is_case_insensitive() {
        let n = NodeBuilder::new("SelectStmt")
            .children("target_list", vec![])
            .build();
        assert!(n.get_field("target_list").is_some());
        assert!(n.get_field("targetList").is_some());
        assert!(n.get_field("TARGET_LIST").is_some());
        assert!(n.get_field("fromClause").is_none());
    }

    #[test]
    fn children_follow_field_order() {
        let a = range_var("a", 0);
        let b = range_var("b", 10);
        let n = NodeBuilder::new("SelectStmt")
            .children("from_clause", vec![a.clone(), b.clone()])
            .scalar("op", 0i64)
            .build();
        let kids = n.children();
        assert_eq!(kids.len(), 2);
        assert!(Arc::ptr_eq(&kids[0], &a));
        assert!(Arc::ptr_eq(&kids[1], &b));
        assert!(n.has_children());
    }

    #[test]
    fn scalar_fields_are_not_children() {
        let n = range_var("users", 14);
        assert!(!n.has_children());
        assert!(n.children().is_empty());
        assert_eq!(n.location(), Some(14));
        assert_eq!(n.scalar_str("relname"), Some("users"));
    }

    #[test]
    fn negative_location_means_unknown() {
        let n = range_var("users", -1);
        assert_eq!(n.location(), None);
    }

    #[test]
    fn walk_is_preorder() {
        let leaf = range_var("t", 0);
        let mid = NodeBuilder::new("JoinExpr").child("larg", leaf).build();
        let root = NodeBuilder::new("SelectStmt")
            .children("from_clause", vec![mid])
            .build();
        let kinds: Vec<String> = walk(&root).map(|n| n.type_name().to_string()).collect();
        assert_eq!(kinds, ["SelectStmt", "JoinExpr", "RangeVar"]);
    }

    #[test]
    fn structural_equality_ignores_position() {
        let a = range_var("users", 14);
        let b = range_var("users", 40);
        let c = range_var("orders", 14);
        assert!(structural_eq(&a, &b));
        assert!(!structural_eq(&a, &c));
    }
}
