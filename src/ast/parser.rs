//! Adapter over the PostgreSQL parser.
//!
//! `pg_query` hands back the server's own parse tree as protobuf messages.
//! The messages are serialised once into a generic JSON document and folded
//! into the crate's dynamic [`Node`](crate::ast::node::Node) tree, which is
//! the only shape the rest of the engine sees. Node links in the schema go
//! through a wrapper message whose single variant tag names the node type;
//! the conversion peels that wrapper and keeps the tag as the type name.

use crate::ast::node::{FieldValue, Node, NodeBuilder, Scalar};
use crate::ast::schema;
use crate::*;
use serde_json::Value;

/// Parse SQL into statement root nodes.
///
/// This is the one entry point that surfaces parser failures; `search`
/// callers get the absorbing behaviour instead (a failed parse is an empty
/// result, not an error).
pub fn parse_sql(sql: &str) -> Result<Vec<Node>> {
    let parsed = pg_query::parse(sql)?;
    let tree = serde_json::to_value(&parsed.protobuf)
        .map_err(|e| Error::Internal(format!("statement tree serialisation: {e}")))?;
    Ok(statements_from_tree(&tree))
}

fn statements_from_tree(tree: &Value) -> Vec<Node> {
    let Some(stmts) = tree.get("stmts").and_then(Value::as_array) else {
        return Vec::new();
    };
    stmts
        .iter()
        .filter_map(|raw| raw.get("stmt"))
        .filter_map(|stmt| node_from_value(stmt, None))
        .collect()
}

/// Fold a JSON value into a node. `hint` supplies the type name for fields
/// the schema links directly, where no wrapper tag is present.
pub(crate) fn node_from_value(value: &Value, hint: Option<&str>) -> Option<Node> {
    let obj = value.as_object()?;

    // Wrapper message: a lone "node" field holding the tagged payload.
    if obj.len() == 1 {
        if let Some(inner) = obj.get("node") {
            return node_from_value(inner, hint);
        }
        // Tagged payload: the variant name is the node type.
        let (tag, payload) = obj.iter().next()?;
        if tag.starts_with(|c: char| c.is_ascii_uppercase()) {
            if let Some(fields) = payload.as_object() {
                return Some(build_node(tag, fields));
            }
        }
    }

    Some(build_node(hint.unwrap_or_default(), obj))
}

fn build_node(type_name: &str, obj: &serde_json::Map<String, Value>) -> Node {
    let mut builder = NodeBuilder::new(type_name);
    for (name, value) in obj {
        let child_hint = schema::direct_message_type(type_name, name);
        builder = builder.field(name.clone(), field_from_value(value, child_hint));
    }
    builder.build()
}

fn field_from_value(value: &Value, hint: Option<&str>) -> FieldValue {
    match value {
        Value::Null => FieldValue::Scalar(Scalar::Null),
        Value::Bool(b) => FieldValue::Scalar(Scalar::Bool(*b)),
        Value::Number(n) => FieldValue::Scalar(number_scalar(n)),
        Value::String(s) => FieldValue::Scalar(Scalar::Str(s.clone())),
        Value::Array(items) => {
            if items.iter().all(|v| !v.is_object()) && !items.is_empty() {
                FieldValue::Scalars(items.iter().map(scalar_from_value).collect())
            } else {
                FieldValue::Messages(
                    items
                        .iter()
                        .filter_map(|item| node_from_value(item, hint))
                        .collect(),
                )
            }
        }
        Value::Object(_) => match node_from_value(value, hint) {
            Some(node) => FieldValue::Message(node),
            // An empty or null-wrapped link is an absent message.
            None => FieldValue::Scalar(Scalar::Null),
        },
    }
}

fn scalar_from_value(value: &Value) -> Scalar {
    match value {
        Value::Null => Scalar::Null,
        Value::Bool(b) => Scalar::Bool(*b),
        Value::Number(n) => number_scalar(n),
        Value::String(s) => Scalar::Str(s.clone()),
        _ => Scalar::Null,
    }
}

fn number_scalar(n: &serde_json::Number) -> Scalar {
    match n.as_i64() {
        Some(i) => Scalar::Int(i),
        None => Scalar::Float(n.as_f64().unwrap_or_default()),
    }
}
