//! Compiled form of a pattern.
//!
//! The compiler returns a value of this closed set of variants; evaluation
//! is a single recursive function over it (see `matcher`). The tree is
//! immutable once built and freely shareable across threads.

/// A literal to compare scalars against. Numbers compare by value, not by
/// source spelling.
#[derive(Debug, Clone, PartialEq)]
pub enum Lit {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

/// Slot a capture binds into: a name from `$name`, or an appearance-ordered
/// index for anonymous `$` captures (what backreferences count).
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum CaptureKey {
    #[display("{_0}")]
    Named(String),
    #[display("{_0}")]
    Index(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Scalar comparison; on a message node, true if any scalar field matches.
    Literal(Lit),
    /// Any present node or non-null scalar.
    Wildcard,
    /// Only a null or absent value.
    Nil,
    /// A node with at least one child.
    AnyChildren,
    /// Node kind by name, compared under canonicalisation.
    NodeType(String),
    /// Field dispatch: look the field up on the node, then apply the inner
    /// pattern according to the field's cardinality.
    Attribute(String, Box<Expr>),
    Not(Box<Expr>),
    /// True on a null value, otherwise same as the inner pattern.
    Maybe(Box<Expr>),
    /// Disjunction, first match wins.
    Any(Vec<Expr>),
    /// Conjunction: every sub-pattern against the same node.
    All(Vec<Expr>),
    /// Parenthesised form: head against the node itself, the rest against
    /// its children in order, with `Ellipsis` gaps in between.
    Seq(Vec<Expr>),
    /// Gap marker inside a `Seq` body: skip children, and let the following
    /// pattern match a later child or any of its descendants.
    Ellipsis,
    Capture(CaptureKey, Box<Expr>),
    /// Matches a value structurally equal to an earlier anonymous capture.
    Backref(usize),
    /// Any direct child satisfies the inner pattern.
    HasChild(Box<Expr>),
}

impl Expr {
    /// Convenience constructors for the boxed variants.
    pub fn not(inner: Expr) -> Expr {
        Expr::Not(Box::new(inner))
    }

    pub fn maybe(inner: Expr) -> Expr {
        Expr::Maybe(Box::new(inner))
    }

    pub fn has_child(inner: Expr) -> Expr {
        Expr::HasChild(Box::new(inner))
    }

    pub fn attribute(name: impl Into<String>, inner: Expr) -> Expr {
        Expr::Attribute(name.into(), Box::new(inner))
    }

    pub fn capture(key: CaptureKey, inner: Expr) -> Expr {
        Expr::Capture(key, Box::new(inner))
    }
}
