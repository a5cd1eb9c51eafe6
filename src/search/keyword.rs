//! Statement-head keywords recognised by the embedded-body splitter.
//!
//! Only the words that can begin a searchable SQL statement are modeled;
//! procedural keywords (`BEGIN`, `DECLARE`, `IF`, …) are deliberately
//! absent so the splitter skips over block scaffolding to the statement
//! proper.
//!
//! Design notes:
//! - Keywords are matched case-insensitively via `from_lower` using a
//!   pre-lower-cased string slice.
//! - `as_str` provides a canonical lowercase representation.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKeyword {
    Select,
    Insert,
    Update,
    Delete,
    Create,
    Drop,
    Alter,
    With,
    Truncate,
    Grant,
    Revoke,
}

impl StatementKeyword {
    /// Attempt to classify a *lower-cased* word slice. Returns `None` if the
    /// word cannot begin a statement.
    ///
    /// NOTE: The caller is responsible for lower-casing the input, which
    /// avoids allocating per probed word in the splitter's scan loop.
    pub fn from_lower(word: &str) -> Option<Self> {
        use StatementKeyword::*;
        let kw = match word {
            "select" => Select,
            "insert" => Insert,
            "update" => Update,
            "delete" => Delete,
            "create" => Create,
            "drop" => Drop,
            "alter" => Alter,
            "with" => With,
            "truncate" => Truncate,
            "grant" => Grant,
            "revoke" => Revoke,
            _ => return None,
        };
        Some(kw)
    }

    /// Canonical lowercase string form of the keyword.
    pub const fn as_str(self) -> &'static str {
        use StatementKeyword::*;
        match self {
            Select => "select",
            Insert => "insert",
            Update => "update",
            Delete => "delete",
            Create => "create",
            Drop => "drop",
            Alter => "alter",
            With => "with",
            Truncate => "truncate",
            Grant => "grant",
            Revoke => "revoke",
        }
    }
}

impl std::fmt::Display for StatementKeyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_statement_heads() {
        for w in [
            "select", "insert", "update", "delete", "create", "drop", "alter", "with",
            "truncate", "grant", "revoke",
        ] {
            assert!(
                StatementKeyword::from_lower(w).is_some(),
                "{w} should be recognized"
            );
        }
    }

    #[test]
    fn rejects_procedural_words() {
        for w in ["begin", "end", "declare", "if", "loop", "raise", "return"] {
            assert!(
                StatementKeyword::from_lower(w).is_none(),
                "{w} should NOT be recognized"
            );
        }
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(StatementKeyword::Select.to_string(), "select");
        assert_eq!(StatementKeyword::Truncate.to_string(), "truncate");
    }
}
