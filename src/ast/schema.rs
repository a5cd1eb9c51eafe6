//! Name resolution against the parser's schema.
//!
//! Three concerns live here:
//! - canonicalising identifier spellings so `target_list`, `targetList`,
//!   `TargetList` and `TARGET_LIST` compare equal;
//! - the catalog of field names that may head an attribute form in a
//!   pattern, extendable at runtime through `SQLGREP_EXTRA_FIELDS` for
//!   schema versions this build does not know;
//! - recovering the message type of fields the parser links directly
//!   (most links go through the generic node wrapper, which carries its own
//!   type tag; a handful, like `InsertStmt.relation`, do not).

use crate::config;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Canonical form of an identifier: ASCII lowercase with underscores
/// removed. Total and allocation-cheap; non-identifier characters pass
/// through untouched.
pub fn canonical(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Whether two identifiers name the same thing under canonicalisation.
pub fn names_match(a: &str, b: &str) -> bool {
    // Cheap path first: most lookups compare identical spellings.
    a == b || canonical(a) == canonical(b)
}

/// Position-carrying fields, excluded from structural comparison.
pub fn is_position_field(name: &str) -> bool {
    matches!(canonical(name).as_str(), "location" | "stmtlocation")
}

/// Field names the parser's statement schema declares, canonical form.
/// Covers the node types that matter for searching DML/DDL; the list is a
/// catalog, not an exhaustive schema, and unknown names simply never head
/// an attribute form.
const FIELD_NAMES: &[&str] = &[
    // links and list containers
    "args",
    "arg",
    "items",
    "elements",
    "fields",
    "stmt",
    "stmts",
    "larg",
    "rarg",
    "lexpr",
    "rexpr",
    "expr",
    "result",
    "defresult",
    "subselect",
    "testexpr",
    "quals",
    "val",
    // select / dml shape
    "targetlist",
    "fromclause",
    "whereclause",
    "groupclause",
    "groupdistinct",
    "havingclause",
    "windowclause",
    "sortclause",
    "distinctclause",
    "intoclause",
    "limitcount",
    "limitoffset",
    "limitoption",
    "lockingclause",
    "valueslists",
    "withclause",
    "returninglist",
    "usingclause",
    "op",
    "all",
    "relation",
    "cols",
    "selectstmt",
    "onconflictclause",
    "override",
    // range / alias
    "relname",
    "schemaname",
    "catalogname",
    "inh",
    "relpersistence",
    "alias",
    "aliasname",
    "colnames",
    "subquery",
    "lateral",
    "ordinality",
    "functions",
    "rtindex",
    "jointype",
    "isnatural",
    "joinusingalias",
    // constants and refs
    "ival",
    "fval",
    "sval",
    "bsval",
    "boolval",
    "isnull",
    "indirection",
    "name",
    "names",
    "number",
    "colno",
    // functions
    "funcname",
    "aggorder",
    "aggfilter",
    "aggwithingroup",
    "aggstar",
    "aggdistinct",
    "funcvariadic",
    "funcformat",
    "over",
    // operators / expressions
    "kind",
    "boolop",
    "opername",
    "sublinktype",
    "sublinkid",
    "nulltesttype",
    "booltesttype",
    "argisrow",
    // ctes
    "ctes",
    "recursive",
    "ctename",
    "aliascolnames",
    "ctematerialized",
    "ctequery",
    "cterecursive",
    // ddl
    "tableelts",
    "inhrelations",
    "constraints",
    "options",
    "oncommit",
    "tablespacename",
    "accessmethod",
    "ifnotexists",
    "ifexists",
    "missingok",
    "behavior",
    "removetype",
    "objects",
    "colname",
    "typename",
    "typmods",
    "typemod",
    "setof",
    "pcttype",
    "arraybounds",
    "islocal",
    "isnotnull",
    "isfromtype",
    "storage",
    "identity",
    "generated",
    "idxname",
    "indexparams",
    "unique",
    "primary",
    "concurrent",
    // def elems and do blocks
    "defname",
    "defnamespace",
    "defaction",
    "lang",
    // sort
    "node",
    "sortbydir",
    "sortbynulls",
    "useop",
    // position (never an attribute head, listed for completeness)
    "location",
    "stmtlocation",
    "stmtlen",
];

fn field_catalog() -> &'static HashSet<String> {
    static CATALOG: OnceLock<HashSet<String>> = OnceLock::new();
    CATALOG.get_or_init(|| {
        let mut set: HashSet<String> = FIELD_NAMES.iter().map(|n| canonical(n)).collect();
        for extra in config().extra_fields.split(',') {
            let extra = extra.trim();
            if !extra.is_empty() {
                set.insert(canonical(extra));
            }
        }
        set
    })
}

/// Whether `name` is a field the schema declares, i.e. may head an
/// attribute form in a pattern.
pub fn is_known_field(name: &str) -> bool {
    field_catalog().contains(canonical(name).as_str())
}

/// `(parent type, field, message type)` for fields the parser declares as a
/// concrete message rather than a tagged node link. The tag is lost in the
/// dynamic view, so it is restored from this table.
const DIRECT_MESSAGE_FIELDS: &[(&str, &str, &str)] = &[
    ("InsertStmt", "relation", "RangeVar"),
    ("InsertStmt", "withClause", "WithClause"),
    ("InsertStmt", "onConflictClause", "OnConflictClause"),
    ("UpdateStmt", "relation", "RangeVar"),
    ("UpdateStmt", "withClause", "WithClause"),
    ("DeleteStmt", "relation", "RangeVar"),
    ("DeleteStmt", "withClause", "WithClause"),
    ("SelectStmt", "withClause", "WithClause"),
    ("SelectStmt", "intoClause", "IntoClause"),
    ("SelectStmt", "larg", "SelectStmt"),
    ("SelectStmt", "rarg", "SelectStmt"),
    ("CreateStmt", "relation", "RangeVar"),
    ("CreateTableAsStmt", "into", "IntoClause"),
    ("IndexStmt", "relation", "RangeVar"),
    ("AlterTableStmt", "relation", "RangeVar"),
    ("CopyStmt", "relation", "RangeVar"),
    ("VacuumRelation", "relation", "RangeVar"),
    ("CreateTrigStmt", "relation", "RangeVar"),
    ("RuleStmt", "relation", "RangeVar"),
    ("RefreshMatViewStmt", "relation", "RangeVar"),
    ("LockStmt", "relations", "RangeVar"),
    ("RangeVar", "alias", "Alias"),
    ("RangeSubselect", "alias", "Alias"),
    ("RangeFunction", "alias", "Alias"),
    ("JoinExpr", "joinUsingAlias", "Alias"),
    ("CommonTableExpr", "aliascolnames", "Node"),
    ("FuncCall", "over", "WindowDef"),
    ("IntoClause", "rel", "RangeVar"),
    ("ColumnDef", "typeName", "TypeName"),
    ("TypeCast", "typeName", "TypeName"),
    ("WithClause", "ctes", "Node"),
];

/// Message type of `field` on `parent`, when the schema links it directly.
pub fn direct_message_type(parent: &str, field: &str) -> Option<&'static str> {
    DIRECT_MESSAGE_FIELDS
        .iter()
        .find(|(p, f, _)| names_match(p, parent) && names_match(f, field))
        .map(|(_, _, t)| *t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("target_list", "targetlist")]
    #[case("targetList", "targetlist")]
    #[case("TARGET_LIST", "targetlist")]
    #[case("RangeVar", "rangevar")]
    #[case("A_Const", "aconst")]
    #[case("AConst", "aconst")]
    fn canonical_folds_case_and_underscores(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(canonical(input), expected);
    }

    #[test]
    fn names_match_bridges_spellings() {
        assert!(names_match("relname", "RELNAME"));
        assert!(names_match("rel_name", "relname"));
        assert!(names_match("A_Const", "AConst"));
        assert!(!names_match("relname", "schemaname"));
    }

    #[test]
    fn known_fields_cover_common_attribute_heads() {
        for name in ["relname", "targetList", "sval", "ival", "whereClause"] {
            assert!(is_known_field(name), "{name} should be in the catalog");
        }
        assert!(!is_known_field("RangeVar"));
        assert!(!is_known_field("no_such_field"));
    }

    #[test]
    fn direct_links_restore_type_tags() {
        assert_eq!(
            direct_message_type("InsertStmt", "relation"),
            Some("RangeVar")
        );
        assert_eq!(direct_message_type("RangeVar", "alias"), Some("Alias"));
        assert_eq!(direct_message_type("SelectStmt", "whereClause"), None);
    }

    #[test]
    fn position_fields_are_recognised() {
        assert!(is_position_field("location"));
        assert!(is_position_field("stmt_location"));
        assert!(!is_position_field("relname"));
    }
}
