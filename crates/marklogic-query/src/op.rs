//! Comparison operators and datatype names for range queries.
//!
//! Both vocabularies are fixed: a string argument that is not one of these
//! tokens falls through to being a literal value.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};

/// Range comparison operator, written in its wire form (`LT`, `GE`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RangeOperator {
    /// Less than (`<`).
    Lt,
    /// Less than or equal (`<=`).
    Le,
    /// Greater than (`>`).
    Gt,
    /// Greater than or equal (`>=`).
    Ge,
    /// Equal (`=`). The default when no operator is given.
    #[default]
    Eq,
    /// Not equal (`!=`).
    Ne,
}

static COMPARISONS: Lazy<HashMap<&'static str, RangeOperator>> = Lazy::new(|| {
    HashMap::from([
        ("<", RangeOperator::Lt),
        ("<=", RangeOperator::Le),
        (">", RangeOperator::Gt),
        (">=", RangeOperator::Ge),
        ("=", RangeOperator::Eq),
        ("!=", RangeOperator::Ne),
    ])
});

static DATATYPES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "xs:anyURI",
        "xs:date",
        "xs:dateTime",
        "xs:dayTimeDuration",
        "xs:decimal",
        "xs:double",
        "xs:float",
        "xs:gDay",
        "xs:gMonth",
        "xs:gMonthDay",
        "xs:gYear",
        "xs:gYearMonth",
        "xs:int",
        "xs:long",
        "xs:string",
        "xs:time",
        "xs:unsignedInt",
        "xs:unsignedLong",
        "xs:yearMonthDuration",
    ])
});

impl RangeOperator {
    /// Looks up a comparison token such as `">="`.
    ///
    /// Surrounding whitespace is ignored.
    pub fn from_token(token: &str) -> Option<RangeOperator> {
        COMPARISONS.get(token.trim()).copied()
    }

    /// Returns the wire name of this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            RangeOperator::Lt => "LT",
            RangeOperator::Le => "LE",
            RangeOperator::Gt => "GT",
            RangeOperator::Ge => "GE",
            RangeOperator::Eq => "EQ",
            RangeOperator::Ne => "NE",
        }
    }
}

impl std::fmt::Display for RangeOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returns the canonical datatype name if `name` is one of the known
/// `xs:` datatypes.
pub fn known_datatype(name: &str) -> Option<&'static str> {
    DATATYPES.get(name.trim()).copied()
}

/// Prefixes a datatype name with `xs:` unless it already has the prefix.
pub fn qualify_datatype(name: &str) -> String {
    if name.starts_with("xs:") {
        name.to_string()
    } else {
        format!("xs:{name}")
    }
}

/// A datatype for a range index, optionally with a string collation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datatype {
    /// The `xs:` datatype name.
    pub datatype: String,
    /// Collation URI for string datatypes.
    pub collation: Option<String>,
}

/// Identifies the datatype of a range index.
///
/// A name without the `xs:` prefix is prefixed; the name is not otherwise
/// validated so server-side custom types pass through.
pub fn datatype(name: &str) -> Result<Datatype> {
    if name.is_empty() {
        return Err(QueryError::arity("datatype", "missing datatype"));
    }
    Ok(Datatype {
        datatype: qualify_datatype(name),
        collation: None,
    })
}

/// Identifies a string datatype with a collation.
pub fn datatype_with_collation(name: &str, collation: &str) -> Result<Datatype> {
    let mut datatype = datatype(name)?;
    datatype.collation = Some(collation.to_string());
    Ok(datatype)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_tokens() {
        assert_eq!(RangeOperator::from_token("<"), Some(RangeOperator::Lt));
        assert_eq!(RangeOperator::from_token("<="), Some(RangeOperator::Le));
        assert_eq!(RangeOperator::from_token(">"), Some(RangeOperator::Gt));
        assert_eq!(RangeOperator::from_token(" >= "), Some(RangeOperator::Ge));
        assert_eq!(RangeOperator::from_token("="), Some(RangeOperator::Eq));
        assert_eq!(RangeOperator::from_token("!="), Some(RangeOperator::Ne));
        assert_eq!(RangeOperator::from_token("=="), None);
        assert_eq!(RangeOperator::from_token("gt"), None);
    }

    #[test]
    fn operator_wire_names() {
        assert_eq!(
            serde_json::to_value(RangeOperator::Ge).unwrap(),
            serde_json::json!("GE")
        );
        assert_eq!(RangeOperator::Ne.to_string(), "NE");
        assert_eq!(RangeOperator::default(), RangeOperator::Eq);
    }

    #[test]
    fn datatype_table() {
        assert_eq!(known_datatype("xs:int"), Some("xs:int"));
        assert_eq!(known_datatype(" xs:dateTime "), Some("xs:dateTime"));
        assert_eq!(known_datatype("int"), None);
        assert_eq!(known_datatype("xs:integer"), None);
    }

    #[test]
    fn datatype_prefixing() {
        assert_eq!(datatype("int").unwrap().datatype, "xs:int");
        assert_eq!(datatype("xs:date").unwrap().datatype, "xs:date");
        let collated =
            datatype_with_collation("string", "http://marklogic.com/collation/").unwrap();
        assert_eq!(collated.datatype, "xs:string");
        assert_eq!(
            collated.collation.as_deref(),
            Some("http://marklogic.com/collation/")
        );
        assert!(datatype("").is_err());
    }
}
