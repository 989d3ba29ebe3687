//! Query-string parsing bindings.
//!
//! A parsed query is a search string such as `rating:5 moby` plus the
//! bindings that give it meaning: named constraints for `name:value`
//! terms, a default query for untagged terms, and a policy for the empty
//! string.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::arg::{as_args, Arg};
use crate::error::{QueryError, Result};
use crate::module::LibraryRoot;
use crate::query::{Constraint, ConstraintSpec, CustomConstraint, DefaultSpec, Query};

/// What an empty search string matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyPolicy {
    AllResults,
    NoResults,
}

impl EmptyPolicy {
    /// Parses `all-results` or `no-results`.
    pub fn from_name(name: &str) -> Option<EmptyPolicy> {
        match name {
            "all-results" => Some(EmptyPolicy::AllResults),
            "no-results" => Some(EmptyPolicy::NoResults),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyBinding {
    pub apply: EmptyPolicy,
}

/// Bindings for untagged terms and the empty string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TermBinding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty: Option<EmptyBinding>,
}

impl TermBinding {
    fn is_empty(&self) -> bool {
        self.default.is_none() && self.empty.is_none()
    }
}

/// The bindings half of a parsed query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseBindings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<Vec<Constraint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term: Option<TermBinding>,
}

/// A search string with its bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub qtext: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<Vec<Constraint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term: Option<TermBinding>,
}

/// Binds a query to a constraint name usable in a search string.
pub fn bind(name: impl Into<String>) -> Arg {
    Arg::Bind(name.into())
}

/// Makes a word, value, or range query handle untagged search terms.
pub fn bind_default() -> Arg {
    Arg::BindDefault
}

/// Sets what an empty search string matches: `all-results` or
/// `no-results`.
pub fn bind_empty_as(policy: &str) -> Result<Arg> {
    EmptyPolicy::from_name(policy)
        .map(Arg::BindEmpty)
        .ok_or_else(|| QueryError::unrecognized("bind_empty_as", policy))
}

/// Collects bindings for a parsed query.
///
/// Named constraints accumulate in order. The first default binding and the
/// first empty-string policy win; later ones are ignored.
pub fn parse_bindings(args: Vec<Arg>) -> Result<ParseBindings> {
    let mut constraints = Vec::new();
    let mut term = TermBinding::default();
    for arg in as_args(args) {
        match arg {
            Arg::Query(Query::Constraint(c)) => constraints.push(c),
            Arg::Query(Query::Default(d)) => {
                if term.default.is_none() {
                    term.default = Some(d.default);
                } else {
                    debug!("ignoring additional default binding");
                }
            }
            Arg::BindEmpty(policy) => {
                if term.empty.is_none() {
                    term.empty = Some(EmptyBinding { apply: policy });
                } else {
                    debug!(?policy, "ignoring additional empty binding");
                }
            }
            other => return Err(QueryError::unrecognized("parse_bindings", other)),
        }
    }
    Ok(ParseBindings {
        constraint: (!constraints.is_empty()).then_some(constraints),
        term: (!term.is_empty()).then_some(term),
    })
}

/// A search string to parse, with optional bindings from
/// [`parse_bindings`].
pub fn parsed_from(args: Vec<Arg>) -> Result<ParsedQuery> {
    let mut args = as_args(args).into_iter();
    let qtext = match args.next() {
        Some(arg) => arg.into_text("parsed_from")?,
        None => return Err(QueryError::arity("parsed_from", "missing query text")),
    };
    let mut parsed = ParsedQuery {
        qtext,
        constraint: None,
        term: None,
    };
    for arg in args {
        match arg {
            Arg::Bindings(bindings) => {
                if parsed.constraint.is_none() {
                    parsed.constraint = bindings.constraint;
                }
                if parsed.term.is_none() {
                    parsed.term = bindings.term;
                }
            }
            other => return Err(QueryError::unrecognized("parsed_from", other)),
        }
    }
    Ok(parsed)
}

/// A constraint whose terms are parsed by a function in a custom library.
///
/// Takes the library file name, a [`bind`] naming the constraint, and
/// optionally [`term_options`](crate::term_options).
pub fn parse_function(args: Vec<Arg>) -> Result<Query> {
    let args = as_args(args);
    if args.len() < 2 {
        return Err(QueryError::arity(
            "parse_function",
            "requires a library and a constraint name binding",
        ));
    }
    let mut args = args.into_iter();
    let module = match args.next() {
        Some(arg) => arg.into_text("parse_function")?,
        None => return Err(QueryError::arity("parse_function", "missing library")),
    };
    let mut name = None;
    let mut term_option = None;
    for arg in args {
        match arg {
            Arg::Bind(n) if name.is_none() => name = Some(n),
            Arg::TermOptions(o) if term_option.is_none() => term_option = Some(o),
            other => return Err(QueryError::unrecognized("parse_function", other)),
        }
    }
    let Some(name) = name else {
        return Err(QueryError::MissingConstraintName { index: "custom" });
    };
    Ok(Constraint {
        name,
        spec: ConstraintSpec::Custom(CustomConstraint {
            parse: LibraryRoot::Query.reference("parse", &module)?,
            facet: false,
            term_option,
        }),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::combinators::{range, term_options, word};
    use serde_json::json;

    #[test]
    fn empty_policy_names() {
        assert!(bind_empty_as("all-results").is_ok());
        assert!(bind_empty_as("no-results").is_ok());
        assert!(bind_empty_as("some-results").is_err());
    }

    #[test]
    fn bindings_partition_by_kind() {
        let bindings = parse_bindings(args![
            range(args!["rating", "xs:int", bind("stars")]).unwrap(),
            word(args!["body", bind_default()]).unwrap(),
            bind_empty_as("no-results").unwrap(),
            word(args!["title", bind("t")]).unwrap()
        ])
        .unwrap();
        assert_eq!(
            serde_json::to_value(&bindings).unwrap(),
            json!({
                "constraint": [
                    {"name": "stars", "range": {"json-property": "rating", "type": "xs:int"}},
                    {"name": "t", "word": {"json-property": "title"}}
                ],
                "term": {
                    "default": {"word": {"json-property": "body"}},
                    "empty": {"apply": "no-results"}
                }
            })
        );
    }

    #[test]
    fn first_default_wins() {
        let bindings = parse_bindings(args![
            word(args!["body", bind_default()]).unwrap(),
            word(args!["title", bind_default()]).unwrap(),
            bind_empty_as("all-results").unwrap(),
            bind_empty_as("no-results").unwrap()
        ])
        .unwrap();
        let term = bindings.term.unwrap();
        let default = serde_json::to_value(term.default.unwrap()).unwrap();
        assert_eq!(default, json!({"word": {"json-property": "body"}}));
        assert_eq!(term.empty.map(|e| e.apply), Some(EmptyPolicy::AllResults));
    }

    #[test]
    fn bindings_reject_plain_queries() {
        let err = parse_bindings(args![word(args!["t", "x"]).unwrap()]).unwrap_err();
        assert!(matches!(err, QueryError::UnrecognizedArgument { .. }));
    }

    #[test]
    fn parsed_from_with_bindings() {
        let parsed = parsed_from(args![
            "stars:5 moby",
            parse_bindings(args![range(args!["rating", bind("stars")]).unwrap()]).unwrap()
        ])
        .unwrap();
        assert_eq!(
            serde_json::to_value(&parsed).unwrap(),
            json!({
                "qtext": "stars:5 moby",
                "constraint": [{"name": "stars", "range": {"json-property": "rating"}}]
            })
        );
    }

    #[test]
    fn parsed_from_text_only() {
        let parsed = parsed_from(args!["moby"]).unwrap();
        assert_eq!(serde_json::to_value(&parsed).unwrap(), json!({"qtext": "moby"}));
        assert!(parsed_from(args![]).is_err());
    }

    #[test]
    fn custom_parse_function() {
        let q = parse_function(args![
            "tags.xqy",
            bind("tag"),
            term_options(["case-sensitive"])
        ])
        .unwrap();
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            json!({"name": "tag", "custom": {
                "parse": {
                    "apply": "parse",
                    "ns": "http://marklogic.com/query/custom/tags",
                    "at": "/ext/marklogic/query/custom/tags.xqy"
                },
                "facet": false,
                "term-option": ["case-sensitive"]
            }})
        );
    }

    #[test]
    fn parse_function_requires_binding() {
        assert!(matches!(
            parse_function(args!["tags.xqy"]).unwrap_err(),
            QueryError::Arity { .. }
        ));
        assert!(matches!(
            parse_function(args!["tags.xqy", term_options(["x"])]).unwrap_err(),
            QueryError::MissingConstraintName { .. }
        ));
        assert!(matches!(
            parse_function(args!["tags", bind("t")]).unwrap_err(),
            QueryError::MissingModuleExtension(_)
        ));
    }
}
