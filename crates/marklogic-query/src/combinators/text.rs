//! Term, word, and value queries.

use tracing::debug;

use crate::arg::{as_args, Arg};
use crate::error::{QueryError, Result};
use crate::index::{resolve, IndexFields};
use crate::query::{
    Constraint, ConstraintSpec, DefaultBinding, DefaultSpec, Query, StructuredQuery, TermQuery,
    TextSpec,
};

/// Options for term matching, such as `case-insensitive` or `stemmed`.
pub fn term_options<I, S>(options: I) -> Arg
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Arg::TermOptions(options.into_iter().map(Into::into).collect())
}

/// Matches documents containing any of the terms anywhere.
///
/// The first [`weight`](crate::weight) marker or bare number sets the
/// weight; all other arguments are search text.
pub fn term(args: Vec<Arg>) -> Result<Query> {
    let mut query = TermQuery::default();
    for arg in as_args(args) {
        match arg {
            Arg::Weight(w) | Arg::Number(w) if query.weight.is_none() => query.weight = Some(w),
            Arg::List(items) => {
                for item in items {
                    query.text.push(item.into_scalar("term")?);
                }
            }
            other => query.text.push(other.into_scalar("term")?),
        }
    }
    Ok(StructuredQuery::Term(query).into())
}

/// Matches words in an indexed name.
///
/// The first argument names the index. With search text the result is a
/// `word-query`; with a [`bind`](crate::bind) it is a named constraint;
/// with [`bind_default`](crate::bind_default) it handles untagged terms.
pub fn word(args: Vec<Arg>) -> Result<Query> {
    text_query(TextKind::Word, args)
}

/// Matches entire values of an indexed name. Takes the same arguments as
/// [`word`].
pub fn value(args: Vec<Arg>) -> Result<Query> {
    text_query(TextKind::Value, args)
}

#[derive(Debug, Clone, Copy)]
enum TextKind {
    Word,
    Value,
}

impl TextKind {
    fn name(self) -> &'static str {
        match self {
            TextKind::Word => "word",
            TextKind::Value => "value",
        }
    }
}

fn text_query(kind: TextKind, args: Vec<Arg>) -> Result<Query> {
    let combinator = kind.name();
    let mut args = as_args(args).into_iter();
    let index = match args.next() {
        Some(arg) => resolve(arg, combinator)?,
        None => return Err(QueryError::arity(combinator, "missing index")),
    };

    let mut spec = TextSpec {
        index: IndexFields::of(&index),
        ..Default::default()
    };
    let mut text = Vec::new();
    let mut name = None;
    let mut is_default = false;

    for arg in args {
        match arg {
            Arg::FragmentScope(s) if spec.fragment_scope.is_none() => spec.fragment_scope = Some(s),
            Arg::TermOptions(o) if spec.term_option.is_none() => spec.term_option = Some(o),
            Arg::Weight(w) if spec.weight.is_none() => spec.weight = Some(w),
            Arg::List(items) => {
                for item in items {
                    text.push(item.into_scalar(combinator)?);
                }
            }
            Arg::Bind(n) if name.is_none() => name = Some(n),
            Arg::BindDefault if !is_default => is_default = true,
            other => text.push(other.into_scalar(combinator)?),
        }
    }

    let has_text = !text.is_empty();
    if [has_text, name.is_some(), is_default]
        .iter()
        .filter(|b| **b)
        .count()
        > 1
    {
        return Err(QueryError::conflicting(combinator));
    }

    if has_text {
        spec.text = Some(text);
        return Ok(match kind {
            TextKind::Word => StructuredQuery::Word(spec),
            TextKind::Value => StructuredQuery::Value(spec),
        }
        .into());
    }

    if is_default {
        let default = match kind {
            TextKind::Word => DefaultSpec::Word(spec),
            TextKind::Value => DefaultSpec::Value(spec),
        };
        return Ok(DefaultBinding { default }.into());
    }

    let name = match name {
        Some(name) => name,
        None => {
            let derived = index.require_constraint_name()?;
            debug!(combinator, name = %derived, "derived constraint name");
            derived
        }
    };
    let spec = match kind {
        TextKind::Word => ConstraintSpec::Word(spec),
        TextKind::Value => ConstraintSpec::Value(spec),
    };
    Ok(Constraint { name, spec }.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinators::{fragment_scope, weight};
    use crate::index::{attribute, property};
    use crate::parse::{bind, bind_default};
    use crate::{args, FragmentScope};
    use serde_json::json;

    #[test]
    fn term_collects_text_and_weight() {
        let q = term(args!["moby", "dick", 2.0]).unwrap();
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            json!({"term-query": {"text": ["moby", "dick"], "weight": 2.0}})
        );
    }

    #[test]
    fn term_second_number_is_text() {
        let q = term(args![weight(1), "a", 5]).unwrap();
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            json!({"term-query": {"text": ["a", 5], "weight": 1}})
        );
    }

    #[test]
    fn term_splices_array() {
        assert_eq!(
            term(args![vec!["a", "b"]]).unwrap(),
            term(args!["a", "b"]).unwrap()
        );
    }

    #[test]
    fn word_query_with_options() {
        let q = word(args![
            "title",
            "moby",
            term_options(["case-insensitive"]),
            weight(2),
            fragment_scope("documents").unwrap()
        ])
        .unwrap();
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            json!({"word-query": {
                "json-property": "title",
                "fragment-scope": "documents",
                "term-option": ["case-insensitive"],
                "weight": 2,
                "text": ["moby"]
            }})
        );
    }

    #[test]
    fn value_query_with_array_text() {
        let q = value(args![property("tag"), vec!["a", "b"]]).unwrap();
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            json!({"value-query": {"json-property": "tag", "text": ["a", "b"]}})
        );
    }

    #[test]
    fn value_accepts_json_literals() {
        let q = value(args!["rating", json!(null), json!(4), json!("n/a")]).unwrap();
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            json!({"value-query": {"json-property": "rating", "text": [null, 4, "n/a"]}})
        );
        assert_eq!(q, value(args!["rating", None::<&str>, 4, "n/a"]).unwrap());
    }

    #[test]
    fn word_binding_builds_constraint() {
        let q = word(args!["title", bind("t")]).unwrap();
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            json!({"name": "t", "word": {"json-property": "title"}})
        );
    }

    #[test]
    fn word_without_text_defaults_name() {
        let q = value(args!["status"]).unwrap();
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            json!({"name": "status", "value": {"json-property": "status"}})
        );
    }

    #[test]
    fn word_default_binding() {
        let q = word(args!["body", bind_default()]).unwrap();
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            json!({"default": {"word": {"json-property": "body"}}})
        );
    }

    #[test]
    fn text_and_binding_conflict() {
        let err = word(args!["title", "moby", bind("t")]).unwrap_err();
        assert!(matches!(err, QueryError::ConflictingBinding { combinator: "word" }));
        let err = value(args!["title", bind_default(), "x"]).unwrap_err();
        assert!(matches!(err, QueryError::ConflictingBinding { .. }));
    }

    #[test]
    fn attribute_constraint_needs_name() {
        let index = attribute(args!["item", "currency"]).unwrap();
        let err = word(args![index]).unwrap_err();
        assert!(matches!(err, QueryError::MissingConstraintName { .. }));
    }

    #[test]
    fn word_requires_index() {
        assert!(matches!(
            word(args![]).unwrap_err(),
            QueryError::Arity { .. }
        ));
    }

    #[test]
    fn fragment_scope_marker_variant() {
        let q = word(args!["t", "x", FragmentScope::Properties]).unwrap();
        let v = serde_json::to_value(&q).unwrap();
        assert_eq!(v["word-query"]["fragment-scope"], json!("properties"));
    }
}
