//! Variadic combinator arguments.
//!
//! Most combinators take a loose list of arguments whose meaning depends on
//! their shape: a number may be a weight or a distance, a string may be an
//! operator, a datatype, or a value. [`Arg`] is the closed set of shapes a
//! combinator can be handed, and [`args!`](crate::args) builds a list of
//! them from anything with a `From` conversion.
//!
//! A single [`Arg::List`] is treated as the whole argument list, so
//! `or(args![vec![a, b]])` and `or(args![a, b])` build the same query.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use tracing::trace;

use crate::builder::QueryByExample;
use crate::error::{QueryError, Result};
use crate::facet::{Anchor, Bucket, CustomFacetFunctions, Facet, FacetBucket};
use crate::geo::{BoxBounds, Heatmap, LatLon, Region};
use crate::index::{IndexedName, QName};
use crate::op::Datatype;
use crate::ordering::SortSpec;
use crate::parse::{EmptyPolicy, ParseBindings, ParsedQuery};
use crate::query::{FragmentScope, Period, Query, StructuredQuery};
use crate::results::{Extract, Snippet, Transform};
use crate::value::{Number, Scalar};

/// One argument to a variadic combinator.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// JSON null.
    Null,
    /// A string: a property name, a value, or a token such as `">="`.
    Text(String),
    Number(Number),
    Bool(bool),
    /// A timestamp, written as ISO 8601 with milliseconds.
    DateTime(DateTime<Utc>),
    /// An array argument, spliced into the surrounding list.
    List(Vec<Arg>),
    /// Raw JSON, for options objects and query-by-example documents.
    Json(Value),
    Query(Query),
    Index(IndexedName),
    QName(QName),
    Datatype(Datatype),
    FragmentScope(FragmentScope),
    Weight(Number),
    Ordered(bool),
    RangeOptions(Vec<String>),
    TermOptions(Vec<String>),
    GeoOptions(Vec<String>),
    TemporalOptions(Vec<String>),
    FacetOptions(Vec<String>),
    /// Binds a parsed-query constraint name.
    Bind(String),
    /// Makes the query the default for untagged search terms.
    BindDefault,
    /// What an empty search string matches.
    BindEmpty(EmptyPolicy),
    LatLon(LatLon),
    Region(Region),
    Bounds(BoxBounds),
    Heatmap(Heatmap),
    Period(Period),
    Bucket(Bucket),
    ComputedBucket(Bucket),
    Anchor(Anchor),
    CalculateFunction(CustomFacetFunctions),
    Facet(Facet),
    /// Sort by relevance, optionally with a scoring method.
    Score(Option<String>),
    Sort(SortSpec),
    Transform(Transform),
    Extract(Extract),
    Snippet(Snippet),
    Parsed(ParsedQuery),
    Bindings(ParseBindings),
    ByExample(QueryByExample),
}

impl Arg {
    /// Returns the text of a string argument.
    pub fn into_text(self, combinator: &'static str) -> Result<String> {
        match self {
            Arg::Text(s) => Ok(s),
            other => Err(QueryError::unrecognized(combinator, other)),
        }
    }

    /// Returns the query carried by the argument.
    pub fn into_query(self, combinator: &'static str) -> Result<Query> {
        match self {
            Arg::Query(query) => Ok(query),
            other => Err(QueryError::unrecognized(combinator, other)),
        }
    }

    /// Returns the argument as a literal criterion.
    pub fn into_scalar(self, combinator: &'static str) -> Result<Scalar> {
        let scalar = match self {
            Arg::Null => Scalar::Null,
            Arg::Text(s) => Scalar::Text(s),
            Arg::Number(n) => Scalar::Number(n),
            Arg::Bool(b) => Scalar::Bool(b),
            Arg::DateTime(dt) => Scalar::Text(iso_timestamp(&dt)),
            other => return Err(QueryError::unrecognized(combinator, other)),
        };
        trace!(combinator, value = ?scalar, "literal criterion");
        Ok(scalar)
    }

    /// Returns the argument as plain JSON, for query-by-example documents.
    pub fn into_json(self, combinator: &'static str) -> Result<Value> {
        match self {
            Arg::Json(value) => Ok(value),
            Arg::Null => Ok(Value::Null),
            Arg::Text(s) => Ok(Value::String(s)),
            Arg::Bool(b) => Ok(Value::Bool(b)),
            Arg::Number(n) => Ok(serde_json::to_value(n)?),
            Arg::DateTime(dt) => Ok(Value::String(iso_timestamp(&dt))),
            Arg::List(items) => items
                .into_iter()
                .map(|item| item.into_json(combinator))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            other => Err(QueryError::unrecognized(combinator, other)),
        }
    }

    pub(crate) fn as_number(&self) -> Option<Number> {
        match self {
            Arg::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// Formats a timestamp the way the server expects: ISO 8601, UTC,
/// millisecond precision.
pub fn iso_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Splices a sole list argument into the argument list.
pub(crate) fn as_args(args: Vec<Arg>) -> Vec<Arg> {
    match <[Arg; 1]>::try_from(args) {
        Ok([Arg::List(items)]) => items,
        Ok([single]) => vec![single],
        Err(args) => args,
    }
}

/// Splices every list argument, one level deep.
pub(crate) fn flatten_args(args: Vec<Arg>) -> Vec<Arg> {
    let mut flat = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            Arg::List(items) => flat.extend(items),
            other => flat.push(other),
        }
    }
    flat
}

/// Builds a `Vec<Arg>` from heterogeneous values.
///
/// ```
/// use marklogic_query::{args, property, range};
///
/// let q = range(args![property("price"), ">=", 10]).unwrap();
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Arg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Arg::from($arg)),+]
    };
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Text(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::Text(s)
    }
}

impl From<&String> for Arg {
    fn from(s: &String) -> Self {
        Arg::Text(s.clone())
    }
}

impl From<bool> for Arg {
    fn from(b: bool) -> Self {
        Arg::Bool(b)
    }
}

macro_rules! arg_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Arg {
                fn from(n: $t) -> Self {
                    Arg::Number(Number::from(n))
                }
            }
        )*
    };
}

arg_from_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl From<Number> for Arg {
    fn from(n: Number) -> Self {
        Arg::Number(n)
    }
}

impl From<Scalar> for Arg {
    fn from(s: Scalar) -> Self {
        match s {
            Scalar::Null => Arg::Null,
            Scalar::Bool(b) => Arg::Bool(b),
            Scalar::Number(n) => Arg::Number(n),
            Scalar::Text(s) => Arg::Text(s),
        }
    }
}

impl From<DateTime<Utc>> for Arg {
    fn from(dt: DateTime<Utc>) -> Self {
        Arg::DateTime(dt)
    }
}

// JSON scalars become the matching literal argument; arrays and objects
// stay raw.
impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Arg::Null,
            Value::Bool(b) => Arg::Bool(b),
            Value::String(s) => Arg::Text(s),
            Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
                (Some(i), _, _) => Arg::Number(Number::I64(i)),
                (None, Some(u), _) => Arg::Number(Number::U64(u)),
                (None, None, Some(f)) => Arg::Number(Number::F64(f)),
                (None, None, None) => Arg::Json(Value::Number(n)),
            },
            other => Arg::Json(other),
        }
    }
}

impl<T: Into<Arg>> From<Vec<T>> for Arg {
    fn from(items: Vec<T>) -> Self {
        Arg::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Arg>, const N: usize> From<[T; N]> for Arg {
    fn from(items: [T; N]) -> Self {
        Arg::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Arg>> From<Option<T>> for Arg {
    fn from(value: Option<T>) -> Self {
        value.map_or(Arg::Null, Into::into)
    }
}

macro_rules! arg_from_variant {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Arg {
                fn from(value: $t) -> Self {
                    Arg::$variant(value)
                }
            }
        )*
    };
}

arg_from_variant!(
    Query => Query,
    IndexedName => Index,
    QName => QName,
    Datatype => Datatype,
    FragmentScope => FragmentScope,
    LatLon => LatLon,
    Region => Region,
    BoxBounds => Bounds,
    Heatmap => Heatmap,
    Period => Period,
    Anchor => Anchor,
    CustomFacetFunctions => CalculateFunction,
    Facet => Facet,
    SortSpec => Sort,
    Transform => Transform,
    Extract => Extract,
    Snippet => Snippet,
    ParsedQuery => Parsed,
    ParseBindings => Bindings,
    QueryByExample => ByExample,
);

impl From<StructuredQuery> for Arg {
    fn from(query: StructuredQuery) -> Self {
        Arg::Query(Query::Structured(query))
    }
}

impl From<FacetBucket> for Arg {
    fn from(bucket: FacetBucket) -> Self {
        match bucket {
            FacetBucket::Literal(b) => Arg::Bucket(b),
            FacetBucket::Computed(b) => Arg::ComputedBucket(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn args_macro_converts_each_item() {
        let args = args!["title", 5, true, 2.5];
        assert_eq!(
            args,
            vec![
                Arg::Text("title".into()),
                Arg::Number(Number::I64(5)),
                Arg::Bool(true),
                Arg::Number(Number::F64(2.5)),
            ]
        );
        assert!(args![].is_empty());
    }

    #[test]
    fn sole_list_is_spliced() {
        let spliced = as_args(args![vec!["a", "b"]]);
        assert_eq!(spliced, args!["a", "b"]);

        let untouched = as_args(args![vec!["a"], "b"]);
        assert_eq!(untouched.len(), 2);
        assert!(matches!(untouched[0], Arg::List(_)));
    }

    #[test]
    fn flatten_splices_every_list() {
        let flat = flatten_args(args!["a", vec!["b", "c"], "d"]);
        assert_eq!(flat, args!["a", "b", "c", "d"]);
    }

    #[test]
    fn datetime_becomes_iso_millis() {
        let dt = Utc.with_ymd_and_hms(2015, 3, 1, 12, 30, 0).unwrap();
        let scalar = Arg::from(dt).into_scalar("test").unwrap();
        assert_eq!(scalar, Scalar::Text("2015-03-01T12:30:00.000Z".into()));
    }

    #[test]
    fn option_none_is_null() {
        assert_eq!(Arg::from(None::<&str>), Arg::Null);
        assert_eq!(Arg::from(Some("x")), Arg::Text("x".into()));
    }

    #[test]
    fn json_scalars_become_literals() {
        assert_eq!(Arg::from(json!(null)), Arg::Null);
        assert_eq!(Arg::from(json!(true)), Arg::Bool(true));
        assert_eq!(Arg::from(json!("x")), Arg::Text("x".into()));
        assert_eq!(Arg::from(json!(-4)), Arg::Number(Number::I64(-4)));
        assert_eq!(Arg::from(json!(u64::MAX)), Arg::Number(Number::U64(u64::MAX)));
        assert_eq!(Arg::from(json!(1.5)), Arg::Number(Number::F64(1.5)));
        assert_eq!(Arg::from(json!({"a": 1})), Arg::Json(json!({"a": 1})));
        assert_eq!(Arg::from(json!([1])), Arg::Json(json!([1])));
    }

    #[test]
    fn into_json_converts_literals_and_lists() {
        let value = Arg::from(vec![Arg::from("a"), Arg::from(1), Arg::Null])
            .into_json("test")
            .unwrap();
        assert_eq!(value, json!(["a", 1, null]));
    }

    #[test]
    fn into_text_rejects_other_shapes() {
        let err = Arg::from(3).into_text("collection").unwrap_err();
        assert!(matches!(
            err,
            QueryError::UnrecognizedArgument {
                combinator: "collection",
                ..
            }
        ));
    }
}
