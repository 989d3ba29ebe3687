//! Facets: value distributions calculated over an index alongside results.
//!
//! A facet reads a range index, the collection lexicon, or a pair of custom
//! library functions. Range facets can group values into [`bucket`]s with
//! fixed bounds, or computed buckets whose bounds are relative to an
//! [`anchor`] such as `now`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::arg::{as_args, Arg};
use crate::error::{QueryError, Result};
use crate::index::{IndexFields, IndexedName};
use crate::module::{LibraryRoot, ModuleRef};
use crate::query::{IndexDeclaration, Query};
use crate::value::Scalar;

/// A named facet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facet {
    pub name: String,
    #[serde(flatten)]
    pub kind: FacetKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacetKind {
    Collection(CollectionFacet),
    Custom(CustomFacet),
    Range(RangeFacet),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CollectionFacet {
    pub facet: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet_option: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CustomFacet {
    pub facet: bool,
    pub start_facet: ModuleRef,
    pub finish_facet: ModuleRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet_option: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RangeFacet {
    pub facet: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collation: Option<String>,
    #[serde(flatten)]
    pub index: IndexFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<Vec<Bucket>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_bucket: Option<Vec<Bucket>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet_option: Option<Vec<String>>,
}

/// The functions of a custom facet library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CustomFacetFunctions {
    pub start_facet: ModuleRef,
    pub finish_facet: ModuleRef,
}

/// A facet bucket. Literal buckets use `ge` and `lt`; computed buckets may
/// also carry anchors that the bounds are offsets from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Bucket {
    pub name: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ge: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ge_anchor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt_anchor: Option<String>,
}

/// A bucket as produced by [`bucket`].
#[derive(Debug, Clone, PartialEq)]
pub enum FacetBucket {
    Literal(Bucket),
    Computed(Bucket),
}

/// A named reference point, such as `now` or `start-of-day`, with one to
/// three bound values relative to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub anchor: String,
    pub value: Vec<Scalar>,
}

/// Options for facet calculation, such as `limit=10` or `frequency-order`.
pub fn facet_options<I, S>(options: I) -> Result<Arg>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let options: Vec<String> = options.into_iter().map(Into::into).collect();
    if options.is_empty() {
        return Err(QueryError::arity("facet_options", "must specify at least one option"));
    }
    Ok(Arg::FacetOptions(options))
}

/// Names the start and finish functions of a custom facet library, such as
/// `calculate_function("dates.xqy")`.
pub fn calculate_function(module: &str) -> Result<CustomFacetFunctions> {
    Ok(CustomFacetFunctions {
        start_facet: LibraryRoot::Query.reference("start-facet", module)?,
        finish_facet: LibraryRoot::Query.reference("finish-facet", module)?,
    })
}

/// A reference point for computed bucket bounds: the anchor name followed
/// by one to three values.
pub fn anchor(args: Vec<Arg>) -> Result<Anchor> {
    let args = as_args(args);
    if !(2..=4).contains(&args.len()) {
        return Err(QueryError::arity(
            "anchor",
            "must have the anchor name and one to three values",
        ));
    }
    let mut args = args.into_iter();
    let anchor = match args.next() {
        Some(arg) => arg.into_text("anchor")?,
        None => return Err(QueryError::arity("anchor", "missing anchor name")),
    };
    let value = args
        .map(|arg| arg.into_scalar("anchor"))
        .collect::<Result<Vec<_>>>()?;
    Ok(Anchor { anchor, value })
}

fn comparator(value: &Scalar) -> Option<char> {
    match value.as_str() {
        Some("<") => Some('<'),
        Some(">") => Some('>'),
        _ => None,
    }
}

// A bound paired with a `<` or `>` token, in either order.
fn two_value_bounds(bucket: &mut Bucket, v1: Scalar, v2: Scalar) -> Result<()> {
    match (comparator(&v1), comparator(&v2)) {
        (Some('<'), _) => bucket.lt = Some(v2),
        (_, Some('>')) => bucket.lt = Some(v1),
        (Some('>'), _) => bucket.ge = Some(v2),
        (_, Some('<')) => bucket.ge = Some(v1),
        _ => return Err(QueryError::MalformedBucket),
    }
    Ok(())
}

// `lower < upper` or `upper > lower`.
fn three_value_bounds(
    bucket: &mut Bucket,
    anchor1: Option<String>,
    v1: Scalar,
    cmp: &Scalar,
    anchor2: Option<String>,
    v2: Scalar,
) -> Result<()> {
    match comparator(cmp) {
        Some('<') => {
            bucket.ge = Some(v1);
            bucket.ge_anchor = anchor1;
            bucket.lt = Some(v2);
            bucket.lt_anchor = anchor2;
        }
        Some('>') => {
            bucket.lt = Some(v1);
            bucket.lt_anchor = anchor1;
            bucket.ge = Some(v2);
            bucket.ge_anchor = anchor2;
        }
        _ => return Err(QueryError::MalformedBucket),
    }
    Ok(())
}

fn bound(arg: Arg) -> Result<(Option<String>, Scalar)> {
    match arg {
        Arg::Anchor(Anchor { anchor, value }) => match value.into_iter().next() {
            Some(v) => Ok((Some(anchor), v)),
            None => Err(QueryError::MalformedBucket),
        },
        other => Ok((None, other.into_scalar("bucket").map_err(|_| QueryError::MalformedBucket)?)),
    }
}

/// A facet bucket, named and labeled by its first argument.
///
/// - `bucket(name, anchor)`: a computed bucket relative to the anchor, whose
///   values are a bound and a comparison (`"<", v` or `v, ">"`), or two
///   bounds around a comparison
/// - `bucket(name, a, b)`: one bound and a comparison, in either order
/// - `bucket(name, lower, "<", upper)` or `bucket(name, upper, ">", lower)`:
///   two bounds, either of which may be an anchor
pub fn bucket(args: Vec<Arg>) -> Result<FacetBucket> {
    let args = as_args(args);
    if !(2..=4).contains(&args.len()) {
        return Err(QueryError::MalformedBucket);
    }
    let arity = args.len();
    let mut args = args.into_iter();
    let name = match args.next() {
        Some(arg) => arg.into_text("bucket").map_err(|_| QueryError::MalformedBucket)?,
        None => return Err(QueryError::MalformedBucket),
    };
    let mut bucket = Bucket {
        name: name.clone(),
        label: name,
        ..Default::default()
    };

    match (arity, args.next(), args.next(), args.next()) {
        (2, Some(Arg::Anchor(Anchor { anchor, value })), None, None) => {
            bucket.anchor = Some(anchor);
            let mut values = value.into_iter();
            match (values.next(), values.next(), values.next()) {
                (Some(v1), Some(v2), None) => two_value_bounds(&mut bucket, v1, v2)?,
                (Some(v1), Some(cmp), Some(v2)) => {
                    three_value_bounds(&mut bucket, None, v1, &cmp, None, v2)?
                }
                _ => return Err(QueryError::MalformedBucket),
            }
            Ok(FacetBucket::Computed(bucket))
        }
        (3, Some(a), Some(b), None) => {
            let v1 = a.into_scalar("bucket").map_err(|_| QueryError::MalformedBucket)?;
            let v2 = b.into_scalar("bucket").map_err(|_| QueryError::MalformedBucket)?;
            two_value_bounds(&mut bucket, v1, v2)?;
            Ok(FacetBucket::Literal(bucket))
        }
        (4, Some(a), Some(cmp), Some(b)) => {
            let (anchor1, v1) = bound(a)?;
            let cmp = cmp.into_scalar("bucket").map_err(|_| QueryError::MalformedBucket)?;
            let (anchor2, v2) = bound(b)?;
            let computed = anchor1.is_some() || anchor2.is_some();
            three_value_bounds(&mut bucket, anchor1, v1, &cmp, anchor2, v2)?;
            Ok(if computed {
                FacetBucket::Computed(bucket)
            } else {
                FacetBucket::Literal(bucket)
            })
        }
        _ => Err(QueryError::MalformedBucket),
    }
}

enum Source {
    Index(IndexedName),
    Collection,
}

fn source(arg: Arg) -> std::result::Result<Source, Arg> {
    match arg {
        Arg::Text(name) => Ok(Source::Index(IndexedName::JsonProperty(name))),
        Arg::Index(index) => Ok(Source::Index(index)),
        Arg::Query(Query::Index(IndexDeclaration::Collection(()))) => Ok(Source::Collection),
        other => Err(other),
    }
}

/// Calculates a facet over an index.
///
/// The first argument is the facet name or its source index. A name may be
/// followed by the source: a property name, an indexed name, or
/// [`collection`](crate::collection) with no arguments. Then, in any order:
/// a [`datatype`](crate::datatype), [`facet_options`], a
/// [`calculate_function`], and [`bucket`]s.
///
/// Without a source the facet reads the property with the facet's name;
/// without a name the facet is named after its source.
pub fn facet(args: Vec<Arg>) -> Result<Facet> {
    let mut args = as_args(args).into_iter().peekable();
    let mut name = None;
    let mut src = None;
    match args.next() {
        Some(Arg::Text(n)) => name = Some(n),
        Some(other) => match source(other) {
            Ok(s) => src = Some(s),
            Err(other) => return Err(QueryError::unrecognized("facet", other)),
        },
        None => return Err(QueryError::arity("facet", "missing facet name or index")),
    }

    if name.is_some()
        && matches!(
            args.peek(),
            Some(
                Arg::Text(_)
                    | Arg::Index(_)
                    | Arg::Query(Query::Index(IndexDeclaration::Collection(())))
            )
        )
    {
        src = args.next().and_then(|arg| source(arg).ok());
    }

    let mut datatype = None;
    let mut facet_option = None;
    let mut functions = None;
    let mut buckets = Vec::new();
    let mut computed = Vec::new();
    for arg in args {
        match arg {
            Arg::Datatype(dt) if datatype.is_none() => datatype = Some(dt),
            Arg::FacetOptions(o) if facet_option.is_none() => facet_option = Some(o),
            Arg::CalculateFunction(f) if functions.is_none() => functions = Some(f),
            Arg::Bucket(b) => buckets.push(b),
            Arg::ComputedBucket(b) => computed.push(b),
            other => return Err(QueryError::unrecognized("facet", other)),
        }
    }

    let src = match (src, &name) {
        (Some(src), _) => src,
        (None, Some(name)) => Source::Index(IndexedName::JsonProperty(name.clone())),
        (None, None) => return Err(QueryError::arity("facet", "missing facet name or index")),
    };
    let name = match (name, &src) {
        (Some(name), _) => name,
        (None, Source::Index(index)) => {
            let derived = index.require_constraint_name()?;
            debug!(name = %derived, "derived facet name");
            derived
        }
        (None, Source::Collection) => {
            return Err(QueryError::MissingConstraintName { index: "collection" })
        }
    };

    let kind = match (src, functions) {
        (Source::Collection, _) => FacetKind::Collection(CollectionFacet {
            facet: true,
            facet_option,
        }),
        (Source::Index(_), Some(functions)) => FacetKind::Custom(CustomFacet {
            facet: true,
            start_facet: functions.start_facet,
            finish_facet: functions.finish_facet,
            facet_option,
        }),
        (Source::Index(index), None) => {
            let (datatype, collation) = match datatype {
                Some(dt) => (Some(dt.datatype), dt.collation),
                None => (None, None),
            };
            FacetKind::Range(RangeFacet {
                facet: true,
                datatype,
                collation,
                index: IndexFields::of(&index),
                bucket: (!buckets.is_empty()).then_some(buckets),
                computed_bucket: (!computed.is_empty()).then_some(computed),
                facet_option,
            })
        }
    };
    Ok(Facet { name, kind })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::combinators::collection;
    use crate::index::{attribute, field};
    use crate::op::datatype;
    use serde_json::json;

    #[test]
    fn literal_bucket_forms() {
        let FacetBucket::Literal(b) = bucket(args!["low", 1, "<", 10]).unwrap() else {
            panic!("expected literal bucket");
        };
        assert_eq!(
            serde_json::to_value(&b).unwrap(),
            json!({"name": "low", "label": "low", "ge": 1, "lt": 10})
        );

        let FacetBucket::Literal(b) = bucket(args!["high", 10, ">", 1]).unwrap() else {
            panic!("expected literal bucket");
        };
        assert_eq!(b.lt, Some(Scalar::from(10)));
        assert_eq!(b.ge, Some(Scalar::from(1)));

        let FacetBucket::Literal(b) = bucket(args!["under", "<", 5]).unwrap() else {
            panic!("expected literal bucket");
        };
        assert_eq!(
            serde_json::to_value(&b).unwrap(),
            json!({"name": "under", "label": "under", "lt": 5})
        );

        let FacetBucket::Literal(b) = bucket(args!["over", 5, "<"]).unwrap() else {
            panic!("expected literal bucket");
        };
        assert_eq!(b.ge, Some(Scalar::from(5)));
    }

    #[test]
    fn anchored_bucket_is_computed() {
        let a = anchor(args!["now", "-P1D", "<", "P0D"]).unwrap();
        let FacetBucket::Computed(b) = bucket(args!["today", a]).unwrap() else {
            panic!("expected computed bucket");
        };
        assert_eq!(
            serde_json::to_value(&b).unwrap(),
            json!({
                "name": "today", "label": "today", "anchor": "now",
                "ge": "-P1D", "lt": "P0D"
            })
        );

        let a = anchor(args!["now", "<", "-P1Y"]).unwrap();
        let FacetBucket::Computed(b) = bucket(args!["older", a]).unwrap() else {
            panic!("expected computed bucket");
        };
        assert_eq!(b.lt, Some(Scalar::from("-P1Y")));
    }

    #[test]
    fn four_argument_bucket_with_anchors() {
        let lower = anchor(args!["start-of-year", "P0D"]).unwrap();
        let upper = anchor(args!["now", "P0D"]).unwrap();
        let FacetBucket::Computed(b) = bucket(args!["ytd", lower, "<", upper]).unwrap() else {
            panic!("expected computed bucket");
        };
        assert_eq!(
            serde_json::to_value(&b).unwrap(),
            json!({
                "name": "ytd", "label": "ytd",
                "ge": "P0D", "ge-anchor": "start-of-year",
                "lt": "P0D", "lt-anchor": "now"
            })
        );
    }

    #[test]
    fn malformed_buckets() {
        assert!(matches!(bucket(args!["x"]).unwrap_err(), QueryError::MalformedBucket));
        assert!(matches!(bucket(args![]).unwrap_err(), QueryError::MalformedBucket));
        assert!(matches!(
            bucket(args!["x", 1, 2]).unwrap_err(),
            QueryError::MalformedBucket
        ));
        assert!(matches!(
            bucket(args!["x", 1, "=", 2]).unwrap_err(),
            QueryError::MalformedBucket
        ));
    }

    #[test]
    fn anchor_arity() {
        assert!(anchor(args!["now"]).is_err());
        assert!(anchor(args!["now", 1, 2, 3, 4]).is_err());
    }

    #[test]
    fn facet_by_name_reads_property() {
        let f = facet(args!["rating", datatype("int").unwrap()]).unwrap();
        assert_eq!(
            serde_json::to_value(&f).unwrap(),
            json!({"name": "rating", "range": {
                "facet": true, "type": "xs:int", "json-property": "rating"
            }})
        );
    }

    #[test]
    fn facet_name_then_index() {
        let f = facet(args!["cost", field("price"), facet_options(["limit=5"]).unwrap()]).unwrap();
        assert_eq!(
            serde_json::to_value(&f).unwrap(),
            json!({"name": "cost", "range": {
                "facet": true, "field": "price", "facet-option": ["limit=5"]
            }})
        );
    }

    #[test]
    fn facet_over_collection() {
        let f = facet(args!["coll", collection(args![]).unwrap()]).unwrap();
        assert_eq!(
            serde_json::to_value(&f).unwrap(),
            json!({"name": "coll", "collection": {"facet": true}})
        );
    }

    #[test]
    fn custom_facet() {
        let f = facet(args!["decades", calculate_function("decades.xqy").unwrap()]).unwrap();
        assert_eq!(
            serde_json::to_value(&f).unwrap(),
            json!({"name": "decades", "custom": {
                "facet": true,
                "start-facet": {
                    "apply": "start-facet",
                    "ns": "http://marklogic.com/query/custom/decades",
                    "at": "/ext/marklogic/query/custom/decades.xqy"
                },
                "finish-facet": {
                    "apply": "finish-facet",
                    "ns": "http://marklogic.com/query/custom/decades",
                    "at": "/ext/marklogic/query/custom/decades.xqy"
                }
            }})
        );
    }

    #[test]
    fn facet_with_buckets() {
        let f = facet(args![
            "price",
            bucket(args!["cheap", "<", 10]).unwrap(),
            bucket(args!["dear", 10, "<"]).unwrap()
        ])
        .unwrap();
        let v = serde_json::to_value(&f).unwrap();
        assert_eq!(v["range"]["bucket"].as_array().map(Vec::len), Some(2));
        assert!(v["range"].get("computed-bucket").is_none());
    }

    #[test]
    fn facet_name_derived_from_index() {
        let f = facet(args![field("genre")]).unwrap();
        assert_eq!(f.name, "genre");
        let err = facet(args![attribute(args!["a", "b"]).unwrap()]).unwrap_err();
        assert!(matches!(err, QueryError::MissingConstraintName { .. }));
    }

    #[test]
    fn facet_round_trip() {
        let f = facet(args!["rating", datatype("int").unwrap()]).unwrap();
        let encoded = serde_json::to_string(&f).unwrap();
        let decoded: Facet = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, f);
    }

    #[test]
    fn facet_options_require_one() {
        assert!(facet_options(Vec::<String>::new()).is_err());
    }
}
