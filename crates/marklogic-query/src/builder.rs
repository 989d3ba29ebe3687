//! The built query: a search request assembled from clauses.
//!
//! [`BuiltQuery`] holds five independent clauses. Each setter overwrites its
//! own clause and nothing else, so the calls can come in any order:
//!
//! ```
//! use marklogic_query::{args, property, range, word, BuiltQuery};
//!
//! let query = BuiltQuery::new()
//!     .where_(args![
//!         word(args!["title", "moby"]).unwrap(),
//!         range(args![property("rating"), ">=", 4]).unwrap(),
//!     ])
//!     .unwrap()
//!     .order_by(args!["rating"])
//!     .unwrap()
//!     .slice(args![1, 20])
//!     .unwrap();
//!
//! let document = query.to_json().unwrap();
//! assert_eq!(document["sliceClause"]["page-length"], 20);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::arg::{as_args, flatten_args, Arg};
use crate::combinators::and;
use crate::error::{QueryError, Result};
use crate::facet::Facet;
use crate::index::IndexFields;
use crate::options::WithOptions;
use crate::ordering::{Direction, SortSpec};
use crate::parse::ParsedQuery;
use crate::query::{FragmentScope, Query};
use crate::results::{Extract, Snippet, Transform};

/// A query-by-example document: criteria written as an example of the
/// documents to match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryByExample {
    #[serde(rename = "$query")]
    pub query: Value,
}

/// Builds a query-by-example document.
///
/// No arguments gives an empty example. A single example is wrapped unless
/// it already carries `$query`; several examples become a list.
pub fn by_example(args: Vec<Arg>) -> Result<QueryByExample> {
    let mut args = as_args(args);
    match args.len() {
        0 => Ok(QueryByExample {
            query: Value::Array(Vec::new()),
        }),
        1 => match args.remove(0) {
            Arg::ByExample(qbe) => Ok(qbe),
            Arg::Json(Value::Object(mut example)) if example.contains_key("$query") => {
                Ok(QueryByExample {
                    query: example.remove("$query").unwrap_or(Value::Null),
                })
            }
            other => Ok(QueryByExample {
                query: other.into_json("by_example")?,
            }),
        },
        _ => Ok(QueryByExample {
            query: Value::Array(
                args.into_iter()
                    .map(|arg| arg.into_json("by_example"))
                    .collect::<Result<_>>()?,
            ),
        }),
    }
}

/// The implicit AND of a structured where clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryList {
    pub queries: Vec<Query>,
}

/// The criteria of a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WhereClause {
    ByExample(QueryByExample),
    Structured(StructuredWhere),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredWhere {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<QueryList>,
    #[serde(rename = "parsedQuery", default, skip_serializing_if = "Option::is_none")]
    pub parsed_query: Option<ParsedQuery>,
    #[serde(rename = "fragment-scope", default, skip_serializing_if = "Option::is_none")]
    pub fragment_scope: Option<FragmentScope>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculateClause {
    pub constraint: Vec<Facet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderByClause {
    #[serde(rename = "sort-order")]
    pub sort_order: Vec<SortSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SliceClause {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_start: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform_results: Option<Snippet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract_document_data: Option<Extract>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_transform: Option<Transform>,
}

/// How the where clause is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Structured,
    Qbe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryFormat {
    #[default]
    Json,
}

/// A search request assembled from clauses.
///
/// The serialized form is the request document:
/// ```text
/// { whereClause?, calculateClause?, orderByClause?, sliceClause?,
///   withOptionsClause?, queryType?, queryFormat? }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuiltQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    where_clause: Option<WhereClause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    calculate_clause: Option<CalculateClause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    order_by_clause: Option<OrderByClause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    slice_clause: Option<SliceClause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    with_options_clause: Option<WithOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    query_type: Option<QueryType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    query_format: Option<QueryFormat>,
}

impl BuiltQuery {
    /// Creates an empty query. An empty query has no clauses.
    pub fn new() -> Self {
        BuiltQuery::default()
    }

    // ========================================================================
    // Clause setters
    // ========================================================================

    /// Sets the criteria.
    ///
    /// - no arguments: matches every document (an empty `and`)
    /// - one [`by_example`] document: query-by-example mode
    /// - otherwise structured mode: queries are ANDed together, with an
    ///   optional [`fragment_scope`](crate::fragment_scope) and at most one
    ///   [`parsed_from`](crate::parsed_from) search string
    pub fn where_(mut self, args: Vec<Arg>) -> Result<Self> {
        let args = as_args(args);

        if args.len() == 1 {
            let qbe = match &args[0] {
                Arg::ByExample(qbe) => Some(qbe.clone()),
                Arg::Json(Value::Object(example)) if example.contains_key("$query") => {
                    Some(by_example(args.clone())?)
                }
                _ => None,
            };
            if let Some(qbe) = qbe {
                debug!(clause = "where", mode = "qbe", "setting clause");
                self.where_clause = Some(WhereClause::ByExample(qbe));
                self.query_type = Some(QueryType::Qbe);
                self.query_format = Some(QueryFormat::Json);
                return Ok(self);
            }
        }

        let mut clause = StructuredWhere::default();
        let mut queries = Vec::new();
        for arg in flatten_args(args) {
            match arg {
                Arg::Parsed(p) if clause.parsed_query.is_none() => clause.parsed_query = Some(p),
                Arg::FragmentScope(s) if clause.fragment_scope.is_none() => {
                    clause.fragment_scope = Some(s)
                }
                other => queries.push(other.into_query("where")?),
            }
        }
        if !queries.is_empty() {
            clause.query = Some(QueryList { queries });
        } else if clause.parsed_query.is_none() {
            clause.query = Some(QueryList {
                queries: vec![and(Vec::new())?],
            });
        }

        debug!(
            clause = "where",
            mode = if clause.parsed_query.is_some() { "parsed" } else { "structured" },
            "setting clause"
        );
        self.where_clause = Some(WhereClause::Structured(clause));
        self.query_type = Some(QueryType::Structured);
        self.query_format = Some(QueryFormat::Json);
        Ok(self)
    }

    /// Sets the facets to calculate.
    pub fn calculate(mut self, args: Vec<Arg>) -> Result<Self> {
        let constraint = flatten_args(as_args(args))
            .into_iter()
            .map(|arg| match arg {
                Arg::Facet(facet) => Ok(facet),
                other => Err(QueryError::unrecognized("calculate", other)),
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(clause = "calculate", facets = constraint.len(), "setting clause");
        self.calculate_clause = Some(CalculateClause { constraint });
        Ok(self)
    }

    /// Sets the sort order.
    ///
    /// A string sorts ascending by the property of that name; [`sort`] specs
    /// and [`score`] pass through.
    ///
    /// [`sort`]: crate::sort
    /// [`score`]: crate::score
    pub fn order_by(mut self, args: Vec<Arg>) -> Result<Self> {
        let sort_order = flatten_args(as_args(args))
            .into_iter()
            .map(|arg| match arg {
                Arg::Text(name) => Ok(SortSpec {
                    index: IndexFields {
                        json_property: Some(name),
                        ..Default::default()
                    },
                    direction: Some(Direction::Ascending),
                    ..Default::default()
                }),
                Arg::Sort(spec) => Ok(spec),
                Arg::Score(method) => Ok(SortSpec {
                    score: Some(method),
                    ..Default::default()
                }),
                other => Err(QueryError::unrecognized("order_by", other)),
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(clause = "order_by", keys = sort_order.len(), "setting clause");
        self.order_by_clause = Some(OrderByClause { sort_order });
        Ok(self)
    }

    /// Sets the page of results and how each result is shaped.
    ///
    /// The first number is the 1-based page start and the second the page
    /// length. A start of `0` with no length returns no documents, only
    /// facets and metrics. A [`snippet`](crate::snippet),
    /// [`extract`](crate::extract), or [`transform`](crate::transform) can
    /// appear anywhere.
    pub fn slice(mut self, args: Vec<Arg>) -> Result<Self> {
        let mut clause = SliceClause::default();
        let mut start = None;
        let mut length = None;
        for (position, arg) in as_args(args).into_iter().enumerate() {
            match arg {
                Arg::Number(n) if position < 2 => {
                    let n = n
                        .as_u64()
                        .ok_or_else(|| QueryError::unrecognized("slice", n))?;
                    if position == 0 {
                        start = Some(n);
                    } else {
                        length = Some(n);
                    }
                }
                Arg::Snippet(s) => clause.transform_results = Some(s),
                Arg::Extract(e) => clause.extract_document_data = Some(e),
                Arg::Transform(t) => clause.document_transform = Some(t),
                other => return Err(QueryError::unrecognized("slice", other)),
            }
        }

        if let Some(start) = start {
            if length != Some(0) {
                if start == 0 && length.is_none() {
                    clause.page_length = Some(0);
                } else {
                    clause.page_start = Some(start);
                }
            }
        }
        if length.is_some() {
            clause.page_length = length;
        }

        debug!(clause = "slice", ?start, ?length, "setting clause");
        self.slice_clause = Some(clause);
        Ok(self)
    }

    /// Sets request options from a configuration object. Unrecognized keys
    /// are dropped.
    pub fn with_options(mut self, config: Map<String, Value>) -> Result<Self> {
        let options = WithOptions::from_config(config)?;
        debug!(clause = "with_options", "setting clause");
        self.with_options_clause = Some(options);
        Ok(self)
    }

    // ========================================================================
    // Copying
    // ========================================================================

    /// Copies the clauses of another query. The copy shares nothing with
    /// the original.
    pub fn copy_from(other: &BuiltQuery) -> Self {
        let mut copy = BuiltQuery {
            where_clause: other.where_clause.clone(),
            calculate_clause: other.calculate_clause.clone(),
            order_by_clause: other.order_by_clause.clone(),
            slice_clause: other.slice_clause.clone(),
            with_options_clause: other.with_options_clause.clone(),
            query_type: None,
            query_format: None,
        };
        copy.derive_query_type();
        copy
    }

    /// Reads a query from its serialized request document.
    pub fn copy_from_str(document: &str) -> Result<Self> {
        let parsed: BuiltQuery = serde_json::from_str(document)?;
        Ok(BuiltQuery::copy_from(&parsed))
    }

    fn derive_query_type(&mut self) {
        self.query_type = self.where_clause.as_ref().map(|w| match w {
            WhereClause::ByExample(_) => QueryType::Qbe,
            WhereClause::Structured(_) => QueryType::Structured,
        });
        self.query_format = self.where_clause.as_ref().map(|_| QueryFormat::Json);
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn where_clause(&self) -> Option<&WhereClause> {
        self.where_clause.as_ref()
    }

    /// Mutable access to the criteria, for editing a copy in place.
    pub fn where_clause_mut(&mut self) -> Option<&mut WhereClause> {
        self.where_clause.as_mut()
    }

    pub fn calculate_clause(&self) -> Option<&CalculateClause> {
        self.calculate_clause.as_ref()
    }

    pub fn order_by_clause(&self) -> Option<&OrderByClause> {
        self.order_by_clause.as_ref()
    }

    pub fn slice_clause(&self) -> Option<&SliceClause> {
        self.slice_clause.as_ref()
    }

    pub fn with_options_clause(&self) -> Option<&WithOptions> {
        self.with_options_clause.as_ref()
    }

    pub fn query_type(&self) -> Option<QueryType> {
        self.query_type
    }

    pub fn query_format(&self) -> Option<QueryFormat> {
        self.query_format
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    /// Returns the request document.
    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Returns the request document as a JSON string.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Starts a query with criteria. See [`BuiltQuery::where_`].
pub fn where_(args: Vec<Arg>) -> Result<BuiltQuery> {
    BuiltQuery::new().where_(args)
}

/// Starts a query with facets. See [`BuiltQuery::calculate`].
pub fn calculate(args: Vec<Arg>) -> Result<BuiltQuery> {
    BuiltQuery::new().calculate(args)
}

/// Starts a query with a sort order. See [`BuiltQuery::order_by`].
pub fn order_by(args: Vec<Arg>) -> Result<BuiltQuery> {
    BuiltQuery::new().order_by(args)
}

/// Starts a query with a page. See [`BuiltQuery::slice`].
pub fn slice(args: Vec<Arg>) -> Result<BuiltQuery> {
    BuiltQuery::new().slice(args)
}

/// Starts a query with request options. See [`BuiltQuery::with_options`].
pub fn with_options(config: Map<String, Value>) -> Result<BuiltQuery> {
    BuiltQuery::new().with_options(config)
}
