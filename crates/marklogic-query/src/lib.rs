//! Fluent construction of structured search requests.
//!
//! This crate builds the JSON request documents a document database's
//! search endpoint accepts. It does not talk to a server: every function is
//! a pure constructor from loose arguments to a serializable value.
//!
//! - Query combinators: `and`, `or`, `near`, `word`, `range`, geospatial
//!   and temporal queries, and more
//! - Indexed names: JSON properties, elements, attributes, fields, paths
//! - Parsed-query bindings: named constraints for search strings
//! - Facets with literal and computed buckets
//! - A [`BuiltQuery`] assembling where, calculate, order-by, slice, and
//!   options clauses into one document
//!
//! # Quick Start
//!
//! ```rust
//! use marklogic_query::{args, bind, facet, parse_bindings, parsed_from, range, where_, word};
//! use serde_json::json;
//!
//! let query = where_(args![parsed_from(args![
//!     "stars:5 moby",
//!     parse_bindings(args![
//!         range(args!["rating", "xs:int", bind("stars")]).unwrap(),
//!         word(args!["body", marklogic_query::bind_default()]).unwrap(),
//!     ])
//!     .unwrap(),
//! ])
//! .unwrap()])
//! .unwrap()
//! .calculate(args![facet(args!["rating"]).unwrap()])
//! .unwrap();
//!
//! let document = query.to_json().unwrap();
//! assert_eq!(document["queryType"], json!("structured"));
//! assert_eq!(document["calculateClause"]["constraint"][0]["name"], json!("rating"));
//! ```
//!
//! # Arguments
//!
//! Combinators take a `Vec<Arg>`, usually written with [`args!`]. An
//! argument's shape decides which slot it fills: a string names a JSON
//! property where an index is expected, a [`weight`] or a [`bind`] claims
//! that slot, and whatever is left is criteria. A single list argument is
//! treated as the whole list.
//!
//! # Query Forms
//!
//! Index-based combinators produce one of three forms:
//!
//! ```text
//! criteria given         -> a query          {"word-query": {...}}
//! bind("name") given     -> a constraint     {"name": ..., "word": {...}}
//! bind_default() given   -> a default term   {"default": {"word": {...}}}
//! ```
//!
//! Supplying more than one of these is a [`QueryError::ConflictingBinding`].

mod arg;
mod builder;
mod combinators;
mod error;
mod facet;
mod geo;
mod index;
mod module;
mod op;
mod options;
mod ordering;
mod parse;
mod query;
mod results;
mod value;

// Re-export public API
pub use arg::{iso_timestamp, Arg};
pub use builder::{
    by_example, calculate, order_by, slice, where_, with_options, BuiltQuery, CalculateClause,
    OrderByClause, QueryByExample, QueryFormat, QueryList, QueryType, SliceClause,
    StructuredWhere, WhereClause,
};
pub use combinators::{
    and, and_not, boost, collection, directory, document, document_fragment, fragment_scope,
    locks_fragment, lsqt_query, near, not, not_in, or, ordered, period, period_compare,
    period_range, properties, range, range_options, scope, temporal_options, term, term_options,
    value, weight, word,
};
pub use error::{QueryError, Result};
pub use facet::{
    anchor, bucket, calculate_function, facet, facet_options, Anchor, Bucket, CollectionFacet,
    CustomFacet, CustomFacetFunctions, Facet, FacetBucket, FacetKind, RangeFacet,
};
pub use geo::{
    bounding_box, circle, geo_attribute_pair, geo_element, geo_element_pair, geo_options,
    geo_path, geo_property, geo_property_pair, heatmap, latlon, point, polygon,
    south_west_north_east, BoxBounds, Circle, GeoSpec, Heatmap, LatLon, Polygon, Region,
};
pub use index::{
    attribute, default_constraint_name, element, field, path_index, path_index_with_namespaces,
    property, qname, resolve, IndexFields, IndexedName, PathIndex, QName,
};
pub use module::{rootname, ModuleRef};
pub use op::{datatype, datatype_with_collation, known_datatype, Datatype, RangeOperator};
pub use options::{is_option, WithOptions};
pub use ordering::{score, score_with, sort, Direction, SortSpec};
pub use parse::{
    bind, bind_default, bind_empty_as, parse_bindings, parse_function, parsed_from, EmptyBinding,
    EmptyPolicy, ParseBindings, ParsedQuery, TermBinding,
};
pub use query::{
    AndNotQuery, AndQuery, BoostQuery, CollectionConstraint, Constraint, ConstraintSpec,
    ContainerQuery, ContainerSpec, CustomConstraint, DefaultBinding, DefaultSpec,
    DirectoryQuery, FragmentScope, IndexDeclaration, LsqtQuery, NearQuery, OrQuery, Period,
    PeriodCompareQuery, PeriodRangeQuery, Query, RangeSpec, StructuredQuery, TermQuery,
    TextSpec, UriList,
};
pub use results::{extract, snippet, transform, Extract, ExtractSelection, Snippet, Transform};
pub use value::{Number, Scalar};
