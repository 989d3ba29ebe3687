//! The query document node types.
//!
//! Every node serializes to exactly the JSON the search endpoint expects, so
//! the types double as the wire format. A [`Query`] is one of four shapes:
//!
//! - a [`StructuredQuery`], a criteria node such as `{"and-query": {...}}`
//! - a named [`Constraint`] for a parsed query string, `{"name": ..., "range": {...}}`
//! - a [`DefaultBinding`] for untagged search terms, `{"default": {...}}`
//! - a bare [`IndexDeclaration`], `{"collection": null}`, consumed by facets
//!
//! Nodes own their children. Building a query never aliases, so a finished
//! document can be cloned, edited, and serialized independently.

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};
use crate::geo::GeoSpec;
use crate::index::IndexFields;
use crate::module::ModuleRef;
use crate::op::RangeOperator;
use crate::value::{Number, Scalar};

/// A node of the query document.
///
/// Deserialization tries each shape in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Query {
    Structured(StructuredQuery),
    Constraint(Constraint),
    Default(DefaultBinding),
    Index(IndexDeclaration),
}

impl Query {
    /// Returns the criteria node, if this is one.
    pub fn as_structured(&self) -> Option<&StructuredQuery> {
        match self {
            Query::Structured(q) => Some(q),
            _ => None,
        }
    }

    /// Returns the constraint name this node binds, if any.
    pub fn constraint_name(&self) -> Option<&str> {
        match self {
            Query::Constraint(c) => Some(&c.name),
            _ => None,
        }
    }

    pub(crate) fn into_structured(self, combinator: &'static str) -> Result<StructuredQuery> {
        match self {
            Query::Structured(q) => Ok(q),
            other => Err(QueryError::unrecognized(combinator, other)),
        }
    }
}

impl From<StructuredQuery> for Query {
    fn from(query: StructuredQuery) -> Self {
        Query::Structured(query)
    }
}

impl From<Constraint> for Query {
    fn from(constraint: Constraint) -> Self {
        Query::Constraint(constraint)
    }
}

impl From<DefaultBinding> for Query {
    fn from(binding: DefaultBinding) -> Self {
        Query::Default(binding)
    }
}

impl From<IndexDeclaration> for Query {
    fn from(index: IndexDeclaration) -> Self {
        Query::Index(index)
    }
}

/// A criteria node, keyed by its query kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StructuredQuery {
    #[serde(rename = "and-query")]
    And(AndQuery),
    #[serde(rename = "or-query")]
    Or(OrQuery),
    #[serde(rename = "not-query")]
    Not(Box<Query>),
    #[serde(rename = "and-not-query")]
    AndNot(AndNotQuery),
    #[serde(rename = "not-in-query")]
    NotIn(AndNotQuery),
    #[serde(rename = "boost-query")]
    Boost(BoostQuery),
    #[serde(rename = "near-query")]
    Near(NearQuery),
    #[serde(rename = "term-query")]
    Term(TermQuery),
    #[serde(rename = "word-query")]
    Word(TextSpec),
    #[serde(rename = "value-query")]
    Value(TextSpec),
    #[serde(rename = "range-query")]
    Range(RangeSpec),
    #[serde(rename = "collection-query")]
    Collection(UriList),
    #[serde(rename = "directory-query")]
    Directory(DirectoryQuery),
    #[serde(rename = "document-query")]
    Document(UriList),
    #[serde(rename = "document-fragment-query")]
    DocumentFragment(Box<Query>),
    #[serde(rename = "properties-query")]
    Properties(Box<Query>),
    #[serde(rename = "locks-fragment-query")]
    LocksFragment(Box<Query>),
    #[serde(rename = "container-query")]
    Container(ContainerQuery),
    #[serde(rename = "geo-attr-pair-query")]
    GeoAttrPair(GeoSpec),
    #[serde(rename = "geo-elem-query")]
    GeoElem(GeoSpec),
    #[serde(rename = "geo-elem-pair-query")]
    GeoElemPair(GeoSpec),
    #[serde(rename = "geo-json-property-query")]
    GeoJsonProperty(GeoSpec),
    #[serde(rename = "geo-json-property-pair-query")]
    GeoJsonPropertyPair(GeoSpec),
    #[serde(rename = "geo-path-query")]
    GeoPath(GeoSpec),
    #[serde(rename = "lsqt-query")]
    Lsqt(LsqtQuery),
    #[serde(rename = "period-compare-query")]
    PeriodCompare(PeriodCompareQuery),
    #[serde(rename = "period-range-query")]
    PeriodRange(PeriodRangeQuery),
}

/// Restricts matching to documents or their properties fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentScope {
    Documents,
    Properties,
}

/// Parses a fragment scope name: `documents` or `properties`.
pub fn fragment_scope(scope: &str) -> Result<FragmentScope> {
    match scope {
        "documents" => Ok(FragmentScope::Documents),
        "properties" => Ok(FragmentScope::Properties),
        other => Err(QueryError::unrecognized("fragment_scope", other)),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AndQuery {
    pub queries: Vec<Query>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordered: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrQuery {
    pub queries: Vec<Query>,
}

/// Shared shape of `and-not-query` and `not-in-query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AndNotQuery {
    pub positive_query: Box<Query>,
    pub negative_query: Box<Query>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BoostQuery {
    pub matching_query: Box<Query>,
    pub boosting_query: Box<Query>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NearQuery {
    pub queries: Vec<Query>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordered: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<Number>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TermQuery {
    pub text: Vec<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Number>,
}

/// Body of a word or value query, or of a word or value constraint when
/// `text` is absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TextSpec {
    #[serde(flatten)]
    pub index: IndexFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment_scope: Option<FragmentScope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term_option: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Vec<Scalar>>,
}

/// Body of a range query, or of a range constraint when `value` is absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RangeSpec {
    #[serde(flatten)]
    pub index: IndexFields,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment_scope: Option<FragmentScope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_option: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Vec<Scalar>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_operator: Option<RangeOperator>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UriList {
    pub uri: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectoryQuery {
    pub uri: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infinite: Option<bool>,
}

/// Matches a query inside a JSON property or XML element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ContainerQuery {
    #[serde(flatten)]
    pub index: IndexFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment_scope: Option<FragmentScope>,
    #[serde(flatten)]
    pub query: Box<StructuredQuery>,
}

/// A container constraint: the scope without a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ContainerSpec {
    #[serde(flatten)]
    pub index: IndexFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment_scope: Option<FragmentScope>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LsqtQuery {
    pub temporal_collection: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporal_option: Option<Vec<String>>,
}

/// A span of time on a temporal axis. A period without an end is a
/// single instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Period {
    pub period_start: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PeriodCompareQuery {
    pub axis1: String,
    pub temporal_operator: String,
    pub axis2: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporal_option: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PeriodRangeQuery {
    pub axis: Vec<String>,
    pub temporal_operator: String,
    pub period: Vec<Period>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporal_option: Option<Vec<String>>,
}

/// A constraint bound to a name that a parsed query string can reference,
/// as in `rating:5`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub name: String,
    #[serde(flatten)]
    pub spec: ConstraintSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConstraintSpec {
    Range(RangeSpec),
    Word(TextSpec),
    Value(TextSpec),
    Collection(CollectionConstraint),
    Container(ContainerSpec),
    GeoAttrPair(GeoSpec),
    GeoElem(GeoSpec),
    GeoElemPair(GeoSpec),
    GeoJsonProperty(GeoSpec),
    GeoJsonPropertyPair(GeoSpec),
    GeoPath(GeoSpec),
    Custom(CustomConstraint),
}

/// A collection constraint. The prefix is stripped from collection URIs
/// when they are matched against search terms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionConstraint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

/// A constraint whose search terms are parsed by a server-side library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CustomConstraint {
    pub parse: ModuleRef,
    pub facet: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term_option: Option<Vec<String>>,
}

/// A word, value, or range query used for untagged search terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultBinding {
    pub default: DefaultSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultSpec {
    Range(RangeSpec),
    Word(TextSpec),
    Value(TextSpec),
}

/// An index named without criteria, for use as a facet source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IndexDeclaration {
    /// The collection lexicon. Written as `{"collection": null}`.
    Collection(()),
    GeoAttrPair(GeoSpec),
    GeoElem(GeoSpec),
    GeoElemPair(GeoSpec),
    GeoJsonProperty(GeoSpec),
    GeoJsonPropertyPair(GeoSpec),
    GeoPath(GeoSpec),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{property, IndexFields};
    use serde_json::json;

    fn word_on(name: &str, text: &str) -> Query {
        Query::Structured(StructuredQuery::Word(TextSpec {
            index: IndexFields::of(&property(name)),
            text: Some(vec![Scalar::from(text)]),
            ..Default::default()
        }))
    }

    #[test]
    fn criteria_nodes_are_keyed_by_kind() {
        let query = word_on("title", "moby");
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({"word-query": {"json-property": "title", "text": ["moby"]}})
        );
    }

    #[test]
    fn constraint_flattens_name_and_kind() {
        let query = Query::Constraint(Constraint {
            name: "rating".into(),
            spec: ConstraintSpec::Range(RangeSpec {
                index: IndexFields::of(&property("rating")),
                datatype: Some("xs:int".into()),
                ..Default::default()
            }),
        });
        let encoded = serde_json::to_value(&query).unwrap();
        assert_eq!(
            encoded,
            json!({"name": "rating", "range": {"json-property": "rating", "type": "xs:int"}})
        );
        let decoded: Query = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, query);
    }

    #[test]
    fn collection_declaration_is_null() {
        let query = Query::Index(IndexDeclaration::Collection(()));
        let encoded = serde_json::to_value(&query).unwrap();
        assert_eq!(encoded, json!({"collection": null}));
        let decoded: Query = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, query);
    }

    #[test]
    fn default_binding_shape() {
        let query = Query::Default(DefaultBinding {
            default: DefaultSpec::Word(TextSpec {
                index: IndexFields::of(&property("body")),
                ..Default::default()
            }),
        });
        let encoded = serde_json::to_value(&query).unwrap();
        assert_eq!(encoded, json!({"default": {"word": {"json-property": "body"}}}));
        let decoded: Query = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, query);
    }

    #[test]
    fn container_query_merges_scope_and_query() {
        let inner = match word_on("name", "x") {
            Query::Structured(q) => q,
            _ => unreachable!(),
        };
        let query = Query::Structured(StructuredQuery::Container(ContainerQuery {
            index: IndexFields::of(&property("address")),
            fragment_scope: Some(FragmentScope::Documents),
            query: Box::new(inner),
        }));
        let encoded = serde_json::to_value(&query).unwrap();
        assert_eq!(
            encoded,
            json!({"container-query": {
                "json-property": "address",
                "fragment-scope": "documents",
                "word-query": {"json-property": "name", "text": ["x"]}
            }})
        );
        let decoded: Query = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, query);
    }

    #[test]
    fn nested_queries_round_trip() {
        let query = Query::Structured(StructuredQuery::And(AndQuery {
            queries: vec![
                word_on("a", "x"),
                Query::Structured(StructuredQuery::Not(Box::new(word_on("b", "y")))),
            ],
            ordered: Some(true),
        }));
        let encoded = serde_json::to_string(&query).unwrap();
        let decoded: Query = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, query);
    }

    #[test]
    fn fragment_scope_names() {
        assert_eq!(fragment_scope("documents").unwrap(), FragmentScope::Documents);
        assert_eq!(fragment_scope("properties").unwrap(), FragmentScope::Properties);
        assert!(fragment_scope("locks").is_err());
    }
}
