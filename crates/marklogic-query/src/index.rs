//! Indexed names: the JSON property, XML element or attribute, field, or
//! path index that a range, value, word, geospatial, or facet query targets.
//!
//! [`IndexedName`] is the canonical form. Every combinator that names an
//! index goes through [`resolve`], so a plain string always means a JSON
//! property. On the wire an indexed name is never a node of its own: its
//! fields are merged into the enclosing query object (see [`IndexFields`]).

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::arg::{as_args, Arg};
use crate::error::{QueryError, Result};

/// A possibly namespaced XML name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QName {
    /// Namespace URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ns: Option<String>,
    /// Local name.
    pub name: String,
}

impl QName {
    /// A name without a namespace.
    pub fn local(name: impl Into<String>) -> Self {
        QName {
            ns: None,
            name: name.into(),
        }
    }

    /// A namespaced name.
    pub fn namespaced(ns: impl Into<String>, name: impl Into<String>) -> Self {
        QName {
            ns: Some(ns.into()),
            name: name.into(),
        }
    }
}

/// A path range index: an XPath expression plus its namespace bindings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathIndex {
    /// The path expression.
    pub text: String,
    /// Prefix to namespace URI bindings used by the path. Written as an
    /// empty string when there are none.
    #[serde(
        serialize_with = "serialize_namespaces",
        deserialize_with = "deserialize_namespaces"
    )]
    pub namespaces: BTreeMap<String, String>,
}

fn serialize_namespaces<S>(
    namespaces: &BTreeMap<String, String>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if namespaces.is_empty() {
        serializer.serialize_str("")
    } else {
        namespaces.serialize(serializer)
    }
}

fn deserialize_namespaces<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Namespaces {
        Empty(String),
        Bindings(BTreeMap<String, String>),
    }

    match Namespaces::deserialize(deserializer)? {
        Namespaces::Empty(s) if s.is_empty() => Ok(BTreeMap::new()),
        Namespaces::Empty(s) => Err(serde::de::Error::custom(format!(
            "path index namespaces must be an object, got {s:?}"
        ))),
        Namespaces::Bindings(map) => Ok(map),
    }
}

/// The name of an index.
///
/// Exactly one kind of name is populated per value; an indexed name is
/// immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexedName {
    /// A JSON property.
    JsonProperty(String),
    /// An XML element, or an attribute on an element.
    Element {
        element: QName,
        attribute: Option<QName>,
    },
    /// A field configured on the database.
    Field(String),
    /// A path range index.
    PathIndex(PathIndex),
}

impl IndexedName {
    /// Returns the wire key that identifies this kind of index.
    pub fn kind(&self) -> &'static str {
        match self {
            IndexedName::JsonProperty(_) => "json-property",
            IndexedName::Element {
                attribute: Some(_), ..
            } => "element, attribute",
            IndexedName::Element { .. } => "element",
            IndexedName::Field(_) => "field",
            IndexedName::PathIndex(_) => "path-index",
        }
    }

    /// Derives a constraint name from the index.
    ///
    /// JSON properties and fields yield their name and a plain element
    /// yields its local name. Attributes and path indexes have no sensible
    /// default and yield `None`.
    pub fn default_constraint_name(&self) -> Option<&str> {
        match self {
            IndexedName::JsonProperty(name) | IndexedName::Field(name) => Some(name),
            IndexedName::Element {
                element,
                attribute: None,
            } => Some(&element.name),
            IndexedName::Element { .. } | IndexedName::PathIndex(_) => None,
        }
    }

    /// Like [`IndexedName::default_constraint_name`], failing with
    /// [`QueryError::MissingConstraintName`] when no name can be derived.
    pub fn require_constraint_name(&self) -> Result<String> {
        self.default_constraint_name()
            .map(str::to_string)
            .ok_or(QueryError::MissingConstraintName { index: self.kind() })
    }
}

/// Derives a constraint name from the index, if one can be derived.
pub fn default_constraint_name(index: &IndexedName) -> Option<&str> {
    index.default_constraint_name()
}

/// The wire fields of an indexed name, merged into an enclosing object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IndexFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_property: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<QName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<QName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_index: Option<PathIndex>,
}

impl IndexFields {
    /// The fields for any kind of index.
    pub fn of(index: &IndexedName) -> Self {
        let mut fields = IndexFields::default();
        match index {
            IndexedName::JsonProperty(name) => fields.json_property = Some(name.clone()),
            IndexedName::Element { element, attribute } => {
                fields.element = Some(element.clone());
                fields.attribute = attribute.clone();
            }
            IndexedName::Field(name) => fields.field = Some(name.clone()),
            IndexedName::PathIndex(path) => fields.path_index = Some(path.clone()),
        }
        fields
    }

    /// The fields for a container scope, which can only be a JSON property
    /// or an element. Fields and path indexes contribute nothing.
    pub fn container(index: &IndexedName) -> Self {
        match index {
            IndexedName::Field(_) | IndexedName::PathIndex(_) => IndexFields::default(),
            other => IndexFields::of(other),
        }
    }

    /// Rebuilds the indexed name these fields describe, if any.
    pub fn indexed_name(&self) -> Option<IndexedName> {
        if let Some(name) = &self.json_property {
            return Some(IndexedName::JsonProperty(name.clone()));
        }
        if let Some(element) = &self.element {
            return Some(IndexedName::Element {
                element: element.clone(),
                attribute: self.attribute.clone(),
            });
        }
        if let Some(name) = &self.field {
            return Some(IndexedName::Field(name.clone()));
        }
        self.path_index.clone().map(IndexedName::PathIndex)
    }

    /// Returns `true` if no index is named.
    pub fn is_empty(&self) -> bool {
        self.json_property.is_none()
            && self.element.is_none()
            && self.attribute.is_none()
            && self.field.is_none()
            && self.path_index.is_none()
    }
}

/// Normalizes an index argument: a string names a JSON property and an
/// indexed name passes through.
pub fn resolve(arg: Arg, combinator: &'static str) -> Result<IndexedName> {
    match arg {
        Arg::Text(name) => Ok(IndexedName::JsonProperty(name)),
        Arg::Index(index) => Ok(index),
        other => Err(QueryError::unrecognized(combinator, other)),
    }
}

/// Names a JSON property.
pub fn property(name: impl Into<String>) -> IndexedName {
    IndexedName::JsonProperty(name.into())
}

/// Names a field.
pub fn field(name: impl Into<String>) -> IndexedName {
    IndexedName::Field(name.into())
}

/// Names a path range index with no namespace bindings.
pub fn path_index(text: impl Into<String>) -> IndexedName {
    IndexedName::PathIndex(PathIndex {
        text: text.into(),
        namespaces: BTreeMap::new(),
    })
}

/// Names a path range index whose path uses namespace prefixes.
pub fn path_index_with_namespaces<I, K, V>(text: impl Into<String>, namespaces: I) -> IndexedName
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    IndexedName::PathIndex(PathIndex {
        text: text.into(),
        namespaces: namespaces
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect(),
    })
}

/// Builds a name from one argument (`name`) or two (`ns`, `name`).
pub(crate) fn ns_name(args: Vec<Arg>, combinator: &'static str) -> Result<QName> {
    let mut args = as_args(args).into_iter();
    match (args.next(), args.next(), args.next()) {
        (None, _, _) => Err(QueryError::arity(combinator, "no name")),
        (Some(name), None, _) => Ok(QName::local(name.into_text(combinator)?)),
        (Some(ns), Some(name), None) => Ok(QName::namespaced(
            ns.into_text(combinator)?,
            name.into_text(combinator)?,
        )),
        (Some(_), Some(_), Some(_)) => Err(QueryError::arity(combinator, "too many arguments")),
    }
}

/// Accepts a qname as is, or builds one from a string or `[ns, name]` list.
pub(crate) fn qname_arg(arg: Arg, combinator: &'static str) -> Result<QName> {
    match arg {
        Arg::QName(qname) => Ok(qname),
        Arg::List(parts) => ns_name(parts, combinator),
        other => ns_name(vec![other], combinator),
    }
}

/// Builds a possibly namespaced name: `qname(args!["name"])` or
/// `qname(args!["http://ns", "name"])`.
pub fn qname(args: Vec<Arg>) -> Result<QName> {
    ns_name(args, "qname")
}

/// Names an XML element.
///
/// Takes a qname, a local name, a `[ns, name]` list, or a namespace and a
/// local name as two arguments.
pub fn element(args: Vec<Arg>) -> Result<IndexedName> {
    let mut args = as_args(args);
    let element = match args.len() {
        0 => return Err(QueryError::arity("element", "missing element")),
        1 => qname_arg(args.remove(0), "element")?,
        2 => {
            let ns = args.remove(0).into_text("element")?;
            let name = args.remove(0).into_text("element")?;
            QName::namespaced(ns, name)
        }
        n => {
            return Err(QueryError::arity(
                "element",
                format!("takes a namespace and a name, got {n} arguments"),
            ))
        }
    };
    Ok(IndexedName::Element {
        element,
        attribute: None,
    })
}

/// Names an XML attribute on an element.
///
/// Accepted forms:
/// - `element, attribute`, each a qname, a local name, or a `[ns, name]` list
/// - `element-qname, attribute-ns, attribute-name`
/// - `element-ns, element-name, attribute-qname`
/// - `[element-ns, element-name], attribute-ns, attribute-name`
/// - `element-ns, element-name, attribute-name` (attribute without namespace)
/// - `element-ns, element-name, attribute-ns, attribute-name`
pub fn attribute(args: Vec<Arg>) -> Result<IndexedName> {
    let args = as_args(args);
    let (element, attribute) = match args.len() {
        0 => return Err(QueryError::arity("attribute", "missing element and attribute")),
        1 => return Err(QueryError::arity("attribute", "missing attribute")),
        2 => {
            let mut args = args.into_iter();
            let (Some(element), Some(attribute)) = (args.next(), args.next()) else {
                return Err(QueryError::arity("attribute", "missing attribute"));
            };
            (
                qname_arg(element, "attribute")?,
                qname_arg(attribute, "attribute")?,
            )
        }
        3 => {
            let mut args = args.into_iter();
            let (Some(first), Some(second), Some(third)) = (args.next(), args.next(), args.next())
            else {
                return Err(QueryError::arity("attribute", "missing attribute"));
            };
            match (first, third) {
                (Arg::QName(element), third) => (
                    element,
                    QName::namespaced(
                        second.into_text("attribute")?,
                        third.into_text("attribute")?,
                    ),
                ),
                (first, Arg::QName(attribute)) => (
                    QName::namespaced(
                        first.into_text("attribute")?,
                        second.into_text("attribute")?,
                    ),
                    attribute,
                ),
                (Arg::List(parts), third) => (
                    ns_name(parts, "attribute")?,
                    QName::namespaced(
                        second.into_text("attribute")?,
                        third.into_text("attribute")?,
                    ),
                ),
                (first, third) => (
                    QName::namespaced(
                        first.into_text("attribute")?,
                        second.into_text("attribute")?,
                    ),
                    qname_arg(third, "attribute")?,
                ),
            }
        }
        _ => {
            let mut texts = Vec::with_capacity(4);
            for arg in args.into_iter().take(4) {
                texts.push(arg.into_text("attribute")?);
            }
            let mut texts = texts.into_iter();
            let mut next = || texts.next().unwrap_or_default();
            let element = QName::namespaced(next(), next());
            let attribute = QName::namespaced(next(), next());
            (element, attribute)
        }
    };
    Ok(IndexedName::Element {
        element,
        attribute: Some(attribute),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use serde_json::json;

    #[test]
    fn plain_string_resolves_to_property() {
        let index = resolve(Arg::from("title"), "test").unwrap();
        assert_eq!(index, property("title"));
    }

    #[test]
    fn indexed_name_passes_through() {
        let index = resolve(Arg::from(field("summary")), "test").unwrap();
        assert_eq!(index, IndexedName::Field("summary".into()));
    }

    #[test]
    fn resolve_rejects_other_shapes() {
        let err = resolve(Arg::from(5), "range").unwrap_err();
        assert!(matches!(err, QueryError::UnrecognizedArgument { .. }));
    }

    #[test]
    fn default_constraint_names() {
        assert_eq!(property("rating").default_constraint_name(), Some("rating"));
        assert_eq!(field("body").default_constraint_name(), Some("body"));
        let elem = element(args!["http://example.com/ns", "price"]).unwrap();
        assert_eq!(elem.default_constraint_name(), Some("price"));
        let attr = attribute(args!["item", "currency"]).unwrap();
        assert_eq!(attr.default_constraint_name(), None);
        assert_eq!(path_index("/a/b").default_constraint_name(), None);
    }

    #[test]
    fn require_constraint_name_reports_index_kind() {
        let err = path_index("/a/b").require_constraint_name().unwrap_err();
        assert!(matches!(
            err,
            QueryError::MissingConstraintName {
                index: "path-index"
            }
        ));
    }

    #[test]
    fn element_forms() {
        let local = element(args!["title"]).unwrap();
        assert_eq!(
            IndexFields::of(&local).element,
            Some(QName::local("title"))
        );

        let pair = element(args![vec!["http://ns", "title"]]).unwrap();
        assert_eq!(
            IndexFields::of(&pair).element,
            Some(QName::namespaced("http://ns", "title"))
        );

        let from_qname = element(args![qname(args!["http://ns", "title"]).unwrap()]).unwrap();
        assert_eq!(pair, from_qname);

        assert!(element(args![]).is_err());
    }

    #[test]
    fn attribute_forms() {
        let two = attribute(args!["item", "currency"]).unwrap();
        assert_eq!(
            two,
            IndexedName::Element {
                element: QName::local("item"),
                attribute: Some(QName::local("currency")),
            }
        );

        let qname_first = attribute(args![
            qname(args!["http://e", "item"]).unwrap(),
            "http://a",
            "currency"
        ])
        .unwrap();
        assert_eq!(
            qname_first,
            IndexedName::Element {
                element: QName::namespaced("http://e", "item"),
                attribute: Some(QName::namespaced("http://a", "currency")),
            }
        );

        let qname_last = attribute(args![
            "http://e",
            "item",
            qname(args!["currency"]).unwrap()
        ])
        .unwrap();
        assert_eq!(
            qname_last,
            IndexedName::Element {
                element: QName::namespaced("http://e", "item"),
                attribute: Some(QName::local("currency")),
            }
        );

        let four = attribute(args!["http://e", "item", "http://a", "currency"]).unwrap();
        assert_eq!(four, qname_first);
    }

    #[test]
    fn attribute_arity() {
        assert!(matches!(
            attribute(args![]).unwrap_err(),
            QueryError::Arity { .. }
        ));
        assert!(matches!(
            attribute(args!["item"]).unwrap_err(),
            QueryError::Arity { .. }
        ));
    }

    #[test]
    fn index_fields_wire_form() {
        let fields = IndexFields::of(&attribute(args!["item", "currency"]).unwrap());
        assert_eq!(
            serde_json::to_value(&fields).unwrap(),
            json!({"element": {"name": "item"}, "attribute": {"name": "currency"}})
        );

        let fields = IndexFields::of(&path_index("/doc/price"));
        assert_eq!(
            serde_json::to_value(&fields).unwrap(),
            json!({"path-index": {"text": "/doc/price", "namespaces": ""}})
        );
    }

    #[test]
    fn path_index_namespaces_round_trip() {
        let index = path_index_with_namespaces("/ex:doc/ex:price", [("ex", "http://example.com")]);
        let fields = IndexFields::of(&index);
        let encoded = serde_json::to_value(&fields).unwrap();
        assert_eq!(
            encoded,
            json!({"path-index": {
                "text": "/ex:doc/ex:price",
                "namespaces": {"ex": "http://example.com"}
            }})
        );
        let decoded: IndexFields = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded.indexed_name(), Some(index));
    }

    #[test]
    fn container_fields_skip_field_and_path() {
        assert!(IndexFields::container(&field("body")).is_empty());
        assert!(IndexFields::container(&path_index("/a")).is_empty());
        assert_eq!(
            IndexFields::container(&property("p")).json_property.as_deref(),
            Some("p")
        );
    }
}
