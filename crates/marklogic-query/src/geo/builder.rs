use std::collections::BTreeMap;

use serde_json::Value;

use super::{coordinate, GeoKind, GeoSpec, Region};
use crate::arg::{as_args, Arg};
use crate::error::{QueryError, Result};
use crate::index::{qname_arg, IndexedName, PathIndex, QName};
use crate::query::{Constraint, Query};

/// Builds a geospatial query over a pair of attributes holding latitude
/// and longitude.
///
/// The first three arguments name the parent element, the latitude
/// attribute, and the longitude attribute. An [`attribute`](crate::attribute)
/// argument supplies both its element and attribute. The rest are the
/// shared geospatial tail: [`geo_options`](crate::geo_options),
/// [`fragment_scope`](crate::fragment_scope), [`heatmap`](crate::heatmap),
/// one region, or a [`bind`](crate::bind).
pub fn geo_attribute_pair(args: Vec<Arg>) -> Result<Query> {
    let kind = GeoKind::AttrPair;
    let args = as_args(args);
    if args.len() < 3 {
        return Err(QueryError::arity(
            kind.combinator(),
            "need at least 3 parameters for a geospatial attribute pair query",
        ));
    }

    let mut spec = GeoSpec::default();
    let mut args = args.into_iter();
    let mut slot = 0;
    while slot < 3 {
        let Some(arg) = args.next() else {
            return Err(QueryError::arity(kind.combinator(), "missing attribute"));
        };
        match arg {
            Arg::Index(IndexedName::Element { element, attribute }) => {
                if slot == 0 || spec.parent.is_none() {
                    spec.parent = Some(element);
                }
                if let Some(attribute) = attribute {
                    if slot == 0 {
                        slot += 1;
                    }
                    set_pair_slot(&mut spec, slot, attribute);
                }
            }
            other => {
                let name = qname_arg(other, kind.combinator())?;
                set_pair_slot(&mut spec, slot, name);
            }
        }
        slot += 1;
    }
    finish(kind, spec, args)
}

fn set_pair_slot(spec: &mut GeoSpec, slot: usize, name: QName) {
    match slot {
        0 => spec.parent = Some(name),
        1 => spec.lat = Some(name),
        _ => spec.lon = Some(name),
    }
}

fn element_name(arg: Arg, combinator: &'static str) -> Result<QName> {
    match arg {
        Arg::Index(IndexedName::Element { element, .. }) => Ok(element),
        other => qname_arg(other, combinator),
    }
}

fn is_element_name(arg: &Arg) -> bool {
    matches!(
        arg,
        Arg::Text(_) | Arg::QName(_) | Arg::Index(IndexedName::Element { .. })
    )
}

fn is_property_name(arg: &Arg) -> bool {
    matches!(arg, Arg::Text(_) | Arg::Index(IndexedName::JsonProperty(_)))
}

fn property_name(arg: Arg, combinator: &'static str) -> Result<String> {
    match arg {
        Arg::Index(IndexedName::JsonProperty(name)) => Ok(name),
        other => other.into_text(combinator),
    }
}

/// Builds a geospatial query over an element holding a point, optionally
/// inside a parent element.
pub fn geo_element(args: Vec<Arg>) -> Result<Query> {
    let kind = GeoKind::Elem;
    let mut args = as_args(args);
    let names = args.iter().take(2).take_while(|a| is_element_name(a)).count();
    let rest = args.split_off(names);
    let mut names = args.into_iter();

    let mut spec = GeoSpec::default();
    match (names.next(), names.next()) {
        (Some(parent), Some(element)) => {
            spec.parent = Some(element_name(parent, kind.combinator())?);
            spec.element = Some(element_name(element, kind.combinator())?);
        }
        (Some(element), None) => {
            spec.element = Some(element_name(element, kind.combinator())?);
        }
        (None, _) => return Err(QueryError::arity(kind.combinator(), "missing element")),
    }
    finish(kind, spec, rest.into_iter())
}

/// Builds a geospatial query over a parent element with child elements
/// holding latitude and longitude.
pub fn geo_element_pair(args: Vec<Arg>) -> Result<Query> {
    let kind = GeoKind::ElemPair;
    let args = as_args(args);
    if args.len() < 3 {
        return Err(QueryError::arity(
            kind.combinator(),
            "need at least 3 parameters for a geospatial element pair query",
        ));
    }
    let mut args = args.into_iter();
    let mut names = Vec::with_capacity(3);
    for arg in args.by_ref().take(3) {
        names.push(element_name(arg, kind.combinator())?);
    }
    let mut names = names.into_iter();
    let spec = GeoSpec {
        parent: names.next(),
        lat: names.next(),
        lon: names.next(),
        ..Default::default()
    };
    finish(kind, spec, args)
}

/// Builds a geospatial query over a JSON property holding a point,
/// optionally inside a parent property.
pub fn geo_property(args: Vec<Arg>) -> Result<Query> {
    let kind = GeoKind::JsonProperty;
    let mut args = as_args(args);
    let names = args.iter().take(2).take_while(|a| is_property_name(a)).count();
    let rest = args.split_off(names);
    let mut names = args.into_iter();

    let mut spec = GeoSpec::default();
    match (names.next(), names.next()) {
        (Some(parent), Some(property)) => {
            spec.parent_property = Some(property_name(parent, kind.combinator())?);
            spec.json_property = Some(property_name(property, kind.combinator())?);
        }
        (Some(property), None) => {
            spec.json_property = Some(property_name(property, kind.combinator())?);
        }
        (None, _) => return Err(QueryError::arity(kind.combinator(), "missing property")),
    }
    finish(kind, spec, rest.into_iter())
}

/// Builds a geospatial query over a parent property with child properties
/// holding latitude and longitude.
pub fn geo_property_pair(args: Vec<Arg>) -> Result<Query> {
    let kind = GeoKind::JsonPropertyPair;
    let args = as_args(args);
    if args.len() < 3 {
        return Err(QueryError::arity(
            kind.combinator(),
            "need at least 3 parameters for a geospatial property pair query",
        ));
    }
    let mut args = args.into_iter();
    let mut names = Vec::with_capacity(3);
    for arg in args.by_ref().take(3) {
        names.push(property_name(arg, kind.combinator())?);
    }
    let mut names = names.into_iter();
    let spec = GeoSpec {
        parent_property: names.next(),
        lat_property: names.next(),
        lon_property: names.next(),
        ..Default::default()
    };
    finish(kind, spec, args)
}

/// Builds a geospatial query over a path index.
///
/// The first argument is a [`path_index`](crate::path_index), a path
/// string, or a `[path, namespaces]` list.
pub fn geo_path(args: Vec<Arg>) -> Result<Query> {
    let kind = GeoKind::Path;
    let mut args = as_args(args).into_iter();
    let path_index = match args.next() {
        Some(Arg::Index(IndexedName::PathIndex(path))) => path,
        Some(Arg::Text(text)) => PathIndex {
            text,
            namespaces: BTreeMap::new(),
        },
        Some(Arg::List(parts)) => path_from_parts(parts, kind.combinator())?,
        Some(other) => return Err(QueryError::unrecognized(kind.combinator(), other)),
        None => return Err(QueryError::arity(kind.combinator(), "missing path")),
    };
    let spec = GeoSpec {
        path_index: Some(path_index),
        ..Default::default()
    };
    finish(kind, spec, args)
}

fn path_from_parts(parts: Vec<Arg>, combinator: &'static str) -> Result<PathIndex> {
    let mut parts = parts.into_iter();
    let text = match parts.next() {
        Some(arg) => arg.into_text(combinator)?,
        None => return Err(QueryError::arity(combinator, "missing path")),
    };
    let namespaces = match parts.next() {
        None => BTreeMap::new(),
        Some(Arg::Json(Value::Object(map))) => map
            .into_iter()
            .map(|(prefix, uri)| match uri {
                Value::String(uri) => Ok((prefix, uri)),
                other => Err(QueryError::unrecognized(combinator, other)),
            })
            .collect::<Result<_>>()?,
        Some(other) => return Err(QueryError::unrecognized(combinator, other)),
    };
    Ok(PathIndex { text, namespaces })
}

/// Reads the shared tail of a geospatial combinator and wraps the result.
///
/// Options, fragment scope, and heatmap each claim their slot once. Then a
/// single region, or a binding. A query with neither is a bare index
/// declaration, usable as a facet source.
fn finish(kind: GeoKind, mut spec: GeoSpec, args: impl Iterator<Item = Arg>) -> Result<Query> {
    let combinator = kind.combinator();
    let mut name = None;
    for arg in args {
        match arg {
            Arg::GeoOptions(o) if spec.geo_option.is_none() => spec.geo_option = Some(o),
            Arg::FragmentScope(s) if spec.fragment_scope.is_none() => {
                spec.fragment_scope = Some(s)
            }
            Arg::Heatmap(h) if spec.heatmap.is_none() => spec.heatmap = Some(h),
            Arg::Bind(n) if name.is_none() => name = Some(n),
            Arg::Region(region) if !spec.has_region() => spec.set_region(region),
            Arg::LatLon(_) | Arg::List(_) if !spec.has_region() => {
                let point = coordinate(arg, combinator)?;
                spec.set_region(Region::Point(point));
            }
            other => return Err(QueryError::unrecognized(combinator, other)),
        }
    }

    match name {
        Some(_) if spec.has_region() => Err(QueryError::conflicting(combinator)),
        Some(name) => Ok(Constraint {
            name,
            spec: kind.constraint(spec),
        }
        .into()),
        None if spec.has_region() => Ok(kind.query(spec).into()),
        None => Ok(kind.declaration(spec).into()),
    }
}
