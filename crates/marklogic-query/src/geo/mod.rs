//! Geospatial regions and queries.
//!
//! Regions are plain coordinate records: [`point`], [`bounding_box`],
//! [`circle`], and [`polygon`] each produce a [`Region`] that any of the
//! geospatial combinators accept. Coordinates are degrees of
//! latitude and longitude.

mod builder;

use serde::{Deserialize, Serialize};

use crate::arg::{as_args, Arg};
use crate::error::{QueryError, Result};
use crate::index::{PathIndex, QName};
use crate::query::{ConstraintSpec, FragmentScope, IndexDeclaration, StructuredQuery};
use crate::value::Number;

pub use builder::{
    geo_attribute_pair, geo_element, geo_element_pair, geo_path, geo_property, geo_property_pair,
};

/// A coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub latitude: Number,
    pub longitude: Number,
}

/// Box edges: south and north latitudes, west and east longitudes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxBounds {
    pub south: Number,
    pub west: Number,
    pub north: Number,
    pub east: Number,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub radius: Number,
    pub point: Vec<LatLon>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub point: Vec<LatLon>,
}

/// Grid for bucketing geospatial facet values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Heatmap {
    pub latdivs: Number,
    pub londivs: Number,
    pub s: Number,
    pub w: Number,
    pub n: Number,
    pub e: Number,
}

/// A region criterion for a geospatial query.
#[derive(Debug, Clone, PartialEq)]
pub enum Region {
    Point(LatLon),
    Box(BoxBounds),
    Circle(Circle),
    Polygon(Polygon),
}

/// Body of every geospatial node. Which index fields are set depends on
/// the kind of geospatial index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GeoSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<QName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<QName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<QName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<QName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_property: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_property: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat_property: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon_property: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_index: Option<PathIndex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_option: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment_scope: Option<FragmentScope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heatmap: Option<Heatmap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<Vec<LatLon>>,
    #[serde(rename = "box", default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<BoxBounds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circle: Option<Circle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon: Option<Polygon>,
}

impl GeoSpec {
    pub fn has_region(&self) -> bool {
        self.point.is_some()
            || self.bounds.is_some()
            || self.circle.is_some()
            || self.polygon.is_some()
    }

    pub fn set_region(&mut self, region: Region) {
        match region {
            Region::Point(p) => self.point = Some(vec![p]),
            Region::Box(b) => self.bounds = Some(b),
            Region::Circle(c) => self.circle = Some(c),
            Region::Polygon(p) => self.polygon = Some(p),
        }
    }
}

/// The kind of geospatial index a query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GeoKind {
    AttrPair,
    Elem,
    ElemPair,
    JsonProperty,
    JsonPropertyPair,
    Path,
}

impl GeoKind {
    pub(crate) fn combinator(self) -> &'static str {
        match self {
            GeoKind::AttrPair => "geo_attribute_pair",
            GeoKind::Elem => "geo_element",
            GeoKind::ElemPair => "geo_element_pair",
            GeoKind::JsonProperty => "geo_property",
            GeoKind::JsonPropertyPair => "geo_property_pair",
            GeoKind::Path => "geo_path",
        }
    }

    pub(crate) fn query(self, spec: GeoSpec) -> StructuredQuery {
        match self {
            GeoKind::AttrPair => StructuredQuery::GeoAttrPair(spec),
            GeoKind::Elem => StructuredQuery::GeoElem(spec),
            GeoKind::ElemPair => StructuredQuery::GeoElemPair(spec),
            GeoKind::JsonProperty => StructuredQuery::GeoJsonProperty(spec),
            GeoKind::JsonPropertyPair => StructuredQuery::GeoJsonPropertyPair(spec),
            GeoKind::Path => StructuredQuery::GeoPath(spec),
        }
    }

    pub(crate) fn constraint(self, spec: GeoSpec) -> ConstraintSpec {
        match self {
            GeoKind::AttrPair => ConstraintSpec::GeoAttrPair(spec),
            GeoKind::Elem => ConstraintSpec::GeoElem(spec),
            GeoKind::ElemPair => ConstraintSpec::GeoElemPair(spec),
            GeoKind::JsonProperty => ConstraintSpec::GeoJsonProperty(spec),
            GeoKind::JsonPropertyPair => ConstraintSpec::GeoJsonPropertyPair(spec),
            GeoKind::Path => ConstraintSpec::GeoPath(spec),
        }
    }

    pub(crate) fn declaration(self, spec: GeoSpec) -> IndexDeclaration {
        match self {
            GeoKind::AttrPair => IndexDeclaration::GeoAttrPair(spec),
            GeoKind::Elem => IndexDeclaration::GeoElem(spec),
            GeoKind::ElemPair => IndexDeclaration::GeoElemPair(spec),
            GeoKind::JsonProperty => IndexDeclaration::GeoJsonProperty(spec),
            GeoKind::JsonPropertyPair => IndexDeclaration::GeoJsonPropertyPair(spec),
            GeoKind::Path => IndexDeclaration::GeoPath(spec),
        }
    }
}

/// Options for geospatial queries, such as `units=miles`.
pub fn geo_options<I, S>(options: I) -> Arg
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Arg::GeoOptions(options.into_iter().map(Into::into).collect())
}

/// A coordinate pair.
pub fn latlon(latitude: impl Into<Number>, longitude: impl Into<Number>) -> LatLon {
    LatLon {
        latitude: latitude.into(),
        longitude: longitude.into(),
    }
}

/// Box edges in south, west, north, east order.
pub fn south_west_north_east(
    south: impl Into<Number>,
    west: impl Into<Number>,
    north: impl Into<Number>,
    east: impl Into<Number>,
) -> BoxBounds {
    BoxBounds {
        south: south.into(),
        west: west.into(),
        north: north.into(),
        east: east.into(),
    }
}

fn number(arg: Arg, combinator: &'static str) -> Result<Number> {
    arg.as_number()
        .ok_or_else(|| QueryError::unrecognized(combinator, arg))
}

/// Reads a coordinate pair from a [`LatLon`], a point region, or a
/// two-number list.
pub(crate) fn coordinate(arg: Arg, combinator: &'static str) -> Result<LatLon> {
    match arg {
        Arg::LatLon(ll) | Arg::Region(Region::Point(ll)) => Ok(ll),
        Arg::List(items) if items.len() == 2 => {
            let mut items = items.into_iter();
            match (items.next(), items.next()) {
                (Some(lat), Some(lon)) => Ok(latlon(
                    number(lat, combinator)?,
                    number(lon, combinator)?,
                )),
                _ => Err(QueryError::arity(combinator, "a coordinate needs two numbers")),
            }
        }
        other => Err(QueryError::unrecognized(combinator, other)),
    }
}

/// A point region: a [`LatLon`], or latitude and longitude.
pub fn point(args: Vec<Arg>) -> Result<Region> {
    let args = as_args(args);
    match args.len() {
        1 => args
            .into_iter()
            .next()
            .map(|arg| coordinate(arg, "point"))
            .transpose()?
            .map(Region::Point)
            .ok_or_else(|| QueryError::arity("point", "missing coordinate")),
        2 => coordinate(Arg::List(args), "point").map(Region::Point),
        n => Err(QueryError::arity(
            "point",
            format!("takes a coordinate or latitude and longitude, got {n} arguments"),
        )),
    }
}

/// A box region: [`BoxBounds`], or south, west, north, and east edges.
pub fn bounding_box(args: Vec<Arg>) -> Result<Region> {
    let args = as_args(args);
    match args.len() {
        1 => match args.into_iter().next() {
            Some(Arg::Bounds(bounds)) | Some(Arg::Region(Region::Box(bounds))) => {
                Ok(Region::Box(bounds))
            }
            Some(other) => Err(QueryError::unrecognized("box", other)),
            None => Err(QueryError::arity("box", "missing bounds")),
        },
        4 => {
            let mut edges = Vec::with_capacity(4);
            for arg in args {
                edges.push(number(arg, "box")?);
            }
            Ok(Region::Box(BoxBounds {
                south: edges[0],
                west: edges[1],
                north: edges[2],
                east: edges[3],
            }))
        }
        n => Err(QueryError::arity(
            "box",
            format!("takes bounds or four edges, got {n} arguments"),
        )),
    }
}

/// A circle region: the radius followed by the center, given as a
/// [`LatLon`], a point, a two-number list, or latitude and longitude.
pub fn circle(args: Vec<Arg>) -> Result<Region> {
    let mut args = as_args(args).into_iter();
    let radius = match args.next() {
        Some(arg) => number(arg, "circle")?,
        None => return Err(QueryError::arity("circle", "missing radius")),
    };
    let center = match (args.next(), args.next()) {
        (Some(Arg::Number(lat)), Some(Arg::Number(lon))) => latlon(lat, lon),
        (Some(arg), None) => coordinate(arg, "circle")?,
        (None, _) => return Err(QueryError::arity("circle", "missing center")),
        (Some(_), Some(extra)) => return Err(QueryError::unrecognized("circle", extra)),
    };
    if let Some(extra) = args.next() {
        return Err(QueryError::unrecognized("circle", extra));
    }
    Ok(Region::Circle(Circle {
        radius,
        point: vec![center],
    }))
}

/// A polygon region from its vertices.
pub fn polygon(args: Vec<Arg>) -> Result<Region> {
    let point = as_args(args)
        .into_iter()
        .map(|arg| coordinate(arg, "polygon"))
        .collect::<Result<Vec<_>>>()?;
    if point.is_empty() {
        return Err(QueryError::arity("polygon", "missing vertices"));
    }
    Ok(Region::Polygon(Polygon { point }))
}

/// A heatmap grid for geospatial facets.
///
/// Takes the bounds and divisions as `bounds, latdivs, londivs` or
/// `latdivs, londivs, bounds`, or six numbers
/// `latdivs, londivs, south, west, north, east`.
pub fn heatmap(args: Vec<Arg>) -> Result<Heatmap> {
    let args = as_args(args);
    let bounds = |arg: &Arg| match arg {
        Arg::Bounds(b) | Arg::Region(Region::Box(b)) => Some(*b),
        _ => None,
    };
    match args.len() {
        3 => {
            let (b, latdivs, londivs) = if let Some(b) = bounds(&args[0]) {
                (b, &args[1], &args[2])
            } else if let Some(b) = bounds(&args[2]) {
                (b, &args[0], &args[1])
            } else {
                return Err(QueryError::arity("heatmap", "no region for heatmap"));
            };
            let divs = |arg: &Arg| {
                arg.as_number()
                    .ok_or_else(|| QueryError::unrecognized("heatmap", arg))
            };
            Ok(Heatmap {
                latdivs: divs(latdivs)?,
                londivs: divs(londivs)?,
                s: b.south,
                w: b.west,
                n: b.north,
                e: b.east,
            })
        }
        6 => {
            let mut values = Vec::with_capacity(6);
            for arg in args {
                values.push(number(arg, "heatmap")?);
            }
            Ok(Heatmap {
                latdivs: values[0],
                londivs: values[1],
                s: values[2],
                w: values[3],
                n: values[4],
                e: values[5],
            })
        }
        n => Err(QueryError::arity(
            "heatmap",
            format!("takes 3 or 6 arguments, got {n}"),
        )),
    }
}
