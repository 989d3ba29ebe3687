//! Sort specifications for query results.
//!
//! Provides [`Direction`] for sort direction and [`SortSpec`] for ordering
//! by an index or by relevance score.

use serde::{Deserialize, Deserializer, Serialize};

use crate::arg::{as_args, Arg};
use crate::error::{QueryError, Result};
use crate::index::{resolve, IndexFields};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Ascending order (smallest first).
    #[default]
    Ascending,
    /// Descending order (largest first).
    Descending,
}

impl Direction {
    /// Returns `true` if this is ascending order.
    pub fn is_ascending(self) -> bool {
        matches!(self, Direction::Ascending)
    }

    /// Returns the wire name of this direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Ascending => "ascending",
            Direction::Descending => "descending",
        }
    }

    /// Parses `ascending` or `descending`.
    pub fn from_name(name: &str) -> Option<Direction> {
        match name {
            "ascending" => Some(Direction::Ascending),
            "descending" => Some(Direction::Descending),
            _ => None,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single sort key: an index or the relevance score.
///
/// A score sort is written with `score` present, even when it is `null`
/// (the default scoring method).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SortSpec {
    #[serde(flatten)]
    pub index: IndexFields,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub score: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collation: Option<String>,
}

// Distinguishes a present `null` from an absent field.
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl SortSpec {
    /// Returns `true` if this sorts by relevance score.
    pub fn is_score(&self) -> bool {
        self.score.is_some()
    }
}

/// Sorts by relevance score using the default scoring method.
pub fn score() -> Arg {
    Arg::Score(None)
}

/// Sorts by relevance score with a scoring method such as `score-logtfidf`.
pub fn score_with(method: impl Into<String>) -> Arg {
    Arg::Score(Some(method.into()))
}

/// A sort key.
///
/// The first argument is the index (a string names a property) or
/// [`score`]. Then, in any order: `"ascending"` or `"descending"`, and for
/// index sorts an `xs:` datatype name or a [`datatype`](crate::datatype).
pub fn sort(args: Vec<Arg>) -> Result<SortSpec> {
    let mut args = as_args(args).into_iter();
    let mut spec = SortSpec::default();
    match args.next() {
        Some(Arg::Score(method)) => spec.score = Some(method),
        Some(arg) => spec.index = IndexFields::of(&resolve(arg, "sort")?),
        None => return Err(QueryError::arity("sort", "missing index or score")),
    }

    for arg in args {
        match arg {
            Arg::Text(s) => {
                if let Some(direction) = Direction::from_name(&s) {
                    spec.direction = Some(direction);
                } else if !spec.is_score() && s.starts_with("xs:") {
                    spec.datatype = Some(s);
                } else {
                    return Err(QueryError::unrecognized("sort", s));
                }
            }
            Arg::Datatype(dt) if !spec.is_score() => {
                spec.datatype = Some(dt.datatype);
                spec.collation = dt.collation;
            }
            other => return Err(QueryError::unrecognized("sort", other)),
        }
    }
    Ok(spec)
}
