//! Boolean composition and fragment wrappers.

use crate::arg::{as_args, flatten_args, Arg};
use crate::error::{QueryError, Result};
use crate::query::{
    AndNotQuery, AndQuery, BoostQuery, NearQuery, OrQuery, Query, StructuredQuery,
};
use crate::value::Number;

/// Marks an `and` or `near` query as order sensitive.
pub fn ordered(ordered: bool) -> Arg {
    Arg::Ordered(ordered)
}

/// Weights a query's contribution to relevance.
pub fn weight(weight: impl Into<Number>) -> Arg {
    Arg::Weight(weight.into())
}

/// Matches documents that satisfy every subquery.
///
/// An [`ordered`] marker or a boolean sets the ordering flag. With no
/// subqueries the query matches every document.
pub fn and(args: Vec<Arg>) -> Result<Query> {
    let mut query = AndQuery::default();
    for arg in flatten_args(as_args(args)) {
        match arg {
            Arg::Ordered(o) | Arg::Bool(o) if query.ordered.is_none() => query.ordered = Some(o),
            other => query.queries.push(other.into_query("and")?),
        }
    }
    Ok(StructuredQuery::And(query).into())
}

/// Matches documents that satisfy any subquery.
pub fn or(args: Vec<Arg>) -> Result<Query> {
    let queries = flatten_args(as_args(args))
        .into_iter()
        .map(|arg| arg.into_query("or"))
        .collect::<Result<Vec<_>>>()?;
    Ok(StructuredQuery::Or(OrQuery { queries }).into())
}

/// Matches documents that do not satisfy the query.
pub fn not(query: impl Into<Query>) -> Query {
    StructuredQuery::Not(Box::new(query.into())).into()
}

fn pair(args: Vec<Arg>, combinator: &'static str) -> Result<(Box<Query>, Box<Query>)> {
    let args = as_args(args);
    if args.len() < 2 {
        return Err(QueryError::arity(
            combinator,
            format!("requires two queries, got {}", args.len()),
        ));
    }
    if args.len() > 2 {
        return Err(QueryError::arity(
            combinator,
            format!("takes exactly two queries, got {}", args.len()),
        ));
    }
    let mut args = args.into_iter();
    match (args.next(), args.next()) {
        (Some(first), Some(second)) => Ok((
            Box::new(first.into_query(combinator)?),
            Box::new(second.into_query(combinator)?),
        )),
        _ => Err(QueryError::arity(combinator, "requires two queries")),
    }
}

/// Matches documents that satisfy the positive query and not the negative
/// query.
pub fn and_not(args: Vec<Arg>) -> Result<Query> {
    let (positive_query, negative_query) = pair(args, "and_not")?;
    Ok(StructuredQuery::AndNot(AndNotQuery {
        positive_query,
        negative_query,
    })
    .into())
}

/// Matches the positive query except where it overlaps matches of the
/// negative query.
pub fn not_in(args: Vec<Arg>) -> Result<Query> {
    let (positive_query, negative_query) = pair(args, "not_in")?;
    Ok(StructuredQuery::NotIn(AndNotQuery {
        positive_query,
        negative_query,
    })
    .into())
}

/// Matches the first query, boosting relevance where the second also
/// matches.
pub fn boost(args: Vec<Arg>) -> Result<Query> {
    let (matching_query, boosting_query) = pair(args, "boost")?;
    Ok(StructuredQuery::Boost(BoostQuery {
        matching_query,
        boosting_query,
    })
    .into())
}

/// Matches documents where the subqueries match within a distance of
/// each other.
///
/// A bare number is the distance in words. [`weight`] and [`ordered`]
/// markers set those slots; each slot can be claimed once.
pub fn near(args: Vec<Arg>) -> Result<Query> {
    let mut query = NearQuery::default();
    for arg in flatten_args(as_args(args)) {
        match arg {
            Arg::Ordered(o) if query.ordered.is_none() => query.ordered = Some(o),
            Arg::Weight(w) if query.weight.is_none() => query.weight = Some(w),
            Arg::Number(n) if query.distance.is_none() => query.distance = Some(n),
            other => query.queries.push(other.into_query("near")?),
        }
    }
    Ok(StructuredQuery::Near(query).into())
}

/// Matches the query in document fragments rather than properties or
/// locks.
pub fn document_fragment(query: impl Into<Query>) -> Query {
    StructuredQuery::DocumentFragment(Box::new(query.into())).into()
}

/// Matches the query in the properties fragment of documents.
pub fn properties(query: impl Into<Query>) -> Query {
    StructuredQuery::Properties(Box::new(query.into())).into()
}

/// Matches the query in the locks fragment of documents.
pub fn locks_fragment(query: impl Into<Query>) -> Query {
    StructuredQuery::LocksFragment(Box::new(query.into())).into()
}
