//! Bitemporal queries.

use crate::arg::{as_args, iso_timestamp, Arg};
use crate::error::{QueryError, Result};
use crate::query::{
    LsqtQuery, Period, PeriodCompareQuery, PeriodRangeQuery, Query, StructuredQuery,
};

/// Options for temporal queries.
pub fn temporal_options<I, S>(options: I) -> Arg
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Arg::TemporalOptions(options.into_iter().map(Into::into).collect())
}

fn timestamp(arg: Arg, combinator: &'static str) -> Result<String> {
    match arg {
        Arg::Text(s) => Ok(s),
        Arg::DateTime(dt) => Ok(iso_timestamp(&dt)),
        other => Err(QueryError::unrecognized(combinator, other)),
    }
}

/// Matches documents in a temporal collection as of the last stable query
/// time, or as of an earlier timestamp.
///
/// The first argument is the temporal collection. Then, in any order: a
/// [`weight`](crate::weight) or bare number, a timestamp string or
/// `DateTime`, and [`temporal_options`].
pub fn lsqt_query(args: Vec<Arg>) -> Result<Query> {
    let mut args = as_args(args).into_iter();
    let temporal_collection = match args.next() {
        Some(Arg::Text(collection)) => collection,
        Some(other) => return Err(QueryError::unrecognized("lsqt_query", other)),
        None => return Err(QueryError::arity("lsqt_query", "missing temporal collection")),
    };

    let mut query = LsqtQuery {
        temporal_collection,
        weight: None,
        timestamp: None,
        temporal_option: None,
    };
    for arg in args {
        match arg {
            Arg::Weight(w) | Arg::Number(w) if query.weight.is_none() => query.weight = Some(w),
            Arg::Text(_) | Arg::DateTime(_) if query.timestamp.is_none() => {
                query.timestamp = Some(timestamp(arg, "lsqt_query")?)
            }
            Arg::TemporalOptions(o) if query.temporal_option.is_none() => {
                query.temporal_option = Some(o)
            }
            other => return Err(QueryError::unrecognized("lsqt_query", other)),
        }
    }
    Ok(StructuredQuery::Lsqt(query).into())
}

/// A period from a start timestamp to an optional end timestamp.
pub fn period(args: Vec<Arg>) -> Result<Period> {
    let mut args = as_args(args).into_iter();
    let period_start = match args.next() {
        Some(arg) => timestamp(arg, "period")?,
        None => return Err(QueryError::arity("period", "must have at least one datetime")),
    };
    let period_end = args.next().map(|arg| timestamp(arg, "period")).transpose()?;
    if let Some(extra) = args.next() {
        return Err(QueryError::unrecognized("period", extra));
    }
    Ok(Period {
        period_start,
        period_end,
    })
}

fn temporal_option(arg: Option<Arg>, combinator: &'static str) -> Result<Option<Vec<String>>> {
    match arg {
        None => Ok(None),
        Some(Arg::TemporalOptions(o)) => Ok(Some(o)),
        Some(other) => Err(QueryError::unrecognized(combinator, other)),
    }
}

/// Compares two temporal axes with an Allen or ISO operator such as
/// `aln_before` or `iso_contains`.
pub fn period_compare(args: Vec<Arg>) -> Result<Query> {
    let args = as_args(args);
    if args.len() < 3 {
        return Err(QueryError::arity(
            "period_compare",
            "requires two axes and an operator",
        ));
    }
    let mut args = args.into_iter();
    let mut text = || -> Result<String> {
        match args.next() {
            Some(arg) => arg.into_text("period_compare"),
            None => Err(QueryError::arity("period_compare", "missing argument")),
        }
    };
    let axis1 = text()?;
    let temporal_operator = text()?;
    let axis2 = text()?;
    let temporal_option = temporal_option(args.next(), "period_compare")?;
    if let Some(extra) = args.next() {
        return Err(QueryError::unrecognized("period_compare", extra));
    }
    Ok(StructuredQuery::PeriodCompare(PeriodCompareQuery {
        axis1,
        temporal_operator,
        axis2,
        temporal_option,
    })
    .into())
}

/// Compares one or more temporal axes against one or more periods.
pub fn period_range(args: Vec<Arg>) -> Result<Query> {
    let args = as_args(args);
    if args.len() < 3 {
        return Err(QueryError::arity(
            "period_range",
            "requires an axis, an operator, and a period",
        ));
    }
    let mut args = args.into_iter();

    let axis = match args.next() {
        Some(Arg::List(items)) => items
            .into_iter()
            .map(|item| item.into_text("period_range"))
            .collect::<Result<Vec<_>>>()?,
        Some(other) => vec![other.into_text("period_range")?],
        None => return Err(QueryError::arity("period_range", "missing axis")),
    };
    let temporal_operator = match args.next() {
        Some(arg) => arg.into_text("period_range")?,
        None => return Err(QueryError::arity("period_range", "missing operator")),
    };
    let period = match args.next() {
        Some(Arg::Period(p)) => vec![p],
        Some(Arg::List(items)) => items
            .into_iter()
            .map(|item| match item {
                Arg::Period(p) => Ok(p),
                other => Err(QueryError::unrecognized("period_range", other)),
            })
            .collect::<Result<Vec<_>>>()?,
        Some(other) => return Err(QueryError::unrecognized("period_range", other)),
        None => return Err(QueryError::arity("period_range", "missing period")),
    };
    let temporal_option = temporal_option(args.next(), "period_range")?;
    if let Some(extra) = args.next() {
        return Err(QueryError::unrecognized("period_range", extra));
    }
    Ok(StructuredQuery::PeriodRange(PeriodRangeQuery {
        axis,
        temporal_operator,
        period,
        temporal_option,
    })
    .into())
}
