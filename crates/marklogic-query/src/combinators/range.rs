//! Range queries over typed indexes.

use tracing::debug;

use crate::arg::{as_args, Arg};
use crate::error::{QueryError, Result};
use crate::index::{resolve, IndexFields};
use crate::op::{known_datatype, RangeOperator};
use crate::query::{
    Constraint, ConstraintSpec, DefaultBinding, DefaultSpec, Query, RangeSpec, StructuredQuery,
};
use crate::value::Scalar;

/// Options for a range query, such as `min-occurs=2` or `cached`.
pub fn range_options<I, S>(options: I) -> Arg
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Arg::RangeOptions(options.into_iter().map(Into::into).collect())
}

/// Matches an indexed name against values with a comparison operator.
///
/// The first argument names the index. Strings are read in order of
/// precedence: a known `xs:` datatype while the datatype is unset, then a
/// comparison token (`<`, `<=`, `>`, `>=`, `=`, `!=`) while the operator is
/// unset, and otherwise a value. So `range(p, ">=", 5)` and
/// `range(p, 5, ">=")` are the same query.
///
/// Without values the result is a constraint: named by [`bind`](crate::bind),
/// by [`bind_default`](crate::bind_default), or by the index itself.
pub fn range(args: Vec<Arg>) -> Result<Query> {
    let mut args = as_args(args).into_iter();
    let index = match args.next() {
        Some(arg) => resolve(arg, "range")?,
        None => return Err(QueryError::arity("range", "missing index")),
    };

    let mut spec = RangeSpec {
        index: IndexFields::of(&index),
        ..Default::default()
    };
    let mut operator = None;
    let mut values = Vec::new();
    let mut name = None;
    let mut is_default = false;

    for arg in args {
        match arg {
            Arg::Datatype(dt) if spec.datatype.is_none() => {
                spec.datatype = Some(dt.datatype);
                spec.collation = dt.collation;
            }
            Arg::FragmentScope(s) if spec.fragment_scope.is_none() => spec.fragment_scope = Some(s),
            Arg::RangeOptions(o) if spec.range_option.is_none() => spec.range_option = Some(o),
            Arg::List(items) => {
                for item in items {
                    values.push(item.into_scalar("range")?);
                }
            }
            Arg::Text(s) => {
                if let Some(dt) = known_datatype(&s).filter(|_| spec.datatype.is_none()) {
                    spec.datatype = Some(dt.to_string());
                } else if let Some(op) =
                    RangeOperator::from_token(&s).filter(|_| operator.is_none())
                {
                    operator = Some(op);
                } else {
                    values.push(Scalar::Text(s));
                }
            }
            Arg::Bind(n) if name.is_none() => name = Some(n),
            Arg::BindDefault if !is_default => is_default = true,
            other => values.push(other.into_scalar("range")?),
        }
    }

    if !values.is_empty() {
        if name.is_some() || is_default {
            return Err(QueryError::conflicting("range"));
        }
        spec.value = Some(values);
        spec.range_operator = Some(operator.unwrap_or_default());
        return Ok(StructuredQuery::Range(spec).into());
    }

    if is_default {
        if name.is_some() {
            return Err(QueryError::conflicting("range"));
        }
        return Ok(DefaultBinding {
            default: DefaultSpec::Range(spec),
        }
        .into());
    }

    let name = match name {
        Some(name) => name,
        None => {
            let derived = index.require_constraint_name()?;
            debug!(name = %derived, "derived range constraint name");
            derived
        }
    };
    Ok(Constraint {
        name,
        spec: ConstraintSpec::Range(spec),
    }
    .into())
}
