//! Document set queries: collections, directories, URIs, and containers.

use tracing::debug;

use crate::arg::{as_args, flatten_args, Arg};
use crate::error::{QueryError, Result};
use crate::index::{resolve, IndexFields};
use crate::query::{
    CollectionConstraint, Constraint, ConstraintSpec, ContainerQuery, ContainerSpec,
    DirectoryQuery, IndexDeclaration, Query, StructuredQuery, UriList,
};

fn uris(args: Vec<Arg>, combinator: &'static str) -> Result<Vec<String>> {
    flatten_args(args)
        .into_iter()
        .map(|arg| arg.into_text(combinator))
        .collect()
}

/// Matches documents in any of the collections.
///
/// With no arguments the result names the collection lexicon for use as a
/// facet source. A [`bind`](crate::bind) among at most two arguments makes a
/// collection constraint; the other argument, if any, is the prefix
/// stripped from collection URIs.
pub fn collection(args: Vec<Arg>) -> Result<Query> {
    let args = as_args(args);
    if args.is_empty() {
        return Ok(IndexDeclaration::Collection(()).into());
    }

    if args.len() <= 2 && args.iter().any(|arg| matches!(arg, Arg::Bind(_))) {
        let mut name = None;
        let mut prefix = None;
        for arg in args {
            match arg {
                Arg::Bind(n) if name.is_none() => name = Some(n),
                Arg::Text(p) if prefix.is_none() => prefix = Some(p),
                other => return Err(QueryError::unrecognized("collection", other)),
            }
        }
        let Some(name) = name else {
            return Err(QueryError::arity("collection", "missing binding"));
        };
        return Ok(Constraint {
            name,
            spec: ConstraintSpec::Collection(CollectionConstraint { prefix }),
        }
        .into());
    }

    Ok(StructuredQuery::Collection(UriList {
        uri: uris(args, "collection")?,
    })
    .into())
}

/// Matches documents in any of the directories. A boolean sets whether
/// subdirectories match too.
pub fn directory(args: Vec<Arg>) -> Result<Query> {
    let mut query = DirectoryQuery::default();
    for arg in flatten_args(as_args(args)) {
        match arg {
            Arg::Bool(b) if query.infinite.is_none() => query.infinite = Some(b),
            other => query.uri.push(other.into_text("directory")?),
        }
    }
    Ok(StructuredQuery::Directory(query).into())
}

/// Matches the documents with any of the URIs.
pub fn document(args: Vec<Arg>) -> Result<Query> {
    Ok(StructuredQuery::Document(UriList {
        uri: uris(as_args(args), "document")?,
    })
    .into())
}

/// Matches a query within a JSON property or XML element.
///
/// The first argument names the container; fields and path indexes cannot
/// contain other nodes and contribute no scope. Then come an optional
/// [`fragment_scope`](crate::fragment_scope) and either the query to match
/// inside the container or a [`bind`](crate::bind) that makes a container
/// constraint. Without either, the constraint is named after the container.
pub fn scope(args: Vec<Arg>) -> Result<Query> {
    let mut args = as_args(args).into_iter();
    let index = match args.next() {
        Some(arg) => resolve(arg, "scope")?,
        None => return Err(QueryError::arity("scope", "missing container")),
    };

    let mut fragment_scope = None;
    let mut name = None;
    let mut query = None;
    for arg in args {
        match arg {
            Arg::FragmentScope(s) if fragment_scope.is_none() => fragment_scope = Some(s),
            Arg::Bind(n) if name.is_none() => name = Some(n),
            Arg::Query(q) if query.is_none() => query = Some(q.into_structured("scope")?),
            other => return Err(QueryError::unrecognized("scope", other)),
        }
    }

    let index_fields = IndexFields::container(&index);
    if let Some(query) = query {
        if name.is_some() {
            return Err(QueryError::conflicting("scope"));
        }
        return Ok(StructuredQuery::Container(ContainerQuery {
            index: index_fields,
            fragment_scope,
            query: Box::new(query),
        })
        .into());
    }

    let name = match name {
        Some(name) => name,
        None => {
            let derived = index.require_constraint_name()?;
            debug!(name = %derived, "derived container constraint name");
            derived
        }
    };
    Ok(Constraint {
        name,
        spec: ConstraintSpec::Container(ContainerSpec {
            index: index_fields,
            fragment_scope,
        }),
    }
    .into())
}
