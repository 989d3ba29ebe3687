//! Error types for the query builder.

use thiserror::Error;

/// Errors raised while constructing a query document.
///
/// Every error is a construction-time failure: combinators validate their
/// arguments and fail fast, so nothing reaches the transport layer in a
/// half-built state.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Wrong number of required positional arguments.
    #[error("{combinator}: {message}")]
    Arity {
        combinator: &'static str,
        message: String,
    },

    /// Both literal criteria and a constraint-name binding were supplied.
    #[error("{combinator} has both binding and query")]
    ConflictingBinding { combinator: &'static str },

    /// No constraint name was given and none could be derived from the index.
    #[error("could not default constraint name from {index} index")]
    MissingConstraintName { index: &'static str },

    /// Bucket arguments do not match any recognized shape.
    #[error("a bucket must have a name, a comparison, and bounds (with or without anchors)")]
    MalformedBucket,

    /// An argument matched none of the combinator's slots.
    #[error("{combinator}: unsupported parameter: {argument}")]
    UnrecognizedArgument {
        combinator: &'static str,
        argument: String,
    },

    /// A custom module file name has no recognized extension.
    #[error("library must have an extension of .xqy, .sjs, or .js: {0}")]
    MissingModuleExtension(String),

    /// A serialized query or configuration object could not be read.
    #[error("invalid query document: {0}")]
    Json(#[from] serde_json::Error),
}

impl QueryError {
    /// Create an arity error.
    pub fn arity(combinator: &'static str, message: impl Into<String>) -> Self {
        Self::Arity {
            combinator,
            message: message.into(),
        }
    }

    /// Create a conflicting-binding error.
    pub fn conflicting(combinator: &'static str) -> Self {
        Self::ConflictingBinding { combinator }
    }

    /// Create an unrecognized-argument error from the argument's debug form.
    pub fn unrecognized(combinator: &'static str, argument: impl std::fmt::Debug) -> Self {
        Self::UnrecognizedArgument {
            combinator,
            argument: format!("{argument:?}"),
        }
    }
}

/// Result type for query construction.
pub type Result<T> = std::result::Result<T, QueryError>;
