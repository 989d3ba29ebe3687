//! Query combinators.
//!
//! Each combinator is a pure function from a loose argument list to a
//! [`Query`](crate::Query) node. Arguments are classified by shape; each
//! optional slot (weight, options, binding) is claimed by the first
//! argument that fits it.

mod compose;
mod docs;
mod range;
mod temporal;
mod text;

pub use crate::query::fragment_scope;
pub use compose::{
    and, and_not, boost, document_fragment, locks_fragment, near, not, not_in, or, ordered,
    properties, weight,
};
pub use docs::{collection, directory, document, scope};
pub use range::{range, range_options};
pub use temporal::{lsqt_query, period, period_compare, period_range, temporal_options};
pub use text::{term, term_options, value, word};
