//! Core runtime for viewmap: schema descriptors, values, expression ASTs,
//! Model/Entity translation, generic services and facet aggregation.
#![warn(unreachable_pub)]

extern crate self as viewmap;

#[macro_use]
mod macros;

// public exports are one module level down
pub mod config;
pub mod db;
pub mod error;
pub mod expr;
pub mod mapping;
pub mod model;
pub mod obs;
pub mod service;
pub mod traits;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

pub use error::Error;

///
/// Prelude
///
/// Prelude contains the vocabulary needed to declare records, mappings and
/// services. Collaborator implementations import from `db` directly.
///

pub mod prelude {
    pub use crate::{
        db::{Context, OrderDirection, PaginationPolicy, Repository, Results},
        error::Error,
        expr::{Expr, Lambda, lit},
        mapping::Mapping,
        service::{
            Aggregate, AggregationService, AttachedFacets, Facet, GenericService, Operations,
        },
        traits::{FieldValue, FieldValues, Record},
        value::Value,
    };
}
