//! Model-facing services.
//!
//! `GenericService` runs the translate → order → count → window → project
//! pipeline for one Model/Entity pair; `AggregationService` composes
//! several of them into one composite Model through a caller-supplied join.
mod aggregation;
mod generic;
mod operations;

#[cfg(test)]
mod tests;

pub use aggregation::{Aggregate, AggregationService, AttachedFacet, AttachedFacets, Facet};
pub use generic::{GenericService, ServiceBuilder};
pub use operations::Operations;
