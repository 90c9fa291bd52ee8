//! Storage collaborator boundary.
//!
//! The service layer never touches a backend directly: it hands translated
//! Entity-side ASTs to a `Repository` resolved through a `Context`. This
//! module also owns the non-expression parts of the read pipeline
//! (pagination policy, result envelope) and a reference in-memory store.
mod memory;
mod pagination;
mod repository;
mod response;


pub use memory::{MemoryContext, MemoryRepository};
pub use pagination::{PageWindow, PaginationPolicy};
pub use repository::{
    Committed, Context, EntityQuery, OrderDirection, OrderTerm, Repository, WriteBatch, WriteOp,
};
pub use response::Results;
