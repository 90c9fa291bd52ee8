//! Runtime schema descriptors.
//!
//! Records describe themselves through a static `SchemaModel`; expression
//! building, path resolution and translation all read these descriptors
//! instead of reflecting over Rust types.
//!
//! In general:
//! - `record!` declares *what exists*
//! - `model` describes *how it is addressed*
pub mod field;
pub mod schema;


pub use field::{FieldKind, FieldModel, FieldType};
pub use schema::SchemaModel;
