//! Predicate and selector ASTs.
//!
//! Lambdas are built against a record schema, resolved into field paths
//! when mappings are declared, rewritten between schemas by the
//! `Translator`, and executed by the reference evaluator in `eval`.
mod ast;
mod build;
pub mod eval;
mod path;
mod translate;

#[cfg(test)]
mod tests;

pub use ast::{BinaryOp, Expr, Lambda, Method, Param, UnaryOp};
pub use build::lit;
pub use eval::EvalError;
pub use path::{FieldPath, PathSegment};
pub use translate::{Direction, Translator};
