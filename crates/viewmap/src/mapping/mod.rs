//! Model <-> Entity field correspondences.
//!
//! A `Mapping` binds one Model field path to one Entity field path; a
//! `MappingSet` is the ordered, append-only table a service is built from.

use crate::{
    error::ErrorClass,
    expr::{Direction, Expr, FieldPath, Lambda},
    model::SchemaModel,
    traits::Record,
};
use derive_more::{Deref, IntoIterator};
use thiserror::Error as ThisError;

///
/// MappingError
///
/// Declaration and lookup failures. Lookup failures classify as
/// `MappingNotFound`/`AmbiguousMapping`; everything else is a malformed
/// declaration.
///

#[derive(Debug, ThisError)]
pub enum MappingError {
    #[error("selector `{selector}` is not a field chain on its parameter")]
    NotFieldChain { selector: String },

    #[error("unknown field '{field}' on {record}")]
    UnknownField { record: &'static str, field: String },

    #[error("path `{path}` branches through non-record field '{field}'")]
    BranchingPath { path: String, field: &'static str },

    #[error("mapped path `{path}` on {record} does not end in a scalar field")]
    NonScalarLeaf { record: &'static str, path: String },

    #[error("mapping is rooted at {found}, expected {expected}")]
    RootMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("model field `{path}` is already mapped")]
    DuplicateModelPath { path: String },

    #[error("lambda parameter `{param}` is a {found}, expected {expected}")]
    ParameterMismatch {
        param: &'static str,
        found: &'static str,
        expected: &'static str,
    },

    #[error("no mapping declared")]
    Empty,

    #[error("no mapping for `{path}` on {record}")]
    NotFound { record: &'static str, path: String },

    #[error("{count} mappings match `{path}` on {record}")]
    Ambiguous {
        record: &'static str,
        path: String,
        count: usize,
    },
}

impl MappingError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::NotFound { .. } => ErrorClass::MappingNotFound,
            Self::Ambiguous { .. } => ErrorClass::AmbiguousMapping,
            _ => ErrorClass::Configuration,
        }
    }
}

///
/// Mapping
///
/// One Model field path bound to one Entity field path. Primary-key
/// mappings together form the identity predicate used by updates.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Mapping {
    model: FieldPath,
    entity: FieldPath,
    primary_key: bool,
}

impl Mapping {
    /// Resolve both selectors into field paths.
    pub fn new(model: &Lambda, entity: &Lambda) -> Result<Self, MappingError> {
        let model = FieldPath::resolve(model)?;
        let entity = FieldPath::resolve(entity)?;

        for path in [&model, &entity] {
            if !path.leaf().ty.kind.is_scalar() {
                return Err(MappingError::NonScalarLeaf {
                    record: path.root().path,
                    path: path.to_string(),
                });
            }
        }

        Ok(Self {
            model,
            entity,
            primary_key: false,
        })
    }

    /// Typed form of [`Mapping::new`]: `Mapping::init::<M, E>(|m| m.field("id"), |e| e.field("id"))`.
    pub fn init<M: Record, E: Record>(
        model: impl FnOnce(Expr) -> Expr,
        entity: impl FnOnce(Expr) -> Expr,
    ) -> Result<Self, MappingError> {
        Self::new(&Lambda::of::<M>(model), &Lambda::of::<E>(entity))
    }

    /// Flag this mapping as part of the identity key.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    #[must_use]
    pub const fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    #[must_use]
    pub const fn model(&self) -> &FieldPath {
        &self.model
    }

    #[must_use]
    pub const fn entity(&self) -> &FieldPath {
        &self.entity
    }

    /// Path on the side a translation reads from.
    #[must_use]
    pub const fn source(&self, direction: Direction) -> &FieldPath {
        match direction {
            Direction::ModelToEntity => &self.model,
            Direction::EntityToModel => &self.entity,
        }
    }

    /// Path on the side a translation writes to.
    #[must_use]
    pub const fn target(&self, direction: Direction) -> &FieldPath {
        match direction {
            Direction::ModelToEntity => &self.entity,
            Direction::EntityToModel => &self.model,
        }
    }
}

///
/// MappingSet
///
/// Ordered, append-only mapping table. Roots are inferred from the first
/// mapping added; every later mapping must share them and model paths are
/// unique within the set.
///

#[derive(Clone, Debug, Default, Deref, IntoIterator)]
pub struct MappingSet {
    #[deref]
    #[into_iterator(owned, ref)]
    mappings: Vec<Mapping>,
    roots: Option<(&'static SchemaModel, &'static SchemaModel)>,
}

impl MappingSet {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            mappings: Vec::new(),
            roots: None,
        }
    }

    pub fn push(&mut self, mapping: Mapping) -> Result<(), MappingError> {
        let found = (mapping.model.root(), mapping.entity.root());

        match self.roots {
            None => self.roots = Some(found),
            Some((model, entity)) => {
                if model != found.0 {
                    return Err(MappingError::RootMismatch {
                        expected: model.path,
                        found: found.0.path,
                    });
                }
                if entity != found.1 {
                    return Err(MappingError::RootMismatch {
                        expected: entity.path,
                        found: found.1.path,
                    });
                }
            }
        }

        if self.mappings.iter().any(|m| m.model == mapping.model) {
            return Err(MappingError::DuplicateModelPath {
                path: mapping.model.to_string(),
            });
        }

        self.mappings.push(mapping);

        Ok(())
    }

    /// Builder-style [`MappingSet::push`].
    pub fn with(mut self, mapping: Mapping) -> Result<Self, MappingError> {
        self.push(mapping)?;
        Ok(self)
    }

    #[must_use]
    pub const fn model_root(&self) -> Option<&'static SchemaModel> {
        match self.roots {
            Some((model, _)) => Some(model),
            None => None,
        }
    }

    #[must_use]
    pub const fn entity_root(&self) -> Option<&'static SchemaModel> {
        match self.roots {
            Some((_, entity)) => Some(entity),
            None => None,
        }
    }

    /// Source and target roots for `direction`.
    pub fn roots(
        &self,
        direction: Direction,
    ) -> Result<(&'static SchemaModel, &'static SchemaModel), MappingError> {
        let (model, entity) = self.roots.ok_or(MappingError::Empty)?;

        Ok(match direction {
            Direction::ModelToEntity => (model, entity),
            Direction::EntityToModel => (entity, model),
        })
    }

    /// The single mapping whose source path equals `names`.
    pub fn find(&self, direction: Direction, names: &[&str]) -> Result<&Mapping, MappingError> {
        let (source, _) = self.roots(direction)?;
        let mut matches = self
            .mappings
            .iter()
            .filter(|m| m.source(direction).matches(names));

        match (matches.next(), matches.count()) {
            (Some(mapping), 0) => Ok(mapping),
            (None, _) => Err(MappingError::NotFound {
                record: source.path,
                path: names.join("."),
            }),
            (Some(_), rest) => Err(MappingError::Ambiguous {
                record: source.path,
                path: names.join("."),
                count: rest + 1,
            }),
        }
    }

    pub fn find_by_model(&self, names: &[&str]) -> Result<&Mapping, MappingError> {
        self.find(Direction::ModelToEntity, names)
    }

    pub fn find_by_entity(&self, names: &[&str]) -> Result<&Mapping, MappingError> {
        self.find(Direction::EntityToModel, names)
    }

    /// Identity mappings, in declaration order.
    pub fn primary_keys(&self) -> impl Iterator<Item = &Mapping> {
        self.mappings.iter().filter(|m| m.primary_key)
    }
}
