use crate::{
    expr::ast::{Expr, Lambda},
    mapping::MappingError,
    model::{FieldKind, FieldType, SchemaModel},
    traits::{FieldValues, FieldWriteError},
    value::Value,
};
use std::fmt;

///
/// PathSegment
/// One resolved hop of a field path.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PathSegment {
    pub name: &'static str,
    pub owner: &'static SchemaModel,
    pub ty: FieldType,
}

///
/// FieldPath
///
/// Single chain of field accesses from a root schema, e.g. `role.name`.
/// Every hop is validated against its owner schema and every intermediate
/// hop is a nested single record, so a path never branches.
///
/// Paths are resolved once when a mapping is registered; reads and writes
/// then walk the precomputed segments through `FieldValues`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldPath {
    root: &'static SchemaModel,
    hops: Vec<PathSegment>,
    leaf: PathSegment,
}

impl FieldPath {
    /// Resolve the member path of a selector lambda.
    ///
    /// The body must be a field chain rooted at the lambda's own parameter;
    /// conversion wrappers are ignored.
    pub fn resolve(selector: &Lambda) -> Result<Self, MappingError> {
        let names = selector
            .body
            .field_chain(&selector.param)
            .ok_or_else(|| MappingError::NotFieldChain {
                selector: selector.to_string(),
            })?;

        Self::from_names(selector.param.schema, &names)
    }

    /// Resolve a chain of field names against `root`.
    pub fn from_names(root: &'static SchemaModel, names: &[&str]) -> Result<Self, MappingError> {
        let Some((leaf_name, hop_names)) = names.split_last() else {
            return Err(MappingError::NotFieldChain {
                selector: root.path.to_string(),
            });
        };

        let mut hops = Vec::with_capacity(hop_names.len());
        let mut owner = root;

        for name in hop_names {
            let field = owner
                .field(name)
                .ok_or_else(|| MappingError::UnknownField {
                    record: owner.path,
                    field: (*name).to_string(),
                })?;

            hops.push(PathSegment {
                name: field.name,
                owner,
                ty: field.ty,
            });

            owner = match field.ty.kind {
                FieldKind::Record(schema) => schema,
                _ => {
                    return Err(MappingError::BranchingPath {
                        path: names.join("."),
                        field: field.name,
                    });
                }
            };
        }

        let field = owner
            .field(leaf_name)
            .ok_or_else(|| MappingError::UnknownField {
                record: owner.path,
                field: (*leaf_name).to_string(),
            })?;

        Ok(Self {
            root,
            hops,
            leaf: PathSegment {
                name: field.name,
                owner,
                ty: field.ty,
            },
        })
    }

    #[must_use]
    pub const fn root(&self) -> &'static SchemaModel {
        self.root
    }

    /// All hops, leaf last.
    pub fn segments(&self) -> impl Iterator<Item = &PathSegment> {
        self.hops.iter().chain(std::iter::once(&self.leaf))
    }

    #[must_use]
    pub const fn leaf(&self) -> &PathSegment {
        &self.leaf
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hops.len() + 1
    }

    #[must_use]
    pub fn is_single_hop(&self) -> bool {
        self.hops.is_empty()
    }

    /// Static type of the path as read from the root; nullable when any
    /// intermediate record may be null.
    #[must_use]
    pub fn ty(&self) -> FieldType {
        if self.is_single_hop() {
            self.leaf.ty
        } else {
            self.leaf.ty.as_nullable()
        }
    }

    /// True when the path's names equal `names`.
    #[must_use]
    pub fn matches(&self, names: &[&str]) -> bool {
        self.len() == names.len() && self.segments().zip(names).all(|(s, n)| s.name == *n)
    }

    /// Rebuild the chain as field-access nodes on `base`.
    #[must_use]
    pub fn to_expr(&self, base: Expr) -> Expr {
        self.segments().fold(base, |base, segment| Expr::Field {
            base: Box::new(base),
            name: segment.name,
            owner: Some(segment.owner),
        })
    }

    /// Read the leaf value; a null intermediate record reads as `Null`.
    #[must_use]
    pub fn read(&self, record: &dyn FieldValues) -> Value {
        let mut current = record;

        for hop in &self.hops {
            match current.get_record(hop.name) {
                Some(next) => current = next,
                None => return Value::Null,
            }
        }

        current.get_value(self.leaf.name).unwrap_or(Value::Null)
    }

    /// Write the leaf value, allocating null intermediate records.
    pub fn write(
        &self,
        record: &mut dyn FieldValues,
        value: &Value,
    ) -> Result<(), FieldWriteError> {
        let mut current = record;

        for hop in &self.hops {
            current = current
                .get_record_mut(hop.name)
                .ok_or_else(|| FieldWriteError::unknown_field(hop.owner.path, hop.name))?;
        }

        current.set_value(self.leaf.name, value)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(segment.name)?;
        }
        Ok(())
    }
}
