use crate::{
    error::{Error, ErrorOrigin},
    expr::{FieldPath, Lambda},
    model::{FieldKind, SchemaModel},
    service::GenericService,
    traits::Record,
    value::Value,
};
use std::{any::Any, sync::Arc};

///
/// Facet
///
/// Binds one field of a composite Model to the `GenericService` that serves
/// it. `read` pulls the facet's Entity (or Entities) out of a join row and
/// `write` stores the projected Model (or Models) into the composite.
///

pub struct Facet<J, C, M, E: Record> {
    field: &'static str,
    service: Arc<GenericService<M, E>>,
    access: Access<J, C, M, E>,
    primary_key: bool,
}

enum Access<J, C, M, E> {
    One {
        read: fn(&J) -> Option<&E>,
        write: fn(&mut C, M),
    },
    Many {
        read: fn(&J) -> &[E],
        write: fn(&mut C, Vec<M>),
    },
}

impl<J, C, M: Record, E: Record> Facet<J, C, M, E> {
    /// Single-record facet (`Option<M>` on the composite).
    #[must_use]
    pub const fn one(
        field: &'static str,
        service: Arc<GenericService<M, E>>,
        read: fn(&J) -> Option<&E>,
        write: fn(&mut C, M),
    ) -> Self {
        Self {
            field,
            service,
            access: Access::One { read, write },
            primary_key: false,
        }
    }

    /// Collection facet (`Vec<M>` on the composite).
    #[must_use]
    pub const fn many(
        field: &'static str,
        service: Arc<GenericService<M, E>>,
        read: fn(&J) -> &[E],
        write: fn(&mut C, Vec<M>),
    ) -> Self {
        Self {
            field,
            service,
            access: Access::Many { read, write },
            primary_key: false,
        }
    }

    /// Attach this facet before the others.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    #[must_use]
    pub const fn field(&self) -> &'static str {
        self.field
    }

    // composite field kind this facet must be declared with
    pub(super) const fn expected_kind(&self) -> FieldKind {
        match self.access {
            Access::One { .. } => FieldKind::Record(M::MODEL),
            Access::Many { .. } => FieldKind::Records(M::MODEL),
        }
    }
}

///
/// FacetHandle
/// Type-erased facet as stored by `AggregationService`.
///

pub(super) trait FacetHandle<J, C>: Send + Sync {
    fn field(&self) -> &'static str;

    fn model_schema(&self) -> &'static SchemaModel;

    fn is_many(&self) -> bool;

    fn is_primary_key(&self) -> bool;

    /// Load the facet's Entities for a pruned Model predicate.
    fn attach(&self, filter: Option<Lambda>) -> Result<AttachedFacet, Error>;

    /// Entity path behind a facet Model field chain.
    fn order_path(&self, names: &[&str]) -> Result<FieldPath, Error>;

    /// Sort key of one join row. Collection facets have no single key.
    fn order_key(&self, row: &J, path: &FieldPath) -> Result<Value, Error>;

    fn project(&self, row: &J, composite: &mut C) -> Result<(), Error>;
}

impl<J, C, M, E> FacetHandle<J, C> for Facet<J, C, M, E>
where
    M: Record,
    E: Record,
{
    fn field(&self) -> &'static str {
        self.field
    }

    fn model_schema(&self) -> &'static SchemaModel {
        M::MODEL
    }

    fn is_many(&self) -> bool {
        matches!(self.access, Access::Many { .. })
    }

    fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    fn attach(&self, filter: Option<Lambda>) -> Result<AttachedFacet, Error> {
        let rows = self.service.load(filter.as_ref())?;

        Ok(AttachedFacet {
            field: self.field,
            len: rows.len(),
            filter,
            rows: Box::new(rows),
        })
    }

    fn order_path(&self, names: &[&str]) -> Result<FieldPath, Error> {
        let mapping = self.service.mappings().find_by_model(names)?;

        Ok(mapping.entity().clone())
    }

    fn order_key(&self, row: &J, path: &FieldPath) -> Result<Value, Error> {
        match self.access {
            Access::One { read, .. } => {
                Ok(read(row).map_or(Value::Null, |entity| path.read(entity)))
            }
            Access::Many { .. } => Err(Error::invariant(
                ErrorOrigin::Aggregation,
                format!("collection facet '{}' has no single order key", self.field),
            )),
        }
    }

    fn project(&self, row: &J, composite: &mut C) -> Result<(), Error> {
        match self.access {
            Access::One { read, write } => {
                if let Some(entity) = read(row) {
                    write(composite, self.service.project(entity)?);
                }
            }
            Access::Many { read, write } => {
                let models = read(row)
                    .iter()
                    .map(|entity| self.service.project(entity))
                    .collect::<Result<Vec<_>, _>>()?;
                write(composite, models);
            }
        }

        Ok(())
    }
}

///
/// AttachedFacet
///
/// One facet's call-scoped state: its pruned predicate and the Entities it
/// loaded. Built fresh for every aggregation read and dropped with it.
///

pub struct AttachedFacet {
    field: &'static str,
    filter: Option<Lambda>,
    len: usize,
    rows: Box<dyn Any + Send + Sync>,
}

impl AttachedFacet {
    #[must_use]
    pub const fn field(&self) -> &'static str {
        self.field
    }

    #[must_use]
    pub const fn filter(&self) -> Option<&Lambda> {
        self.filter.as_ref()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the facet carries a narrowing predicate.
    ///
    /// A predicate pruned down to a literal constant counts as a clause
    /// unless it is `true`. A real predicate that happens to fold to a
    /// constant is classified the same way.
    #[must_use]
    pub fn has_clause(&self) -> bool {
        match self.filter.as_ref().map(|filter| filter.body.as_constant()) {
            None => false,
            Some(Some(Value::Bool(value))) => !value,
            Some(_) => true,
        }
    }
}

///
/// AttachedFacets
/// Every facet attached for the current call, in attachment order.
///

#[derive(Default)]
pub struct AttachedFacets {
    facets: Vec<AttachedFacet>,
}

impl AttachedFacets {
    pub(super) fn push(&mut self, facet: AttachedFacet) {
        self.facets.push(facet);
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&AttachedFacet> {
        self.facets.iter().find(|facet| facet.field == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttachedFacet> {
        self.facets.iter()
    }

    /// Entities loaded for `field`.
    pub fn rows<E: Record>(&self, field: &str) -> Result<&[E], Error> {
        let facet = self.get(field).ok_or_else(|| {
            Error::configuration(
                ErrorOrigin::Aggregation,
                format!("no facet attached for field '{field}'"),
            )
        })?;

        facet
            .rows
            .downcast_ref::<Vec<E>>()
            .map(Vec::as_slice)
            .ok_or_else(|| {
                Error::configuration(
                    ErrorOrigin::Aggregation,
                    format!("facet '{field}' does not hold {} rows", E::MODEL.path),
                )
            })
    }

    /// See [`AttachedFacet::has_clause`]; false for unknown fields.
    #[must_use]
    pub fn has_clause(&self, field: &str) -> bool {
        self.get(field).is_some_and(AttachedFacet::has_clause)
    }
}
