//! Facet aggregation.
//!
//! A composite Model is assembled from several `GenericService`s, one per
//! facet field. Each call scopes the composite predicate to every facet,
//! loads the facet rows, hands them to the caller's join, then orders,
//! windows and projects the joined rows.
mod facet;
mod prune;


use crate::{
    config::ServiceConfig,
    db::{OrderDirection, OrderTerm, PaginationPolicy, Results},
    error::{Error, ErrorOrigin},
    expr::FieldPath,
    obs::{
        CallKind, MetricsEvent,
        sink::{self, Span},
    },
    service::Operations,
    traits::Record,
    value::canonical_cmp,
};
use facet::FacetHandle;
use std::cmp::Ordering;

pub use facet::{AttachedFacet, AttachedFacets, Facet};

// resolved order term: facet, Entity path under it, direction
type OrderKey<'a, J, C> = (&'a dyn FacetHandle<J, C>, FieldPath, OrderDirection);

///
/// Aggregate
///
/// Caller-supplied half of an aggregation: how attached facet rows are
/// combined into join rows, and their order when no usable order is given.
///

pub trait Aggregate: Send + Sync {
    type Model: Record;
    type Join: 'static;

    fn join(&self, facets: &AttachedFacets) -> Result<Vec<Self::Join>, Error>;

    fn default_order(&self, left: &Self::Join, right: &Self::Join) -> Ordering;
}

///
/// AggregationService
///

pub struct AggregationService<A: Aggregate> {
    aggregate: A,
    facets: Vec<Box<dyn FacetHandle<A::Join, A::Model>>>,
    pagination: PaginationPolicy,
}

impl<A: Aggregate> AggregationService<A> {
    #[must_use]
    pub fn new(aggregate: A) -> Self {
        Self {
            aggregate,
            facets: Vec::new(),
            pagination: PaginationPolicy::default(),
        }
    }

    #[must_use]
    pub const fn pagination(mut self, pagination: PaginationPolicy) -> Self {
        self.pagination = pagination;
        self
    }

    #[must_use]
    pub const fn config(self, config: ServiceConfig) -> Self {
        self.pagination(config.pagination)
    }

    /// Register a facet.
    ///
    /// The composite must declare `facet.field()` as a record of the facet
    /// Model (single facets) or a list of them (collection facets), and
    /// each field can be registered once.
    pub fn facet<M, E>(mut self, facet: Facet<A::Join, A::Model, M, E>) -> Result<Self, Error>
    where
        M: Record,
        E: Record,
    {
        let composite = A::Model::MODEL;
        let field = facet.field();

        let declared = composite.field(field).ok_or_else(|| {
            Error::configuration(
                ErrorOrigin::Aggregation,
                format!("{} has no field '{field}'", composite.path),
            )
        })?;

        let expected = facet.expected_kind();
        if declared.ty.kind != expected {
            return Err(Error::configuration(
                ErrorOrigin::Aggregation,
                format!(
                    "facet '{field}' expects {}.{field} to be {expected}, found {}",
                    composite.path, declared.ty.kind
                ),
            ));
        }

        if self.facets.iter().any(|f| f.field() == field) {
            return Err(Error::configuration(
                ErrorOrigin::Aggregation,
                format!("facet '{field}' is already registered"),
            ));
        }

        self.facets.push(Box::new(facet));

        Ok(self)
    }

    #[must_use]
    pub const fn aggregate(&self) -> &A {
        &self.aggregate
    }

    #[must_use]
    pub const fn pagination_policy(&self) -> &PaginationPolicy {
        &self.pagination
    }

    pub fn get_all(&self) -> Result<Results<A::Model>, Error> {
        self.get(&Operations::new(), None, None)
    }

    pub fn get(
        &self,
        operations: &Operations<A::Model>,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<Results<A::Model>, Error> {
        let mut span = Span::new(CallKind::Aggregate, A::Model::MODEL.path);

        let attached = self.attach(operations)?;
        let rows = self.aggregate.join(&attached)?;
        let rows = self.sort(rows, operations.order())?;

        let count = rows.len() as u64;
        let window = self.pagination.window(page, page_size);
        let rows = match window {
            Some(window) => window.apply(rows),
            None => rows,
        };

        let items = rows
            .iter()
            .map(|row| self.project(row))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            model = A::Model::MODEL.path,
            facets = self.facets.len(),
            count,
            ?window,
            returned = items.len(),
            "aggregate"
        );

        span.set_rows(items.len() as u64);
        span.complete();

        Ok(Results::new(count, items))
    }

    //
    // Pipeline
    //

    // primary-key facets are attached first
    fn attach(&self, operations: &Operations<A::Model>) -> Result<AttachedFacets, Error> {
        let mut order: Vec<&dyn FacetHandle<A::Join, A::Model>> =
            self.facets.iter().map(AsRef::as_ref).collect();
        order.sort_by_key(|facet| !facet.is_primary_key());

        let mut attached = AttachedFacets::default();
        for facet in order {
            let filter = operations.predicate().map(|global| {
                prune::scope(global, facet.field(), facet.model_schema(), facet.is_many())
            });

            let entry = facet.attach(filter)?;

            tracing::trace!(
                facet = facet.field(),
                filter = ?entry.filter().map(ToString::to_string),
                rows = entry.len(),
                "facet attached"
            );
            sink::record(MetricsEvent::FacetAttached {
                facet: facet.field(),
                rows: entry.len() as u64,
                filtered: entry.has_clause(),
            });

            attached.push(entry);
        }

        Ok(attached)
    }

    fn sort(&self, mut rows: Vec<A::Join>, order: &[OrderTerm]) -> Result<Vec<A::Join>, Error> {
        let keys = match self.order_keys(order)? {
            Some(keys) if !keys.is_empty() => keys,
            _ => {
                rows.sort_by(|a, b| self.aggregate.default_order(a, b));
                return Ok(rows);
            }
        };

        let mut keyed: Vec<(Vec<_>, A::Join)> = rows
            .into_iter()
            .map(|row| -> Result<_, Error> {
                let values = keys
                    .iter()
                    .map(|(facet, path, _)| facet.order_key(&row, path))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((values, row))
            })
            .collect::<Result<_, _>>()?;

        keyed.sort_by(|(a, _), (b, _)| {
            keys.iter()
                .zip(a.iter().zip(b))
                .map(|((_, _, direction), (a, b))| direction.apply(canonical_cmp(a, b)))
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        });

        Ok(keyed.into_iter().map(|(_, row)| row).collect())
    }

    // Resolve `x.<facet>.<field..>` order terms to Entity paths. `None` when
    // some term is not a plain field chain, which selects the default order.
    fn order_keys(
        &self,
        order: &[OrderTerm],
    ) -> Result<Option<Vec<OrderKey<'_, A::Join, A::Model>>>, Error> {
        let mut keys = Vec::with_capacity(order.len());

        for term in order {
            let Some(names) = term.selector.body.field_chain(&term.selector.param) else {
                return Ok(None);
            };
            let Some((head, rest)) = names.split_first() else {
                return Ok(None);
            };

            let facet = self
                .facets
                .iter()
                .find(|facet| facet.field() == *head)
                .ok_or_else(|| {
                    Error::configuration(
                        ErrorOrigin::Aggregation,
                        format!("no facet registered for order field '{head}'"),
                    )
                })?;

            if facet.is_many() {
                return Err(Error::unsupported(
                    ErrorOrigin::Aggregation,
                    format!("cannot order by collection facet '{head}'"),
                ));
            }
            if rest.is_empty() {
                return Err(Error::unsupported(
                    ErrorOrigin::Aggregation,
                    format!("order term must name a field of facet '{head}'"),
                ));
            }

            let path = facet
                .order_path(rest)
                .map_err(|err| err.with_origin(ErrorOrigin::Aggregation))?;
            keys.push((facet.as_ref(), path, term.direction));
        }

        Ok(Some(keys))
    }

    fn project(&self, row: &A::Join) -> Result<A::Model, Error> {
        let mut composite = A::Model::default();
        for facet in &self.facets {
            facet.project(row, &mut composite)?;
        }

        Ok(composite)
    }
}
