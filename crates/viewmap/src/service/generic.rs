use crate::{
    config::ServiceConfig,
    db::{Context, EntityQuery, OrderTerm, PaginationPolicy, Repository, Results, WriteBatch},
    error::{Error, ErrorOrigin},
    expr::{Direction, Expr, Lambda, Param, Translator, lit},
    mapping::{Mapping, MappingError, MappingSet},
    obs::{CallKind, sink::Span},
    service::Operations,
    traits::Record,
};
use std::{fmt, marker::PhantomData, sync::Arc};

///
/// ServiceBuilder
///
/// Declares the mapping table, default Entity order and pagination policy
/// of a `GenericService`. Declaration errors are held until `build`.
///

pub struct ServiceBuilder<M, E> {
    mappings: MappingSet,
    error: Option<MappingError>,
    default_order: Vec<OrderTerm>,
    config: ServiceConfig,
    _marker: PhantomData<fn() -> (M, E)>,
}

impl<M: Record, E: Record> ServiceBuilder<M, E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            mappings: MappingSet::new(),
            error: None,
            default_order: Vec::new(),
            config: ServiceConfig::default(),
            _marker: PhantomData,
        }
    }

    /// Map a Model field chain to an Entity field chain.
    #[must_use]
    pub fn map(
        self,
        model: impl FnOnce(Expr) -> Expr,
        entity: impl FnOnce(Expr) -> Expr,
    ) -> Self {
        self.push(Mapping::init::<M, E>(model, entity))
    }

    /// Map an identity field; key mappings form the update lookup.
    #[must_use]
    pub fn key(self, model: impl FnOnce(Expr) -> Expr, entity: impl FnOnce(Expr) -> Expr) -> Self {
        self.push(Mapping::init::<M, E>(model, entity).map(Mapping::primary_key))
    }

    /// Append an ascending Entity sort key used when a read has no
    /// usable explicit order.
    #[must_use]
    pub fn default_order(mut self, selector: impl FnOnce(Expr) -> Expr) -> Self {
        self.default_order
            .push(OrderTerm::asc(Lambda::of::<E>(selector)));
        self
    }

    #[must_use]
    pub fn default_order_desc(mut self, selector: impl FnOnce(Expr) -> Expr) -> Self {
        self.default_order
            .push(OrderTerm::desc(Lambda::of::<E>(selector)));
        self
    }

    #[must_use]
    pub const fn pagination(mut self, pagination: PaginationPolicy) -> Self {
        self.config.pagination = pagination;
        self
    }

    #[must_use]
    pub const fn config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    fn push(mut self, mapping: Result<Mapping, MappingError>) -> Self {
        if self.error.is_none()
            && let Err(err) = mapping.and_then(|mapping| self.mappings.push(mapping))
        {
            self.error = Some(err);
        }
        self
    }

    /// Validate the declaration and resolve the Entity repository.
    pub fn build<C: Context>(self, context: &C) -> Result<GenericService<M, E>, Error> {
        if let Some(err) = self.error {
            return Err(err.into());
        }
        if self.mappings.is_empty() {
            return Err(MappingError::Empty.into());
        }
        if self.default_order.is_empty() {
            return Err(Error::configuration(
                ErrorOrigin::Service,
                format!(
                    "service {} -> {} has no default order",
                    M::MODEL.path,
                    E::MODEL.path
                ),
            ));
        }

        let repository = context.repository::<E>()?;

        Ok(GenericService {
            mappings: self.mappings,
            default_order: self.default_order,
            pagination: self.config.pagination,
            repository,
            _marker: PhantomData,
        })
    }
}

impl<M: Record, E: Record> Default for ServiceBuilder<M, E> {
    fn default() -> Self {
        Self::new()
    }
}

///
/// GenericService
///
/// CRUD over one Model/Entity pair. Callers speak Model; every predicate
/// and order key is translated to Entity terms before it reaches the
/// repository, and every Entity read is projected back through the same
/// mapping table.
///
/// Configuration is fixed at build time; calls keep their scratch state on
/// the stack, so a shared service is safe to call concurrently.
///

pub struct GenericService<M, E: Record> {
    mappings: MappingSet,
    default_order: Vec<OrderTerm>,
    pagination: PaginationPolicy,
    repository: Arc<dyn Repository<E>>,
    _marker: PhantomData<fn() -> M>,
}

impl<M: Record, E: Record> GenericService<M, E> {
    #[must_use]
    pub fn builder() -> ServiceBuilder<M, E> {
        ServiceBuilder::new()
    }

    #[must_use]
    pub const fn mappings(&self) -> &MappingSet {
        &self.mappings
    }

    #[must_use]
    pub const fn pagination(&self) -> &PaginationPolicy {
        &self.pagination
    }

    //
    // Reads
    //

    pub fn get(&self, filter: Option<&Lambda>) -> Result<Results<M>, Error> {
        self.get_paged(filter, None, None)
    }

    pub fn get_page(
        &self,
        filter: Option<&Lambda>,
        page: Option<i64>,
    ) -> Result<Results<M>, Error> {
        self.get_paged(filter, page, None)
    }

    pub fn get_paged(
        &self,
        filter: Option<&Lambda>,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<Results<M>, Error> {
        self.read(filter, &[], page, page_size)
    }

    /// Every Model, default order, unbounded unless the policy says otherwise.
    pub fn get_all(&self) -> Result<Results<M>, Error> {
        self.get_paged(None, None, None)
    }

    pub fn get_with(
        &self,
        operations: &Operations<M>,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<Results<M>, Error> {
        self.read(operations.predicate(), operations.order(), page, page_size)
    }

    fn read(
        &self,
        filter: Option<&Lambda>,
        order: &[OrderTerm],
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<Results<M>, Error> {
        let mut span = Span::new(CallKind::Get, E::MODEL.path);

        let filter = filter.map(|f| self.translate(f)).transpose()?;
        let order = self.entity_order(order)?;
        let count = self.repository.count(filter.as_ref())?;
        let window = self.pagination.window(page, page_size);

        let entities = self.repository.load(&EntityQuery {
            filter,
            order,
            window,
        })?;
        let items = entities
            .iter()
            .map(|entity| self.project(entity))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            model = M::MODEL.path,
            entity = E::MODEL.path,
            count,
            ?window,
            returned = items.len(),
            "get"
        );

        span.set_rows(items.len() as u64);
        span.complete();

        Ok(Results::new(count, items))
    }

    //
    // Writes
    //

    pub fn create(&self, model: &M) -> Result<Results<M>, Error> {
        self.create_many(std::slice::from_ref(model))
    }

    /// Insert one Entity per Model, commit, and return the Models as
    /// re-read from the written Entities (generated identities included).
    pub fn create_many(&self, models: &[M]) -> Result<Results<M>, Error> {
        let mut span = Span::new(CallKind::Create, E::MODEL.path);

        let entities = models
            .iter()
            .map(|model| {
                let mut entity = E::default();
                self.write_entity(model, &mut entity)?;
                Ok(entity)
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let committed = self
            .repository
            .commit(WriteBatch::new().insert(entities))?;

        let items = committed
            .inserted
            .iter()
            .map(|entity| self.project(entity))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(entity = E::MODEL.path, created = items.len(), "create");

        span.set_rows(items.len() as u64);
        span.complete();

        Ok(Results::new(items.len() as u64, items))
    }

    /// Overwrite the single Entity matching the Model's key mappings with
    /// the Model's non-null fields.
    pub fn update(&self, model: &M) -> Result<Results<M>, Error> {
        let mut span = Span::new(CallKind::Update, E::MODEL.path);

        let lookup = self.key_filter(model);
        match self.repository.count(Some(&lookup))? {
            0 => return Err(Error::not_found(E::MODEL.path, self.key_label(model))),
            1 => {}
            count => {
                return Err(Error::multiple_match(
                    E::MODEL.path,
                    self.key_label(model),
                    count,
                ));
            }
        }

        let mut entity = self
            .repository
            .load(&EntityQuery::new().filter(Some(lookup.clone())))?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(E::MODEL.path, self.key_label(model)))?;

        self.write_entity(model, &mut entity)?;
        let committed = self
            .repository
            .commit(WriteBatch::new().replace(lookup, entity))?;

        // removed by another caller between lookup and commit
        if committed.replaced == 0 {
            return Err(Error::not_found(E::MODEL.path, self.key_label(model)));
        }

        tracing::debug!(entity = E::MODEL.path, key = %self.key_label(model), "update");

        span.set_rows(1);
        span.complete();

        Ok(Results::single(model.clone()))
    }

    /// Sequential single updates; stops at the first failure.
    pub fn update_many(&self, models: &[M]) -> Result<Results<M>, Error> {
        let mut results = Results::empty();
        for model in models {
            results.merge(self.update(model)?);
        }

        Ok(results)
    }

    /// Remove every Entity matching `filter`; true when anything was removed.
    pub fn delete(&self, filter: &Lambda) -> Result<bool, Error> {
        let mut span = Span::new(CallKind::Delete, E::MODEL.path);

        let filter = self.translate(filter)?;
        let removed = self
            .repository
            .commit(WriteBatch::new().remove(Some(filter)))?
            .removed;

        tracing::debug!(entity = E::MODEL.path, removed, "delete");

        span.set_rows(removed);
        span.complete();

        Ok(removed > 0)
    }

    //
    // Facet support
    //

    /// Translate a Model predicate into Entity terms.
    pub fn translate(&self, filter: &Lambda) -> Result<Lambda, Error> {
        Translator::new(&self.mappings, Direction::ModelToEntity)
            .translate(filter)
            .map_err(|err| Error::from(err).with_origin(ErrorOrigin::Translate))
    }

    /// Unwindowed Entity query for `filter`, in default order.
    pub fn entity_query(&self, filter: Option<&Lambda>) -> Result<EntityQuery, Error> {
        Ok(EntityQuery {
            filter: filter.map(|f| self.translate(f)).transpose()?,
            order: self.default_order.clone(),
            window: None,
        })
    }

    pub fn load(&self, filter: Option<&Lambda>) -> Result<Vec<E>, Error> {
        let query = self.entity_query(filter)?;

        Ok(self.repository.load(&query)?)
    }

    /// Build a Model from an Entity through the mapping table.
    pub fn project(&self, entity: &E) -> Result<M, Error> {
        let mut model = M::default();
        for mapping in &self.mappings {
            mapping
                .model()
                .write(&mut model, &mapping.entity().read(entity))?;
        }

        Ok(model)
    }

    /// Entity sort key for a Model field chain.
    pub(crate) fn entity_selector(&self, names: &[&str]) -> Result<Lambda, Error> {
        let mapping = self.mappings.find_by_model(names)?;

        Ok(Lambda::over(Param::new("x", E::MODEL), |x| {
            mapping.entity().to_expr(x)
        }))
    }

    // explicit order when every term is a plain field chain, default otherwise
    fn entity_order(&self, order: &[OrderTerm]) -> Result<Vec<OrderTerm>, Error> {
        let plain: Option<Vec<_>> = order
            .iter()
            .map(|term| {
                term.selector
                    .body
                    .field_chain(&term.selector.param)
                    .map(|names| (names, term.direction))
            })
            .collect();

        match plain {
            Some(terms) if !terms.is_empty() => terms
                .into_iter()
                .map(|(names, direction)| {
                    Ok(OrderTerm::new(self.entity_selector(&names)?, direction))
                })
                .collect(),
            _ => Ok(self.default_order.clone()),
        }
    }

    // null Model fields leave the Entity untouched
    fn write_entity(&self, model: &M, entity: &mut E) -> Result<(), Error> {
        for mapping in &self.mappings {
            let value = mapping.model().read(model);
            if !value.is_null() {
                mapping.entity().write(entity, &value)?;
            }
        }

        Ok(())
    }

    // `true && key1 == v1 && ...` over the Entity
    fn key_filter(&self, model: &M) -> Lambda {
        Lambda::of::<E>(|x| {
            self.mappings.primary_keys().fold(lit(true), |filter, key| {
                let value = key.model().read(model);
                filter.and(key.entity().to_expr(x.clone()).eq(value))
            })
        })
    }

    fn key_label(&self, model: &M) -> KeyLabel {
        KeyLabel(
            self.mappings
                .primary_keys()
                .map(|key| format!("{}={}", key.model(), key.model().read(model)))
                .collect(),
        )
    }
}

///
/// KeyLabel
/// Display form of a Model's key values, for error messages and logs.
///

struct KeyLabel(Vec<String>);

impl fmt::Display for KeyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("(no key)")
        } else {
            f.write_str(&self.0.join(", "))
        }
    }
}
