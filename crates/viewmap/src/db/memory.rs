use crate::{
    db::{Committed, Context, EntityQuery, OrderTerm, Repository, WriteBatch, WriteOp},
    error::StoreError,
    expr::{Lambda, eval},
    traits::Record,
    value::{Value, canonical_cmp},
};
use std::{
    any::{Any, TypeId},
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard},
};

///
/// MemoryContext
///
/// Reference `Context`: a type-keyed registry of in-memory repositories.
///

#[derive(Default)]
pub struct MemoryContext {
    repositories: Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl MemoryContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the repository for `E`, returning a handle to it.
    pub fn register<E: Record>(
        &self,
        repository: MemoryRepository<E>,
    ) -> Result<Arc<MemoryRepository<E>>, StoreError> {
        let repository = Arc::new(repository);
        let erased: Arc<dyn Any + Send + Sync> = repository.clone();

        self.lock()?.insert(TypeId::of::<E>(), erased);

        Ok(repository)
    }

    fn lock(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<TypeId, Arc<dyn Any + Send + Sync>>>, StoreError> {
        self.repositories
            .lock()
            .map_err(|_| StoreError::backend("memory context lock poisoned"))
    }
}

impl Context for MemoryContext {
    fn repository<E: Record>(&self) -> Result<Arc<dyn Repository<E>>, StoreError> {
        let erased = self
            .lock()?
            .get(&TypeId::of::<E>())
            .cloned()
            .ok_or(StoreError::UnknownRepository {
                entity: E::MODEL.path,
            })?;

        let repository = erased
            .downcast::<MemoryRepository<E>>()
            .map_err(|_| {
                StoreError::backend(format!(
                    "repository for {} has the wrong type",
                    E::MODEL.path
                ))
            })?;

        Ok(repository)
    }
}

#[derive(Debug)]
struct MemoryState<E> {
    rows: Vec<E>,
    next_identity: i64,
}

///
/// MemoryRepository
///
/// Vec-backed repository evaluating filters and order keys with the
/// reference evaluator. Each batch is applied under one lock against a
/// copy of the rows, so a failed batch leaves nothing behind. An optional
/// identity field is auto-assigned on insert when left at zero/null and
/// must stay unique across commits.
///

#[derive(Debug)]
pub struct MemoryRepository<E> {
    identity: Option<&'static str>,
    state: Mutex<MemoryState<E>>,
}

impl<E: Record> MemoryRepository<E> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            identity: None,
            state: Mutex::new(MemoryState {
                rows: Vec::new(),
                next_identity: 1,
            }),
        }
    }

    /// Auto-assigned, unique integer identity field.
    #[must_use]
    pub const fn with_identity(mut self, field: &'static str) -> Self {
        self.identity = Some(field);
        self
    }

    /// Committed rows, bypassing staging.
    pub fn seed(&self, rows: impl IntoIterator<Item = E>) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        for row in rows {
            if let Some(id) = self.identity_of(&row) {
                state.next_identity = state.next_identity.max(id.saturating_add(1));
            }
            state.rows.push(row);
        }

        Ok(())
    }

    /// Snapshot of committed rows in storage order.
    pub fn rows(&self) -> Result<Vec<E>, StoreError> {
        Ok(self.lock()?.rows.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState<E>>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::backend(format!("{} store lock poisoned", E::MODEL.path)))
    }

    fn identity_of(&self, row: &E) -> Option<i64> {
        let field = self.identity?;

        match row.get_value(field)? {
            Value::Int(v) => Some(v),
            Value::Uint(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    fn assign_identity(&self, next_identity: &mut i64, row: &mut E) -> Result<(), StoreError> {
        let Some(field) = self.identity else {
            return Ok(());
        };
        if self.identity_of(row).is_some_and(|id| id != 0) {
            return Ok(());
        }

        let id = *next_identity;
        *next_identity += 1;

        row.set_value(field, &Value::Int(id))
            .map_err(|err| StoreError::backend(err.to_string()))
    }

    fn check_identity(&self, rows: &[E]) -> Result<(), StoreError> {
        let Some(field) = self.identity else {
            return Ok(());
        };

        let mut seen = HashSet::new();
        for row in rows {
            if let Some(id) = self.identity_of(row)
                && !seen.insert(id)
            {
                return Err(StoreError::Conflict {
                    entity: E::MODEL.path,
                    field,
                    key: id.to_string(),
                });
            }
        }

        Ok(())
    }
}

impl<E: Record> Default for MemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

fn matches<E: Record>(filter: Option<&Lambda>, row: &E) -> Result<bool, StoreError> {
    match filter {
        Some(filter) => {
            eval::predicate(filter, row).map_err(|err| StoreError::backend(err.to_string()))
        }
        None => Ok(true),
    }
}

// stable multi-key sort; keys are evaluated once per row
fn sort_rows<E: Record>(rows: Vec<E>, order: &[OrderTerm]) -> Result<Vec<E>, StoreError> {
    if order.is_empty() {
        return Ok(rows);
    }

    let mut keyed = rows
        .into_iter()
        .map(|row| {
            let keys = order
                .iter()
                .map(|term| eval::selector(&term.selector, &row))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| StoreError::backend(err.to_string()))?;

            Ok((keys, row))
        })
        .collect::<Result<Vec<_>, StoreError>>()?;

    keyed.sort_by(|(a, _), (b, _)| {
        order
            .iter()
            .zip(a.iter().zip(b))
            .map(|(term, (a, b))| term.direction.apply(canonical_cmp(a, b)))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(keyed.into_iter().map(|(_, row)| row).collect())
}

impl<E: Record> Repository<E> for MemoryRepository<E> {
    fn count(&self, filter: Option<&Lambda>) -> Result<u64, StoreError> {
        let state = self.lock()?;
        let mut count = 0;
        for row in &state.rows {
            if matches(filter, row)? {
                count += 1;
            }
        }

        Ok(count)
    }

    fn load(&self, query: &EntityQuery) -> Result<Vec<E>, StoreError> {
        let rows = {
            let state = self.lock()?;
            let mut rows = Vec::new();
            for row in &state.rows {
                if matches(query.filter.as_ref(), row)? {
                    rows.push(row.clone());
                }
            }
            rows
        };

        let rows = sort_rows(rows, &query.order)?;

        Ok(match query.window {
            Some(window) => window.apply(rows),
            None => rows,
        })
    }

    fn commit(&self, batch: WriteBatch<E>) -> Result<Committed<E>, StoreError> {
        let mut state = self.lock()?;
        let mut rows = state.rows.clone();
        let mut next_identity = state.next_identity;
        let mut committed = Committed::default();

        for op in batch.into_ops() {
            match op {
                WriteOp::Insert(entities) => {
                    for mut entity in entities {
                        self.assign_identity(&mut next_identity, &mut entity)?;
                        if let Some(id) = self.identity_of(&entity) {
                            next_identity = next_identity.max(id.saturating_add(1));
                        }
                        committed.inserted.push(entity.clone());
                        rows.push(entity);
                    }
                }
                WriteOp::Replace(filter, entity) => {
                    for row in &mut rows {
                        if matches(Some(&filter), row)? {
                            *row = entity.clone();
                            committed.replaced += 1;
                        }
                    }
                }
                WriteOp::Remove(filter) => {
                    let mut kept = Vec::with_capacity(rows.len());
                    for row in rows {
                        if matches(filter.as_ref(), &row)? {
                            committed.removed += 1;
                        } else {
                            kept.push(row);
                        }
                    }
                    rows = kept;
                }
            }
        }

        self.check_identity(&rows)?;
        state.rows = rows;
        state.next_identity = next_identity;

        Ok(committed)
    }
}
