use crate::{db::PageWindow, error::StoreError, expr::Lambda, traits::Record};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, sync::Arc};

///
/// OrderDirection
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    /// Orient an ascending comparison.
    #[must_use]
    pub const fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

///
/// OrderTerm
/// One sort key: a selector lambda plus direction.
///

#[derive(Clone, Debug, PartialEq)]
pub struct OrderTerm {
    pub selector: Lambda,
    pub direction: OrderDirection,
}

impl OrderTerm {
    #[must_use]
    pub const fn new(selector: Lambda, direction: OrderDirection) -> Self {
        Self {
            selector,
            direction,
        }
    }

    #[must_use]
    pub const fn asc(selector: Lambda) -> Self {
        Self::new(selector, OrderDirection::Asc)
    }

    #[must_use]
    pub const fn desc(selector: Lambda) -> Self {
        Self::new(selector, OrderDirection::Desc)
    }
}

///
/// EntityQuery
///
/// Entity-side read request handed to a repository: optional filter, sort
/// keys applied as OrderBy/ThenBy, then an optional page window.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntityQuery {
    pub filter: Option<Lambda>,
    pub order: Vec<OrderTerm>,
    pub window: Option<PageWindow>,
}

impl EntityQuery {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            filter: None,
            order: Vec::new(),
            window: None,
        }
    }

    #[must_use]
    pub fn filter(mut self, filter: Option<Lambda>) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn order_by(mut self, term: OrderTerm) -> Self {
        self.order.push(term);
        self
    }

    #[must_use]
    pub const fn window(mut self, window: Option<PageWindow>) -> Self {
        self.window = window;
        self
    }
}

///
/// WriteOp
/// One staged write inside a `WriteBatch`.
///

#[derive(Clone, Debug, PartialEq)]
pub enum WriteOp<E> {
    Insert(Vec<E>),
    Replace(Lambda, E),
    Remove(Option<Lambda>),
}

///
/// WriteBatch
///
/// Writes staged by one caller. The batch is owned by the call that built
/// it, so concurrent callers never see each other's pending writes.
///

#[derive(Clone, Debug, PartialEq)]
pub struct WriteBatch<E> {
    ops: Vec<WriteOp<E>>,
}

impl<E> WriteBatch<E> {
    #[must_use]
    pub const fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Stage entities for insertion.
    #[must_use]
    pub fn insert(mut self, entities: Vec<E>) -> Self {
        self.ops.push(WriteOp::Insert(entities));
        self
    }

    /// Stage a replacement for every entity matching `filter`.
    #[must_use]
    pub fn replace(mut self, filter: Lambda, entity: E) -> Self {
        self.ops.push(WriteOp::Replace(filter, entity));
        self
    }

    /// Stage removal of every entity matching `filter` (all when `None`).
    #[must_use]
    pub fn remove(mut self, filter: Option<Lambda>) -> Self {
        self.ops.push(WriteOp::Remove(filter));
        self
    }

    #[must_use]
    pub const fn ops(&self) -> &[WriteOp<E>] {
        self.ops.as_slice()
    }

    #[must_use]
    pub fn into_ops(self) -> Vec<WriteOp<E>> {
        self.ops
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl<E> Default for WriteBatch<E> {
    fn default() -> Self {
        Self::new()
    }
}

///
/// Committed
/// What a successful commit wrote.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Committed<E> {
    /// Inserted entities as stored, generated identity values filled in.
    pub inserted: Vec<E>,
    pub replaced: u64,
    pub removed: u64,
}

impl<E> Default for Committed<E> {
    fn default() -> Self {
        Self {
            inserted: Vec::new(),
            replaced: 0,
            removed: 0,
        }
    }
}

///
/// Repository
///
/// Queryable, countable collection of one entity type.
///
/// Reads see committed state only. Writes arrive as one `WriteBatch` per
/// call; `commit` applies the whole batch atomically or fails loudly and
/// leaves committed state untouched.
///

pub trait Repository<E: Record>: Send + Sync {
    /// Number of committed entities matching `filter`.
    fn count(&self, filter: Option<&Lambda>) -> Result<u64, StoreError>;

    fn load(&self, query: &EntityQuery) -> Result<Vec<E>, StoreError>;

    fn commit(&self, batch: WriteBatch<E>) -> Result<Committed<E>, StoreError>;
}

///
/// Context
/// Resolves the repository for an entity type.
///

pub trait Context {
    fn repository<E: Record>(&self) -> Result<Arc<dyn Repository<E>>, StoreError>;
}
