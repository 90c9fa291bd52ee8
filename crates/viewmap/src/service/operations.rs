use crate::{
    db::OrderTerm,
    expr::{Expr, Lambda},
    traits::Record,
};
use std::marker::PhantomData;

///
/// Operations
///
/// Model-side read request: an optional predicate plus order terms,
/// applied as OrderBy/ThenBy in declaration order.
///

#[derive(Clone, Debug)]
pub struct Operations<M> {
    filter: Option<Lambda>,
    order: Vec<OrderTerm>,
    _marker: PhantomData<fn() -> M>,
}

impl<M: Record> Operations<M> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            filter: None,
            order: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Set the predicate, built over `M`.
    #[must_use]
    pub fn filter(self, f: impl FnOnce(Expr) -> Expr) -> Self {
        self.with_filter(Lambda::of::<M>(f))
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Lambda) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn order_by(mut self, f: impl FnOnce(Expr) -> Expr) -> Self {
        self.order.push(OrderTerm::asc(Lambda::of::<M>(f)));
        self
    }

    #[must_use]
    pub fn order_by_desc(mut self, f: impl FnOnce(Expr) -> Expr) -> Self {
        self.order.push(OrderTerm::desc(Lambda::of::<M>(f)));
        self
    }

    #[must_use]
    pub const fn predicate(&self) -> Option<&Lambda> {
        self.filter.as_ref()
    }

    #[must_use]
    pub fn order(&self) -> &[OrderTerm] {
        &self.order
    }
}

impl<M: Record> Default for Operations<M> {
    fn default() -> Self {
        Self::new()
    }
}
