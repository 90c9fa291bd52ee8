use serde::{Deserialize, Serialize};

///
/// Results
///
/// Envelope returned by every service read and write. For reads `count` is
/// the total before pagination and `items` the current page; for writes
/// both describe the written models.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Results<M> {
    pub count: u64,
    pub items: Vec<M>,
}

impl<M> Results<M> {
    #[must_use]
    pub const fn new(count: u64, items: Vec<M>) -> Self {
        Self { count, items }
    }

    #[must_use]
    pub const fn empty() -> Self {
        Self::new(0, Vec::new())
    }

    /// One written item.
    #[must_use]
    pub fn single(item: M) -> Self {
        Self::new(1, vec![item])
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items on this page (not the total).
    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn first(&self) -> Option<&M> {
        self.items.first()
    }

    /// Accumulate another envelope (batch writes).
    pub fn merge(&mut self, other: Self) {
        self.count += other.count;
        self.items.extend(other.items);
    }

    #[must_use]
    pub fn map<N>(self, f: impl FnMut(M) -> N) -> Results<N> {
        Results {
            count: self.count,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

impl<M> Default for Results<M> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<M> IntoIterator for Results<M> {
    type Item = M;
    type IntoIter = std::vec::IntoIter<M>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
