//! Dense re-indexing of source category identifiers.
//!
//! YOLO class ids must form the contiguous range `0..N`. Source documents use
//! arbitrary, often sparse ids, so the converter builds a [`CategoryMap`]
//! first: distinct ids sorted ascending, then numbered in that order. The
//! result depends only on the set of ids, never on the order they arrived in.

use std::collections::{BTreeMap, BTreeSet};

use super::ids::CategoryId;

/// Returned by [`CategoryMap::build`] when no identifiers were supplied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EmptyCategorySet;

/// Order-preserving bijection from source ids onto `0..N`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryMap<K = CategoryId> {
    // Sorted ascending; the position of an id is its dense index.
    sources: Vec<K>,
    dense: BTreeMap<K, usize>,
}

impl<K: Ord + Clone> CategoryMap<K> {
    /// Builds the map from any collection of ids. Duplicates collapse.
    pub fn build<I>(ids: I) -> Result<Self, EmptyCategorySet>
    where
        I: IntoIterator<Item = K>,
    {
        let sources: Vec<K> = ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
        if sources.is_empty() {
            return Err(EmptyCategorySet);
        }

        let dense = sources
            .iter()
            .enumerate()
            .map(|(index, id)| (id.clone(), index))
            .collect();

        Ok(Self { sources, dense })
    }

    /// Dense index assigned to `id`, if it is in the domain.
    pub fn get(&self, id: &K) -> Option<usize> {
        self.dense.get(id).copied()
    }

    /// Source id that was assigned dense index `index`.
    pub fn source_id(&self, index: usize) -> Option<&K> {
        self.sources.get(index)
    }

    /// Whether `id` has a dense index.
    pub fn contains(&self, id: &K) -> bool {
        self.dense.contains_key(id)
    }

    /// Number of classes (`N`).
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Always false for a built map.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// `(source id, dense index)` pairs in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, usize)> + '_ {
        self.sources.iter().enumerate().map(|(index, id)| (id, index))
    }
}
