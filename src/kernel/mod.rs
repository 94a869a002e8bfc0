//! In-process reference kernel: materializes the cavern features into a
//! topology store, numbers its entities and records the command journal.

pub mod block;
pub mod engine;
pub mod imprint;
pub mod materialize;
pub mod profile;
pub mod revolve;

pub use engine::ReferenceKernel;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{SelectionError, TopologyError};
use crate::selection::{EntitySource, EntityView};
use crate::topology::{EntityId, TopologyStore};

/// Numbered view of one materialized scope, as selections read it.
#[derive(Debug, Clone, Default)]
pub struct ScopeIndex {
    views: BTreeMap<u8, Vec<EntityView>>,
    numbers: HashMap<EntityId, usize>,
    results: BTreeMap<String, BTreeMap<u8, BTreeSet<usize>>>,
}

impl ScopeIndex {
    /// Numbers every entity up to `top_dim` and records the results of the
    /// `reporting` features: their domains and everything bounding them.
    ///
    /// # Errors
    ///
    /// Returns an error if the store references a missing entity.
    pub fn new<S: Into<String>>(
        store: &TopologyStore,
        top_dim: u8,
        reporting: impl IntoIterator<Item = S>,
    ) -> Result<Self, TopologyError> {
        let mut index = Self::default();
        for dim in 0..=top_dim {
            let mut views = Vec::new();
            for (i, id) in store.numbered(dim)?.into_iter().enumerate() {
                index.numbers.insert(id, i + 1);
                views.push(EntityView {
                    number: i + 1,
                    bbox: store.bbox(id)?,
                    vertices: store.vertices(id)?,
                });
            }
            index.views.insert(dim, views);
        }

        index.results = reporting.into_iter().map(|t| (t.into(), BTreeMap::new())).collect();
        for domain in store.ids(top_dim) {
            let Some(origin) = store.entity(domain)?.origin.as_deref() else { continue };
            let Some(result) = index.results.get_mut(origin) else { continue };
            for member in store.closure(domain)? {
                let dim = store.entity(member)?.dim;
                let number = index
                    .numbers
                    .get(&member)
                    .copied()
                    .ok_or_else(|| TopologyError::EntityNotFound(format!("number of {member:?}")))?;
                result.entry(dim).or_default().insert(number);
            }
        }
        Ok(index)
    }

    /// Number of an entity within its dimension.
    #[must_use]
    pub fn number_of(&self, id: EntityId) -> Option<usize> {
        self.numbers.get(&id).copied()
    }

    /// Entity count per raw dimension.
    #[must_use]
    pub fn counts(&self) -> BTreeMap<u8, usize> {
        self.views.iter().map(|(dim, v)| (*dim, v.len())).collect()
    }
}

impl EntitySource for ScopeIndex {
    fn entities(&self, dim: u8) -> &[EntityView] {
        self.views.get(&dim).map_or(&[], Vec::as_slice)
    }

    fn feature_result(&self, tag: &str) -> Result<BTreeMap<u8, BTreeSet<usize>>, SelectionError> {
        self.results
            .get(tag)
            .cloned()
            .ok_or_else(|| SelectionError::NoSelectionResult(tag.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::kernel::profile::{embed_region, Frame, Region};
    use crate::math::Point2;

    #[test]
    fn numbering_follows_lowest_corner() {
        let mut store = TopologyStore::new();
        let right = Region::rectangle(Point2::new(2.0, 0.0), [1.0, 1.0]);
        let left = Region::rectangle(Point2::new(0.0, 0.0), [1.0, 1.0]);
        let (right_face, _) = embed_region(&mut store, &right, &Frame::xy(), Some("b")).unwrap();
        let (left_face, _) = embed_region(&mut store, &left, &Frame::xy(), Some("a")).unwrap();
        let index = ScopeIndex::new(&store, 2, ["a"]).unwrap();
        assert_eq!(index.number_of(left_face), Some(1));
        assert_eq!(index.number_of(right_face), Some(2));
        assert_eq!(index.counts()[&1], 8);

        let a = index.feature_result("a").unwrap();
        assert_eq!(a[&2].iter().copied().collect::<Vec<_>>(), [1]);
        assert_eq!(a[&1].len(), 4);
        assert_eq!(a[&0].len(), 4);
        assert!(matches!(index.feature_result("b"), Err(SelectionError::NoSelectionResult(_))));
    }
}
