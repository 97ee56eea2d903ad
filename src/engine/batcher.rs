//! Bounded entity batcher: named collections for one flush window.

use crate::{Collections, Entity};

/// Working set for one flush window. Owned by the Run; consumed on flush.
///
/// `size()` counts raw records (primary items), not collection entries: one record may
/// fan out into several collections.
#[derive(Debug, Default)]
pub struct Batcher {
    collections: Collections,
    primary_items: usize,
}

impl Batcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entity to `collection`, creating it on first use.
    pub fn append(&mut self, collection: &str, entity: Entity) {
        match self.collections.get_mut(collection) {
            Some(items) => items.push(entity),
            None => {
                self.collections.insert(collection.to_string(), vec![entity]);
            }
        }
    }

    /// Count one consumed raw record.
    pub fn record_primary(&mut self) {
        self.primary_items += 1;
    }

    /// Raw records consumed since this batcher was created.
    pub fn size(&self) -> usize {
        self.primary_items
    }

    /// True when no collection holds an entity.
    pub fn is_empty(&self) -> bool {
        self.collections.values().all(Vec::is_empty)
    }

    pub fn entity_count(&self) -> usize {
        self.collections.values().map(Vec::len).sum()
    }

    pub fn collections(&self) -> &Collections {
        &self.collections
    }

    /// Names of collections holding at least one entity.
    pub fn touched(&self) -> impl Iterator<Item = &str> {
        self.collections
            .iter()
            .filter(|(_, items)| !items.is_empty())
            .map(|(name, _)| name.as_str())
    }

    /// Discard everything and start a new window.
    pub fn reset(self) -> Self {
        Self::default()
    }

    pub fn into_collections(self) -> Collections {
        self.collections
    }
}
