//! Sortable Items and Containers
//!
//! The engine works on any item type that exposes an id, an ordinal
//! position and the key of the container it belongs to (a column id, a
//! date key, ...). The container key is denormalized onto the item and is
//! rewritten when the item moves.

/// Contract for items the engine can reorder
pub trait Sortable: Clone {
    /// Unique id of the item
    fn sort_id(&self) -> &str;

    /// Current ordinal position within the owning container
    fn position(&self) -> i32;

    /// Set the ordinal position
    fn set_position(&mut self, position: i32);

    /// Key of the owning container (column id, date key, ...)
    fn container_key(&self) -> &str;

    /// Rewrite the owning container key after a cross-container move
    fn set_container_key(&mut self, key: &str);
}

/// An ordered group of items (board column, calendar cell, list)
#[derive(Clone, Debug)]
pub struct Container<T> {
    pub key: String,
    pub items: Vec<T>,
}

impl<T: Sortable> Container<T> {
    pub fn new(key: impl Into<String>, items: Vec<T>) -> Self {
        Self {
            key: key.into(),
            items,
        }
    }

    /// Index of an item by id, if present
    pub fn index_of(&self, item_id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.sort_id() == item_id)
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.index_of(item_id).is_some()
    }
}
