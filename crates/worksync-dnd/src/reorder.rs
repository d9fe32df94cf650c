//! Reorder Operations
//!
//! Pure transforms over containers: move an item within its container,
//! move it across containers, reorder whole containers. After every
//! transform the affected containers are reindexed so positions are a
//! contiguous 0-based sequence.

use crate::sortable::{Container, Sortable};

/// Move an element from one index to another, shifting the rest
pub fn array_move<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if from == to || from >= items.len() {
        return;
    }
    let item = items.remove(from);
    let to = to.min(items.len());
    items.insert(to, item);
}

/// Rewrite positions as array indices and stamp the container key
pub fn reindex<T: Sortable>(container: &mut Container<T>) {
    let key = container.key.clone();
    for (index, item) in container.items.iter_mut().enumerate() {
        item.set_position(index as i32);
        item.set_container_key(&key);
    }
}

/// Move `item_id` from the source container into the target container.
///
/// The item lands immediately after `over_id` when that item is present in
/// the target; otherwise at the end. Both containers are reindexed. Returns
/// false when the item or a container cannot be resolved.
pub fn move_between<T: Sortable>(
    containers: &mut [Container<T>],
    source_key: &str,
    target_key: &str,
    item_id: &str,
    over_id: Option<&str>,
) -> bool {
    if source_key == target_key {
        return false;
    }

    let Some(source_index) = containers.iter().position(|c| c.key == source_key) else {
        return false;
    };
    let Some(target_index) = containers.iter().position(|c| c.key == target_key) else {
        return false;
    };

    let item = {
        let source = &mut containers[source_index];
        let Some(item_index) = source.index_of(item_id) else {
            return false;
        };
        source.items.remove(item_index)
    };

    {
        let target = &mut containers[target_index];
        let insert_index = over_id
            .and_then(|over| target.index_of(over).map(|i| i + 1))
            .unwrap_or(target.items.len());
        let insert_index = insert_index.min(target.items.len());
        target.items.insert(insert_index, item);
    }

    reindex(&mut containers[source_index]);
    reindex(&mut containers[target_index]);
    true
}

/// Reorder whole containers: the active container moves to the position of
/// the container under the pointer. Item positions are untouched.
pub fn reorder_containers<T>(
    containers: &mut Vec<Container<T>>,
    active_key: &str,
    over_key: &str,
) -> bool {
    let Some(from) = containers.iter().position(|c| c.key == active_key) else {
        return false;
    };
    let Some(to) = containers.iter().position(|c| c.key == over_key) else {
        return false;
    };
    if from == to {
        return false;
    }
    array_move(containers, from, to);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Card {
        id: String,
        position: i32,
        column: String,
    }

    impl Card {
        fn new(id: &str, position: i32, column: &str) -> Self {
            Self {
                id: id.into(),
                position,
                column: column.into(),
            }
        }
    }

    impl Sortable for Card {
        fn sort_id(&self) -> &str {
            &self.id
        }
        fn position(&self) -> i32 {
            self.position
        }
        fn set_position(&mut self, position: i32) {
            self.position = position;
        }
        fn container_key(&self) -> &str {
            &self.column
        }
        fn set_container_key(&mut self, key: &str) {
            self.column = key.to_string();
        }
    }

    fn column(key: &str, ids: &[&str]) -> Container<Card> {
        Container::new(
            key,
            ids.iter()
                .enumerate()
                .map(|(i, id)| Card::new(id, i as i32, key))
                .collect(),
        )
    }

    #[test]
    fn array_move_to_front() {
        let mut items = vec![1, 2, 3];
        array_move(&mut items, 2, 0);
        assert_eq!(items, vec![3, 1, 2]);
    }

    #[test]
    fn array_move_out_of_range_is_noop() {
        let mut items = vec![1, 2, 3];
        array_move(&mut items, 5, 0);
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[test]
    fn reindex_yields_contiguous_positions() {
        let mut col = Container::new(
            "todo",
            vec![
                Card::new("a", 7, "todo"),
                Card::new("b", 2, "done"),
                Card::new("c", -1, "todo"),
            ],
        );
        reindex(&mut col);

        let positions: Vec<i32> = col.items.iter().map(|c| c.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        assert!(col.items.iter().all(|c| c.column == "todo"));
    }

    #[test]
    fn move_between_inserts_after_over_item() {
        let mut cols = vec![column("todo", &["a", "b"]), column("done", &["x", "y"])];
        assert!(move_between(&mut cols, "todo", "done", "a", Some("x")));

        let ids: Vec<&str> = cols[1].items.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "a", "y"]);
        assert!(!cols[0].contains("a"));
        assert_eq!(cols[1].items[1].column, "done");

        let positions: Vec<i32> = cols[1].items.iter().map(|c| c.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn move_between_without_over_appends() {
        let mut cols = vec![column("todo", &["a"]), column("done", &["x"])];
        assert!(move_between(&mut cols, "todo", "done", "a", None));
        let ids: Vec<&str> = cols[1].items.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "a"]);
    }

    #[test]
    fn move_between_into_empty_container() {
        let mut cols = vec![column("todo", &["a", "b"]), column("done", &[])];
        assert!(move_between(&mut cols, "todo", "done", "b", None));
        assert_eq!(cols[1].items.len(), 1);
        assert_eq!(cols[1].items[0].id, "b");
        assert_eq!(cols[1].items[0].position, 0);
    }

    #[test]
    fn move_between_unknown_item_is_noop() {
        let mut cols = vec![column("todo", &["a"]), column("done", &[])];
        assert!(!move_between(&mut cols, "todo", "done", "zz", None));
        assert!(cols[0].contains("a"));
        assert!(cols[1].items.is_empty());
    }

    #[test]
    fn reorder_containers_moves_group() {
        let mut cols = vec![column("todo", &[]), column("doing", &[]), column("done", &[])];
        assert!(reorder_containers(&mut cols, "done", "todo"));
        let keys: Vec<&str> = cols.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["done", "todo", "doing"]);
    }
}
