//! Drag State Machine
//!
//! Owns a working copy of the containers for the duration of one drag
//! gesture. Drag start snapshots the containers, drag-over applies
//! speculative cross-container moves so the caller can render them, and
//! drag end settles into a `DropOutcome` carrying the batch to persist
//! plus the snapshot to restore if persistence fails. Ending without a
//! valid target, or cancelling, restores the snapshot.

use std::time::Duration;

use crate::reorder::{array_move, move_between, reindex, reorder_containers};
use crate::sortable::{Container, Sortable};

/// What the pointer is currently over
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Over {
    /// Another item, identified by id
    Item(String),
    /// A container surface (empty column, calendar cell background)
    Container(String),
}

/// Transient state of one drag gesture
#[derive(Clone, Debug)]
pub struct DragState<T> {
    /// Id of the dragged item, or key of the dragged container
    pub active_id: String,
    /// True when a whole container is being dragged
    pub is_container: bool,
    /// Container the item started in (None for container drags)
    pub source_key: Option<String>,
    /// Pre-drag state, restored on cancellation or persistence failure
    snapshot: Vec<Container<T>>,
    last_over_at: Option<Duration>,
}

/// Result of a valid drop; `previous` is the pre-drag snapshot the caller
/// restores when persisting the batch fails
#[derive(Clone, Debug)]
pub enum DropOutcome<T> {
    /// Same-container reorder; `batch` is every item of that container
    /// with freshly contiguous positions
    Reordered {
        container_key: String,
        batch: Vec<T>,
        previous: Vec<Container<T>>,
    },
    /// Cross-container move; `batch` covers both affected containers
    Moved {
        source_key: String,
        target_key: String,
        batch: Vec<T>,
        previous: Vec<Container<T>>,
    },
    /// Whole-container reorder; only the group sequence changed
    ContainersReordered {
        order: Vec<String>,
        previous: Vec<Container<T>>,
    },
}

/// Minimum time between speculative drag-over moves
const OVER_THROTTLE: Duration = Duration::from_millis(50);

pub struct DragEngine<T> {
    containers: Vec<Container<T>>,
    state: Option<DragState<T>>,
    over_throttle: Duration,
}

impl<T: Sortable> DragEngine<T> {
    pub fn new(containers: Vec<Container<T>>) -> Self {
        Self {
            containers,
            state: None,
            over_throttle: OVER_THROTTLE,
        }
    }

    pub fn with_over_throttle(mut self, throttle: Duration) -> Self {
        self.over_throttle = throttle;
        self
    }

    /// Current working copy, including speculative drag-over moves
    pub fn containers(&self) -> &[Container<T>] {
        &self.containers
    }

    pub fn drag_state(&self) -> Option<&DragState<T>> {
        self.state.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.state.is_some()
    }

    /// Replace the working copy, e.g. after an external refetch
    pub fn set_containers(&mut self, containers: Vec<Container<T>>) {
        self.containers = containers;
    }

    /// Restore a snapshot after the persistence call for a drop failed
    pub fn restore(&mut self, previous: Vec<Container<T>>) {
        self.containers = previous;
    }

    fn container_key_of(&self, item_id: &str) -> Option<String> {
        self.containers
            .iter()
            .find(|c| c.contains(item_id))
            .map(|c| c.key.clone())
    }

    fn is_container_id(&self, id: &str) -> bool {
        self.containers.iter().any(|c| c.key == id)
    }

    fn target_key(&self, over: &Over) -> Option<String> {
        match over {
            Over::Container(key) if self.is_container_id(key) => Some(key.clone()),
            Over::Item(id) => self.container_key_of(id),
            Over::Container(_) => None,
        }
    }

    /// Begin a drag for an item id or a container key. Returns false when
    /// the id resolves to nothing.
    pub fn drag_start(&mut self, active_id: &str) -> bool {
        if self.state.is_some() {
            log::warn!("drag_start while a drag is in flight, replacing it");
        }
        let is_container = self.is_container_id(active_id);
        let source_key = if is_container {
            None
        } else {
            match self.container_key_of(active_id) {
                Some(key) => Some(key),
                None => return false,
            }
        };
        self.state = Some(DragState {
            active_id: active_id.to_string(),
            is_container,
            source_key,
            snapshot: self.containers.clone(),
            last_over_at: None,
        });
        true
    }

    /// Speculatively move the dragged item into the hovered container so
    /// the caller can render the move before the drop. Throttled; item
    /// drags only. Nothing is persisted here.
    pub fn drag_over(&mut self, over: &Over, at: Duration) {
        let throttle = self.over_throttle;
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if state.is_container {
            return;
        }
        if let Some(last) = state.last_over_at {
            if at.saturating_sub(last) < throttle {
                return;
            }
        }
        state.last_over_at = Some(at);

        let active_id = state.active_id.clone();
        let Some(current_key) = self.container_key_of(&active_id) else {
            return;
        };
        let Some(target_key) = self.target_key(over) else {
            return;
        };
        if target_key == current_key {
            return;
        }
        let over_id = match over {
            Over::Item(id) => Some(id.as_str()),
            Over::Container(_) => None,
        };
        move_between(
            &mut self.containers,
            &current_key,
            &target_key,
            &active_id,
            over_id,
        );
    }

    /// Settle the gesture. `None` (no recognized drop target) cancels.
    pub fn drag_end(&mut self, over: Option<&Over>) -> Option<DropOutcome<T>> {
        let Some(state) = self.state.take() else {
            return None;
        };
        let Some(over) = over else {
            self.containers = state.snapshot;
            return None;
        };

        if state.is_container {
            return self.settle_container_drag(state, over);
        }
        self.settle_item_drag(state, over)
    }

    /// Explicit cancellation: restore the pre-drag snapshot
    pub fn drag_cancel(&mut self) {
        if let Some(state) = self.state.take() {
            self.containers = state.snapshot;
        }
    }

    fn settle_container_drag(
        &mut self,
        state: DragState<T>,
        over: &Over,
    ) -> Option<DropOutcome<T>> {
        let Some(over_key) = self.target_key(over) else {
            self.containers = state.snapshot;
            return None;
        };
        if !reorder_containers(&mut self.containers, &state.active_id, &over_key) {
            self.containers = state.snapshot;
            return None;
        }
        Some(DropOutcome::ContainersReordered {
            order: self.containers.iter().map(|c| c.key.clone()).collect(),
            previous: state.snapshot,
        })
    }

    fn settle_item_drag(&mut self, state: DragState<T>, over: &Over) -> Option<DropOutcome<T>> {
        let active_id = state.active_id.clone();
        let source_key = state.source_key.clone().unwrap_or_default();

        let Some(current_key) = self.container_key_of(&active_id) else {
            self.containers = state.snapshot;
            return None;
        };
        let Some(target_key) = self.target_key(over) else {
            self.containers = state.snapshot;
            return None;
        };

        // A late hover may still need applying before settling
        if target_key != current_key {
            let over_id = match over {
                Over::Item(id) => Some(id.as_str()),
                Over::Container(_) => None,
            };
            if !move_between(
                &mut self.containers,
                &current_key,
                &target_key,
                &active_id,
                over_id,
            ) {
                self.containers = state.snapshot;
                return None;
            }
        } else if let Over::Item(over_id) = over {
            if *over_id != active_id {
                if let Some(container) = self.containers.iter_mut().find(|c| c.key == target_key) {
                    if let (Some(from), Some(to)) =
                        (container.index_of(&active_id), container.index_of(over_id))
                    {
                        array_move(&mut container.items, from, to);
                        reindex(container);
                    }
                }
            }
        }

        if target_key == source_key {
            // Dropped back where it started without a position change
            if let Over::Container(_) = over {
                self.containers = state.snapshot;
                return None;
            }
            let container = self.containers.iter().find(|c| c.key == target_key)?;
            return Some(DropOutcome::Reordered {
                container_key: target_key,
                batch: container.items.clone(),
                previous: state.snapshot,
            });
        }

        let mut batch = Vec::new();
        for key in [&source_key, &target_key] {
            if let Some(container) = self.containers.iter().find(|c| &c.key == key) {
                batch.extend(container.items.iter().cloned());
            }
        }
        Some(DropOutcome::Moved {
            source_key,
            target_key,
            batch,
            previous: state.snapshot,
        })
    }
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
                .map(|(i, id)| Card {
                    id: id.to_string(),
                    position: i as i32,
                    column: key.to_string(),
                })
                .collect(),
        )
    }

    fn engine(cols: Vec<Container<Card>>) -> DragEngine<Card> {
        DragEngine::new(cols).with_over_throttle(Duration::ZERO)
    }

    fn ids(container: &Container<Card>) -> Vec<&str> {
        container.items.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn same_container_reorder_to_front() {
        let mut engine = engine(vec![column("todo", &["1", "2", "3"])]);
        assert!(engine.drag_start("3"));
        let outcome = engine
            .drag_end(Some(&Over::Item("1".into())))
            .expect("valid drop");

        match outcome {
            DropOutcome::Reordered {
                container_key,
                batch,
                ..
            } => {
                assert_eq!(container_key, "todo");
                let got: Vec<(&str, i32)> =
                    batch.iter().map(|c| (c.id.as_str(), c.position)).collect();
                assert_eq!(got, vec![("3", 0), ("1", 1), ("2", 2)]);
            }
            other => panic!("expected Reordered, got {other:?}"),
        }
    }

    #[test]
    fn cross_container_move_updates_membership_and_key() {
        let mut engine = engine(vec![column("todo", &["a", "b"]), column("done", &["x"])]);
        engine.drag_start("a");
        engine.drag_over(&Over::Item("x".into()), Duration::from_millis(100));
        let outcome = engine
            .drag_end(Some(&Over::Item("x".into())))
            .expect("valid drop");

        match outcome {
            DropOutcome::Moved {
                source_key,
                target_key,
                batch,
                ..
            } => {
                assert_eq!(source_key, "todo");
                assert_eq!(target_key, "done");
                let moved = batch.iter().find(|c| c.id == "a").unwrap();
                assert_eq!(moved.column, "done");
            }
            other => panic!("expected Moved, got {other:?}"),
        }
        assert!(!engine.containers()[0].contains("a"));
        assert_eq!(ids(&engine.containers()[1]), vec!["x", "a"]);
    }

    #[test]
    fn drop_on_empty_container_appends() {
        let mut engine = engine(vec![column("todo", &["a", "b"]), column("done", &[])]);
        engine.drag_start("b");
        let outcome = engine
            .drag_end(Some(&Over::Container("done".into())))
            .expect("valid drop");

        match outcome {
            DropOutcome::Moved { target_key, .. } => assert_eq!(target_key, "done"),
            other => panic!("expected Moved, got {other:?}"),
        }
        assert_eq!(ids(&engine.containers()[1]), vec!["b"]);
        assert_eq!(engine.containers()[1].items[0].position, 0);
    }

    #[test]
    fn drag_end_without_target_restores_snapshot() {
        let before = vec![column("todo", &["a", "b"]), column("done", &["x"])];
        let mut engine = engine(before.clone());
        engine.drag_start("a");
        engine.drag_over(&Over::Container("done".into()), Duration::from_millis(100));
        assert_eq!(ids(&engine.containers()[1]), vec!["x", "a"]);

        assert!(engine.drag_end(None).is_none());
        assert_eq!(ids(&engine.containers()[0]), vec!["a", "b"]);
        assert_eq!(ids(&engine.containers()[1]), vec!["x"]);
        assert!(!engine.is_dragging());
    }

    #[test]
    fn drag_cancel_restores_snapshot() {
        let mut engine = engine(vec![column("todo", &["a", "b"]), column("done", &[])]);
        engine.drag_start("a");
        engine.drag_over(&Over::Container("done".into()), Duration::from_millis(100));
        engine.drag_cancel();

        assert_eq!(ids(&engine.containers()[0]), vec!["a", "b"]);
        assert!(engine.containers()[1].items.is_empty());
    }

    #[test]
    fn container_drag_reorders_groups_only() {
        let mut engine = engine(vec![
            column("todo", &["a"]),
            column("doing", &["b"]),
            column("done", &["c"]),
        ]);
        engine.drag_start("done");
        let outcome = engine
            .drag_end(Some(&Over::Container("todo".into())))
            .expect("valid drop");

        match outcome {
            DropOutcome::ContainersReordered { order, .. } => {
                assert_eq!(order, vec!["done", "todo", "doing"]);
            }
            other => panic!("expected ContainersReordered, got {other:?}"),
        }
        // Item membership untouched
        assert_eq!(ids(&engine.containers()[0]), vec!["c"]);
    }

    #[test]
    fn over_events_are_throttled() {
        let mut engine = DragEngine::new(vec![
            column("todo", &["a"]),
            column("doing", &[]),
            column("done", &[]),
        ]);
        engine.drag_start("a");
        engine.drag_over(&Over::Container("doing".into()), Duration::from_millis(10));
        // Second hover lands within the throttle window and is dropped
        engine.drag_over(&Over::Container("done".into()), Duration::from_millis(30));

        assert_eq!(ids(&engine.containers()[1]), vec!["a"]);
        assert!(engine.containers()[2].items.is_empty());
    }

    #[test]
    fn restore_reverts_persisted_failure() {
        let mut engine = engine(vec![column("todo", &["1", "2", "3"])]);
        engine.drag_start("3");
        let outcome = engine.drag_end(Some(&Over::Item("1".into()))).unwrap();

        let previous = match outcome {
            DropOutcome::Reordered { previous, .. } => previous,
            other => panic!("expected Reordered, got {other:?}"),
        };
        engine.restore(previous);
        assert_eq!(ids(&engine.containers()[0]), vec!["1", "2", "3"]);
    }

    #[test]
    fn drop_back_on_own_container_is_a_noop() {
        let mut engine = engine(vec![column("todo", &["a", "b"])]);
        engine.drag_start("a");
        assert!(engine
            .drag_end(Some(&Over::Container("todo".into())))
            .is_none());
        assert_eq!(ids(&engine.containers()[0]), vec!["a", "b"]);
    }

    #[test]
    fn unknown_active_id_does_not_start() {
        let mut engine = engine(vec![column("todo", &["a"])]);
        assert!(!engine.drag_start("missing"));
        assert!(!engine.is_dragging());
    }
}
