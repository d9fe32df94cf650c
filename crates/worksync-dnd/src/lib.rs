//! Worksync DragDrop Engine
//!
//! UI-agnostic drag-and-drop for ordered containers (board columns,
//! calendar cells, plain lists). Raw pointer input goes through a
//! pluggable gesture recognizer; recognized drags drive a state machine
//! that reorders items, moves them across containers and hands the caller
//! a batch to persist. Nothing here touches a rendering or input library.

mod engine;
mod reorder;
mod sensors;
mod sortable;

pub use engine::{DragEngine, DragState, DropOutcome, Over};
pub use reorder::{array_move, move_between, reindex, reorder_containers};
pub use sensors::{
    GestureEvent, GestureRecognizer, PointerInput, PointerKind, PointerPhase, PointerSensor,
    SensorSet, TouchSensor,
};
pub use sortable::{Container, Sortable};
