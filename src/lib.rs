//! Worksync
//!
//! Client-side state engine for a collaborative order workspace. The
//! crate keeps a local cache of chats, messages, tasks and subtasks in
//! step with a remote database: realtime change events are reconciled
//! into cached collections, writes go through optimistic mutations that
//! roll back on failure, and drag reordering runs against the
//! `worksync-dnd` engine before positions are persisted.
//!
//! Layering, bottom up:
//! - `domain`: entities and the shared error type
//! - `store`: the keyed in-memory cache with change notifications
//! - `subscription`: change-event reconciliation into cached state
//! - `mutation` / `remote` / `actions`: the optimistic write path
//! - `realtime`: channel wiring from the transport to the handlers
//! - `views`: board and calendar projections over tasks

pub mod actions;
pub mod domain;
pub mod mutation;
pub mod realtime;
pub mod remote;
pub mod store;
pub mod subscription;
pub mod views;

pub use worksync_dnd as dnd;
