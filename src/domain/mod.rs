//! Domain Layer
//!
//! Synced record types and core abstractions. This layer has no external
//! dependencies beyond serde/chrono for (de)serialization.

mod chat;
mod entity;
mod message;
mod order;
mod task;

pub use chat::{Chat, ChatMember};
pub use entity::{DomainError, DomainResult, Entity};
pub use message::{Attachment, Message, MessageVisibility};
pub use order::Order;
pub use task::{Subtask, Task};
