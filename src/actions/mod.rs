//! Action Layer
//!
//! Concrete optimistic mutations for chats, messages and tasks, plus the
//! cache keys their collections live under. Each action speculatively
//! rewrites the injected store, calls its remote action and reconciles on
//! settlement.

mod chats;
mod messages;
mod tasks;

pub use chats::{DeleteChat, DeleteChatInput, RenameChat, RenameChatInput, ReplaceChatMembers, ReplaceChatMembersInput};
pub use messages::{
    DeleteMessage, DeleteMessageInput, PendingAttachment, SendMessage, SendMessageInput,
};
pub use tasks::{
    CreateSubtask, PersistSubtaskPositions, PersistTaskPositions, UpdateSubtask,
};

use crate::store::CacheKey;

pub fn chats_key() -> CacheKey {
    CacheKey::new(["chats"])
}

/// The currently selected chat, stored as `Option<Chat>`
pub fn active_chat_key() -> CacheKey {
    CacheKey::new(["active-chat"])
}

pub fn chat_messages_key(chat_id: &str) -> CacheKey {
    CacheKey::new(["chat-messages", chat_id])
}

pub fn order_tasks_key(order_id: &str) -> CacheKey {
    CacheKey::new(["order-tasks", order_id])
}

pub fn task_subtasks_key(task_id: &str) -> CacheKey {
    CacheKey::new(["subtasks", task_id])
}
