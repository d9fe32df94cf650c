//! Remote Actions
//!
//! Abstract interfaces over the externally implemented CRUD actions. All
//! calls are async and reject with a `DomainError`; retries, auth and
//! transport concerns live behind the implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Attachment, Chat, ChatMember, DomainResult, Message, MessageVisibility, Subtask, Task,
};

/// Payload for creating a message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessage {
    pub chat_id: String,
    pub user_id: String,
    pub content: String,
    pub visibility: MessageVisibility,
    /// Client-generated marker so the confirmed record can settle the
    /// optimistic entry
    pub temp_id: String,
}

/// Payload for associating a file with a created message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAttachment {
    pub message_id: String,
    pub name: String,
    pub url: String,
    pub temp_id: String,
}

/// Payload for creating a subtask
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubtask {
    pub task_id: String,
    pub title: String,
    pub position: i32,
    pub assignees: Vec<String>,
}

#[async_trait]
pub trait MessageApi: Send + Sync {
    async fn create_message(&self, message: NewMessage) -> DomainResult<Message>;

    /// Soft-deletes; the realtime UPDATE carries the `deleted_on` stamp
    async fn delete_message(&self, chat_id: &str, message_id: &str) -> DomainResult<()>;

    async fn attach_file(&self, attachment: NewAttachment) -> DomainResult<Attachment>;
}

#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn rename_chat(&self, chat_id: &str, name: &str) -> DomainResult<Chat>;

    async fn delete_chat(&self, chat_id: &str) -> DomainResult<()>;

    /// Full-replacement membership update; the remote action diffs
    async fn replace_members(&self, chat_id: &str, members: Vec<ChatMember>)
        -> DomainResult<Chat>;
}

#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn create_subtask(&self, subtask: NewSubtask) -> DomainResult<Subtask>;

    async fn update_subtask(&self, subtask: Subtask) -> DomainResult<Subtask>;

    /// Persist a batch of tasks whose position/container changed
    async fn update_task_positions(&self, tasks: Vec<Task>) -> DomainResult<()>;

    async fn update_subtask_positions(&self, subtasks: Vec<Subtask>) -> DomainResult<()>;
}
