//! Message Actions
//!
//! Sending inserts an optimistic entry (temp id, pending flag, uploading
//! attachments) before the remote call; the confirmed record settles it.
//! Deleting stamps `deleted_on` locally first. Failures restore the exact
//! pre-mutation list.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::{Attachment, DomainError, DomainResult, Message, MessageVisibility};
use crate::mutation::OptimisticMutation;
use crate::remote::{MessageApi, NewAttachment, NewMessage};
use crate::store::{CacheKey, CacheStore};

use super::{chat_messages_key, chats_key};

/// Attachment selected by the user before the message exists remotely
#[derive(Debug, Clone)]
pub struct PendingAttachment {
    pub name: String,
    pub url: String,
    pub temp_id: String,
}

impl PendingAttachment {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            temp_id: Uuid::new_v4().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SendMessageInput {
    pub content: String,
    pub visibility: MessageVisibility,
    pub attachments: Vec<PendingAttachment>,
    /// Shared between the optimistic entry and the remote payload
    pub temp_id: String,
}

impl SendMessageInput {
    pub fn new(content: impl Into<String>, visibility: MessageVisibility) -> Self {
        Self {
            content: content.into(),
            visibility,
            attachments: Vec::new(),
            temp_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn with_attachments(mut self, attachments: Vec<PendingAttachment>) -> Self {
        self.attachments = attachments;
        self
    }
}

pub struct SendContext {
    previous: Vec<Message>,
}

pub struct SendMessage {
    store: CacheStore,
    api: Arc<dyn MessageApi>,
    chat_id: String,
    user_id: String,
    messages_key: CacheKey,
}

impl SendMessage {
    pub fn new(store: CacheStore, api: Arc<dyn MessageApi>, chat_id: &str, user_id: &str) -> Self {
        Self {
            store,
            api,
            chat_id: chat_id.to_string(),
            user_id: user_id.to_string(),
            messages_key: chat_messages_key(chat_id),
        }
    }

    fn optimistic_entry(&self, input: &SendMessageInput) -> Message {
        Message {
            id: format!("temp-{}", input.temp_id),
            chat_id: self.chat_id.clone(),
            order_id: None,
            user_id: self.user_id.clone(),
            content: input.content.clone(),
            visibility: input.visibility,
            created_at: Utc::now(),
            deleted_on: None,
            temp_id: Some(input.temp_id.clone()),
            pending: true,
            attachments: input
                .attachments
                .iter()
                .map(|attachment| Attachment {
                    id: format!("temp-{}", attachment.temp_id),
                    message_id: format!("temp-{}", input.temp_id),
                    name: attachment.name.clone(),
                    url: attachment.url.clone(),
                    temp_id: Some(attachment.temp_id.clone()),
                    uploading: true,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl OptimisticMutation for SendMessage {
    type Input = SendMessageInput;
    type Output = Message;
    type Context = SendContext;

    fn describe(&self) -> &'static str {
        "send message"
    }

    fn on_mutate(&self, input: &SendMessageInput) -> DomainResult<SendContext> {
        let previous = self
            .store
            .get::<Vec<Message>>(&self.messages_key)
            .unwrap_or_default();

        let mut next = previous.clone();
        next.push(self.optimistic_entry(input));
        self.store.set(&self.messages_key, next);

        Ok(SendContext { previous })
    }

    async fn execute(&self, input: &SendMessageInput) -> DomainResult<Message> {
        let mut message = self
            .api
            .create_message(NewMessage {
                chat_id: self.chat_id.clone(),
                user_id: self.user_id.clone(),
                content: input.content.clone(),
                visibility: input.visibility,
                temp_id: input.temp_id.clone(),
            })
            .await?;

        // Attachments are associated one by one once the id exists
        for attachment in &input.attachments {
            let confirmed = self
                .api
                .attach_file(NewAttachment {
                    message_id: message.id.clone(),
                    name: attachment.name.clone(),
                    url: attachment.url.clone(),
                    temp_id: attachment.temp_id.clone(),
                })
                .await?;
            message.attachments.push(confirmed);
        }

        Ok(message)
    }

    fn on_error(&self, _input: &SendMessageInput, context: SendContext, _error: &DomainError) {
        self.store.set(&self.messages_key, context.previous);
    }

    fn on_success(&self, input: &SendMessageInput, _context: SendContext, output: &Message) {
        let temp_id = input.temp_id.clone();
        let confirmed = output.clone();
        self.store
            .update::<Vec<Message>, _>(&self.messages_key, |messages| {
                if let Some(entry) = messages
                    .iter_mut()
                    .find(|m| m.temp_id.as_deref() == Some(temp_id.as_str()))
                {
                    *entry = confirmed.clone();
                } else if !messages.iter().any(|m| m.id == confirmed.id) {
                    messages.push(confirmed.clone());
                }
            });
        // The chat list shows the last message per chat
        self.store.invalidate(&chats_key());
    }
}

#[derive(Debug, Clone)]
pub struct DeleteMessageInput {
    pub message_id: String,
}

pub struct DeleteContext {
    previous: Vec<Message>,
}

pub struct DeleteMessage {
    store: CacheStore,
    api: Arc<dyn MessageApi>,
    chat_id: String,
    messages_key: CacheKey,
}

impl DeleteMessage {
    pub fn new(store: CacheStore, api: Arc<dyn MessageApi>, chat_id: &str) -> Self {
        Self {
            store,
            api,
            chat_id: chat_id.to_string(),
            messages_key: chat_messages_key(chat_id),
        }
    }
}

#[async_trait]
impl OptimisticMutation for DeleteMessage {
    type Input = DeleteMessageInput;
    type Output = ();
    type Context = DeleteContext;

    fn describe(&self) -> &'static str {
        "delete message"
    }

    fn on_mutate(&self, input: &DeleteMessageInput) -> DomainResult<DeleteContext> {
        let previous = self
            .store
            .get::<Vec<Message>>(&self.messages_key)
            .unwrap_or_default();

        let message_id = input.message_id.clone();
        self.store
            .update::<Vec<Message>, _>(&self.messages_key, |messages| {
                if let Some(message) = messages.iter_mut().find(|m| m.id == message_id) {
                    message.deleted_on = Some(Utc::now());
                }
            });

        Ok(DeleteContext { previous })
    }

    async fn execute(&self, input: &DeleteMessageInput) -> DomainResult<()> {
        self.api
            .delete_message(&self.chat_id, &input.message_id)
            .await
    }

    fn on_error(&self, _input: &DeleteMessageInput, context: DeleteContext, _error: &DomainError) {
        self.store.set(&self.messages_key, context.previous);
    }

    fn on_success(&self, _input: &DeleteMessageInput, _context: DeleteContext, _output: &()) {
        self.store.invalidate(&self.messages_key);
    }
}
