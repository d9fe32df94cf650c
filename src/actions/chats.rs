//! Chat Management Actions
//!
//! Rename, delete and membership replacement over the chat list plus the
//! active-selection slot. Deleting the active chat clears the selection
//! before the remote call and picks the first remaining chat on success.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{Chat, ChatMember, DomainError, DomainResult};
use crate::mutation::OptimisticMutation;
use crate::remote::ChatApi;
use crate::store::{CacheKey, CacheStore};

use super::{active_chat_key, chats_key};

fn active_chat(store: &CacheStore, key: &CacheKey) -> Option<Chat> {
    store.get::<Option<Chat>>(key).flatten()
}

#[derive(Debug, Clone)]
pub struct RenameChatInput {
    pub chat_id: String,
    pub name: String,
}

pub struct ChatListContext {
    previous_chats: Vec<Chat>,
    previous_active: Option<Chat>,
}

pub struct RenameChat {
    store: CacheStore,
    api: Arc<dyn ChatApi>,
    chats_key: CacheKey,
    active_key: CacheKey,
}

impl RenameChat {
    pub fn new(store: CacheStore, api: Arc<dyn ChatApi>) -> Self {
        Self {
            store,
            api,
            chats_key: chats_key(),
            active_key: active_chat_key(),
        }
    }
}

#[async_trait]
impl OptimisticMutation for RenameChat {
    type Input = RenameChatInput;
    type Output = Chat;
    type Context = ChatListContext;

    fn describe(&self) -> &'static str {
        "rename chat"
    }

    fn on_mutate(&self, input: &RenameChatInput) -> DomainResult<ChatListContext> {
        let previous_chats = self
            .store
            .get::<Vec<Chat>>(&self.chats_key)
            .unwrap_or_default();
        let previous_active = active_chat(&self.store, &self.active_key);

        let chat_id = input.chat_id.clone();
        let name = input.name.clone();
        self.store.update::<Vec<Chat>, _>(&self.chats_key, |chats| {
            if let Some(chat) = chats.iter_mut().find(|c| c.id == chat_id) {
                chat.name = name.clone();
            }
        });
        if let Some(active) = previous_active.as_ref().filter(|c| c.id == input.chat_id) {
            let mut renamed = active.clone();
            renamed.name = input.name.clone();
            self.store.set(&self.active_key, Some(renamed));
        }

        Ok(ChatListContext {
            previous_chats,
            previous_active,
        })
    }

    async fn execute(&self, input: &RenameChatInput) -> DomainResult<Chat> {
        self.api.rename_chat(&input.chat_id, &input.name).await
    }

    fn on_error(&self, _input: &RenameChatInput, context: ChatListContext, _error: &DomainError) {
        self.store.set(&self.chats_key, context.previous_chats);
        self.store.set(&self.active_key, context.previous_active);
    }

    fn on_success(&self, _input: &RenameChatInput, _context: ChatListContext, output: &Chat) {
        let confirmed = output.clone();
        self.store.update::<Vec<Chat>, _>(&self.chats_key, |chats| {
            if let Some(chat) = chats.iter_mut().find(|c| c.id == confirmed.id) {
                *chat = confirmed.clone();
            }
        });
        self.store.invalidate(&self.chats_key);
    }
}

#[derive(Debug, Clone)]
pub struct DeleteChatInput {
    pub chat_id: String,
}

pub struct DeleteChat {
    store: CacheStore,
    api: Arc<dyn ChatApi>,
    chats_key: CacheKey,
    active_key: CacheKey,
}

impl DeleteChat {
    pub fn new(store: CacheStore, api: Arc<dyn ChatApi>) -> Self {
        Self {
            store,
            api,
            chats_key: chats_key(),
            active_key: active_chat_key(),
        }
    }
}

#[async_trait]
impl OptimisticMutation for DeleteChat {
    type Input = DeleteChatInput;
    type Output = ();
    type Context = ChatListContext;

    fn describe(&self) -> &'static str {
        "delete chat"
    }

    fn on_mutate(&self, input: &DeleteChatInput) -> DomainResult<ChatListContext> {
        let previous_chats = self
            .store
            .get::<Vec<Chat>>(&self.chats_key)
            .unwrap_or_default();
        let previous_active = active_chat(&self.store, &self.active_key);

        let chat_id = input.chat_id.clone();
        self.store.update::<Vec<Chat>, _>(&self.chats_key, |chats| {
            chats.retain(|c| c.id != chat_id);
        });

        // The selection must not point at a record being removed
        if previous_active.as_ref().map(|c| c.id.as_str()) == Some(input.chat_id.as_str()) {
            self.store.set(&self.active_key, None::<Chat>);
        }

        Ok(ChatListContext {
            previous_chats,
            previous_active,
        })
    }

    async fn execute(&self, input: &DeleteChatInput) -> DomainResult<()> {
        self.api.delete_chat(&input.chat_id).await
    }

    fn on_error(&self, _input: &DeleteChatInput, context: ChatListContext, _error: &DomainError) {
        self.store.set(&self.chats_key, context.previous_chats);
        self.store.set(&self.active_key, context.previous_active);
    }

    fn on_success(&self, input: &DeleteChatInput, context: ChatListContext, _output: &()) {
        // Deterministic fallback: first remaining chat, or none
        if context.previous_active.as_ref().map(|c| c.id.as_str())
            == Some(input.chat_id.as_str())
        {
            let fallback = self
                .store
                .get::<Vec<Chat>>(&self.chats_key)
                .unwrap_or_default()
                .first()
                .cloned();
            self.store.set(&self.active_key, fallback);
        }
        self.store.invalidate(&self.chats_key);
    }
}

#[derive(Debug, Clone)]
pub struct ReplaceChatMembersInput {
    pub chat_id: String,
    /// The complete desired membership; the remote action diffs
    pub members: Vec<ChatMember>,
}

pub struct ReplaceMembersContext {
    previous_chats: Vec<Chat>,
}

pub struct ReplaceChatMembers {
    store: CacheStore,
    api: Arc<dyn ChatApi>,
    chats_key: CacheKey,
}

impl ReplaceChatMembers {
    pub fn new(store: CacheStore, api: Arc<dyn ChatApi>) -> Self {
        Self {
            store,
            api,
            chats_key: chats_key(),
        }
    }
}

#[async_trait]
impl OptimisticMutation for ReplaceChatMembers {
    type Input = ReplaceChatMembersInput;
    type Output = Chat;
    type Context = ReplaceMembersContext;

    fn describe(&self) -> &'static str {
        "update chat members"
    }

    fn on_mutate(&self, input: &ReplaceChatMembersInput) -> DomainResult<ReplaceMembersContext> {
        let previous_chats = self
            .store
            .get::<Vec<Chat>>(&self.chats_key)
            .unwrap_or_default();

        let chat_id = input.chat_id.clone();
        let members = input.members.clone();
        self.store.update::<Vec<Chat>, _>(&self.chats_key, |chats| {
            if let Some(chat) = chats.iter_mut().find(|c| c.id == chat_id) {
                chat.members = members.clone();
            }
        });

        Ok(ReplaceMembersContext { previous_chats })
    }

    async fn execute(&self, input: &ReplaceChatMembersInput) -> DomainResult<Chat> {
        self.api
            .replace_members(&input.chat_id, input.members.clone())
            .await
    }

    fn on_error(
        &self,
        _input: &ReplaceChatMembersInput,
        context: ReplaceMembersContext,
        _error: &DomainError,
    ) {
        self.store.set(&self.chats_key, context.previous_chats);
    }

    fn on_success(
        &self,
        _input: &ReplaceChatMembersInput,
        _context: ReplaceMembersContext,
        output: &Chat,
    ) {
        let confirmed = output.clone();
        self.store.update::<Vec<Chat>, _>(&self.chats_key, |chats| {
            if let Some(chat) = chats.iter_mut().find(|c| c.id == confirmed.id) {
                *chat = confirmed.clone();
            }
        });
        self.store.invalidate(&self.chats_key);
    }
}
