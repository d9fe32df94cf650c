//! Message Entity
//!
//! Chat/order messages with optional file attachments. Optimistic entries
//! carry a `temp-` prefixed id, the matching `temp_id` and the `pending`
//! flag until the server confirms the record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageVisibility {
    #[default]
    Public,
    /// Visible to agency members only
    Internal,
}

/// File attached to a message. Created after the message itself; the
/// `uploading` flag mirrors the pending state of an optimistic entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub message_id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub temp_id: Option<String>,
    #[serde(default)]
    pub uploading: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    #[serde(default)]
    pub order_id: Option<String>,
    pub user_id: String,
    pub content: String,
    #[serde(default)]
    pub visibility: MessageVisibility,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub temp_id: Option<String>,
    /// True while the record is a local optimistic entry
    #[serde(default)]
    pub pending: bool,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Entity for Message {
    type Id = String;

    fn id(&self) -> String {
        self.id.clone()
    }

    fn temp_marker(&self) -> Option<&str> {
        self.temp_id.as_deref()
    }

    fn is_pending(&self) -> bool {
        self.pending
    }
}
