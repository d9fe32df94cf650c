//! Chat Entity
//!
//! A conversation scoped to an agency/client pair. Membership is always
//! replaced as a whole set; the remote action owns the diffing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::Entity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMember {
    pub user_id: String,
    pub role: String,
    /// Whether the member sees the chat in their list
    pub visibility: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: String,
    pub name: String,
    pub agency_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub members: Vec<ChatMember>,
}

impl Entity for Chat {
    type Id = String;

    fn id(&self) -> String {
        self.id.clone()
    }
}
