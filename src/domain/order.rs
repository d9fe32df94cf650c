//! Order Entity
//!
//! The parent record of an order detail view. Mirrored as single-item
//! state: its subscription merges status changes in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::Entity;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub title: String,
    pub status: String,
    pub agency_id: String,
    pub created_at: DateTime<Utc>,
}

impl Entity for Order {
    type Id = String;

    fn id(&self) -> String {
        self.id.clone()
    }
}
