use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A user's linked Telegram chat (`telegram_links` collection).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramLink {
    pub user_id: ObjectId,
    pub chat_id: String,

    // links saved before verification existed have no flag
    #[serde(default)]
    pub verified: Option<bool>,
}

impl TelegramLink {
    pub fn is_usable(&self) -> bool {
        self.verified != Some(false) && !self.chat_id.trim().is_empty()
    }
}
