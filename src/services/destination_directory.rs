use std::collections::HashMap;

use async_trait::async_trait;
use futures_util::StreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId},
    Collection, Database,
};

use crate::{error::AlarmError, models::TelegramLink};

#[async_trait]
pub trait DestinationDirectory: Send + Sync {
    async fn verified_links(&self) -> Result<Vec<TelegramLink>, AlarmError>;
}

#[derive(Clone)]
pub struct MongoDestinationDirectory {
    links: Collection<TelegramLink>,
}

impl MongoDestinationDirectory {
    pub fn new(db: &Database) -> Self {
        Self {
            links: db.collection::<TelegramLink>("telegram_links"),
        }
    }
}

#[async_trait]
impl DestinationDirectory for MongoDestinationDirectory {
    async fn verified_links(&self) -> Result<Vec<TelegramLink>, AlarmError> {
        let mut cursor = self
            .links
            .find(doc! { "verified": { "$ne": false } }, None)
            .await
            .map_err(|e| AlarmError::Store(e.to_string()))?;

        let mut items = Vec::new();
        while let Some(res) = cursor.next().await {
            items.push(res.map_err(|e| AlarmError::Store(e.to_string()))?);
        }

        Ok(items)
    }
}

/// Owner -> chat lookup, built once per cycle and dropped with it.
#[derive(Debug, Clone, Default)]
pub struct DestinationBook {
    by_owner: HashMap<ObjectId, String>,
    fallback: Option<String>,
}

impl DestinationBook {
    pub fn build(links: Vec<TelegramLink>, fallback: Option<String>) -> Self {
        let by_owner = links
            .into_iter()
            .filter(TelegramLink::is_usable)
            .map(|l| (l.user_id, l.chat_id.trim().to_string()))
            .collect();

        Self { by_owner, fallback }
    }

    /// The owner's verified chat, else the configured default chat.
    pub fn lookup(&self, owner: &ObjectId) -> Option<&str> {
        self.by_owner
            .get(owner)
            .map(String::as_str)
            .or(self.fallback.as_deref())
    }
}
