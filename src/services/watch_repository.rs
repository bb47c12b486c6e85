use async_trait::async_trait;
use futures_util::StreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    Collection, Database,
};

use crate::{
    error::AlarmError,
    models::{Watch, WatchUpdate},
};

#[async_trait]
pub trait WatchRepository: Send + Sync {
    async fn list_active(&self) -> Result<Vec<Watch>, AlarmError>;

    /// Writes the cycle's single update for one watch.
    async fn update_one(&self, id: ObjectId, update: &WatchUpdate) -> Result<(), AlarmError>;
}

/// Filter for a cycle's write. A fire only lands on a watch that is still
/// active, so an overlapping cycle that already deactivated it cannot fire it
/// a second time.
pub fn update_filter(id: ObjectId, update: &WatchUpdate) -> Document {
    if update.is_fire() {
        doc! { "_id": id, "active": true }
    } else {
        doc! { "_id": id }
    }
}

#[derive(Clone)]
pub struct MongoWatchRepository {
    alarms: Collection<Watch>,
}

impl MongoWatchRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            alarms: db.collection::<Watch>("alarms"),
        }
    }
}

#[async_trait]
impl WatchRepository for MongoWatchRepository {
    async fn list_active(&self) -> Result<Vec<Watch>, AlarmError> {
        let mut cursor = self
            .alarms
            .find(doc! { "active": true }, None)
            .await
            .map_err(|e| AlarmError::Store(e.to_string()))?;

        let mut items = Vec::new();
        while let Some(res) = cursor.next().await {
            match res {
                Ok(w) if w.target_price.is_finite() && w.target_price > 0.0 => items.push(w),
                Ok(w) => {
                    tracing::warn!(id = %w.id, target_price = w.target_price, "skipping watch with invalid target");
                }
                // one malformed document must not hide every other watch
                Err(e) => tracing::warn!("skipping undecodable watch: {e}"),
            }
        }

        Ok(items)
    }

    async fn update_one(&self, id: ObjectId, update: &WatchUpdate) -> Result<(), AlarmError> {
        let res = self
            .alarms
            .update_one(update_filter(id, update), update.to_set_doc(), None)
            .await
            .map_err(|e| AlarmError::Persistence(e.to_string()))?;

        if res.matched_count == 0 {
            return Err(AlarmError::Persistence(
                "watch no longer active or was deleted".to_string(),
            ));
        }

        Ok(())
    }
}
