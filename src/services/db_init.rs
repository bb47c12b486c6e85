use mongodb::{
    bson::doc,
    options::IndexOptions,
    Database, IndexModel,
};

pub async fn ensure_indexes(db: &Database) -> Result<(), String> {
    // alarms: the cycle scans active watches and groups them by instrument
    {
        let col = db.collection::<mongodb::bson::Document>("alarms");
        let model = IndexModel::builder()
            .keys(doc! { "active": 1, "symbol": 1, "market_type": 1 })
            .build();

        col.create_index(model, None)
            .await
            .map_err(|e| e.to_string())?;
    }

    // telegram_links: one chat per user
    {
        let col = db.collection::<mongodb::bson::Document>("telegram_links");
        let model = IndexModel::builder()
            .keys(doc! { "user_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        col.create_index(model, None)
            .await
            .map_err(|e| e.to_string())?;
    }

    Ok(())
}
