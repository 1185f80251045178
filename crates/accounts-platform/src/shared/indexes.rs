//! MongoDB Index Initialization
//!
//! Creates the user collection indexes on startup. The unique login index
//! backs the duplicate-key check in `MongoUnitOfWork`.

use mongodb::{Database, IndexModel, bson::doc, options::IndexOptions};
use tracing::info;

use crate::user::repository::USERS_COLLECTION;

/// Initialize all MongoDB indexes
pub async fn initialize_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    info!("Initializing MongoDB indexes...");

    create_user_indexes(db).await?;

    info!("MongoDB indexes initialized successfully");
    Ok(())
}

async fn create_user_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    let collection = db.collection::<mongodb::bson::Document>(USERS_COLLECTION);

    // Login lookup (unique across active and revoked records)
    collection.create_index(
        IndexModel::builder()
            .keys(doc! { "login": 1 })
            .options(IndexOptions::builder()
                .unique(true)
                .name("login_unique".to_string())
                .build())
            .build(),
    ).await?;

    // Active listing, ordered by creation
    collection.create_index(
        IndexModel::builder()
            .keys(doc! { "revokedOn": 1, "createdOn": 1 })
            .build(),
    ).await?;

    // Age queries
    collection.create_index(
        IndexModel::builder()
            .keys(doc! { "birthday": 1 })
            .options(IndexOptions::builder().sparse(true).build())
            .build(),
    ).await?;

    Ok(())
}
