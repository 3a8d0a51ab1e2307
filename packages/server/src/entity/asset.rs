use common::Category;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One committed asset. A row exists only once its file has been relocated
/// into durable storage.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "asset")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub theme: String,

    /// Fixed at commit time.
    pub category: Category,

    /// Path relative to the durable storage root.
    #[sea_orm(unique)]
    pub stored_path: String,

    /// Caller-supplied filename, for display and download headers only.
    pub original_name: String,

    pub size_bytes: i64,

    pub created_at: DateTimeUtc,

    /// ID of the identity that committed the asset. Lookup only.
    pub owner_id: i32,
}

impl ActiveModelBehavior for ActiveModel {}
