use std::time::Duration;

use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tracing::{info, warn};

use crate::entity::asset;

pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    // Set connection pool options
    opt.max_connections(50)
        .min_connections(2)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(60))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("shelf::entity::*").sync(&db).await?;

    Ok(db)
}

/// Secondary indexes for the listing filters. Failures are logged, not fatal.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let indexes = [
        ("idx_asset_category_created", vec![asset::Column::Category, asset::Column::CreatedAt]),
        ("idx_asset_theme", vec![asset::Column::Theme]),
        ("idx_asset_created", vec![asset::Column::CreatedAt]),
    ];

    for (name, columns) in indexes {
        let mut stmt = Index::create();
        stmt.if_not_exists().name(name).table(asset::Entity);
        for column in columns {
            stmt.col(column);
        }

        match db
            .execute_unprepared(&stmt.to_string(PostgresQueryBuilder))
            .await
        {
            Ok(_) => info!("Ensured index {name} exists"),
            Err(e) => warn!("Failed to create index {name}: {e}"),
        }
    }

    Ok(())
}
