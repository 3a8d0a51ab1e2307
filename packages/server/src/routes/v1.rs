use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest("/assets", asset_routes(config))
}

fn asset_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let read = OpenApiRouter::new()
        .routes(routes!(handlers::asset::list_assets))
        .routes(routes!(handlers::asset::asset_stats))
        .routes(routes!(
            handlers::asset::get_asset,
            handlers::asset::update_asset,
            handlers::asset::delete_asset
        ))
        .routes(routes!(handlers::asset::serve_asset))
        .routes(routes!(handlers::asset::download_asset));

    let upload = OpenApiRouter::new()
        .routes(routes!(handlers::asset::upload_asset))
        .layer(handlers::asset::upload_body_limit(&config.storage));

    read.merge(upload)
}
