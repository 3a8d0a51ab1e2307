use std::sync::Arc;

use crate::assets::AssetService;
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub assets: Arc<AssetService>,
}
