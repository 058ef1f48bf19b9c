use std::sync::Arc;

use common::PermissionCatalog;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::notify::Notifier;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    /// Role table validated at startup; read-only afterwards.
    pub catalog: Arc<PermissionCatalog>,
    pub notifier: Arc<dyn Notifier>,
}
