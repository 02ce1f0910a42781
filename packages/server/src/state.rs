use std::sync::Arc;

use common::storage::ObjectStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::dispatch::Dispatcher;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub object_store: Arc<dyn ObjectStore>,
    pub dispatcher: Arc<Dispatcher>,
}
