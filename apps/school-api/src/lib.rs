pub mod auth;
pub mod chat;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;

use std::sync::Arc;

use chat::dispatcher::ChatDispatcher;
use config::Config;
use db::store::ChatStore;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ChatStore>,
    pub config: Arc<Config>,
    pub chat: ChatDispatcher,
}

impl AppState {
    pub fn new(store: Arc<dyn ChatStore>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
            chat: ChatDispatcher::default(),
        }
    }
}
