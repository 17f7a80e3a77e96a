use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;

use services::dataset_store::DatasetStore;

// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub store: Arc<DatasetStore>,
}

impl AppState {
    pub fn new(config: config::Config, store: DatasetStore) -> Self {
        Self {
            config,
            store: Arc::new(store),
        }
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::routes())
        .merge(routes::uploads::routes(state.config.max_file_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
