// Book Themes - HTTP Gateway
// axum routes for listing, serving, uploading and deleting book themes.

pub mod auth;
pub mod dto;
pub mod errors;
pub mod handlers;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use rusqlite::Connection;

use crate::config::ServerConfig;
use crate::constants::API_BASE_PATH;
use crate::db::open_db;
use crate::themes::ThemeService;

pub use auth::Caller;
pub use dto::BookThemeDto;
pub use errors::ApiError;

/// Shared, immutable request state.
/// Holds paths only; each request opens a short-lived DB connection via `connect()`.
pub struct AppState {
    pub config: ServerConfig,
    pub service: ThemeService,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let service = ThemeService::new(config.themes_dir());
        Self { config, service }
    }

    pub fn with_service(config: ServerConfig, service: ThemeService) -> Self {
        Self { config, service }
    }

    pub fn connect(&self) -> anyhow::Result<Connection> {
        open_db(&self.config.db_path())
    }
}

pub fn router(state: SharedState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(handlers::health))
        .route(&format!("{}/all", API_BASE_PATH), get(handlers::list_book_themes))
        .route(
            API_BASE_PATH,
            get(handlers::get_book_theme).delete(handlers::delete_book_theme),
        )
        .route(&format!("{}/upload", API_BASE_PATH), post(handlers::upload_book_theme))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
