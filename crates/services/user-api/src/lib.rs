//! User API Library
//!
//! Account management over HTTP: handlers in [`http`], use cases in
//! [`service`], storage access in [`repository`].

pub mod config;
pub mod http;
pub mod infra;
pub mod repository;
pub mod service;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::UserApiConfig;
use crate::http::{create_router, AppState};
use crate::infra::Database;
use crate::repository::UserStore;
use crate::service::UserManager;

/// Wire repository, service and router over an open database.
pub fn build_app(database: Database) -> Router {
    let user_repo = Arc::new(UserStore::new(database.connection()));
    let user_service = Arc::new(UserManager::new(user_repo));
    let state = AppState::new(user_service).with_database(Arc::new(database));

    create_router(state).layer(TraceLayer::new_for_http())
}

/// Run the HTTP server with the given configuration.
pub async fn run_server(config: UserApiConfig) -> Result<(), Box<dyn std::error::Error>> {
    let database = Database::connect(&config.database).await?;
    database.ping().await?;

    let app = build_app(database);

    let addr = config.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("User API listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Connect and ping the database once.
pub async fn check_database(config: &UserApiConfig) -> Result<(), Box<dyn std::error::Error>> {
    let database = Database::connect(&config.database).await?;
    database.ping().await?;
    info!("Database reachable");
    Ok(())
}
