use axum::{
    extract::State,
    http::Method,
    middleware as axum_middleware,
    routing::get,
    Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::db::services::{CredentialStore, IngredientStore, TagStore, TokenIssuer};
use crate::server::config::ServerConfig;
use crate::web::{middleware::auth, routes::*};

pub use crate::web::error::AppError;

pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;


pub struct AppState {
    pub db_pool: DatabaseConnection,
    pub credentials: Arc<CredentialStore>,
    pub tokens: TokenIssuer,
    pub tags: TagStore,
    pub ingredients: IngredientStore,
}

impl AppState {
    pub fn new(db_pool: DatabaseConnection, config: &ServerConfig) -> Self {
        AppState {
            credentials: Arc::new(CredentialStore::new(
                db_pool.clone(),
                config.password_hash_cost,
            )),
            tokens: TokenIssuer::new(db_pool.clone()),
            tags: TagStore::new(db_pool.clone()),
            ingredients: IngredientStore::new(db_pool.clone()),
            db_pool,
        }
    }
}

async fn health_check_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<&'static str, AppError> {
    app_state.db_pool.ping().await?;
    Ok("OK")
}

pub fn create_axum_router(db_pool: DatabaseConnection, config: &ServerConfig) -> Router {
    let app_state = Arc::new(AppState::new(db_pool, config));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_check_handler))
        .nest(
            "/api/user",
            user_routes::create_public_router().merge(
                user_routes::create_protected_router()
                    .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth::auth)),
            ),
        )
        .nest(
            "/api/recipe",
            recipe_routes::create_recipe_router()
                .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth::auth)),
        )
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
