use axum::{
    extract::{Extension, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::db::services::{Creatable, Listable};
use crate::web::models::{AuthenticatedUser, CreateResourceRequest, ResourceResponse};
use crate::web::{AppError, AppState, extract::AppJson};

// --- Shared handlers over any owner-scoped store ---

async fn list_owned<S: Listable>(
    store: &S,
    owner: &AuthenticatedUser,
) -> Result<Json<Vec<ResourceResponse>>, AppError> {
    let records = store.list(owner).await?;
    Ok(Json(records.into_iter().map(ResourceResponse::from).collect()))
}

async fn create_owned<S: Creatable>(
    store: &S,
    owner: &AuthenticatedUser,
    payload: CreateResourceRequest,
) -> Result<(StatusCode, Json<ResourceResponse>), AppError> {
    let record = store.create(owner, &payload.name).await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

// --- Route Handlers ---

async fn list_tags_handler(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<ResourceResponse>>, AppError> {
    list_owned(&app_state.tags, &user).await
}

async fn create_tag_handler(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    AppJson(payload): AppJson<CreateResourceRequest>,
) -> Result<(StatusCode, Json<ResourceResponse>), AppError> {
    create_owned(&app_state.tags, &user, payload).await
}

async fn list_ingredients_handler(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<ResourceResponse>>, AppError> {
    list_owned(&app_state.ingredients, &user).await
}

async fn create_ingredient_handler(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    AppJson(payload): AppJson<CreateResourceRequest>,
) -> Result<(StatusCode, Json<ResourceResponse>), AppError> {
    create_owned(&app_state.ingredients, &user, payload).await
}

// --- Router ---

pub fn create_recipe_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tags", get(list_tags_handler).post(create_tag_handler))
        .route(
            "/ingredients",
            get(list_ingredients_handler).post(create_ingredient_handler),
        )
}
