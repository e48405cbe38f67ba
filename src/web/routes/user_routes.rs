use axum::{
    extract::{Extension, State},
    http::{Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::db::services::ProfileUpdate;
use crate::services::auth_service;
use crate::web::{
    models::{AuthenticatedUser, LoginRequest, LoginResponse, RegisterRequest, UpdateProfileRequest, UserResponse},
    AppError, AppState,
    extract::AppJson,
};

/// Registration and token issuance; reachable without credentials.
pub fn create_public_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create", post(register_handler))
        .route("/token", post(token_handler))
}

/// Profile of the calling user; must be wrapped in the auth layer.
pub fn create_protected_router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/me",
        get(auth_service::me)
            .patch(update_me)
            .fallback(method_not_allowed),
    )
}

async fn register_handler(
    State(app_state): State<Arc<AppState>>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user_response = auth_service::register_user(&app_state.credentials, payload).await?;
    Ok((StatusCode::CREATED, Json(user_response)))
}

async fn token_handler(
    State(app_state): State<Arc<AppState>>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let login_response =
        auth_service::login_user(&app_state.credentials, &app_state.tokens, payload).await?;
    Ok(Json(login_response))
}

async fn update_me(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let updated_user = app_state
        .credentials
        .update_profile(
            &auth_user,
            ProfileUpdate {
                name: payload.name,
                password: payload.password,
            },
        )
        .await?;

    Ok(Json(updated_user.into()))
}

async fn method_not_allowed(method: Method) -> AppError {
    AppError::MethodNotAllowed(format!("Method \"{method}\" not allowed."))
}
