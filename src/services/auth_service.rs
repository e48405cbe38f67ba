use axum::{Extension, Json, extract::State};
use std::sync::Arc;

use crate::db::services::{CredentialStore, TokenIssuer, UserFields, validation::required_text};
use crate::web::error::AppError;
use crate::web::models::{
    AuthenticatedUser, LoginRequest, LoginResponse, RegisterRequest, UserResponse,
};
use crate::web::AppState;

/// Loose shape check: exactly one `@` with text on both sides and no whitespace.
pub fn is_plausible_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

pub async fn register_user(
    credentials: &CredentialStore,
    req: RegisterRequest,
) -> Result<UserResponse, AppError> {
    if req.email.trim().is_empty() {
        return Err(AppError::InvalidInput("The email field may not be blank.".to_string()));
    }
    if !is_plausible_email(&req.email) {
        return Err(AppError::InvalidInput("Enter a valid email address.".to_string()));
    }
    required_text("password", &req.password).map_err(AppError::InvalidInput)?;

    let user_model = credentials
        .create_user(
            &req.email,
            &req.password,
            UserFields {
                name: req.name,
                ..Default::default()
            },
        )
        .await?;

    Ok(user_model.into())
}

pub async fn login_user(
    credentials: &CredentialStore,
    tokens: &TokenIssuer,
    req: LoginRequest,
) -> Result<LoginResponse, AppError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::InvalidInput(
            "Must include \"email\" and \"password\".".to_string(),
        ));
    }

    let user = credentials.verify_credentials(&req.email, &req.password).await?;
    let token = tokens.issue_token(&user).await?;

    Ok(LoginResponse { token: token.key })
}

pub async fn me(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<UserResponse>, AppError> {
    let user_model = app_state
        .credentials
        .get_user(user.id)
        .await?
        .ok_or(AppError::UserNotFound)?;
    Ok(Json(user_model.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_plausible_email() {
        assert!(is_plausible_email("test@tessel.tech"));
        assert!(is_plausible_email("  Vivek@TeSSel.teCh "));
        assert!(!is_plausible_email("no-at-sign"));
        assert!(!is_plausible_email("@tessel.tech"));
        assert!(!is_plausible_email("test@"));
        assert!(!is_plausible_email("a@b@c"));
        assert!(!is_plausible_email("te st@tessel.tech"));
    }
}
