use axum::{
    body::Body as AxumBody,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::web::models::AuthenticatedUser;
use crate::web::{AppState, error::AppError};

/// Extracts the token key from an `Authorization` header value.
/// Accepts the `Bearer` scheme and the older `Token` scheme.
fn token_from_header(value: &str) -> Option<&str> {
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("Token "))
        .map(str::trim)
        .filter(|key| !key.is_empty())
}

pub async fn auth(
    State(state): State<Arc<AppState>>,
    mut req: Request<AxumBody>,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(token_from_header)
        .map(|s| s.to_string())
        .ok_or_else(|| {
            AppError::Unauthorized("Authentication credentials were not provided.".to_string())
        })?;

    let user = state.tokens.resolve_token(&token).await.map_err(|e| {
        debug!(error = %e, "Rejected bearer token.");
        AppError::from(e)
    })?;

    let authenticated_user = AuthenticatedUser {
        id: user.id,
        email: user.email,
    };
    req.extensions_mut().insert(authenticated_user);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::token_from_header;

    #[test]
    fn test_token_from_header() {
        assert_eq!(token_from_header("Bearer abc123"), Some("abc123"));
        assert_eq!(token_from_header("Token abc123"), Some("abc123"));
        assert_eq!(token_from_header("Bearer "), None);
        assert_eq!(token_from_header("Basic dXNlcjpwdw=="), None);
        assert_eq!(token_from_header("abc123"), None);
    }
}
