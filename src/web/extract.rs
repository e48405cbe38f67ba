use axum::extract::FromRequest;

use crate::web::AppError;

/// JSON request body whose rejections render as [`AppError::InvalidInput`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
