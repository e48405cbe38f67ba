use serde::{Deserialize, Serialize};

use crate::db::entities::user;
use crate::db::services::OwnedRecord;

// Missing fields deserialize as empty strings so they fail validation (400)
// instead of being rejected by the JSON extractor.

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Public view of a user. Has no password field by construction.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub email: String,
    pub name: String,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        UserResponse {
            email: user.email,
            name: user.name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Payload for tags and ingredients. Any owner field sent by the client is ignored.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateResourceRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResourceResponse {
    pub id: i32,
    pub name: String,
}

impl From<OwnedRecord> for ResourceResponse {
    fn from(record: OwnedRecord) -> Self {
        ResourceResponse {
            id: record.id,
            name: record.name,
        }
    }
}

/// Struct to hold authenticated user details, to be passed as a request extension.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: i32,
    pub email: String,
}
