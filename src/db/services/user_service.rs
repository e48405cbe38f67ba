use bcrypt::{BcryptError, non_truncating_hash, non_truncating_verify};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    SqlErr,
};
use tokio::sync::OnceCell;
use tokio::task;
use tracing::{debug, info};

use crate::db::entities::{prelude::User, user};
use crate::db::services::validation::{check_length, required_text};
use crate::web::models::AuthenticatedUser;

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("{0}")]
    Validation(String),
    #[error("A user with the email '{0}' already exists.")]
    DuplicateEmail(String),
    #[error("Unable to log in with provided credentials.")]
    InvalidCredentials,
    #[error("User not found: {0}")]
    NotFound(i32),
    #[error("Password hashing failed: {0}")]
    Hashing(String),
    #[error("Database error: {0}")]
    DbErr(#[from] DbErr),
}

/// Longest password bcrypt hashes without truncation.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Optional attributes applied when a user is created.
#[derive(Debug, Clone)]
pub struct UserFields {
    pub name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl Default for UserFields {
    fn default() -> Self {
        UserFields {
            name: String::new(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
        }
    }
}

/// Partial profile update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Canonical form of an email address: trimmed and lower-cased.
pub fn normalize_email(email: &str) -> Result<String, AccountError> {
    let normalized = email.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(AccountError::Validation(
            "Users must have an email address.".to_string(),
        ));
    }
    check_length("email", &normalized).map_err(AccountError::Validation)?;
    Ok(normalized)
}

/// Owns user records and everything that touches password hashes.
pub struct CredentialStore {
    db: DatabaseConnection,
    hash_cost: u32,
    // Verified against when the email is unknown, so both failure paths cost one bcrypt check.
    dummy_hash: OnceCell<String>,
}

impl CredentialStore {
    pub fn new(db: DatabaseConnection, hash_cost: u32) -> Self {
        CredentialStore {
            db,
            hash_cost,
            dummy_hash: OnceCell::new(),
        }
    }

    async fn hash_password(&self, password: String) -> Result<String, AccountError> {
        let cost = self.hash_cost;
        task::spawn_blocking(move || non_truncating_hash(password, cost))
            .await
            .map_err(|e| AccountError::Hashing(e.to_string()))?
            .map_err(|e| match e {
                BcryptError::Truncation(_) => AccountError::Validation(format!(
                    "Passwords may not be longer than {MAX_PASSWORD_BYTES} bytes."
                )),
                e => AccountError::Hashing(e.to_string()),
            })
    }

    // A password bcrypt would truncate can never match a stored hash.
    async fn check_password(password: String, password_hash: String) -> Result<bool, AccountError> {
        task::spawn_blocking(move || non_truncating_verify(password, &password_hash))
            .await
            .map_err(|e| AccountError::Hashing(e.to_string()))?
            .or_else(|e| match e {
                BcryptError::Truncation(_) => Ok(false),
                e => Err(AccountError::Hashing(e.to_string())),
            })
    }

    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        fields: UserFields,
    ) -> Result<user::Model, AccountError> {
        let email = normalize_email(email)?;
        check_length("name", &fields.name).map_err(AccountError::Validation)?;

        if User::find()
            .filter(user::Column::Email.eq(&email))
            .one(&self.db)
            .await?
            .is_some()
        {
            return Err(AccountError::DuplicateEmail(email));
        }

        let password_hash = self.hash_password(password.to_string()).await?;
        let now = Utc::now();
        let new_user = user::ActiveModel {
            email: Set(email.clone()),
            name: Set(fields.name),
            password_hash: Set(password_hash),
            is_active: Set(fields.is_active),
            is_staff: Set(fields.is_staff),
            is_superuser: Set(fields.is_superuser),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        // A concurrent registration can pass the check above; the unique index decides.
        let user_model = new_user.insert(&self.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => AccountError::DuplicateEmail(email.clone()),
            _ => AccountError::DbErr(e),
        })?;

        info!(user_id = user_model.id, is_superuser = user_model.is_superuser, "User created.");
        Ok(user_model)
    }

    pub async fn create_superuser(
        &self,
        email: &str,
        password: &str,
    ) -> Result<user::Model, AccountError> {
        self.create_user(
            email,
            password,
            UserFields {
                is_staff: true,
                is_superuser: true,
                ..Default::default()
            },
        )
        .await
    }

    /// Returns the user owning `email` if `password` matches and the account is active.
    /// Every failure yields [`AccountError::InvalidCredentials`].
    pub async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<user::Model, AccountError> {
        let email = normalize_email(email).map_err(|_| AccountError::InvalidCredentials)?;
        let user_model = User::find()
            .filter(user::Column::Email.eq(&email))
            .one(&self.db)
            .await?;

        let Some(user_model) = user_model else {
            let dummy = self
                .dummy_hash
                .get_or_try_init(|| self.hash_password("not-a-real-password".to_string()))
                .await?;
            Self::check_password(password.to_string(), dummy.clone()).await?;
            debug!("Login attempt for unknown email.");
            return Err(AccountError::InvalidCredentials);
        };

        let valid_password =
            Self::check_password(password.to_string(), user_model.password_hash.clone()).await?;
        if !valid_password || !user_model.is_active {
            debug!(user_id = user_model.id, "Rejected login attempt.");
            return Err(AccountError::InvalidCredentials);
        }

        Ok(user_model)
    }

    pub async fn get_user(&self, user_id: i32) -> Result<Option<user::Model>, AccountError> {
        Ok(User::find_by_id(user_id).one(&self.db).await?)
    }

    pub async fn update_profile(
        &self,
        user: &AuthenticatedUser,
        update: ProfileUpdate,
    ) -> Result<user::Model, AccountError> {
        let user_model = User::find_by_id(user.id)
            .one(&self.db)
            .await?
            .ok_or(AccountError::NotFound(user.id))?;

        if update.name.is_none() && update.password.is_none() {
            return Ok(user_model);
        }

        let mut active_user: user::ActiveModel = user_model.into();
        if let Some(name) = update.name {
            check_length("name", &name).map_err(AccountError::Validation)?;
            active_user.name = Set(name);
        }
        if let Some(password) = update.password {
            required_text("password", &password).map_err(AccountError::Validation)?;
            active_user.password_hash = Set(self.hash_password(password).await?);
        }
        active_user.updated_at = Set(Utc::now());

        let updated = active_user.update(&self.db).await?;
        info!(user_id = updated.id, "Profile updated.");
        Ok(updated)
    }
}
