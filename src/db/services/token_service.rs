use chrono::Utc;
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    SqlErr,
};
use tracing::{debug, info};

use crate::db::entities::{auth_token, prelude::AuthToken, prelude::User, user};

/// Random bytes per token; the key is their lowercase hex encoding.
pub const TOKEN_BYTES: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Invalid token.")]
    InvalidToken,
    #[error("User inactive or deleted.")]
    InactiveUser,
    #[error("Database error: {0}")]
    DbErr(#[from] DbErr),
}

pub fn generate_key() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

/// Issues and resolves the single opaque bearer token each user owns.
#[derive(Clone)]
pub struct TokenIssuer {
    db: DatabaseConnection,
}

impl TokenIssuer {
    pub fn new(db: DatabaseConnection) -> Self {
        TokenIssuer { db }
    }

    async fn find_for_user(&self, user_id: i32) -> Result<Option<auth_token::Model>, DbErr> {
        AuthToken::find()
            .filter(auth_token::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
    }

    /// Returns the user's token, minting one on first use.
    pub async fn issue_token(&self, user: &user::Model) -> Result<auth_token::Model, TokenError> {
        if let Some(existing) = self.find_for_user(user.id).await? {
            return Ok(existing);
        }

        let new_token = auth_token::ActiveModel {
            key: Set(generate_key()),
            user_id: Set(user.id),
            created_at: Set(Utc::now()),
        };

        match new_token.insert(&self.db).await {
            Ok(token) => {
                info!(user_id = user.id, "Issued auth token.");
                Ok(token)
            }
            // Another request issued this user's token first.
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                debug!(user_id = user.id, "Token issued concurrently, reusing it.");
                self.find_for_user(user.id).await?.ok_or(TokenError::DbErr(e))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn resolve_token(&self, key: &str) -> Result<user::Model, TokenError> {
        let found = AuthToken::find_by_id(key.to_owned())
            .find_also_related(User)
            .one(&self.db)
            .await?;

        match found {
            Some((_, Some(user))) if user.is_active => Ok(user),
            Some((_, Some(_))) => Err(TokenError::InactiveUser),
            _ => Err(TokenError::InvalidToken),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::open_in_memory;
    use crate::db::services::user_service::{CredentialStore, UserFields};
    use crate::server::config::MIN_HASH_COST;

    async fn setup() -> (CredentialStore, TokenIssuer) {
        let db = open_in_memory().await.unwrap();
        (
            CredentialStore::new(db.clone(), MIN_HASH_COST),
            TokenIssuer::new(db),
        )
    }

    #[test]
    fn test_generated_keys_are_hex_and_distinct() {
        let a = generate_key();
        let b = generate_key();
        assert_eq!(a.len(), TOKEN_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_issue_token_is_idempotent() {
        let (users, tokens) = setup().await;
        let user = users
            .create_user("test@tessel.tech", "ssshhh123", UserFields::default())
            .await
            .unwrap();

        let first = tokens.issue_token(&user).await.unwrap();
        let second = tokens.issue_token(&user).await.unwrap();
        assert_eq!(first.key, second.key);
        assert_eq!(first.user_id, user.id);
    }

    #[tokio::test]
    async fn test_concurrent_issue_returns_one_token() {
        let (users, tokens) = setup().await;
        let user = users
            .create_user("race@tessel.tech", "ssshhh123", UserFields::default())
            .await
            .unwrap();

        let (a, b) = tokio::join!(tokens.issue_token(&user), tokens.issue_token(&user));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a.key, b.key);
        assert_eq!(tokens.resolve_token(&a.key).await.unwrap().id, user.id);

        let stored = AuthToken::find()
            .filter(auth_token::Column::UserId.eq(user.id))
            .all(&tokens.db)
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn test_each_user_gets_own_token() {
        let (users, tokens) = setup().await;
        let a = users
            .create_user("a@tessel.tech", "pw", UserFields::default())
            .await
            .unwrap();
        let b = users
            .create_user("b@tessel.tech", "pw", UserFields::default())
            .await
            .unwrap();

        let token_a = tokens.issue_token(&a).await.unwrap();
        let token_b = tokens.issue_token(&b).await.unwrap();
        assert_ne!(token_a.key, token_b.key);

        assert_eq!(tokens.resolve_token(&token_a.key).await.unwrap().id, a.id);
        assert_eq!(tokens.resolve_token(&token_b.key).await.unwrap().id, b.id);
    }

    #[tokio::test]
    async fn test_resolve_unknown_token_fails() {
        let (_, tokens) = setup().await;
        let result = tokens.resolve_token(&generate_key()).await;
        assert!(matches!(result, Err(TokenError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_token_of_inactive_user_is_rejected() {
        let (users, tokens) = setup().await;
        let user = users
            .create_user("test@tessel.tech", "ssshhh123", UserFields::default())
            .await
            .unwrap();
        let token = tokens.issue_token(&user).await.unwrap();

        let mut deactivated: user::ActiveModel = user.into();
        deactivated.is_active = Set(false);
        deactivated.update(&tokens.db).await.unwrap();

        let result = tokens.resolve_token(&token.key).await;
        assert!(matches!(result, Err(TokenError::InactiveUser)));
    }
}
