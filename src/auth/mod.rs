// SPDX-License-Identifier: MIT
//! Registration, login, and bearer-token sessions.
//!
//! Tokens are opaque 32-byte random values, hex-encoded, stored in the
//! `auth_sessions` table with an expiry. There is no signing or refresh
//! machinery — validity is a single indexed lookup, revocation is a DELETE.

pub mod password;

use chrono::{Duration, Utc};
use rand_core::{OsRng, RngCore};
use sqlx::SqlitePool;
use tracing::info;

use crate::storage::{Storage, UserRow};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("username is already taken")]
    UsernameTaken,
    #[error("email is already registered")]
    EmailTaken,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("missing or expired session token")]
    InvalidToken,
    #[error("{0}")]
    Validation(String),
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Auth session query + write layer over the shared pool.
pub struct SessionStore {
    pool: SqlitePool,
}

impl SessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Issue a fresh token for `user_id`. `ttl_hours = 0` means no expiry.
    pub async fn issue(&self, user_id: &str, ttl_hours: u32) -> Result<String, AuthError> {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        let now = Utc::now();
        let expires_at = if ttl_hours == 0 {
            None
        } else {
            Some((now + Duration::hours(ttl_hours as i64)).to_rfc3339())
        };

        sqlx::query(
            "INSERT INTO auth_sessions (token, user_id, created_at, expires_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&token)
        .bind(user_id)
        .bind(now.to_rfc3339())
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Storage(e.into()))?;

        Ok(token)
    }

    /// Resolve a token to its user. Expired or unknown tokens return `None`.
    pub async fn resolve(&self, token: &str) -> Result<Option<UserRow>, AuthError> {
        let now = Utc::now().to_rfc3339();
        let user = sqlx::query_as::<_, UserRow>(
            "SELECT u.* FROM users u
             JOIN auth_sessions s ON s.user_id = u.id
             WHERE s.token = ? AND (s.expires_at IS NULL OR s.expires_at > ?)",
        )
        .bind(token)
        .bind(&now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Storage(e.into()))?;
        Ok(user)
    }

    /// Delete a token. Unknown tokens are a no-op.
    pub async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        sqlx::query("DELETE FROM auth_sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Storage(e.into()))?;
        Ok(())
    }

    /// Remove expired sessions. Called at startup and opportunistically on login.
    pub async fn prune_expired(&self) -> Result<u64, AuthError> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "DELETE FROM auth_sessions WHERE expires_at IS NOT NULL AND expires_at <= ?",
        )
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Storage(e.into()))?;
        Ok(result.rows_affected())
    }
}

/// Create a new user and issue their first session token.
pub async fn register(
    storage: &Storage,
    username: &str,
    email: &str,
    password: &str,
    ttl_hours: u32,
) -> Result<(UserRow, String), AuthError> {
    let username = username.trim();
    let email = email.trim();
    validate_registration(username, email, password)?;

    let hash = password::hash_password(password)?;
    let user = match storage.create_user(username, email, &hash).await {
        Ok(user) => user,
        Err(e) => {
            // The UNIQUE indexes are the source of truth; classify the
            // violation so the API can say which field collided.
            let msg = e.to_string();
            if msg.contains("users.username") {
                return Err(AuthError::UsernameTaken);
            }
            if msg.contains("users.email") {
                return Err(AuthError::EmailTaken);
            }
            return Err(AuthError::Storage(e));
        }
    };

    let sessions = SessionStore::new(storage.pool());
    let token = sessions.issue(&user.id, ttl_hours).await?;
    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((user, token))
}

/// Verify credentials and issue a session token.
pub async fn login(
    storage: &Storage,
    username: &str,
    password: &str,
    ttl_hours: u32,
) -> Result<(UserRow, String), AuthError> {
    let user = storage
        .get_user_by_username(username.trim())
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !password::verify_password(password, &user.password_hash)? {
        return Err(AuthError::InvalidCredentials);
    }

    let sessions = SessionStore::new(storage.pool());
    sessions.prune_expired().await?;
    let token = sessions.issue(&user.id, ttl_hours).await?;
    info!(user_id = %user.id, "user logged in");
    Ok((user, token))
}

fn validate_registration(username: &str, email: &str, password: &str) -> Result<(), AuthError> {
    if username.len() < 4 || username.len() > 20 {
        return Err(AuthError::Validation(
            "username must be 4-20 characters".to_string(),
        ));
    }
    if !email.contains('@') {
        return Err(AuthError::Validation(
            "email address is not valid".to_string(),
        ));
    }
    if password.len() < 6 {
        return Err(AuthError::Validation(
            "password must be at least 6 characters".to_string(),
        ));
    }
    Ok(())
}
