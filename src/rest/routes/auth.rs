// rest/routes/auth.rs — registration, login, logout, current user.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{self, SessionStore};
use crate::rest::error::ApiError;
use crate::rest::extract::{AuthUser, BearerToken};
use crate::storage::UserRow;
use crate::AppContext;

/// Public JSON shape of a user. Shared by every endpoint that returns one
/// so the client never sees two different spellings of the same account.
pub(crate) fn user_json(user: &UserRow) -> Value {
    json!({
        "id": user.id,
        "username": user.username,
        "email": user.email,
        "description": user.description,
        "photo": user.photo_file,
        "xp": user.xp,
        "level": user.level(),
        "streak": user.streak,
        "active_pet": user.active_pet,
        "joined_at": user.joined_at,
    })
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn register(
    State(ctx): State<Arc<AppContext>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<Value>, ApiError> {
    let (user, token) = auth::register(
        &ctx.storage,
        &req.username,
        &req.email,
        &req.password,
        ctx.config.session_ttl_hours,
    )
    .await?;

    Ok(Json(json!({
        "token": token,
        "user": user_json(&user),
    })))
}

pub async fn login(
    State(ctx): State<Arc<AppContext>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let (user, token) = auth::login(
        &ctx.storage,
        &req.username,
        &req.password,
        ctx.config.session_ttl_hours,
    )
    .await?;

    Ok(Json(json!({
        "token": token,
        "user": user_json(&user),
    })))
}

pub async fn logout(
    State(ctx): State<Arc<AppContext>>,
    _user: AuthUser,
    BearerToken(token): BearerToken,
) -> Result<Json<Value>, ApiError> {
    let sessions = SessionStore::new(ctx.storage.pool());
    sessions.revoke(&token).await?;
    Ok(Json(json!({ "status": "ok" })))
}

pub async fn me(user: AuthUser) -> Json<Value> {
    Json(json!({ "user": user_json(&user.0) }))
}
