// rest/routes/pets.rs — virtual-pet XP allocation.
//
// Pet responses keep the client's envelope: `success` on every reply, and
// failures carry `{"success": false, "error": ...}` (see `ApiError`'s
// `From<PetError>` impl).

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::achievements::{self, storage::AchievementStore, StatDelta};
use crate::pets::allocation::PetStore;
use crate::pets::{PetError, PetKind, PetStatus};
use crate::rest::error::ApiError;
use crate::rest::extract::AuthUser;
use crate::AppContext;

fn envelope(status: &PetStatus) -> Value {
    json!({
        "success": true,
        "pet": status.pet,
        "user_xp": status.user_xp,
        "pending_xp": status.pending_xp,
        "pet_xp": status.pet_xp,
        "stage": status.stage,
        "pets": status.pets,
    })
}

pub async fn status(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let store = PetStore::new(ctx.storage.pool());
    let status = store.status(&user.id).await?;
    Ok(Json(envelope(&status)))
}

#[derive(Deserialize)]
pub struct SelectRequest {
    pub pet: String,
}

pub async fn select(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
    Json(req): Json<SelectRequest>,
) -> Result<Json<Value>, ApiError> {
    let pet = PetKind::parse(&req.pet).ok_or_else(|| PetError::UnknownPet(req.pet.clone()))?;
    let store = PetStore::new(ctx.storage.pool());
    let status = store.select(&user.id, pet).await?;
    Ok(Json(envelope(&status)))
}

#[derive(Deserialize)]
pub struct AllocateRequest {
    pub points: i64,
}

pub async fn allocate(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
    Json(req): Json<AllocateRequest>,
) -> Result<Json<Value>, ApiError> {
    let store = PetStore::new(ctx.storage.pool());
    let status = store.allocate(&user.id, req.points).await?;
    Ok(Json(envelope(&status)))
}

pub async fn confirm(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let store = PetStore::new(ctx.storage.pool());
    let status = store.confirm(&user.id).await?;
    // Spending moves XP down only; no badge can newly unlock, and earned
    // ones stay.
    let achievements = AchievementStore::new(ctx.storage.pool());
    achievements::check_and_unlock(
        &achievements,
        &user.id,
        &StatDelta::XpSpent { xp: status.user_xp },
    )
    .await
    .map_err(PetError::Storage)?;
    Ok(Json(envelope(&status)))
}

pub async fn cancel(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let store = PetStore::new(ctx.storage.pool());
    let status = store.cancel(&user.id).await?;
    Ok(Json(envelope(&status)))
}
