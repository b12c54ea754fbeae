// rest/routes/profile.rs — profile page payload, description, photo.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::achievements::{self, storage::AchievementStore};
use crate::quests::storage::QuestStore;
use crate::quests::UserStats;
use crate::reflections::storage::ReflectionStore;
use crate::rest::error::ApiError;
use crate::rest::extract::AuthUser;
use crate::uploads::PhotoStore;
use crate::AppContext;

use super::auth::user_json;

/// How many reflections the profile page shows, newest first.
const RECENT_REFLECTIONS: i64 = 30;

fn photo_store(ctx: &AppContext) -> PhotoStore {
    PhotoStore::new(ctx.config.uploads_dir(), ctx.config.uploads.max_bytes)
}

pub async fn profile(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let quests = QuestStore::new(ctx.storage.pool());
    let achievement_store = AchievementStore::new(ctx.storage.pool());
    let reflections = ReflectionStore::new(ctx.storage.pool());

    let total_completions = quests.count_completions(&user.id).await?;
    let stats = UserStats {
        xp: user.xp,
        streak: user.streak,
        total_completions,
    };
    achievements::reconcile(&achievement_store, &user.id, &stats).await?;

    let achievements = achievement_store.list_for_user(&user.id).await?;
    let recent = reflections.recent(&user.id, RECENT_REFLECTIONS).await?;

    Ok(Json(json!({
        "user": user_json(&user),
        "xp_for_next_level": user.xp_for_next_level(),
        "level_progress": user.level_progress(),
        "total_completions": total_completions,
        "achievements": achievements,
        "recent_reflections": recent,
    })))
}

#[derive(Deserialize)]
pub struct DescriptionRequest {
    pub description: String,
}

pub async fn set_description(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
    Json(req): Json<DescriptionRequest>,
) -> Result<Json<Value>, ApiError> {
    ctx.storage
        .set_user_description(&user.id, req.description.trim())
        .await?;
    let updated = ctx.storage.get_user(&user.id).await?.unwrap_or(user);
    Ok(Json(json!({ "user": user_json(&updated) })))
}

pub async fn upload_photo(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let store = photo_store(&ctx);

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(&e.to_string()))?
    {
        if field.name() != Some("photo") {
            continue;
        }
        let original_name = field.file_name().unwrap_or("photo").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(&e.to_string()))?;

        let file_name = store.save(&original_name, &bytes).await?;
        let previous = user.photo_file.clone();
        ctx.storage
            .set_user_photo(&user.id, Some(file_name.as_str()))
            .await?;

        // Content-addressed names collide for identical bytes, so only
        // remove the old file when it really was replaced.
        if let Some(old) = previous {
            if old != file_name {
                if let Err(e) = store.remove(&old).await {
                    warn!(user_id = %user.id, "failed to remove replaced photo: {e:#}");
                }
            }
        }

        return Ok(Json(json!({ "photo": file_name })));
    }

    Err(ApiError::bad_request("multipart field 'photo' is required"))
}

pub async fn photo(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
) -> Result<Response, ApiError> {
    let file_name = user
        .photo_file
        .as_deref()
        .ok_or_else(|| ApiError::not_found("no photo uploaded"))?;

    let (bytes, content_type) = photo_store(&ctx)
        .read(file_name)
        .await?
        .ok_or_else(|| ApiError::not_found("photo file is missing"))?;

    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

pub async fn delete_photo(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, ApiError> {
    if let Some(file_name) = user.photo_file.as_deref() {
        ctx.storage.set_user_photo(&user.id, None).await?;
        photo_store(&ctx).remove(file_name).await?;
    }
    Ok(Json(json!({ "status": "ok" })))
}
