// rest/routes/reflections.rs — journaling and mood history.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::quests::storage::QuestStore;
use crate::reflections::{self, storage::ReflectionStore};
use crate::rest::error::ApiError;
use crate::rest::extract::AuthUser;
use crate::AppContext;

#[derive(Deserialize)]
pub struct CreateReflectionRequest {
    pub text: String,
    /// Optional quest this reflection is about.
    pub quest_id: Option<String>,
}

pub async fn create(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
    Json(req): Json<CreateReflectionRequest>,
) -> Result<Json<Value>, ApiError> {
    let store = ReflectionStore::new(ctx.storage.pool());
    let quests = QuestStore::new(ctx.storage.pool());

    let reflection = reflections::record(
        &store,
        &quests,
        &ctx.sentiment,
        &user.id,
        req.quest_id.as_deref(),
        &req.text,
    )
    .await?;

    Ok(Json(json!(reflection)))
}

pub async fn mood_history(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let store = ReflectionStore::new(ctx.storage.pool());
    let history = store.mood_history(&user.id).await?;

    Ok(Json(json!({
        "dates": history.dates,
        "scores": history.scores,
    })))
}
