// rest/routes/quests.rs — today's quests, completion, reroll.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::achievements::storage::AchievementStore;
use crate::quests::completion::{complete_quest, CompletionOutcome};
use crate::quests::generation::{daily_quests, reroll_quest};
use crate::quests::storage::QuestStore;
use crate::quests::{day_str, Category, QuestError};
use crate::rest::error::ApiError;
use crate::rest::extract::AuthUser;
use crate::AppContext;

pub async fn today(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let store = QuestStore::new(ctx.storage.pool());
    let today = Utc::now().date_naive();
    let quests = daily_quests(&store, &ctx.quest_source, &user.id, today).await?;

    Ok(Json(json!({
        "date": day_str(today),
        "quests": quests,
    })))
}

pub async fn complete(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
    Path(quest_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let store = QuestStore::new(ctx.storage.pool());
    let achievements = AchievementStore::new(ctx.storage.pool());
    let today = Utc::now().date_naive();

    let outcome = complete_quest(&store, &achievements, &user.id, &quest_id, today).await?;
    match outcome {
        CompletionOutcome::Completed {
            reward_points,
            stats,
            unlocked,
        } => Ok(Json(json!({
            "status": "completed",
            "xp_awarded": reward_points,
            "xp": stats.xp,
            "streak": stats.streak,
            "unlocked": unlocked,
        }))),
        CompletionOutcome::AlreadyCompleted => {
            // Stats did not change; report the current ones.
            let current = ctx.storage.get_user(&user.id).await?.unwrap_or(user);
            Ok(Json(json!({
                "status": "already_completed",
                "xp_awarded": 0,
                "xp": current.xp,
                "streak": current.streak,
                "unlocked": [],
            })))
        }
    }
}

#[derive(Deserialize)]
pub struct RerollRequest {
    pub category: String,
}

pub async fn reroll(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
    Json(req): Json<RerollRequest>,
) -> Result<Json<Value>, ApiError> {
    let category = Category::parse(&req.category)
        .ok_or_else(|| QuestError::UnknownCategory(req.category.clone()))?;

    let store = QuestStore::new(ctx.storage.pool());
    let today = Utc::now().date_naive();
    let quest = reroll_quest(&store, &ctx.quest_source, &user.id, category, today).await?;

    Ok(Json(json!({ "quest": quest })))
}
