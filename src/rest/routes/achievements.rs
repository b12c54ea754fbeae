// rest/routes/achievements.rs — badge catalog with unlock state.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::achievements::{self, storage::AchievementStore};
use crate::quests::storage::QuestStore;
use crate::quests::UserStats;
use crate::rest::error::ApiError;
use crate::rest::extract::AuthUser;
use crate::AppContext;

pub async fn list(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let store = AchievementStore::new(ctx.storage.pool());
    let quests = QuestStore::new(ctx.storage.pool());

    // Reads double as a catch-up pass, so stats changed out of band still
    // earn the badges they merit.
    let stats = UserStats {
        xp: user.xp,
        streak: user.streak,
        total_completions: quests.count_completions(&user.id).await?,
    };
    achievements::reconcile(&store, &user.id, &stats).await?;

    let achievements = store.list_for_user(&user.id).await?;
    Ok(Json(json!({ "achievements": achievements })))
}
