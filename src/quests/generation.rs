// SPDX-License-Identifier: MIT
//! Daily quest generation — idempotent per (user, day) — and rerolls.

use chrono::NaiveDate;
use tracing::{debug, info};

use super::source::QuestSource;
use super::storage::QuestStore;
use super::{day_str, Category, DailyQuest, QuestError};

/// Return the user's three quests for `today`, generating them on first call.
///
/// Later calls that day resolve the stored assignment, so the set never
/// changes once dealt. A concurrent first call that loses the insert race
/// re-reads the winner's rows instead of failing.
pub async fn daily_quests(
    store: &QuestStore,
    source: &QuestSource,
    user_id: &str,
    today: NaiveDate,
) -> Result<Vec<DailyQuest>, QuestError> {
    let day = day_str(today);

    let mut assigned = store.assignments_for_day(user_id, &day).await?;
    if assigned.is_empty() {
        let picks = source.pick_day().await;
        let mut rows = Vec::with_capacity(picks.len());
        for pick in &picks {
            let quest = store
                .ensure_template(&pick.title, pick.category, &pick.description, pick.points)
                .await?;
            rows.push((pick.category, quest.id));
        }
        if !store.insert_assignments(user_id, &day, &rows).await? {
            debug!(user_id, day, "lost assignment race, using stored day");
        }
        assigned = store.assignments_for_day(user_id, &day).await?;
    }

    let completed = store.completed_ids_for_day(user_id, &day).await?;
    Ok(assigned
        .into_iter()
        .map(|quest| DailyQuest {
            completed: completed.contains(&quest.id),
            quest,
        })
        .collect())
}

/// Replace today's quest in `category` with a different one from the
/// configured source.
///
/// Rejected once that category's quest is completed. When today's quests
/// have not been dealt yet, they are generated first and the swap applies
/// on top.
pub async fn reroll_quest(
    store: &QuestStore,
    source: &QuestSource,
    user_id: &str,
    category: Category,
    today: NaiveDate,
) -> Result<DailyQuest, QuestError> {
    let day = day_str(today);

    let quests = daily_quests(store, source, user_id, today).await?;
    let current = quests
        .iter()
        .find(|q| Category::parse(&q.quest.category) == Some(category))
        .ok_or_else(|| QuestError::UnknownCategory(category.as_str().to_string()))?;
    if current.completed {
        return Err(QuestError::CategoryCompleted(category));
    }

    let pick = source.pick_replacement(category, &current.quest.title).await;
    let replacement = store
        .ensure_template(&pick.title, pick.category, &pick.description, pick.points)
        .await?;
    store
        .replace_assignment(user_id, category, &day, &replacement.id)
        .await?;
    info!(user_id, category = category.as_str(), "quest rerolled");

    Ok(DailyQuest {
        quest: replacement,
        completed: false,
    })
}
