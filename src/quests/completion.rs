// SPDX-License-Identifier: MIT
//! Completion recording — once-per-day gate, XP credit, streak advance, and
//! the achievement check that follows.

use chrono::{Days, NaiveDate};
use tracing::info;

use crate::achievements::{self, storage::AchievementStore, StatDelta, UserAchievement};

use super::storage::QuestStore;
use super::{day_str, QuestError, UserStats};

/// Result of a completion attempt.
#[derive(Debug)]
pub enum CompletionOutcome {
    /// The completion was recorded; stats reflect the credit.
    Completed {
        reward_points: i64,
        stats: UserStats,
        unlocked: Vec<UserAchievement>,
    },
    /// The quest was already completed today. Nothing changed.
    AlreadyCompleted,
}

/// Complete `quest_id` for `user_id` on `today`.
///
/// Completing the same quest twice on one day is reported, not rejected:
/// the second call returns [`CompletionOutcome::AlreadyCompleted`] and
/// leaves XP and streak untouched.
pub async fn complete_quest(
    store: &QuestStore,
    achievement_store: &AchievementStore,
    user_id: &str,
    quest_id: &str,
    today: NaiveDate,
) -> Result<CompletionOutcome, QuestError> {
    let quest = store
        .get_quest(quest_id)
        .await?
        .ok_or(QuestError::UnknownQuest)?;

    let day = day_str(today);
    // An empty sentinel never matches a stored date, so a date at the
    // calendar boundary simply resets the streak to 1.
    let yesterday = today
        .checked_sub_days(Days::new(1))
        .map(day_str)
        .unwrap_or_default();

    let Some(stats) = store
        .record_completion(user_id, &quest.id, &day, &yesterday, quest.reward_points)
        .await?
    else {
        return Ok(CompletionOutcome::AlreadyCompleted);
    };

    let delta = StatDelta::QuestCompleted {
        xp: stats.xp,
        streak: stats.streak,
        total_completions: stats.total_completions,
    };
    let unlocked = achievements::check_and_unlock(achievement_store, user_id, &delta).await?;
    if !unlocked.is_empty() {
        let codes: Vec<&str> = unlocked.iter().map(|a| a.code.as_str()).collect();
        info!(user_id, unlocked = ?codes, "achievements unlocked");
    }

    Ok(CompletionOutcome::Completed {
        reward_points: quest.reward_points,
        stats,
        unlocked,
    })
}
