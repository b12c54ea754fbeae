// SPDX-License-Identifier: MIT
//! Achievement system — six pre-defined badges, stat-delta trigger type, and
//! unlock logic.
//!
//! Achievement codes use snake_case as their string value (e.g. `"streak_5"`)
//! and are stable across versions. Grants are monotonic: once unlocked, a
//! badge is never revoked, even when the stat that earned it later drops.

pub mod storage;

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;

use crate::quests::UserStats;
use storage::AchievementStore;

// ─── Achievement code constants ───────────────────────────────────────────────

pub const STREAK_5: &str = "streak_5";
pub const STREAK_10: &str = "streak_10";
pub const XP_50: &str = "xp_50";
pub const XP_100: &str = "xp_100";
pub const QUESTS_10: &str = "quests_10";
pub const QUESTS_25: &str = "quests_25";

// ─── Achievement definitions ──────────────────────────────────────────────────

/// One badge in the catalog.
pub struct AchievementDef {
    pub code: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

/// The canonical badge catalog, in display order. Storage rows are seeded
/// lazily from this list; clients render each badge earned or grayed out.
pub const DEFINITIONS: &[AchievementDef] = &[
    AchievementDef {
        code: STREAK_5,
        title: "Motivation Master",
        description: "Maintain a 5-day streak!",
        icon: "\u{1f525}",
    },
    AchievementDef {
        code: STREAK_10,
        title: "Streak Champion",
        description: "Maintain a 10-day streak!",
        icon: "\u{26a1}",
    },
    AchievementDef {
        code: XP_50,
        title: "Level 2 Explorer",
        description: "Earn 50 XP!",
        icon: "\u{2b50}",
    },
    AchievementDef {
        code: XP_100,
        title: "Quest Veteran",
        description: "Earn 100 XP!",
        icon: "\u{1f3c6}",
    },
    AchievementDef {
        code: QUESTS_10,
        title: "SideQuest Veteran",
        description: "Complete 10 quests!",
        icon: "\u{1f3af}",
    },
    AchievementDef {
        code: QUESTS_25,
        title: "Quest Master",
        description: "Complete 25 quests!",
        icon: "\u{1f451}",
    },
];

pub fn definition(code: &str) -> Option<&'static AchievementDef> {
    DEFINITIONS.iter().find(|d| d.code == code)
}

/// One badge with a user's unlock state, as served to clients.
#[derive(Debug, Clone, Serialize)]
pub struct UserAchievement {
    pub code: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub unlocked: bool,
    pub unlocked_at: Option<String>,
}

// ─── Trigger event type ───────────────────────────────────────────────────────

/// Stat deltas that trigger achievement checks.
///
/// Each variant carries the post-mutation stats needed to evaluate the
/// conditions it can newly satisfy. Handlers emit one of these after the
/// mutation commits (e.g. after a completion is recorded, emit
/// `StatDelta::QuestCompleted` with the fresh stats).
#[derive(Debug, Clone)]
pub enum StatDelta {
    /// A quest completion updated XP, streak, and the completion count.
    QuestCompleted {
        xp: i64,
        streak: i64,
        total_completions: i64,
    },

    /// XP was spent on a companion. The balance only moved down, so no
    /// threshold can be newly crossed; existing grants stay.
    XpSpent { xp: i64 },
}

// ─── Trigger check ────────────────────────────────────────────────────────────

fn threshold_candidates(xp: i64, streak: i64, total_completions: i64) -> Vec<&'static str> {
    let mut codes = vec![];
    if streak >= 5 {
        codes.push(STREAK_5);
    }
    if streak >= 10 {
        codes.push(STREAK_10);
    }
    if xp >= 50 {
        codes.push(XP_50);
    }
    if xp >= 100 {
        codes.push(XP_100);
    }
    if total_completions >= 10 {
        codes.push(QUESTS_10);
    }
    if total_completions >= 25 {
        codes.push(QUESTS_25);
    }
    codes
}

async fn grant_candidates(
    store: &AchievementStore,
    user_id: &str,
    candidates: Vec<&'static str>,
) -> Result<Vec<UserAchievement>> {
    let mut newly_unlocked = Vec::new();
    for code in candidates {
        let is_new = store.grant(user_id, code).await?;
        if is_new {
            if let Some(def) = definition(code) {
                newly_unlocked.push(UserAchievement {
                    code: def.code.to_string(),
                    title: def.title.to_string(),
                    description: def.description.to_string(),
                    icon: def.icon.to_string(),
                    unlocked: true,
                    unlocked_at: Some(Utc::now().to_rfc3339()),
                });
            }
        }
    }
    Ok(newly_unlocked)
}

/// Evaluate `delta` against badge conditions, grant any newly met ones, and
/// return the list of fresh unlocks so the caller can surface them in its
/// response.
pub async fn check_and_unlock(
    store: &AchievementStore,
    user_id: &str,
    delta: &StatDelta,
) -> Result<Vec<UserAchievement>> {
    let candidates: Vec<&'static str> = match delta {
        StatDelta::QuestCompleted {
            xp,
            streak,
            total_completions,
        } => threshold_candidates(*xp, *streak, *total_completions),
        StatDelta::XpSpent { .. } => vec![],
    };
    grant_candidates(store, user_id, candidates).await
}

/// Catch-up pass: evaluate the full table against current stats and grant
/// anything missed. Run on profile reads so stats changed out of band (a
/// manual database edit, an older version's handler) still converge on the
/// grants they merit.
pub async fn reconcile(
    store: &AchievementStore,
    user_id: &str,
    stats: &UserStats,
) -> Result<Vec<UserAchievement>> {
    let candidates = threshold_candidates(stats.xp, stats.streak, stats.total_completions);
    grant_candidates(store, user_id, candidates).await
}
