// SPDX-License-Identifier: MIT
//! Daily quests — catalog, idempotent per-day generation, reroll, and
//! completion recording with XP/streak updates.

pub mod catalog;
pub mod completion;
pub mod generation;
pub mod source;
pub mod storage;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The three quest categories. Every user gets one quest per category per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Social,
    Health,
    Mindfulness,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Social, Category::Health, Category::Mindfulness];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Social => "Social",
            Category::Health => "Health",
            Category::Mindfulness => "Mindfulness",
        }
    }

    /// Parse a category name, case-insensitively.
    pub fn parse(s: &str) -> Option<Category> {
        match s.to_ascii_lowercase().as_str() {
            "social" => Some(Category::Social),
            "health" => Some(Category::Health),
            "mindfulness" => Some(Category::Mindfulness),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted quest template. Deduplicated by (title, category);
/// rows are immutable once created.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Quest {
    pub id: String,
    pub title: String,
    pub category: String,
    pub description: String,
    pub reward_points: i64,
    pub created_at: String,
}

/// One of today's three quests, with the viewer's completion state.
#[derive(Debug, Clone, Serialize)]
pub struct DailyQuest {
    #[serde(flatten)]
    pub quest: Quest,
    pub completed: bool,
}

/// Post-completion user stats, read inside the completion transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserStats {
    pub xp: i64,
    pub streak: i64,
    pub total_completions: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum QuestError {
    #[error("quest not found")]
    UnknownQuest,
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("{0} quest already completed today")]
    CategoryCompleted(Category),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Canonical day key used in `daily_assignments.day` and `completions.day`.
pub fn day_str(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}
