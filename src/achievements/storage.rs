// SPDX-License-Identifier: MIT
//! Achievement persistence — lazy catalog seeding and exactly-once grants.

use std::collections::HashMap;

use anyhow::{Context as _, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{UserAchievement, DEFINITIONS};

/// Achievement query + write layer over the shared pool.
pub struct AchievementStore {
    pool: SqlitePool,
}

impl AchievementStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Seed catalog rows for any definitions not yet stored. Existing rows
    /// keep their ids, so grants stay attached across restarts.
    async fn ensure_catalog(&self) -> Result<()> {
        for def in DEFINITIONS {
            sqlx::query(
                "INSERT OR IGNORE INTO achievements (id, code, title, description, icon)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(def.code)
            .bind(def.title)
            .bind(def.description)
            .bind(def.icon)
            .execute(&self.pool)
            .await
            .context("seed achievement catalog")?;
        }
        Ok(())
    }

    /// Grant an achievement by code. No-op if already granted.
    /// Returns `true` if this was a new grant.
    pub async fn grant(&self, user_id: &str, code: &str) -> Result<bool> {
        self.ensure_catalog().await?;

        let now = Utc::now().to_rfc3339();
        let rows_affected = sqlx::query(
            "INSERT OR IGNORE INTO achievement_grants (user_id, achievement_id, granted_at)
             SELECT ?, id, ? FROM achievements WHERE code = ?",
        )
        .bind(user_id)
        .bind(&now)
        .bind(code)
        .execute(&self.pool)
        .await
        .context("grant achievement")?
        .rows_affected();

        Ok(rows_affected > 0)
    }

    /// The full catalog with `user_id`'s unlock state, in definition order.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<UserAchievement>> {
        self.ensure_catalog().await?;

        let granted: Vec<(String, String)> = sqlx::query_as(
            "SELECT a.code, g.granted_at FROM achievement_grants g
             JOIN achievements a ON a.id = g.achievement_id
             WHERE g.user_id = ?",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("load achievement grants")?;

        let mut grant_map: HashMap<String, String> = granted.into_iter().collect();

        Ok(DEFINITIONS
            .iter()
            .map(|def| {
                let unlocked_at = grant_map.remove(def.code);
                UserAchievement {
                    code: def.code.to_string(),
                    title: def.title.to_string(),
                    description: def.description.to_string(),
                    icon: def.icon.to_string(),
                    unlocked: unlocked_at.is_some(),
                    unlocked_at,
                }
            })
            .collect())
    }
}
