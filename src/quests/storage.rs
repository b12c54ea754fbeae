// SPDX-License-Identifier: MIT
//! Quest persistence — templates, daily assignments, and the completion
//! transaction that credits XP and advances the streak.

use anyhow::{Context as _, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{Category, Quest, UserStats};

/// Quest query + write layer over the shared pool.
pub struct QuestStore {
    pool: SqlitePool,
}

impl QuestStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ─── Templates ────────────────────────────────────────────────────────────

    /// Persist a template if it is not already stored, then return the row.
    /// Templates are deduplicated by (title, category); an existing row wins
    /// and keeps its original id and points.
    pub async fn ensure_template(
        &self,
        title: &str,
        category: Category,
        description: &str,
        reward_points: i64,
    ) -> Result<Quest> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT OR IGNORE INTO quests (id, title, category, description, reward_points, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(title)
        .bind(category.as_str())
        .bind(description)
        .bind(reward_points)
        .bind(&now)
        .execute(&self.pool)
        .await
        .context("insert quest template")?;

        sqlx::query_as("SELECT * FROM quests WHERE title = ? AND category = ?")
            .bind(title)
            .bind(category.as_str())
            .fetch_one(&self.pool)
            .await
            .context("quest template not found after insert")
    }

    pub async fn get_quest(&self, id: &str) -> Result<Option<Quest>> {
        Ok(sqlx::query_as("SELECT * FROM quests WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    // ─── Daily assignments ────────────────────────────────────────────────────

    /// The quests assigned to `user_id` for `day`, in catalog category order.
    pub async fn assignments_for_day(&self, user_id: &str, day: &str) -> Result<Vec<Quest>> {
        let mut quests: Vec<Quest> = sqlx::query_as(
            "SELECT q.* FROM quests q
             JOIN daily_assignments a ON a.quest_id = q.id
             WHERE a.user_id = ? AND a.day = ?",
        )
        .bind(user_id)
        .bind(day)
        .fetch_all(&self.pool)
        .await
        .context("load daily assignments")?;

        let rank = |c: &str| {
            Category::parse(c)
                .map(|c| Category::ALL.iter().position(|x| *x == c).unwrap_or(3))
                .unwrap_or(3)
        };
        quests.sort_by_key(|q| rank(&q.category));
        Ok(quests)
    }

    /// Insert the day's three assignment rows in one transaction.
    ///
    /// Returns `false` when any row already existed — a concurrent first call
    /// won the race and the caller should re-read the stored assignment.
    pub async fn insert_assignments(
        &self,
        user_id: &str,
        day: &str,
        picks: &[(Category, String)],
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let mut all_inserted = true;
        for (category, quest_id) in picks {
            let inserted = sqlx::query(
                "INSERT OR IGNORE INTO daily_assignments (id, user_id, quest_id, category, day)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(user_id)
            .bind(quest_id)
            .bind(category.as_str())
            .bind(day)
            .execute(&mut *tx)
            .await
            .context("insert daily assignment")?
            .rows_affected();
            if inserted == 0 {
                all_inserted = false;
            }
        }
        tx.commit().await?;
        Ok(all_inserted)
    }

    /// Swap the assignment for one category to a different quest.
    pub async fn replace_assignment(
        &self,
        user_id: &str,
        category: Category,
        day: &str,
        quest_id: &str,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE daily_assignments SET quest_id = ?
             WHERE user_id = ? AND category = ? AND day = ?",
        )
        .bind(quest_id)
        .bind(user_id)
        .bind(category.as_str())
        .bind(day)
        .execute(&self.pool)
        .await
        .context("replace daily assignment")?;
        Ok(())
    }

    // ─── Completions ──────────────────────────────────────────────────────────

    /// Quest ids the user completed on `day`.
    pub async fn completed_ids_for_day(&self, user_id: &str, day: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT quest_id FROM completions WHERE user_id = ? AND day = ?")
                .bind(user_id)
                .bind(day)
                .fetch_all(&self.pool)
                .await
                .context("load completions for day")?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    pub async fn count_completions(&self, user_id: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM completions WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .context("count completions")?;
        Ok(count)
    }

    /// Record a completion and apply its stat effects atomically.
    ///
    /// The `INSERT OR IGNORE` against the (user, quest, day) unique index is
    /// the once-per-day gate: when it inserts nothing the quest was already
    /// completed today and the transaction changes nothing — `None` is
    /// returned. Otherwise, in the same transaction:
    ///   - the streak advances by one when `last_quest_date` equals
    ///     `yesterday`, else resets to 1 — guarded so only the first
    ///     completion of the day touches it;
    ///   - XP is credited unconditionally.
    pub async fn record_completion(
        &self,
        user_id: &str,
        quest_id: &str,
        day: &str,
        yesterday: &str,
        reward_points: i64,
    ) -> Result<Option<UserStats>> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            "INSERT OR IGNORE INTO completions (id, user_id, quest_id, day, completed_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(quest_id)
        .bind(day)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await
        .context("insert completion")?
        .rows_affected();

        if inserted == 0 {
            // Already completed today; dropping the transaction rolls back.
            return Ok(None);
        }

        sqlx::query(
            "UPDATE users SET
                 streak = CASE WHEN last_quest_date = ? THEN streak + 1 ELSE 1 END,
                 last_quest_date = ?
             WHERE id = ? AND (last_quest_date IS NULL OR last_quest_date != ?)",
        )
        .bind(yesterday)
        .bind(day)
        .bind(user_id)
        .bind(day)
        .execute(&mut *tx)
        .await
        .context("advance streak")?;

        sqlx::query("UPDATE users SET xp = xp + ? WHERE id = ?")
            .bind(reward_points)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .context("credit xp")?;

        let (xp, streak): (i64, i64) =
            sqlx::query_as("SELECT xp, streak FROM users WHERE id = ?")
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await
                .context("read stats after completion")?;

        let total_completions: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM completions WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await
                .context("count completions after completion")?;

        tx.commit().await?;

        Ok(Some(UserStats {
            xp,
            streak,
            total_completions,
        }))
    }
}
