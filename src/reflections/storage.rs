// SPDX-License-Identifier: MIT

use anyhow::{Context as _, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{MoodHistory, Reflection};

/// Reflection query + write layer over the shared pool.
pub struct ReflectionStore {
    pool: SqlitePool,
}

impl ReflectionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        user_id: &str,
        quest_id: Option<&str>,
        text: &str,
        sentiment_score: f64,
    ) -> Result<Reflection> {
        let row = Reflection {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            quest_id: quest_id.map(str::to_string),
            text: text.to_string(),
            sentiment_score,
            created_at: Utc::now().to_rfc3339(),
        };
        sqlx::query(
            "INSERT INTO reflections (id, user_id, quest_id, text, sentiment_score, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&row.id)
        .bind(&row.user_id)
        .bind(&row.quest_id)
        .bind(&row.text)
        .bind(row.sentiment_score)
        .bind(&row.created_at)
        .execute(&self.pool)
        .await
        .context("insert reflection")?;
        Ok(row)
    }

    /// Full mood feed, oldest first. The date is the day portion of the
    /// RFC 3339 timestamp.
    pub async fn mood_history(&self, user_id: &str) -> Result<MoodHistory> {
        let rows: Vec<(String, f64)> = sqlx::query_as(
            "SELECT substr(created_at, 1, 10), sentiment_score FROM reflections
             WHERE user_id = ? ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("load mood history")?;

        let (dates, scores) = rows.into_iter().unzip();
        Ok(MoodHistory { dates, scores })
    }

    /// Most recent reflections for the profile view, newest first.
    pub async fn recent(&self, user_id: &str, limit: i64) -> Result<Vec<Reflection>> {
        Ok(sqlx::query_as(
            "SELECT * FROM reflections WHERE user_id = ? ORDER BY created_at DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("load recent reflections")?)
    }
}
