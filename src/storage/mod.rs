// SPDX-License-Identifier: MIT
//! SQLite-backed persistence — schema bootstrap and the user table.
//!
//! Domain stores (quests, reflections, achievements, pets, sessions) share
//! this pool and own their tables' queries.

use anyhow::{Context as _, Result};
use chrono::Utc;
use sqlx::{sqlite::SqliteConnectOptions, ConnectOptions, SqlitePool};
use std::{path::Path, str::FromStr};
use uuid::Uuid;

/// SQLite statements slower than this are logged at WARN level.
const SLOW_QUERY_THRESHOLD_MS: u64 = 250;

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Free-text profile blurb. NULL until the user sets one.
    pub description: Option<String>,
    /// Stored filename of the profile photo under `{data_dir}/uploads`.
    pub photo_file: Option<String>,
    pub xp: i64,
    pub streak: i64,
    /// Calendar day (YYYY-MM-DD) of the most recent quest completion.
    /// Drives the consecutive-day streak rule.
    pub last_quest_date: Option<String>,
    /// Currently selected pet, one of `pets::PetKind`. NULL = none selected.
    pub active_pet: Option<String>,
    /// XP moved out of `xp` but not yet confirmed into a pet counter.
    pub temp_allocated_xp: i64,
    pub joined_at: String,
}

impl UserRow {
    /// Level starts at 1 and advances every 100 XP.
    pub fn level(&self) -> i64 {
        self.xp / 100 + 1
    }

    /// XP still needed to reach the next level.
    pub fn xp_for_next_level(&self) -> i64 {
        self.level() * 100 - self.xp
    }

    /// Progress through the current level, 0..100.
    pub fn level_progress(&self) -> i64 {
        self.xp % 100
    }
}

#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub async fn new(data_dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;
        let db_path = data_dir.join("questd.db");
        let opts =
            SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display()))?
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .create_if_missing(true)
                .log_slow_statements(
                    log::LevelFilter::Warn,
                    std::time::Duration::from_millis(SLOW_QUERY_THRESHOLD_MS),
                );

        let pool = SqlitePool::connect_with(opts).await?;
        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    /// Return a clone of the connection pool (cheap — Arc-backed).
    /// Used to create the per-domain stores that share the same SQLite connection.
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    async fn migrate(pool: &SqlitePool) -> Result<()> {
        let create_stmts = [
            "CREATE TABLE IF NOT EXISTS users (
                id                TEXT PRIMARY KEY,
                username          TEXT NOT NULL UNIQUE,
                email             TEXT NOT NULL UNIQUE,
                password_hash     TEXT NOT NULL,
                photo_file        TEXT,
                xp                INTEGER NOT NULL DEFAULT 0,
                streak            INTEGER NOT NULL DEFAULT 0,
                last_quest_date   TEXT,
                active_pet        TEXT,
                temp_allocated_xp INTEGER NOT NULL DEFAULT 0,
                joined_at         TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS quests (
                id            TEXT PRIMARY KEY,
                title         TEXT NOT NULL,
                category      TEXT NOT NULL,
                description   TEXT NOT NULL,
                reward_points INTEGER NOT NULL,
                created_at    TEXT NOT NULL,
                UNIQUE (title, category)
            )",
            "CREATE TABLE IF NOT EXISTS daily_assignments (
                id       TEXT PRIMARY KEY,
                user_id  TEXT NOT NULL REFERENCES users(id),
                quest_id TEXT NOT NULL REFERENCES quests(id),
                category TEXT NOT NULL,
                day      TEXT NOT NULL,
                UNIQUE (user_id, category, day)
            )",
            "CREATE TABLE IF NOT EXISTS completions (
                id           TEXT PRIMARY KEY,
                user_id      TEXT NOT NULL REFERENCES users(id),
                quest_id     TEXT NOT NULL REFERENCES quests(id),
                day          TEXT NOT NULL,
                completed_at TEXT NOT NULL,
                UNIQUE (user_id, quest_id, day)
            )",
            "CREATE TABLE IF NOT EXISTS reflections (
                id              TEXT PRIMARY KEY,
                user_id         TEXT NOT NULL REFERENCES users(id),
                quest_id        TEXT,
                text            TEXT NOT NULL,
                sentiment_score REAL NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS achievements (
                id          TEXT PRIMARY KEY,
                code        TEXT NOT NULL UNIQUE,
                title       TEXT NOT NULL,
                description TEXT NOT NULL,
                icon        TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS achievement_grants (
                user_id        TEXT NOT NULL REFERENCES users(id),
                achievement_id TEXT NOT NULL REFERENCES achievements(id),
                granted_at     TEXT NOT NULL,
                PRIMARY KEY (user_id, achievement_id)
            )",
            "CREATE TABLE IF NOT EXISTS pet_states (
                user_id TEXT NOT NULL REFERENCES users(id),
                pet     TEXT NOT NULL,
                xp      INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (user_id, pet)
            )",
            "CREATE TABLE IF NOT EXISTS auth_sessions (
                token      TEXT PRIMARY KEY,
                user_id    TEXT NOT NULL REFERENCES users(id),
                created_at TEXT NOT NULL,
                expires_at TEXT
            )",
            "CREATE INDEX IF NOT EXISTS idx_completions_user_day
                ON completions (user_id, day)",
            "CREATE INDEX IF NOT EXISTS idx_reflections_user
                ON reflections (user_id, created_at)",
        ];
        for stmt in create_stmts {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .context("Failed to bootstrap database schema")?;
        }

        // Idempotent column additions (ALTER TABLE IF NOT EXISTS is not
        // supported in SQLite, so we attempt the ALTER and ignore the
        // "duplicate column name" error).
        let alter_stmts = ["ALTER TABLE users ADD COLUMN description TEXT"];
        for stmt in alter_stmts {
            let result = sqlx::query(stmt).execute(pool).await;
            if let Err(e) = result {
                let msg = e.to_string();
                if !msg.contains("duplicate column") {
                    return Err(e.into());
                }
            }
        }

        Ok(())
    }

    // ─── Users ──────────────────────────────────────────────────────────────

    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<UserRow> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, joined_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        self.get_user(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("user not found after insert"))
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<UserRow>> {
        Ok(sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        Ok(sqlx::query_as("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn set_user_description(&self, id: &str, description: &str) -> Result<()> {
        sqlx::query("UPDATE users SET description = ? WHERE id = ?")
            .bind(description)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_user_photo(&self, id: &str, photo_file: Option<&str>) -> Result<()> {
        sqlx::query("UPDATE users SET photo_file = ? WHERE id = ?")
            .bind(photo_file)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
