// SPDX-License-Identifier: MIT
//! The allocation state machine over `users.{active_pet, temp_allocated_xp}`
//! and the per-pet `pet_states` counters.
//!
//! Every mutation is a single guarded UPDATE or a short transaction, so two
//! clients racing on the same account cannot overdraw XP or push a pet past
//! its cap.

use anyhow::{anyhow, Context as _, Result};
use sqlx::SqlitePool;
use tracing::info;

use super::{stage, PetError, PetKind, PetStatus, PET_XP_CAP, XP_PER_POINT};

/// Pet query + write layer over the shared pool.
pub struct PetStore {
    pool: SqlitePool,
}

impl PetStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Current allocation view for `user_id`.
    pub async fn status(&self, user_id: &str) -> Result<PetStatus, PetError> {
        let row: Option<(Option<String>, i64, i64)> =
            sqlx::query_as("SELECT active_pet, xp, temp_allocated_xp FROM users WHERE id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .context("load user for pet status")?;
        let (active_pet, user_xp, pending_xp) =
            row.ok_or_else(|| anyhow!("user {user_id} not found"))?;

        let counters: Vec<(String, i64)> =
            sqlx::query_as("SELECT pet, xp FROM pet_states WHERE user_id = ?")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
                .context("load pet counters")?;

        let mut pets = std::collections::BTreeMap::new();
        for kind in PetKind::ALL {
            pets.insert(kind.as_str().to_string(), 0);
        }
        for (pet, xp) in counters {
            pets.insert(pet, xp);
        }

        let pet_xp = active_pet
            .as_deref()
            .and_then(|p| pets.get(p))
            .copied()
            .unwrap_or(0);

        Ok(PetStatus {
            pet: active_pet,
            user_xp,
            pending_xp,
            pet_xp,
            stage: stage(pet_xp),
            pets,
        })
    }

    /// Switch the active pet. Pending XP is refunded first, so switching
    /// never strands an allocation.
    pub async fn select(&self, user_id: &str, pet: PetKind) -> Result<PetStatus, PetError> {
        let updated = sqlx::query(
            "UPDATE users SET xp = xp + temp_allocated_xp, temp_allocated_xp = 0, active_pet = ?
             WHERE id = ?",
        )
        .bind(pet.as_str())
        .bind(user_id)
        .execute(&self.pool)
        .await
        .context("select pet")?
        .rows_affected();
        if updated == 0 {
            return Err(anyhow!("user {user_id} not found").into());
        }
        info!(user_id, pet = pet.as_str(), "active pet selected");
        self.status(user_id).await
    }

    /// Stage `points` onto the active pet, debiting the XP pool.
    ///
    /// Capacity counts committed plus already-pending XP, so a pet can never
    /// be driven past [`PET_XP_CAP`] by stacking allocations. Both guards
    /// (spendable balance and remaining capacity) sit in the UPDATE's WHERE
    /// clause; a race simply makes the statement match zero rows.
    pub async fn allocate(&self, user_id: &str, points: i64) -> Result<PetStatus, PetError> {
        if points <= 0 {
            return Err(PetError::NonPositivePoints);
        }

        // Friendly pre-checks. The guarded UPDATE below re-validates, so a
        // stale read here costs a retry, never an invariant.
        let current = self.status(user_id).await?;
        if current.pet.is_none() {
            return Err(PetError::NoActivePet);
        }
        let max_points = ((PET_XP_CAP - current.pet_xp - current.pending_xp) / XP_PER_POINT).max(0);
        if points > max_points {
            return Err(PetError::CapacityExceeded { max_points });
        }

        let cost = points * XP_PER_POINT;
        let updated = sqlx::query(
            "UPDATE users SET xp = xp - ?1, temp_allocated_xp = temp_allocated_xp + ?1
             WHERE id = ?2
               AND active_pet IS NOT NULL
               AND xp >= ?1
               AND temp_allocated_xp + ?1 + COALESCE(
                     (SELECT xp FROM pet_states
                      WHERE user_id = users.id AND pet = users.active_pet), 0) <= ?3",
        )
        .bind(cost)
        .bind(user_id)
        .bind(PET_XP_CAP)
        .execute(&self.pool)
        .await
        .context("allocate pet xp")?
        .rows_affected();

        if updated == 0 {
            // A concurrent mutation invalidated the pre-checks; classify
            // against fresh state.
            let fresh = self.status(user_id).await?;
            if fresh.pet.is_none() {
                return Err(PetError::NoActivePet);
            }
            let max_points = ((PET_XP_CAP - fresh.pet_xp - fresh.pending_xp) / XP_PER_POINT).max(0);
            if points > max_points {
                return Err(PetError::CapacityExceeded { max_points });
            }
            return Err(PetError::InsufficientXp { cost });
        }

        self.status(user_id).await
    }

    /// Make pending XP permanent on the active pet. Irreversible.
    ///
    /// The counter is clamped to [`PET_XP_CAP`]; allocate's capacity guard
    /// keeps the clamp unreachable, it only matters for rows edited out of
    /// band. Confirming with nothing pending succeeds and changes nothing.
    pub async fn confirm(&self, user_id: &str) -> Result<PetStatus, PetError> {
        let mut tx = self.pool.begin().await.context("begin confirm")?;

        // Seeding counters is the first write, which also takes the
        // database's write lock and keeps the reads below stable.
        for kind in PetKind::ALL {
            sqlx::query("INSERT OR IGNORE INTO pet_states (user_id, pet, xp) VALUES (?, ?, 0)")
                .bind(user_id)
                .bind(kind.as_str())
                .execute(&mut *tx)
                .await
                .context("seed pet counters")?;
        }

        let row: Option<(Option<String>, i64)> =
            sqlx::query_as("SELECT active_pet, temp_allocated_xp FROM users WHERE id = ?")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await
                .context("load user for confirm")?;
        let (active_pet, pending) = row.ok_or_else(|| anyhow!("user {user_id} not found"))?;
        let Some(pet) = active_pet else {
            return Err(PetError::NoActivePet);
        };

        if pending > 0 {
            sqlx::query("UPDATE pet_states SET xp = MIN(xp + ?, ?) WHERE user_id = ? AND pet = ?")
                .bind(pending)
                .bind(PET_XP_CAP)
                .bind(user_id)
                .bind(&pet)
                .execute(&mut *tx)
                .await
                .context("commit pet xp")?;
            sqlx::query("UPDATE users SET temp_allocated_xp = 0 WHERE id = ?")
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .context("clear pending xp")?;
            info!(user_id, pet = %pet, pending, "pet allocation confirmed");
        }

        tx.commit().await.context("commit confirm")?;
        self.status(user_id).await
    }

    /// Refund pending XP to the spendable pool. A no-op when nothing is
    /// pending.
    pub async fn cancel(&self, user_id: &str) -> Result<PetStatus, PetError> {
        let updated = sqlx::query(
            "UPDATE users SET xp = xp + temp_allocated_xp, temp_allocated_xp = 0 WHERE id = ?",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .context("cancel pet allocation")?
        .rows_affected();
        if updated == 0 {
            return Err(anyhow!("user {user_id} not found").into());
        }
        self.status(user_id).await
    }
}
