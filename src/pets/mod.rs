// SPDX-License-Identifier: MIT
//! Virtual companion mini-game — spend earned XP on a pet through a
//! two-phase allocate/confirm flow.
//!
//! Allocation is staged: `allocate` moves XP from the spendable pool into a
//! pending amount, `confirm` makes it permanent on the active pet, `cancel`
//! (or switching pets) refunds it. Outside of `confirm`, the sum
//! `xp + temp_allocated_xp` never changes.

pub mod allocation;

use std::collections::BTreeMap;

use serde::Serialize;

/// Permanent XP a single pet can hold.
pub const PET_XP_CAP: i64 = 30;
/// XP cost of one allocation point.
pub const XP_PER_POINT: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PetKind {
    Cat,
    Dog,
    Fox,
}

impl PetKind {
    pub const ALL: [PetKind; 3] = [PetKind::Cat, PetKind::Dog, PetKind::Fox];

    pub fn as_str(&self) -> &'static str {
        match self {
            PetKind::Cat => "cat",
            PetKind::Dog => "dog",
            PetKind::Fox => "fox",
        }
    }

    pub fn parse(s: &str) -> Option<PetKind> {
        match s.to_ascii_lowercase().as_str() {
            "cat" => Some(PetKind::Cat),
            "dog" => Some(PetKind::Dog),
            "fox" => Some(PetKind::Fox),
            _ => None,
        }
    }
}

impl std::fmt::Display for PetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Growth stage for a committed XP amount: 1 (0-9), 2 (10-19), 3 (20-30).
pub fn stage(xp: i64) -> i64 {
    match xp {
        i64::MIN..=9 => 1,
        10..=19 => 2,
        _ => 3,
    }
}

/// Allocation view for one user, as served to clients.
#[derive(Debug, Clone, Serialize)]
pub struct PetStatus {
    /// Active pet, if one was selected.
    pub pet: Option<String>,
    /// Spendable XP.
    pub user_xp: i64,
    /// XP staged on the active pet, awaiting confirm.
    pub pending_xp: i64,
    /// The active pet's permanent XP (0 when no pet is selected).
    pub pet_xp: i64,
    pub stage: i64,
    /// Permanent XP per pet, all pets present.
    pub pets: BTreeMap<String, i64>,
}

#[derive(Debug, thiserror::Error)]
pub enum PetError {
    #[error("unknown pet: {0}")]
    UnknownPet(String),
    #[error("no active pet selected")]
    NoActivePet,
    #[error("points must be positive")]
    NonPositivePoints,
    #[error("not enough XP: need {cost}")]
    InsufficientXp { cost: i64 },
    #[error("pet is at capacity: at most {max_points} more points can be allocated")]
    CapacityExceeded { max_points: i64 },
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
