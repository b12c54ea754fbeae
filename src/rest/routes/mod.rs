pub mod achievements;
pub mod auth;
pub mod health;
pub mod pets;
pub mod profile;
pub mod quests;
pub mod reflections;
