// SPDX-License-Identifier: MIT
//! Quest sourcing — static catalog picks or an external generative service.
//!
//! The generated source calls `POST {generator_url}` with
//! `{ "categories": ["social", "health", "mindfulness"] }` and expects
//! `{ "quests": [ { "category", "title", "description", "points" } ] }` with
//! exactly one quest per category. Anything else — transport error, non-2xx
//! status, schema violation — falls back to the static catalog, so a user is
//! never left short of three quests.

use anyhow::{bail, Context as _, Result};
use serde::Deserialize;
use tracing::warn;

use crate::config::QuestsConfig;

use super::{catalog, Category};

/// One quest choice before persistence.
#[derive(Debug, Clone)]
pub struct PickedQuest {
    pub category: Category,
    pub title: String,
    pub description: String,
    pub points: i64,
}

impl PickedQuest {
    fn from_template(category: Category, template: &catalog::QuestTemplate) -> Self {
        Self {
            category,
            title: template.title.to_string(),
            description: template.description.to_string(),
            points: template.points,
        }
    }
}

fn catalog_picks() -> Vec<PickedQuest> {
    Category::ALL
        .iter()
        .map(|&c| PickedQuest::from_template(c, catalog::pick(c)))
        .collect()
}

// ─── Source selection ─────────────────────────────────────────────────────────

/// Where daily quests come from. Configuration decides; the catalog is
/// always the fallback.
pub enum QuestSource {
    Catalog,
    Generated(GeneratedQuestClient),
}

impl QuestSource {
    pub fn from_config(config: &QuestsConfig) -> Self {
        match config.source.as_str() {
            "catalog" => QuestSource::Catalog,
            "generated" => {
                let Some(url) = config.generator_url.clone() else {
                    warn!("quest source is \"generated\" but generator_url is unset — using catalog");
                    return QuestSource::Catalog;
                };
                match GeneratedQuestClient::new(url, config.timeout_secs) {
                    Ok(client) => QuestSource::Generated(client),
                    Err(e) => {
                        warn!("failed to build quest generator client: {e:#} — using catalog");
                        QuestSource::Catalog
                    }
                }
            }
            other => {
                warn!("unknown quest source {other:?} — using catalog");
                QuestSource::Catalog
            }
        }
    }

    /// Pick one quest per category for a new day. Never fails.
    pub async fn pick_day(&self) -> Vec<PickedQuest> {
        match self {
            QuestSource::Catalog => catalog_picks(),
            QuestSource::Generated(client) => match client.generate_day().await {
                Ok(picks) => picks,
                Err(e) => {
                    warn!("quest generation failed: {e:#} — using catalog");
                    catalog_picks()
                }
            },
        }
    }

    /// Pick a replacement quest for one category, avoiding `exclude_title`
    /// when possible. Distinctness is best-effort.
    pub async fn pick_replacement(&self, category: Category, exclude_title: &str) -> PickedQuest {
        match self {
            QuestSource::Catalog => {
                PickedQuest::from_template(category, catalog::pick_different(category, exclude_title))
            }
            QuestSource::Generated(client) => match client.generate_day().await {
                Ok(picks) => picks
                    .into_iter()
                    .find(|p| p.category == category && p.title != exclude_title)
                    .unwrap_or_else(|| {
                        PickedQuest::from_template(
                            category,
                            catalog::pick_different(category, exclude_title),
                        )
                    }),
                Err(e) => {
                    warn!("quest generation failed: {e:#} — rerolling from catalog");
                    PickedQuest::from_template(category, catalog::pick_different(category, exclude_title))
                }
            },
        }
    }
}

// ─── Generated source client ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GeneratedQuest {
    category: String,
    title: String,
    #[serde(default)]
    description: String,
    points: i64,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    quests: Vec<GeneratedQuest>,
}

pub struct GeneratedQuestClient {
    client: reqwest::Client,
    url: String,
}

impl GeneratedQuestClient {
    pub fn new(url: String, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { client, url })
    }

    async fn generate_day(&self) -> Result<Vec<PickedQuest>> {
        let categories: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
        let resp = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "categories": categories }))
            .send()
            .await?
            .error_for_status()?;

        let body: GenerateResponse = resp.json().await.context("parse generator response")?;
        validate_generated(body.quests)
    }
}

/// Enforce the response schema: exactly one quest per category, a non-empty
/// title, and points in 1..=100.
fn validate_generated(quests: Vec<GeneratedQuest>) -> Result<Vec<PickedQuest>> {
    if quests.len() != Category::ALL.len() {
        bail!("expected {} quests, got {}", Category::ALL.len(), quests.len());
    }

    let mut picks = Vec::with_capacity(Category::ALL.len());
    for category in Category::ALL {
        let quest = quests
            .iter()
            .find(|q| Category::parse(&q.category) == Some(category))
            .with_context(|| format!("no quest for category {category}"))?;
        let title = quest.title.trim();
        if title.is_empty() {
            bail!("empty title for category {category}");
        }
        if !(1..=100).contains(&quest.points) {
            bail!("points {} out of range for category {category}", quest.points);
        }
        picks.push(PickedQuest {
            category,
            title: title.to_string(),
            description: quest.description.trim().to_string(),
            points: quest.points,
        });
    }
    Ok(picks)
}
