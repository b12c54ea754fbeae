pub mod achievements;
pub mod auth;
pub mod config;
pub mod pets;
pub mod quests;
pub mod reflections;
pub mod rest;
pub mod sentiment;
pub mod storage;
pub mod uploads;

use std::sync::Arc;

use config::QuestdConfig;
use quests::source::QuestSource;
use sentiment::SentimentClient;
use storage::Storage;

/// Shared application state passed to every route handler and background task.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<QuestdConfig>,
    pub storage: Arc<Storage>,
    /// Sentiment-scoring client. Falls back to a neutral score when the
    /// external service is unconfigured or unreachable.
    pub sentiment: Arc<SentimentClient>,
    /// Where daily quests come from: the static catalog or the generative
    /// service (with catalog fallback).
    pub quest_source: Arc<QuestSource>,
    pub started_at: std::time::Instant,
}

impl AppContext {
    /// Build the full context from config: open storage, construct the
    /// external-service clients per the `[sentiment]` and `[quests]` sections.
    pub async fn init(config: QuestdConfig) -> anyhow::Result<Self> {
        let storage = Arc::new(Storage::new(&config.data_dir).await?);
        let sentiment = Arc::new(SentimentClient::from_config(&config.sentiment));
        let quest_source = Arc::new(QuestSource::from_config(&config.quests));
        Ok(Self {
            config: Arc::new(config),
            storage,
            sentiment,
            quest_source,
            started_at: std::time::Instant::now(),
        })
    }
}
