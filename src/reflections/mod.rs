// SPDX-License-Identifier: MIT
//! Daily reflections — free-text entries scored for sentiment, feeding the
//! mood history chart.

pub mod storage;

use serde::Serialize;

use crate::quests::storage::QuestStore;
use crate::sentiment::SentimentClient;

use storage::ReflectionStore;

/// One stored reflection.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Reflection {
    pub id: String,
    pub user_id: String,
    pub quest_id: Option<String>,
    pub text: String,
    pub sentiment_score: f64,
    pub created_at: String,
}

/// Mood feed in the chart's wire shape: index-aligned date and score arrays,
/// oldest first.
#[derive(Debug, Clone, Serialize)]
pub struct MoodHistory {
    pub dates: Vec<String>,
    pub scores: Vec<f64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReflectionError {
    #[error("reflection text must not be empty")]
    EmptyText,
    #[error("quest not found")]
    UnknownQuest,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Record a reflection, optionally tied to a quest.
///
/// The text is scored before persisting; a scorer outage degrades to a
/// neutral 0.0 rather than losing the entry.
pub async fn record(
    store: &ReflectionStore,
    quests: &QuestStore,
    sentiment: &SentimentClient,
    user_id: &str,
    quest_id: Option<&str>,
    text: &str,
) -> Result<Reflection, ReflectionError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ReflectionError::EmptyText);
    }
    if let Some(quest_id) = quest_id {
        if quests.get_quest(quest_id).await?.is_none() {
            return Err(ReflectionError::UnknownQuest);
        }
    }

    let score = sentiment.score(text).await;
    Ok(store.insert(user_id, quest_id, text, score).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SentimentConfig;
    use crate::quests::Category;
    use crate::storage::Storage;

    async fn setup() -> (
        tempfile::TempDir,
        ReflectionStore,
        QuestStore,
        SentimentClient,
        String,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path()).await.unwrap();
        let user = storage
            .create_user("ada", "ada@example.com", "h")
            .await
            .unwrap();
        let reflections = ReflectionStore::new(storage.pool());
        let quests = QuestStore::new(storage.pool());
        let sentiment = SentimentClient::from_config(&SentimentConfig::default());
        (dir, reflections, quests, sentiment, user.id)
    }

    #[tokio::test]
    async fn whitespace_text_is_rejected() {
        let (_dir, store, quests, sentiment, user_id) = setup().await;
        for text in ["", "   ", "\n\t"] {
            let err = record(&store, &quests, &sentiment, &user_id, None, text)
                .await
                .unwrap_err();
            assert!(matches!(err, ReflectionError::EmptyText));
        }
    }

    #[tokio::test]
    async fn unknown_quest_reference_is_rejected() {
        let (_dir, store, quests, sentiment, user_id) = setup().await;
        let err = record(&store, &quests, &sentiment, &user_id, Some("nope"), "felt good")
            .await
            .unwrap_err();
        assert!(matches!(err, ReflectionError::UnknownQuest));
    }

    #[tokio::test]
    async fn quest_reference_is_kept_when_valid() {
        let (_dir, store, quests, sentiment, user_id) = setup().await;
        let quest = quests
            .ensure_template("Meditate for 5 minutes", Category::Mindfulness, "Breathe.", 20)
            .await
            .unwrap();

        let saved = record(
            &store,
            &quests,
            &sentiment,
            &user_id,
            Some(&quest.id),
            "  calm after meditating  ",
        )
        .await
        .unwrap();
        assert_eq!(saved.quest_id.as_deref(), Some(quest.id.as_str()));
        assert_eq!(saved.text, "calm after meditating");
        // No scorer configured; neutral.
        assert_eq!(saved.sentiment_score, 0.0);
    }

    #[tokio::test]
    async fn mood_history_is_index_aligned_and_oldest_first() {
        let (_dir, store, _quests, _sentiment, user_id) = setup().await;
        store.insert(&user_id, None, "rough start", -0.6).await.unwrap();
        store.insert(&user_id, None, "getting better", 0.1).await.unwrap();
        store.insert(&user_id, None, "great evening", 0.9).await.unwrap();

        let history = store.mood_history(&user_id).await.unwrap();
        assert_eq!(history.dates.len(), 3);
        assert_eq!(history.scores, vec![-0.6, 0.1, 0.9]);
        let mut sorted = history.dates.clone();
        sorted.sort();
        assert_eq!(history.dates, sorted);
    }
}
