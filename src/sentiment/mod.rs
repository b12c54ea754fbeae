// SPDX-License-Identifier: MIT
//! Sentiment scoring via an external HTTP service.
//!
//! The scorer calls `POST {url}` with `{ "text": ... }` and expects
//! `{ "score": -1.0..1.0 }`. An unset URL and every failure mode — transport
//! error, non-2xx status, bad body — score neutral (0.0): a reflection is
//! never rejected because the scorer is down.

use serde::Deserialize;
use tracing::warn;

use crate::config::SentimentConfig;

#[derive(Debug, Deserialize)]
struct ScoreResponse {
    score: f64,
}

struct Remote {
    client: reqwest::Client,
    url: String,
}

impl Remote {
    async fn call(&self, text: &str) -> anyhow::Result<f64> {
        let resp = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await?
            .error_for_status()?;
        let body: ScoreResponse = resp.json().await?;
        Ok(body.score)
    }
}

/// Scoring client. Holds no connection state; safe to share.
pub struct SentimentClient {
    remote: Option<Remote>,
}

impl SentimentClient {
    /// Build from config. An unset URL yields a neutral-only scorer.
    pub fn from_config(config: &SentimentConfig) -> Self {
        let remote = match &config.url {
            Some(url) if !url.is_empty() => {
                let builder = reqwest::Client::builder()
                    .timeout(std::time::Duration::from_secs(config.timeout_secs));
                match builder.build() {
                    Ok(client) => Some(Remote {
                        client,
                        url: url.clone(),
                    }),
                    Err(e) => {
                        warn!("failed to build sentiment client: {e:#} — scoring neutral");
                        None
                    }
                }
            }
            _ => None,
        };
        Self { remote }
    }

    /// Score `text`, returning a value in [-1.0, 1.0].
    pub async fn score(&self, text: &str) -> f64 {
        let Some(remote) = &self.remote else {
            return 0.0;
        };
        match remote.call(text).await {
            Ok(score) if score.is_finite() => score.clamp(-1.0, 1.0),
            Ok(score) => {
                warn!("sentiment service returned non-finite score {score} — scoring neutral");
                0.0
            }
            Err(e) => {
                warn!("sentiment scoring failed: {e:#} — scoring neutral");
                0.0
            }
        }
    }
}
