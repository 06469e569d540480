use async_trait::async_trait;
use serde_json::Value;

use crate::types::error::MonitorError;
use crate::types::models::RiskVerdict;

#[derive(Debug, Clone)]
pub struct RiskScore {
    pub score: u64,
    pub raw: Value,
}

#[async_trait]
pub trait RiskScoreProvider: Send + Sync {
    async fn fetch_score(&self, mint: &str) -> Result<RiskScore, MonitorError>;
}

/// rugcheck.xyz report API. Scores grow with danger.
pub struct RugcheckClient {
    client: reqwest::Client,
    base_url: String,
}

impl RugcheckClient {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl RiskScoreProvider for RugcheckClient {
    async fn fetch_score(&self, mint: &str) -> Result<RiskScore, MonitorError> {
        let url = format!("{}/v1/tokens/{}/report", self.base_url, mint);

        let response = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| MonitorError::DataUnavailable(format!("rugcheck request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(MonitorError::DataUnavailable(format!(
                "rugcheck returned status {}",
                response.status()
            )));
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|e| MonitorError::DataUnavailable(format!("rugcheck decode failed: {}", e)))?;

        let score = raw["score"].as_u64().ok_or_else(|| {
            MonitorError::DataUnavailable("rugcheck report carries no score".to_string())
        })?;

        Ok(RiskScore { score, raw })
    }
}

/// Fold the external score into a verdict. An unobtainable score is not
/// "safe": the verdict flags nothing, but the raw payload stays absent so
/// report consumers can tell unknown from low-risk.
pub async fn fuse_risk(
    provider: &dyn RiskScoreProvider,
    mint: &str,
    threshold: u64,
) -> RiskVerdict {
    match provider.fetch_score(mint).await {
        Ok(score) => RiskVerdict {
            score_above_threshold: score.score >= threshold,
            external_score: Some(score.raw),
        },
        Err(e) => {
            tracing::warn!("Risk score unavailable for {}: {}", mint, e);
            RiskVerdict {
                score_above_threshold: false,
                external_score: None,
            }
        }
    }
}
