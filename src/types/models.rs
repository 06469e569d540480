use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One token account holding a positive balance of the analyzed mint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holder {
    pub address: String,
    /// Balance normalized by the mint's decimals.
    pub amount: f64,
    /// Share of total supply, 0 when total supply is 0.
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenDistribution {
    pub total_supply: f64,
    pub holders: Vec<Holder>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundledHoldings {
    pub total_bundled_amount: f64,
    pub bundled_percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatorActivity {
    pub holding_percentage: f64,
    pub has_sold: bool,
}

/// Outcome of the external risk-score lookup. `external_score` is `None`
/// when the score could not be obtained, which consumers must not read as
/// "proven safe".
#[derive(Debug, Clone, Default)]
pub struct RiskVerdict {
    pub external_score: Option<serde_json::Value>,
    pub score_above_threshold: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBaseInfo {
    pub mint_address: String,
    pub decimals: u8,
    pub lp_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskMetrics {
    pub dev_holding_percentage: f64,
    pub dev_has_sold_tokens: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionMetrics {
    pub top10_holders_percentage: f64,
    pub bundled_holdings: BundledHoldings,
}

/// Final record for one monitored token launch. Assembled exactly once per
/// qualifying transaction and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoredTokenReport {
    pub signature: String,
    pub creator: String,
    pub creator_rug_risk: bool,
    pub timestamp: DateTime<Utc>,
    pub base_info: TokenBaseInfo,
    pub risk_metrics: RiskMetrics,
    pub distribution_metrics: DistributionMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rug_check_raw: Option<serde_json::Value>,
}
