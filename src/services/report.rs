use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use solana_sdk::pubkey::Pubkey;

use crate::config::Config;
use crate::services::distribution::{bundled_share, top_n_share};
use crate::services::holders::aggregate_holders;
use crate::services::ledger::{Ledger, ResolvedTransaction};
use crate::services::rugcheck::RiskScoreProvider;
use crate::services::{creator, rugcheck};
use crate::types::error::MonitorError;
use crate::types::models::{
    CreatorActivity, DistributionMetrics, MonitoredTokenReport, RiskMetrics, RiskVerdict,
    TokenBaseInfo,
};

/// The report schema tracks the combined share of the ten largest holders.
const TOP_HOLDER_COUNT: usize = 10;

/// Pull mint identity, decimals and seeded LP size out of the triggering
/// transaction. The liquidity-pool owner's post balance is the creation
/// signal; a transaction without one is not a launch and yields `None`.
pub fn extract_base_info(tx: &ResolvedTransaction, lp_owner: &Pubkey) -> Option<TokenBaseInfo> {
    let lp_owner = lp_owner.to_string();
    tx.post_token_balances
        .iter()
        .find(|entry| entry.owner.as_deref() == Some(lp_owner.as_str()))
        .map(|entry| TokenBaseInfo {
            mint_address: entry.mint.clone(),
            decimals: entry.decimals,
            lp_amount: entry.ui_amount(),
        })
}

/// Pure construction of the final record; stamps the capture time.
pub fn assemble(
    signature: &str,
    creator: &str,
    base_info: TokenBaseInfo,
    verdict: RiskVerdict,
    activity: CreatorActivity,
    distribution_metrics: DistributionMetrics,
) -> MonitoredTokenReport {
    MonitoredTokenReport {
        signature: signature.to_string(),
        creator: creator.to_string(),
        creator_rug_risk: verdict.score_above_threshold,
        timestamp: Utc::now(),
        base_info,
        risk_metrics: RiskMetrics {
            dev_holding_percentage: activity.holding_percentage,
            dev_has_sold_tokens: activity.has_sold,
        },
        distribution_metrics,
        rug_check_raw: verdict.external_score,
    }
}

/// Per-transaction analysis pipeline. Each call is independent and holds no
/// state across transactions, so callers may run any number concurrently.
pub struct Pipeline {
    ledger: Arc<dyn Ledger>,
    risk_provider: Arc<dyn RiskScoreProvider>,
    config: Config,
}

impl Pipeline {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        risk_provider: Arc<dyn RiskScoreProvider>,
        config: Config,
    ) -> Self {
        Self {
            ledger,
            risk_provider,
            config,
        }
    }

    /// Run one transaction through extraction, the concurrent lookups, and
    /// assembly. `None` means the transaction did not qualify; a collaborator
    /// failure degrades its field but still produces a complete report.
    pub async fn process(&self, tx: &ResolvedTransaction) -> Option<MonitoredTokenReport> {
        if tx.failed {
            return None;
        }

        let base_info = match extract_base_info(tx, &self.config.lp_owner) {
            Some(info) => info,
            None => {
                tracing::debug!("No LP balance entry in {}, skipping", tx.signature);
                return None;
            }
        };

        let creator_address = tx.account_keys.first()?.clone();
        let creator_key = match Pubkey::from_str(&creator_address) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!("Unparseable creator in {}: {}", tx.signature, e);
                return None;
            }
        };
        let mint_key = match Pubkey::from_str(&base_info.mint_address) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!("Unparseable mint in {}: {}", tx.signature, e);
                return None;
            }
        };

        tracing::info!(
            "Analyzing launch {} (mint {}, creator {})",
            tx.signature,
            base_info.mint_address,
            creator_address
        );

        // The four lookups are independent; join them so one slow call
        // bounds latency instead of all of them added up.
        let (verdict, holding, sold, distribution) = tokio::join!(
            rugcheck::fuse_risk(
                self.risk_provider.as_ref(),
                &base_info.mint_address,
                self.config.risk_score_threshold,
            ),
            creator::holding_percentage(self.ledger.as_ref(), &creator_key, &mint_key),
            creator::has_sold(
                self.ledger.as_ref(),
                &creator_key,
                &mint_key,
                self.config.history_window,
            ),
            self.distribution_metrics(&mint_key),
        );

        let holding_percentage = holding.unwrap_or_else(|e| {
            tracing::warn!("Creator holding unavailable for {}: {}", mint_key, e);
            0.0
        });
        let has_sold = sold.unwrap_or_else(|e| {
            tracing::warn!("Creator history unavailable for {}: {}", mint_key, e);
            false
        });
        let distribution_metrics = distribution.unwrap_or_else(|e| {
            tracing::warn!("Distribution unavailable for {}: {}", mint_key, e);
            DistributionMetrics {
                top10_holders_percentage: 0.0,
                bundled_holdings: Default::default(),
            }
        });

        Some(assemble(
            &tx.signature,
            &creator_address,
            base_info,
            verdict,
            CreatorActivity {
                holding_percentage,
                has_sold,
            },
            distribution_metrics,
        ))
    }

    async fn distribution_metrics(
        &self,
        mint: &Pubkey,
    ) -> Result<DistributionMetrics, MonitorError> {
        let distribution = aggregate_holders(self.ledger.as_ref(), mint).await?;
        Ok(DistributionMetrics {
            top10_holders_percentage: top_n_share(&distribution, TOP_HOLDER_COUNT),
            bundled_holdings: bundled_share(&distribution, self.config.bundled_threshold_pct),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ledger::testing::StaticLedger;
    use crate::services::ledger::{MintInfo, RawHolding, TokenBalanceEntry};
    use crate::services::rugcheck::testing::StaticScore;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn test_config(lp_owner: Pubkey) -> Config {
        Config {
            rpc_url: "http://localhost".to_string(),
            ws_url: "ws://localhost".to_string(),
            watched_account: Pubkey::new_unique(),
            lp_owner,
            rugcheck_base_url: "http://localhost".to_string(),
            risk_score_threshold: 10_000,
            bundled_threshold_pct: 15.0,
            history_window: 50,
            report_path: PathBuf::from("test_reports.jsonl"),
        }
    }

    fn lp_entry(lp_owner: &Pubkey, mint: &Pubkey, amount: u64) -> TokenBalanceEntry {
        TokenBalanceEntry {
            owner: Some(lp_owner.to_string()),
            mint: mint.to_string(),
            amount,
            decimals: 9,
        }
    }

    fn launch_tx(
        creator: &Pubkey,
        lp_owner: &Pubkey,
        mint: &Pubkey,
    ) -> ResolvedTransaction {
        ResolvedTransaction {
            signature: "launch-sig".to_string(),
            account_keys: vec![creator.to_string(), mint.to_string()],
            failed: false,
            pre_token_balances: vec![],
            post_token_balances: vec![lp_entry(lp_owner, mint, 30_000_000_000)],
        }
    }

    #[test]
    fn base_info_comes_from_the_lp_balance_entry() {
        let lp_owner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let tx = launch_tx(&Pubkey::new_unique(), &lp_owner, &mint);

        let info = extract_base_info(&tx, &lp_owner).unwrap();
        assert_eq!(info.mint_address, mint.to_string());
        assert_eq!(info.decimals, 9);
        assert!((info.lp_amount - 30.0).abs() < 1e-9);
    }

    #[test]
    fn no_lp_entry_means_no_base_info() {
        let mint = Pubkey::new_unique();
        let tx = launch_tx(&Pubkey::new_unique(), &Pubkey::new_unique(), &mint);

        assert!(extract_base_info(&tx, &Pubkey::new_unique()).is_none());
    }

    #[tokio::test]
    async fn pipeline_drops_non_qualifying_transactions() {
        let lp_owner = Pubkey::new_unique();
        let pipeline = Pipeline::new(
            Arc::new(StaticLedger::default()),
            Arc::new(StaticScore(Some(0))),
            test_config(lp_owner),
        );

        let tx = ResolvedTransaction {
            signature: "sig".to_string(),
            account_keys: vec![Pubkey::new_unique().to_string()],
            failed: false,
            pre_token_balances: vec![],
            post_token_balances: vec![],
        };

        assert!(pipeline.process(&tx).await.is_none());
    }

    #[tokio::test]
    async fn pipeline_drops_failed_transactions() {
        let lp_owner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let pipeline = Pipeline::new(
            Arc::new(StaticLedger::default()),
            Arc::new(StaticScore(Some(0))),
            test_config(lp_owner),
        );

        let mut tx = launch_tx(&Pubkey::new_unique(), &lp_owner, &mint);
        tx.failed = true;

        assert!(pipeline.process(&tx).await.is_none());
    }

    #[tokio::test]
    async fn pipeline_assembles_a_full_report() {
        let creator = Pubkey::new_unique();
        let lp_owner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();

        let mut balances = HashMap::new();
        balances.insert((creator.to_string(), mint.to_string()), 10_000_000_000u64);

        let mut transactions = HashMap::new();
        transactions.insert(
            "sell-sig".to_string(),
            ResolvedTransaction {
                signature: "sell-sig".to_string(),
                account_keys: vec![creator.to_string()],
                failed: false,
                pre_token_balances: vec![TokenBalanceEntry {
                    owner: Some(creator.to_string()),
                    mint: mint.to_string(),
                    amount: 20_000_000_000,
                    decimals: 9,
                }],
                post_token_balances: vec![TokenBalanceEntry {
                    owner: Some(creator.to_string()),
                    mint: mint.to_string(),
                    amount: 10_000_000_000,
                    decimals: 9,
                }],
            },
        );

        let ledger = StaticLedger {
            holdings: vec![
                RawHolding {
                    address: "holder-a".to_string(),
                    amount: 70_000_000_000,
                    decimals: 9,
                },
                RawHolding {
                    address: "holder-b".to_string(),
                    amount: 20_000_000_000,
                    decimals: 9,
                },
                RawHolding {
                    address: "holder-c".to_string(),
                    amount: 10_000_000_000,
                    decimals: 9,
                },
            ],
            mint_info: Some(MintInfo {
                decimals: 9,
                supply: 100_000_000_000,
            }),
            balances,
            signatures: vec!["sell-sig".to_string()],
            transactions,
            ..Default::default()
        };

        let pipeline = Pipeline::new(
            Arc::new(ledger),
            Arc::new(StaticScore(Some(15_000))),
            test_config(lp_owner),
        );

        let tx = launch_tx(&creator, &lp_owner, &mint);
        let report = pipeline.process(&tx).await.unwrap();

        assert_eq!(report.signature, "launch-sig");
        assert_eq!(report.creator, creator.to_string());
        assert!(report.creator_rug_risk);
        assert!(report.rug_check_raw.is_some());
        assert_eq!(report.base_info.mint_address, mint.to_string());
        assert!((report.base_info.lp_amount - 30.0).abs() < 1e-9);
        assert!((report.risk_metrics.dev_holding_percentage - 10.0).abs() < 1e-9);
        assert!(report.risk_metrics.dev_has_sold_tokens);
        assert!(
            (report.distribution_metrics.top10_holders_percentage - 100.0).abs() < 1e-9
        );
        // 15% threshold bundles the 70% and 20% holders.
        assert!(
            (report
                .distribution_metrics
                .bundled_holdings
                .bundled_percentage
                - 90.0)
                .abs()
                < 1e-9
        );
    }

    #[tokio::test]
    async fn collaborator_failures_degrade_fields_but_keep_the_report() {
        let creator = Pubkey::new_unique();
        let lp_owner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();

        let ledger = StaticLedger {
            mint_info: None,
            fail_scan: true,
            fail_history: true,
            ..Default::default()
        };

        let pipeline = Pipeline::new(
            Arc::new(ledger),
            Arc::new(StaticScore(None)),
            test_config(lp_owner),
        );

        let tx = launch_tx(&creator, &lp_owner, &mint);
        let report = pipeline.process(&tx).await.unwrap();

        assert!(!report.creator_rug_risk);
        assert!(report.rug_check_raw.is_none());
        assert_eq!(report.risk_metrics.dev_holding_percentage, 0.0);
        assert!(!report.risk_metrics.dev_has_sold_tokens);
        assert_eq!(report.distribution_metrics.top10_holders_percentage, 0.0);
        assert_eq!(
            report
                .distribution_metrics
                .bundled_holdings
                .bundled_percentage,
            0.0
        );
    }

    #[test]
    fn report_serializes_camel_case() {
        let report = assemble(
            "sig",
            "creator",
            TokenBaseInfo {
                mint_address: "mint".to_string(),
                decimals: 6,
                lp_amount: 1.0,
            },
            RiskVerdict::default(),
            CreatorActivity {
                holding_percentage: 0.0,
                has_sold: false,
            },
            DistributionMetrics {
                top10_holders_percentage: 0.0,
                bundled_holdings: Default::default(),
            },
        );

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("baseInfo").is_some());
        assert!(json["baseInfo"].get("mintAddress").is_some());
        assert!(json["riskMetrics"].get("devHoldingPercentage").is_some());
        assert!(json["distributionMetrics"]
            .get("top10HoldersPercentage")
            .is_some());
        // Absent external payload stays absent, not null.
        assert!(json.get("rugCheckRaw").is_none());
    }
}
