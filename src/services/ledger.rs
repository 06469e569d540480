use async_trait::async_trait;
use governor::{clock::DefaultClock, state::{InMemoryState, NotKeyed}, RateLimiter};
use rayon::prelude::*;
use solana_account_decoder::UiAccountEncoding;
use solana_client::{
    nonblocking::rpc_client::RpcClient,
    rpc_client::GetConfirmedSignaturesForAddress2Config,
    rpc_config::RpcTransactionConfig,
    rpc_filter::{Memcmp, MemcmpEncodedBytes},
};
use solana_sdk::{
    commitment_config::CommitmentConfig, program_pack::Pack, pubkey::Pubkey, signature::Signature,
};
use solana_transaction_status::{UiTransactionEncoding, UiTransactionTokenBalance};
use spl_token::state::{Account as TokenAccount, Mint};
use std::str::FromStr;
use std::sync::Arc;

use crate::types::error::MonitorError;

pub type RpcRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// One token account returned by the holder scan, still in raw units.
#[derive(Debug, Clone)]
pub struct RawHolding {
    pub address: String,
    pub amount: u64,
    pub decimals: u8,
}

#[derive(Debug, Clone, Copy)]
pub struct MintInfo {
    pub decimals: u8,
    pub supply: u64,
}

/// Token balance snapshot for one account within a transaction.
#[derive(Debug, Clone)]
pub struct TokenBalanceEntry {
    pub owner: Option<String>,
    pub mint: String,
    pub amount: u64,
    pub decimals: u8,
}

impl TokenBalanceEntry {
    pub fn ui_amount(&self) -> f64 {
        self.amount as f64 / 10f64.powi(self.decimals as i32)
    }
}

/// A transaction lowered to the fields the pipeline reads: ordered account
/// keys, success status, and pre/post token balances.
#[derive(Debug, Clone)]
pub struct ResolvedTransaction {
    pub signature: String,
    pub account_keys: Vec<String>,
    pub failed: bool,
    pub pre_token_balances: Vec<TokenBalanceEntry>,
    pub post_token_balances: Vec<TokenBalanceEntry>,
}

/// Read-only view of the ledger. The pipeline only ever talks to this seam,
/// so analyses run unchanged against synthetic data in tests.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// All token accounts of `mint`, raw amounts. Zero accounts is a valid
    /// empty result, not an error.
    async fn scan_holders(&self, mint: &Pubkey) -> Result<Vec<RawHolding>, MonitorError>;

    async fn read_mint_info(&self, mint: &Pubkey) -> Result<MintInfo, MonitorError>;

    /// Raw balance of `owner`'s token account for `mint`, `None` when the
    /// account does not exist.
    async fn read_token_balance(
        &self,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Option<u64>, MonitorError>;

    /// Up to `limit` most recent signatures involving `address`, newest first.
    async fn recent_signatures(
        &self,
        address: &Pubkey,
        limit: usize,
    ) -> Result<Vec<String>, MonitorError>;

    async fn resolve_transaction(
        &self,
        signature: &str,
    ) -> Result<ResolvedTransaction, MonitorError>;
}

pub struct RpcLedger {
    client: Arc<RpcClient>,
    rate_limiter: Arc<RpcRateLimiter>,
}

impl RpcLedger {
    pub fn new(client: Arc<RpcClient>, rate_limiter: Arc<RpcRateLimiter>) -> Self {
        Self { client, rate_limiter }
    }
}

#[async_trait]
impl Ledger for RpcLedger {
    async fn scan_holders(&self, mint: &Pubkey) -> Result<Vec<RawHolding>, MonitorError> {
        let mint_info = self.read_mint_info(mint).await?;

        let config = solana_client::rpc_config::RpcProgramAccountsConfig {
            filters: Some(vec![
                solana_client::rpc_filter::RpcFilterType::Memcmp(Memcmp::new(
                    0,
                    MemcmpEncodedBytes::Base58(mint.to_string()),
                )),
                solana_client::rpc_filter::RpcFilterType::DataSize(TokenAccount::LEN as u64),
            ]),
            account_config: solana_client::rpc_config::RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                ..Default::default()
            },
            with_context: None,
        };

        self.rate_limiter.until_ready().await;
        let accounts = self
            .client
            .get_program_accounts_with_config(&spl_token::ID, config)
            .await
            .map_err(|e| MonitorError::DataUnavailable(format!("holder scan failed: {}", e)))?;
        tracing::info!("Found {} token accounts for mint {}", accounts.len(), mint);

        let holdings: Vec<RawHolding> = accounts
            .into_par_iter()
            .filter_map(|(pubkey, account)| {
                TokenAccount::unpack(&account.data)
                    .ok()
                    .filter(|token_account| {
                        token_account.amount > 0
                            && token_account.state == spl_token::state::AccountState::Initialized
                    })
                    .map(|token_account| RawHolding {
                        address: pubkey.to_string(),
                        amount: token_account.amount,
                        decimals: mint_info.decimals,
                    })
            })
            .collect();

        Ok(holdings)
    }

    async fn read_mint_info(&self, mint: &Pubkey) -> Result<MintInfo, MonitorError> {
        self.rate_limiter.until_ready().await;
        let account = self
            .client
            .get_account(mint)
            .await
            .map_err(|e| MonitorError::DataUnavailable(format!("mint fetch failed: {}", e)))?;
        let mint_data = Mint::unpack(&account.data)
            .map_err(|e| MonitorError::DataUnavailable(format!("mint decode failed: {}", e)))?;
        Ok(MintInfo {
            decimals: mint_data.decimals,
            supply: mint_data.supply,
        })
    }

    async fn read_token_balance(
        &self,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Option<u64>, MonitorError> {
        let ata = spl_associated_token_account::get_associated_token_address(owner, mint);

        self.rate_limiter.until_ready().await;
        let response = self
            .client
            .get_account_with_commitment(&ata, CommitmentConfig::confirmed())
            .await
            .map_err(|e| MonitorError::DataUnavailable(format!("balance fetch failed: {}", e)))?;

        match response.value {
            Some(account) => {
                let token_account = TokenAccount::unpack(&account.data).map_err(|e| {
                    MonitorError::DataUnavailable(format!("token account decode failed: {}", e))
                })?;
                Ok(Some(token_account.amount))
            }
            None => Ok(None),
        }
    }

    async fn recent_signatures(
        &self,
        address: &Pubkey,
        limit: usize,
    ) -> Result<Vec<String>, MonitorError> {
        self.rate_limiter.until_ready().await;
        let signatures = self
            .client
            .get_signatures_for_address_with_config(
                address,
                GetConfirmedSignaturesForAddress2Config {
                    limit: Some(limit),
                    commitment: Some(CommitmentConfig::confirmed()),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| MonitorError::DataUnavailable(format!("history fetch failed: {}", e)))?;

        Ok(signatures.into_iter().map(|s| s.signature).collect())
    }

    async fn resolve_transaction(
        &self,
        signature: &str,
    ) -> Result<ResolvedTransaction, MonitorError> {
        let sig = Signature::from_str(signature)
            .map_err(|e| MonitorError::DataUnavailable(format!("invalid signature: {}", e)))?;

        self.rate_limiter.until_ready().await;
        let tx_info = self
            .client
            .get_transaction_with_config(
                &sig,
                RpcTransactionConfig {
                    encoding: Some(UiTransactionEncoding::Base64),
                    commitment: Some(CommitmentConfig::confirmed()),
                    max_supported_transaction_version: Some(0),
                },
            )
            .await
            .map_err(|e| {
                MonitorError::DataUnavailable(format!("transaction fetch failed: {}", e))
            })?;

        let meta = tx_info
            .transaction
            .meta
            .as_ref()
            .ok_or_else(|| MonitorError::DataUnavailable("missing transaction meta".to_string()))?;

        let account_keys = tx_info
            .transaction
            .transaction
            .decode()
            .ok_or_else(|| {
                MonitorError::DataUnavailable("could not decode transaction".to_string())
            })?
            .message
            .static_account_keys()
            .iter()
            .map(|key| key.to_string())
            .collect();

        Ok(ResolvedTransaction {
            signature: signature.to_string(),
            account_keys,
            failed: meta.err.is_some(),
            pre_token_balances: lower_balances(meta.pre_token_balances.clone().into()),
            post_token_balances: lower_balances(meta.post_token_balances.clone().into()),
        })
    }
}

fn lower_balances(balances: Option<Vec<UiTransactionTokenBalance>>) -> Vec<TokenBalanceEntry> {
    balances
        .unwrap_or_default()
        .into_iter()
        .map(|balance| TokenBalanceEntry {
            owner: Option::<String>::from(balance.owner.clone()),
            mint: balance.mint.clone(),
            amount: balance.ui_token_amount.amount.parse().unwrap_or(0),
            decimals: balance.ui_token_amount.decimals,
        })
        .collect()
}
