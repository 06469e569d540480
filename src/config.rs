use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use solana_sdk::pubkey::Pubkey;

use crate::types::error::MonitorError;

/// Account whose confirmed logs signal pump.fun -> Raydium migrations.
const DEFAULT_WATCHED_ACCOUNT: &str = "39azUYFWPz3VHgKCf3VChUwbpURdCHRxjWVowf5jUJjg";
/// Raydium V4 authority; owns the pool-side token account of a fresh LP.
const DEFAULT_LP_OWNER: &str = "5Q544fKrFoe6tsEbD7S8EmxGTJYAKtTVhAW5Q5pge4j1";
const DEFAULT_RUGCHECK_BASE_URL: &str = "https://api.rugcheck.xyz";

#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub ws_url: String,
    pub watched_account: Pubkey,
    pub lp_owner: Pubkey,
    pub rugcheck_base_url: String,
    pub risk_score_threshold: u64,
    pub bundled_threshold_pct: f64,
    pub history_window: usize,
    pub report_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, MonitorError> {
        let (rpc_url, ws_url) = match env::var("RPC_URL") {
            Ok(url) => {
                let ws = env::var("WS_URL")
                    .unwrap_or_else(|_| url.replacen("https://", "wss://", 1));
                (url, ws)
            }
            Err(_) => {
                let api_key = env::var("HELIUS_API_KEY").map_err(|_| {
                    MonitorError::Configuration(
                        "either RPC_URL or HELIUS_API_KEY must be set".to_string(),
                    )
                })?;
                (
                    format!("https://rpc.helius.xyz/?api-key={}", api_key),
                    format!("wss://rpc.helius.xyz/?api-key={}", api_key),
                )
            }
        };

        Ok(Config {
            rpc_url,
            ws_url,
            watched_account: pubkey_var("WATCHED_ACCOUNT", DEFAULT_WATCHED_ACCOUNT)?,
            lp_owner: pubkey_var("LP_OWNER", DEFAULT_LP_OWNER)?,
            rugcheck_base_url: env::var("RUGCHECK_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_RUGCHECK_BASE_URL.to_string()),
            risk_score_threshold: parsed_var("RISK_SCORE_THRESHOLD", 10_000)?,
            bundled_threshold_pct: parsed_var("BUNDLED_THRESHOLD_PCT", 1.0)?,
            history_window: parsed_var("HISTORY_WINDOW", 50)?,
            report_path: env::var("REPORT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("token_reports.jsonl")),
        })
    }
}

fn pubkey_var(name: &str, default: &str) -> Result<Pubkey, MonitorError> {
    let value = env::var(name).unwrap_or_else(|_| default.to_string());
    Pubkey::from_str(&value)
        .map_err(|e| MonitorError::Configuration(format!("{} is not a valid address: {}", name, e)))
}

fn parsed_var<T: FromStr>(name: &str, default: T) -> Result<T, MonitorError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| MonitorError::Configuration(format!("invalid {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}
