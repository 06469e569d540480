use anyhow::Result;
use dotenv::dotenv;
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use std::sync::Arc;

mod config;
mod services;
mod types;

use crate::config::Config;
use crate::services::ledger::RpcLedger;
use crate::services::monitor;
use crate::services::report::Pipeline;
use crate::services::rugcheck::RugcheckClient;
use crate::services::sink::JsonlFileSink;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt::init();

    dotenv().ok();
    let config = Config::from_env()?;

    let rpc_limiter = Arc::new(RateLimiter::direct(Quota::per_second(nonzero!(5u32))));
    let rpc_client = Arc::new(RpcClient::new_with_timeout_and_commitment(
        config.rpc_url.clone(),
        std::time::Duration::from_secs(60),
        CommitmentConfig::confirmed(),
    ));

    // Test RPC connection at startup
    match rpc_client.get_version().await {
        Ok(version) => tracing::info!(
            "Connected to Solana RPC (version: {})",
            version.solana_core
        ),
        Err(e) => tracing::error!("Failed to connect to RPC: {:?}", e),
    };

    let ledger = Arc::new(RpcLedger::new(rpc_client, rpc_limiter));
    let risk_provider = Arc::new(RugcheckClient::new(
        reqwest::Client::new(),
        config.rugcheck_base_url.clone(),
    ));
    let sink = Arc::new(JsonlFileSink::new(config.report_path.clone()));

    tracing::info!(
        "Reports will be appended to {}",
        config.report_path.display()
    );

    let pipeline = Arc::new(Pipeline::new(
        ledger.clone(),
        risk_provider,
        config.clone(),
    ));

    monitor::start_monitoring(
        config.ws_url.clone(),
        config.watched_account,
        ledger,
        pipeline,
        sink,
    )
    .await;

    Ok(())
}
