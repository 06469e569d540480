use futures::StreamExt;
use solana_client::nonblocking::pubsub_client::PubsubClient;
use solana_client::rpc_config::{RpcTransactionLogsConfig, RpcTransactionLogsFilter};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::Duration;

use crate::services::ledger::Ledger;
use crate::services::report::Pipeline;
use crate::services::sink::ReportSink;

/// Watch confirmed logs mentioning the configured account and run each new
/// signature through the analysis pipeline. Every signature gets its own
/// task; pipelines share nothing, so a slow launch never blocks the next.
pub async fn start_monitoring(
    ws_url: String,
    watched_account: Pubkey,
    ledger: Arc<dyn Ledger>,
    pipeline: Arc<Pipeline>,
    sink: Arc<dyn ReportSink>,
) {
    tracing::info!("Starting launch monitor for {}", watched_account);

    let mut retry_delay = 2u64;
    let mut seen_signatures: HashSet<String> = HashSet::new();

    loop {
        let client = match PubsubClient::new(&ws_url).await {
            Ok(client) => {
                retry_delay = 2;
                client
            }
            Err(e) => {
                tracing::error!(
                    "WebSocket connect failed: {}. Retrying in {}s...",
                    e,
                    retry_delay
                );
                tokio::time::sleep(Duration::from_secs(retry_delay)).await;
                retry_delay = (retry_delay * 2).min(60);
                continue;
            }
        };

        let subscription = client
            .logs_subscribe(
                RpcTransactionLogsFilter::Mentions(vec![watched_account.to_string()]),
                RpcTransactionLogsConfig {
                    commitment: Some(CommitmentConfig::confirmed()),
                },
            )
            .await;

        let (mut notifications, unsubscribe) = match subscription {
            Ok(subscription) => subscription,
            Err(e) => {
                tracing::error!("logsSubscribe failed: {}. Reconnecting...", e);
                tokio::time::sleep(Duration::from_secs(retry_delay)).await;
                retry_delay = (retry_delay * 2).min(60);
                continue;
            }
        };

        tracing::info!("Subscribed to logs mentioning {}", watched_account);

        while let Some(response) = notifications.next().await {
            let log = response.value;
            if log.err.is_some() {
                continue;
            }
            if seen_signatures.len() > 10_000 {
                seen_signatures.clear();
            }
            if !seen_signatures.insert(log.signature.clone()) {
                continue;
            }

            let ledger = ledger.clone();
            let pipeline = pipeline.clone();
            let sink = sink.clone();
            tokio::spawn(async move {
                handle_signature(log.signature, ledger, pipeline, sink).await;
            });
        }

        unsubscribe().await;
        tracing::warn!(
            "Log subscription dropped. Reconnecting in {}s...",
            retry_delay
        );
        tokio::time::sleep(Duration::from_secs(retry_delay)).await;
        retry_delay = (retry_delay * 2).min(60);
    }
}

async fn handle_signature(
    signature: String,
    ledger: Arc<dyn Ledger>,
    pipeline: Arc<Pipeline>,
    sink: Arc<dyn ReportSink>,
) {
    let tx = match ledger.resolve_transaction(&signature).await {
        Ok(tx) => tx,
        Err(e) => {
            tracing::warn!("Could not resolve {}: {}", signature, e);
            return;
        }
    };

    if let Some(report) = pipeline.process(&tx).await {
        match sink.append(&report).await {
            Ok(()) => tracing::info!(
                "Recorded report for mint {} ({})",
                report.base_info.mint_address,
                signature
            ),
            Err(e) => tracing::error!("Failed to persist report for {}: {}", signature, e),
        }
    }
}
