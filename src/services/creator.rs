use solana_sdk::pubkey::Pubkey;

use crate::services::ledger::{Ledger, TokenBalanceEntry};
use crate::types::error::MonitorError;

/// Share of current total supply sitting in the creator's token account,
/// in percent. No account for the mint, or an empty supply, is simply 0.
pub async fn holding_percentage(
    ledger: &dyn Ledger,
    creator: &Pubkey,
    mint: &Pubkey,
) -> Result<f64, MonitorError> {
    let mint_info = ledger.read_mint_info(mint).await?;
    if mint_info.supply == 0 {
        return Ok(0.0);
    }

    let balance = match ledger.read_token_balance(creator, mint).await? {
        Some(balance) => balance,
        None => return Ok(0.0),
    };

    Ok(balance as f64 / mint_info.supply as f64 * 100.0)
}

/// Scan the creator's recent transactions for a balance decrease in `mint`.
///
/// Bounded heuristic: only the `window` most recent transactions are
/// examined, so a `false` means "no sell-off observed in the window", not
/// proof the creator never sold. Failed and unresolvable transactions are
/// skipped. Returns on the first decrease found.
pub async fn has_sold(
    ledger: &dyn Ledger,
    creator: &Pubkey,
    mint: &Pubkey,
    window: usize,
) -> Result<bool, MonitorError> {
    let signatures = ledger.recent_signatures(creator, window).await?;
    let creator_str = creator.to_string();
    let mint_str = mint.to_string();

    for signature in &signatures {
        let tx = match ledger.resolve_transaction(signature).await {
            Ok(tx) => tx,
            Err(e) => {
                tracing::debug!("Skipping unresolvable transaction {}: {}", signature, e);
                continue;
            }
        };
        if tx.failed {
            continue;
        }

        let pre = balance_for(&tx.pre_token_balances, &creator_str, &mint_str);
        let post = balance_for(&tx.post_token_balances, &creator_str, &mint_str);

        // A pre-balance with no post entry means the account was emptied
        // and closed, which still counts as a decrease.
        if let Some(pre_amount) = pre {
            if pre_amount > post.unwrap_or(0) {
                tracing::info!(
                    "Creator {} decreased {} balance in transaction {}",
                    creator_str,
                    mint_str,
                    signature
                );
                return Ok(true);
            }
        }
    }

    Ok(false)
}

fn balance_for(entries: &[TokenBalanceEntry], owner: &str, mint: &str) -> Option<u64> {
    let matching: Vec<u64> = entries
        .iter()
        .filter(|entry| entry.mint == mint && entry.owner.as_deref() == Some(owner))
        .map(|entry| entry.amount)
        .collect();

    if matching.is_empty() {
        None
    } else {
        Some(matching.into_iter().sum())
    }
}
