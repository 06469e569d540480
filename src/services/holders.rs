use solana_sdk::pubkey::Pubkey;

use crate::services::ledger::Ledger;
use crate::types::error::MonitorError;
use crate::types::models::{Holder, TokenDistribution};

/// Enumerate every account holding the mint and normalize into a holder set
/// with total supply. A scan that finds nothing yields an empty
/// distribution; a scan that fails propagates, so "no holders" is never
/// fabricated out of an outage.
pub async fn aggregate_holders(
    ledger: &dyn Ledger,
    mint: &Pubkey,
) -> Result<TokenDistribution, MonitorError> {
    let holdings = ledger.scan_holders(mint).await?;

    let normalized: Vec<(String, f64)> = holdings
        .into_iter()
        .filter_map(|holding| {
            let amount = holding.amount as f64 / 10f64.powi(holding.decimals as i32);
            // Dust and closed accounts carry no distribution signal.
            (amount > 0.0).then(|| (holding.address, amount))
        })
        .collect();

    let total_supply: f64 = normalized.iter().map(|(_, amount)| amount).sum();

    let holders = normalized
        .into_iter()
        .map(|(address, amount)| Holder {
            address,
            // Guard the zero-supply case instead of dividing into NaN.
            percentage: if total_supply > 0.0 {
                amount / total_supply * 100.0
            } else {
                0.0
            },
            amount,
        })
        .collect();

    Ok(TokenDistribution {
        total_supply,
        holders,
    })
}
