use std::cmp::Ordering;

use crate::types::models::{BundledHoldings, TokenDistribution};

/// Combined share of the `n` largest holders, in percent of total supply.
///
/// Ties on percentage break by address so identical inputs always produce
/// identical output. Fewer than `n` holders sums what is there.
pub fn top_n_share(distribution: &TokenDistribution, n: usize) -> f64 {
    let mut holders: Vec<_> = distribution.holders.iter().collect();
    holders.sort_by(|a, b| {
        b.percentage
            .partial_cmp(&a.percentage)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.address.cmp(&b.address))
    });

    holders
        .iter()
        .take(n)
        .map(|holder| holder.percentage)
        .sum()
}

/// Aggregate position of "large" holders: every holder whose share meets
/// the threshold (inclusive) counts toward the bundle.
pub fn bundled_share(distribution: &TokenDistribution, threshold_pct: f64) -> BundledHoldings {
    if distribution.total_supply == 0.0 {
        return BundledHoldings {
            total_bundled_amount: 0.0,
            bundled_percentage: 0.0,
        };
    }

    let (total_bundled_amount, bundled_percentage) = distribution
        .holders
        .iter()
        .filter(|holder| holder.percentage >= threshold_pct)
        .fold((0.0, 0.0), |(amount, pct), holder| {
            (amount + holder.amount, pct + holder.percentage)
        });

    BundledHoldings {
        total_bundled_amount,
        bundled_percentage,
    }
}
