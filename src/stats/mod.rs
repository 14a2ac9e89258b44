//! Distribution-level statistics: central tendency, inequality, and
//! supply concentration.

use crate::distribution::Distribution;
use crate::percentile::median_holding;
use serde::{Deserialize, Serialize};

/// Summary statistics for one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionStats {
    pub mean_btc: f64,
    pub median_btc: f64,
    /// Gini coefficient in [0, 1]; 0 = perfect equality.
    pub gini_coefficient: f64,
    /// Share of supply held by the top 1% / 5% / 10% of addresses, in [0, 1].
    pub top_1_percent_supply: f64,
    pub top_5_percent_supply: f64,
    pub top_10_percent_supply: f64,
}

impl DistributionStats {
    /// Assumes a snapshot that already passed validation; statistics on a
    /// malformed table are meaningless.
    pub fn compute(distribution: &Distribution) -> Self {
        Self {
            mean_btc: distribution.mean_holding(),
            median_btc: median_holding(distribution),
            gini_coefficient: gini_coefficient(distribution),
            top_1_percent_supply: concentration_ratio(distribution, 1.0),
            top_5_percent_supply: concentration_ratio(distribution, 5.0),
            top_10_percent_supply: concentration_ratio(distribution, 10.0),
        }
    }
}

/// Gini = 1 - 2 * (area under the Lorenz curve), the curve traced by
/// cumulative supply share against cumulative address share, buckets
/// ascending by balance.
pub fn gini_coefficient(distribution: &Distribution) -> f64 {
    let total_addresses = distribution.total_addresses as f64;
    let mut area = 0.0;
    let mut cumulative_wealth = 0.0;

    for bucket in &distribution.buckets {
        let address_share = bucket.address_count as f64 / total_addresses;
        let wealth_share = bucket.supply_fraction;
        // trapezoid under this Lorenz segment
        area += address_share * (cumulative_wealth + wealth_share / 2.0);
        cumulative_wealth += wealth_share;
    }

    (1.0 - 2.0 * area).clamp(0.0, 1.0)
}

/// Share of supply held by the wealthiest `top_percent`% of addresses.
/// Walks buckets from the top, taking a pro-rata slice of the bucket
/// that straddles the cutoff.
pub fn concentration_ratio(distribution: &Distribution, top_percent: f64) -> f64 {
    let total_addresses = distribution.total_addresses as f64;
    let mut address_share_taken = 0.0;
    let mut supply_share = 0.0;

    for bucket in distribution.buckets.iter().rev() {
        let bucket_share = 100.0 * bucket.address_count as f64 / total_addresses;
        if address_share_taken + bucket_share <= top_percent {
            supply_share += bucket.supply_fraction;
            address_share_taken += bucket_share;
        } else {
            let remaining = top_percent - address_share_taken;
            if bucket_share > 0.0 {
                supply_share += bucket.supply_fraction * (remaining / bucket_share);
            }
            break;
        }
    }

    supply_share
}
