//! Percentile engine.
//!
//! Pure mapping from a holding amount to its rank within a distribution
//! snapshot: percentile, below/above counts, wealth category, and ratio
//! to the median holding. No side effects, no blocking — identical
//! inputs always yield the identical report, so callers may cache or run
//! computations in parallel without coordination.

use crate::distribution::{BalanceBucket, Distribution, DistributionError};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Maximum fractional digits accepted from a form field (satoshi precision).
const MAX_AMOUNT_SCALE: u32 = 8;

/// Percentiles reported in the threshold table.
pub const COMMON_PERCENTILES: [f64; 10] =
    [1.0, 5.0, 10.0, 25.0, 50.0, 75.0, 90.0, 95.0, 99.0, 99.9];

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid amount: {0}")]
    InvalidInput(String),
    #[error("invalid distribution: {0}")]
    InvalidDistribution(#[from] DistributionError),
}

/// Coarse wealth classification by absolute holding size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WealthCategory {
    Dust,
    Small,
    Moderate,
    Large,
    Whale,
}

impl WealthCategory {
    /// Fixed thresholds on the holding amount, boundaries inclusive on
    /// the upper category.
    pub fn from_amount(amount: f64) -> Self {
        match amount {
            x if x < 0.001 => WealthCategory::Dust,
            x if x < 0.1 => WealthCategory::Small,
            x if x < 10.0 => WealthCategory::Moderate,
            x if x < 100.0 => WealthCategory::Large,
            _ => WealthCategory::Whale,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WealthCategory::Dust => "Dust",
            WealthCategory::Small => "Small",
            WealthCategory::Moderate => "Moderate",
            WealthCategory::Large => "Large",
            WealthCategory::Whale => "Whale",
        }
    }

    pub fn btc_range(&self) -> &'static str {
        match self {
            WealthCategory::Dust => "< 0.001 BTC",
            WealthCategory::Small => "0.001 - 0.1 BTC",
            WealthCategory::Moderate => "0.1 - 10 BTC",
            WealthCategory::Large => "10 - 100 BTC",
            WealthCategory::Whale => "100+ BTC",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            WealthCategory::Dust => "below typical on-chain fee dust limits",
            WealthCategory::Small => "a starter stack",
            WealthCategory::Moderate => "a solid accumulation",
            WealthCategory::Large => "a major holder",
            WealthCategory::Whale => "holdings large enough to move markets",
        }
    }
}

impl std::fmt::Display for WealthCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a holding sits in the distribution. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingReport {
    pub amount_btc: f64,
    /// Share of addresses holding no more than the amount, 0–100.
    pub percentile: f64,
    /// Count of addresses holding no more than the amount.
    pub rank: u64,
    pub addresses_below: u64,
    pub addresses_above: u64,
    pub category: WealthCategory,
    pub ratio_to_median: f64,
}

/// Rank a holding against a distribution snapshot.
pub fn compute(distribution: &Distribution, amount: f64) -> Result<HoldingReport, EngineError> {
    validate_amount(amount)?;
    distribution.validate()?;

    let total = distribution.total_addresses as f64;
    let cumulative = cumulative_rank(distribution, amount);
    let percentile = (100.0 * cumulative / total).clamp(0.0, 100.0);

    // cumulative can exceed the stated total within the count tolerance
    let addresses_below = (cumulative.floor() as u64).min(distribution.total_addresses);
    let addresses_above = distribution.total_addresses - addresses_below;

    let median = amount_at_percentile(distribution, 50.0);
    let ratio_to_median = if median > 0.0 { amount / median } else { 0.0 };

    Ok(HoldingReport {
        amount_btc: amount,
        percentile,
        rank: addresses_below,
        addresses_below,
        addresses_above,
        category: WealthCategory::from_amount(amount),
        ratio_to_median,
    })
}

/// Estimated count of addresses holding no more than `amount`, assuming
/// addresses spread uniformly across each bucket's balance range. Any
/// amount inside the open-ended final bucket ranks at the top of it.
fn cumulative_rank(distribution: &Distribution, amount: f64) -> f64 {
    let mut below = 0.0;
    for bucket in &distribution.buckets {
        if let Some(upper) = bucket.upper_btc {
            if amount >= upper {
                below += bucket.address_count as f64;
                continue;
            }
        }
        if bucket.contains(amount) {
            below += rank_within(bucket, amount);
        }
    }
    below
}

fn rank_within(bucket: &BalanceBucket, amount: f64) -> f64 {
    let count = bucket.address_count as f64;
    match bucket.upper_btc {
        Some(upper) => {
            let fraction = (amount - bucket.lower_btc) / (upper - bucket.lower_btc);
            (count * fraction).clamp(0.0, count)
        }
        None => count,
    }
}

/// Inverse lookup: the holding amount at a given percentile, using the
/// same uniform-spread interpolation inverted. A target rank landing in
/// the open-ended final bucket maps to that bucket's lower bound.
pub fn amount_at_percentile(distribution: &Distribution, percentile: f64) -> f64 {
    let target = percentile / 100.0 * distribution.total_addresses as f64;
    let mut cumulative = 0.0;

    for bucket in &distribution.buckets {
        let count = bucket.address_count as f64;
        if count > 0.0 && cumulative + count >= target {
            return match bucket.upper_btc {
                Some(upper) => {
                    let fraction = (target - cumulative) / count;
                    bucket.lower_btc + fraction * (upper - bucket.lower_btc)
                }
                None => bucket.lower_btc,
            };
        }
        cumulative += count;
    }

    // Target beyond every count: the open tail's lower bound is the
    // largest defined threshold.
    distribution
        .buckets
        .last()
        .map(|b| b.lower_btc)
        .unwrap_or(0.0)
}

pub fn median_holding(distribution: &Distribution) -> f64 {
    amount_at_percentile(distribution, 50.0)
}

/// Threshold table for the common percentiles.
pub fn percentile_thresholds(
    distribution: &Distribution,
) -> Result<Vec<(f64, f64)>, EngineError> {
    distribution.validate()?;
    Ok(COMMON_PERCENTILES
        .iter()
        .map(|&p| (p, amount_at_percentile(distribution, p)))
        .collect())
}

/// Reject negative and non-finite amounts before any ranking math runs.
pub fn validate_amount(amount: f64) -> Result<(), EngineError> {
    if amount.is_nan() || amount.is_infinite() {
        return Err(EngineError::InvalidInput(
            "amount must be a finite number".to_string(),
        ));
    }
    if amount < 0.0 {
        return Err(EngineError::InvalidInput(
            "amount cannot be negative".to_string(),
        ));
    }
    Ok(())
}

/// Parse a form-field amount: a non-negative decimal with at most eight
/// fractional digits. Parsed exactly via `Decimal` so "0.00000001" is a
/// clean satoshi, then handed to the engine as `f64`.
pub fn parse_amount(input: &str) -> Result<f64, EngineError> {
    let trimmed = input.trim();
    let decimal = Decimal::from_str(trimmed)
        .map_err(|_| EngineError::InvalidInput(format!("'{trimmed}' is not a decimal number")))?;

    if decimal.is_sign_negative() && !decimal.is_zero() {
        return Err(EngineError::InvalidInput(
            "amount cannot be negative".to_string(),
        ));
    }
    if decimal.normalize().scale() > MAX_AMOUNT_SCALE {
        return Err(EngineError::InvalidInput(format!(
            "amount has more than {MAX_AMOUNT_SCALE} decimal places"
        )));
    }

    decimal
        .to_f64()
        .ok_or_else(|| EngineError::InvalidInput(format!("'{trimmed}' is out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::BalanceBucket;
    use chrono::Utc;

    /// Spec-shaped synthetic: [0,1) holds 100 addresses, [1,∞) holds 10.
    fn two_bucket() -> Distribution {
        Distribution::new(
            vec![
                BalanceBucket::new(0.0, Some(1.0), 100, 0.3),
                BalanceBucket::new(1.0, None, 10, 0.7),
            ],
            110,
            1000.0,
            "test",
        )
        .unwrap()
    }

    #[test]
    fn test_zero_amount_is_zeroth_percentile() {
        let report = compute(&two_bucket(), 0.0).unwrap();
        assert_eq!(report.percentile, 0.0);
        assert_eq!(report.addresses_below, 0);
        assert_eq!(report.addresses_above, 110);
    }

    #[test]
    fn test_max_amount_tops_out() {
        let report = compute(&two_bucket(), f64::MAX).unwrap();
        assert!((report.percentile - 100.0).abs() < 1e-9);
        assert_eq!(report.addresses_below, 110);
        assert_eq!(report.addresses_above, 0);
    }

    #[test]
    fn test_two_bucket_interpolation() {
        let report = compute(&two_bucket(), 0.5).unwrap();
        assert_eq!(report.addresses_below, 50);
        assert_eq!(report.rank, 50);
        assert!((report.percentile - 45.4545).abs() < 0.01);
    }

    #[test]
    fn test_monotonic_percentiles() {
        let d = two_bucket();
        let amounts = [0.0, 0.001, 0.25, 0.5, 0.9999, 1.0, 5.0, 1_000.0, f64::MAX];
        let mut previous = -1.0;
        for amount in amounts {
            let percentile = compute(&d, amount).unwrap().percentile;
            assert!(
                percentile >= previous,
                "percentile({amount}) = {percentile} < {previous}"
            );
            previous = percentile;
        }
    }

    #[test]
    fn test_category_boundaries() {
        assert_eq!(WealthCategory::from_amount(0.0009999), WealthCategory::Dust);
        assert_eq!(WealthCategory::from_amount(0.001), WealthCategory::Small);
        assert_eq!(WealthCategory::from_amount(0.0999), WealthCategory::Small);
        assert_eq!(WealthCategory::from_amount(0.1), WealthCategory::Moderate);
        assert_eq!(WealthCategory::from_amount(9.9999), WealthCategory::Moderate);
        assert_eq!(WealthCategory::from_amount(10.0), WealthCategory::Large);
        assert_eq!(WealthCategory::from_amount(99.9999), WealthCategory::Large);
        assert_eq!(WealthCategory::from_amount(100.0), WealthCategory::Whale);
    }

    #[test]
    fn test_negative_and_nan_rejected() {
        let d = two_bucket();
        assert!(matches!(
            compute(&d, -0.5),
            Err(EngineError::InvalidInput(_))
        ));
        assert!(matches!(
            compute(&d, f64::NAN),
            Err(EngineError::InvalidInput(_))
        ));
        assert!(matches!(
            compute(&d, f64::INFINITY),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_malformed_distribution_rejected() {
        // Bypass the validating constructor to hand the engine a table
        // with overlapping buckets.
        let d = Distribution {
            buckets: vec![
                BalanceBucket::new(0.0, Some(2.0), 100, 0.5),
                BalanceBucket::new(1.0, None, 10, 0.5),
            ],
            total_addresses: 110,
            total_supply: 1000.0,
            fetched_at: Utc::now(),
            source: "test".to_string(),
        };
        assert!(matches!(
            compute(&d, 0.5),
            Err(EngineError::InvalidDistribution(_))
        ));
    }

    #[test]
    fn test_median_inversion() {
        // 50th percentile rank = 55, inside the first bucket: 0.55 BTC.
        let d = two_bucket();
        let median = median_holding(&d);
        assert!((median - 0.55).abs() < 1e-9);

        let report = compute(&d, 0.55).unwrap();
        assert!((report.ratio_to_median - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_open_bucket_percentile_maps_to_lower_bound() {
        // 99th percentile rank = 108.9, landing in the open tail.
        let amount = amount_at_percentile(&two_bucket(), 99.0);
        assert_eq!(amount, 1.0);
    }

    #[test]
    fn test_parse_amount_accepts_satoshi_precision() {
        assert!((parse_amount("0.00000001").unwrap() - 1e-8).abs() < 1e-16);
        assert_eq!(parse_amount(" 2.5 ").unwrap(), 2.5);
        assert_eq!(parse_amount("1.000000000").unwrap(), 1.0);
    }

    #[test]
    fn test_parse_amount_rejects_bad_input() {
        assert!(parse_amount("0.000000001").is_err());
        assert!(parse_amount("-1").is_err());
        assert!(parse_amount("sats").is_err());
        assert!(parse_amount("").is_err());
    }
}
