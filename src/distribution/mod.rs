//! Address-balance distribution snapshot model.
//!
//! A `Distribution` is an ordered table of balance-range buckets covering
//! `[0, ∞)`, plus network totals. Snapshots are validated once at
//! construction and replaced wholesale on refresh — never mutated in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Protocol-level ceiling on circulating supply.
pub const MAX_SUPPLY_BTC: f64 = 21_000_000.0;

/// Provider tables are derived from published shares and truncate when
/// converted to counts, so the count sum is checked within 1% of the
/// stated total rather than exactly.
const COUNT_TOLERANCE: f64 = 0.01;
const SUPPLY_FRACTION_TOLERANCE: f64 = 1e-2;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DistributionError {
    #[error("distribution has no buckets")]
    Empty,
    #[error("total address count is zero")]
    ZeroAddresses,
    #[error("total supply must be positive, got {0}")]
    NonPositiveSupply(f64),
    #[error("total supply {0} exceeds the {MAX_SUPPLY_BTC} BTC cap")]
    SupplyExceedsCap(f64),
    #[error("bucket {index} has invalid bounds [{lower}, {upper:?})")]
    BadBounds {
        index: usize,
        lower: f64,
        upper: Option<f64>,
    },
    #[error("first bucket starts at {0}, expected 0")]
    DoesNotStartAtZero(f64),
    #[error("buckets out of order at index {0}")]
    OutOfOrder(usize),
    #[error("buckets {0} and {1} overlap")]
    Overlap(usize, usize),
    #[error("coverage gap between buckets {0} and {1}")]
    Gap(usize, usize),
    #[error("bucket {0} is open-ended but is not the last bucket")]
    OpenBucketNotLast(usize),
    #[error("last bucket has a finite upper bound {0}; table must cover [0, ∞)")]
    BoundedTail(f64),
    #[error("bucket {index} supply fraction {fraction} outside [0, 1]")]
    SupplyFractionOutOfRange { index: usize, fraction: f64 },
    #[error("bucket counts sum to {sum}, stated total is {total}")]
    CountMismatch { sum: u64, total: u64 },
    #[error("supply fractions sum to {0}, expected ~1.0")]
    SupplyFractionSum(f64),
}

/// A contiguous balance range with its address count and share of supply.
/// `upper_btc = None` marks the open-ended final bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceBucket {
    pub lower_btc: f64,
    pub upper_btc: Option<f64>,
    pub address_count: u64,
    pub supply_fraction: f64,
}

impl BalanceBucket {
    pub fn new(
        lower_btc: f64,
        upper_btc: Option<f64>,
        address_count: u64,
        supply_fraction: f64,
    ) -> Self {
        Self {
            lower_btc,
            upper_btc,
            address_count,
            supply_fraction,
        }
    }

    pub fn is_open(&self) -> bool {
        self.upper_btc.is_none()
    }

    /// Membership test for the half-open range `[lower, upper)`.
    pub fn contains(&self, amount: f64) -> bool {
        amount >= self.lower_btc && self.upper_btc.map_or(true, |upper| amount < upper)
    }
}

/// A validated, immutable distribution snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub buckets: Vec<BalanceBucket>,
    pub total_addresses: u64,
    pub total_supply: f64,
    pub fetched_at: DateTime<Utc>,
    pub source: String,
}

impl Distribution {
    /// Build and validate a snapshot. Fails rather than repairs: a
    /// malformed bucket table is the provider's problem, not ours.
    pub fn new(
        buckets: Vec<BalanceBucket>,
        total_addresses: u64,
        total_supply: f64,
        source: impl Into<String>,
    ) -> Result<Self, DistributionError> {
        let distribution = Self {
            buckets,
            total_addresses,
            total_supply,
            fetched_at: Utc::now(),
            source: source.into(),
        };
        distribution.validate()?;
        Ok(distribution)
    }

    /// Check every snapshot invariant: ordering, contiguity, coverage of
    /// `[0, ∞)`, positive totals, count and supply-fraction sums.
    pub fn validate(&self) -> Result<(), DistributionError> {
        if self.buckets.is_empty() {
            return Err(DistributionError::Empty);
        }
        if self.total_addresses == 0 {
            return Err(DistributionError::ZeroAddresses);
        }
        if !(self.total_supply > 0.0) {
            return Err(DistributionError::NonPositiveSupply(self.total_supply));
        }
        if self.total_supply > MAX_SUPPLY_BTC {
            return Err(DistributionError::SupplyExceedsCap(self.total_supply));
        }

        let last = self.buckets.len() - 1;
        for (i, bucket) in self.buckets.iter().enumerate() {
            if !bucket.lower_btc.is_finite() || bucket.lower_btc < 0.0 {
                return Err(DistributionError::BadBounds {
                    index: i,
                    lower: bucket.lower_btc,
                    upper: bucket.upper_btc,
                });
            }
            match bucket.upper_btc {
                Some(upper) if !upper.is_finite() || upper <= bucket.lower_btc => {
                    return Err(DistributionError::BadBounds {
                        index: i,
                        lower: bucket.lower_btc,
                        upper: bucket.upper_btc,
                    });
                }
                Some(_) => {}
                None if i != last => return Err(DistributionError::OpenBucketNotLast(i)),
                None => {}
            }
            if !(0.0..=1.0).contains(&bucket.supply_fraction) {
                return Err(DistributionError::SupplyFractionOutOfRange {
                    index: i,
                    fraction: bucket.supply_fraction,
                });
            }
        }

        if self.buckets[0].lower_btc != 0.0 {
            return Err(DistributionError::DoesNotStartAtZero(
                self.buckets[0].lower_btc,
            ));
        }
        if let Some(upper) = self.buckets[last].upper_btc {
            return Err(DistributionError::BoundedTail(upper));
        }

        for i in 0..last {
            let current = &self.buckets[i];
            let next = &self.buckets[i + 1];
            // current.upper_btc is Some here: only the last bucket may be open
            let upper = current.upper_btc.unwrap_or(f64::INFINITY);
            if next.lower_btc < current.lower_btc {
                return Err(DistributionError::OutOfOrder(i + 1));
            }
            if next.lower_btc < upper {
                return Err(DistributionError::Overlap(i, i + 1));
            }
            if next.lower_btc > upper {
                return Err(DistributionError::Gap(i, i + 1));
            }
        }

        let count_sum: u64 = self.buckets.iter().map(|b| b.address_count).sum();
        let drift = (count_sum as f64 - self.total_addresses as f64).abs();
        if drift > self.total_addresses as f64 * COUNT_TOLERANCE {
            return Err(DistributionError::CountMismatch {
                sum: count_sum,
                total: self.total_addresses,
            });
        }

        let fraction_sum: f64 = self.buckets.iter().map(|b| b.supply_fraction).sum();
        if (fraction_sum - 1.0).abs() > SUPPLY_FRACTION_TOLERANCE {
            return Err(DistributionError::SupplyFractionSum(fraction_sum));
        }

        Ok(())
    }

    /// Locate the bucket containing `amount`. Every non-negative finite
    /// amount lands somewhere once the table validates.
    pub fn bucket_for(&self, amount: f64) -> Option<&BalanceBucket> {
        self.buckets.iter().find(|bucket| bucket.contains(amount))
    }

    pub fn mean_holding(&self) -> f64 {
        self.total_supply / self.total_addresses as f64
    }
}
