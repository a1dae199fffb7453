use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pricing {
    pub cost_per_tb: Decimal,
    pub tax_rate: Decimal,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            cost_per_tb: Decimal::new(699, 2),
            tax_rate: Decimal::new(685, 4),
        }
    }
}

impl Pricing {
    /// `1 + tax_rate`.
    pub fn tax_multiplier(&self) -> Decimal {
        Decimal::ONE.saturating_add(self.tax_rate)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Upper bound of the MEDIUM low-disk tier, in percent free.
    pub low_disk_pct: Decimal,
    /// Lower bound of the MEDIUM discrepancy tier, in percent.
    pub discrepancy_pct: Decimal,
    /// Deleted/active ratio above which a bucket counts as high-deleted.
    pub deleted_ratio: Decimal,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            low_disk_pct: Decimal::new(20, 0),
            discrepancy_pct: Decimal::new(20, 0),
            deleted_ratio: Decimal::new(5, 1),
        }
    }
}

/// What to do with a site whose jobs carry no tier keyword at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierFallback {
    #[default]
    Gold,
    Unclassified,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub pricing: Pricing,
    pub thresholds: Thresholds,
    pub tier_fallback: TierFallback,
    /// Case-insensitive substring that marks backup buckets in the utilization export.
    pub bucket_marker: String,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            pricing: Pricing::default(),
            thresholds: Thresholds::default(),
            tier_fallback: TierFallback::default(),
            bucket_marker: "veeam".to_string(),
        }
    }
}
