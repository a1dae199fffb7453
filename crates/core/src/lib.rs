mod config;
mod numeric;
mod sites;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use config::{Pricing, ReconcileConfig, Thresholds, TierFallback};
pub use numeric::{
    GB_PER_TB, gb_to_tb, pct_of, round_money, round_pct, round_tb, saturating_sum,
};
pub use sites::{
    SiteResolution, SiteRule, UNKNOWN_SITE, resolve_server_site, server_id_from_filename,
    site_code_from_bucket, site_code_from_server,
};

/// A numeric cell that either parsed cleanly or was replaced by a fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Coerced<T> {
    Parsed { value: T },
    Defaulted { raw: String, value: T },
}

impl<T: Copy> Coerced<T> {
    pub fn parsed(value: T) -> Self {
        Self::Parsed { value }
    }

    pub fn defaulted(raw: impl Into<String>, value: T) -> Self {
        Self::Defaulted {
            raw: raw.into(),
            value,
        }
    }

    pub fn value(&self) -> T {
        match self {
            Self::Parsed { value } | Self::Defaulted { value, .. } => *value,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, Self::Defaulted { .. })
    }

    /// Defaulted from an empty cell rather than from unreadable text.
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Defaulted { raw, .. } if raw.trim().is_empty())
    }
}

/// Discrete outcome column of an audit export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LastResult {
    Success,
    Warning,
    Failed,
    Unknown(String),
}

impl LastResult {
    pub fn from_cell(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "success" => Self::Success,
            "warning" => Self::Warning,
            "failed" => Self::Failed,
            _ => Self::Unknown(trimmed.to_string()),
        }
    }
}

/// One job row from one server's audit file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupJobRecord {
    pub server_id: String,
    pub site_code: String,
    pub job_name: Option<String>,
    pub backup_size_gb: Coerced<Decimal>,
    pub disk_free_gb: Coerced<Decimal>,
    /// `None` when the export has no success-rate column.
    pub success_rate: Option<Coerced<Decimal>>,
    /// `None` when the export has no last-result column.
    pub last_result: Option<LastResult>,
    pub backup_mode: Option<String>,
    pub schedule: Option<String>,
}

/// One bucket's billing snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketUtilizationRecord {
    pub bucket_name: String,
    pub site_code: String,
    pub active_tb: Coerced<Decimal>,
    pub deleted_tb: Coerced<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BdrMetric {
    pub report_date: NaiveDate,
    pub server_id: String,
    pub site_code: String,
    pub backup_size_tb: Decimal,
    pub disk_free_tb: Decimal,
    pub disk_free_pct: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketMetric {
    pub report_date: NaiveDate,
    pub bucket_name: String,
    pub site_code: String,
    pub active_tb: Decimal,
    pub deleted_tb: Decimal,
    pub active_cost: Decimal,
    pub deleted_cost: Decimal,
    pub total_cost: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCounts {
    pub total_jobs: u64,
    pub success_jobs: u64,
    pub warning_jobs: u64,
    pub failed_jobs: u64,
    pub increment_jobs: u64,
    pub reverse_increment_jobs: u64,
    pub gold_jobs: u64,
    pub silver_jobs: u64,
    pub bronze_jobs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteMetric {
    pub report_date: NaiveDate,
    pub site_code: String,
    pub veeam_tb: Decimal,
    pub wasabi_active_tb: Decimal,
    pub wasabi_deleted_tb: Decimal,
    pub discrepancy_pct: Decimal,
    pub success_rate_pct: Decimal,
    #[serde(flatten)]
    pub jobs: JobCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    pub report_date: NaiveDate,
    pub veeam_tb: Decimal,
    pub wasabi_active_tb: Decimal,
    pub wasabi_deleted_tb: Decimal,
    pub discrepancy_pct: Decimal,
    pub total_cost: Decimal,
    pub active_cost: Decimal,
    pub deleted_cost: Decimal,
    pub low_disk_count: u64,
    pub high_discrepancy_count: u64,
    pub high_deleted_count: u64,
    pub total_jobs: u64,
    pub successful_jobs: u64,
    pub failed_jobs: u64,
    pub warning_jobs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "CRITICAL" => Ok(Self::Critical),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    LowDisk,
    HighDiscrepancy,
    FailedJobs,
}

impl AnomalyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LowDisk => "low_disk",
            Self::HighDiscrepancy => "high_discrepancy",
            Self::FailedJobs => "failed_jobs",
        }
    }

    /// Name of the metric the rule family evaluates.
    pub fn metric(&self) -> &'static str {
        match self {
            Self::LowDisk => "disk_free_pct",
            Self::HighDiscrepancy => "discrepancy_pct",
            Self::FailedJobs => "failed_job_count",
        }
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnomalyKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "low_disk" => Ok(Self::LowDisk),
            "high_discrepancy" => Ok(Self::HighDiscrepancy),
            "failed_jobs" => Ok(Self::FailedJobs),
            other => Err(format!("unknown anomaly type: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anomaly {
    pub report_date: NaiveDate,
    pub severity: Severity,
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    /// Server id or site code the anomaly was raised for.
    pub subject: String,
    pub metric: String,
    pub current_value: Decimal,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn coerced_exposes_value_either_way() {
        let parsed = Coerced::parsed(dec!(1.5));
        let defaulted = Coerced::defaulted("n/a", Decimal::ZERO);
        assert_eq!(parsed.value(), dec!(1.5));
        assert!(!parsed.is_defaulted());
        assert_eq!(defaulted.value(), Decimal::ZERO);
        assert!(defaulted.is_defaulted());
        assert!(!defaulted.is_blank());
        assert!(Coerced::defaulted(" ", Decimal::ZERO).is_blank());
        assert!(!parsed.is_blank());
    }

    #[test]
    fn last_result_is_case_insensitive() {
        assert_eq!(LastResult::from_cell(" failed "), LastResult::Failed);
        assert_eq!(LastResult::from_cell("Warning"), LastResult::Warning);
        assert_eq!(
            LastResult::from_cell("None"),
            LastResult::Unknown("None".to_string())
        );
    }

    #[test]
    fn severity_orders_by_strictness() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert_eq!("critical".parse::<Severity>(), Ok(Severity::Critical));
    }

    #[test]
    fn anomaly_serializes_type_field() {
        let anomaly = Anomaly {
            report_date: NaiveDate::from_ymd_opt(2026, 1, 28).expect("date"),
            severity: Severity::High,
            kind: AnomalyKind::FailedJobs,
            subject: "ABC".to_string(),
            metric: AnomalyKind::FailedJobs.metric().to_string(),
            current_value: dec!(3),
            description: "Site ABC has 3 failed backup jobs".to_string(),
        };
        let json = serde_json::to_value(&anomaly).expect("json");
        assert_eq!(json["type"], "failed_jobs");
        assert_eq!(json["severity"], "HIGH");
    }
}
