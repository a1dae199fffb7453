use std::fmt::Write;
use std::time::Instant;

use audit_core::{
    Anomaly, BackupJobRecord, BdrMetric, BucketMetric, BucketUtilizationRecord, DailySummary,
    ReconcileConfig, SiteMetric,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::aggregate::aggregate;
use crate::anomaly::detect;

/// Everything one reconciliation produces for a report date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationOutput {
    pub summary: DailySummary,
    pub sites: Vec<SiteMetric>,
    pub bdr: Vec<BdrMetric>,
    pub buckets: Vec<BucketMetric>,
    pub anomalies: Vec<Anomaly>,
}

impl ReconciliationOutput {
    pub fn report_date(&self) -> NaiveDate {
        self.summary.report_date
    }

    /// SHA-256 over the JSON form; equal outputs share a fingerprint.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        let bytes = serde_json::to_vec(self)?;
        Ok(hex_digest(&Sha256::digest(&bytes)))
    }
}

fn hex_digest(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(&mut out, "{:02x}", byte);
    }
    out
}

pub fn run(
    report_date: NaiveDate,
    jobs: &[BackupJobRecord],
    buckets: &[BucketUtilizationRecord],
    config: &ReconcileConfig,
) -> ReconciliationOutput {
    let start = Instant::now();
    let aggregates = aggregate(report_date, jobs, buckets, config);
    let anomalies = detect(
        report_date,
        &aggregates.bdr,
        &aggregates.sites,
        &config.thresholds,
    );

    tracing::info!(
        date = %report_date,
        sites = aggregates.sites.len(),
        servers = aggregates.bdr.len(),
        buckets = aggregates.buckets.len(),
        anomalies = anomalies.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "reconciliation complete"
    );

    ReconciliationOutput {
        summary: aggregates.summary,
        sites: aggregates.sites,
        bdr: aggregates.bdr,
        buckets: aggregates.buckets,
        anomalies,
    }
}
