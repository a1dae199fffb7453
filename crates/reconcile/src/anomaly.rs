use audit_core::{Anomaly, AnomalyKind, BdrMetric, Severity, SiteMetric, Thresholds};
use chrono::NaiveDate;
use rust_decimal::Decimal;

const DISK_CRITICAL_PCT: Decimal = Decimal::from_parts(10, 0, 0, false, 0);
const DISK_HIGH_PCT: Decimal = Decimal::from_parts(15, 0, 0, false, 0);
const DISCREPANCY_CRITICAL_PCT: Decimal = Decimal::from_parts(50, 0, 0, false, 0);
const DISCREPANCY_HIGH_PCT: Decimal = Decimal::from_parts(35, 0, 0, false, 0);
const FAILED_JOBS_CRITICAL: u64 = 5;
const FAILED_JOBS_HIGH: u64 = 3;

pub fn low_disk_severity(disk_free_pct: Decimal, thresholds: &Thresholds) -> Option<Severity> {
    if disk_free_pct < DISK_CRITICAL_PCT {
        Some(Severity::Critical)
    } else if disk_free_pct < DISK_HIGH_PCT {
        Some(Severity::High)
    } else if disk_free_pct < thresholds.low_disk_pct {
        Some(Severity::Medium)
    } else {
        None
    }
}

/// Bounds are strict, so exactly 50% lands in HIGH.
pub fn discrepancy_severity(discrepancy_pct: Decimal, thresholds: &Thresholds) -> Option<Severity> {
    let magnitude = discrepancy_pct.abs();
    if magnitude > DISCREPANCY_CRITICAL_PCT {
        Some(Severity::Critical)
    } else if magnitude > DISCREPANCY_HIGH_PCT {
        Some(Severity::High)
    } else if magnitude > thresholds.discrepancy_pct {
        Some(Severity::Medium)
    } else {
        None
    }
}

pub fn failed_jobs_severity(failed_jobs: u64) -> Option<Severity> {
    if failed_jobs >= FAILED_JOBS_CRITICAL {
        Some(Severity::Critical)
    } else if failed_jobs >= FAILED_JOBS_HIGH {
        Some(Severity::High)
    } else {
        None
    }
}

fn anomaly(
    report_date: NaiveDate,
    severity: Severity,
    kind: AnomalyKind,
    subject: &str,
    current_value: Decimal,
    description: String,
) -> Anomaly {
    Anomaly {
        report_date,
        severity,
        kind,
        subject: subject.to_string(),
        metric: kind.metric().to_string(),
        current_value,
        description,
    }
}

/// Evaluates the low disk, discrepancy and failed job rules in that order.
pub fn detect(
    report_date: NaiveDate,
    bdr: &[BdrMetric],
    sites: &[SiteMetric],
    thresholds: &Thresholds,
) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();

    for server in bdr {
        if let Some(severity) = low_disk_severity(server.disk_free_pct, thresholds) {
            anomalies.push(anomaly(
                report_date,
                severity,
                AnomalyKind::LowDisk,
                &server.server_id,
                server.disk_free_pct,
                format!(
                    "{} has only {}% disk free",
                    server.server_id, server.disk_free_pct
                ),
            ));
        }
    }

    for site in sites {
        if let Some(severity) = discrepancy_severity(site.discrepancy_pct, thresholds) {
            anomalies.push(anomaly(
                report_date,
                severity,
                AnomalyKind::HighDiscrepancy,
                &site.site_code,
                site.discrepancy_pct,
                format!(
                    "Site {} has {}% storage discrepancy",
                    site.site_code, site.discrepancy_pct
                ),
            ));
        }
    }

    for site in sites {
        let failed = site.jobs.failed_jobs;
        if let Some(severity) = failed_jobs_severity(failed) {
            anomalies.push(anomaly(
                report_date,
                severity,
                AnomalyKind::FailedJobs,
                &site.site_code,
                Decimal::from(failed),
                format!("Site {} has {} failed backup jobs", site.site_code, failed),
            ));
        }
    }

    if !anomalies.is_empty() {
        tracing::debug!(count = anomalies.len(), date = %report_date, "anomalies detected");
    }
    anomalies
}
