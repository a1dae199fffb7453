use std::str::FromStr;

use audit_core::{
    Anomaly, AnomalyKind, BdrMetric, BucketMetric, DailySummary, JobCounts, Severity, SiteMetric,
};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::Row;
use rusqlite::types::Type;
use rust_decimal::Decimal;

use crate::types::{PipelineRun, RunStatus};

const DATE_FORMAT: &str = "%Y-%m-%d";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub(crate) fn date_text(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn timestamp_text(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn conversion_error(index: usize, err: impl Into<BoxError>) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, err.into())
}

fn parse_at<T, E>(row: &Row<'_>, index: usize, parse: impl FnOnce(&str) -> Result<T, E>) -> rusqlite::Result<T>
where
    E: Into<BoxError>,
{
    let raw: String = row.get(index)?;
    parse(&raw).map_err(|err| conversion_error(index, err))
}

pub(crate) fn date_at(row: &Row<'_>, index: usize) -> rusqlite::Result<NaiveDate> {
    parse_at(row, index, |raw| NaiveDate::parse_from_str(raw, DATE_FORMAT))
}

fn optional_date_at(row: &Row<'_>, index: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(index)?;
    raw.map(|raw| NaiveDate::parse_from_str(&raw, DATE_FORMAT))
        .transpose()
        .map_err(|err| conversion_error(index, err))
}

fn timestamp_at(row: &Row<'_>, index: usize) -> rusqlite::Result<DateTime<Utc>> {
    parse_at(row, index, |raw| {
        DateTime::parse_from_rfc3339(raw).map(|ts| ts.with_timezone(&Utc))
    })
}

/// Decimals are stored as text so their scale survives a round trip.
fn decimal_at(row: &Row<'_>, index: usize) -> rusqlite::Result<Decimal> {
    parse_at(row, index, Decimal::from_str)
}

fn count_at(row: &Row<'_>, index: usize) -> rusqlite::Result<u64> {
    Ok(row.get::<_, i64>(index)?.max(0) as u64)
}

pub(crate) fn row_to_summary(row: &Row<'_>) -> rusqlite::Result<DailySummary> {
    Ok(DailySummary {
        report_date: date_at(row, 0)?,
        veeam_tb: decimal_at(row, 1)?,
        wasabi_active_tb: decimal_at(row, 2)?,
        wasabi_deleted_tb: decimal_at(row, 3)?,
        discrepancy_pct: decimal_at(row, 4)?,
        total_cost: decimal_at(row, 5)?,
        active_cost: decimal_at(row, 6)?,
        deleted_cost: decimal_at(row, 7)?,
        low_disk_count: count_at(row, 8)?,
        high_discrepancy_count: count_at(row, 9)?,
        high_deleted_count: count_at(row, 10)?,
        total_jobs: count_at(row, 11)?,
        successful_jobs: count_at(row, 12)?,
        failed_jobs: count_at(row, 13)?,
        warning_jobs: count_at(row, 14)?,
    })
}

pub(crate) fn row_to_site_metric(row: &Row<'_>) -> rusqlite::Result<SiteMetric> {
    Ok(SiteMetric {
        report_date: date_at(row, 0)?,
        site_code: row.get(1)?,
        veeam_tb: decimal_at(row, 2)?,
        wasabi_active_tb: decimal_at(row, 3)?,
        wasabi_deleted_tb: decimal_at(row, 4)?,
        discrepancy_pct: decimal_at(row, 5)?,
        success_rate_pct: decimal_at(row, 6)?,
        jobs: JobCounts {
            total_jobs: count_at(row, 7)?,
            success_jobs: count_at(row, 8)?,
            warning_jobs: count_at(row, 9)?,
            failed_jobs: count_at(row, 10)?,
            increment_jobs: count_at(row, 11)?,
            reverse_increment_jobs: count_at(row, 12)?,
            gold_jobs: count_at(row, 13)?,
            silver_jobs: count_at(row, 14)?,
            bronze_jobs: count_at(row, 15)?,
        },
    })
}

pub(crate) fn row_to_bdr_metric(row: &Row<'_>) -> rusqlite::Result<BdrMetric> {
    Ok(BdrMetric {
        report_date: date_at(row, 0)?,
        server_id: row.get(1)?,
        site_code: row.get(2)?,
        backup_size_tb: decimal_at(row, 3)?,
        disk_free_tb: decimal_at(row, 4)?,
        disk_free_pct: decimal_at(row, 5)?,
    })
}

pub(crate) fn row_to_bucket_metric(row: &Row<'_>) -> rusqlite::Result<BucketMetric> {
    Ok(BucketMetric {
        report_date: date_at(row, 0)?,
        bucket_name: row.get(1)?,
        site_code: row.get(2)?,
        active_tb: decimal_at(row, 3)?,
        deleted_tb: decimal_at(row, 4)?,
        active_cost: decimal_at(row, 5)?,
        deleted_cost: decimal_at(row, 6)?,
        total_cost: decimal_at(row, 7)?,
    })
}

pub(crate) fn row_to_anomaly(row: &Row<'_>) -> rusqlite::Result<Anomaly> {
    Ok(Anomaly {
        report_date: date_at(row, 0)?,
        severity: parse_at(row, 1, Severity::from_str)?,
        kind: parse_at(row, 2, AnomalyKind::from_str)?,
        subject: row.get(3)?,
        metric: row.get(4)?,
        current_value: decimal_at(row, 5)?,
        description: row.get(6)?,
    })
}

pub(crate) fn row_to_run(row: &Row<'_>) -> rusqlite::Result<PipelineRun> {
    Ok(PipelineRun {
        id: row.get(0)?,
        started_at: timestamp_at(row, 1)?,
        completed_at: timestamp_at(row, 2)?,
        report_date: optional_date_at(row, 3)?,
        status: parse_at(row, 4, RunStatus::from_str)?,
        fingerprint: row.get(5)?,
        issue_count: count_at(row, 6)?,
        message: row.get(7)?,
    })
}
