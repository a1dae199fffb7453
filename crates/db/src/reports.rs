use std::time::Instant;

use audit_core::{Anomaly, BdrMetric, BucketMetric, DailySummary, SiteMetric};
use chrono::{NaiveDate, Utc};
use reconcile::ReconciliationOutput;
use rusqlite::{OptionalExtension, params};

use crate::Db;
use crate::error::Result;
use crate::helpers::{
    date_at, date_text, row_to_anomaly, row_to_bdr_metric, row_to_bucket_metric, row_to_site_metric,
    row_to_summary, timestamp_text,
};

const REPORT_TABLES: &[&str] = &["site_metric", "bdr_metric", "bucket_metric", "anomaly"];

impl Db {
    /// Replaces everything stored for the output's report date in one transaction.
    ///
    /// The summary is upserted; the per-site, per-server, per-bucket and anomaly rows
    /// for the date are deleted and rewritten.
    pub fn replace_report(&mut self, output: &ReconciliationOutput) -> Result<usize> {
        let start = Instant::now();
        let date = date_text(output.report_date());
        let summary = &output.summary;
        let tx = self.conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO daily_summary (
              report_date, veeam_tb, wasabi_active_tb, wasabi_deleted_tb, discrepancy_pct,
              total_cost, active_cost, deleted_cost, low_disk_count, high_discrepancy_count,
              high_deleted_count, total_jobs, successful_jobs, failed_jobs, warning_jobs, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            ON CONFLICT(report_date) DO UPDATE SET
              veeam_tb = excluded.veeam_tb,
              wasabi_active_tb = excluded.wasabi_active_tb,
              wasabi_deleted_tb = excluded.wasabi_deleted_tb,
              discrepancy_pct = excluded.discrepancy_pct,
              total_cost = excluded.total_cost,
              active_cost = excluded.active_cost,
              deleted_cost = excluded.deleted_cost,
              low_disk_count = excluded.low_disk_count,
              high_discrepancy_count = excluded.high_discrepancy_count,
              high_deleted_count = excluded.high_deleted_count,
              total_jobs = excluded.total_jobs,
              successful_jobs = excluded.successful_jobs,
              failed_jobs = excluded.failed_jobs,
              warning_jobs = excluded.warning_jobs,
              updated_at = excluded.updated_at
            "#,
            params![
                date,
                summary.veeam_tb.to_string(),
                summary.wasabi_active_tb.to_string(),
                summary.wasabi_deleted_tb.to_string(),
                summary.discrepancy_pct.to_string(),
                summary.total_cost.to_string(),
                summary.active_cost.to_string(),
                summary.deleted_cost.to_string(),
                summary.low_disk_count as i64,
                summary.high_discrepancy_count as i64,
                summary.high_deleted_count as i64,
                summary.total_jobs as i64,
                summary.successful_jobs as i64,
                summary.failed_jobs as i64,
                summary.warning_jobs as i64,
                timestamp_text(Utc::now()),
            ],
        )?;
        for table in REPORT_TABLES {
            tx.execute(
                &format!("DELETE FROM {} WHERE report_date = ?1", table),
                params![date],
            )?;
        }

        let mut written = 1usize;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO site_metric (
                  report_date, site_code, veeam_tb, wasabi_active_tb, wasabi_deleted_tb,
                  discrepancy_pct, success_rate_pct, total_jobs, success_jobs, warning_jobs,
                  failed_jobs, increment_jobs, reverse_increment_jobs, gold_jobs, silver_jobs,
                  bronze_jobs
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
                "#,
            )?;
            for site in &output.sites {
                let jobs = &site.jobs;
                stmt.execute(params![
                    date,
                    site.site_code,
                    site.veeam_tb.to_string(),
                    site.wasabi_active_tb.to_string(),
                    site.wasabi_deleted_tb.to_string(),
                    site.discrepancy_pct.to_string(),
                    site.success_rate_pct.to_string(),
                    jobs.total_jobs as i64,
                    jobs.success_jobs as i64,
                    jobs.warning_jobs as i64,
                    jobs.failed_jobs as i64,
                    jobs.increment_jobs as i64,
                    jobs.reverse_increment_jobs as i64,
                    jobs.gold_jobs as i64,
                    jobs.silver_jobs as i64,
                    jobs.bronze_jobs as i64,
                ])?;
                written += 1;
            }
        }
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO bdr_metric (
                  report_date, server_id, site_code, backup_size_tb, disk_free_tb, disk_free_pct
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )?;
            for server in &output.bdr {
                stmt.execute(params![
                    date,
                    server.server_id,
                    server.site_code,
                    server.backup_size_tb.to_string(),
                    server.disk_free_tb.to_string(),
                    server.disk_free_pct.to_string(),
                ])?;
                written += 1;
            }
        }
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO bucket_metric (
                  report_date, bucket_name, site_code, active_tb, deleted_tb,
                  active_cost, deleted_cost, total_cost
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )?;
            for bucket in &output.buckets {
                stmt.execute(params![
                    date,
                    bucket.bucket_name,
                    bucket.site_code,
                    bucket.active_tb.to_string(),
                    bucket.deleted_tb.to_string(),
                    bucket.active_cost.to_string(),
                    bucket.deleted_cost.to_string(),
                    bucket.total_cost.to_string(),
                ])?;
                written += 1;
            }
        }
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO anomaly (
                  report_date, severity, anomaly_type, subject, metric, current_value, description
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )?;
            for anomaly in &output.anomalies {
                stmt.execute(params![
                    date,
                    anomaly.severity.as_str(),
                    anomaly.kind.as_str(),
                    anomaly.subject,
                    anomaly.metric,
                    anomaly.current_value.to_string(),
                    anomaly.description,
                ])?;
                written += 1;
            }
        }
        tx.commit()?;

        tracing::info!(
            date = %date,
            rows = written,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "report stored"
        );
        Ok(written)
    }

    pub fn daily_summary(&self, report_date: NaiveDate) -> Result<Option<DailySummary>> {
        let summary = self
            .conn
            .query_row(
                r#"
                SELECT report_date, veeam_tb, wasabi_active_tb, wasabi_deleted_tb, discrepancy_pct,
                       total_cost, active_cost, deleted_cost, low_disk_count, high_discrepancy_count,
                       high_deleted_count, total_jobs, successful_jobs, failed_jobs, warning_jobs
                FROM daily_summary
                WHERE report_date = ?1
                "#,
                params![date_text(report_date)],
                row_to_summary,
            )
            .optional()?;
        Ok(summary)
    }

    pub fn site_metrics(&self, report_date: NaiveDate) -> Result<Vec<SiteMetric>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT report_date, site_code, veeam_tb, wasabi_active_tb, wasabi_deleted_tb,
                   discrepancy_pct, success_rate_pct, total_jobs, success_jobs, warning_jobs,
                   failed_jobs, increment_jobs, reverse_increment_jobs, gold_jobs, silver_jobs,
                   bronze_jobs
            FROM site_metric
            WHERE report_date = ?1
            ORDER BY site_code ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![date_text(report_date)], row_to_site_metric)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn bdr_metrics(&self, report_date: NaiveDate) -> Result<Vec<BdrMetric>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT report_date, server_id, site_code, backup_size_tb, disk_free_tb, disk_free_pct
            FROM bdr_metric
            WHERE report_date = ?1
            ORDER BY site_code ASC, server_id ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![date_text(report_date)], row_to_bdr_metric)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn bucket_metrics(&self, report_date: NaiveDate) -> Result<Vec<BucketMetric>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT report_date, bucket_name, site_code, active_tb, deleted_tb,
                   active_cost, deleted_cost, total_cost
            FROM bucket_metric
            WHERE report_date = ?1
            ORDER BY bucket_name ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![date_text(report_date)], row_to_bucket_metric)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Anomalies in the order they were detected.
    pub fn anomalies(&self, report_date: NaiveDate) -> Result<Vec<Anomaly>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT report_date, severity, anomaly_type, subject, metric, current_value, description
            FROM anomaly
            WHERE report_date = ?1
            ORDER BY id ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![date_text(report_date)], row_to_anomaly)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Newest first.
    pub fn report_dates(&self) -> Result<Vec<NaiveDate>> {
        let mut stmt = self
            .conn
            .prepare("SELECT report_date FROM daily_summary ORDER BY report_date DESC")?;
        let rows = stmt
            .query_map([], |row| date_at(row, 0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn load_report(&self, report_date: NaiveDate) -> Result<Option<ReconciliationOutput>> {
        let Some(summary) = self.daily_summary(report_date)? else {
            return Ok(None);
        };
        Ok(Some(ReconciliationOutput {
            summary,
            sites: self.site_metrics(report_date)?,
            bdr: self.bdr_metrics(report_date)?,
            buckets: self.bucket_metrics(report_date)?,
            anomalies: self.anomalies(report_date)?,
        }))
    }
}
