use std::path::PathBuf;

use audit_db::{Db, NewRun, RunStatus};
use chrono::{DateTime, NaiveDate, Utc};
use ingest::{LoadStats, load_report_inputs, resolve_audit_dir, resolve_utilization_file};
use reconcile::ReconciliationOutput;

use crate::error::Result;
use crate::services::{SharedConfig, open_db};

/// Outcome of one successful reconciliation run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: i64,
    pub report_date: NaiveDate,
    pub audit_dir: PathBuf,
    pub utilization_file: PathBuf,
    pub output: ReconciliationOutput,
    pub stats: LoadStats,
    pub fingerprint: String,
    /// Setting keys from the DB that overrode the configured values.
    pub overrides: Vec<String>,
    pub rows_written: usize,
    /// True when the date was already stored with an identical result.
    pub unchanged: bool,
}

struct Executed {
    report_date: NaiveDate,
    audit_dir: PathBuf,
    utilization_file: PathBuf,
    output: ReconciliationOutput,
    stats: LoadStats,
    fingerprint: String,
    overrides: Vec<String>,
    rows_written: usize,
    unchanged: bool,
}

#[derive(Clone)]
pub struct ReconcileService {
    config: SharedConfig,
}

impl ReconcileService {
    pub(super) fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    fn db(&self) -> Result<Db> {
        open_db(&self.config)
    }

    /// Loads, reconciles and stores one report date; the newest data folder when `None`.
    /// Every attempt is logged in the run table, failures included.
    pub fn run_for_date(&self, report_date: Option<NaiveDate>) -> Result<RunReport> {
        let started_at = Utc::now();
        let mut db = self.db()?;
        match self.execute(&mut db, report_date) {
            Ok(executed) => {
                let run_id = db.record_run(&NewRun {
                    started_at,
                    completed_at: Utc::now(),
                    report_date: Some(executed.report_date),
                    status: RunStatus::Success,
                    fingerprint: Some(executed.fingerprint.clone()),
                    issue_count: executed.stats.issues.len() as u64,
                    message: None,
                })?;
                Ok(RunReport {
                    run_id,
                    report_date: executed.report_date,
                    audit_dir: executed.audit_dir,
                    utilization_file: executed.utilization_file,
                    output: executed.output,
                    stats: executed.stats,
                    fingerprint: executed.fingerprint,
                    overrides: executed.overrides,
                    rows_written: executed.rows_written,
                    unchanged: executed.unchanged,
                })
            }
            Err(err) => {
                tracing::error!(error = %err, "reconciliation run failed");
                record_failure(&db, started_at, report_date, &err.to_string());
                Err(err)
            }
        }
    }

    fn execute(&self, db: &mut Db, requested: Option<NaiveDate>) -> Result<Executed> {
        let (audit_dir, report_date) = resolve_audit_dir(&self.config.audit_base_dir, requested)?;
        let utilization_file = resolve_utilization_file(&self.config.utilization_dir, report_date)?;
        tracing::info!(
            date = %report_date,
            audit_dir = %audit_dir.display(),
            utilization = %utilization_file.display(),
            "starting reconciliation"
        );

        let mut reconcile_config = self.config.reconcile.clone();
        let overrides = db.apply_config_overrides(&mut reconcile_config)?;
        if !overrides.is_empty() {
            tracing::debug!(keys = ?overrides, "applied stored setting overrides");
        }

        let inputs = load_report_inputs(
            report_date,
            &audit_dir,
            &utilization_file,
            &reconcile_config.bucket_marker,
        )?;
        let output = reconcile::run(report_date, &inputs.jobs, &inputs.buckets, &reconcile_config);
        let fingerprint = output.fingerprint()?;

        let previous = match db.load_report(report_date)? {
            Some(stored) => Some(stored.fingerprint()?),
            None => None,
        };
        let unchanged = previous.as_deref() == Some(fingerprint.as_str());
        let rows_written = if unchanged {
            tracing::info!(date = %report_date, "stored report unchanged, skipping rewrite");
            0
        } else {
            db.replace_report(&output)?
        };

        Ok(Executed {
            report_date,
            audit_dir,
            utilization_file,
            output,
            stats: inputs.stats,
            fingerprint,
            overrides,
            rows_written,
            unchanged,
        })
    }
}

fn record_failure(
    db: &Db,
    started_at: DateTime<Utc>,
    report_date: Option<NaiveDate>,
    message: &str,
) {
    let run = NewRun {
        started_at,
        completed_at: Utc::now(),
        report_date,
        status: RunStatus::Failed,
        fingerprint: None,
        issue_count: 0,
        message: Some(message.to_string()),
    };
    if let Err(err) = db.record_run(&run) {
        tracing::warn!(error = %err, "failed to record failed run");
    }
}
