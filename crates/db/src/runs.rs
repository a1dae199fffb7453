use rusqlite::params;

use crate::Db;
use crate::error::Result;
use crate::helpers::{date_text, row_to_run, timestamp_text};
use crate::types::{NewRun, PipelineRun};

impl Db {
    pub fn record_run(&self, run: &NewRun) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO pipeline_run (
              started_at, completed_at, report_date, status, fingerprint, issue_count, message
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                timestamp_text(run.started_at),
                timestamp_text(run.completed_at),
                run.report_date.map(date_text),
                run.status.as_str(),
                run.fingerprint,
                run.issue_count as i64,
                run.message,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent runs first.
    pub fn list_runs(&self, limit: usize) -> Result<Vec<PipelineRun>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, started_at, completed_at, report_date, status, fingerprint, issue_count, message
            FROM pipeline_run
            ORDER BY id DESC
            LIMIT ?1
            "#,
        )?;
        let rows = stmt
            .query_map(params![limit as i64], row_to_run)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
