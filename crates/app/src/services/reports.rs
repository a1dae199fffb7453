use audit_db::{Db, PipelineRun};
use chrono::NaiveDate;
use reconcile::ReconciliationOutput;

use crate::error::{AppError, Result};
use crate::services::{SharedConfig, open_db};

#[derive(Clone)]
pub struct ReportsService {
    config: SharedConfig,
}

impl ReportsService {
    pub(super) fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    fn db(&self) -> Result<Db> {
        open_db(&self.config)
    }

    pub fn dates(&self) -> Result<Vec<NaiveDate>> {
        Ok(self.db()?.report_dates()?)
    }

    /// Stored report for `report_date`, or the newest stored report when `None`.
    pub fn report(&self, report_date: Option<NaiveDate>) -> Result<ReconciliationOutput> {
        let db = self.db()?;
        let date = match report_date {
            Some(date) => date,
            None => db
                .report_dates()?
                .into_iter()
                .next()
                .ok_or_else(|| AppError::NotFound("no stored reports".to_string()))?,
        };
        db.load_report(date)?
            .ok_or_else(|| AppError::NotFound(format!("no report stored for {}", date)))
    }

    pub fn recent_runs(&self, limit: usize) -> Result<Vec<PipelineRun>> {
        Ok(self.db()?.list_runs(limit)?)
    }
}
