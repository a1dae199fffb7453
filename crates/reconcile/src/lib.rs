mod aggregate;
mod anomaly;
mod classify;
mod run;

pub use aggregate::{
    Aggregates, aggregate, bdr_metrics, bucket_metrics, daily_summary, discrepancy_pct,
    site_metrics,
};
pub use anomaly::{detect, discrepancy_severity, failed_jobs_severity, low_disk_severity};
pub use classify::{Outcome, TierMatch, classify_mode, classify_outcome, classify_tier, job_counts};
pub use run::{ReconciliationOutput, run};
