use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown run status: {other}")),
        }
    }
}

/// A pipeline run about to be logged.
#[derive(Debug, Clone)]
pub struct NewRun {
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub report_date: Option<NaiveDate>,
    pub status: RunStatus,
    pub fingerprint: Option<String>,
    pub issue_count: u64,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRun {
    pub id: i64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub report_date: Option<NaiveDate>,
    pub status: RunStatus,
    pub fingerprint: Option<String>,
    pub issue_count: u64,
    pub message: Option<String>,
}
