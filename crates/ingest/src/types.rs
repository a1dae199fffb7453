use audit_core::{BackupJobRecord, BucketUtilizationRecord};
use chrono::NaiveDate;
use serde::Serialize;
use std::io;

/// Load summary returned after scanning one date's inputs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadStats {
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub job_rows: usize,
    pub bucket_rows: usize,
    /// Utilization rows dropped because the bucket name lacks the backup marker.
    pub buckets_filtered_out: usize,
    /// Numeric cells that could not be parsed and were replaced by a fallback.
    pub defaulted_fields: usize,
    /// Servers whose site code came from the last-resort prefix rule.
    pub fallback_sites: Vec<String>,
    pub issues: Vec<IngestIssue>,
}

impl LoadStats {
    pub fn merge(&mut self, other: LoadStats) {
        self.files_scanned += other.files_scanned;
        self.files_skipped += other.files_skipped;
        self.job_rows += other.job_rows;
        self.bucket_rows += other.bucket_rows;
        self.buckets_filtered_out += other.buckets_filtered_out;
        self.defaulted_fields += other.defaulted_fields;
        self.fallback_sites.extend(other.fallback_sites);
        self.issues.extend(other.issues);
    }
}

/// Non-fatal issues encountered during load.
#[derive(Debug, Clone, Serialize)]
pub struct IngestIssue {
    pub file_path: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct JobLoad {
    pub records: Vec<BackupJobRecord>,
    pub stats: LoadStats,
}

#[derive(Debug, Clone, Default)]
pub struct BucketLoad {
    pub records: Vec<BucketUtilizationRecord>,
    pub stats: LoadStats,
}

/// Rows kept from one utilization export.
#[derive(Debug, Clone, Default)]
pub struct ParsedBuckets {
    pub records: Vec<BucketUtilizationRecord>,
    pub rows_read: usize,
    pub filtered_out: usize,
    pub duplicates: Vec<String>,
}

/// Everything the reconciliation run needs for one reporting date.
#[derive(Debug, Clone)]
pub struct ReportInputs {
    pub report_date: NaiveDate,
    pub jobs: Vec<BackupJobRecord>,
    pub buckets: Vec<BucketUtilizationRecord>,
    pub stats: LoadStats,
}

/// Errors emitted by the loader.
#[derive(Debug)]
pub enum IngestError {
    Io(io::Error),
    Csv(csv::Error),
    MissingColumn(String),
    NotFound(String),
    NoData(String),
}

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {}", err),
            Self::Csv(err) => write!(f, "csv error: {}", err),
            Self::MissingColumn(column) => write!(f, "missing column: {}", column),
            Self::NotFound(message) => write!(f, "not found: {}", message),
            Self::NoData(message) => write!(f, "no data: {}", message),
        }
    }
}

impl std::error::Error for IngestError {}

impl From<io::Error> for IngestError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for IngestError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
