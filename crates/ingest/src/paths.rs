use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::types::{IngestError, Result};

pub const AUDIT_FILE_PREFIX: &str = "VeeamFullAudit_";
pub const AUDIT_DIR_NAME: &str = "input_veeam_audits";
pub const UTILIZATION_DIR_NAME: &str = "input_wasabi_utilization";

const UTILIZATION_MARKER: &str = "bucket-utilization";

pub fn default_data_root() -> PathBuf {
    if let Ok(path) = std::env::var("BACKUP_AUDIT_HOME") {
        return PathBuf::from(path);
    }
    PathBuf::from(".")
}

pub fn is_audit_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|value| value.to_str()) else {
        return false;
    };
    name.starts_with(AUDIT_FILE_PREFIX) && name.ends_with(".csv")
}

/// Picks `<base>/<date>` when a date is given, otherwise the newest `YYYY-MM-DD` folder.
pub fn resolve_audit_dir(base: &Path, report_date: Option<NaiveDate>) -> Result<(PathBuf, NaiveDate)> {
    if let Some(date) = report_date {
        let folder = base.join(date.format("%Y-%m-%d").to_string());
        if folder.is_dir() {
            return Ok((folder, date));
        }
        return Err(IngestError::NotFound(format!(
            "data folder {}",
            folder.display()
        )));
    }

    let mut dated = Vec::new();
    for entry in fs::read_dir(base)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if let Ok(date) = NaiveDate::parse_from_str(&name, "%Y-%m-%d") {
            dated.push((date, entry.path()));
        }
    }
    dated
        .into_iter()
        .max_by_key(|(date, _)| *date)
        .map(|(date, path)| (path, date))
        .ok_or_else(|| IngestError::NotFound(format!("date folders in {}", base.display())))
}

/// Exact `all-bucket-utilization-<date>.csv`, else the newest utilization export by name.
pub fn resolve_utilization_file(dir: &Path, report_date: NaiveDate) -> Result<PathBuf> {
    let exact = dir.join(format!(
        "all-bucket-utilization-{}.csv",
        report_date.format("%Y-%m-%d")
    ));
    if exact.is_file() {
        return Ok(exact);
    }

    let mut candidates = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|value| value.to_str()) else {
            continue;
        };
        if path.is_file() && name.contains(UTILIZATION_MARKER) && name.ends_with(".csv") {
            candidates.push(path);
        }
    }
    candidates.sort();
    candidates.pop().ok_or_else(|| {
        IngestError::NotFound(format!("utilization files in {}", dir.display()))
    })
}
