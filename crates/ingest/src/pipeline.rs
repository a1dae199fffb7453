use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Instant;

use audit_core::{BackupJobRecord, BucketUtilizationRecord, resolve_server_site, server_id_from_filename};
use chrono::NaiveDate;
use walkdir::WalkDir;

use crate::parser::{bucket_records_from_reader, job_records_from_reader};
use crate::paths::is_audit_file;
use crate::types::{BucketLoad, IngestError, IngestIssue, JobLoad, LoadStats, ReportInputs, Result};

fn issue(stats: &mut LoadStats, file_path: &str, message: String) {
    tracing::warn!(file = file_path, "{}", message);
    stats.issues.push(IngestIssue {
        file_path: file_path.to_string(),
        message,
    });
}

fn defaulted_job_fields(record: &BackupJobRecord) -> usize {
    [
        record.backup_size_gb.is_defaulted(),
        record.disk_free_gb.is_defaulted(),
        record
            .success_rate
            .as_ref()
            .is_some_and(|rate| rate.is_defaulted()),
    ]
    .into_iter()
    .filter(|defaulted| *defaulted)
    .count()
}

fn defaulted_bucket_fields(record: &BucketUtilizationRecord) -> usize {
    usize::from(record.active_tb.is_defaulted()) + usize::from(record.deleted_tb.is_defaulted())
}

fn parse_audit_file(path: &Path, server_id: &str) -> Result<Vec<BackupJobRecord>> {
    let file = File::open(path)?;
    job_records_from_reader(BufReader::new(file), server_id)
}

/// Reads every audit export directly under `audit_dir`. Unreadable files are skipped.
pub fn load_job_records(audit_dir: &Path) -> JobLoad {
    let start = Instant::now();
    let mut load = JobLoad::default();
    let stats = &mut load.stats;

    let mut paths = Vec::new();
    for entry in WalkDir::new(audit_dir).min_depth(1).max_depth(1).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let file_path = err
                    .path()
                    .map(|path| path.to_string_lossy().to_string())
                    .unwrap_or_else(|| audit_dir.to_string_lossy().to_string());
                issue(stats, &file_path, err.to_string());
                continue;
            }
        };
        if entry.file_type().is_file() && is_audit_file(entry.path()) {
            paths.push(entry.into_path());
        }
    }
    paths.sort();

    for path in paths {
        stats.files_scanned += 1;
        let file_path = path.to_string_lossy().to_string();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let server_id = server_id_from_filename(&file_name);
        let resolution = resolve_server_site(&server_id);
        if resolution.is_fallback() {
            tracing::debug!(
                server = %server_id,
                site = %resolution.site_code,
                "site code resolved by prefix fallback"
            );
            stats.fallback_sites.push(server_id.clone());
        }

        match parse_audit_file(&path, &server_id) {
            Ok(records) => {
                stats.job_rows += records.len();
                stats.defaulted_fields += records.iter().map(defaulted_job_fields).sum::<usize>();
                load.records.extend(records);
            }
            Err(err) => {
                stats.files_skipped += 1;
                issue(stats, &file_path, err.to_string());
            }
        }
    }

    tracing::debug!(
        dir = %audit_dir.display(),
        files = load.stats.files_scanned,
        skipped = load.stats.files_skipped,
        rows = load.stats.job_rows,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "loaded audit exports"
    );
    load
}

/// Reads one utilization export. A file that cannot be read yields no records and an issue.
pub fn load_bucket_records(path: &Path, marker: &str) -> BucketLoad {
    let mut load = BucketLoad::default();
    let file_path = path.to_string_lossy().to_string();
    load.stats.files_scanned = 1;

    let parsed = File::open(path)
        .map_err(IngestError::from)
        .and_then(|file| bucket_records_from_reader(BufReader::new(file), marker));
    match parsed {
        Ok(parsed) => {
            load.stats.bucket_rows = parsed.records.len();
            load.stats.buckets_filtered_out = parsed.filtered_out;
            load.stats.defaulted_fields =
                parsed.records.iter().map(defaulted_bucket_fields).sum();
            for bucket in parsed.duplicates {
                issue(
                    &mut load.stats,
                    &file_path,
                    format!("duplicate bucket row ignored: {}", bucket),
                );
            }
            load.records = parsed.records;
        }
        Err(err) => {
            load.stats.files_skipped = 1;
            issue(&mut load.stats, &file_path, err.to_string());
        }
    }
    load
}

/// Loads both datasets for `report_date`. Fails only when either side has no usable rows.
pub fn load_report_inputs(
    report_date: NaiveDate,
    audit_dir: &Path,
    utilization_file: &Path,
    bucket_marker: &str,
) -> Result<ReportInputs> {
    let jobs = load_job_records(audit_dir);
    let buckets = load_bucket_records(utilization_file, bucket_marker);

    if jobs.records.is_empty() {
        return Err(IngestError::NoData(format!(
            "no backup job records in {}",
            audit_dir.display()
        )));
    }
    if buckets.records.is_empty() {
        return Err(IngestError::NoData(format!(
            "no bucket records matching {:?} in {}",
            bucket_marker,
            utilization_file.display()
        )));
    }

    let mut stats = jobs.stats;
    stats.merge(buckets.stats);
    Ok(ReportInputs {
        report_date,
        jobs: jobs.records,
        buckets: buckets.records,
        stats,
    })
}
