use std::collections::HashSet;
use std::io::Read;
use std::str::FromStr;

use audit_core::{
    BackupJobRecord, BucketUtilizationRecord, Coerced, LastResult, site_code_from_bucket,
    site_code_from_server,
};
use csv::{ReaderBuilder, StringRecord, Trim};
use rust_decimal::Decimal;

use crate::types::{IngestError, ParsedBuckets, Result};

const JOB_NAME: &str = "Job Name";
const BACKUP_SIZE_GB: &str = "Total Backup Size GB";
const DISK_FREE_GB: &str = "Disk Free GB";
const SUCCESS_RATE: &str = "Success Rate 24h %";
const LAST_RESULT: &str = "Last Result";
const BACKUP_MODE: &str = "Backup Mode";
const SCHEDULE: &str = "Schedule";

const BUCKET_NAME: &str = "BucketName";
const ACTIVE_TB: &str = "BillableActiveStorageTB";
const DELETED_TB: &str = "BillableDeletedStorageTB";

/// A blank or unreadable success rate counts as fully successful.
const SUCCESS_RATE_FALLBACK: Decimal = Decimal::ONE_HUNDRED;

struct AuditColumns {
    job_name: Option<usize>,
    backup_size_gb: usize,
    disk_free_gb: usize,
    success_rate: Option<usize>,
    last_result: Option<usize>,
    backup_mode: Option<usize>,
    schedule: Option<usize>,
}

impl AuditColumns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        Ok(Self {
            job_name: find_column(headers, JOB_NAME),
            backup_size_gb: require_column(headers, BACKUP_SIZE_GB)?,
            disk_free_gb: require_column(headers, DISK_FREE_GB)?,
            success_rate: find_column(headers, SUCCESS_RATE),
            last_result: find_column(headers, LAST_RESULT),
            backup_mode: find_column(headers, BACKUP_MODE),
            schedule: find_column(headers, SCHEDULE),
        })
    }
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|header| {
        header
            .trim_start_matches('\u{feff}')
            .trim()
            .eq_ignore_ascii_case(name)
    })
}

fn require_column(headers: &StringRecord, name: &str) -> Result<usize> {
    find_column(headers, name).ok_or_else(|| IngestError::MissingColumn(name.to_string()))
}

fn cell<'a>(record: &'a StringRecord, index: Option<usize>) -> Option<&'a str> {
    index.map(|index| record.get(index).unwrap_or(""))
}

fn text_cell(record: &StringRecord, index: Option<usize>) -> Option<String> {
    cell(record, index).map(|value| value.trim().to_string())
}

pub(crate) fn parse_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim().trim_end_matches('%').trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

fn coerce(raw: &str, fallback: Decimal) -> Coerced<Decimal> {
    match parse_decimal(raw) {
        Some(value) => Coerced::parsed(value),
        None => Coerced::defaulted(raw.trim(), fallback),
    }
}

fn reader_for<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader)
}

/// Parses one server's audit export. Rows inherit `server_id` and its resolved site.
pub fn job_records_from_reader<R: Read>(reader: R, server_id: &str) -> Result<Vec<BackupJobRecord>> {
    let mut rdr = reader_for(reader);
    let columns = AuditColumns::from_headers(rdr.headers()?)?;
    let site_code = site_code_from_server(server_id);
    let mut records = Vec::new();
    for row in rdr.records() {
        let row = row?;
        let success_rate =
            cell(&row, columns.success_rate).map(|raw| coerce(raw, SUCCESS_RATE_FALLBACK));
        records.push(BackupJobRecord {
            server_id: server_id.to_string(),
            site_code: site_code.clone(),
            job_name: text_cell(&row, columns.job_name).filter(|name| !name.is_empty()),
            backup_size_gb: coerce(row.get(columns.backup_size_gb).unwrap_or(""), Decimal::ZERO),
            disk_free_gb: coerce(row.get(columns.disk_free_gb).unwrap_or(""), Decimal::ZERO),
            success_rate,
            last_result: cell(&row, columns.last_result).map(LastResult::from_cell),
            backup_mode: text_cell(&row, columns.backup_mode),
            schedule: text_cell(&row, columns.schedule),
        });
    }
    Ok(records)
}

/// Parses a utilization export, keeping rows whose bucket name contains `marker`.
pub fn bucket_records_from_reader<R: Read>(reader: R, marker: &str) -> Result<ParsedBuckets> {
    let mut rdr = reader_for(reader);
    let headers = rdr.headers()?.clone();
    let name_index = require_column(&headers, BUCKET_NAME)?;
    let active_index = find_column(&headers, ACTIVE_TB);
    let deleted_index = find_column(&headers, DELETED_TB);
    let marker = marker.to_lowercase();

    let mut parsed = ParsedBuckets::default();
    let mut seen = HashSet::new();
    for row in rdr.records() {
        let row = row?;
        parsed.rows_read += 1;
        let bucket_name = row.get(name_index).unwrap_or("").trim().to_string();
        if bucket_name.is_empty() || !bucket_name.to_lowercase().contains(&marker) {
            parsed.filtered_out += 1;
            continue;
        }
        if !seen.insert(bucket_name.clone()) {
            parsed.duplicates.push(bucket_name);
            continue;
        }
        parsed.records.push(BucketUtilizationRecord {
            site_code: site_code_from_bucket(&bucket_name),
            active_tb: coerce(cell(&row, active_index).unwrap_or(""), Decimal::ZERO),
            deleted_tb: coerce(cell(&row, deleted_index).unwrap_or(""), Decimal::ZERO),
            bucket_name,
        });
    }
    Ok(parsed)
}
