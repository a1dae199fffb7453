#![allow(dead_code)]

use std::path::PathBuf;

use audit_core::{
    BackupJobRecord, BucketUtilizationRecord, Coerced, LastResult, ReconcileConfig,
    site_code_from_bucket, site_code_from_server,
};
use audit_db::Db;
use chrono::NaiveDate;
use reconcile::ReconciliationOutput;
use rust_decimal::Decimal;
use tempfile::TempDir;

pub struct TestDb {
    pub _dir: TempDir,
    pub db: Db,
    pub path: PathBuf,
}

pub fn setup_db() -> TestDb {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("test.sqlite");
    let mut db = Db::open(&path).expect("open db");
    db.migrate().expect("migrate db");
    TestDb {
        _dir: dir,
        db,
        path,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("date")
}

pub fn make_job(server: &str, size_gb: Decimal, free_gb: Decimal, result: LastResult) -> BackupJobRecord {
    BackupJobRecord {
        server_id: server.to_string(),
        site_code: site_code_from_server(server),
        job_name: Some("Nightly".to_string()),
        backup_size_gb: Coerced::parsed(size_gb),
        disk_free_gb: Coerced::parsed(free_gb),
        success_rate: None,
        last_result: Some(result),
        backup_mode: Some("Forward Incremental".to_string()),
        schedule: Some("Daily".to_string()),
    }
}

pub fn make_bucket(name: &str, active: Decimal, deleted: Decimal) -> BucketUtilizationRecord {
    BucketUtilizationRecord {
        bucket_name: name.to_string(),
        site_code: site_code_from_bucket(name),
        active_tb: Coerced::parsed(active),
        deleted_tb: Coerced::parsed(deleted),
    }
}

/// Two sites, one low-disk server and one failing site.
pub fn sample_output(report_date: NaiveDate) -> ReconciliationOutput {
    let jobs = vec![
        make_job("ABC-BDR01", Decimal::from(10240), Decimal::from(1024), LastResult::Success),
        make_job("DEF-BDR01", Decimal::from(2048), Decimal::from(2048), LastResult::Failed),
        make_job("DEF-BDR01", Decimal::from(2048), Decimal::from(2048), LastResult::Failed),
        make_job("DEF-BDR01", Decimal::from(2048), Decimal::from(2048), LastResult::Failed),
    ];
    let buckets = vec![
        make_bucket("abc-veeam-prod", Decimal::new(50, 1), Decimal::new(10, 1)),
        make_bucket("def-veeam", Decimal::new(15, 1), Decimal::new(125, 2)),
    ];
    reconcile::run(report_date, &jobs, &buckets, &ReconcileConfig::default())
}
