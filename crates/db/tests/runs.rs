mod support;

use audit_db::{Db, NewRun, RunStatus};
use chrono::{Duration, TimeZone, Utc};
use support::{date, setup_db};

#[test]
fn runs_listed_newest_first() {
    let test_db = setup_db();
    let started = Utc.with_ymd_and_hms(2026, 1, 28, 6, 0, 0).single().expect("ts");
    let first = NewRun {
        started_at: started,
        completed_at: started + Duration::seconds(3),
        report_date: Some(date(2026, 1, 28)),
        status: RunStatus::Success,
        fingerprint: Some("abc123".to_string()),
        issue_count: 2,
        message: None,
    };
    let failed = NewRun {
        started_at: started + Duration::minutes(5),
        completed_at: started + Duration::minutes(5),
        report_date: None,
        status: RunStatus::Failed,
        fingerprint: None,
        issue_count: 0,
        message: Some("no backup job records".to_string()),
    };
    let first_id = test_db.db.record_run(&first).expect("record first");
    let failed_id = test_db.db.record_run(&failed).expect("record failed");
    assert!(failed_id > first_id);

    let runs = test_db.db.list_runs(10).expect("runs");
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].status, RunStatus::Failed);
    assert_eq!(runs[0].report_date, None);
    assert_eq!(runs[0].message.as_deref(), Some("no backup job records"));
    assert_eq!(runs[1].fingerprint.as_deref(), Some("abc123"));
    assert_eq!(runs[1].issue_count, 2);
    assert_eq!(runs[1].started_at, started);
    assert_eq!(runs[1].report_date, Some(date(2026, 1, 28)));

    assert_eq!(test_db.db.list_runs(1).expect("limited").len(), 1);
}

#[test]
fn migrate_is_repeatable_and_creates_tables() {
    let test_db = setup_db();
    let mut db = Db::open(&test_db.path).expect("reopen");
    db.migrate().expect("migrate again");
    let tables = db.table_names().expect("tables");
    for table in [
        "anomaly",
        "app_setting",
        "bdr_metric",
        "bucket_metric",
        "daily_summary",
        "pipeline_run",
        "site_metric",
    ] {
        assert!(tables.iter().any(|name| name == table), "missing {table}");
    }
}
