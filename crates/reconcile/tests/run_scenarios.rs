use audit_core::{
    AnomalyKind, BackupJobRecord, BucketUtilizationRecord, Coerced, LastResult, ReconcileConfig,
    Severity, TierFallback, site_code_from_bucket, site_code_from_server,
};
use chrono::NaiveDate;
use reconcile::run;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 28).expect("date")
}

fn job(server: &str, size_gb: Decimal, free_gb: Decimal) -> BackupJobRecord {
    BackupJobRecord {
        server_id: server.to_string(),
        site_code: site_code_from_server(server),
        job_name: Some("Nightly".to_string()),
        backup_size_gb: Coerced::parsed(size_gb),
        disk_free_gb: Coerced::parsed(free_gb),
        success_rate: None,
        last_result: Some(LastResult::Success),
        backup_mode: None,
        schedule: None,
    }
}

fn bucket(name: &str, active: Decimal, deleted: Decimal) -> BucketUtilizationRecord {
    BucketUtilizationRecord {
        bucket_name: name.to_string(),
        site_code: site_code_from_bucket(name),
        active_tb: Coerced::parsed(active),
        deleted_tb: Coerced::parsed(deleted),
    }
}

#[test]
fn single_server_end_to_end() {
    let jobs = vec![job("ABC-BDR01", dec!(10240), dec!(1024))];
    let buckets = vec![bucket("abc-veeam-prod", dec!(5.0), dec!(1.0))];
    let output = run(day(), &jobs, &buckets, &ReconcileConfig::default());

    let server = &output.bdr[0];
    assert_eq!(server.site_code, "ABC");
    assert_eq!(server.backup_size_tb, dec!(10.0));
    assert_eq!(server.disk_free_tb, dec!(1.0));
    assert_eq!(server.disk_free_pct, dec!(9.09));

    let row = &output.buckets[0];
    assert_eq!(row.active_cost, dec!(34.95));
    assert_eq!(row.deleted_cost, dec!(6.99));
    assert_eq!(row.total_cost, dec!(44.81));

    let site = &output.sites[0];
    assert_eq!(site.site_code, "ABC");
    assert_eq!(site.veeam_tb, dec!(10));
    assert_eq!(site.wasabi_active_tb, dec!(5));
    assert_eq!(site.discrepancy_pct, dec!(50.00));

    let low_disk: Vec<_> = output
        .anomalies
        .iter()
        .filter(|anomaly| anomaly.kind == AnomalyKind::LowDisk)
        .collect();
    assert_eq!(low_disk.len(), 1);
    assert_eq!(low_disk[0].severity, Severity::Critical);
    assert_eq!(low_disk[0].subject, "ABC-BDR01");

    let discrepancy: Vec<_> = output
        .anomalies
        .iter()
        .filter(|anomaly| anomaly.kind == AnomalyKind::HighDiscrepancy)
        .collect();
    assert_eq!(discrepancy.len(), 1);
    assert_eq!(discrepancy[0].severity, Severity::High);

    assert_eq!(output.summary.total_cost, dec!(44.81));
    assert_eq!(output.summary.low_disk_count, 1);
    assert_eq!(output.summary.high_discrepancy_count, 1);
    assert_eq!(output.report_date(), day());
}

#[test]
fn veeam_tb_is_per_server_not_per_job() {
    let jobs = vec![
        job("ABC-BDR01", dec!(2048), dec!(2048)),
        job("ABC-BDR01", dec!(2048), dec!(2048)),
        job("ABCBDR02", dec!(1024), dec!(3072)),
    ];
    let output = run(day(), &jobs, &[], &ReconcileConfig::default());
    assert_eq!(output.bdr.len(), 2);
    assert_eq!(output.sites.len(), 1);
    assert_eq!(output.sites[0].veeam_tb, dec!(3));
    assert_eq!(output.sites[0].jobs.total_jobs, 3);
}

#[test]
fn site_job_totals_sum_to_summary() {
    let mut failing = job("DEF-BDR01", dec!(1024), dec!(1024));
    failing.last_result = Some(LastResult::Failed);
    let mut warning = job("DEF-BDR01", dec!(1024), dec!(1024));
    warning.success_rate = Some(Coerced::parsed(dec!(65)));
    let jobs = vec![
        job("ABC-BDR01", dec!(1024), dec!(1024)),
        failing,
        warning,
        job("GHIJKLCORP", dec!(1024), dec!(1024)),
    ];
    let output = run(day(), &jobs, &[], &ReconcileConfig::default());

    let site_total: u64 = output.sites.iter().map(|site| site.jobs.total_jobs).sum();
    assert_eq!(site_total, output.summary.total_jobs);
    assert_eq!(output.summary.total_jobs, 4);
    assert_eq!(
        output.summary.successful_jobs + output.summary.warning_jobs + output.summary.failed_jobs,
        output.summary.total_jobs
    );
    assert_eq!(output.summary.failed_jobs, 1);
    assert_eq!(output.summary.warning_jobs, 1);
}

#[test]
fn zero_backup_site_has_zero_discrepancy() {
    let buckets = vec![bucket("xyz-veeam", dec!(3.0), dec!(0))];
    let output = run(day(), &[], &buckets, &ReconcileConfig::default());
    assert_eq!(output.sites[0].site_code, "XYZ");
    assert_eq!(output.sites[0].discrepancy_pct, Decimal::ZERO);
    assert_eq!(output.summary.discrepancy_pct, Decimal::ZERO);
    assert!(output.anomalies.is_empty());
}

#[test]
fn identical_inputs_share_fingerprint() {
    let jobs = vec![
        job("ABC-BDR01", dec!(10240), dec!(1024)),
        job("DEF-BDR01", dec!(2048), dec!(512)),
    ];
    let buckets = vec![
        bucket("def-veeam", dec!(1.5), dec!(0.2)),
        bucket("abc-veeam-prod", dec!(5.0), dec!(1.0)),
    ];
    let config = ReconcileConfig::default();
    let first = run(day(), &jobs, &buckets, &config);
    let second = run(day(), &jobs, &buckets, &config);
    assert_eq!(first, second);
    assert_eq!(
        first.fingerprint().expect("fingerprint"),
        second.fingerprint().expect("fingerprint")
    );
    assert_eq!(first.fingerprint().expect("fingerprint").len(), 64);

    let names: Vec<&str> = first.buckets.iter().map(|row| row.bucket_name.as_str()).collect();
    assert_eq!(names, vec!["abc-veeam-prod", "def-veeam"]);

    let other = run(day(), &jobs[..1], &buckets, &config);
    assert_ne!(
        first.fingerprint().expect("fingerprint"),
        other.fingerprint().expect("fingerprint")
    );
}

#[test]
fn tier_fallback_policy_is_configurable() {
    let jobs = vec![job("ABC-BDR01", dec!(1024), dec!(1024))];
    let gold = run(day(), &jobs, &[], &ReconcileConfig::default());
    assert_eq!(gold.sites[0].jobs.gold_jobs, 1);

    let config = ReconcileConfig {
        tier_fallback: TierFallback::Unclassified,
        ..ReconcileConfig::default()
    };
    let unclassified = run(day(), &jobs, &[], &config);
    assert_eq!(unclassified.sites[0].jobs.gold_jobs, 0);
}

#[test]
fn oversized_bucket_cell_does_not_abort_run() {
    let jobs = vec![job("ABC-BDR01", dec!(10240), dec!(1024))];
    let buckets = vec![bucket("abc-veeam-prod", Decimal::MAX, dec!(0))];
    let output = run(day(), &jobs, &buckets, &ReconcileConfig::default());

    assert_eq!(output.buckets[0].total_cost, Decimal::MAX);
    assert_eq!(output.summary.total_cost, Decimal::MAX);
    assert!(output.sites[0].discrepancy_pct < Decimal::ZERO);
    assert!(
        output
            .anomalies
            .iter()
            .any(|anomaly| anomaly.kind == AnomalyKind::HighDiscrepancy
                && anomaly.severity == Severity::Critical)
    );
    assert_eq!(output.fingerprint().expect("fingerprint").len(), 64);
}
