use audit_app::{RunReport, SettingsSnapshot};
use audit_db::PipelineRun;
use reconcile::ReconciliationOutput;

const RULE: &str = "============================================================";

pub fn print_run(report: &RunReport) {
    println!("{RULE}");
    println!("Backup audit reconciliation");
    println!("{RULE}");
    println!("  Data folder: {}", report.audit_dir.display());
    println!("  Report date: {}", report.report_date);
    println!("  Utilization file: {}", report.utilization_file.display());

    let stats = &report.stats;
    println!("\nLoading data...");
    println!(
        "  Loaded {} job rows ({} files scanned, {} skipped)",
        stats.job_rows, stats.files_scanned, stats.files_skipped
    );
    println!(
        "  Loaded {} bucket rows ({} filtered out)",
        stats.bucket_rows, stats.buckets_filtered_out
    );
    if stats.defaulted_fields > 0 {
        println!("  Defaulted {} unreadable numeric fields", stats.defaulted_fields);
    }
    for issue in &stats.issues {
        println!("  WARN: {}: {}", issue.file_path, issue.message);
    }
    if !report.overrides.is_empty() {
        println!("  Stored overrides: {}", report.overrides.join(", "));
    }

    println!("\nComputing metrics...");
    print_totals(&report.output);

    println!("\nStored {} rows (run #{})", report.rows_written, report.run_id);
    if report.unchanged {
        println!("  Report unchanged since the last run ({})", short(&report.fingerprint));
    } else {
        println!("  Fingerprint: {}", short(&report.fingerprint));
    }
}

pub fn print_report(output: &ReconciliationOutput) {
    println!("Report {}", output.report_date());
    print_totals(output);

    if !output.sites.is_empty() {
        println!("\nSites:");
        for site in &output.sites {
            println!(
                "  {:<6} veeam {:>10.2} TB  wasabi {:>10.2} TB  discrepancy {:>7.2}%  jobs {:>4} ({} failed)",
                site.site_code,
                site.veeam_tb,
                site.wasabi_active_tb,
                site.discrepancy_pct,
                site.jobs.total_jobs,
                site.jobs.failed_jobs
            );
        }
    }

    if !output.anomalies.is_empty() {
        println!("\nAnomalies:");
        let mut anomalies: Vec<_> = output.anomalies.iter().collect();
        anomalies.sort_by(|a, b| b.severity.cmp(&a.severity));
        for anomaly in anomalies {
            println!("  [{}] {}", anomaly.severity, anomaly.description);
        }
    }
}

pub fn print_runs(runs: &[PipelineRun]) {
    if runs.is_empty() {
        return;
    }
    println!("\nRecent runs:");
    for run in runs {
        let date = run
            .report_date
            .map(|date| date.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  #{} {} {} {} issues={}{}",
            run.id,
            run.started_at.format("%Y-%m-%d %H:%M:%S"),
            date,
            run.status,
            run.issue_count,
            run.message
                .as_deref()
                .map(|message| format!(" ({message})"))
                .unwrap_or_default()
        );
    }
}

pub fn print_settings(snapshot: &SettingsSnapshot) {
    let config = &snapshot.effective;
    println!("Effective settings:");
    println!("  wasabi_cost_per_tb        {}", config.pricing.cost_per_tb);
    println!("  sales_tax_rate            {}", config.pricing.tax_rate);
    println!("  low_disk_threshold_pct    {}", config.thresholds.low_disk_pct);
    println!("  discrepancy_threshold_pct {}", config.thresholds.discrepancy_pct);
    println!("  deleted_ratio_threshold   {}", config.thresholds.deleted_ratio);
    println!("  bucket_marker             {}", config.bucket_marker);
    if snapshot.overrides.is_empty() {
        println!("\nNo stored overrides.");
        return;
    }
    println!("\nStored overrides:");
    for (key, value) in &snapshot.overrides {
        println!("  {key} = {value}");
    }
}

fn print_totals(output: &ReconciliationOutput) {
    let summary = &output.summary;
    println!("  Sites: {}", output.sites.len());
    println!("  BDR servers: {}", output.bdr.len());
    println!("  Buckets: {}", output.buckets.len());
    println!("  Anomalies: {}", output.anomalies.len());
    println!("  Total Veeam: {:.2} TB", summary.veeam_tb);
    println!("  Total Wasabi Active: {:.2} TB", summary.wasabi_active_tb);
    println!("  Discrepancy: {:.2}%", summary.discrepancy_pct);
    println!("  Total Cost: ${:.2}", summary.total_cost);
    println!(
        "  Jobs: {} total, {} ok, {} warning, {} failed",
        summary.total_jobs, summary.successful_jobs, summary.warning_jobs, summary.failed_jobs
    );
}

fn short(fingerprint: &str) -> &str {
    fingerprint.get(..12).unwrap_or(fingerprint)
}
