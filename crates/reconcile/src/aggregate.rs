use std::collections::BTreeMap;

use audit_core::{
    BackupJobRecord, BdrMetric, BucketMetric, BucketUtilizationRecord, DailySummary, JobCounts,
    Pricing, ReconcileConfig, SiteMetric, Thresholds, TierFallback, gb_to_tb, pct_of, round_money,
    round_pct, round_tb, saturating_sum,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::classify::job_counts;

#[derive(Debug, Clone)]
pub struct Aggregates {
    pub bdr: Vec<BdrMetric>,
    pub buckets: Vec<BucketMetric>,
    pub sites: Vec<SiteMetric>,
    pub summary: DailySummary,
}

/// `(backup - billed) / backup * 100`, zero when nothing was backed up.
pub fn discrepancy_pct(veeam_tb: Decimal, billed_tb: Decimal) -> Decimal {
    round_pct(pct_of(veeam_tb.saturating_sub(billed_tb), veeam_tb))
}

/// First non-blank size cells seen for one server.
struct ServerDisk<'a> {
    first: &'a BackupJobRecord,
    backup_size_gb: Option<Decimal>,
    disk_free_gb: Option<Decimal>,
}

impl<'a> ServerDisk<'a> {
    fn new(first: &'a BackupJobRecord) -> Self {
        Self {
            first,
            backup_size_gb: None,
            disk_free_gb: None,
        }
    }

    fn observe(&mut self, job: &BackupJobRecord) {
        if self.backup_size_gb.is_none() && !job.backup_size_gb.is_blank() {
            self.backup_size_gb = Some(job.backup_size_gb.value());
        }
        if self.disk_free_gb.is_none() && !job.disk_free_gb.is_blank() {
            self.disk_free_gb = Some(job.disk_free_gb.value());
        }
    }
}

/// One metric per (site, server). Every row of a server repeats its disk state, so each size
/// column takes its first non-blank cell; a column blank on every row falls back to zero.
pub fn bdr_metrics(report_date: NaiveDate, jobs: &[BackupJobRecord]) -> Vec<BdrMetric> {
    let mut servers: BTreeMap<(&str, &str), ServerDisk> = BTreeMap::new();
    for job in jobs {
        servers
            .entry((job.site_code.as_str(), job.server_id.as_str()))
            .or_insert_with(|| ServerDisk::new(job))
            .observe(job);
    }

    servers
        .into_values()
        .map(|disk| {
            let backup_size_tb = gb_to_tb(
                disk.backup_size_gb
                    .unwrap_or_else(|| disk.first.backup_size_gb.value()),
            );
            let disk_free_tb =
                gb_to_tb(disk.disk_free_gb.unwrap_or_else(|| disk.first.disk_free_gb.value()));
            BdrMetric {
                report_date,
                server_id: disk.first.server_id.clone(),
                site_code: disk.first.site_code.clone(),
                backup_size_tb,
                disk_free_tb,
                disk_free_pct: round_pct(pct_of(
                    disk_free_tb,
                    backup_size_tb.saturating_add(disk_free_tb),
                )),
            }
        })
        .collect()
}

fn unique_buckets(buckets: &[BucketUtilizationRecord]) -> BTreeMap<&str, &BucketUtilizationRecord> {
    let mut unique = BTreeMap::new();
    for bucket in buckets {
        unique.entry(bucket.bucket_name.as_str()).or_insert(bucket);
    }
    unique
}

pub fn bucket_metrics(
    report_date: NaiveDate,
    buckets: &[BucketUtilizationRecord],
    pricing: &Pricing,
) -> Vec<BucketMetric> {
    unique_buckets(buckets)
        .into_values()
        .map(|bucket| {
            let active_tb = bucket.active_tb.value();
            let deleted_tb = bucket.deleted_tb.value();
            let active_cost = round_money(active_tb.saturating_mul(pricing.cost_per_tb));
            let deleted_cost = round_money(deleted_tb.saturating_mul(pricing.cost_per_tb));
            BucketMetric {
                report_date,
                bucket_name: bucket.bucket_name.clone(),
                site_code: bucket.site_code.clone(),
                active_tb: round_tb(active_tb),
                deleted_tb: round_tb(deleted_tb),
                active_cost,
                deleted_cost,
                total_cost: round_money(
                    active_cost
                        .saturating_add(deleted_cost)
                        .saturating_mul(pricing.tax_multiplier()),
                ),
            }
        })
        .collect()
}

#[derive(Default)]
struct SiteInputs<'a> {
    jobs: Vec<&'a BackupJobRecord>,
    veeam_tb: Decimal,
    active_tb: Decimal,
    deleted_tb: Decimal,
}

/// Rolls jobs, servers and buckets up per site over the union of job and bucket sites.
pub fn site_metrics(
    report_date: NaiveDate,
    jobs: &[BackupJobRecord],
    buckets: &[BucketUtilizationRecord],
    bdr: &[BdrMetric],
    tier_fallback: TierFallback,
) -> Vec<SiteMetric> {
    let mut sites: BTreeMap<&str, SiteInputs> = BTreeMap::new();
    for job in jobs {
        sites.entry(job.site_code.as_str()).or_default().jobs.push(job);
    }
    for server in bdr {
        let site = sites.entry(server.site_code.as_str()).or_default();
        site.veeam_tb = site.veeam_tb.saturating_add(server.backup_size_tb);
    }
    for bucket in unique_buckets(buckets).into_values() {
        let site = sites.entry(bucket.site_code.as_str()).or_default();
        site.active_tb = site.active_tb.saturating_add(bucket.active_tb.value());
        site.deleted_tb = site.deleted_tb.saturating_add(bucket.deleted_tb.value());
    }

    sites
        .into_iter()
        .map(|(site_code, inputs)| {
            let counts = job_counts(inputs.jobs.iter().copied(), tier_fallback);
            let success_rate_pct = round_pct(pct_of(
                Decimal::from(counts.success_jobs),
                Decimal::from(counts.total_jobs),
            ));
            SiteMetric {
                report_date,
                site_code: site_code.to_string(),
                veeam_tb: round_tb(inputs.veeam_tb),
                wasabi_active_tb: round_tb(inputs.active_tb),
                wasabi_deleted_tb: round_tb(inputs.deleted_tb),
                discrepancy_pct: discrepancy_pct(inputs.veeam_tb, inputs.active_tb),
                success_rate_pct,
                jobs: counts,
            }
        })
        .collect()
}

pub fn daily_summary(
    report_date: NaiveDate,
    sites: &[SiteMetric],
    bdr: &[BdrMetric],
    buckets: &[BucketMetric],
    pricing: &Pricing,
    thresholds: &Thresholds,
) -> DailySummary {
    let veeam_tb = round_tb(saturating_sum(sites.iter().map(|site| site.veeam_tb)));
    let wasabi_active_tb = round_tb(saturating_sum(sites.iter().map(|site| site.wasabi_active_tb)));
    let wasabi_deleted_tb =
        round_tb(saturating_sum(sites.iter().map(|site| site.wasabi_deleted_tb)));

    let total_cost = round_money(saturating_sum(buckets.iter().map(|bucket| bucket.total_cost)));
    let active_pre_tax = saturating_sum(buckets.iter().map(|bucket| bucket.active_cost));
    let deleted_pre_tax = saturating_sum(buckets.iter().map(|bucket| bucket.deleted_cost));

    let low_disk_count = bdr
        .iter()
        .filter(|server| server.disk_free_pct < thresholds.low_disk_pct)
        .count() as u64;
    let high_discrepancy_count = sites
        .iter()
        .filter(|site| site.discrepancy_pct.abs() > thresholds.discrepancy_pct)
        .count() as u64;
    let high_deleted_count = buckets
        .iter()
        .filter(|bucket| {
            bucket.deleted_tb > bucket.active_tb.saturating_mul(thresholds.deleted_ratio)
        })
        .count() as u64;

    let mut jobs = JobCounts::default();
    for site in sites {
        jobs.total_jobs += site.jobs.total_jobs;
        jobs.success_jobs += site.jobs.success_jobs;
        jobs.warning_jobs += site.jobs.warning_jobs;
        jobs.failed_jobs += site.jobs.failed_jobs;
    }

    DailySummary {
        report_date,
        veeam_tb,
        wasabi_active_tb,
        wasabi_deleted_tb,
        discrepancy_pct: discrepancy_pct(veeam_tb, wasabi_active_tb),
        total_cost,
        active_cost: round_money(active_pre_tax.saturating_mul(pricing.tax_multiplier())),
        deleted_cost: round_money(deleted_pre_tax.saturating_mul(pricing.tax_multiplier())),
        low_disk_count,
        high_discrepancy_count,
        high_deleted_count,
        total_jobs: jobs.total_jobs,
        successful_jobs: jobs.success_jobs,
        failed_jobs: jobs.failed_jobs,
        warning_jobs: jobs.warning_jobs,
    }
}

pub fn aggregate(
    report_date: NaiveDate,
    jobs: &[BackupJobRecord],
    buckets: &[BucketUtilizationRecord],
    config: &ReconcileConfig,
) -> Aggregates {
    let bdr = bdr_metrics(report_date, jobs);
    let bucket_rows = bucket_metrics(report_date, buckets, &config.pricing);
    let sites = site_metrics(report_date, jobs, buckets, &bdr, config.tier_fallback);
    let summary = daily_summary(
        report_date,
        &sites,
        &bdr,
        &bucket_rows,
        &config.pricing,
        &config.thresholds,
    );
    Aggregates {
        bdr,
        buckets: bucket_rows,
        sites,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audit_core::Coerced;
    use rust_decimal_macros::dec;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 28).expect("date")
    }

    fn job(server: &str, site: &str, size_gb: Decimal, free_gb: Decimal) -> BackupJobRecord {
        BackupJobRecord {
            server_id: server.to_string(),
            site_code: site.to_string(),
            job_name: None,
            backup_size_gb: Coerced::parsed(size_gb),
            disk_free_gb: Coerced::parsed(free_gb),
            success_rate: None,
            last_result: None,
            backup_mode: None,
            schedule: None,
        }
    }

    fn bucket(name: &str, site: &str, active: Decimal, deleted: Decimal) -> BucketUtilizationRecord {
        BucketUtilizationRecord {
            bucket_name: name.to_string(),
            site_code: site.to_string(),
            active_tb: Coerced::parsed(active),
            deleted_tb: Coerced::parsed(deleted),
        }
    }

    #[test]
    fn bdr_takes_first_row_per_server() {
        let jobs = vec![
            job("ABC-BDR01", "ABC", dec!(10240), dec!(1024)),
            job("ABC-BDR01", "ABC", dec!(1), dec!(1)),
            job("ABC-BDR02", "ABC", dec!(0), dec!(0)),
        ];
        let bdr = bdr_metrics(day(), &jobs);
        assert_eq!(bdr.len(), 2);
        assert_eq!(bdr[0].backup_size_tb, dec!(10));
        assert_eq!(bdr[0].disk_free_tb, dec!(1));
        assert_eq!(bdr[0].disk_free_pct, dec!(9.09));
        assert_eq!(bdr[1].disk_free_pct, Decimal::ZERO);
    }

    #[test]
    fn bdr_skips_blank_size_cells() {
        let blank = |server: &str| BackupJobRecord {
            backup_size_gb: Coerced::defaulted("", Decimal::ZERO),
            disk_free_gb: Coerced::defaulted("", Decimal::ZERO),
            ..job(server, "ABC", Decimal::ZERO, Decimal::ZERO)
        };
        let free_only = BackupJobRecord {
            backup_size_gb: Coerced::defaulted("", Decimal::ZERO),
            ..job("ABC-BDR01", "ABC", Decimal::ZERO, dec!(1024))
        };
        let jobs = vec![
            blank("ABC-BDR01"),
            free_only,
            job("ABC-BDR01", "ABC", dec!(10240), dec!(2048)),
            job("ABC-BDR01", "ABC", dec!(1), dec!(1)),
            blank("ABC-BDR02"),
            blank("ABC-BDR02"),
        ];
        let bdr = bdr_metrics(day(), &jobs);
        assert_eq!(bdr.len(), 2);
        assert_eq!(bdr[0].server_id, "ABC-BDR01");
        assert_eq!(bdr[0].backup_size_tb, dec!(10));
        assert_eq!(bdr[0].disk_free_tb, dec!(1));
        assert_eq!(bdr[0].disk_free_pct, dec!(9.09));
        assert_eq!(bdr[1].server_id, "ABC-BDR02");
        assert_eq!(bdr[1].backup_size_tb, Decimal::ZERO);
        assert_eq!(bdr[1].disk_free_pct, Decimal::ZERO);
    }

    #[test]
    fn oversized_cells_saturate_instead_of_panicking() {
        let buckets = vec![
            bucket("abc-veeam-prod", "ABC", Decimal::MAX, Decimal::MAX),
            bucket("def-veeam", "DEF", dec!(1.0), dec!(0)),
        ];
        let jobs = vec![job("ABC-BDR01", "ABC", Decimal::MAX, dec!(1024))];
        let aggregates = aggregate(day(), &jobs, &buckets, &ReconcileConfig::default());
        assert_eq!(aggregates.buckets[0].active_cost, Decimal::MAX);
        assert_eq!(aggregates.buckets[0].total_cost, Decimal::MAX);
        assert_eq!(aggregates.summary.total_cost, Decimal::MAX);
        assert_eq!(aggregates.buckets[1].total_cost, dec!(7.47));
        assert_eq!(aggregates.sites[1].site_code, "DEF");
        assert_eq!(aggregates.sites[1].wasabi_active_tb, dec!(1));
    }

    #[test]
    fn bucket_costs_round_per_bucket() {
        let rows = bucket_metrics(
            day(),
            &[bucket("abc-veeam-prod", "ABC", dec!(5.0), dec!(1.0))],
            &Pricing::default(),
        );
        assert_eq!(rows[0].active_cost, dec!(34.95));
        assert_eq!(rows[0].deleted_cost, dec!(6.99));
        assert_eq!(rows[0].total_cost, dec!(44.81));
    }

    #[test]
    fn sites_cover_union_of_jobs_and_buckets() {
        let jobs = vec![job("ABC-BDR01", "ABC", dec!(10240), dec!(1024))];
        let buckets = vec![
            bucket("abc-veeam-prod", "ABC", dec!(5.0), dec!(1.0)),
            bucket("zzz-veeam", "ZZZ", dec!(2.0), dec!(0)),
        ];
        let bdr = bdr_metrics(day(), &jobs);
        let sites = site_metrics(day(), &jobs, &buckets, &bdr, TierFallback::Gold);
        let codes: Vec<&str> = sites.iter().map(|site| site.site_code.as_str()).collect();
        assert_eq!(codes, vec!["ABC", "ZZZ"]);
        assert_eq!(sites[0].discrepancy_pct, dec!(50));
        assert_eq!(sites[0].success_rate_pct, dec!(100));
        // No backups at ZZZ, so the discrepancy is guarded to zero.
        assert_eq!(sites[1].veeam_tb, Decimal::ZERO);
        assert_eq!(sites[1].discrepancy_pct, Decimal::ZERO);
        assert_eq!(sites[1].jobs.total_jobs, 0);
        assert_eq!(sites[1].success_rate_pct, Decimal::ZERO);
    }

    #[test]
    fn summary_reapplies_tax_to_pre_tax_sums() {
        let buckets = vec![
            bucket("abc-veeam-prod", "ABC", dec!(5.0), dec!(1.0)),
            bucket("abc-veeam-dr", "ABC", dec!(1.0), dec!(0.8)),
        ];
        let config = ReconcileConfig::default();
        let aggregates = aggregate(day(), &[], &buckets, &config);
        let summary = &aggregates.summary;
        let bucket_total: Decimal = aggregates.buckets.iter().map(|row| row.total_cost).sum();
        assert_eq!(summary.total_cost, bucket_total);
        // (34.95 + 6.99) * 1.0685 = 44.81, (6.99 + 5.59) * 1.0685 = 13.44
        assert_eq!(summary.active_cost, dec!(44.81));
        assert_eq!(summary.deleted_cost, dec!(13.44));
        assert_eq!(summary.high_deleted_count, 1);
    }

    #[test]
    fn summary_counts_against_thresholds() {
        let jobs = vec![
            job("ABC-BDR01", "ABC", dec!(10240), dec!(1024)),
            job("DEF-BDR01", "DEF", dec!(1024), dec!(1024)),
        ];
        let buckets = vec![
            bucket("abc-veeam", "ABC", dec!(5.0), dec!(0)),
            bucket("def-veeam", "DEF", dec!(1.0), dec!(0)),
        ];
        let aggregates = aggregate(day(), &jobs, &buckets, &ReconcileConfig::default());
        let summary = &aggregates.summary;
        assert_eq!(summary.low_disk_count, 1);
        assert_eq!(summary.high_discrepancy_count, 1);
        assert_eq!(summary.high_deleted_count, 0);
        assert_eq!(summary.veeam_tb, dec!(11));
        assert_eq!(summary.wasabi_active_tb, dec!(6));
        assert_eq!(summary.total_jobs, 2);
        assert_eq!(summary.successful_jobs, 2);
    }
}
