use audit_core::{BackupJobRecord, JobCounts, LastResult, TierFallback};
use rust_decimal::Decimal;

const FAILED_BELOW_PCT: Decimal = Decimal::from_parts(50, 0, 0, false, 0);
const WARNING_BELOW_PCT: Decimal = Decimal::from_parts(80, 0, 0, false, 0);

const GOLD_KEYWORDS: &[&str] = &["gold", "daily", "every day"];
const SILVER_KEYWORDS: &[&str] = &["silver", "weekly"];
const BRONZE_KEYWORDS: &[&str] = &["bronze", "monthly"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Warning,
    Failed,
}

/// Tier keyword sets a schedule matched; one schedule may match several.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierMatch {
    pub gold: bool,
    pub silver: bool,
    pub bronze: bool,
}

/// Success rate wins over last result; a job with neither signal succeeded.
pub fn classify_outcome(record: &BackupJobRecord) -> Outcome {
    if let Some(rate) = &record.success_rate {
        let rate = rate.value();
        return if rate < FAILED_BELOW_PCT {
            Outcome::Failed
        } else if rate < WARNING_BELOW_PCT {
            Outcome::Warning
        } else {
            Outcome::Success
        };
    }
    match &record.last_result {
        Some(LastResult::Failed) => Outcome::Failed,
        Some(LastResult::Warning) => Outcome::Warning,
        Some(LastResult::Success) | Some(LastResult::Unknown(_)) | None => Outcome::Success,
    }
}

pub fn classify_tier(schedule: Option<&str>) -> TierMatch {
    let Some(schedule) = schedule else {
        return TierMatch::default();
    };
    let schedule = schedule.to_lowercase();
    let matches = |keywords: &[&str]| keywords.iter().any(|keyword| schedule.contains(keyword));
    TierMatch {
        gold: matches(GOLD_KEYWORDS),
        silver: matches(SILVER_KEYWORDS),
        bronze: matches(BRONZE_KEYWORDS),
    }
}

/// `(increment, reverse)`; a "reverse incremental" mode sets both.
pub fn classify_mode(mode: Option<&str>) -> (bool, bool) {
    let Some(mode) = mode else {
        return (false, false);
    };
    let mode = mode.to_lowercase();
    (mode.contains("increment"), mode.contains("reverse"))
}

/// Job statistics for the records of one site.
pub fn job_counts<'a, I>(records: I, fallback: TierFallback) -> JobCounts
where
    I: IntoIterator<Item = &'a BackupJobRecord>,
{
    let mut counts = JobCounts::default();
    for record in records {
        counts.total_jobs += 1;
        match classify_outcome(record) {
            Outcome::Success => counts.success_jobs += 1,
            Outcome::Warning => counts.warning_jobs += 1,
            Outcome::Failed => counts.failed_jobs += 1,
        }
        let (increment, reverse) = classify_mode(record.backup_mode.as_deref());
        counts.increment_jobs += u64::from(increment);
        counts.reverse_increment_jobs += u64::from(reverse);
        let tier = classify_tier(record.schedule.as_deref());
        counts.gold_jobs += u64::from(tier.gold);
        counts.silver_jobs += u64::from(tier.silver);
        counts.bronze_jobs += u64::from(tier.bronze);
    }
    let tiered = counts.gold_jobs + counts.silver_jobs + counts.bronze_jobs;
    if tiered == 0 && fallback == TierFallback::Gold {
        counts.gold_jobs = counts.total_jobs;
    }
    counts
}
