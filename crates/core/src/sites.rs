use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Returned when there is nothing to resolve from.
pub const UNKNOWN_SITE: &str = "UNK";

const AUDIT_FILE_PREFIX: &str = "VeeamFullAudit_";

/// Which step of the server naming cascade produced a site code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteRule {
    HyphenPrefix,
    CorpSuffix,
    LabSuffix,
    RoleSuffix,
    PsSuffix,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteResolution {
    pub site_code: String,
    pub rule: SiteRule,
}

impl SiteResolution {
    pub fn is_fallback(&self) -> bool {
        self.rule == SiteRule::Fallback
    }
}

// Order encodes naming precedence across site-naming eras; keep it.
static SERVER_RULES: Lazy<Vec<(SiteRule, Regex)>> = Lazy::new(|| {
    [
        (SiteRule::HyphenPrefix, r"^([A-Z]{2,4})-"),
        (SiteRule::CorpSuffix, r"^([A-Z]{2,4})CORP"),
        (SiteRule::LabSuffix, r"^([A-Z]{2,4})LAB"),
        (SiteRule::RoleSuffix, r"^([A-Z]{3})([A-Z]{3,4})(PS|SLC)$"),
        (SiteRule::PsSuffix, r"^([A-Z]{2,4})[A-Z]{1,4}PS"),
    ]
    .into_iter()
    .map(|(rule, pattern)| (rule, Regex::new(pattern).expect("site pattern compiles")))
    .collect()
});

static AUDIT_STAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+?)_\d{4}-\d{2}-\d{2}_\d{6}$").expect("audit stamp pattern compiles")
});

/// `VeeamFullAudit_<server>_<YYYY-MM-DD>_<HHMMSS>.csv` -> `<server>`.
pub fn server_id_from_filename(file_name: &str) -> String {
    let name = file_name.replace(AUDIT_FILE_PREFIX, "").replace(".csv", "");
    match AUDIT_STAMP.captures(&name).and_then(|caps| caps.get(1)) {
        Some(server) => server.as_str().to_string(),
        None => name,
    }
}

pub fn resolve_server_site(label: &str) -> SiteResolution {
    for (rule, pattern) in SERVER_RULES.iter() {
        if let Some(code) = pattern.captures(label).and_then(|caps| caps.get(1)) {
            return SiteResolution {
                site_code: code.as_str().to_string(),
                rule: *rule,
            };
        }
    }
    let prefix: String = label.trim().chars().take(3).collect();
    let site_code = if prefix.is_empty() {
        UNKNOWN_SITE.to_string()
    } else {
        prefix.to_uppercase()
    };
    SiteResolution {
        site_code,
        rule: SiteRule::Fallback,
    }
}

pub fn site_code_from_server(label: &str) -> String {
    resolve_server_site(label).site_code
}

pub fn site_code_from_bucket(bucket_name: &str) -> String {
    let trimmed = bucket_name.trim();
    if trimmed.is_empty() {
        return UNKNOWN_SITE.to_string();
    }
    match trimmed.split('-').next() {
        Some(first) if !first.is_empty() => first.to_uppercase(),
        _ => trimmed.to_uppercase(),
    }
}
