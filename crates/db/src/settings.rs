use std::str::FromStr;

use audit_core::ReconcileConfig;
use rusqlite::params;
use rust_decimal::Decimal;

use crate::Db;
use crate::error::{DbError, Result};

pub const SETTING_COST_PER_TB: &str = "wasabi_cost_per_tb";
pub const SETTING_TAX_RATE: &str = "sales_tax_rate";
pub const SETTING_LOW_DISK_PCT: &str = "low_disk_threshold_pct";
pub const SETTING_DISCREPANCY_PCT: &str = "discrepancy_threshold_pct";
pub const SETTING_DELETED_RATIO: &str = "deleted_ratio_threshold";

/// Settings that override the reconciliation config when present.
pub const OVERRIDE_KEYS: &[&str] = &[
    SETTING_COST_PER_TB,
    SETTING_TAX_RATE,
    SETTING_LOW_DISK_PCT,
    SETTING_DISCREPANCY_PCT,
    SETTING_DELETED_RATIO,
];

fn override_slot<'a>(config: &'a mut ReconcileConfig, key: &str) -> Option<&'a mut Decimal> {
    match key {
        SETTING_COST_PER_TB => Some(&mut config.pricing.cost_per_tb),
        SETTING_TAX_RATE => Some(&mut config.pricing.tax_rate),
        SETTING_LOW_DISK_PCT => Some(&mut config.thresholds.low_disk_pct),
        SETTING_DISCREPANCY_PCT => Some(&mut config.thresholds.discrepancy_pct),
        SETTING_DELETED_RATIO => Some(&mut config.thresholds.deleted_ratio),
        _ => None,
    }
}

fn parse_override(key: &str, value: &str) -> Result<Decimal> {
    Decimal::from_str(value.trim())
        .ok()
        .filter(|parsed| !parsed.is_sign_negative())
        .ok_or_else(|| DbError::InvalidSetting {
            key: key.to_string(),
            value: value.to_string(),
        })
}

impl Db {
    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM app_setting WHERE key = ?1")?;
        let mut rows = stmt.query([key])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get::<_, String>(0)?))
        } else {
            Ok(None)
        }
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO app_setting (key, value)
            VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    pub fn delete_setting(&self, key: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM app_setting WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }

    pub fn list_settings(&self) -> Result<Vec<(String, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value FROM app_setting ORDER BY key ASC")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Stores a validated override. Only `OVERRIDE_KEYS` with non-negative decimals are accepted.
    pub fn set_override(&self, key: &str, value: &str) -> Result<Decimal> {
        if !OVERRIDE_KEYS.contains(&key) {
            return Err(DbError::UnknownSetting(key.to_string()));
        }
        let parsed = parse_override(key, value)?;
        self.set_setting(key, &parsed.to_string())?;
        Ok(parsed)
    }

    /// Applies stored overrides on top of `config` and returns the keys that took effect.
    /// Stored values that no longer parse are skipped.
    pub fn apply_config_overrides(&self, config: &mut ReconcileConfig) -> Result<Vec<String>> {
        let mut applied = Vec::new();
        for key in OVERRIDE_KEYS {
            let Some(raw) = self.get_setting(key)? else {
                continue;
            };
            match parse_override(key, &raw) {
                Ok(value) => {
                    if let Some(slot) = override_slot(config, key) {
                        *slot = value;
                        applied.push(key.to_string());
                    }
                }
                Err(err) => tracing::warn!(key = *key, "ignoring stored setting: {}", err),
            }
        }
        Ok(applied)
    }
}
