use audit_core::ReconcileConfig;
use audit_db::{Db, DbError};
use rust_decimal::Decimal;

use crate::error::{AppError, Result};
use crate::services::{SharedConfig, open_db};

/// Stored overrides and the configuration they produce.
#[derive(Debug, Clone)]
pub struct SettingsSnapshot {
    pub overrides: Vec<(String, String)>,
    pub effective: ReconcileConfig,
}

#[derive(Clone)]
pub struct SettingsService {
    config: SharedConfig,
}

impl SettingsService {
    pub(super) fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    fn db(&self) -> Result<Db> {
        open_db(&self.config)
    }

    pub fn get(&self) -> Result<SettingsSnapshot> {
        let db = self.db()?;
        let mut effective = self.config.reconcile.clone();
        db.apply_config_overrides(&mut effective)?;
        Ok(SettingsSnapshot {
            overrides: db.list_settings()?,
            effective,
        })
    }

    pub fn update(&self, key: &str, value: &str) -> Result<Decimal> {
        let db = self.db()?;
        db.set_override(key, value).map_err(|err| match err {
            DbError::UnknownSetting(_) | DbError::InvalidSetting { .. } => {
                AppError::InvalidInput(err.to_string())
            }
            other => AppError::Db(other),
        })
    }

    pub fn clear(&self, key: &str) -> Result<bool> {
        Ok(self.db()?.delete_setting(key)?)
    }
}
