use std::path::PathBuf;

use audit_core::ReconcileConfig;
use audit_db::Db;

use crate::error::Result;
use crate::services::AppServices;
use crate::startup::AppPaths;

/// Paths and reconciliation settings for one deployment.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub audit_base_dir: PathBuf,
    pub utilization_dir: PathBuf,
    /// Built-in defaults merged with the config file; DB overrides apply per run.
    pub reconcile: ReconcileConfig,
}

impl AppConfig {
    pub fn from_paths(paths: &AppPaths, reconcile: ReconcileConfig) -> Self {
        Self {
            db_path: paths.db_path.clone(),
            audit_base_dir: paths.audit_base_dir.clone(),
            utilization_dir: paths.utilization_dir.clone(),
            reconcile,
        }
    }
}

/// Application state shared by front ends.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub services: AppServices,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let services = AppServices::new(&config);
        Self { config, services }
    }

    pub fn is_fresh_db(&self) -> bool {
        !self.config.db_path.exists()
    }

    pub fn setup_db(&self) -> Result<()> {
        setup_db(&self.config.db_path)
    }

    pub fn open_db(&self) -> Result<Db> {
        Ok(Db::open(&self.config.db_path)?)
    }
}

pub fn setup_db(path: &std::path::Path) -> Result<()> {
    let mut db = Db::open(path)?;
    db.migrate()?;
    Ok(())
}
