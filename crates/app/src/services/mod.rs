mod pipeline;
mod reports;
mod settings;

use std::sync::Arc;

use crate::app::AppConfig;
use crate::error::Result;
use audit_db::Db;

pub use pipeline::{ReconcileService, RunReport};
pub use reports::ReportsService;
pub use settings::{SettingsService, SettingsSnapshot};

type SharedConfig = Arc<AppConfig>;

/// Service registry for app-level operations.
#[derive(Clone)]
pub struct AppServices {
    pub reconcile: ReconcileService,
    pub reports: ReportsService,
    pub settings: SettingsService,
}

impl AppServices {
    pub fn new(config: &AppConfig) -> Self {
        let shared = Arc::new(config.clone());
        Self {
            reconcile: ReconcileService::new(shared.clone()),
            reports: ReportsService::new(shared.clone()),
            settings: SettingsService::new(shared),
        }
    }
}

fn open_db(config: &SharedConfig) -> Result<Db> {
    Ok(Db::open(&config.db_path)?)
}
