use audit_app::{AppConfig, AppPaths, ConfigLoad, load_or_create};

use crate::args::{Cli, RunArgs};
use crate::dirs::default_config_path;

/// Resolved configuration after file, default and flag layering.
pub struct Resolved {
    pub load: ConfigLoad,
    pub paths: AppPaths,
}

impl Resolved {
    pub fn app_config(&self) -> AppConfig {
        AppConfig::from_paths(&self.paths, self.load.config.reconcile.clone())
    }
}

pub fn resolve(cli: &Cli) -> Result<Resolved, String> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let load = load_or_create(&path).map_err(|err| format!("config {}: {}", path.display(), err))?;
    let mut paths = AppPaths::with_overrides(ingest::default_data_root(), &load.config.paths);
    if let Some(db) = &cli.db {
        paths.db_path = db.clone();
    }
    Ok(Resolved { load, paths })
}

pub fn apply_run_flags(paths: &mut AppPaths, args: &RunArgs) {
    if let Some(dir) = &args.audit_dir {
        paths.audit_base_dir = dir.clone();
    }
    if let Some(dir) = &args.utilization_dir {
        paths.utilization_dir = dir.clone();
    }
}
