use std::path::PathBuf;

use ingest::{AUDIT_DIR_NAME, UTILIZATION_DIR_NAME};

use crate::Result;
use crate::config::PathsSection;

const DB_FILE_NAME: &str = "backup-audit.sqlite";

/// Filesystem layout under one data root.
#[derive(Clone, Debug)]
pub struct AppPaths {
    pub data_root: PathBuf,
    pub audit_base_dir: PathBuf,
    pub utilization_dir: PathBuf,
    pub db_path: PathBuf,
}

impl AppPaths {
    pub fn new(data_root: PathBuf) -> Self {
        Self {
            audit_base_dir: data_root.join(AUDIT_DIR_NAME),
            utilization_dir: data_root.join(UTILIZATION_DIR_NAME),
            db_path: data_root.join(DB_FILE_NAME),
            data_root,
        }
    }

    /// Layout for `data_root` with any explicit paths from the config file applied.
    pub fn with_overrides(data_root: PathBuf, overrides: &PathsSection) -> Self {
        let root = overrides.data_root.clone().unwrap_or(data_root);
        let mut paths = Self::new(root);
        if let Some(dir) = &overrides.audit_dir {
            paths.audit_base_dir = dir.clone();
        }
        if let Some(dir) = &overrides.utilization_dir {
            paths.utilization_dir = dir.clone();
        }
        if let Some(path) = &overrides.db_path {
            paths.db_path = path.clone();
        }
        paths
    }
}

pub fn ensure_app_data_dir(paths: &AppPaths) -> Result<()> {
    std::fs::create_dir_all(&paths.data_root)?;
    if let Some(parent) = paths.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_individual_paths() {
        let overrides = PathsSection {
            db_path: Some(PathBuf::from("/var/lib/audit.sqlite")),
            ..PathsSection::default()
        };
        let paths = AppPaths::with_overrides(PathBuf::from("/data"), &overrides);
        assert_eq!(paths.audit_base_dir, PathBuf::from("/data/input_veeam_audits"));
        assert_eq!(
            paths.utilization_dir,
            PathBuf::from("/data/input_wasabi_utilization")
        );
        assert_eq!(paths.db_path, PathBuf::from("/var/lib/audit.sqlite"));

        let rooted = PathsSection {
            data_root: Some(PathBuf::from("/srv")),
            ..PathsSection::default()
        };
        let paths = AppPaths::with_overrides(PathBuf::from("/data"), &rooted);
        assert_eq!(paths.db_path, PathBuf::from("/srv/backup-audit.sqlite"));
    }
}
