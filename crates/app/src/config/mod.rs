use std::fs;
use std::path::{Path, PathBuf};

use audit_core::ReconcileConfig;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Optional path overrides from the config file. Unset paths fall back to the data root layout.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utilization_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
}

/// On-disk TOML configuration.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfigFile {
    pub paths: PathsSection,
    pub reconcile: ReconcileConfig,
}

#[derive(Clone, Debug)]
pub struct ConfigLoad {
    pub config: ConfigFile,
    pub path: PathBuf,
    pub created: bool,
}

pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let contents = fs::read_to_string(path)?;
    Ok(toml::from_str(&contents)?)
}

pub fn write_config_file(path: &Path, config: &ConfigFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let contents = toml::to_string_pretty(config)?;
    fs::write(path, contents)?;
    Ok(())
}

/// Reads `path`, writing the defaults there first when it does not exist yet.
pub fn load_or_create(path: &Path) -> Result<ConfigLoad> {
    if path.exists() {
        return Ok(ConfigLoad {
            config: load_config_file(path)?,
            path: path.to_path_buf(),
            created: false,
        });
    }
    let config = ConfigFile::default();
    write_config_file(path, &config)?;
    Ok(ConfigLoad {
        config,
        path: path.to_path_buf(),
        created: true,
    })
}
