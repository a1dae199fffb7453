use std::path::PathBuf;

const CONFIG_DIR_NAME: &str = "backup-audit";
const CONFIG_FILE_NAME: &str = "config.toml";

/// `$XDG_CONFIG_HOME/backup-audit/config.toml`, else under `$HOME/.config`.
pub fn default_config_path() -> Result<PathBuf, String> {
    if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir).join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
        }
    }
    let home = std::env::var("HOME").map_err(|err| format!("resolve HOME: {}", err))?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME))
}
