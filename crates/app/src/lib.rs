pub mod app;
pub mod config;
pub mod error;
pub mod services;
pub mod startup;

pub use app::{AppConfig, AppState};
pub use config::{
    ConfigFile, ConfigLoad, PathsSection, load_config_file, load_or_create, write_config_file,
};
pub use error::{AppError, Result};
pub use services::{
    AppServices, ReconcileService, ReportsService, RunReport, SettingsService, SettingsSnapshot,
};
pub use startup::{AppPaths, ensure_app_data_dir};
