use std::path::Path;

use rusqlite::Connection;

mod error;
mod helpers;
mod migrations;
mod reports;
mod runs;
mod settings;
mod types;

pub use error::{DbError, Result};
pub use settings::{
    OVERRIDE_KEYS, SETTING_COST_PER_TB, SETTING_DELETED_RATIO, SETTING_DISCREPANCY_PCT,
    SETTING_LOW_DISK_PCT, SETTING_TAX_RATE,
};
pub use types::{NewRun, PipelineRun, RunStatus};

pub struct Db {
    conn: Connection,
}

impl Db {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self { conn })
    }
}
