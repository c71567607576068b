use std::path::Path;

use anyhow::{Context, Result};
use sportcal_core::SqlitePreferences;

/// Open or create the preferences database, creating its directory if needed
pub fn open_prefs(path: &Path) -> Result<SqlitePreferences> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory {:?}", parent))?;
    }

    sportcal_core::open_db(path)
        .with_context(|| format!("Failed to open preferences database at {:?}", path))
}
