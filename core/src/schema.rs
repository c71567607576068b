/// SQL schema for the local preferences database
pub const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);

PRAGMA user_version = 1;
"#;

pub const CURRENT_VERSION: i32 = 1;

/// Get current schema version from database
pub fn get_schema_version(conn: &rusqlite::Connection) -> Result<i32, rusqlite::Error> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
}

/// Run migrations to bring database to current schema version
pub fn migrate(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    let version = get_schema_version(conn)?;

    if version == 0 {
        // Fresh database
        conn.execute_batch(SCHEMA_V1)?;
        return Ok(());
    }

    if version == CURRENT_VERSION {
        Ok(())
    } else {
        Err(rusqlite::Error::InvalidQuery)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_migrate_is_idempotent() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();

        migrate(&conn).unwrap();
        migrate(&conn).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", 7).unwrap();

        assert!(migrate(&conn).is_err());
    }
}
