use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::debug;

use crate::error::Result;
use crate::models::{SportEvent, UserPreferences};
use crate::schema;

const PREFERENCES_KEY: &str = "user_prefs";

/// Local persistence for the preferences document
pub trait PreferencesStore {
    fn read(&self) -> Result<UserPreferences>;

    /// Atomic read-modify-write over the whole document. Returns the written value.
    fn write<F>(&self, mutate: F) -> Result<UserPreferences>
    where
        F: FnOnce(&mut UserPreferences);
}

impl<T: PreferencesStore> PreferencesStore for &T {
    fn read(&self) -> Result<UserPreferences> {
        (**self).read()
    }

    fn write<F>(&self, mutate: F) -> Result<UserPreferences>
    where
        F: FnOnce(&mut UserPreferences),
    {
        (**self).write(mutate)
    }
}

/// Preferences kept as one JSON document in a SQLite key-value table
pub struct SqlitePreferences {
    conn: Mutex<Connection>,
}

/// Open or create a preferences database at the specified path
pub fn open_db(path: &Path) -> Result<SqlitePreferences> {
    let conn = Connection::open(path)?;
    schema::migrate(&conn)?;
    Ok(SqlitePreferences {
        conn: Mutex::new(conn),
    })
}

impl SqlitePreferences {
    fn lock(&self) -> MutexGuard<'_, Connection> {
        // A panic mid-write rolls the transaction back, so the connection is still usable
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn load(conn: &Connection) -> Result<UserPreferences> {
    let stored: Option<String> = conn
        .query_row(
            "SELECT value FROM kv WHERE key = ?1",
            params![PREFERENCES_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match stored {
        Some(json) => Ok(serde_json::from_str(&json)?),
        None => Ok(UserPreferences::default()),
    }
}

impl PreferencesStore for SqlitePreferences {
    fn read(&self) -> Result<UserPreferences> {
        load(&self.lock())
    }

    fn write<F>(&self, mutate: F) -> Result<UserPreferences>
    where
        F: FnOnce(&mut UserPreferences),
    {
        let mut conn = self.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut prefs = load(&tx)?;
        mutate(&mut prefs);

        let json = serde_json::to_string(&prefs)?;
        let now = chrono::Utc::now().timestamp_millis();
        tx.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![PREFERENCES_KEY, json, now],
        )?;
        tx.commit()?;

        debug!(presets = prefs.composed_filters.len(), "Preferences written");
        Ok(prefs)
    }
}

/// Store the session token. `None` signs out.
pub fn set_auth_token(
    store: &impl PreferencesStore,
    token: Option<String>,
    user_id: Option<i64>,
) -> Result<()> {
    store.write(|prefs| {
        prefs.auth_token = token;
        prefs.user_id = user_id;
    })?;
    Ok(())
}

pub fn set_notifications(store: &impl PreferencesStore, enabled: bool) -> Result<()> {
    store.write(|prefs| prefs.notifications_enabled = enabled)?;
    Ok(())
}

/// Remember an event, optionally with the notification subscription created for it
pub fn add_favourite(
    store: &impl PreferencesStore,
    event: &SportEvent,
    subscription_id: Option<i64>,
) -> Result<()> {
    store.write(|prefs| {
        if let Some(subscription_id) = subscription_id {
            prefs.subscriptions.insert(event.id, subscription_id);
        }
        if !prefs.favourites.iter().any(|f| f.id == event.id) {
            prefs.favourites.push(event.clone());
        }
    })?;
    Ok(())
}

/// Forget a favourite event. Returns whether it was present.
pub fn remove_favourite(store: &impl PreferencesStore, event_id: i64) -> Result<bool> {
    let mut removed = false;
    store.write(|prefs| {
        let before = prefs.favourites.len();
        prefs.favourites.retain(|f| f.id != event_id);
        prefs.subscriptions.remove(&event_id);
        removed = prefs.favourites.len() != before;
    })?;
    Ok(removed)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono::NaiveDate;
    use tempfile::TempDir;

    use super::*;
    use crate::filter::{Filter, FilterKind};
    use crate::models::{AuthState, ComposedFilter};

    fn event(id: i64) -> SportEvent {
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        SportEvent {
            id,
            sport_name: "Футбол".to_string(),
            event_name: "Первенство".to_string(),
            date_from: day,
            date_to: day,
            description: None,
            location: "Брянск".to_string(),
            member_count: 20,
            team_name: None,
            programs: vec![],
            disciplines: vec![],
            performer: None,
            ekp: "1".to_string(),
        }
    }

    #[test]
    fn test_fresh_database_reads_defaults() {
        let dir = TempDir::new().unwrap();
        let store = open_db(&dir.path().join("prefs.db")).unwrap();

        let prefs = store.read().unwrap();

        assert_eq!(prefs, UserPreferences::default());
    }

    #[test]
    fn test_write_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("prefs.db");

        {
            let store = open_db(&db_path).unwrap();
            store
                .write(|prefs| {
                    prefs.composed_filters.push(ComposedFilter {
                        id: Some(5),
                        name: "Выходные".to_string(),
                        filters: vec![Filter::reference(FilterKind::SportCategory, 3, "Футбол")
                            .unwrap()],
                    });
                    prefs.default_filter_id = Some(5);
                })
                .unwrap();
        }

        let store = open_db(&db_path).unwrap();
        let prefs = store.read().unwrap();

        assert_eq!(prefs.default_preset().unwrap().name, "Выходные");
        assert_eq!(prefs.composed_filters[0].filters[0].identity(), Some(3));
    }

    #[test]
    fn test_auth_token_helpers() {
        let dir = TempDir::new().unwrap();
        let store = open_db(&dir.path().join("prefs.db")).unwrap();

        set_auth_token(&store, Some("jwt".to_string()), Some(12)).unwrap();
        let prefs = store.read().unwrap();
        assert_eq!(prefs.auth_state(), AuthState::Authenticated);
        assert_eq!(prefs.user_id, Some(12));

        set_auth_token(&store, None, None).unwrap();
        assert_eq!(store.read().unwrap().auth_state(), AuthState::Anonymous);
    }

    #[test]
    fn test_favourites() {
        let dir = TempDir::new().unwrap();
        let store = open_db(&dir.path().join("prefs.db")).unwrap();

        add_favourite(&store, &event(1), Some(100)).unwrap();
        add_favourite(&store, &event(1), None).unwrap();
        add_favourite(&store, &event(2), None).unwrap();

        let prefs = store.read().unwrap();
        assert_eq!(prefs.favourites.len(), 2);
        assert_eq!(prefs.subscriptions.get(&1), Some(&100));

        assert!(remove_favourite(&store, 1).unwrap());
        assert!(!remove_favourite(&store, 1).unwrap());

        let prefs = store.read().unwrap();
        assert_eq!(prefs.favourites.len(), 1);
        assert!(prefs.subscriptions.is_empty());
    }

    #[test]
    fn test_notifications_flag() {
        let dir = TempDir::new().unwrap();
        let store = open_db(&dir.path().join("prefs.db")).unwrap();

        set_notifications(&store, false).unwrap();

        assert!(!store.read().unwrap().notifications_enabled);
    }
}
