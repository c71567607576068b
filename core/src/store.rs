use tracing::{debug, info, warn};

use crate::active_set::ActiveFilterSet;
use crate::codec;
use crate::db::PreferencesStore;
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::models::{AuthState, ComposedFilter};
use crate::remote::PresetService;

/// Name given to a combination that has not been saved yet
pub const CUSTOM_PRESET_NAME: &str = "Пользовательский";

/// The preset the active set currently reflects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Editing {
    /// `None` for an unsaved custom combination
    pub id: Option<i64>,
    pub name: String,
}

impl Default for Editing {
    fn default() -> Self {
        Editing {
            id: None,
            name: CUSTOM_PRESET_NAME.to_string(),
        }
    }
}

/// Named presets persisted locally and mirrored to the remote service.
///
/// Every remote-backed mutation talks to the remote first and only touches
/// local state once that call succeeded.
pub struct ComposedFilterStore<R, P> {
    remote: R,
    prefs: P,
    editing: Editing,
}

impl<R: PresetService, P: PreferencesStore> ComposedFilterStore<R, P> {
    pub fn new(remote: R, prefs: P) -> Self {
        ComposedFilterStore {
            remote,
            prefs,
            editing: Editing::default(),
        }
    }

    pub fn prefs(&self) -> &P {
        &self.prefs
    }

    pub fn editing(&self) -> &Editing {
        &self.editing
    }

    /// Presets in display order
    pub fn list(&self) -> Result<Vec<ComposedFilter>> {
        Ok(self.prefs.read()?.composed_filters)
    }

    pub fn get(&self, id: i64) -> Result<ComposedFilter> {
        self.prefs
            .read()?
            .preset(id)
            .cloned()
            .ok_or(Error::PresetNotFound(id))
    }

    pub fn default_preset(&self) -> Result<Option<ComposedFilter>> {
        Ok(self.prefs.read()?.default_preset().cloned())
    }

    /// Replace local presets with the remote list for the signed-in user.
    ///
    /// Guest and anonymous sessions have no remote presets, so nothing is
    /// fetched and `false` is returned. The whole list is decoded before
    /// anything is written: one malformed preset leaves local state as it was.
    pub async fn load_remote(&self) -> Result<bool> {
        if self.prefs.read()?.auth_state() != AuthState::Authenticated {
            debug!("Skipping preset reconciliation for a session without an account");
            return Ok(false);
        }

        let remote = self.remote.list_mine().await.map_err(|e| {
            warn!(error = %e, "Failed to fetch presets");
            e
        })?;

        let presets = remote
            .into_iter()
            .map(|preset| -> Result<ComposedFilter> {
                Ok(ComposedFilter {
                    id: Some(preset.id),
                    filters: codec::decode_list(&preset.encoded_filters)?,
                    name: preset.name,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        info!(count = presets.len(), "Presets reconciled with remote");
        self.prefs.write(|prefs| {
            prefs.composed_filters = presets;
            if let Some(id) = prefs.default_filter_id {
                if prefs.preset(id).is_none() {
                    prefs.default_filter_id = None;
                }
            }
        })?;
        Ok(true)
    }

    /// Save a new preset remotely, then locally under the id it was given
    pub async fn create(&self, name: &str, filters: &[Filter]) -> Result<ComposedFilter> {
        let encoded = codec::encode_list(filters)?;
        let id = self.remote.save(name, &encoded).await?;

        let preset = ComposedFilter {
            id: Some(id),
            name: name.to_string(),
            filters: filters.to_vec(),
        };
        self.prefs.write(|prefs| prefs.upsert_preset(preset.clone()))?;

        debug!(id, name, "Preset created");
        Ok(preset)
    }

    pub async fn update(&self, id: i64, name: &str, filters: &[Filter]) -> Result<ComposedFilter> {
        let encoded = codec::encode_list(filters)?;
        self.remote.update(id, name, &encoded).await?;

        let preset = ComposedFilter {
            id: Some(id),
            name: name.to_string(),
            filters: filters.to_vec(),
        };
        self.prefs.write(|prefs| prefs.upsert_preset(preset.clone()))?;

        debug!(id, name, "Preset updated");
        Ok(preset)
    }

    /// Delete a preset. If `active` reflects it, the set goes back to an empty custom combination.
    pub async fn delete(&mut self, id: i64, active: &mut ActiveFilterSet) -> Result<()> {
        self.remote.delete(id).await?;
        self.prefs.write(|prefs| prefs.remove_preset(id))?;

        if self.editing.id == Some(id) {
            self.reset(active);
        }

        debug!(id, "Preset deleted");
        Ok(())
    }

    /// Point the default at `preset`. A preset without an id clears the default.
    pub fn set_default(&self, preset: &ComposedFilter) -> Result<()> {
        if let Some(id) = preset.id {
            if self.prefs.read()?.preset(id).is_none() {
                return Err(Error::PresetNotFound(id));
            }
        }
        self.prefs
            .write(|prefs| prefs.default_filter_id = preset.id)?;
        Ok(())
    }

    /// Load `preset` into the active set and track it as the one being edited
    pub fn select_as_active(&mut self, preset: &ComposedFilter, active: &mut ActiveFilterSet) {
        active.replace_all(preset.filters.iter().cloned());
        self.editing = Editing {
            id: preset.id,
            name: preset.name.clone(),
        };
    }

    /// Start-up: put the default preset, if any, into the active set
    pub fn seed_from_default(
        &mut self,
        active: &mut ActiveFilterSet,
    ) -> Result<Option<ComposedFilter>> {
        let preset = self.default_preset()?;
        if let Some(preset) = &preset {
            self.select_as_active(preset, active);
        }
        Ok(preset)
    }

    /// Persist the active set as the preset being edited: created when it has
    /// never been saved, updated otherwise. `name` renames it.
    pub async fn save_editing(
        &mut self,
        name: Option<&str>,
        active: &ActiveFilterSet,
    ) -> Result<ComposedFilter> {
        let name = name.unwrap_or(self.editing.name.as_str()).to_string();

        let preset = match self.editing.id {
            Some(id) => self.update(id, &name, active.as_slice()).await?,
            None => self.create(&name, active.as_slice()).await?,
        };

        self.editing = Editing {
            id: preset.id,
            name: preset.name.clone(),
        };
        Ok(preset)
    }

    pub fn reset(&mut self, active: &mut ActiveFilterSet) {
        active.clear();
        self.editing = Editing::default();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::Mutex;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::*;
    use crate::db::{open_db, set_auth_token, SqlitePreferences};
    use crate::filter::FilterKind;
    use crate::remote::{RemoteError, RemotePreset};

    /// In-memory preset service; `fail` makes every call fail
    #[derive(Default)]
    struct FakePresets {
        next_id: Mutex<i64>,
        stored: Mutex<Vec<RemotePreset>>,
        fail: Mutex<bool>,
    }

    impl FakePresets {
        fn starting_at(id: i64) -> Self {
            FakePresets {
                next_id: Mutex::new(id),
                ..Default::default()
            }
        }

        fn check(&self) -> Result<(), RemoteError> {
            if *self.fail.lock().unwrap() {
                Err(RemoteError::from_status(503))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl PresetService for FakePresets {
        async fn save(&self, name: &str, encoded_filters: &str) -> Result<i64, RemoteError> {
            self.check()?;
            let mut next_id = self.next_id.lock().unwrap();
            let id = *next_id;
            *next_id += 1;
            self.stored.lock().unwrap().push(RemotePreset {
                id,
                name: name.to_string(),
                encoded_filters: encoded_filters.to_string(),
            });
            Ok(id)
        }

        async fn update(
            &self,
            id: i64,
            name: &str,
            encoded_filters: &str,
        ) -> Result<(), RemoteError> {
            self.check()?;
            for preset in self.stored.lock().unwrap().iter_mut() {
                if preset.id == id {
                    preset.name = name.to_string();
                    preset.encoded_filters = encoded_filters.to_string();
                }
            }
            Ok(())
        }

        async fn delete(&self, id: i64) -> Result<(), RemoteError> {
            self.check()?;
            self.stored.lock().unwrap().retain(|p| p.id != id);
            Ok(())
        }

        async fn list_mine(&self) -> Result<Vec<RemotePreset>, RemoteError> {
            self.check()?;
            Ok(self.stored.lock().unwrap().clone())
        }
    }

    fn football() -> Filter {
        Filter::reference(FilterKind::SportCategory, 3, "Футбол").unwrap()
    }

    fn open(dir: &TempDir) -> SqlitePreferences {
        open_db(&dir.path().join("prefs.db")).unwrap()
    }

    #[tokio::test]
    async fn test_default_preset_survives_restart() {
        let dir = TempDir::new().unwrap();
        let remote = FakePresets::starting_at(42);

        {
            let store = ComposedFilterStore::new(&remote, open(&dir));
            let created = store
                .create(CUSTOM_PRESET_NAME, &[football()])
                .await
                .unwrap();
            assert_eq!(created.id, Some(42));
            store.set_default(&created).unwrap();
        }

        let mut store = ComposedFilterStore::new(&remote, open(&dir));
        let mut active = ActiveFilterSet::new();
        let seeded = store.seed_from_default(&mut active).unwrap();

        assert_eq!(seeded.map(|p| p.id), Some(Some(42)));
        assert_eq!(active.snapshot(), vec![football()]);
        assert_eq!(
            store.editing(),
            &Editing {
                id: Some(42),
                name: CUSTOM_PRESET_NAME.to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_deleting_default_clears_pointer() {
        let dir = TempDir::new().unwrap();
        let remote = FakePresets::starting_at(1);
        let mut store = ComposedFilterStore::new(&remote, open(&dir));
        let mut active = ActiveFilterSet::new();

        let preset = store.create("Футбол", &[football()]).await.unwrap();
        store.set_default(&preset).unwrap();
        store.select_as_active(&preset, &mut active);

        store.delete(1, &mut active).await.unwrap();

        assert!(store.list().unwrap().is_empty());
        assert_eq!(store.default_preset().unwrap(), None);
        assert!(active.is_empty());
        assert_eq!(store.editing(), &Editing::default());
    }

    #[tokio::test]
    async fn test_remote_failure_leaves_local_state() {
        let dir = TempDir::new().unwrap();
        let remote = FakePresets::starting_at(1);
        let store = ComposedFilterStore::new(&remote, open(&dir));
        let preset = store.create("Футбол", &[football()]).await.unwrap();

        *remote.fail.lock().unwrap() = true;

        assert!(store.create("Хоккей", &[]).await.is_err());
        assert!(store.update(1, "Переименован", &[]).await.is_err());
        assert_eq!(store.list().unwrap(), vec![preset]);
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_preset_default_and_editing() {
        let dir = TempDir::new().unwrap();
        let remote = FakePresets::starting_at(1);
        let mut store = ComposedFilterStore::new(&remote, open(&dir));
        let mut active = ActiveFilterSet::new();

        let preset = store.create("Футбол", &[football()]).await.unwrap();
        store.set_default(&preset).unwrap();
        store.select_as_active(&preset, &mut active);

        *remote.fail.lock().unwrap() = true;
        assert!(store.delete(1, &mut active).await.is_err());

        assert_eq!(store.list().unwrap(), vec![preset.clone()]);
        assert_eq!(store.default_preset().unwrap(), Some(preset));
        assert_eq!(active.snapshot(), vec![football()]);
        assert_eq!(
            store.editing(),
            &Editing {
                id: Some(1),
                name: "Футбол".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_failed_list_fetch_keeps_local_presets() {
        let dir = TempDir::new().unwrap();
        let remote = FakePresets::starting_at(1);
        let store = ComposedFilterStore::new(&remote, open(&dir));
        set_auth_token(store.prefs(), Some("jwt".to_string()), Some(1)).unwrap();
        let local = store.create("Футбол", &[football()]).await.unwrap();
        store.set_default(&local).unwrap();

        *remote.fail.lock().unwrap() = true;
        let err = store.load_remote().await.unwrap_err();

        assert!(matches!(err, Error::Remote(_)));
        assert_eq!(store.list().unwrap(), vec![local.clone()]);
        assert_eq!(store.default_preset().unwrap(), Some(local));
    }

    #[tokio::test]
    async fn test_update_keeps_position() {
        let dir = TempDir::new().unwrap();
        let remote = FakePresets::starting_at(1);
        let store = ComposedFilterStore::new(&remote, open(&dir));
        store.create("a", &[]).await.unwrap();
        store.create("b", &[]).await.unwrap();

        store.update(1, "renamed", &[football()]).await.unwrap();

        let names: Vec<_> = store.list().unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["renamed", "b"]);
        assert_eq!(store.get(1).unwrap().filters, vec![football()]);
    }

    #[tokio::test]
    async fn test_load_remote_skips_guest() {
        let dir = TempDir::new().unwrap();
        let remote = FakePresets::starting_at(1);
        *remote.fail.lock().unwrap() = true;
        let store = ComposedFilterStore::new(&remote, open(&dir));
        set_auth_token(store.prefs(), Some("guest".to_string()), None).unwrap();

        assert!(!store.load_remote().await.unwrap());
    }

    #[tokio::test]
    async fn test_load_remote_overwrites_local() {
        let dir = TempDir::new().unwrap();
        let remote = FakePresets::starting_at(1);
        remote.stored.lock().unwrap().push(RemotePreset {
            id: 9,
            name: "С сервера".to_string(),
            encoded_filters: codec::encode_list(&[football()]).unwrap(),
        });
        let store = ComposedFilterStore::new(&remote, open(&dir));
        set_auth_token(store.prefs(), Some("jwt".to_string()), Some(1)).unwrap();
        store
            .prefs()
            .write(|prefs| {
                prefs.upsert_preset(ComposedFilter {
                    id: Some(5),
                    name: "Локальный".to_string(),
                    filters: vec![],
                });
                prefs.default_filter_id = Some(5);
            })
            .unwrap();

        assert!(store.load_remote().await.unwrap());

        let presets = store.list().unwrap();
        assert_eq!(presets.len(), 1);
        assert_eq!(presets[0].name, "С сервера");
        assert_eq!(presets[0].filters, vec![football()]);
        // The old default no longer exists
        assert_eq!(store.prefs().read().unwrap().default_filter_id, None);
    }

    #[tokio::test]
    async fn test_load_remote_malformed_preset_leaves_local() {
        let dir = TempDir::new().unwrap();
        let remote = FakePresets::starting_at(1);
        remote.stored.lock().unwrap().push(RemotePreset {
            id: 9,
            name: "Битый".to_string(),
            encoded_filters: r#"[{"filterType":"WEATHER"}]"#.to_string(),
        });
        let store = ComposedFilterStore::new(&remote, open(&dir));
        set_auth_token(store.prefs(), Some("jwt".to_string()), Some(1)).unwrap();
        store
            .prefs()
            .write(|prefs| prefs.upsert_preset(ComposedFilter::new("Локальный", vec![])))
            .unwrap();

        let result = store.load_remote().await;

        assert!(matches!(result, Err(Error::MalformedFilter(_))));
        assert_eq!(store.list().unwrap()[0].name, "Локальный");
    }

    #[tokio::test]
    async fn test_save_editing_creates_then_updates() {
        let dir = TempDir::new().unwrap();
        let remote = FakePresets::starting_at(7);
        let mut store = ComposedFilterStore::new(&remote, open(&dir));
        let mut active = ActiveFilterSet::from_filters([football()]);

        let created = store.save_editing(None, &active).await.unwrap();
        assert_eq!(created.id, Some(7));
        assert_eq!(created.name, CUSTOM_PRESET_NAME);

        active.upsert(Filter::MemberCountRange { start: 1, end: 50 });
        let updated = store.save_editing(Some("Футбол"), &active).await.unwrap();

        assert_eq!(updated.id, Some(7));
        assert_eq!(store.list().unwrap().len(), 1);
        assert_eq!(store.get(7).unwrap().filters.len(), 2);
        assert_eq!(remote.stored.lock().unwrap()[0].name, "Футбол");
    }

    #[test]
    fn test_set_default_rejects_unknown_preset() {
        let dir = TempDir::new().unwrap();
        let remote = FakePresets::default();
        let store = ComposedFilterStore::new(&remote, open(&dir));
        let stranger = ComposedFilter {
            id: Some(99),
            name: "нет".to_string(),
            filters: vec![],
        };

        assert!(matches!(
            store.set_default(&stranger),
            Err(Error::PresetNotFound(99))
        ));
    }
}
