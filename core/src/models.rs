use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::filter::Filter;

/// Token stored for sessions that skipped sign-in
pub const GUEST_TOKEN: &str = "guest";

/// Offset of the events server's local time, applied before taking the calendar date
const SERVER_UTC_OFFSET_HOURS: i64 = 3;

const UNNAMED_EVENT: &str = "Без имени";

/// A named, ordered collection of filters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedFilter {
    /// Absent until the remote service assigns one
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub filters: Vec<Filter>,
}

impl ComposedFilter {
    pub fn new(name: impl Into<String>, filters: Vec<Filter>) -> Self {
        ComposedFilter {
            id: None,
            name: name.into(),
            filters,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Guest,
    Authenticated,
}

/// The persisted preferences document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPreferences {
    pub auth_token: Option<String>,
    pub user_id: Option<i64>,
    /// Presets in display (insertion) order
    pub composed_filters: Vec<ComposedFilter>,
    pub default_filter_id: Option<i64>,
    pub favourites: Vec<SportEvent>,
    pub notifications_enabled: bool,
    /// Event id -> notification subscription id
    pub subscriptions: BTreeMap<i64, i64>,
}

impl Default for UserPreferences {
    fn default() -> Self {
        UserPreferences {
            auth_token: None,
            user_id: None,
            composed_filters: vec![],
            default_filter_id: None,
            favourites: vec![],
            notifications_enabled: true,
            subscriptions: BTreeMap::new(),
        }
    }
}

impl UserPreferences {
    pub fn auth_state(&self) -> AuthState {
        match self.auth_token.as_deref() {
            None => AuthState::Anonymous,
            Some(GUEST_TOKEN) => AuthState::Guest,
            Some(_) => AuthState::Authenticated,
        }
    }

    pub fn preset(&self, id: i64) -> Option<&ComposedFilter> {
        self.composed_filters.iter().find(|p| p.id == Some(id))
    }

    pub fn default_preset(&self) -> Option<&ComposedFilter> {
        self.default_filter_id.and_then(|id| self.preset(id))
    }

    /// Replace the preset with the same id in place, or append it
    pub fn upsert_preset(&mut self, preset: ComposedFilter) {
        match self
            .composed_filters
            .iter_mut()
            .find(|p| p.id.is_some() && p.id == preset.id)
        {
            Some(existing) => *existing = preset,
            None => self.composed_filters.push(preset),
        }
    }

    /// Remove a preset, clearing the default pointer if it referenced it
    pub fn remove_preset(&mut self, id: i64) {
        self.composed_filters.retain(|p| p.id != Some(id));
        if self.default_filter_id == Some(id) {
            self.default_filter_id = None;
        }
    }
}

/// A search result item. Never mutated once received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SportEvent {
    pub id: i64,
    pub sport_name: String,
    pub event_name: String,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub description: Option<String>,
    pub location: String,
    pub member_count: u32,
    pub team_name: Option<String>,
    pub programs: Vec<String>,
    pub disciplines: Vec<String>,
    pub performer: Option<String>,
    pub ekp: String,
}

/// Search response item as sent by the server
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSportEvent {
    pub id: i64,
    pub calendar_sport_name: Option<String>,
    pub calendar_sport_type_name: Option<String>,
    pub date_from: DateTime<Utc>,
    pub date_to: DateTime<Utc>,
    pub description: Option<String>,
    pub location: String,
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub program_info_list: Vec<NamedValue>,
    #[serde(default)]
    pub discipline_info_list: Vec<NamedValue>,
    #[serde(default)]
    pub performer: Option<String>,
    pub count: u32,
    pub ekp: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedValue {
    pub id: i64,
    pub name: String,
}

fn single_line(text: &str) -> String {
    text.replace('\n', " ").trim().to_string()
}

fn server_date(instant: DateTime<Utc>) -> NaiveDate {
    (instant + Duration::hours(SERVER_UTC_OFFSET_HOURS)).date_naive()
}

impl From<RawSportEvent> for SportEvent {
    fn from(raw: RawSportEvent) -> Self {
        SportEvent {
            id: raw.id,
            sport_name: raw
                .calendar_sport_name
                .as_deref()
                .map(single_line)
                .unwrap_or_else(|| UNNAMED_EVENT.to_string()),
            event_name: raw
                .calendar_sport_type_name
                .as_deref()
                .map(single_line)
                .unwrap_or_else(|| UNNAMED_EVENT.to_string()),
            date_from: server_date(raw.date_from),
            date_to: server_date(raw.date_to),
            description: raw.description.as_deref().map(single_line),
            location: single_line(&raw.location),
            member_count: raw.count,
            team_name: raw.team_name.as_deref().map(single_line),
            programs: raw.program_info_list.iter().map(|v| single_line(&v.name)).collect(),
            disciplines: raw
                .discipline_info_list
                .iter()
                .map(|v| single_line(&v.name))
                .collect(),
            performer: raw.performer.as_deref().map(single_line),
            ekp: raw.ekp,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;
    use crate::filter::FilterKind;

    #[test]
    fn test_preferences_defaults_for_missing_fields() {
        let prefs: UserPreferences = serde_json::from_str(r#"{"someFutureField": 1}"#).unwrap();

        assert!(prefs.notifications_enabled);
        assert!(prefs.composed_filters.is_empty());
        assert_eq!(prefs.auth_state(), AuthState::Anonymous);
    }

    #[test]
    fn test_auth_state() {
        let mut prefs = UserPreferences {
            auth_token: Some(GUEST_TOKEN.to_string()),
            ..Default::default()
        };
        assert_eq!(prefs.auth_state(), AuthState::Guest);

        prefs.auth_token = Some("jwt".to_string());
        assert_eq!(prefs.auth_state(), AuthState::Authenticated);
    }

    #[test]
    fn test_remove_preset_clears_default() {
        let mut prefs = UserPreferences::default();
        prefs.upsert_preset(ComposedFilter {
            id: Some(1),
            name: "a".to_string(),
            filters: vec![],
        });
        prefs.upsert_preset(ComposedFilter {
            id: Some(2),
            name: "b".to_string(),
            filters: vec![],
        });
        prefs.default_filter_id = Some(2);

        prefs.remove_preset(2);

        assert_eq!(prefs.composed_filters.len(), 1);
        assert_eq!(prefs.default_filter_id, None);
    }

    #[test]
    fn test_upsert_preset_keeps_position() {
        let mut prefs = UserPreferences::default();
        for (id, name) in [(1, "a"), (2, "b"), (3, "c")] {
            prefs.upsert_preset(ComposedFilter {
                id: Some(id),
                name: name.to_string(),
                filters: vec![],
            });
        }

        prefs.upsert_preset(ComposedFilter {
            id: Some(2),
            name: "renamed".to_string(),
            filters: vec![Filter::reference(FilterKind::TeamInfo, 9, "x").unwrap()],
        });

        let names: Vec<_> = prefs.composed_filters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "renamed", "c"]);
    }

    #[test]
    fn test_raw_event_normalization() {
        let raw: RawSportEvent = serde_json::from_value(json!({
            "id": 77,
            "calendarSportName": "Футбол\n",
            "calendarSportTypeName": null,
            "dateFrom": "2024-05-01T22:00:00Z",
            "dateTo": "2024-05-02T10:00:00Z",
            "description": "Первенство\nобласти",
            "location": " Брянск ",
            "teamName": "Сборная",
            "programInfoList": [{"id": 1, "name": "Основная"}],
            "disciplineInfoList": [],
            "count": 120,
            "ekp": "2024-001"
        }))
        .unwrap();

        let event = SportEvent::from(raw);

        assert_eq!(event.sport_name, "Футбол");
        assert_eq!(event.event_name, "Без имени");
        assert_eq!(event.date_from.to_string(), "2024-05-02");
        assert_eq!(event.date_to.to_string(), "2024-05-02");
        assert_eq!(event.description.as_deref(), Some("Первенство области"));
        assert_eq!(event.location, "Брянск");
        assert_eq!(event.programs, vec!["Основная"]);
    }
}
