use serde::{Deserialize, Serialize};

/// Role assigned to accounts created from the client
const USER_ROLE_ID: i64 = 2;

/// Most list endpoints wrap their payload in `data`
#[derive(Debug, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub login: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest<'a> {
    pub login: &'a str,
    pub password: &'a str,
    pub id_role: i64,
    pub email: &'a str,
}

impl<'a> RegistrationRequest<'a> {
    /// The login doubles as the e-mail address
    pub fn new(login: &'a str, password: &'a str) -> Self {
        RegistrationRequest {
            login,
            password,
            id_role: USER_ROLE_ID,
            email: login,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct SavePresetRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: &'a str,
    pub value: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct SavePresetResponse {
    pub id: i64,
}

/// Reminder subscription for one event, sent to the notification service
#[derive(Debug, Serialize)]
pub struct NotificationRequest<'a> {
    pub user: i64,
    pub calendar_sport_info: i64,
    pub name: &'a str,
    pub event_info: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct NotificationResponse {
    pub id: i64,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    #[test]
    fn test_registration_body() {
        let body = serde_json::to_value(RegistrationRequest::new("ivan@example.org", "pw")).unwrap();

        assert_eq!(
            body,
            json!({
                "login": "ivan@example.org",
                "password": "pw",
                "idRole": 2,
                "email": "ivan@example.org"
            })
        );
    }

    #[test]
    fn test_save_body_omits_missing_id() {
        let body = serde_json::to_value(SavePresetRequest {
            id: None,
            name: "Футбол",
            value: "[]",
        })
        .unwrap();

        assert_eq!(body, json!({ "name": "Футбол", "value": "[]" }));
    }

    #[test]
    fn test_notification_body_keeps_snake_case() {
        let body = serde_json::to_value(NotificationRequest {
            user: -1,
            calendar_sport_info: 2,
            name: "Первенство области",
            event_info: "Хоккей",
        })
        .unwrap();

        assert_eq!(
            body,
            json!({
                "user": -1,
                "calendar_sport_info": 2,
                "name": "Первенство области",
                "event_info": "Хоккей"
            })
        );
    }
}
