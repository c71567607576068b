use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use sportcal_core::{
    codec,
    models::{RawSportEvent, GUEST_TOKEN},
    remote::RemotePreset,
    Filter, FilterKind, NotificationService, PresetService, ReferenceDirectory, ReferenceService, RemoteError,
    RemoteErrorKind, SearchRequest, SearchService, SportEvent,
};
use tracing::{debug, warn};

use crate::model::{
    DataEnvelope, LoginRequest, LoginResponse, NotificationRequest, NotificationResponse,
    RegistrationRequest, SavePresetRequest, SavePresetResponse,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP binding of the calendar API
#[derive(Clone)]
pub struct WebClient {
    client: Client,
    base_url: String,
    notifications_base_url: String,
    token: Option<String>,
}

impl WebClient {
    pub fn new(base_url: &str, token: Option<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        let base_url = base_url.trim_end_matches('/').to_string();
        Ok(WebClient {
            client,
            notifications_base_url: base_url.clone(),
            base_url,
            token,
        })
    }

    /// Reminders are served from their own host
    pub fn with_notifications_url(mut self, url: &str) -> Self {
        self.notifications_base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn notifications_url(&self, path: &str) -> String {
        format!("{}{}", self.notifications_base_url, path)
    }

    /// Guest sessions carry a token that the server must never see
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token.as_deref() {
            Some(token) if token != GUEST_TOKEN => request.bearer_auth(token),
            _ => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), url = %response.url(), "Request failed");
            return Err(RemoteError::from_status(status.as_u16()));
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RemoteError> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| RemoteError::new(RemoteErrorKind::Other, format!("Unexpected response: {}", e)))
    }

    pub async fn login(&self, login: &str, password: &str) -> Result<LoginResponse, RemoteError> {
        let request = self
            .client
            .post(self.url("/auth/authentication"))
            .json(&LoginRequest { login, password });

        self.send_json(request).await
    }

    pub async fn register(&self, login: &str, password: &str) -> Result<LoginResponse, RemoteError> {
        let request = self
            .client
            .post(self.url("/auth/registration"))
            .json(&RegistrationRequest::new(login, password));

        self.send_json(request).await
    }
}

fn transport_error(error: reqwest::Error) -> RemoteError {
    if error.is_timeout() {
        RemoteError::new(RemoteErrorKind::Timeout, "Slow connection")
    } else if error.is_connect() {
        RemoteError::unreachable("Connection lost")
    } else {
        RemoteError::new(RemoteErrorKind::Other, error.to_string())
    }
}

/// Path segment of the name lookup endpoint for a reference kind
fn lookup_segment(kind: FilterKind) -> Option<&'static str> {
    match kind {
        FilterKind::SexCategory => Some("sex-category"),
        FilterKind::TeamInfo => Some("team-info"),
        FilterKind::AgeCategory => Some("age-category"),
        FilterKind::SportCategory => Some("calendar-sport"),
        FilterKind::SportTypeCategory => Some("calendar-sport-type"),
        FilterKind::DisciplineInfo => Some("do"),
        FilterKind::ProgramInfo => Some("program-info"),
        FilterKind::DateRange | FilterKind::MemberCountRange => None,
    }
}

#[async_trait]
impl SearchService for WebClient {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SportEvent>, RemoteError> {
        debug!(page = request.page, size = request.size, "Searching events");
        let response: DataEnvelope<Vec<RawSportEvent>> = self
            .send_json(
                self.client
                    .post(self.url("/calendar/get-calendar-sport-info-by-filter"))
                    .json(request),
            )
            .await?;

        Ok(response.data.into_iter().map(SportEvent::from).collect())
    }
}

#[async_trait]
impl PresetService for WebClient {
    async fn save(&self, name: &str, encoded_filters: &str) -> Result<i64, RemoteError> {
        let body = SavePresetRequest {
            id: None,
            name,
            value: encoded_filters,
        };
        let response: SavePresetResponse = self
            .send_json(self.client.post(self.url("/user/save-filter")).json(&body))
            .await?;

        Ok(response.id)
    }

    async fn update(&self, id: i64, name: &str, encoded_filters: &str) -> Result<(), RemoteError> {
        let body = SavePresetRequest {
            id: Some(id),
            name,
            value: encoded_filters,
        };
        self.send(self.client.put(self.url("/user/update-filter")).json(&body))
            .await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), RemoteError> {
        self.send(
            self.client
                .delete(self.url("/user/delete-filter-by-id"))
                .query(&[("id", id)]),
        )
        .await?;
        Ok(())
    }

    async fn list_mine(&self) -> Result<Vec<RemotePreset>, RemoteError> {
        let response: DataEnvelope<Vec<RemotePreset>> = self
            .send_json(self.client.get(self.url("/user/get-all-my-filter")))
            .await?;

        Ok(response.data)
    }
}

#[async_trait]
impl ReferenceService for WebClient {
    async fn lookup(&self, kind: FilterKind, name: &str) -> sportcal_core::Result<Vec<Filter>> {
        let segment = lookup_segment(kind).ok_or_else(|| {
            sportcal_core::Error::MalformedFilter(format!("{} cannot be looked up by name", kind))
        })?;

        let payload: Value = self
            .send_json(
                self.client
                    .get(self.url(&format!("/shared/get-all-{}-by-name", segment)))
                    .query(&[("name", name)]),
            )
            .await?;

        codec::decode_reference_candidates(kind, &payload)
    }

    async fn directory(&self) -> sportcal_core::Result<ReferenceDirectory> {
        Ok(self
            .send_json(self.client.get(self.url("/shared/get-all-directory")))
            .await?)
    }
}

#[async_trait]
impl NotificationService for WebClient {
    async fn subscribe(&self, user: i64, event: &SportEvent) -> Result<i64, RemoteError> {
        debug!(event = event.id, user, "Subscribing to reminders");
        let body = NotificationRequest {
            user,
            calendar_sport_info: event.id,
            name: &event.event_name,
            event_info: &event.sport_name,
        };
        let response: NotificationResponse = self
            .send_json(
                self.client
                    .post(self.notifications_url("/notifications"))
                    .json(&body),
            )
            .await?;

        Ok(response.id)
    }

    async fn unsubscribe(&self, subscription_id: i64) -> Result<(), RemoteError> {
        debug!(subscription_id, "Cancelling reminders");
        self.send(
            self.client
                .delete(self.notifications_url(&format!("/notifications/{}", subscription_id))),
        )
        .await?;
        Ok(())
    }
}
