use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filter::{Filter, FilterKind};
use crate::models::SportEvent;
use crate::query::SearchRequest;
use crate::reference::ReferenceDirectory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    /// Connection refused, DNS failure, dropped connection
    Unreachable,
    /// Credentials or token rejected
    Unauthorized,
    Server,
    Timeout,
    Other,
}

/// A failed call to any remote endpoint
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    /// Transport status code, when the server answered at all
    pub status: Option<u16>,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        RemoteError {
            kind,
            status: None,
            message: message.into(),
        }
    }

    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Unreachable, message)
    }

    /// Maps a non-success HTTP status to a human-readable cause
    pub fn from_status(status: u16) -> Self {
        let (kind, message) = match status {
            401 => (RemoteErrorKind::Unauthorized, "Wrong login or password".to_string()),
            403 => (RemoteErrorKind::Unauthorized, "Access denied".to_string()),
            404 => (RemoteErrorKind::Other, "Nothing found".to_string()),
            408 => (RemoteErrorKind::Timeout, "Slow connection".to_string()),
            500..=504 => (RemoteErrorKind::Server, "Server error".to_string()),
            other => (RemoteErrorKind::Other, format!("Request failed with status {}", other)),
        };

        RemoteError {
            kind,
            status: Some(status),
            message,
        }
    }
}

/// A preset as the remote service stores it: the filter list is an opaque string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePreset {
    pub id: i64,
    pub name: String,
    #[serde(rename = "value")]
    pub encoded_filters: String,
}

#[async_trait]
pub trait SearchService: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SportEvent>, RemoteError>;
}

#[async_trait]
pub trait PresetService: Send + Sync {
    /// Stores a new preset and returns the id assigned by the server
    async fn save(&self, name: &str, encoded_filters: &str) -> Result<i64, RemoteError>;

    async fn update(&self, id: i64, name: &str, encoded_filters: &str) -> Result<(), RemoteError>;

    async fn delete(&self, id: i64) -> Result<(), RemoteError>;

    /// Presets owned by the signed-in identity
    async fn list_mine(&self) -> Result<Vec<RemotePreset>, RemoteError>;
}

/// Typeahead and directory access to reference data
#[async_trait]
pub trait ReferenceService: Send + Sync {
    async fn lookup(&self, kind: FilterKind, name: &str) -> crate::Result<Vec<Filter>>;

    async fn directory(&self) -> crate::Result<ReferenceDirectory>;
}

/// Event reminders, kept by a separate notification service
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Subscribes `user` to reminders for `event` and returns the subscription id
    async fn subscribe(&self, user: i64, event: &SportEvent) -> Result<i64, RemoteError>;

    async fn unsubscribe(&self, subscription_id: i64) -> Result<(), RemoteError>;
}

#[async_trait]
impl<T: SearchService + ?Sized> SearchService for &T {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SportEvent>, RemoteError> {
        (**self).search(request).await
    }
}

#[async_trait]
impl<T: PresetService + ?Sized> PresetService for &T {
    async fn save(&self, name: &str, encoded_filters: &str) -> Result<i64, RemoteError> {
        (**self).save(name, encoded_filters).await
    }

    async fn update(&self, id: i64, name: &str, encoded_filters: &str) -> Result<(), RemoteError> {
        (**self).update(id, name, encoded_filters).await
    }

    async fn delete(&self, id: i64) -> Result<(), RemoteError> {
        (**self).delete(id).await
    }

    async fn list_mine(&self) -> Result<Vec<RemotePreset>, RemoteError> {
        (**self).list_mine().await
    }
}

#[async_trait]
impl<T: ReferenceService + ?Sized> ReferenceService for &T {
    async fn lookup(&self, kind: FilterKind, name: &str) -> crate::Result<Vec<Filter>> {
        (**self).lookup(kind, name).await
    }

    async fn directory(&self) -> crate::Result<ReferenceDirectory> {
        (**self).directory().await
    }
}

#[async_trait]
impl<T: NotificationService + ?Sized> NotificationService for &T {
    async fn subscribe(&self, user: i64, event: &SportEvent) -> Result<i64, RemoteError> {
        (**self).subscribe(user, event).await
    }

    async fn unsubscribe(&self, subscription_id: i64) -> Result<(), RemoteError> {
        (**self).unsubscribe(subscription_id).await
    }
}
