#![deny(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

pub mod active_set;
pub mod codec;
pub mod db;
pub mod error;
pub mod favourites;
pub mod filter;
pub mod models;
pub mod paginator;
pub mod query;
pub mod reference;
pub mod remote;
pub mod schema;
pub mod store;

// Re-export commonly used types
pub use active_set::ActiveFilterSet;
pub use db::{open_db, PreferencesStore, SqlitePreferences};
pub use error::{Error, Result};
pub use filter::{Filter, FilterKey, FilterKind, Selection};
pub use models::{AuthState, ComposedFilter, SportEvent, UserPreferences};
pub use paginator::{PageOutcome, PageState, Paginator};
pub use query::{translate, QueryOptions, SearchRequest};
pub use reference::ReferenceDirectory;
pub use remote::{
    NotificationService, PresetService, ReferenceService, RemoteError, RemoteErrorKind,
    SearchService,
};
pub use store::{ComposedFilterStore, Editing};
