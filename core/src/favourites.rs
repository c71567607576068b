use tracing::{debug, warn};

use crate::db::{add_favourite, remove_favourite, PreferencesStore};
use crate::error::Result;
use crate::models::SportEvent;
use crate::remote::NotificationService;

/// Sent as the subscriber when the session has no account
const UNKNOWN_USER_ID: i64 = -1;

/// Subscribe to reminders for `event`, then remember it together with the
/// subscription id. Nothing is stored when the subscription fails.
///
/// An event that is already a favourite is left alone and its stored
/// subscription id, if any, is returned.
pub async fn star(
    remote: &impl NotificationService,
    prefs: &impl PreferencesStore,
    event: &SportEvent,
) -> Result<Option<i64>> {
    let current = prefs.read()?;
    if current.favourites.iter().any(|f| f.id == event.id) {
        debug!(event = event.id, "Event already starred");
        return Ok(current.subscriptions.get(&event.id).copied());
    }

    let user = current.user_id.unwrap_or(UNKNOWN_USER_ID);
    let subscription_id = remote.subscribe(user, event).await.map_err(|e| {
        warn!(event = event.id, error = %e, "Subscription failed");
        e
    })?;

    add_favourite(prefs, event, Some(subscription_id))?;
    debug!(event = event.id, subscription_id, "Event starred");
    Ok(Some(subscription_id))
}

/// Cancel the event's subscription, then forget the favourite. A failed
/// cancellation keeps both. Returns whether the event was a favourite.
pub async fn unstar(
    remote: &impl NotificationService,
    prefs: &impl PreferencesStore,
    event_id: i64,
) -> Result<bool> {
    let current = prefs.read()?;
    if !current.favourites.iter().any(|f| f.id == event_id) {
        return Ok(false);
    }

    if let Some(subscription_id) = current.subscriptions.get(&event_id) {
        remote.unsubscribe(*subscription_id).await.map_err(|e| {
            warn!(event = event_id, error = %e, "Unsubscribe failed");
            e
        })?;
    }

    remove_favourite(prefs, event_id)
}
