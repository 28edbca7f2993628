use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use pricewatch_core::{MatchResult, NormalizedProduct, NotificationRecord, PreferenceStore, UserId};

use crate::notify::{format_match_message, Notifier};

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationOutcome {
    Sent(NormalizedProduct),
    NoMatch,
    DeliveryFailed,
    /// The user's slot for this cycle was already claimed.
    Suppressed,
}

/// Allows at most one delivery attempt per user for the lifetime of the
/// gate. The orchestrator builds one gate per cycle.
pub struct NotificationGate {
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn PreferenceStore>,
    claimed: Mutex<HashSet<UserId>>,
}

impl NotificationGate {
    pub fn new(notifier: Arc<dyn Notifier>, store: Arc<dyn PreferenceStore>) -> Self {
        Self {
            notifier,
            store,
            claimed: Mutex::new(HashSet::new()),
        }
    }

    /// Atomically takes the user's slot. `false` if it was already taken.
    fn claim(&self, user_id: UserId) -> bool {
        self.claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user_id)
    }

    /// Sends the cheapest match, if any. A failed delivery keeps the slot
    /// claimed, so the user is retried next cycle rather than this one.
    pub async fn notify(&self, user_id: UserId, matches: &MatchResult) -> NotificationOutcome {
        let Some(best) = matches.best() else {
            return NotificationOutcome::NoMatch;
        };
        if !self.claim(user_id) {
            tracing::debug!(user_id, "notification slot already used this cycle");
            return NotificationOutcome::Suppressed;
        }

        let message = format_match_message(best);
        if let Err(e) = self.notifier.send(user_id, &message).await {
            if e.is_recipient_gone() {
                tracing::info!(user_id, error = %e, "subscriber unreachable");
            } else {
                tracing::warn!(user_id, error = %e, "notification delivery failed");
            }
            return NotificationOutcome::DeliveryFailed;
        }

        let record = NotificationRecord {
            user_id,
            notified_at: Utc::now(),
        };
        if let Err(e) = self.store.record_notification(&record).await {
            tracing::warn!(user_id, error = %e, "failed to record notification");
        }
        NotificationOutcome::Sent(best.clone())
    }
}
