use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::{stream, FutureExt, StreamExt};
use pricewatch_core::{PreferenceStore, Subscription, Target};
use pricewatch_scraper::{scan, ExtractContext, ListingSource, Scan, ScraperError};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use super::gate::{NotificationGate, NotificationOutcome};
use crate::notify::Notifier;

/// What happened to one subscriber during a cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum UserOutcome {
    Notification(NotificationOutcome),
    Empty,
    Blocked,
    ServerError,
    Malformed,
    NetworkError,
    /// The target cannot be turned into a request, e.g. a category that
    /// left the catalog.
    InvalidTarget,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub users: usize,
    pub sent: usize,
    pub no_match: usize,
    pub blocked: usize,
    pub empty: usize,
    pub malformed: usize,
    pub server_errors: usize,
    pub network_errors: usize,
    pub invalid_targets: usize,
    pub delivery_failed: usize,
    pub suppressed: usize,
    pub crashed: usize,
}

impl CycleStats {
    fn tally(&mut self, outcome: &UserOutcome) {
        match outcome {
            UserOutcome::Notification(NotificationOutcome::Sent(_)) => self.sent += 1,
            UserOutcome::Notification(NotificationOutcome::NoMatch) => self.no_match += 1,
            UserOutcome::Notification(NotificationOutcome::DeliveryFailed) => {
                self.delivery_failed += 1;
            }
            UserOutcome::Notification(NotificationOutcome::Suppressed) => self.suppressed += 1,
            UserOutcome::Empty => self.empty += 1,
            UserOutcome::Blocked => self.blocked += 1,
            UserOutcome::ServerError => self.server_errors += 1,
            UserOutcome::Malformed => self.malformed += 1,
            UserOutcome::NetworkError => self.network_errors += 1,
            UserOutcome::InvalidTarget => self.invalid_targets += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleReport {
    /// Another cycle was still running when this one was triggered.
    Skipped,
    /// The subscriber list could not be read; nobody was checked.
    StoreUnavailable,
    Completed(CycleStats),
}

/// Drives one pass over every subscription: fetch, scan, notify.
///
/// Cycles never overlap. Subscribers within a cycle are checked with
/// bounded concurrency, each behind its own failure boundary.
pub struct Orchestrator {
    store: Arc<dyn PreferenceStore>,
    source: Arc<dyn ListingSource>,
    notifier: Arc<dyn Notifier>,
    extract: ExtractContext,
    max_concurrent_users: usize,
    running: Mutex<()>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn PreferenceStore>,
        source: Arc<dyn ListingSource>,
        notifier: Arc<dyn Notifier>,
        extract: ExtractContext,
        max_concurrent_users: usize,
    ) -> Self {
        Self {
            store,
            source,
            notifier,
            extract,
            max_concurrent_users: max_concurrent_users.max(1),
            running: Mutex::new(()),
        }
    }

    /// Fetches `target` and scans the response against `threshold`.
    ///
    /// The scan is synchronous and runs after the fetch completes, so no
    /// parsed document is held across an await point.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError`] if no response could be obtained.
    pub async fn check_target(
        &self,
        target: &Target,
        threshold: Decimal,
    ) -> Result<Scan, ScraperError> {
        let raw = self.source.fetch(target).await?;
        Ok(scan(&raw, threshold, &self.extract))
    }

    /// Runs one cycle. Never fails: every per-user problem is logged and
    /// counted in the report.
    pub async fn run_cycle(&self) -> CycleReport {
        let Ok(_running) = self.running.try_lock() else {
            tracing::warn!("watch cycle still running; skipping this tick");
            return CycleReport::Skipped;
        };
        let started = Instant::now();

        let subscriptions = match self.store.list_subscriptions().await {
            Ok(subscriptions) => subscriptions,
            Err(e) => {
                tracing::error!(error = %e, "watch cycle: failed to list subscriptions");
                return CycleReport::StoreUnavailable;
            }
        };

        let gate = NotificationGate::new(Arc::clone(&self.notifier), Arc::clone(&self.store));
        let gate = &gate;
        let results: Vec<_> = stream::iter(subscriptions.iter().cloned())
            .map(move |sub| async move {
                let result = AssertUnwindSafe(self.check_user(&sub, gate))
                    .catch_unwind()
                    .await;
                (sub.user_id, result)
            })
            .buffer_unordered(self.max_concurrent_users)
            .collect()
            .await;

        let mut stats = CycleStats {
            users: subscriptions.len(),
            ..CycleStats::default()
        };
        for (user_id, result) in results {
            match result {
                Ok(outcome) => stats.tally(&outcome),
                Err(_) => {
                    tracing::error!(user_id, "watch cycle: user check panicked");
                    stats.crashed += 1;
                }
            }
        }

        tracing::info!(
            users = stats.users,
            sent = stats.sent,
            no_match = stats.no_match,
            blocked = stats.blocked,
            failed = stats.network_errors + stats.server_errors + stats.malformed,
            crashed = stats.crashed,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "watch cycle complete"
        );
        CycleReport::Completed(stats)
    }

    async fn check_user(&self, sub: &Subscription, gate: &NotificationGate) -> UserOutcome {
        let user_id = sub.user_id;
        let scan = match self.check_target(&sub.target, sub.threshold).await {
            Ok(scan) => scan,
            Err(e) if e.is_network() => {
                tracing::warn!(user_id, target = %sub.target, error = %e, "fetch failed");
                return UserOutcome::NetworkError;
            }
            Err(e) => {
                tracing::error!(user_id, target = %sub.target, error = %e, "cannot check target");
                return UserOutcome::InvalidTarget;
            }
        };

        let outcome = match scan {
            Scan::Checked { matches, extracted } => {
                tracing::debug!(
                    user_id,
                    extracted,
                    matches = matches.len(),
                    "listing scanned"
                );
                let outcome = gate.notify(user_id, &matches).await;
                if let NotificationOutcome::Sent(product) = &outcome {
                    tracing::info!(
                        user_id,
                        product = %product.name,
                        price = %product.price,
                        "notification sent"
                    );
                }
                UserOutcome::Notification(outcome)
            }
            Scan::Empty => UserOutcome::Empty,
            Scan::Blocked => {
                tracing::warn!(user_id, target = %sub.target, "anti-bot challenge instead of listing");
                UserOutcome::Blocked
            }
            Scan::ServerError { status } => {
                tracing::warn!(user_id, target = %sub.target, status, "marketplace error status");
                UserOutcome::ServerError
            }
            Scan::Malformed { reason } => {
                tracing::warn!(user_id, target = %sub.target, reason = %reason, "unexpected listing payload");
                UserOutcome::Malformed
            }
        };

        if let Err(e) = self.store.record_check(user_id, Utc::now()).await {
            tracing::warn!(user_id, error = %e, "failed to record check");
        }
        outcome
    }
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
