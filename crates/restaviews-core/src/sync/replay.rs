//! Draining the outbox.
//!
//! Each replay takes the per-kind lock, re-reads the outbox, and issues one
//! call per entry concurrently. Entries that succeed are committed (mirror
//! merge and outbox removal) independently, so a failing sibling never rolls
//! them back. Only entries still in the outbox are retried next time.

use futures::future::join_all;
use serde::Serialize;

use super::SyncEngine;
use crate::api::RestaurantApi;
use crate::error::{Error, Result};
use crate::models::{PendingFavorite, PendingReview, SyncTag};
use crate::scheduler::ReplayScheduler;

/// One outbox entry that is still pending after a replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayFailure {
    /// Restaurant id for favorites, local id for reviews
    pub key: i64,
    pub error: String,
    /// The server could not be reached at all
    pub offline: bool,
}

/// Outcome of replaying one outbox kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    pub kind: SyncTag,
    pub attempted: usize,
    pub delivered: usize,
    pub failures: Vec<ReplayFailure>,
}

impl ReplayReport {
    const fn empty(kind: SyncTag) -> Self {
        Self {
            kind,
            attempted: 0,
            delivered: 0,
            failures: Vec::new(),
        }
    }

    fn from_outcomes(kind: SyncTag, outcomes: Vec<(i64, Result<()>)>) -> Self {
        let mut report = Self::empty(kind);
        for (key, outcome) in outcomes {
            report.attempted += 1;
            match outcome {
                Ok(()) => report.delivered += 1,
                Err(error) => {
                    tracing::warn!("Replay of {kind} entry {key} failed, left queued: {error}");
                    report.failures.push(ReplayFailure {
                        key,
                        offline: matches!(error, Error::NetworkUnavailable(_)),
                        error: error.to_string(),
                    });
                }
            }
        }
        report
    }

    /// The outbox itself could not be read; nothing was attempted.
    pub(crate) fn outbox_unreadable(kind: SyncTag, error: &Error) -> Self {
        tracing::warn!("Could not read {kind} outbox: {error}");
        Self {
            kind,
            attempted: 0,
            delivered: 0,
            failures: vec![ReplayFailure {
                key: 0,
                error: error.to_string(),
                offline: false,
            }],
        }
    }

    /// Every attempted entry was delivered (vacuously true for an empty outbox).
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// The aggregate signal for a retry scheduler: `Err(ReplayIncomplete)`
    /// when any entry is still pending.
    pub fn ensure_complete(self) -> Result<Self> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(Error::ReplayIncomplete {
                kind: self.kind,
                attempted: self.attempted,
                failed: self.failures.len(),
            })
        }
    }
}

/// Outcome of replaying every outbox kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub favorites: ReplayReport,
    pub reviews: ReplayReport,
}

impl ReplaySummary {
    pub fn is_complete(&self) -> bool {
        self.favorites.is_complete() && self.reviews.is_complete()
    }

    pub fn delivered(&self) -> usize {
        self.favorites.delivered + self.reviews.delivered
    }

    pub fn failed(&self) -> usize {
        self.favorites.failures.len() + self.reviews.failures.len()
    }
}

impl<A: RestaurantApi, S: ReplayScheduler> SyncEngine<A, S> {
    /// Replay one outbox kind.
    pub async fn replay(&self, kind: SyncTag) -> Result<ReplayReport> {
        match kind {
            SyncTag::Favorites => self.replay_favorites().await,
            SyncTag::Reviews => self.replay_reviews().await,
        }
    }

    /// Send every queued favorite toggle.
    ///
    /// The server's response is mirrored (clearing `awaitingSync`) and the
    /// outbox entry removed in one transaction. A failed merge leaves the
    /// entry queued; re-sending a favorite is harmless. An entry replaced by
    /// a newer toggle while its PUT was in flight stays queued for the next
    /// replay.
    pub async fn replay_favorites(&self) -> Result<ReplayReport> {
        let _guard = self.replay_lock(SyncTag::Favorites).lock().await;
        let pending = self.store.pending_favorites().await?;
        if pending.is_empty() {
            tracing::debug!("No pending favorites to replay");
            return Ok(ReplayReport::empty(SyncTag::Favorites));
        }

        tracing::info!("Replaying {} pending favorites", pending.len());
        let outcomes = join_all(pending.iter().map(|entry| async move {
            (entry.restaurant_id, self.replay_favorite(entry).await)
        }))
        .await;

        let report = ReplayReport::from_outcomes(SyncTag::Favorites, outcomes);
        tracing::info!(
            "Favorites replay: {} of {} delivered",
            report.delivered,
            report.attempted
        );
        Ok(report)
    }

    async fn replay_favorite(&self, entry: &PendingFavorite) -> Result<()> {
        let confirmed = self
            .api
            .set_favorite(entry.restaurant_id, entry.is_favorite)
            .await?;
        if self.store.settle_favorite(entry, &confirmed).await? {
            tracing::debug!(
                "Delivered favorite={} for restaurant {}",
                entry.is_favorite,
                entry.restaurant_id
            );
        } else {
            tracing::debug!(
                "Favorite for restaurant {} changed while in flight; newer toggle stays queued",
                entry.restaurant_id
            );
        }
        Ok(())
    }

    /// POST every queued review.
    ///
    /// The outbox entry is removed as soon as the POST succeeds and before the
    /// mirror write, so a failing mirror can never cause a second submission.
    pub async fn replay_reviews(&self) -> Result<ReplayReport> {
        let _guard = self.replay_lock(SyncTag::Reviews).lock().await;
        let pending = self.store.pending_reviews().await?;
        if pending.is_empty() {
            tracing::debug!("No pending reviews to replay");
            return Ok(ReplayReport::empty(SyncTag::Reviews));
        }

        tracing::info!("Replaying {} pending reviews", pending.len());
        let outcomes = join_all(
            pending
                .iter()
                .map(|entry| async move { (entry.local_id, self.replay_review(entry).await) }),
        )
        .await;

        let report = ReplayReport::from_outcomes(SyncTag::Reviews, outcomes);
        tracing::info!(
            "Reviews replay: {} of {} delivered",
            report.delivered,
            report.attempted
        );
        Ok(report)
    }

    async fn replay_review(&self, entry: &PendingReview) -> Result<()> {
        let confirmed = self.api.post_review(&entry.review).await?;
        if !self.store.remove_pending_review(entry.local_id).await? {
            tracing::debug!("Review {} already left the outbox", entry.local_id);
        }

        if let Err(error) = self.store.put_review(&confirmed).await {
            tracing::warn!(
                "Review {} was delivered but could not be mirrored: {error}",
                entry.local_id
            );
        }
        Ok(())
    }

    /// Replay favorites, then reviews.
    ///
    /// A store failure for one kind is reported as a failed replay of that
    /// kind; the other kind still runs.
    pub async fn replay_all(&self) -> ReplaySummary {
        let favorites = self
            .replay_favorites()
            .await
            .unwrap_or_else(|error| ReplayReport::outbox_unreadable(SyncTag::Favorites, &error));
        let reviews = self
            .replay_reviews()
            .await
            .unwrap_or_else(|error| ReplayReport::outbox_unreadable(SyncTag::Reviews, &error));
        ReplaySummary { favorites, reviews }
    }
}
