//! Mutation intents: favorite toggles and new reviews.
//!
//! With a scheduler attached, a mutation is written to the outbox, the mirror
//! is updated optimistically (favorites only), and a replay is requested.
//! The caller gets an acknowledgment as soon as that is durable. When any
//! queue step fails, the just-queued entry is withdrawn (a favorite toggle it
//! replaced is put back) and the mutation is delivered directly instead.
//! Without a scheduler, delivery is always direct and failures go back to
//! the caller.

use serde::Serialize;

use super::SyncEngine;
use crate::api::RestaurantApi;
use crate::error::Result;
use crate::models::{
    NewReview, PendingFavorite, PendingReview, Restaurant, RestaurantId, Review, SyncTag,
};
use crate::scheduler::ReplayScheduler;
use crate::util::iso_timestamp_now;

/// Acknowledgment for [`SyncEngine::set_favorite`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "restaurant", rename_all = "snake_case")]
pub enum FavoriteAck {
    /// Queued for replay. Carries the optimistically updated mirror record,
    /// or `None` when the restaurant has never been mirrored.
    Queued(Option<Restaurant>),
    /// Confirmed by the server
    Delivered(Restaurant),
}

/// Acknowledgment for [`SyncEngine::add_review`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "review", rename_all = "snake_case")]
pub enum ReviewAck {
    Queued(PendingReview),
    Delivered(Review),
}

impl<A: RestaurantApi, S: ReplayScheduler> SyncEngine<A, S> {
    /// Mark or unmark a restaurant as favorite.
    pub async fn set_favorite(&self, id: RestaurantId, is_favorite: bool) -> Result<FavoriteAck> {
        let Some(scheduler) = &self.scheduler else {
            return self.deliver_favorite(id, is_favorite).await;
        };

        let earlier = match self.store.pending_favorite(id).await {
            Ok(earlier) => earlier,
            Err(error) => {
                tracing::warn!("Could not read outbox for restaurant {id}, sending now: {error}");
                return self.deliver_favorite_instead(id, is_favorite, None).await;
            }
        };

        if let Err(error) = self.store.enqueue_favorite(id, is_favorite).await {
            tracing::warn!("Could not queue favorite for restaurant {id}, sending now: {error}");
            return self
                .deliver_favorite_instead(id, is_favorite, earlier.as_ref())
                .await;
        }

        match self.apply_queued_favorite(scheduler, id, is_favorite).await {
            Ok(updated) => {
                if updated.is_none() {
                    tracing::debug!("Restaurant {id} not mirrored; skipped optimistic update");
                }
                Ok(FavoriteAck::Queued(updated))
            }
            Err(error) => {
                tracing::warn!("Queueing favorite for restaurant {id} failed, sending now: {error}");
                self.withdraw_favorite(id, earlier.as_ref()).await;
                self.deliver_favorite_instead(id, is_favorite, earlier.as_ref())
                    .await
            }
        }
    }

    /// Undo this call's enqueue: put back the toggle it replaced, or drop the
    /// entry when there was none.
    async fn withdraw_favorite(&self, id: RestaurantId, earlier: Option<&PendingFavorite>) {
        let outcome = match earlier {
            Some(earlier) => self.store.requeue_favorite(earlier).await,
            None => self.store.remove_pending_favorite(id).await.map(|_| ()),
        };
        if let Err(error) = outcome {
            // A leftover entry only re-sends the same state later.
            tracing::warn!("Could not withdraw queued favorite for {id}: {error}");
        }
    }

    /// Direct delivery after the queue path failed. The toggle queued before
    /// this one stays in the outbox until the server confirms the newer
    /// state, and replay is held off meanwhile so it cannot be sent last.
    async fn deliver_favorite_instead(
        &self,
        id: RestaurantId,
        is_favorite: bool,
        earlier: Option<&PendingFavorite>,
    ) -> Result<FavoriteAck> {
        let _guard = self.replay_lock(SyncTag::Favorites).lock().await;
        let ack = self.deliver_favorite(id, is_favorite).await?;
        if let Some(earlier) = earlier {
            if let Err(error) = self.store.remove_pending_favorite_if_current(earlier).await {
                tracing::warn!("Superseded favorite for {id} is still queued: {error}");
            }
        }
        Ok(ack)
    }

    /// Optimistic mirror write, then the replay request. The mirror is
    /// written first so a replay that starts right away cannot be overtaken
    /// by it; if scheduling fails the previous record is put back.
    async fn apply_queued_favorite(
        &self,
        scheduler: &S,
        id: RestaurantId,
        is_favorite: bool,
    ) -> Result<Option<Restaurant>> {
        let previous = self.store.get_restaurant(id).await?;
        let updated = self
            .store
            .mark_favorite_pending(id, is_favorite, iso_timestamp_now())
            .await?;

        if let Err(error) = scheduler.request_replay(SyncTag::Favorites) {
            if let Some(previous) = &previous {
                if let Err(restore) = self.store.put_restaurant(previous).await {
                    tracing::warn!("Could not restore mirror for restaurant {id}: {restore}");
                }
            }
            return Err(error);
        }
        Ok(updated)
    }

    /// Submit a new review.
    pub async fn add_review(&self, review: NewReview) -> Result<ReviewAck> {
        let Some(scheduler) = &self.scheduler else {
            return self.deliver_review(&review).await;
        };

        let pending = match self.store.enqueue_review(&review).await {
            Ok(pending) => pending,
            Err(error) => {
                tracing::warn!(
                    "Could not queue review for restaurant {}, sending now: {error}",
                    review.restaurant_id
                );
                return self.deliver_review(&review).await;
            }
        };

        match scheduler.request_replay(SyncTag::Reviews) {
            Ok(()) => Ok(ReviewAck::Queued(pending)),
            Err(error) => {
                tracing::warn!(
                    "Could not schedule review {}, sending now: {error}",
                    pending.local_id
                );
                // If the entry cannot be withdrawn it stays queued; posting it
                // now as well would submit it twice.
                self.store.remove_pending_review(pending.local_id).await?;
                self.deliver_review(&review).await
            }
        }
    }

    async fn deliver_favorite(&self, id: RestaurantId, is_favorite: bool) -> Result<FavoriteAck> {
        let confirmed = self.api.set_favorite(id, is_favorite).await?;
        if let Err(error) = self.store.put_restaurant(&confirmed).await {
            tracing::warn!("Favorite for restaurant {id} delivered but not mirrored: {error}");
        }
        Ok(FavoriteAck::Delivered(confirmed))
    }

    async fn deliver_review(&self, review: &NewReview) -> Result<ReviewAck> {
        let confirmed = self.api.post_review(review).await?;
        if let Err(error) = self.store.put_review(&confirmed).await {
            tracing::warn!(
                "Review for restaurant {} delivered but not mirrored: {error}",
                review.restaurant_id
            );
        }
        Ok(ReviewAck::Delivered(confirmed))
    }
}
