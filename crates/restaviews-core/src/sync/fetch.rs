//! Network-first reads reconciled into the mirror.

use serde::Serialize;

use super::SyncEngine;
use crate::api::RestaurantApi;
use crate::catalog;
use crate::error::{Error, Result};
use crate::models::{PendingReview, Restaurant, RestaurantId, Review};
use crate::scheduler::ReplayScheduler;

/// Reviews for one restaurant: the server's (or mirror's) reviews plus the
/// ones still waiting in the outbox.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReviewListing {
    pub reviews: Vec<Review>,
    pub pending: Vec<PendingReview>,
}

impl<A: RestaurantApi, S: ReplayScheduler> SyncEngine<A, S> {
    /// One restaurant, preferring a pending local copy over the server's.
    pub async fn fetch_restaurant(&self, id: RestaurantId) -> Result<Restaurant> {
        match self.api.fetch_restaurant(id).await {
            Ok(fetched) => {
                let mut merged = self.settle_restaurants(vec![fetched.clone()]).await;
                Ok(merged.pop().unwrap_or(fetched))
            }
            Err(error) if error.is_remote_failure() => {
                tracing::warn!("Fetching restaurant {id} failed, using local mirror: {error}");
                self.store
                    .get_restaurant(id)
                    .await?
                    .ok_or_else(|| Error::NotFoundLocally(format!("restaurant {id}")))
            }
            Err(error) => Err(error),
        }
    }

    /// Every restaurant, reconciled per id.
    pub async fn fetch_restaurants(&self) -> Result<Vec<Restaurant>> {
        match self.api.fetch_restaurants().await {
            Ok(fetched) => Ok(self.settle_restaurants(fetched).await),
            Err(error) if error.is_remote_failure() => {
                tracing::warn!("Fetching restaurants failed, using local mirror: {error}");
                let mirrored = self.store.all_restaurants().await?;
                if mirrored.is_empty() {
                    return Err(Error::NotFoundLocally("restaurants".to_string()));
                }
                Ok(mirrored)
            }
            Err(error) => Err(error),
        }
    }

    /// Every review the server knows, reconciled per id.
    pub async fn fetch_reviews(&self) -> Result<Vec<Review>> {
        match self.api.fetch_all_reviews().await {
            Ok(fetched) => {
                let outcome = self.store.reconcile_reviews(fetched.clone()).await;
                Ok(merged_or(outcome, fetched))
            }
            Err(error) if error.is_remote_failure() => {
                tracing::warn!("Fetching reviews failed, using local mirror: {error}");
                let mirrored = self.store.all_reviews().await?;
                if mirrored.is_empty() {
                    return Err(Error::NotFoundLocally("reviews".to_string()));
                }
                Ok(mirrored)
            }
            Err(error) => Err(error),
        }
    }

    /// Reviews for a restaurant plus those queued offline for it.
    ///
    /// A restaurant with no reviews is normal, so an empty mirror is not an
    /// error here.
    pub async fn reviews_for_restaurant(&self, restaurant_id: RestaurantId) -> Result<ReviewListing> {
        let reviews = match self.api.fetch_reviews(restaurant_id).await {
            Ok(fetched) => {
                let outcome = self.store.reconcile_reviews(fetched.clone()).await;
                merged_or(outcome, fetched)
            }
            Err(error) if error.is_remote_failure() => {
                tracing::warn!(
                    "Fetching reviews for restaurant {restaurant_id} failed, using local mirror: {error}"
                );
                self.store.reviews_by_restaurant(restaurant_id).await?
            }
            Err(error) => return Err(error),
        };

        let pending = self
            .store
            .pending_reviews_for_restaurant(restaurant_id)
            .await?;
        Ok(ReviewListing { reviews, pending })
    }

    /// Restaurants matching a cuisine and neighborhood; `"all"` or `None`
    /// matches everything.
    pub async fn restaurants_by_cuisine_and_neighborhood(
        &self,
        cuisine: Option<&str>,
        neighborhood: Option<&str>,
    ) -> Result<Vec<Restaurant>> {
        let restaurants = self.fetch_restaurants().await?;
        Ok(catalog::filter_restaurants(restaurants, cuisine, neighborhood))
    }

    /// Reconcile fetched restaurants. If the mirror cannot take them, the
    /// caller still sees any pending local change over the server's copy.
    async fn settle_restaurants(&self, fetched: Vec<Restaurant>) -> Vec<Restaurant> {
        match self.store.reconcile_restaurants(fetched.clone()).await {
            Ok(merged) => merged,
            Err(error) => {
                tracing::warn!("Could not reconcile fetched restaurants into mirror: {error}");
                self.overlay_pending(fetched).await
            }
        }
    }

    async fn overlay_pending(&self, mut fetched: Vec<Restaurant>) -> Vec<Restaurant> {
        let pending: Vec<Restaurant> = match self.store.all_restaurants().await {
            Ok(mirrored) => mirrored.into_iter().filter(|r| r.awaiting_sync).collect(),
            Err(error) => {
                tracing::warn!("Mirror unreadable, showing server copies only: {error}");
                return fetched;
            }
        };

        for record in &mut fetched {
            if let Some(local) = pending.iter().find(|local| local.id == record.id) {
                record.clone_from(local);
            }
        }
        fetched
    }
}

/// Reviews to hand back after reconciling. Reviews carry no pending state in
/// the mirror, so on a mirror failure `fetched` is returned as-is.
fn merged_or<T>(outcome: Result<Vec<T>>, fetched: Vec<T>) -> Vec<T> {
    outcome.unwrap_or_else(|error| {
        tracing::warn!("Could not reconcile fetched records into mirror: {error}");
        fetched
    })
}
