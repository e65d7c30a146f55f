//! Offline-first sync engine.
//!
//! Reads go network first and are reconciled into the mirror, falling back
//! to the mirror when the server cannot be reached. Writes go through the
//! outbox when a scheduler is attached and are replayed later; otherwise they
//! are delivered directly. Store locks are never held across a network call.

mod fetch;
mod intent;
mod replay;

#[cfg(test)]
pub(crate) mod fake;

pub use fetch::ReviewListing;
pub use intent::{FavoriteAck, ReviewAck};
pub use replay::{ReplayFailure, ReplayReport, ReplaySummary};

use tokio::sync::Mutex;

use crate::api::RestaurantApi;
use crate::models::SyncTag;
use crate::scheduler::{NoScheduler, ReplayScheduler};
use crate::services::StoreService;

/// Fetch-and-reconcile, replay, and mutation intents over one store.
pub struct SyncEngine<A, S = NoScheduler> {
    api: A,
    store: StoreService,
    scheduler: Option<S>,
    favorites_replay: Mutex<()>,
    reviews_replay: Mutex<()>,
}

impl<A: RestaurantApi> SyncEngine<A, NoScheduler> {
    /// Engine without deferred delivery: every mutation goes straight to the
    /// server.
    pub fn new(api: A, store: StoreService) -> Self {
        Self {
            api,
            store,
            scheduler: None,
            favorites_replay: Mutex::new(()),
            reviews_replay: Mutex::new(()),
        }
    }
}

impl<A: RestaurantApi, S: ReplayScheduler> SyncEngine<A, S> {
    /// Attach a scheduler, switching mutations to the queue-first path.
    pub fn with_scheduler<T: ReplayScheduler>(self, scheduler: T) -> SyncEngine<A, T> {
        SyncEngine {
            api: self.api,
            store: self.store,
            scheduler: Some(scheduler),
            favorites_replay: self.favorites_replay,
            reviews_replay: self.reviews_replay,
        }
    }

    pub const fn store(&self) -> &StoreService {
        &self.store
    }

    pub const fn api(&self) -> &A {
        &self.api
    }

    pub const fn scheduler(&self) -> Option<&S> {
        self.scheduler.as_ref()
    }

    /// Whether mutations are queued for deferred replay.
    pub const fn can_defer(&self) -> bool {
        self.scheduler.is_some()
    }

    const fn replay_lock(&self, kind: SyncTag) -> &Mutex<()> {
        match kind {
            SyncTag::Favorites => &self.favorites_replay,
            SyncTag::Reviews => &self.reviews_replay,
        }
    }
}
