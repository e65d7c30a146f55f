//! Shared store service wrapping the mirror and outbox repositories.
//!
//! Every method takes the lock, runs one short transaction, and releases it.
//! Callers never hold the lock across a network call.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::db::{
    Database, LibSqlMirrorRepository, LibSqlOutboxRepository, MirrorRepository, OutboxRepository,
    RestaurantTable, ReviewTable,
};
use crate::models::{
    LocalId, NewReview, PendingFavorite, PendingReview, Restaurant, RestaurantId, Review,
    ReviewId, SyncTag,
};
use crate::Result;

/// Thread-safe handle to the local stores.
#[derive(Clone)]
pub struct StoreService {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
}

impl StoreService {
    /// Open the store at the given filesystem path.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        tracing::debug!("Opening local store at {}", db_path.display());
        let db = Database::open(&db_path).await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: Some(db_path),
        })
    }

    /// Open an in-memory store (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self::from_database(db))
    }

    /// Wrap an already opened database.
    pub fn from_database(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            db_path: None,
        }
    }

    /// Filesystem location, when file-backed.
    pub fn path(&self) -> Option<&PathBuf> {
        self.db_path.as_ref()
    }

    // -- mirror -------------------------------------------------------------

    pub async fn get_restaurant(&self, id: RestaurantId) -> Result<Option<Restaurant>> {
        let db = self.db.lock().await;
        let repo = LibSqlMirrorRepository::new(db.connection());
        repo.get::<RestaurantTable>(id).await
    }

    pub async fn all_restaurants(&self) -> Result<Vec<Restaurant>> {
        let db = self.db.lock().await;
        let repo = LibSqlMirrorRepository::new(db.connection());
        repo.get_all::<RestaurantTable>().await
    }

    pub async fn put_restaurant(&self, restaurant: &Restaurant) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlMirrorRepository::new(db.connection());
        repo.put::<RestaurantTable>(restaurant).await
    }

    pub async fn get_review(&self, id: ReviewId) -> Result<Option<Review>> {
        let db = self.db.lock().await;
        let repo = LibSqlMirrorRepository::new(db.connection());
        repo.get::<ReviewTable>(id).await
    }

    pub async fn all_reviews(&self) -> Result<Vec<Review>> {
        let db = self.db.lock().await;
        let repo = LibSqlMirrorRepository::new(db.connection());
        repo.get_all::<ReviewTable>().await
    }

    pub async fn put_review(&self, review: &Review) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlMirrorRepository::new(db.connection());
        repo.put::<ReviewTable>(review).await
    }

    pub async fn reviews_by_restaurant(&self, restaurant_id: RestaurantId) -> Result<Vec<Review>> {
        let db = self.db.lock().await;
        let repo = LibSqlMirrorRepository::new(db.connection());
        repo.reviews_by_restaurant(restaurant_id).await
    }

    pub async fn reconcile_restaurants(&self, fetched: Vec<Restaurant>) -> Result<Vec<Restaurant>> {
        let db = self.db.lock().await;
        let repo = LibSqlMirrorRepository::new(db.connection());
        repo.reconcile::<RestaurantTable>(fetched).await
    }

    pub async fn reconcile_reviews(&self, fetched: Vec<Review>) -> Result<Vec<Review>> {
        let db = self.db.lock().await;
        let repo = LibSqlMirrorRepository::new(db.connection());
        repo.reconcile::<ReviewTable>(fetched).await
    }

    /// Optimistically flag a restaurant's favorite state as awaiting sync.
    ///
    /// Returns the updated record, or `None` when the restaurant has never
    /// been mirrored (there is nothing to update).
    pub async fn mark_favorite_pending(
        &self,
        id: RestaurantId,
        is_favorite: bool,
        updated_at: String,
    ) -> Result<Option<Restaurant>> {
        let db = self.db.lock().await;
        let tx = db.connection().transaction().await?;
        let outcome = async {
            let repo = LibSqlMirrorRepository::new(&tx);
            let Some(mut restaurant) = repo.get::<RestaurantTable>(id).await? else {
                return Ok(None);
            };
            restaurant.mark_favorite_pending(is_favorite, updated_at);
            repo.put::<RestaurantTable>(&restaurant).await?;
            Ok(Some(restaurant))
        }
        .await;

        match outcome {
            Ok(updated) => {
                tx.commit().await?;
                Ok(updated)
            }
            Err(error) => {
                tx.rollback().await.ok();
                Err(error)
            }
        }
    }

    // -- outbox -------------------------------------------------------------

    pub async fn enqueue_favorite(
        &self,
        restaurant_id: RestaurantId,
        is_favorite: bool,
    ) -> Result<PendingFavorite> {
        let db = self.db.lock().await;
        let repo = LibSqlOutboxRepository::new(db.connection());
        repo.enqueue_favorite(restaurant_id, is_favorite).await
    }

    pub async fn enqueue_review(&self, review: &NewReview) -> Result<PendingReview> {
        let db = self.db.lock().await;
        let repo = LibSqlOutboxRepository::new(db.connection());
        repo.enqueue_review(review).await
    }

    pub async fn pending_favorites(&self) -> Result<Vec<PendingFavorite>> {
        let db = self.db.lock().await;
        let repo = LibSqlOutboxRepository::new(db.connection());
        repo.list_pending_favorites().await
    }

    pub async fn pending_reviews(&self) -> Result<Vec<PendingReview>> {
        let db = self.db.lock().await;
        let repo = LibSqlOutboxRepository::new(db.connection());
        repo.list_pending_reviews().await
    }

    pub async fn pending_reviews_for_restaurant(
        &self,
        restaurant_id: RestaurantId,
    ) -> Result<Vec<PendingReview>> {
        let db = self.db.lock().await;
        let repo = LibSqlOutboxRepository::new(db.connection());
        repo.list_pending_reviews_for_restaurant(restaurant_id).await
    }

    pub async fn remove_pending_favorite(&self, restaurant_id: RestaurantId) -> Result<bool> {
        let db = self.db.lock().await;
        let repo = LibSqlOutboxRepository::new(db.connection());
        repo.remove(SyncTag::Favorites, restaurant_id).await
    }

    pub async fn pending_favorite(
        &self,
        restaurant_id: RestaurantId,
    ) -> Result<Option<PendingFavorite>> {
        let db = self.db.lock().await;
        let repo = LibSqlOutboxRepository::new(db.connection());
        repo.get_pending_favorite(restaurant_id).await
    }

    /// Put back a favorite entry that a failed queue attempt replaced.
    pub async fn requeue_favorite(&self, pending: &PendingFavorite) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlOutboxRepository::new(db.connection());
        repo.requeue_favorite(pending).await
    }

    pub async fn remove_pending_favorite_if_current(&self, pending: &PendingFavorite) -> Result<bool> {
        let db = self.db.lock().await;
        let repo = LibSqlOutboxRepository::new(db.connection());
        repo.remove_favorite_if_current(pending).await
    }

    /// Commit a delivered favorite toggle: drop its outbox entry and mirror
    /// the server's copy, in one transaction.
    ///
    /// When a newer toggle for the same restaurant was queued while `sent`
    /// was in flight, both the newer entry and its optimistic mirror record
    /// are left alone and `false` is returned.
    pub async fn settle_favorite(
        &self,
        sent: &PendingFavorite,
        confirmed: &Restaurant,
    ) -> Result<bool> {
        let db = self.db.lock().await;
        let tx = db.connection().transaction().await?;
        let outcome = async {
            let outbox = LibSqlOutboxRepository::new(&tx);
            let removed = outbox.remove_favorite_if_current(sent).await?;
            if !removed
                && outbox
                    .get_pending_favorite(sent.restaurant_id)
                    .await?
                    .is_some()
            {
                return Ok(false);
            }
            LibSqlMirrorRepository::new(&tx)
                .put::<RestaurantTable>(confirmed)
                .await?;
            Ok(true)
        }
        .await;

        match outcome {
            Ok(settled) => {
                tx.commit().await?;
                Ok(settled)
            }
            Err(error) => {
                tx.rollback().await.ok();
                Err(error)
            }
        }
    }

    pub async fn remove_pending_review(&self, local_id: LocalId) -> Result<bool> {
        let db = self.db.lock().await;
        let repo = LibSqlOutboxRepository::new(db.connection());
        repo.remove(SyncTag::Reviews, local_id).await
    }

    pub async fn clear_pending(&self, kind: SyncTag) -> Result<u64> {
        let db = self.db.lock().await;
        let repo = LibSqlOutboxRepository::new(db.connection());
        repo.clear(kind).await
    }

    pub async fn count_pending(&self, kind: SyncTag) -> Result<usize> {
        let db = self.db.lock().await;
        let repo = LibSqlOutboxRepository::new(db.connection());
        repo.count_pending(kind).await
    }
}
