//! Outbox of user mutations not yet confirmed by the server

use crate::error::Result;
use crate::models::{LocalId, NewReview, PendingFavorite, PendingReview, RestaurantId, SyncTag};
use crate::util::iso_timestamp_now;
use libsql::Connection;

/// Trait for outbox storage operations (async)
#[allow(async_fn_in_trait)]
pub trait OutboxRepository {
    /// Queue the desired favorite state, replacing any pending toggle for the
    /// same restaurant
    async fn enqueue_favorite(
        &self,
        restaurant_id: RestaurantId,
        is_favorite: bool,
    ) -> Result<PendingFavorite>;

    /// Put a previously read favorite entry back exactly as it was
    async fn requeue_favorite(&self, pending: &PendingFavorite) -> Result<()>;

    /// The pending favorite toggle for one restaurant, if any
    async fn get_pending_favorite(
        &self,
        restaurant_id: RestaurantId,
    ) -> Result<Option<PendingFavorite>>;

    /// Remove a favorite entry only if it has not been replaced since it was
    /// read. Returns whether it was removed.
    async fn remove_favorite_if_current(&self, pending: &PendingFavorite) -> Result<bool>;

    /// Append a review, assigning it a local id
    async fn enqueue_review(&self, review: &NewReview) -> Result<PendingReview>;

    /// All pending favorite toggles, ordered by restaurant id
    async fn list_pending_favorites(&self) -> Result<Vec<PendingFavorite>>;

    /// All pending reviews in queue order
    async fn list_pending_reviews(&self) -> Result<Vec<PendingReview>>;

    /// Pending reviews for one restaurant in queue order
    async fn list_pending_reviews_for_restaurant(
        &self,
        restaurant_id: RestaurantId,
    ) -> Result<Vec<PendingReview>>;

    /// Remove one entry; `key` is the restaurant id for favorites and the
    /// local id for reviews. Returns whether an entry was removed.
    async fn remove(&self, kind: SyncTag, key: i64) -> Result<bool>;

    /// Remove every entry of a kind, returning how many were removed
    async fn clear(&self, kind: SyncTag) -> Result<u64>;

    /// Number of pending entries of a kind
    async fn count_pending(&self, kind: SyncTag) -> Result<usize>;
}

/// libSQL implementation of `OutboxRepository`
pub struct LibSqlOutboxRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlOutboxRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    const fn table(kind: SyncTag) -> (&'static str, &'static str) {
        match kind {
            SyncTag::Favorites => ("pending_favorites", "restaurant_id"),
            SyncTag::Reviews => ("pending_reviews", "local_id"),
        }
    }

    async fn query_reviews(
        &self,
        restaurant_id: Option<RestaurantId>,
    ) -> Result<Vec<PendingReview>> {
        let mut rows = match restaurant_id {
            Some(restaurant_id) => {
                self.conn
                    .query(
                        "SELECT local_id, body, queued_at FROM pending_reviews
                         WHERE restaurant_id = ?1 ORDER BY local_id",
                        libsql::params![restaurant_id],
                    )
                    .await?
            }
            None => {
                self.conn
                    .query(
                        "SELECT local_id, body, queued_at FROM pending_reviews ORDER BY local_id",
                        (),
                    )
                    .await?
            }
        };
        let mut pending = Vec::new();
        while let Some(row) = rows.next().await? {
            let body: String = row.get(1)?;
            pending.push(PendingReview {
                local_id: row.get(0)?,
                review: serde_json::from_str(&body)?,
                queued_at: row.get(2)?,
            });
        }
        Ok(pending)
    }
}

impl OutboxRepository for LibSqlOutboxRepository<'_> {
    async fn enqueue_favorite(
        &self,
        restaurant_id: RestaurantId,
        is_favorite: bool,
    ) -> Result<PendingFavorite> {
        let pending = PendingFavorite {
            restaurant_id,
            is_favorite,
            queued_at: iso_timestamp_now(),
        };
        self.requeue_favorite(&pending).await?;

        tracing::debug!(
            "Queued favorite={} for restaurant {}",
            pending.is_favorite,
            pending.restaurant_id
        );
        Ok(pending)
    }

    async fn requeue_favorite(&self, pending: &PendingFavorite) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO pending_favorites (restaurant_id, is_favorite, queued_at)
                 VALUES (?1, ?2, ?3)",
                libsql::params![
                    pending.restaurant_id,
                    i64::from(pending.is_favorite),
                    pending.queued_at.clone()
                ],
            )
            .await?;
        Ok(())
    }

    async fn get_pending_favorite(
        &self,
        restaurant_id: RestaurantId,
    ) -> Result<Option<PendingFavorite>> {
        let mut rows = self
            .conn
            .query(
                "SELECT is_favorite, queued_at FROM pending_favorites WHERE restaurant_id = ?1",
                libsql::params![restaurant_id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(PendingFavorite {
                restaurant_id,
                is_favorite: row.get::<i64>(0)? != 0,
                queued_at: row.get(1)?,
            })),
            None => Ok(None),
        }
    }

    async fn remove_favorite_if_current(&self, pending: &PendingFavorite) -> Result<bool> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM pending_favorites
                 WHERE restaurant_id = ?1 AND is_favorite = ?2 AND queued_at = ?3",
                libsql::params![
                    pending.restaurant_id,
                    i64::from(pending.is_favorite),
                    pending.queued_at.clone()
                ],
            )
            .await?;
        Ok(removed > 0)
    }

    async fn enqueue_review(&self, review: &NewReview) -> Result<PendingReview> {
        let body = serde_json::to_string(review)?;
        let queued_at = iso_timestamp_now();

        self.conn
            .execute(
                "INSERT INTO pending_reviews (restaurant_id, body, queued_at) VALUES (?1, ?2, ?3)",
                libsql::params![review.restaurant_id, body, queued_at.clone()],
            )
            .await?;
        let local_id: LocalId = self.conn.last_insert_rowid();

        tracing::debug!(
            "Queued review {local_id} for restaurant {}",
            review.restaurant_id
        );
        Ok(PendingReview {
            local_id,
            review: review.clone(),
            queued_at,
        })
    }

    async fn list_pending_favorites(&self) -> Result<Vec<PendingFavorite>> {
        let mut rows = self
            .conn
            .query(
                "SELECT restaurant_id, is_favorite, queued_at FROM pending_favorites ORDER BY restaurant_id",
                (),
            )
            .await?;

        let mut pending = Vec::new();
        while let Some(row) = rows.next().await? {
            pending.push(PendingFavorite {
                restaurant_id: row.get(0)?,
                is_favorite: row.get::<i64>(1)? != 0,
                queued_at: row.get(2)?,
            });
        }
        Ok(pending)
    }

    async fn list_pending_reviews(&self) -> Result<Vec<PendingReview>> {
        self.query_reviews(None).await
    }

    async fn list_pending_reviews_for_restaurant(
        &self,
        restaurant_id: RestaurantId,
    ) -> Result<Vec<PendingReview>> {
        self.query_reviews(Some(restaurant_id)).await
    }

    async fn remove(&self, kind: SyncTag, key: i64) -> Result<bool> {
        let (table, column) = Self::table(kind);
        let sql = format!("DELETE FROM {table} WHERE {column} = ?1");
        let removed = self.conn.execute(&sql, libsql::params![key]).await?;
        Ok(removed > 0)
    }

    async fn clear(&self, kind: SyncTag) -> Result<u64> {
        let (table, _) = Self::table(kind);
        let removed = self
            .conn
            .execute(&format!("DELETE FROM {table}"), ())
            .await?;
        tracing::info!("Cleared {removed} pending entries from {kind}");
        Ok(removed)
    }

    async fn count_pending(&self, kind: SyncTag) -> Result<usize> {
        let (table, _) = Self::table(kind);
        let mut rows = self
            .conn
            .query(&format!("SELECT COUNT(*) FROM {table}"), ())
            .await?;
        let count: i64 = match rows.next().await? {
            Some(row) => row.get(0)?,
            None => 0,
        };
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use pretty_assertions::assert_eq;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn second_toggle_replaces_first() {
        let db = setup().await;
        let repo = LibSqlOutboxRepository::new(db.connection());

        repo.enqueue_favorite(5, true).await.unwrap();
        repo.enqueue_favorite(5, false).await.unwrap();
        repo.enqueue_favorite(6, true).await.unwrap();

        let pending = repo.list_pending_favorites().await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].restaurant_id, 5);
        assert!(!pending[0].is_favorite);
        assert_eq!(repo.count_pending(SyncTag::Favorites).await.unwrap(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn replaced_favorite_is_not_removed_by_stale_copy() {
        let db = setup().await;
        let repo = LibSqlOutboxRepository::new(db.connection());

        let sent = PendingFavorite {
            restaurant_id: 5,
            is_favorite: true,
            queued_at: "2018-07-01T00:00:00.000Z".into(),
        };
        repo.requeue_favorite(&sent).await.unwrap();
        assert_eq!(repo.get_pending_favorite(5).await.unwrap(), Some(sent.clone()));

        let newer = repo.enqueue_favorite(5, false).await.unwrap();
        assert!(!repo.remove_favorite_if_current(&sent).await.unwrap());
        assert_eq!(repo.get_pending_favorite(5).await.unwrap(), Some(newer.clone()));

        assert!(repo.remove_favorite_if_current(&newer).await.unwrap());
        assert_eq!(repo.get_pending_favorite(5).await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reviews_get_increasing_local_ids() {
        let db = setup().await;
        let repo = LibSqlOutboxRepository::new(db.connection());

        let first = NewReview::new(3, "Ana", 5, "Great").unwrap();
        let second = NewReview::new(4, "Bo", 2, "Meh").unwrap();
        let a = repo.enqueue_review(&first).await.unwrap();
        let b = repo.enqueue_review(&second).await.unwrap();
        assert!(b.local_id > a.local_id);

        let pending = repo.list_pending_reviews().await.unwrap();
        assert_eq!(pending, vec![a.clone(), b]);

        let for_three = repo.list_pending_reviews_for_restaurant(3).await.unwrap();
        assert_eq!(for_three, vec![a]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn local_ids_are_not_reused_after_removal() {
        let db = setup().await;
        let repo = LibSqlOutboxRepository::new(db.connection());

        let review = NewReview::new(3, "Ana", 5, "Great").unwrap();
        let first = repo.enqueue_review(&review).await.unwrap();
        assert!(repo.remove(SyncTag::Reviews, first.local_id).await.unwrap());
        let second = repo.enqueue_review(&review).await.unwrap();
        assert!(second.local_id > first.local_id);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn remove_and_clear() {
        let db = setup().await;
        let repo = LibSqlOutboxRepository::new(db.connection());

        repo.enqueue_favorite(1, true).await.unwrap();
        repo.enqueue_favorite(2, true).await.unwrap();

        assert!(repo.remove(SyncTag::Favorites, 1).await.unwrap());
        assert!(!repo.remove(SyncTag::Favorites, 1).await.unwrap());
        assert_eq!(repo.count_pending(SyncTag::Favorites).await.unwrap(), 1);

        assert_eq!(repo.clear(SyncTag::Favorites).await.unwrap(), 1);
        assert_eq!(repo.count_pending(SyncTag::Favorites).await.unwrap(), 0);
        assert_eq!(repo.count_pending(SyncTag::Reviews).await.unwrap(), 0);
    }
}
