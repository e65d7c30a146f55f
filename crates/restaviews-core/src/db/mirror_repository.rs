//! Local mirror of server entities
//!
//! Each table stores the entity's JSON body next to its key and the columns
//! it is looked up by. Ids are already numeric by the time they get here;
//! callers normalise string ids before any lookup.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::{MirrorRecord, Restaurant, RestaurantId, Review};
use crate::reconcile::{decide, MergeDecision};
use libsql::Connection;

/// A mirror table and the record type it holds
pub trait MirrorTable {
    type Record: MirrorRecord + Serialize + DeserializeOwned;

    /// Table name
    const TABLE: &'static str;
    /// Human-readable entity name for logs and errors
    const ENTITY: &'static str;
    /// Upsert with `?1` = id, `?2` = JSON body, `?3` = [`Self::aux_column`]
    const UPSERT_SQL: &'static str;

    /// Value for the table's third column
    fn aux_column(record: &Self::Record) -> i64;
}

/// `restaurants` table
pub enum RestaurantTable {}

impl MirrorTable for RestaurantTable {
    type Record = Restaurant;

    const TABLE: &'static str = "restaurants";
    const ENTITY: &'static str = "restaurant";
    const UPSERT_SQL: &'static str =
        "INSERT OR REPLACE INTO restaurants (id, body, awaiting_sync) VALUES (?1, ?2, ?3)";

    fn aux_column(record: &Restaurant) -> i64 {
        i64::from(record.awaiting_sync)
    }
}

/// `reviews` table, indexed by `restaurant_id`
pub enum ReviewTable {}

impl MirrorTable for ReviewTable {
    type Record = Review;

    const TABLE: &'static str = "reviews";
    const ENTITY: &'static str = "review";
    const UPSERT_SQL: &'static str =
        "INSERT OR REPLACE INTO reviews (id, body, restaurant_id) VALUES (?1, ?2, ?3)";

    fn aux_column(record: &Review) -> i64 {
        record.restaurant_id
    }
}

/// Trait for mirror storage operations (async)
#[allow(async_fn_in_trait)]
pub trait MirrorRepository {
    /// Get one record by primary key
    async fn get<T: MirrorTable>(&self, id: i64) -> Result<Option<T::Record>>;

    /// Get every record in the table, ordered by key
    async fn get_all<T: MirrorTable>(&self) -> Result<Vec<T::Record>>;

    /// Upsert one record
    async fn put<T: MirrorTable>(&self, record: &T::Record) -> Result<()>;

    /// Reviews for a restaurant, via the `restaurant_id` index
    async fn reviews_by_restaurant(&self, restaurant_id: RestaurantId) -> Result<Vec<Review>>;

    /// Merge fetched records into the table in one transaction, returning
    /// what the caller should see for each (the local record where a pending
    /// write wins, the fetched record otherwise). Records without a usable id
    /// are passed through unmirrored.
    async fn reconcile<T: MirrorTable>(&self, fetched: Vec<T::Record>) -> Result<Vec<T::Record>>;
}

/// libSQL implementation of `MirrorRepository`
pub struct LibSqlMirrorRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlMirrorRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl MirrorRepository for LibSqlMirrorRepository<'_> {
    async fn get<T: MirrorTable>(&self, id: i64) -> Result<Option<T::Record>> {
        get_record::<T>(self.conn, id).await
    }

    async fn get_all<T: MirrorTable>(&self) -> Result<Vec<T::Record>> {
        let sql = format!("SELECT body FROM {} ORDER BY id", T::TABLE);
        let rows = self.conn.query(&sql, ()).await?;
        collect_bodies::<T::Record>(rows).await
    }

    async fn put<T: MirrorTable>(&self, record: &T::Record) -> Result<()> {
        put_record::<T>(self.conn, record).await
    }

    async fn reviews_by_restaurant(&self, restaurant_id: RestaurantId) -> Result<Vec<Review>> {
        let rows = self
            .conn
            .query(
                "SELECT body FROM reviews WHERE restaurant_id = ?1 ORDER BY id",
                libsql::params![restaurant_id],
            )
            .await?;
        collect_bodies::<Review>(rows).await
    }

    async fn reconcile<T: MirrorTable>(&self, fetched: Vec<T::Record>) -> Result<Vec<T::Record>> {
        let tx = self.conn.transaction().await?;
        match reconcile_in::<T>(&tx, fetched).await {
            Ok(merged) => {
                tx.commit().await?;
                Ok(merged)
            }
            Err(error) => {
                tx.rollback().await.ok();
                Err(error)
            }
        }
    }
}

async fn reconcile_in<T: MirrorTable>(
    conn: &Connection,
    fetched: Vec<T::Record>,
) -> Result<Vec<T::Record>> {
    let mut merged = Vec::with_capacity(fetched.len());
    let mut stored = 0usize;
    let mut kept_local = 0usize;

    let mut skipped = 0usize;

    for record in fetched {
        let key = match storable_key::<T>(&record) {
            Ok(key) => key,
            Err(error) => {
                tracing::warn!("Not mirroring fetched record: {error}");
                skipped += 1;
                merged.push(record);
                continue;
            }
        };

        let local = match get_record::<T>(conn, key).await {
            Ok(local) => local,
            Err(Error::Serialization(error)) => {
                tracing::warn!(
                    "Unreadable mirror {} {key}: {error}; replacing with fetched copy",
                    T::ENTITY
                );
                None
            }
            Err(error) => return Err(error),
        };

        match (decide(local.as_ref(), &record), local) {
            (MergeDecision::KeepLocal, Some(local)) => {
                tracing::debug!(
                    "Keeping pending local {} {key} over fetched copy",
                    T::ENTITY
                );
                kept_local += 1;
                merged.push(local);
            }
            (MergeDecision::Store, _) => {
                put_record::<T>(conn, &record).await?;
                stored += 1;
                merged.push(record);
            }
            _ => merged.push(record),
        }
    }

    tracing::debug!(
        "Reconciled {} {}s: {stored} stored, {kept_local} pending kept, {skipped} skipped",
        merged.len(),
        T::ENTITY
    );
    Ok(merged)
}

async fn get_record<T: MirrorTable>(conn: &Connection, id: i64) -> Result<Option<T::Record>> {
    let sql = format!("SELECT body FROM {} WHERE id = ?1", T::TABLE);
    let mut rows = conn.query(&sql, libsql::params![id]).await?;

    if let Some(row) = rows.next().await? {
        let body: String = row.get(0)?;
        Ok(Some(serde_json::from_str(&body)?))
    } else {
        Ok(None)
    }
}

/// Primary key for a record, which must be a positive server-assigned id.
fn storable_key<T: MirrorTable>(record: &T::Record) -> Result<i64> {
    match record.key() {
        Some(key) if key > 0 => Ok(key),
        Some(key) => Err(Error::InvalidInput(format!(
            "{} id {key} is not a valid server id",
            T::ENTITY
        ))),
        None => Err(Error::InvalidInput(format!(
            "{} without a server id cannot be mirrored",
            T::ENTITY
        ))),
    }
}

async fn put_record<T: MirrorTable>(conn: &Connection, record: &T::Record) -> Result<()> {
    let key = storable_key::<T>(record)?;
    let body = serde_json::to_string(record)?;
    conn.execute(
        T::UPSERT_SQL,
        libsql::params![key, body, T::aux_column(record)],
    )
    .await?;
    Ok(())
}

async fn collect_bodies<R: DeserializeOwned>(mut rows: libsql::Rows) -> Result<Vec<R>> {
    let mut records = Vec::new();
    while let Some(row) = rows.next().await? {
        let body: String = row.get(0)?;
        records.push(serde_json::from_str(&body)?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use pretty_assertions::assert_eq;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn restaurant(id: i64, updated_at: &str) -> Restaurant {
        let mut restaurant = Restaurant::new(id, format!("Restaurant {id}"));
        restaurant.updated_at = Some(updated_at.to_string());
        restaurant
    }

    fn review(id: i64, restaurant_id: i64, updated_at: &str) -> Review {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "restaurant_id": restaurant_id,
            "name": "Ana",
            "rating": 4,
            "comments": "Good",
            "updatedAt": updated_at,
        }))
        .unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn put_is_an_upsert_by_id() {
        let db = setup().await;
        let repo = LibSqlMirrorRepository::new(db.connection());

        repo.put::<RestaurantTable>(&restaurant(1, "a"))
            .await
            .unwrap();
        repo.put::<RestaurantTable>(&restaurant(1, "b"))
            .await
            .unwrap();

        let all = repo.get_all::<RestaurantTable>().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].updated_at.as_deref(), Some("b"));
        assert!(repo.get::<RestaurantTable>(2).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reviews_are_found_by_restaurant_index() {
        let db = setup().await;
        let repo = LibSqlMirrorRepository::new(db.connection());

        repo.put::<ReviewTable>(&review(1, 3, "a")).await.unwrap();
        repo.put::<ReviewTable>(&review(2, 3, "a")).await.unwrap();
        // Dangling restaurant reference is tolerated.
        repo.put::<ReviewTable>(&review(3, 99, "a")).await.unwrap();

        let for_three = repo.reviews_by_restaurant(3).await.unwrap();
        assert_eq!(
            for_three.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![Some(1), Some(2)]
        );
        assert_eq!(repo.reviews_by_restaurant(99).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn review_without_server_id_is_rejected() {
        let db = setup().await;
        let repo = LibSqlMirrorRepository::new(db.connection());

        let mut unsent = review(1, 3, "a");
        unsent.id = None;
        let error = repo.put::<ReviewTable>(&unsent).await.unwrap_err();
        assert!(matches!(error, Error::InvalidInput(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reconcile_applies_merge_policy_per_record() {
        let db = setup().await;
        let repo = LibSqlMirrorRepository::new(db.connection());

        let mut pending = restaurant(1, "local");
        pending.mark_favorite_pending(true, "local".into());
        repo.put::<RestaurantTable>(&pending).await.unwrap();
        repo.put::<RestaurantTable>(&restaurant(2, "old"))
            .await
            .unwrap();

        let merged = repo
            .reconcile::<RestaurantTable>(vec![
                restaurant(1, "server"),
                restaurant(2, "new"),
                restaurant(3, "fresh"),
            ])
            .await
            .unwrap();

        assert_eq!(merged[0], pending);
        assert_eq!(merged[1].updated_at.as_deref(), Some("new"));
        assert_eq!(merged[2].updated_at.as_deref(), Some("fresh"));

        let stored = repo.get::<RestaurantTable>(1).await.unwrap().unwrap();
        assert!(stored.awaiting_sync);
        assert_eq!(stored.updated_at.as_deref(), Some("local"));
        let stored = repo.get::<RestaurantTable>(2).await.unwrap().unwrap();
        assert_eq!(stored.updated_at.as_deref(), Some("new"));
        assert_eq!(repo.get_all::<RestaurantTable>().await.unwrap().len(), 3);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reconcile_skips_records_without_a_usable_id() {
        let db = setup().await;
        let repo = LibSqlMirrorRepository::new(db.connection());

        let mut unsent = review(0, 3, "a");
        unsent.id = None;
        let merged = repo
            .reconcile::<ReviewTable>(vec![review(11, 3, "a"), unsent.clone(), review(-2, 3, "a")])
            .await
            .unwrap();

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[1], unsent);
        let stored = repo.get_all::<ReviewTable>().await.unwrap();
        assert_eq!(stored.iter().map(|r| r.id).collect::<Vec<_>>(), vec![Some(11)]);
    }
}
