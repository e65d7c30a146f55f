//! Database migrations
//!
//! Migrations only ever add tables and indexes. Queued offline work must
//! survive a version bump, so nothing here drops or rewrites an existing
//! table.

use crate::error::Result;
use libsql::Connection;

/// Current schema version
pub const CURRENT_VERSION: i32 = 3;

/// Run all pending migrations
pub async fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn).await?;

    if version < 1 {
        apply(conn, 1, MIGRATION_V1).await?;
    }
    if version < 2 {
        apply(conn, 2, MIGRATION_V2).await?;
    }
    if version < 3 {
        apply(conn, 3, MIGRATION_V3).await?;
    }

    Ok(())
}

/// Get the current schema version
pub async fn get_version(conn: &Connection) -> Result<i32> {
    let mut rows = conn
        .query(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            (),
        )
        .await?;

    let exists: bool = if let Some(row) = rows.next().await? {
        row.get::<i32>(0)? != 0
    } else {
        false
    };

    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;

    let version: i32 = if let Some(row) = rows.next().await? {
        row.get(0)?
    } else {
        0
    };

    Ok(version)
}

/// Version 1: restaurant mirror
const MIGRATION_V1: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER PRIMARY KEY
    )",
    "CREATE TABLE IF NOT EXISTS restaurants (
        id INTEGER PRIMARY KEY,
        body TEXT NOT NULL,
        awaiting_sync INTEGER NOT NULL DEFAULT 0
    )",
    "INSERT INTO schema_version (version) VALUES (1)",
];

/// Version 2: review mirror and the favorites outbox
const MIGRATION_V2: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS reviews (
        id INTEGER PRIMARY KEY,
        restaurant_id INTEGER NOT NULL,
        body TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_reviews_restaurant_id ON reviews(restaurant_id)",
    // Keyed by restaurant, not auto-incremented: one pending toggle per restaurant.
    "CREATE TABLE IF NOT EXISTS pending_favorites (
        restaurant_id INTEGER PRIMARY KEY,
        is_favorite INTEGER NOT NULL,
        queued_at TEXT NOT NULL
    )",
    "INSERT INTO schema_version (version) VALUES (2)",
];

/// Version 3: reviews outbox
const MIGRATION_V3: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS pending_reviews (
        local_id INTEGER PRIMARY KEY AUTOINCREMENT,
        restaurant_id INTEGER NOT NULL,
        body TEXT NOT NULL,
        queued_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_pending_reviews_restaurant_id ON pending_reviews(restaurant_id)",
    "INSERT INTO schema_version (version) VALUES (3)",
];

async fn apply(conn: &Connection, version: i32, statements: &[&str]) -> Result<()> {
    // libsql doesn't have execute_batch, so we run each statement separately
    conn.execute("BEGIN TRANSACTION", ()).await?;

    for stmt in statements {
        if let Err(e) = conn.execute(stmt, ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
    }

    if let Err(e) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    tracing::info!("Migrated database to version {version}");
    Ok(())
}
