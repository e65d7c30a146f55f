use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Local};
use restaviews_core::models::{normalize_id, PendingFavorite, PendingReview, MAX_RATING};
use restaviews_core::{
    ClientConfig, Error, HttpRestaurantApi, ReplayReport, ReplayScheduler, Restaurant,
    RestaurantApi, RestaurantId, Review, StoreService, SyncEngine, SyncTag,
};
use serde::Serialize;

use crate::error::CliError;

/// Settings shared by every command.
pub struct Context {
    pub db_path: PathBuf,
    pub config: ClientConfig,
    pub json: bool,
}

impl Context {
    pub async fn engine(&self) -> Result<SyncEngine<HttpRestaurantApi>, CliError> {
        let store = self.store().await?;
        let api = HttpRestaurantApi::new(&self.config)?;
        Ok(SyncEngine::new(api, store))
    }

    /// The local store alone, for commands that never touch the network.
    pub async fn store(&self) -> Result<StoreService, CliError> {
        Ok(StoreService::open_path(self.db_path.clone()).await?)
    }
}

/// JSON shape for mutation commands.
#[derive(Serialize)]
pub struct MutationOutput<'a, T> {
    pub ack: &'a T,
    pub replays: &'a [ReplayReport],
}

/// Collects replay requests made while a command runs, so the command can
/// replay them itself before exiting.
#[derive(Default)]
pub struct CommandScheduler {
    requested: Mutex<Vec<SyncTag>>,
}

impl CommandScheduler {
    pub fn take(&self) -> Vec<SyncTag> {
        self.requested
            .lock()
            .map(|mut requested| std::mem::take(&mut *requested))
            .unwrap_or_default()
    }
}

impl ReplayScheduler for CommandScheduler {
    fn request_replay(&self, kind: SyncTag) -> restaviews_core::Result<()> {
        let mut requested = self
            .requested
            .lock()
            .map_err(|_| Error::Scheduler("replay request list is poisoned".to_string()))?;
        if !requested.contains(&kind) {
            requested.push(kind);
        }
        Ok(())
    }
}

/// Replay whatever the command queued. A failed replay leaves its entries
/// queued and is reported, not returned as an error.
pub async fn replay_requested<A: RestaurantApi>(
    engine: &SyncEngine<A, CommandScheduler>,
) -> Vec<ReplayReport> {
    let kinds = engine.scheduler().map(CommandScheduler::take).unwrap_or_default();
    let mut reports = Vec::with_capacity(kinds.len());
    for kind in kinds {
        match engine.replay(kind).await {
            Ok(report) => reports.push(report),
            Err(error) => tracing::warn!("Could not replay {kind}: {error}"),
        }
    }
    reports
}

pub fn parse_id(raw: &str) -> Result<RestaurantId, CliError> {
    if raw.trim().is_empty() {
        return Err(CliError::EmptyId);
    }
    Ok(normalize_id(raw)?)
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn rating_stars(rating: i64) -> String {
    let filled = usize::try_from(rating.clamp(0, MAX_RATING)).unwrap_or(0);
    let empty = usize::try_from(MAX_RATING).unwrap_or(0) - filled;
    format!("{}{}", "*".repeat(filled), ".".repeat(empty))
}

pub fn format_restaurant_line(restaurant: &Restaurant) -> String {
    let mut line = format!(
        "{:>4}  {}  [{} / {}]",
        restaurant.id, restaurant.name, restaurant.cuisine_type, restaurant.neighborhood
    );
    if restaurant.is_favorite {
        line.push_str("  (favorite)");
    }
    if restaurant.awaiting_sync {
        line.push_str("  (not yet synced)");
    }
    line
}

pub fn format_review_line(review: &Review) -> String {
    format!(
        "{}  {}: {}",
        rating_stars(review.rating),
        review.name,
        review.comments
    )
}

pub fn format_pending_review_line(pending: &PendingReview) -> String {
    format!(
        "{}  {}: {}  (queued {})",
        rating_stars(pending.review.rating),
        pending.review.name,
        pending.review.comments,
        format_queued_at(&pending.queued_at)
    )
}

pub fn format_pending_favorite_line(pending: &PendingFavorite) -> String {
    let action = if pending.is_favorite { "favorite" } else { "unfavorite" };
    format!(
        "{action} restaurant {}  (queued {})",
        pending.restaurant_id,
        format_queued_at(&pending.queued_at)
    )
}

/// Render a stored RFC 3339 timestamp in local time, or as-is when it does
/// not parse.
pub fn format_queued_at(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw).map_or_else(
        |_| raw.to_string(),
        |timestamp| {
            timestamp
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        },
    )
}

pub fn format_replay_report(report: &ReplayReport) -> String {
    if report.attempted == 0 && report.is_complete() {
        return format!("{}: nothing queued", report.kind);
    }
    let mut line = format!(
        "{}: delivered {} of {}",
        report.kind, report.delivered, report.attempted
    );
    if !report.is_complete() {
        let offline = report.failures.iter().all(|failure| failure.offline);
        line.push_str(&format!(
            ", {} still queued{}",
            report.failures.len(),
            if offline { " (offline)" } else { "" }
        ));
    }
    line
}
