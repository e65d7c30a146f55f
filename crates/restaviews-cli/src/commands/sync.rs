use std::sync::Arc;
use std::time::Duration;

use restaviews_core::models::{PendingFavorite, PendingReview};
use restaviews_core::{ChannelScheduler, ReplayWorker};
use serde::Serialize;

use super::common::{
    format_pending_favorite_line, format_pending_review_line, format_replay_report, print_json,
    Context,
};
use crate::cli::QueueKind;
use crate::error::CliError;

#[derive(Serialize)]
struct PendingOutput {
    favorites: Vec<PendingFavorite>,
    reviews: Vec<PendingReview>,
}

#[derive(Serialize)]
struct ClearOutput {
    cleared: u64,
}

pub async fn run_sync(ctx: &Context) -> Result<(), CliError> {
    let engine = ctx.engine().await?;
    let summary = engine.replay_all().await;

    if ctx.json {
        print_json(&summary)?;
    } else {
        println!("{}", format_replay_report(&summary.favorites));
        println!("{}", format_replay_report(&summary.reviews));
    }

    if summary.is_complete() {
        Ok(())
    } else {
        Err(CliError::SyncIncomplete {
            failed: summary.failed(),
        })
    }
}

pub async fn run_pending(ctx: &Context) -> Result<(), CliError> {
    let store = ctx.store().await?;
    let pending = PendingOutput {
        favorites: store.pending_favorites().await?,
        reviews: store.pending_reviews().await?,
    };

    if ctx.json {
        return print_json(&pending);
    }
    if pending.favorites.is_empty() && pending.reviews.is_empty() {
        println!("Nothing queued.");
        return Ok(());
    }
    for favorite in &pending.favorites {
        println!("{}", format_pending_favorite_line(favorite));
    }
    for review in &pending.reviews {
        println!(
            "review for restaurant {}: {}",
            review.review.restaurant_id,
            format_pending_review_line(review)
        );
    }
    Ok(())
}

pub async fn run_clear(ctx: &Context, kind: QueueKind) -> Result<(), CliError> {
    let store = ctx.store().await?;
    let mut cleared = 0;
    for &tag in kind.tags() {
        cleared += store.clear_pending(tag).await?;
    }

    if ctx.json {
        return print_json(&ClearOutput { cleared });
    }
    println!("Cleared {cleared} queued change(s).");
    Ok(())
}

/// Replay on a fixed interval until Ctrl+C, printing each state change.
pub async fn run_watch(ctx: &Context, interval_secs: u64) -> Result<(), CliError> {
    if interval_secs == 0 {
        return Err(CliError::InvalidInterval);
    }
    let engine = Arc::new(ctx.engine().await?);
    let (scheduler, triggers) = ChannelScheduler::new();
    let worker = ReplayWorker::new(engine, triggers, &ctx.config);
    let mut states = worker.subscribe();

    let ticker = async {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            if scheduler.connectivity_restored().is_err() {
                break;
            }
        }
    };
    let reporter = async {
        while states.changed().await.is_ok() {
            let state = *states.borrow_and_update();
            if ctx.json {
                if let Ok(line) = serde_json::to_string(&state) {
                    println!("{line}");
                }
            } else {
                println!("{state}");
            }
        }
    };

    if !ctx.json {
        println!("Replaying queued changes every {interval_secs}s (Ctrl+C to stop)");
    }
    tokio::select! {
        () = worker.run() => {}
        () = ticker => {}
        () = reporter => {}
        result = tokio::signal::ctrl_c() => result?,
    }
    Ok(())
}
