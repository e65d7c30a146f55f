use restaviews_core::{NewReview, ReviewAck};

use super::common::{
    format_pending_review_line, format_replay_report, format_review_line, parse_id, print_json,
    replay_requested, CommandScheduler, Context, MutationOutput,
};
use crate::cli::DeliveryArgs;
use crate::error::CliError;

pub async fn run_list(ctx: &Context, raw_restaurant_id: &str) -> Result<(), CliError> {
    let restaurant_id = parse_id(raw_restaurant_id)?;
    let engine = ctx.engine().await?;
    let listing = engine.reviews_for_restaurant(restaurant_id).await?;

    if ctx.json {
        return print_json(&listing);
    }
    if listing.reviews.is_empty() && listing.pending.is_empty() {
        println!("No reviews yet.");
        return Ok(());
    }
    for review in &listing.reviews {
        println!("{}", format_review_line(review));
    }
    for pending in &listing.pending {
        println!("{}", format_pending_review_line(pending));
    }
    Ok(())
}

pub async fn run_add(
    ctx: &Context,
    raw_restaurant_id: &str,
    name: &str,
    rating: i64,
    comments: &str,
    delivery: DeliveryArgs,
) -> Result<(), CliError> {
    let restaurant_id = parse_id(raw_restaurant_id)?;
    let review = NewReview::new(restaurant_id, name, rating, comments)?;
    let engine = ctx.engine().await?;

    let (ack, replays) = if delivery.direct {
        (engine.add_review(review).await?, Vec::new())
    } else {
        let engine = engine.with_scheduler(CommandScheduler::default());
        let ack = engine.add_review(review).await?;
        let replays = if delivery.defer {
            Vec::new()
        } else {
            replay_requested(&engine).await
        };
        (ack, replays)
    };

    if ctx.json {
        return print_json(&MutationOutput {
            ack: &ack,
            replays: &replays,
        });
    }
    match &ack {
        ReviewAck::Delivered(review) => println!(
            "Posted review{} for restaurant {}.",
            review.id.map(|id| format!(" #{id}")).unwrap_or_default(),
            review.restaurant_id
        ),
        ReviewAck::Queued(pending) => println!(
            "Queued review (local #{}) for restaurant {}.",
            pending.local_id, pending.review.restaurant_id
        ),
    }
    for report in &replays {
        println!("{}", format_replay_report(report));
    }
    Ok(())
}
