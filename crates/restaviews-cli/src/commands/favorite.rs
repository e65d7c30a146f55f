use restaviews_core::{FavoriteAck, RestaurantId};

use super::common::{
    format_replay_report, parse_id, print_json, replay_requested, CommandScheduler, Context,
    MutationOutput,
};
use crate::cli::DeliveryArgs;
use crate::error::CliError;

pub async fn run_favorite(
    ctx: &Context,
    raw_id: &str,
    is_favorite: bool,
    delivery: DeliveryArgs,
) -> Result<(), CliError> {
    let id = parse_id(raw_id)?;
    let engine = ctx.engine().await?;

    let (ack, replays) = if delivery.direct {
        (engine.set_favorite(id, is_favorite).await?, Vec::new())
    } else {
        let engine = engine.with_scheduler(CommandScheduler::default());
        let ack = engine.set_favorite(id, is_favorite).await?;
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
    println!("{}", describe_ack(id, is_favorite, &ack));
    for report in &replays {
        println!("{}", format_replay_report(report));
    }
    Ok(())
}

pub fn describe_ack(id: RestaurantId, is_favorite: bool, ack: &FavoriteAck) -> String {
    let (prefix, name) = match ack {
        FavoriteAck::Delivered(restaurant) => ("Saved", restaurant.name.clone()),
        FavoriteAck::Queued(Some(restaurant)) => ("Queued", restaurant.name.clone()),
        FavoriteAck::Queued(None) => ("Queued", format!("restaurant {id}")),
    };
    if is_favorite {
        format!("{prefix}: {name} marked as favorite.")
    } else {
        format!("{prefix}: {name} removed from favorites.")
    }
}
