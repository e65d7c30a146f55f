use std::path::PathBuf;

use clap::Parser;
use pretty_assertions::assert_eq;
use restaviews_core::sync::ReplayFailure;
use restaviews_core::{FavoriteAck, ReplayReport, ReplayScheduler, Restaurant, SyncTag};

use crate::cli::{Cli, Commands, QueueKind, SyncCommands};
use crate::commands::common::{
    format_queued_at, format_replay_report, format_restaurant_line, parse_id, rating_stars,
    CommandScheduler,
};
use crate::commands::favorite::describe_ack;
use crate::error::CliError;
use crate::resolve_db_path;

#[test]
fn parse_id_trims_and_rejects_garbage() {
    assert_eq!(parse_id(" 12 ").unwrap(), 12);
    assert!(matches!(parse_id("  "), Err(CliError::EmptyId)));
    assert!(matches!(parse_id("abc"), Err(CliError::Core(_))));
}

#[test]
fn rating_stars_fill_to_max() {
    assert_eq!(rating_stars(3), "***..");
    assert_eq!(rating_stars(5), "*****");
    assert_eq!(rating_stars(9), "*****");
    assert_eq!(rating_stars(-1), ".....");
}

#[test]
fn restaurant_line_flags_favorite_and_pending() {
    let mut restaurant = Restaurant::new(4, "Katz's Delicatessen");
    restaurant.cuisine_type = "American".to_string();
    restaurant.neighborhood = "Manhattan".to_string();
    assert_eq!(
        format_restaurant_line(&restaurant),
        "   4  Katz's Delicatessen  [American / Manhattan]"
    );

    restaurant.is_favorite = true;
    restaurant.awaiting_sync = true;
    let line = format_restaurant_line(&restaurant);
    assert!(line.ends_with("(favorite)  (not yet synced)"));
}

#[test]
fn queued_at_falls_back_to_raw_text() {
    assert_eq!(format_queued_at("yesterday"), "yesterday");
    let formatted = format_queued_at("2018-08-01T12:00:00.000Z");
    assert!(formatted.starts_with("2018-0"));
    assert_eq!(formatted.len(), "2018-08-01 12:00".len());
}

#[test]
fn replay_report_lines() {
    let empty = ReplayReport {
        kind: SyncTag::Favorites,
        attempted: 0,
        delivered: 0,
        failures: Vec::new(),
    };
    assert_eq!(format_replay_report(&empty), "syncFavorites: nothing queued");

    let partial = ReplayReport {
        kind: SyncTag::Reviews,
        attempted: 3,
        delivered: 1,
        failures: vec![
            ReplayFailure {
                key: 2,
                error: "Network unavailable: refused".to_string(),
                offline: true,
            },
            ReplayFailure {
                key: 3,
                error: "Network unavailable: refused".to_string(),
                offline: true,
            },
        ],
    };
    assert_eq!(
        format_replay_report(&partial),
        "syncReviews: delivered 1 of 3, 2 still queued (offline)"
    );
}

#[test]
fn favorite_ack_description() {
    let restaurant = Restaurant::new(2, "Emily");
    assert_eq!(
        describe_ack(2, true, &FavoriteAck::Delivered(restaurant.clone())),
        "Saved: Emily marked as favorite."
    );
    assert_eq!(
        describe_ack(2, false, &FavoriteAck::Queued(Some(restaurant))),
        "Queued: Emily removed from favorites."
    );
    assert_eq!(
        describe_ack(9, true, &FavoriteAck::Queued(None)),
        "Queued: restaurant 9 marked as favorite."
    );
}

#[test]
fn command_scheduler_dedupes_and_drains() {
    let scheduler = CommandScheduler::default();
    scheduler.request_replay(SyncTag::Reviews).unwrap();
    scheduler.request_replay(SyncTag::Reviews).unwrap();
    scheduler.request_replay(SyncTag::Favorites).unwrap();

    assert_eq!(scheduler.take(), vec![SyncTag::Reviews, SyncTag::Favorites]);
    assert!(scheduler.take().is_empty());
}

#[test]
fn explicit_db_path_wins() {
    let path = PathBuf::from("/tmp/reviews.db");
    assert_eq!(resolve_db_path(Some(path.clone())), path);
}

#[test]
fn queue_kind_all_covers_every_tag() {
    assert_eq!(QueueKind::All.tags(), &SyncTag::ALL);
    assert_eq!(QueueKind::Reviews.tags(), &[SyncTag::Reviews]);
}

#[test]
fn favorite_command_parses_flags() {
    let cli = Cli::try_parse_from(["restaviews", "favorite", "3", "--off", "--defer"]).unwrap();
    match cli.command {
        Commands::Favorite { id, off, delivery } => {
            assert_eq!(id, "3");
            assert!(off);
            assert!(delivery.defer);
            assert!(!delivery.direct);
        }
        _ => panic!("expected favorite command"),
    }

    assert!(
        Cli::try_parse_from(["restaviews", "favorite", "3", "--defer", "--direct"]).is_err()
    );
}

#[test]
fn sync_subcommands_parse() {
    let cli = Cli::try_parse_from(["restaviews", "sync"]).unwrap();
    assert!(matches!(cli.command, Commands::Sync { command: None }));

    let cli = Cli::try_parse_from(["restaviews", "--json", "sync", "clear", "reviews"]).unwrap();
    assert!(cli.json);
    assert!(matches!(
        cli.command,
        Commands::Sync {
            command: Some(SyncCommands::Clear {
                kind: QueueKind::Reviews
            })
        }
    ));
}

#[test]
fn review_requires_rating() {
    assert!(Cli::try_parse_from([
        "restaviews",
        "review",
        "1",
        "--name",
        "Ana",
        "--comments",
        "Great"
    ])
    .is_err());
}
