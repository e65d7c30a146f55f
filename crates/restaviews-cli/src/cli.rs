use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use restaviews_core::SyncTag;

#[derive(Parser)]
#[command(name = "restaviews")]
#[command(about = "Browse and review restaurants, online or off")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Override the reviews API base URL
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List restaurants, optionally filtered
    #[command(alias = "ls")]
    Restaurants {
        /// Cuisine to match ("all" for any)
        #[arg(long)]
        cuisine: Option<String>,
        /// Neighborhood to match ("all" for any)
        #[arg(long)]
        neighborhood: Option<String>,
    },
    /// Show one restaurant
    Restaurant {
        /// Restaurant ID
        id: String,
    },
    /// List the cuisines and neighborhoods available for filtering
    Filters,
    /// Show reviews for a restaurant, including ones not yet sent
    Reviews {
        /// Restaurant ID
        restaurant_id: String,
    },
    /// Mark a restaurant as favorite (or unmark with --off)
    #[command(alias = "fav")]
    Favorite {
        /// Restaurant ID
        id: String,
        /// Remove the favorite mark instead
        #[arg(long)]
        off: bool,
        #[command(flatten)]
        delivery: DeliveryArgs,
    },
    /// Post a review
    Review {
        /// Restaurant ID
        restaurant_id: String,
        /// Reviewer name
        #[arg(long)]
        name: String,
        /// Rating from 1 to 5
        #[arg(long)]
        rating: i64,
        /// Review text
        #[arg(long)]
        comments: String,
        #[command(flatten)]
        delivery: DeliveryArgs,
    },
    /// Inspect and replay queued changes
    Sync {
        #[command(subcommand)]
        command: Option<SyncCommands>,
    },
}

#[derive(Args, Clone, Copy, Debug, Default)]
pub struct DeliveryArgs {
    /// Leave the change queued; it goes out on the next `sync run`
    #[arg(long, conflicts_with = "direct")]
    pub defer: bool,
    /// Skip the queue and send straight to the server
    #[arg(long)]
    pub direct: bool,
}

#[derive(Subcommand)]
pub enum SyncCommands {
    /// Replay every queued change now (default)
    Run,
    /// List queued changes
    Pending,
    /// Drop queued changes without sending them
    Clear {
        /// Which queue to clear
        #[arg(value_enum, default_value_t = QueueKind::All)]
        kind: QueueKind,
    },
    /// Keep replaying queued changes until interrupted
    Watch {
        /// Seconds between replay attempts
        #[arg(short, long, default_value = "30")]
        interval: u64,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum QueueKind {
    Favorites,
    Reviews,
    All,
}

impl QueueKind {
    pub const fn tags(self) -> &'static [SyncTag] {
        match self {
            Self::Favorites => &[SyncTag::Favorites],
            Self::Reviews => &[SyncTag::Reviews],
            Self::All => &SyncTag::ALL,
        }
    }
}
