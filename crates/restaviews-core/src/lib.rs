//! restaviews-core - Core library for Restaviews
//!
//! This crate contains the offline-first sync layer used by Restaviews
//! clients: the local mirror and outbox stores, the remote API client, the
//! fetch-and-reconcile and replay engines, and the mutation intent API.

pub mod api;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod scheduler;
pub mod services;
pub mod state;
pub mod sync;
pub mod util;
pub mod worker;

pub use api::{HttpRestaurantApi, RestaurantApi};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use models::{NewReview, Restaurant, RestaurantId, Review, ReviewId, SyncTag};
pub use scheduler::{ChannelScheduler, NoScheduler, ReplayScheduler, ReplayTrigger};
pub use services::StoreService;
pub use state::SyncState;
pub use sync::{FavoriteAck, ReplayReport, ReplaySummary, ReviewAck, ReviewListing, SyncEngine};
pub use worker::ReplayWorker;
