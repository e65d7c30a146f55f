//! Data models for Restaviews

mod outbox;
mod restaurant;
mod review;
pub mod wire;

pub use outbox::{LocalId, PendingFavorite, PendingReview, SyncTag};
pub use restaurant::{LatLng, Restaurant, RestaurantId};
pub use review::{NewReview, Review, ReviewId, MAX_RATING, MIN_RATING};
pub use wire::normalize_id;

/// A server entity cached in the local mirror.
///
/// Reconciliation only needs the key, the server's `updatedAt`, and whether
/// the cached copy carries an unconfirmed local write.
pub trait MirrorRecord {
    /// Numeric primary key, `None` until the server has assigned one
    fn key(&self) -> Option<i64>;

    /// Last update timestamp, compared for equality only
    fn updated_at(&self) -> Option<&str>;

    /// Whether an optimistic local write is waiting for the server
    fn awaiting_sync(&self) -> bool {
        false
    }
}
