//! Outbox models: user mutations waiting for server confirmation

use std::fmt;

use serde::{Deserialize, Serialize};

use super::restaurant::RestaurantId;
use super::review::NewReview;

/// Auto-incremented id of a pending review, local to this device.
pub type LocalId = i64;

/// Which outbox queue a replay request or store operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncTag {
    Favorites,
    Reviews,
}

impl SyncTag {
    pub const ALL: [Self; 2] = [Self::Favorites, Self::Reviews];

    /// Background-sync registration name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Favorites => "syncFavorites",
            Self::Reviews => "syncReviews",
        }
    }
}

impl fmt::Display for SyncTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latest desired favorite state for one restaurant.
///
/// At most one exists per restaurant; re-queueing replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingFavorite {
    pub restaurant_id: RestaurantId,
    pub is_favorite: bool,
    pub queued_at: String,
}

/// A review waiting to be POSTed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingReview {
    pub local_id: LocalId,
    pub review: NewReview,
    pub queued_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_tags_use_registration_names() {
        assert_eq!(SyncTag::Favorites.to_string(), "syncFavorites");
        assert_eq!(SyncTag::Reviews.to_string(), "syncReviews");
    }
}
