//! Review models

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::restaurant::RestaurantId;
use super::wire::{lenient_i64, lenient_i64_opt};
use super::MirrorRecord;
use crate::error::{Error, Result};
use crate::util::iso_timestamp_now;

/// Review primary key as assigned by the server.
pub type ReviewId = i64;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// A server-confirmed review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(
        default,
        deserialize_with = "lenient_i64_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<ReviewId>,
    /// Not enforced referentially; a review may point at a restaurant the
    /// mirror has never seen.
    #[serde(deserialize_with = "lenient_i64")]
    pub restaurant_id: RestaurantId,
    pub name: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub rating: i64,
    #[serde(default)]
    pub comments: String,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MirrorRecord for Review {
    fn key(&self) -> Option<i64> {
        self.id
    }

    fn updated_at(&self) -> Option<&str> {
        self.updated_at.as_deref()
    }
}

/// A review written by the user, exactly as it is POSTed to `/reviews`.
///
/// Carries no id of its own; the outbox's local id lives on [`PendingReview`]
/// so it can never leak into the request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    pub restaurant_id: RestaurantId,
    pub name: String,
    pub rating: i64,
    pub comments: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl NewReview {
    /// Validate and stamp a review for submission.
    pub fn new(
        restaurant_id: RestaurantId,
        name: &str,
        rating: i64,
        comments: &str,
    ) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("review name cannot be empty".into()));
        }
        let comments = comments.trim();
        if comments.is_empty() {
            return Err(Error::InvalidInput("review comments cannot be empty".into()));
        }
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(Error::InvalidInput(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}, got {rating}"
            )));
        }

        Ok(Self {
            restaurant_id,
            name: name.to_string(),
            rating,
            comments: comments.to_string(),
            created_at: iso_timestamp_now(),
        })
    }
}
