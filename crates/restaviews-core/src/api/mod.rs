//! Remote restaurant API
//!
//! The engines only talk to the server through [`RestaurantApi`], so tests
//! can swap in a scripted implementation.

mod http;

pub use http::HttpRestaurantApi;

use crate::error::Result;
use crate::models::{NewReview, Restaurant, RestaurantId, Review};

/// Endpoints of the restaurant-review server.
///
/// Every method fails with `NetworkUnavailable` on transport errors,
/// `Server` on a non-2xx status, and `InvalidResponse` when a 2xx body does
/// not decode.
#[allow(async_fn_in_trait)]
pub trait RestaurantApi {
    /// `GET /restaurants`
    async fn fetch_restaurants(&self) -> Result<Vec<Restaurant>>;

    /// `GET /restaurants/{id}`
    async fn fetch_restaurant(&self, id: RestaurantId) -> Result<Restaurant>;

    /// `PUT /restaurants/{id}?is_favorite={bool}`, returning the updated restaurant
    async fn set_favorite(&self, id: RestaurantId, is_favorite: bool) -> Result<Restaurant>;

    /// `GET /reviews?restaurant_id={id}`
    async fn fetch_reviews(&self, restaurant_id: RestaurantId) -> Result<Vec<Review>>;

    /// `GET /reviews`
    async fn fetch_all_reviews(&self) -> Result<Vec<Review>>;

    /// `POST /reviews`, returning the server-confirmed review
    async fn post_review(&self, review: &NewReview) -> Result<Review>;
}
