//! Scripted in-memory `RestaurantApi` and scheduler for engine tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::api::RestaurantApi;
use crate::error::{Error, Result};
use crate::models::{NewReview, Restaurant, RestaurantId, Review, SyncTag};
use crate::scheduler::ReplayScheduler;

pub const SERVER_UPDATED_AT: &str = "2018-08-01T00:00:00.000Z";

#[derive(Default)]
pub struct FakeApi {
    offline: AtomicBool,
    restaurants: Mutex<BTreeMap<RestaurantId, Restaurant>>,
    reviews: Mutex<Vec<Review>>,
    failing_favorites: Mutex<HashSet<RestaurantId>>,
    failing_review_names: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
    next_review_id: AtomicI64,
    latency: Mutex<Option<Duration>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            next_review_id: AtomicI64::new(100),
            ..Self::default()
        }
    }

    pub fn with_restaurants(restaurants: impl IntoIterator<Item = Restaurant>) -> Self {
        let api = Self::new();
        api.restaurants
            .lock()
            .unwrap()
            .extend(restaurants.into_iter().map(|r| (r.id, r)));
        api
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn add_review(&self, review: Review) {
        self.reviews.lock().unwrap().push(review);
    }

    pub fn fail_favorite(&self, id: RestaurantId) {
        self.failing_favorites.lock().unwrap().insert(id);
    }

    pub fn fail_review_named(&self, name: &str) {
        self.failing_review_names
            .lock()
            .unwrap()
            .insert(name.to_string());
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    pub fn server_reviews(&self) -> Vec<Review> {
        self.reviews.lock().unwrap().clone()
    }

    async fn begin(&self, call: String) -> Result<()> {
        self.calls.lock().unwrap().push(call.clone());
        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::NetworkUnavailable(format!("{call}: connection refused")));
        }
        Ok(())
    }
}

fn server_error(call: &str) -> Error {
    Error::Server {
        status: 500,
        url: call.to_string(),
    }
}

impl RestaurantApi for FakeApi {
    async fn fetch_restaurants(&self) -> Result<Vec<Restaurant>> {
        self.begin("GET /restaurants".into()).await?;
        Ok(self.restaurants.lock().unwrap().values().cloned().collect())
    }

    async fn fetch_restaurant(&self, id: RestaurantId) -> Result<Restaurant> {
        let call = format!("GET /restaurants/{id}");
        self.begin(call.clone()).await?;
        self.restaurants
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(Error::Server {
                status: 404,
                url: call,
            })
    }

    async fn set_favorite(&self, id: RestaurantId, is_favorite: bool) -> Result<Restaurant> {
        let call = format!("PUT /restaurants/{id}?is_favorite={is_favorite}");
        self.begin(call.clone()).await?;
        if self.failing_favorites.lock().unwrap().contains(&id) {
            return Err(server_error(&call));
        }

        let mut restaurants = self.restaurants.lock().unwrap();
        let restaurant = restaurants
            .entry(id)
            .or_insert_with(|| Restaurant::new(id, format!("Restaurant {id}")));
        restaurant.is_favorite = is_favorite;
        restaurant.updated_at = Some(SERVER_UPDATED_AT.to_string());
        Ok(restaurant.clone())
    }

    async fn fetch_reviews(&self, restaurant_id: RestaurantId) -> Result<Vec<Review>> {
        self.begin(format!("GET /reviews?restaurant_id={restaurant_id}"))
            .await?;
        Ok(self
            .reviews
            .lock()
            .unwrap()
            .iter()
            .filter(|review| review.restaurant_id == restaurant_id)
            .cloned()
            .collect())
    }

    async fn fetch_all_reviews(&self) -> Result<Vec<Review>> {
        self.begin("GET /reviews".into()).await?;
        Ok(self.reviews.lock().unwrap().clone())
    }

    async fn post_review(&self, review: &NewReview) -> Result<Review> {
        let call = format!("POST /reviews {}", review.name);
        self.begin(call.clone()).await?;
        if self.failing_review_names.lock().unwrap().contains(&review.name) {
            return Err(server_error(&call));
        }

        let confirmed = Review {
            id: Some(self.next_review_id.fetch_add(1, Ordering::SeqCst)),
            restaurant_id: review.restaurant_id,
            name: review.name.clone(),
            rating: review.rating,
            comments: review.comments.clone(),
            created_at: Some(review.created_at.clone()),
            updated_at: Some(SERVER_UPDATED_AT.to_string()),
            extra: serde_json::Map::new(),
        };
        self.reviews.lock().unwrap().push(confirmed.clone());
        Ok(confirmed)
    }
}

/// Records requests; optionally refuses them.
#[derive(Default)]
pub struct RecordingScheduler {
    pub refuse: bool,
    requests: Mutex<Vec<SyncTag>>,
}

impl RecordingScheduler {
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<SyncTag> {
        self.requests.lock().unwrap().clone()
    }
}

impl ReplayScheduler for RecordingScheduler {
    fn request_replay(&self, kind: SyncTag) -> Result<()> {
        if self.refuse {
            return Err(Error::Scheduler("background sync unavailable".into()));
        }
        self.requests.lock().unwrap().push(kind);
        Ok(())
    }
}

pub fn restaurant(id: RestaurantId, updated_at: &str) -> Restaurant {
    let mut restaurant = Restaurant::new(id, format!("Restaurant {id}"));
    restaurant.updated_at = Some(updated_at.to_string());
    restaurant
}

pub fn review(id: i64, restaurant_id: RestaurantId, updated_at: &str) -> Review {
    Review {
        id: Some(id),
        restaurant_id,
        name: format!("Reviewer {id}"),
        rating: 4,
        comments: "Solid".to_string(),
        created_at: Some(updated_at.to_string()),
        updated_at: Some(updated_at.to_string()),
        extra: serde_json::Map::new(),
    }
}
