use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use super::RestaurantApi;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::models::{NewReview, Restaurant, RestaurantId, Review};
use crate::util::compact_text;

/// `reqwest` client for the restaurant API.
#[derive(Clone)]
pub struct HttpRestaurantApi {
    base_url: String,
    client: Client,
}

impl HttpRestaurantApi {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|error| Error::InvalidInput(format!("failed to build HTTP client: {error}")))?;

        Ok(Self {
            base_url: config.api_base_url.clone(),
            client,
        })
    }

    /// Client with default settings against `base_url`.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let config = ClientConfig {
            api_base_url: base_url.to_string(),
            ..ClientConfig::default()
        }
        .validated()?;
        Self::new(&config)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, url: &str) -> Result<T> {
        let response = request
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|error| transport_error(url, &error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(
                "{url} returned HTTP {}: {}",
                status.as_u16(),
                compact_text(&body)
            );
            return Err(Error::Server {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|error| transport_error(url, &error))?;
        serde_json::from_str(&body).map_err(|error| {
            Error::InvalidResponse(format!("{url}: {error} in '{}'", compact_text(&body)))
        })
    }
}

impl RestaurantApi for HttpRestaurantApi {
    async fn fetch_restaurants(&self) -> Result<Vec<Restaurant>> {
        let url = self.url("/restaurants");
        self.send(self.client.get(&url), &url).await
    }

    async fn fetch_restaurant(&self, id: RestaurantId) -> Result<Restaurant> {
        let url = self.url(&format!("/restaurants/{id}"));
        self.send(self.client.get(&url), &url).await
    }

    async fn set_favorite(&self, id: RestaurantId, is_favorite: bool) -> Result<Restaurant> {
        let url = self.url(&format!("/restaurants/{id}"));
        let request = self.client.put(&url).query(&[("is_favorite", is_favorite)]);
        self.send(request, &url).await
    }

    async fn fetch_reviews(&self, restaurant_id: RestaurantId) -> Result<Vec<Review>> {
        let url = self.url("/reviews");
        let request = self
            .client
            .get(&url)
            .query(&[("restaurant_id", restaurant_id)]);
        self.send(request, &url).await
    }

    async fn fetch_all_reviews(&self) -> Result<Vec<Review>> {
        let url = self.url("/reviews");
        self.send(self.client.get(&url), &url).await
    }

    async fn post_review(&self, review: &NewReview) -> Result<Review> {
        let url = self.url("/reviews");
        self.send(self.client.post(&url).json(review), &url).await
    }
}

fn transport_error(url: &str, error: &reqwest::Error) -> Error {
    Error::NetworkUnavailable(format!("{url}: {error}"))
}
