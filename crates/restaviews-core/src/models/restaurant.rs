//! Restaurant model

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::wire::{lenient_i64, string_bool};
use super::MirrorRecord;

/// Restaurant primary key as assigned by the server.
pub type RestaurantId = i64;

/// Map coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// A restaurant as served by `GET /restaurants` and cached in the mirror
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    #[serde(deserialize_with = "lenient_i64")]
    pub id: RestaurantId,
    pub name: String,
    #[serde(default)]
    pub neighborhood: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub cuisine_type: String,
    #[serde(default)]
    pub operating_hours: BTreeMap<String, String>,
    /// Photograph file name without extension
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photograph: Option<String>,
    #[serde(default, with = "string_bool")]
    pub is_favorite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latlng: Option<LatLng>,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// ISO-8601 timestamp of the last server (or optimistic local) write
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Set while a local favorite toggle has not been confirmed by the server.
    /// The server never sends it, so any fetched record has it cleared.
    #[serde(
        rename = "awaitingSync",
        default,
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub awaiting_sync: bool,
    /// Fields the server sent that this model does not name
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Restaurant {
    /// Minimal restaurant, mostly useful for tests and fixtures.
    #[must_use]
    pub fn new(id: RestaurantId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            neighborhood: String::new(),
            address: String::new(),
            cuisine_type: String::new(),
            operating_hours: BTreeMap::new(),
            photograph: None,
            is_favorite: false,
            latlng: None,
            created_at: None,
            updated_at: None,
            awaiting_sync: false,
            extra: Map::new(),
        }
    }

    /// Apply an optimistic favorite change that the server has not seen yet.
    pub fn mark_favorite_pending(&mut self, is_favorite: bool, updated_at: String) {
        self.is_favorite = is_favorite;
        self.updated_at = Some(updated_at);
        self.awaiting_sync = true;
    }
}

impl MirrorRecord for Restaurant {
    fn key(&self) -> Option<i64> {
        Some(self.id)
    }

    fn updated_at(&self) -> Option<&str> {
        self.updated_at.as_deref()
    }

    fn awaiting_sync(&self) -> bool {
        self.awaiting_sync
    }
}
