//! Media catalog types and the provider boundary
//!
//! The engine never talks to a media server directly. Rooms are handed a set
//! of [`MediaProvider`] implementations at creation time and snapshot whatever
//! those providers return. Catalog items are immutable for the lifetime of the
//! room that fetched them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use anyhow::Result;
use async_trait::async_trait;

/// Library kind a media item belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryType {
    Movie,
    Show,
    Music,
    Photo,
}

/// A single item in a room's catalog
///
/// Immutable once fetched. The `id` is the key the rating ledger and match
/// detection operate on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    /// Unique identifier within the provider set
    pub id: String,
    #[serde(rename = "type")]
    pub library_type: LibraryType,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    pub link_url: String,
    #[serde(default)]
    pub genres: Vec<String>,
    /// Runtime in milliseconds
    #[serde(default)]
    pub duration: u64,
    /// Critic/audience rating on a 0-10 scale
    #[serde(default)]
    pub rating: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_rating: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub writers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collections: Vec<String>,
}

/// A single provider-side filter clause, e.g. `genre = ["Action"]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub key: String,
    pub operator: String,
    pub value: Vec<String>,
}

/// Legacy sort selector kept for compatibility with stored rooms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomSort {
    #[default]
    Random,
    Rating,
}

/// Catalog presentation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Newest,
    Oldest,
    #[default]
    Random,
}

/// How multiple genre filters combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenreFilterMode {
    And,
    Or,
}

/// Inclusive rating range on a 0-10 scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f32>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<RatingKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingKind {
    Critic,
    Audience,
}

/// Allow-list of content ratings, e.g. `["G", "PG", "PG-13"]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRatingFilter {
    pub ratings: Vec<String>,
}

/// The fully-resolved query a room hands to each of its providers
///
/// Providers return already-filtered, already-sorted data. The engine treats
/// the result as authoritative and does not narrow it further.
#[derive(Debug, Clone, Default)]
pub struct MediaQuery {
    pub filters: Option<Vec<Filter>>,
    pub sort_order: SortOrder,
    pub genre_filter_mode: Option<GenreFilterMode>,
    pub rating_filter: Option<RatingFilter>,
    pub content_rating_filter: Option<ContentRatingFilter>,
}

/// A room's catalog snapshot: provider results in presentation order, with
/// an id index for ledger lookups
///
/// Built once at room creation and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<MediaItem>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(items: Vec<MediaItem>) -> Self {
        let index = items
            .iter()
            .enumerate()
            .map(|(i, item)| (item.id.clone(), i))
            .collect();
        Self { items, index }
    }

    pub fn get(&self, media_id: &str) -> Option<&MediaItem> {
        self.index.get(media_id).map(|&i| &self.items[i])
    }

    pub fn contains(&self, media_id: &str) -> bool {
        self.index.contains_key(media_id)
    }

    /// Items in presentation order
    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Media catalog source (external collaborator)
///
/// Implementations cover a concrete backing server (Plex, Jellyfin, a test
/// fixture). A room queries every provider it was created with and
/// concatenates the results into its catalog snapshot.
#[async_trait]
pub trait MediaProvider: Send + Sync {
    /// Fetch media matching the query, in presentation order
    async fn get_media(&self, query: &MediaQuery) -> Result<Vec<MediaItem>>;
}
