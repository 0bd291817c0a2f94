//! Durable room record
//!
//! [`SerializedRoom`] is the provider-independent projection of a room that
//! survives process restarts: configuration, creator identity, the rating
//! ledger, and per-user progress. Active membership and the live provider
//! bindings are deliberately absent: membership starts empty on reload and
//! the catalog is re-fetched.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::media::{
    ContentRatingFilter, Filter, GenreFilterMode, RatingFilter, RoomSort, SortOrder,
};
use crate::room::rating::RatingLedger;
use crate::room::strategy::RoomType;

/// Room behavior toggles carried through from the create request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomOption {
    EndOnFirstMatch,
}

/// One room, as stored (one JSON document per room in the file backend)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedRoom {
    pub room_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<RoomOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<Filter>>,
    pub sort: RoomSort,
    #[serde(default)]
    pub room_type: RoomType,
    #[serde(default)]
    pub sort_order: SortOrder,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre_filter_mode: Option<GenreFilterMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating_filter: Option<RatingFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_rating_filter: Option<ContentRatingFilter>,
    pub created_at: DateTime<Utc>,
    pub creator_plex_user_id: String,
    #[serde(default)]
    pub creator_plex_username: String,
    #[serde(default)]
    pub ratings: RatingLedger,
    #[serde(default)]
    pub user_progress: HashMap<String, u32>,
}

impl SerializedRoom {
    /// Whether the record carries every field required to restore a room
    ///
    /// `roomName`, `creatorPlexUserId` and `createdAt` are mandatory; records
    /// failing this check are skipped during storage scans, never surfaced.
    pub fn is_valid(&self) -> bool {
        !self.room_name.is_empty() && !self.creator_plex_user_id.is_empty()
    }
}
