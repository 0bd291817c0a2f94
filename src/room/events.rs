//! Broadcast event types for room fan-out
//!
//! Every connected member of a room holds the receiving half of an unbounded
//! channel; the room pushes [`RoomEvent`]s into each member's sender. Events
//! serialize as `{ "type": ..., "payload": ... }`, the shape the transport
//! layer forwards to clients verbatim.

use serde::Serialize;
use tokio::sync::mpsc;

use crate::media::MediaItem;

/// An authenticated participant identity
///
/// Authentication itself happens upstream; the engine only consumes the
/// result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_image: Option<String>,
}

impl User {
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            avatar_image: None,
        }
    }
}

/// How far through the catalog a user is, as a fraction in `0..=1`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub user: User,
    pub progress: f64,
}

/// A detected match: the media item and everyone who liked it
///
/// `matched_at` is the latest contributing like's timestamp, in epoch
/// milliseconds. Likers are listed in the order their likes reached the
/// ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub matched_at: i64,
    pub media: MediaItem,
    pub users: Vec<String>,
}

/// Event fanned out to room members
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum RoomEvent {
    UserJoinedRoom(UserProgress),
    UserLeftRoom(User),
    UserProgress(UserProgress),
    Match(Match),
}

/// Sending half of a member's event channel
pub type EventSender = mpsc::UnboundedSender<RoomEvent>;

/// Receiving half handed to the member's connection task
pub type EventReceiver = mpsc::UnboundedReceiver<RoomEvent>;

/// Create a member event channel pair
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
