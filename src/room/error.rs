//! Room error types
//!
//! Error types for room creation and join operations.

use crate::storage::StorageError;

/// Error type for room and registry operations
#[derive(Debug)]
pub enum RoomError {
    /// A room with this name is already registered
    RoomExists(String),
    /// No room registered under this name
    RoomNotFound(String),
    /// Wrong password for a password-protected room
    AccessDenied(String),
    /// The user is already a connected member of the room
    UserAlreadyJoined { room: String, user: String },
    /// The configured filters matched zero media items
    NoMedia,
    /// A media provider failed while loading the catalog
    Provider(anyhow::Error),
    /// The room could not be persisted at creation time
    Storage(StorageError),
}

impl std::fmt::Display for RoomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomError::RoomExists(name) => write!(f, "Room already exists: {}", name),
            RoomError::RoomNotFound(name) => write!(f, "Room not found: {}", name),
            RoomError::AccessDenied(name) => write!(f, "Room requires a password: {}", name),
            RoomError::UserAlreadyJoined { room, user } => {
                write!(f, "{} is already a member of room {}", user, room)
            }
            RoomError::NoMedia => {
                write!(f, "There are no items with the specified filters applied")
            }
            RoomError::Provider(err) => write!(f, "Media provider failure: {}", err),
            RoomError::Storage(err) => write!(f, "Storage failure: {}", err),
        }
    }
}

impl std::error::Error for RoomError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RoomError::Provider(err) => Some(&**err),
            RoomError::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StorageError> for RoomError {
    fn from(err: StorageError) -> Self {
        RoomError::Storage(err)
    }
}
