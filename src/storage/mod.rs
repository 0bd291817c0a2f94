//! Room persistence
//!
//! Rooms persist their serializable projection through the [`RoomStorage`]
//! trait so the engine survives process restarts without caring where the
//! bytes live. Two backends ship with the crate:
//!
//! - [`MemoryStorage`]: process-local map, deep-copied on every operation.
//!   No durability across restarts; the default.
//! - [`FileStorage`]: one JSON document per room with atomic writes
//!   (temp file + rename in the same directory).
//!
//! Persistence is always downstream of an in-memory mutation taking effect:
//! a failed save is logged by the caller and never corrupts a running room.

pub mod file;
pub mod memory;
pub mod record;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use record::{RoomOption, SerializedRoom};

/// Error type for storage backend failures
///
/// "Room not found" is not an error anywhere in this API: reads return
/// `Option` and deletes are idempotent.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed room record at {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize room {room}: {source}")]
    Serialize {
        room: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("room record at {path} is missing required fields")]
    MissingFields { path: PathBuf },
}

/// Durable store for room records
///
/// All operations are safe to call repeatedly and must never expose partial
/// writes to readers.
#[async_trait]
pub trait RoomStorage: Send + Sync {
    /// Save or overwrite a room record
    async fn save_room(&self, room: &SerializedRoom) -> Result<(), StorageError>;

    /// Fetch a room record by name; `None` if absent
    async fn get_room(&self, room_name: &str) -> Result<Option<SerializedRoom>, StorageError>;

    /// Delete a room record; deleting an absent room is success
    async fn delete_room(&self, room_name: &str) -> Result<(), StorageError>;

    /// List every valid room record, skipping malformed ones
    async fn list_rooms(&self) -> Result<Vec<SerializedRoom>, StorageError>;

    /// Whether a record exists for this room name
    async fn has_room(&self, room_name: &str) -> Result<bool, StorageError>;
}

/// Storage backend selection
#[derive(Debug, Clone, Default)]
pub enum StorageConfig {
    /// Process-local only; rooms do not survive a restart
    #[default]
    Memory,
    /// One JSON file per room under the given directory
    File { path: PathBuf },
}

impl StorageConfig {
    /// File-backed storage rooted at `path`
    pub fn file(path: impl Into<PathBuf>) -> Self {
        StorageConfig::File { path: path.into() }
    }
}

/// Build a storage backend from its configuration
pub fn create_storage(config: &StorageConfig) -> Arc<dyn RoomStorage> {
    match config {
        StorageConfig::Memory => {
            tracing::info!("Using in-memory storage (rooms will not persist on restart)");
            Arc::new(MemoryStorage::new())
        }
        StorageConfig::File { path } => {
            tracing::info!(path = %path.display(), "Using file storage");
            Arc::new(FileStorage::new(path.clone()))
        }
    }
}
