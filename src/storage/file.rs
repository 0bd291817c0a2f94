//! File-backed storage backend
//!
//! Persists each room as one JSON document under a storage directory. Room
//! names are sanitized before becoming file names, so a hostile name cannot
//! escape the directory. Writes go through a temp file in the same directory
//! followed by a rename, so a crashing writer never leaves a half-written
//! record visible under the real name.

use std::path::{Path, PathBuf};

use tokio::fs;

use super::record::SerializedRoom;
use super::{RoomStorage, StorageError};

/// One-JSON-file-per-room store
pub struct FileStorage {
    storage_path: PathBuf,
}

impl FileStorage {
    /// Create a store rooted at `storage_path`
    ///
    /// The directory is created lazily and re-checked before every write, so
    /// it may be removed externally between operations without breaking the
    /// store.
    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        Self {
            storage_path: storage_path.into(),
        }
    }

    /// Directory this store writes into
    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    async fn ensure_storage_dir(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.storage_path)
            .await
            .map_err(|source| StorageError::Io {
                path: self.storage_path.clone(),
                source,
            })
    }

    /// File path for a room, with the name sanitized against path traversal
    fn room_file_path(&self, room_name: &str) -> PathBuf {
        let safe_name: String = room_name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.storage_path.join(format!("{}.json", safe_name))
    }

    async fn read_record(&self, path: &Path) -> Result<Option<SerializedRoom>, StorageError> {
        let data = match fs::read(path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StorageError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let room: SerializedRoom =
            serde_json::from_slice(&data).map_err(|source| StorageError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;

        if !room.is_valid() {
            return Err(StorageError::MissingFields {
                path: path.to_path_buf(),
            });
        }

        Ok(Some(room))
    }
}

#[async_trait::async_trait]
impl RoomStorage for FileStorage {
    async fn save_room(&self, room: &SerializedRoom) -> Result<(), StorageError> {
        self.ensure_storage_dir().await?;

        let path = self.room_file_path(&room.room_name);
        let data =
            serde_json::to_vec_pretty(room).map_err(|source| StorageError::Serialize {
                room: room.room_name.clone(),
                source,
            })?;

        // Atomic write: temp file in the same directory, then rename over the
        // target. Readers either see the old record or the new one, never a
        // partial write.
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, &data)
            .await
            .map_err(|source| StorageError::Io {
                path: tmp_path.clone(),
                source,
            })?;
        fs::rename(&tmp_path, &path)
            .await
            .map_err(|source| StorageError::Io {
                path: path.clone(),
                source,
            })?;

        tracing::debug!(room = %room.room_name, path = %path.display(), "Saved room to file");
        Ok(())
    }

    async fn get_room(&self, room_name: &str) -> Result<Option<SerializedRoom>, StorageError> {
        let path = self.room_file_path(room_name);
        self.read_record(&path).await
    }

    async fn delete_room(&self, room_name: &str) -> Result<(), StorageError> {
        let path = self.room_file_path(room_name);

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(room = room_name, "Deleted room file");
                Ok(())
            }
            // Idempotent: an absent record is already deleted
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    async fn list_rooms(&self) -> Result<Vec<SerializedRoom>, StorageError> {
        self.ensure_storage_dir().await?;

        let mut entries =
            fs::read_dir(&self.storage_path)
                .await
                .map_err(|source| StorageError::Io {
                    path: self.storage_path.clone(),
                    source,
                })?;

        let mut rooms = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(source) => {
                    return Err(StorageError::Io {
                        path: self.storage_path.clone(),
                        source,
                    })
                }
            };

            let path = entry.path();
            // `.json.tmp` leftovers have extension "tmp" and are skipped here
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            match self.read_record(&path).await {
                Ok(Some(room)) => rooms.push(room),
                Ok(None) => {} // removed between listing and reading
                Err(err) => {
                    // A single bad record must not break the whole scan
                    tracing::warn!(path = %path.display(), error = %err, "Skipping invalid room file");
                }
            }
        }

        tracing::debug!(
            count = rooms.len(),
            path = %self.storage_path.display(),
            "Listed rooms from file storage"
        );
        Ok(rooms)
    }

    async fn has_room(&self, room_name: &str) -> Result<bool, StorageError> {
        let path = self.room_file_path(room_name);
        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }
}
