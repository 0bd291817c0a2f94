//! In-memory storage backend
//!
//! Keeps room records in a process-local map. Every read and write operates
//! on an owned deep copy, so a caller can never mutate stored state through
//! an aliased reference. Useful for development, tests, and deployments that
//! do not need durability.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::record::SerializedRoom;
use super::{RoomStorage, StorageError};

/// Process-local room store
#[derive(Default)]
pub struct MemoryStorage {
    rooms: RwLock<HashMap<String, SerializedRoom>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held
    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }

    /// Drop every record
    pub async fn clear(&self) {
        self.rooms.write().await.clear();
        tracing::debug!("Cleared all rooms from memory storage");
    }
}

#[async_trait::async_trait]
impl RoomStorage for MemoryStorage {
    async fn save_room(&self, room: &SerializedRoom) -> Result<(), StorageError> {
        let mut rooms = self.rooms.write().await;
        rooms.insert(room.room_name.clone(), room.clone());
        tracing::debug!(room = %room.room_name, "Saved room to memory storage");
        Ok(())
    }

    async fn get_room(&self, room_name: &str) -> Result<Option<SerializedRoom>, StorageError> {
        let rooms = self.rooms.read().await;
        Ok(rooms.get(room_name).cloned())
    }

    async fn delete_room(&self, room_name: &str) -> Result<(), StorageError> {
        let mut rooms = self.rooms.write().await;
        rooms.remove(room_name);
        tracing::debug!(room = room_name, "Deleted room from memory storage");
        Ok(())
    }

    async fn list_rooms(&self) -> Result<Vec<SerializedRoom>, StorageError> {
        let rooms = self.rooms.read().await;
        Ok(rooms.values().cloned().collect())
    }

    async fn has_room(&self, room_name: &str) -> Result<bool, StorageError> {
        let rooms = self.rooms.read().await;
        Ok(rooms.contains_key(room_name))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::media::{RoomSort, SortOrder};
    use crate::room::strategy::RoomType;

    fn record(name: &str) -> SerializedRoom {
        SerializedRoom {
            room_name: name.into(),
            password: None,
            options: None,
            filters: None,
            sort: RoomSort::Random,
            room_type: RoomType::Standard,
            sort_order: SortOrder::Random,
            genre_filter_mode: None,
            rating_filter: None,
            content_rating_filter: None,
            created_at: Utc::now(),
            creator_plex_user_id: "u1".into(),
            creator_plex_username: "alice".into(),
            ratings: Default::default(),
            user_progress: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_save_get_round_trip() {
        let storage = MemoryStorage::new();
        let room = record("friday");

        storage.save_room(&room).await.unwrap();
        let loaded = storage.get_room("friday").await.unwrap().unwrap();
        assert_eq!(loaded, room);
        assert!(storage.has_room("friday").await.unwrap());
    }

    #[tokio::test]
    async fn test_returned_copy_is_detached() {
        let storage = MemoryStorage::new();
        storage.save_room(&record("friday")).await.unwrap();

        // Mutating what we got back must not affect the stored record
        let mut loaded = storage.get_room("friday").await.unwrap().unwrap();
        loaded.creator_plex_username = "mallory".into();

        let again = storage.get_room("friday").await.unwrap().unwrap();
        assert_eq!(again.creator_plex_username, "alice");
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let storage = MemoryStorage::new();
        storage.save_room(&record("friday")).await.unwrap();

        storage.delete_room("friday").await.unwrap();
        assert!(storage.get_room("friday").await.unwrap().is_none());

        // Absent room: still success
        storage.delete_room("friday").await.unwrap();
        storage.delete_room("never-existed").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_rooms() {
        let storage = MemoryStorage::new();
        storage.save_room(&record("a")).await.unwrap();
        storage.save_room(&record("b")).await.unwrap();

        let mut names: Vec<String> = storage
            .list_rooms()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.room_name)
            .collect();
        names.sort();
        assert_eq!(names, ["a", "b"]);
    }
}
