//! Room registry
//!
//! Process-wide directory of live rooms, keyed by name. The in-memory map,
//! not the durable store, is authoritative for "is this name in use" while
//! the process runs; reloading persisted rooms is the explicit
//! [`RoomRegistry::bootstrap`] step, never an implicit side effect of
//! creation. The registry is insert-only during normal operation, so the
//! only race is the check-then-insert on creation, which runs inside one
//! write-lock critical section.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::media::MediaProvider;
use crate::storage::{RoomStorage, StorageError};

use super::error::RoomError;
use super::room::{CreateRoomRequest, CreatorInfo, Room};

/// Parameters for joining a room
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomRequest {
    pub room_name: String,
    #[serde(default)]
    pub password: Option<String>,
}

/// Directory of all live rooms in this process
///
/// Constructed once at startup and threaded through the service's entry
/// points, so tests can run isolated registries side by side.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<String, Arc<Room>>>,
    providers: Vec<Arc<dyn MediaProvider>>,
    storage: Arc<dyn RoomStorage>,
}

impl RoomRegistry {
    pub fn new(providers: Vec<Arc<dyn MediaProvider>>, storage: Arc<dyn RoomStorage>) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            providers,
            storage,
        }
    }

    /// Create and register a room
    ///
    /// Fails with [`RoomError::RoomExists`] if the name is taken. The
    /// catalog load runs outside the registry lock; the occupancy check is
    /// re-run when inserting, so two concurrent creates for the same name
    /// can never both win. The record is persisted inside the same critical
    /// section, after the name is won and before the room is returned, so a
    /// losing create never touches durable state.
    pub async fn create_room(
        &self,
        req: CreateRoomRequest,
        creator: CreatorInfo,
    ) -> Result<Arc<Room>, RoomError> {
        let name = req.room_name.clone();

        // Fast fail before paying for a catalog load
        if self.rooms.read().await.contains_key(&name) {
            return Err(RoomError::RoomExists(name));
        }

        let room = Arc::new(
            Room::create(req, &self.providers, creator, Arc::clone(&self.storage)).await?,
        );

        let mut rooms = self.rooms.write().await;
        match rooms.entry(name) {
            Entry::Occupied(occupied) => {
                // Lost the race during the catalog load; the durable record
                // belongs to the winner
                Err(RoomError::RoomExists(occupied.key().clone()))
            }
            Entry::Vacant(vacant) => {
                let record = room.to_serialized().await;
                self.storage.save_room(&record).await?;
                vacant.insert(Arc::clone(&room));
                Ok(room)
            }
        }
    }

    /// Look up a room for a join attempt
    ///
    /// Password-protected rooms require an exact password match; a user who
    /// is already connected must leave before rejoining under the same
    /// identity.
    pub async fn get_room(
        &self,
        user_name: &str,
        req: &JoinRoomRequest,
    ) -> Result<Arc<Room>, RoomError> {
        let room = {
            let rooms = self.rooms.read().await;
            rooms
                .get(&req.room_name)
                .cloned()
                .ok_or_else(|| RoomError::RoomNotFound(req.room_name.clone()))?
        };

        if let Some(expected) = room.password() {
            if req.password.as_deref() != Some(expected) {
                tracing::warn!(room = %req.room_name, user = user_name, "Join denied: wrong password");
                return Err(RoomError::AccessDenied(req.room_name.clone()));
            }
        }

        if room.is_member(user_name).await {
            return Err(RoomError::UserAlreadyJoined {
                room: req.room_name.clone(),
                user: user_name.to_string(),
            });
        }

        Ok(room)
    }

    /// Reload persisted rooms into the registry
    ///
    /// An explicit startup step. Invalid or unrestorable records are skipped
    /// with a warning; names already live in the registry are left alone.
    /// Returns the number of rooms restored.
    pub async fn bootstrap(&self) -> Result<usize, StorageError> {
        let records = self.storage.list_rooms().await?;
        let mut restored = 0;

        for record in records {
            let name = record.room_name.clone();
            if self.rooms.read().await.contains_key(&name) {
                continue;
            }

            match Room::restore(record, &self.providers, Arc::clone(&self.storage)).await {
                Ok(room) => {
                    let mut rooms = self.rooms.write().await;
                    if let Entry::Vacant(vacant) = rooms.entry(name) {
                        vacant.insert(Arc::new(room));
                        restored += 1;
                    }
                }
                Err(err) => {
                    tracing::warn!(room = %name, error = %err, "Skipping unrestorable room");
                }
            }
        }

        tracing::info!(restored, "Registry bootstrap complete");
        Ok(restored)
    }

    /// Number of live rooms
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Names of all live rooms
    pub async fn room_names(&self) -> Vec<String> {
        self.rooms.read().await.keys().cloned().collect()
    }
}
