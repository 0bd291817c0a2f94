//! # mediamatch
//!
//! Room matching and broadcast engine for group media discovery: several
//! participants swipe on candidate items, the room's matching policy detects
//! when enough of them agree, and every connected member hears about it.
//!
//! The crate is transport-agnostic. It consumes already-authenticated user
//! identities, takes its catalog from [`media::MediaProvider`]
//! implementations, and emits typed [`room::RoomEvent`]s for whatever layer
//! owns the client connections. Room state survives restarts through the
//! pluggable [`storage::RoomStorage`] backends.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use mediamatch::media::MediaProvider;
//! use mediamatch::room::{
//!     event_channel, CreateRoomRequest, CreatorInfo, RoomRegistry, User, Verdict,
//! };
//! use mediamatch::storage::{create_storage, StorageConfig};
//!
//! # async fn run(provider: Arc<dyn MediaProvider>) -> Result<(), Box<dyn std::error::Error>> {
//! let storage = create_storage(&StorageConfig::file("./data/rooms"));
//! let registry = RoomRegistry::new(vec![provider], storage);
//! registry.bootstrap().await?;
//!
//! let room = registry
//!     .create_room(
//!         CreateRoomRequest {
//!             room_name: "movie-night".into(),
//!             ..Default::default()
//!         },
//!         CreatorInfo {
//!             plex_user_id: "1".into(),
//!             plex_username: "alice".into(),
//!         },
//!     )
//!     .await?;
//!
//! let (tx, _rx) = event_channel();
//! room.join(User::new("alice"), tx).await?;
//! room.store_rating("alice", "movie-123", Verdict::Like, 1_700_000_000_000)
//!     .await;
//! # Ok(())
//! # }
//! ```

pub mod media;
pub mod room;
pub mod storage;

pub use media::{Catalog, MediaItem, MediaProvider, MediaQuery};
pub use room::{
    CreateRoomRequest, CreatorInfo, JoinRoomRequest, Match, Room, RoomError, RoomEvent,
    RoomRegistry, RoomType, User, Verdict,
};
pub use storage::{
    create_storage, FileStorage, MemoryStorage, RoomStorage, SerializedRoom, StorageConfig,
    StorageError,
};
