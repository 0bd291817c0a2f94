//! Room matching and broadcast engine
//!
//! A room is one matching session: a fixed media catalog, a fixed matching
//! policy, and a live set of connected members. Ratings flow in, the policy
//! decides when enough members agree, and events fan out to everyone who
//! should hear about it.
//!
//! # Architecture
//!
//! ```text
//!                         RoomRegistry
//!                  ┌──────────────────────────┐
//!                  │ rooms: HashMap<name,     │
//!                  │   Arc<Room> {            │
//!                  │     catalog, policy,     │
//!                  │     Mutex<ledger,        │
//!                  │       progress, members> │
//!                  │   }                      │
//!                  │ >                        │
//!                  └────────────┬─────────────┘
//!                               │
//!         store_rating() ──► ledger + progress ──► MatchStrategy
//!                               │                       │
//!                               ▼                       ▼
//!                        RoomStorage.save()      broadcast(match,
//!                        (best-effort)            progress, ...)
//! ```
//!
//! Every rating is applied as one uninterrupted step against its room, so
//! duplicate votes cannot slip past the idempotent guard and no update is
//! lost. Persistence is downstream of the in-memory mutation: a failed save
//! never corrupts a running room.

pub mod error;
pub mod events;
pub mod rating;
pub mod registry;
#[allow(clippy::module_inception)]
pub mod room;
pub mod strategy;

pub use error::RoomError;
pub use events::{event_channel, EventReceiver, EventSender, Match, RoomEvent, User, UserProgress};
pub use rating::{Rating, RatingLedger, Verdict};
pub use registry::{JoinRoomRequest, RoomRegistry};
pub use room::{CreateRoomRequest, CreatorInfo, JoinSnapshot, Room};
pub use strategy::RoomType;
