//! Room aggregate
//!
//! A room owns its rating ledger, per-user progress, and connected-member
//! set outright. All three live behind a single `Mutex`, so a rating is
//! applied as one uninterrupted step: the duplicate guard, the ledger
//! append, the progress bump, the match check, and the fan-out can never
//! interleave with another rating against the same room. Persistence runs
//! after the lock is released and is never a precondition for the in-memory
//! mutation taking effect.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::media::{
    Catalog, ContentRatingFilter, Filter, GenreFilterMode, MediaItem, MediaProvider, MediaQuery,
    RatingFilter, RoomSort, SortOrder,
};
use crate::storage::{RoomOption, RoomStorage, SerializedRoom};

use super::error::RoomError;
use super::events::{EventSender, Match, RoomEvent, User, UserProgress};
use super::rating::{Rating, RatingLedger, Verdict};
use super::strategy::RoomType;

/// Parameters for creating a room
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub room_name: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<RoomOption>>,
    #[serde(default)]
    pub filters: Option<Vec<Filter>>,
    #[serde(default)]
    pub sort: Option<RoomSort>,
    #[serde(default)]
    pub room_type: Option<RoomType>,
    #[serde(default)]
    pub sort_order: Option<SortOrder>,
    #[serde(default)]
    pub genre_filter_mode: Option<GenreFilterMode>,
    #[serde(default)]
    pub rating_filter: Option<RatingFilter>,
    #[serde(default)]
    pub content_rating_filter: Option<ContentRatingFilter>,
}

/// Identity of the user who created a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatorInfo {
    pub plex_user_id: String,
    pub plex_username: String,
}

/// What a joining member gets back: room history plus their review queue
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinSnapshot {
    pub previous_matches: Vec<Match>,
    pub media: Vec<MediaItem>,
    pub users: Vec<UserProgress>,
}

/// Mutable room state, guarded as one unit
#[derive(Default)]
struct RoomState {
    ratings: RatingLedger,
    user_progress: HashMap<String, u32>,
    /// Connected members and their event channels (transient, not persisted)
    members: HashMap<String, (User, EventSender)>,
}

/// One matching session: fixed catalog, fixed policy, live membership
pub struct Room {
    room_name: String,
    password: Option<String>,
    options: Option<Vec<RoomOption>>,
    filters: Option<Vec<Filter>>,
    sort: RoomSort,
    room_type: RoomType,
    sort_order: SortOrder,
    genre_filter_mode: Option<GenreFilterMode>,
    rating_filter: Option<RatingFilter>,
    content_rating_filter: Option<ContentRatingFilter>,
    created_at: DateTime<Utc>,
    creator: CreatorInfo,
    catalog: Catalog,
    state: Mutex<RoomState>,
    storage: Arc<dyn RoomStorage>,
}

impl Room {
    /// Create a room and load its catalog
    ///
    /// The catalog is the concatenation of every provider's results for the
    /// room's query. An empty catalog fails with [`RoomError::NoMedia`]; a
    /// room with nothing to rate must not exist. Nothing is persisted here:
    /// the registry saves the record once the room has actually won its name,
    /// so a create that loses the registration race leaves no durable trace.
    pub async fn create(
        req: CreateRoomRequest,
        providers: &[Arc<dyn MediaProvider>],
        creator: CreatorInfo,
        storage: Arc<dyn RoomStorage>,
    ) -> Result<Self, RoomError> {
        let room_type = req.room_type.unwrap_or_default();
        let sort_order = req.sort_order.unwrap_or_default();

        let query = MediaQuery {
            filters: req.filters.clone(),
            sort_order,
            genre_filter_mode: req.genre_filter_mode,
            rating_filter: req.rating_filter.clone(),
            content_rating_filter: req.content_rating_filter.clone(),
        };
        let catalog = load_catalog(providers, &query).await?;

        let room = Self {
            room_name: req.room_name,
            password: req.password,
            options: req.options,
            filters: req.filters,
            sort: req.sort.unwrap_or_default(),
            room_type,
            sort_order,
            genre_filter_mode: req.genre_filter_mode,
            rating_filter: req.rating_filter,
            content_rating_filter: req.content_rating_filter,
            created_at: Utc::now(),
            creator,
            catalog,
            state: Mutex::new(RoomState::default()),
            storage,
        };

        tracing::info!(
            room = %room.room_name,
            room_type = ?room.room_type,
            catalog_size = room.catalog.len(),
            creator = %room.creator.plex_username,
            "Room created"
        );
        Ok(room)
    }

    /// Rebuild a room from its durable record
    ///
    /// The catalog is re-fetched from the providers and membership starts
    /// empty; ratings, progress, and configuration come from the record.
    pub async fn restore(
        record: SerializedRoom,
        providers: &[Arc<dyn MediaProvider>],
        storage: Arc<dyn RoomStorage>,
    ) -> Result<Self, RoomError> {
        let query = MediaQuery {
            filters: record.filters.clone(),
            sort_order: record.sort_order,
            genre_filter_mode: record.genre_filter_mode,
            rating_filter: record.rating_filter.clone(),
            content_rating_filter: record.content_rating_filter.clone(),
        };
        let catalog = load_catalog(providers, &query).await?;

        tracing::info!(
            room = %record.room_name,
            ratings = record.ratings.len(),
            catalog_size = catalog.len(),
            "Room restored from storage"
        );

        Ok(Self {
            room_name: record.room_name,
            password: record.password,
            options: record.options,
            filters: record.filters,
            sort: record.sort,
            room_type: record.room_type,
            sort_order: record.sort_order,
            genre_filter_mode: record.genre_filter_mode,
            rating_filter: record.rating_filter,
            content_rating_filter: record.content_rating_filter,
            created_at: record.created_at,
            creator: CreatorInfo {
                plex_user_id: record.creator_plex_user_id,
                plex_username: record.creator_plex_username,
            },
            catalog,
            state: Mutex::new(RoomState {
                ratings: record.ratings,
                user_progress: record.user_progress,
                members: HashMap::new(),
            }),
            storage,
        })
    }

    pub fn name(&self) -> &str {
        &self.room_name
    }

    pub fn room_type(&self) -> RoomType {
        self.room_type
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn creator(&self) -> &CreatorInfo {
        &self.creator
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Whether `user_name` is currently a connected member
    pub async fn is_member(&self, user_name: &str) -> bool {
        self.state.lock().await.members.contains_key(user_name)
    }

    /// Connect a member and hand back the room history they missed
    ///
    /// Everyone else learns about the arrival via `userJoinedRoom`; the
    /// joiner gets the snapshot instead.
    pub async fn join(&self, user: User, sender: EventSender) -> Result<JoinSnapshot, RoomError> {
        let mut state = self.state.lock().await;

        if state.members.contains_key(&user.user_name) {
            return Err(RoomError::UserAlreadyJoined {
                room: self.room_name.clone(),
                user: user.user_name,
            });
        }

        let snapshot = JoinSnapshot {
            previous_matches: self.matches_locked(&state, &user.user_name, true),
            media: self.media_for_user_locked(&state, &user.user_name),
            users: self.users_locked(&state),
        };

        let progress = self.progress_fraction(&state, &user.user_name);
        let user_name = user.user_name.clone();
        state
            .members
            .insert(user_name.clone(), (user.clone(), sender));

        broadcast(
            &state.members,
            &RoomEvent::UserJoinedRoom(UserProgress { user, progress }),
            Some(&user_name),
        );

        tracing::info!(
            room = %self.room_name,
            user = %user_name,
            members = state.members.len(),
            "User joined room"
        );
        Ok(snapshot)
    }

    /// Disconnect a member
    ///
    /// Their ratings and progress stay in the ledger; only the live channel
    /// goes away.
    pub async fn leave(&self, user_name: &str) {
        let mut state = self.state.lock().await;

        if let Some((user, _)) = state.members.remove(user_name) {
            broadcast(
                &state.members,
                &RoomEvent::UserLeftRoom(user),
                Some(user_name),
            );
            tracing::info!(
                room = %self.room_name,
                user = user_name,
                members = state.members.len(),
                "User left room"
            );
        }
    }

    /// Record a rating and run match detection
    ///
    /// A second rating from the same user for the same item is a logged
    /// no-op, never an overwrite. On a fresh rating: the ledger and the
    /// user's progress are updated, the room's policy decides whether a
    /// match exists and whether to announce it, and a progress event goes to
    /// everyone except the author. The room record is then saved best-effort;
    /// a failed save is logged and swallowed because the in-memory state is
    /// authoritative for the running process.
    pub async fn store_rating(
        &self,
        user_name: &str,
        media_id: &str,
        verdict: Verdict,
        observed_at: i64,
    ) {
        let record = {
            let mut state = self.state.lock().await;

            let already_rated = state
                .ratings
                .get(media_id)
                .is_some_and(|rows| rows.iter().any(|r| r.user == user_name));
            if already_rated {
                tracing::warn!(
                    room = %self.room_name,
                    user = user_name,
                    media = media_id,
                    "Duplicate rating ignored"
                );
                return;
            }

            if !self.catalog.contains(media_id) {
                tracing::warn!(
                    room = %self.room_name,
                    media = media_id,
                    "Rating stored for media missing from catalog"
                );
            }

            state
                .ratings
                .entry(media_id.to_string())
                .or_default()
                .push(Rating::new(user_name, verdict, observed_at));
            let progress = *state
                .user_progress
                .entry(user_name.to_string())
                .and_modify(|p| *p += 1)
                .or_insert(1);

            let active_users: HashSet<String> = state.members.keys().cloned().collect();
            let detected = self.room_type.check_for_match(
                &state.ratings,
                &active_users,
                media_id,
                &self.catalog,
                user_name,
            );

            if let Some(found) = detected {
                if self.room_type.should_notify(&found) {
                    tracing::info!(
                        room = %self.room_name,
                        media = %found.media.id,
                        users = ?found.users,
                        "Match detected"
                    );
                    broadcast(&state.members, &RoomEvent::Match(found), None);
                }
            }

            let author = state
                .members
                .get(user_name)
                .map(|(user, _)| user.clone())
                .unwrap_or_else(|| User::new(user_name));
            broadcast(
                &state.members,
                &RoomEvent::UserProgress(UserProgress {
                    user: author,
                    progress: progress as f64 / self.catalog.len() as f64,
                }),
                Some(user_name),
            );

            self.serialized_locked(&state)
        };

        // In-memory state is already consistent; persistence is downstream
        if let Err(err) = self.storage.save_room(&record).await {
            tracing::error!(room = %self.room_name, error = %err, "Failed to persist room");
        } else {
            tracing::debug!(room = %self.room_name, "Room persisted");
        }
    }

    /// Recompute matches from the full ledger
    ///
    /// With `all_likes` every matched item is returned; without it, only
    /// matches `user_name` contributed a like to. Ledger entries whose media
    /// has dropped out of the catalog are skipped with a warning.
    pub async fn matches(&self, user_name: &str, all_likes: bool) -> Vec<Match> {
        let state = self.state.lock().await;
        self.matches_locked(&state, user_name, all_likes)
    }

    fn matches_locked(&self, state: &RoomState, user_name: &str, all_likes: bool) -> Vec<Match> {
        let active_users: HashSet<String> = state.members.keys().cloned().collect();
        let mut matches = Vec::new();

        for media_id in state.ratings.keys() {
            if !self.catalog.contains(media_id) {
                tracing::warn!(
                    room = %self.room_name,
                    media = %media_id,
                    "Skipping rated media that is no longer in the catalog"
                );
                continue;
            }

            let found = self.room_type.check_for_match(
                &state.ratings,
                &active_users,
                media_id,
                &self.catalog,
                user_name,
            );
            if let Some(found) = found {
                if all_likes || found.users.iter().any(|u| u == user_name) {
                    matches.push(found);
                }
            }
        }

        matches
    }

    /// The user's still-to-review queue, in catalog order
    pub async fn media_for_user(&self, user_name: &str) -> Vec<MediaItem> {
        let state = self.state.lock().await;
        self.media_for_user_locked(&state, user_name)
    }

    fn media_for_user_locked(&self, state: &RoomState, user_name: &str) -> Vec<MediaItem> {
        self.catalog
            .items()
            .iter()
            .filter(|item| {
                state
                    .ratings
                    .get(&item.id)
                    .map_or(true, |rows| rows.iter().all(|r| r.user != user_name))
            })
            .cloned()
            .collect()
    }

    /// Connected members with their progress fractions
    pub async fn users(&self) -> Vec<UserProgress> {
        let state = self.state.lock().await;
        self.users_locked(&state)
    }

    fn users_locked(&self, state: &RoomState) -> Vec<UserProgress> {
        state
            .members
            .values()
            .map(|(user, _)| UserProgress {
                user: user.clone(),
                progress: self.progress_fraction(state, &user.user_name),
            })
            .collect()
    }

    fn progress_fraction(&self, state: &RoomState, user_name: &str) -> f64 {
        let rated = state.user_progress.get(user_name).copied().unwrap_or(0);
        rated as f64 / self.catalog.len() as f64
    }

    /// The durable projection of this room
    pub async fn to_serialized(&self) -> SerializedRoom {
        let state = self.state.lock().await;
        self.serialized_locked(&state)
    }

    fn serialized_locked(&self, state: &RoomState) -> SerializedRoom {
        SerializedRoom {
            room_name: self.room_name.clone(),
            password: self.password.clone(),
            options: self.options.clone(),
            filters: self.filters.clone(),
            sort: self.sort,
            room_type: self.room_type,
            sort_order: self.sort_order,
            genre_filter_mode: self.genre_filter_mode,
            rating_filter: self.rating_filter.clone(),
            content_rating_filter: self.content_rating_filter.clone(),
            created_at: self.created_at,
            creator_plex_user_id: self.creator.plex_user_id.clone(),
            creator_plex_username: self.creator.plex_username.clone(),
            ratings: state.ratings.clone(),
            user_progress: state.user_progress.clone(),
        }
    }
}

async fn load_catalog(
    providers: &[Arc<dyn MediaProvider>],
    query: &MediaQuery,
) -> Result<Catalog, RoomError> {
    let mut items = Vec::new();
    for provider in providers {
        let media = provider.get_media(query).await.map_err(RoomError::Provider)?;
        items.extend(media);
    }

    if items.is_empty() {
        return Err(RoomError::NoMedia);
    }
    Ok(Catalog::new(items))
}

/// Fan an event out to every member except an optional excluded sender
///
/// Send failures mean the member's connection task has gone away; the entry
/// is cleaned up on `leave`, so failures here are ignored.
fn broadcast(
    members: &HashMap<String, (User, EventSender)>,
    event: &RoomEvent,
    exclude: Option<&str>,
) {
    for (member_name, (_, sender)) in members {
        if exclude == Some(member_name.as_str()) {
            continue;
        }
        let _ = sender.send(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::media::LibraryType;
    use crate::room::events::{event_channel, EventReceiver};
    use crate::storage::MemoryStorage;

    struct FixtureProvider {
        items: Vec<MediaItem>,
    }

    #[async_trait]
    impl MediaProvider for FixtureProvider {
        async fn get_media(&self, _query: &MediaQuery) -> anyhow::Result<Vec<MediaItem>> {
            Ok(self.items.clone())
        }
    }

    fn item(id: &str) -> MediaItem {
        MediaItem {
            id: id.into(),
            library_type: LibraryType::Movie,
            title: format!("Title {}", id),
            description: String::new(),
            tagline: None,
            year: Some(2021),
            poster_url: None,
            link_url: format!("https://example.test/{}", id),
            genres: vec![],
            duration: 0,
            rating: 6.0,
            content_rating: None,
            directors: vec![],
            writers: vec![],
            actors: vec![],
            collections: vec![],
        }
    }

    fn providers(ids: &[&str]) -> Vec<Arc<dyn MediaProvider>> {
        vec![Arc::new(FixtureProvider {
            items: ids.iter().map(|id| item(id)).collect(),
        })]
    }

    fn creator() -> CreatorInfo {
        CreatorInfo {
            plex_user_id: "creator-1".into(),
            plex_username: "alice".into(),
        }
    }

    fn request(name: &str, room_type: RoomType) -> CreateRoomRequest {
        CreateRoomRequest {
            room_name: name.into(),
            room_type: Some(room_type),
            ..Default::default()
        }
    }

    async fn new_room(name: &str, room_type: RoomType, ids: &[&str]) -> Room {
        Room::create(
            request(name, room_type),
            &providers(ids),
            creator(),
            Arc::new(MemoryStorage::new()),
        )
        .await
        .unwrap()
    }

    /// Opt into log output with e.g. `RUST_LOG=debug cargo test`
    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }

    fn drain(rx: &mut EventReceiver) -> Vec<RoomEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_empty_catalog_rejected() {
        let result = Room::create(
            request("empty", RoomType::Standard),
            &providers(&[]),
            creator(),
            Arc::new(MemoryStorage::new()),
        )
        .await;
        assert!(matches!(result, Err(RoomError::NoMedia)));
    }

    #[tokio::test]
    async fn test_create_does_not_persist() {
        let storage = Arc::new(MemoryStorage::new());
        Room::create(
            request("movie-night", RoomType::Standard),
            &providers(&["m1"]),
            creator(),
            Arc::clone(&storage) as Arc<dyn RoomStorage>,
        )
        .await
        .unwrap();

        // The record is written on registration, not here
        assert!(storage.get_room("movie-night").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_rating_is_dropped() {
        let room = new_room("r", RoomType::Standard, &["m1", "m2"]).await;

        room.store_rating("alice", "m1", Verdict::Like, 100).await;
        // Second attempt, different verdict and timestamp: dropped entirely
        room.store_rating("alice", "m1", Verdict::Dislike, 999).await;

        let record = room.to_serialized().await;
        let rows = &record.ratings["m1"];
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0], Rating::new("alice", Verdict::Like, 100));
        assert_eq!(record.user_progress["alice"], 1);
    }

    #[tokio::test]
    async fn test_progress_counts_distinct_media() {
        let room = new_room("r", RoomType::Standard, &["m1", "m2", "m3"]).await;

        room.store_rating("alice", "m1", Verdict::Like, 1).await;
        room.store_rating("alice", "m1", Verdict::Like, 2).await;
        room.store_rating("alice", "m2", Verdict::Dislike, 3).await;

        let record = room.to_serialized().await;
        assert_eq!(record.user_progress["alice"], 2);
    }

    #[tokio::test]
    async fn test_media_for_user_follows_catalog_order() {
        let room = new_room("r", RoomType::Standard, &["m1", "m2", "m3"]).await;

        room.store_rating("alice", "m2", Verdict::Like, 1).await;

        let queue = room.media_for_user("alice").await;
        let ids: Vec<&str> = queue.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["m1", "m3"]);

        // bob has rated nothing, so he sees the full catalog
        let queue = room.media_for_user("bob").await;
        assert_eq!(queue.len(), 3);
    }

    #[tokio::test]
    async fn test_movie_night_scenario() {
        init_tracing();
        let room = new_room("movie-night", RoomType::Standard, &["m1", "m2"]).await;

        let (alice_tx, mut alice_rx) = event_channel();
        let (bob_tx, mut bob_rx) = event_channel();
        room.join(User::new("alice"), alice_tx).await.unwrap();
        room.join(User::new("bob"), bob_tx).await.unwrap();
        drain(&mut alice_rx);
        drain(&mut bob_rx);

        // First like: progress moves, no match yet
        room.store_rating("alice", "m1", Verdict::Like, 100).await;
        assert!(room.matches("alice", true).await.is_empty());

        let bob_events = drain(&mut bob_rx);
        assert_eq!(bob_events.len(), 1);
        match &bob_events[0] {
            RoomEvent::UserProgress(p) => {
                assert_eq!(p.user.user_name, "alice");
                assert!((p.progress - 0.5).abs() < f64::EPSILON);
            }
            other => panic!("expected progress event, got {:?}", other),
        }
        // The author never receives their own progress event
        assert!(drain(&mut alice_rx).is_empty());

        // Second like completes the match; both members hear about it
        room.store_rating("bob", "m1", Verdict::Like, 250).await;
        let alice_events = drain(&mut alice_rx);
        let matched: Vec<&Match> = alice_events
            .iter()
            .filter_map(|e| match e {
                RoomEvent::Match(m) => Some(m),
                _ => None,
            })
            .collect();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].media.id, "m1");
        assert_eq!(matched[0].users, ["alice", "bob"]);
        assert_eq!(matched[0].matched_at, 250);
        assert!(drain(&mut bob_rx)
            .iter()
            .any(|e| matches!(e, RoomEvent::Match(_))));

        // Two dislikes never match
        room.store_rating("alice", "m2", Verdict::Dislike, 300).await;
        room.store_rating("bob", "m2", Verdict::Dislike, 350).await;

        let matches = room.matches("alice", true).await;
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].media.id, "m1");
        assert_eq!(matches[0].users, ["alice", "bob"]);
    }

    #[tokio::test]
    async fn test_solo_matches_stay_personal() {
        let room = new_room("watchlist", RoomType::Solo, &["m1", "m2"]).await;

        let (alice_tx, mut alice_rx) = event_channel();
        let (bob_tx, mut bob_rx) = event_channel();
        room.join(User::new("alice"), alice_tx).await.unwrap();
        room.join(User::new("bob"), bob_tx).await.unwrap();
        drain(&mut alice_rx);
        drain(&mut bob_rx);

        room.store_rating("alice", "m1", Verdict::Like, 100).await;

        // No match event fans out to anyone
        assert!(!drain(&mut alice_rx)
            .iter()
            .any(|e| matches!(e, RoomEvent::Match(_))));
        assert!(!drain(&mut bob_rx)
            .iter()
            .any(|e| matches!(e, RoomEvent::Match(_))));

        // But the like is queryable as alice's personal match
        let personal = room.matches("alice", false).await;
        assert_eq!(personal.len(), 1);
        assert_eq!(personal[0].users, ["alice"]);
        assert!(room.matches("bob", false).await.is_empty());
    }

    #[tokio::test]
    async fn test_join_and_leave_events() {
        let room = new_room("r", RoomType::Standard, &["m1"]).await;

        let (alice_tx, mut alice_rx) = event_channel();
        room.join(User::new("alice"), alice_tx).await.unwrap();

        let (bob_tx, mut bob_rx) = event_channel();
        let snapshot = room.join(User::new("bob"), bob_tx).await.unwrap();
        assert!(snapshot.previous_matches.is_empty());
        assert_eq!(snapshot.media.len(), 1);
        assert_eq!(snapshot.users.len(), 1); // alice, captured before bob lands

        let events = drain(&mut alice_rx);
        assert!(matches!(&events[..], [RoomEvent::UserJoinedRoom(p)] if p.user.user_name == "bob"));
        // The joiner gets the snapshot, not an event about themselves
        assert!(drain(&mut bob_rx).is_empty());

        room.leave("bob").await;
        let events = drain(&mut alice_rx);
        assert!(matches!(&events[..], [RoomEvent::UserLeftRoom(u)] if u.user_name == "bob"));
        assert!(!room.is_member("bob").await);
    }

    #[tokio::test]
    async fn test_rejoin_requires_leaving_first() {
        let room = new_room("r", RoomType::Standard, &["m1"]).await;

        let (tx, _rx) = event_channel();
        room.join(User::new("alice"), tx).await.unwrap();

        let (tx2, _rx2) = event_channel();
        let result = room.join(User::new("alice"), tx2).await;
        assert!(matches!(result, Err(RoomError::UserAlreadyJoined { .. })));

        room.leave("alice").await;
        let (tx3, _rx3) = event_channel();
        room.join(User::new("alice"), tx3).await.unwrap();
    }

    #[tokio::test]
    async fn test_restore_reproduces_room() {
        let storage = Arc::new(MemoryStorage::new());
        let room = Room::create(
            request("r", RoomType::Standard),
            &providers(&["m1", "m2"]),
            creator(),
            Arc::clone(&storage) as Arc<dyn RoomStorage>,
        )
        .await
        .unwrap();

        room.store_rating("alice", "m1", Verdict::Like, 100).await;
        room.store_rating("bob", "m1", Verdict::Like, 200).await;
        let before = room.to_serialized().await;

        let restored = Room::restore(
            before.clone(),
            &providers(&["m1", "m2"]),
            Arc::clone(&storage) as Arc<dyn RoomStorage>,
        )
        .await
        .unwrap();

        assert_eq!(restored.to_serialized().await, before);
        // Membership is transient and starts empty on reload
        assert!(restored.users().await.is_empty());
        // Match history is reconstructible from the restored ledger
        let matches = restored.matches("alice", true).await;
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].users, ["alice", "bob"]);
    }

    #[tokio::test]
    async fn test_matches_skip_media_gone_from_catalog() {
        let storage = Arc::new(MemoryStorage::new());
        let room = Room::create(
            request("r", RoomType::Standard),
            &providers(&["m1", "m2"]),
            creator(),
            Arc::clone(&storage) as Arc<dyn RoomStorage>,
        )
        .await
        .unwrap();
        room.store_rating("alice", "m1", Verdict::Like, 100).await;
        room.store_rating("bob", "m1", Verdict::Like, 200).await;

        // Provider set shrank between runs; m1 is gone on restore
        let restored = Room::restore(
            room.to_serialized().await,
            &providers(&["m2"]),
            Arc::clone(&storage) as Arc<dyn RoomStorage>,
        )
        .await
        .unwrap();

        assert!(restored.matches("alice", true).await.is_empty());
    }
}
