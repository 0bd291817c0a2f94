//! Match detection policies
//!
//! A room picks its policy once at creation and keeps it for life. Each
//! policy is a pure decision over the accumulated ratings, never over shared
//! state, so recomputing matches from the ledger always agrees with what was
//! decided at rating time.
//!
//! | Policy    | Match condition                                   | Notify |
//! |-----------|---------------------------------------------------|--------|
//! | standard  | 2+ distinct users liked (active or not)           | yes    |
//! | unanimous | every active user liked, no extra likers         | yes    |
//! | solo      | the triggering user liked it (personal watchlist) | no     |
//! | async     | same as standard; votes persist across sessions   | yes    |

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::media::Catalog;

use super::events::Match;
use super::rating::{Rating, RatingLedger};

/// Matching policy selector, fixed for a room's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    #[default]
    Standard,
    Unanimous,
    Solo,
    /// Behaviorally identical to `Standard`; documents that votes are meant
    /// to persist across disconnects and reconnects
    Async,
}

impl RoomType {
    /// Decide whether the ratings for `media_id` constitute a match
    ///
    /// Pure function of the ledger, the currently-connected user set, the
    /// catalog, and the user whose rating triggered the check. A media id
    /// with no qualifying likes yields `None`; so does one missing from the
    /// catalog.
    pub fn check_for_match(
        &self,
        ledger: &RatingLedger,
        active_users: &HashSet<String>,
        media_id: &str,
        catalog: &Catalog,
        triggering_user: &str,
    ) -> Option<Match> {
        let rows = ledger.get(media_id)?;
        let likes: Vec<&Rating> = rows.iter().filter(|r| r.is_like()).collect();

        match self {
            RoomType::Standard | RoomType::Async => {
                if likes.len() >= 2 {
                    Self::build_match(&likes, media_id, catalog)
                } else {
                    None
                }
            }
            RoomType::Unanimous => {
                if active_users.is_empty() {
                    return None;
                }
                let likers: HashSet<&str> = likes.iter().map(|r| r.user.as_str()).collect();
                let everyone_liked = active_users.iter().all(|u| likers.contains(u.as_str()));
                // A user who has not rated yet blocks the match, and so does
                // a like from someone outside the active set
                if everyone_liked && likes.len() == active_users.len() {
                    Self::build_match(&likes, media_id, catalog)
                } else {
                    None
                }
            }
            RoomType::Solo => {
                let own_like = rows
                    .iter()
                    .find(|r| r.user == triggering_user && r.is_like())?;
                let media = catalog.get(media_id)?;
                Some(Match {
                    matched_at: own_like.at,
                    media: media.clone(),
                    users: vec![triggering_user.to_string()],
                })
            }
        }
    }

    /// Whether a detected match should fan out to room members
    ///
    /// Solo matches are personal and never broadcast.
    pub fn should_notify(&self, _match: &Match) -> bool {
        !matches!(self, RoomType::Solo)
    }

    fn build_match(likes: &[&Rating], media_id: &str, catalog: &Catalog) -> Option<Match> {
        let media = catalog.get(media_id)?;
        let matched_at = likes.iter().map(|r| r.at).max().unwrap_or(0);
        Some(Match {
            matched_at,
            media: media.clone(),
            // Liker order follows ledger append order
            users: likes.iter().map(|r| r.user.clone()).collect(),
        })
    }
}
