//! Rating ledger types
//!
//! A rating is append-only per (media, user) pair. The durable form is the
//! compact 3-tuple `[userName, "like"|"dislike", epochMillis]`, matching the
//! on-disk room record shape.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A user's verdict on a media item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Like,
    Dislike,
}

/// One rating row in the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(String, Verdict, i64)", into = "(String, Verdict, i64)")]
pub struct Rating {
    /// Who rated
    pub user: String,
    pub verdict: Verdict,
    /// When the rating was observed, in epoch milliseconds
    pub at: i64,
}

impl Rating {
    pub fn new(user: impl Into<String>, verdict: Verdict, at: i64) -> Self {
        Self {
            user: user.into(),
            verdict,
            at,
        }
    }

    pub fn is_like(&self) -> bool {
        self.verdict == Verdict::Like
    }
}

impl From<(String, Verdict, i64)> for Rating {
    fn from((user, verdict, at): (String, Verdict, i64)) -> Self {
        Self { user, verdict, at }
    }
}

impl From<Rating> for (String, Verdict, i64) {
    fn from(rating: Rating) -> Self {
        (rating.user, rating.verdict, rating.at)
    }
}

/// Ledger of every rating ever submitted in a room, keyed by media id
///
/// Row order within a media id is arrival order.
pub type RatingLedger = HashMap<String, Vec<Rating>>;
