use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{dedup_ids, insert_unique};

/// A saved set of movies to watch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Watchlist {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub movie_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Watchlist {
    pub fn from_new(id: String, created_at: DateTime<Utc>, new: NewWatchlist) -> Self {
        Self {
            id,
            name: new.name,
            movie_ids: dedup_ids(new.movie_ids),
            created_at,
            category: new.category,
        }
    }

    /// Returns `true` when the id was not already present
    pub fn add_movie(&mut self, movie_id: &str) -> bool {
        insert_unique(&mut self.movie_ids, movie_id)
    }

    /// Returns `true` when the id was present
    pub fn remove_movie(&mut self, movie_id: &str) -> bool {
        let before = self.movie_ids.len();
        self.movie_ids.retain(|id| id != movie_id);
        self.movie_ids.len() != before
    }

    pub fn apply(&mut self, patch: WatchlistPatch) {
        if let Some(name) = patch.name {
            self.name = Some(name);
        }
        if let Some(category) = patch.category {
            self.category = Some(category);
        }
        if let Some(movie_ids) = patch.movie_ids {
            self.movie_ids = dedup_ids(movie_ids);
        }
    }
}

/// Newest first
pub fn sort_newest_first(watchlists: &mut [Watchlist]) {
    watchlists.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewWatchlist {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub movie_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub movie_ids: Option<Vec<String>>,
}
