pub mod movie;
pub mod movie_night;
pub mod rating;
pub mod watchlist;

pub use movie::{Movie, MoviePatch, NewMovie};
pub use movie_night::{MovieNight, MovieNightPatch, NewMovieNight};
pub use rating::{
    MovieStats, NewRating, Page, PageRequest, Pagination, Rating, RatingPatch, RatingSortKey,
    RatingSummary, SortOrder,
};
pub use watchlist::{NewWatchlist, Watchlist, WatchlistPatch};

/// Appends `id` unless already present, returns whether it was added
pub fn insert_unique(ids: &mut Vec<String>, id: &str) -> bool {
    if ids.iter().any(|existing| existing == id) {
        false
    } else {
        ids.push(id.to_string());
        true
    }
}

/// Keeps the first occurrence of each id, preserving order
pub fn dedup_ids(ids: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        insert_unique(&mut out, &id);
    }
    out
}
