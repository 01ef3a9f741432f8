use crate::{
    error::AppResult,
    models::{NewWatchlist, Watchlist, WatchlistPatch},
};

pub mod local;
pub mod remote;

pub use local::LocalWatchlistRepository;
pub use remote::RemoteWatchlistRepository;

#[async_trait::async_trait]
pub trait WatchlistRepository: Send + Sync {
    /// All watchlists, newest-created first
    async fn get_all(&self) -> AppResult<Vec<Watchlist>>;

    async fn get_by_id(&self, id: &str) -> AppResult<Watchlist>;

    async fn create(&self, watchlist: NewWatchlist) -> AppResult<Watchlist>;

    async fn update(&self, id: &str, patch: WatchlistPatch) -> AppResult<Watchlist>;

    async fn delete(&self, id: &str) -> AppResult<()>;

    /// Adds `movie_id` once; repeated calls leave the list unchanged
    async fn add_movie(&self, watchlist_id: &str, movie_id: &str) -> AppResult<Watchlist>;

    /// Removes `movie_id` from every watchlist
    ///
    /// Returns how many watchlists contained it.
    async fn remove_movie(&self, movie_id: &str) -> AppResult<usize>;

    async fn get_by_category(&self, category: &str) -> AppResult<Vec<Watchlist>>;

    fn name(&self) -> &'static str;
}
