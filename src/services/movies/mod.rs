/// Movie catalog repositories
///
/// `LocalMovieRepository` serves the seeded catalog from a blob store;
/// `RemoteMovieRepository` reads and writes the `movie` table of the record
/// store. Both return the same shapes and the same filter semantics.
use crate::{
    error::AppResult,
    models::{Movie, MoviePatch, NewMovie},
};

pub mod local;
pub mod remote;

pub use local::LocalMovieRepository;
pub use remote::RemoteMovieRepository;

#[async_trait::async_trait]
pub trait MovieRepository: Send + Sync {
    /// Full catalog snapshot
    async fn get_all(&self) -> AppResult<Vec<Movie>>;

    async fn get_by_id(&self, id: &str) -> AppResult<Movie>;

    /// Movies whose mood labels include `mood` exactly
    async fn get_by_mood(&self, mood: &str) -> AppResult<Vec<Movie>>;

    /// Movies whose genre labels include `genre` exactly
    async fn get_by_genre(&self, genre: &str) -> AppResult<Vec<Movie>>;

    /// Case-insensitive match over title, synopsis and genres
    ///
    /// The query is trimmed first; a blank query returns the whole catalog.
    async fn search(&self, query: &str) -> AppResult<Vec<Movie>>;

    async fn create(&self, movie: NewMovie) -> AppResult<Movie>;

    async fn update(&self, id: &str, patch: MoviePatch) -> AppResult<Movie>;

    async fn delete(&self, id: &str) -> AppResult<()>;

    /// Legacy single-list watchlist kept for older views
    ///
    /// Only the local repository persists this list; the remote one reports
    /// success without storing anything. Use `WatchlistRepository` instead.
    async fn add_to_watchlist(&self, movie_id: &str) -> AppResult<bool>;

    /// See [`MovieRepository::add_to_watchlist`]
    async fn remove_from_watchlist(&self, movie_id: &str) -> AppResult<bool>;

    /// Catalog entries on the legacy watchlist
    async fn get_watchlist_movies(&self) -> AppResult<Vec<Movie>>;

    /// Repository name for logging and debugging
    fn name(&self) -> &'static str;
}
