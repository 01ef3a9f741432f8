use crate::{
    error::AppResult,
    models::{MovieNight, MovieNightPatch, NewMovieNight},
};

pub mod local;
pub mod remote;

pub use local::LocalMovieNightRepository;
pub use remote::RemoteMovieNightRepository;

#[async_trait::async_trait]
pub trait MovieNightRepository: Send + Sync {
    /// All nights, latest date first
    async fn get_all(&self) -> AppResult<Vec<MovieNight>>;

    async fn get_by_id(&self, id: &str) -> AppResult<MovieNight>;

    /// Requires a theme and a date; generates the share link when absent
    async fn create(&self, night: NewMovieNight) -> AppResult<MovieNight>;

    async fn update(&self, id: &str, patch: MovieNightPatch) -> AppResult<MovieNight>;

    async fn delete(&self, id: &str) -> AppResult<()>;

    async fn add_movie(&self, night_id: &str, movie_id: &str) -> AppResult<MovieNight>;

    async fn remove_movie(&self, night_id: &str, movie_id: &str) -> AppResult<MovieNight>;

    async fn get_by_share_link(&self, share_link: &str) -> AppResult<MovieNight>;

    fn name(&self) -> &'static str;
}
