use crate::{
    error::AppResult,
    models::{MovieStats, NewRating, Page, PageRequest, Rating, RatingPatch, RatingSummary},
};

pub mod local;
pub mod remote;
pub mod stats;

pub use local::LocalRatingRepository;
pub use remote::RemoteRatingRepository;

/// Ratings keyed by (movie, user)
///
/// A user holds at most one rating per movie. Creating a second one for the
/// same pair overwrites the first in place and keeps its id.
#[async_trait::async_trait]
pub trait RatingRepository: Send + Sync {
    async fn get_all(&self) -> AppResult<Vec<Rating>>;

    async fn get_by_id(&self, id: &str) -> AppResult<Rating>;

    async fn get_by_movie_id(&self, movie_id: &str) -> AppResult<Vec<Rating>>;

    async fn get_by_user_id(&self, user_id: &str) -> AppResult<Vec<Rating>>;

    async fn get_user_rating_for_movie(
        &self,
        movie_id: &str,
        user_id: &str,
    ) -> AppResult<Option<Rating>>;

    async fn create(&self, rating: NewRating) -> AppResult<Rating>;

    async fn update(&self, id: &str, patch: RatingPatch) -> AppResult<Rating>;

    async fn delete(&self, id: &str) -> AppResult<()>;

    async fn delete_by_movie_and_user(&self, movie_id: &str, user_id: &str) -> AppResult<()>;

    /// Mean rounded to one decimal; `{0, 0}` for an unrated movie
    async fn get_average_rating(&self, movie_id: &str) -> AppResult<RatingSummary>;

    async fn get_movie_stats(&self, movie_id: &str) -> AppResult<MovieStats>;

    async fn get_paginated(&self, request: PageRequest) -> AppResult<Page<Rating>>;

    fn name(&self) -> &'static str;
}
