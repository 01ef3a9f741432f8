use std::sync::Arc;

use chrono::Utc;

use crate::{
    db::BlobStore,
    error::{AppError, AppResult},
    models::{MovieStats, NewRating, Page, PageRequest, Rating, RatingPatch, RatingSummary},
    services::{
        delay::Latency,
        ids::IdGenerator,
        local_collection::LocalCollection,
        ratings::{stats, RatingRepository},
    },
};

pub const RATINGS_KEY: &str = "moodflix_ratings";

pub struct LocalRatingRepository {
    ratings: LocalCollection<Rating>,
    ids: Arc<IdGenerator>,
    latency: Latency,
}

impl LocalRatingRepository {
    /// Ratings ship without seed data
    pub async fn load(
        store: Arc<dyn BlobStore>,
        ids: Arc<IdGenerator>,
        latency: Latency,
    ) -> AppResult<Self> {
        Ok(Self {
            ratings: LocalCollection::load(RATINGS_KEY, store, Vec::new()).await?,
            ids,
            latency,
        })
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Rating not found".to_string())
}

#[async_trait::async_trait]
impl RatingRepository for LocalRatingRepository {
    async fn get_all(&self) -> AppResult<Vec<Rating>> {
        self.latency.medium().await;
        Ok(self.ratings.snapshot().await)
    }

    async fn get_by_id(&self, id: &str) -> AppResult<Rating> {
        self.latency.short().await;
        self.ratings.find(|r| r.id == id).await.ok_or_else(not_found)
    }

    async fn get_by_movie_id(&self, movie_id: &str) -> AppResult<Vec<Rating>> {
        self.latency.short().await;
        Ok(self.ratings.filter(|r| r.movie_id == movie_id).await)
    }

    async fn get_by_user_id(&self, user_id: &str) -> AppResult<Vec<Rating>> {
        self.latency.short().await;
        Ok(self.ratings.filter(|r| r.user_id == user_id).await)
    }

    async fn get_user_rating_for_movie(
        &self,
        movie_id: &str,
        user_id: &str,
    ) -> AppResult<Option<Rating>> {
        self.latency.short().await;
        Ok(self.ratings.find(|r| r.is_for(movie_id, user_id)).await)
    }

    async fn create(&self, rating: NewRating) -> AppResult<Rating> {
        let rating = rating.validate()?;
        self.latency.medium().await;

        let now = Utc::now();
        let fresh_id = self.ids.next_id();
        let saved = self
            .ratings
            .mutate(move |ratings| {
                if let Some(existing) = ratings
                    .iter_mut()
                    .find(|r| r.is_for(&rating.movie_id, &rating.user_id))
                {
                    existing.rating = rating.rating;
                    existing.review = rating.review;
                    existing.timestamp = now;
                    return Ok(existing.clone());
                }

                let created = rating.into_rating(fresh_id, now);
                ratings.push(created.clone());
                Ok(created)
            })
            .await?;

        tracing::info!(
            rating_id = %saved.id,
            movie_id = %saved.movie_id,
            user_id = %saved.user_id,
            score = saved.rating,
            "Rating saved"
        );
        Ok(saved)
    }

    async fn update(&self, id: &str, patch: RatingPatch) -> AppResult<Rating> {
        let patch = patch.validate()?;
        self.latency.medium().await;

        let now = Utc::now();
        self.ratings
            .mutate(|ratings| {
                let rating = ratings.iter_mut().find(|r| r.id == id).ok_or_else(not_found)?;
                rating.apply(patch, now);
                Ok(rating.clone())
            })
            .await
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        self.latency.short().await;
        self.ratings
            .mutate(|ratings| {
                let index = ratings.iter().position(|r| r.id == id).ok_or_else(not_found)?;
                ratings.remove(index);
                Ok(())
            })
            .await?;

        tracing::info!(rating_id = %id, "Rating deleted");
        Ok(())
    }

    async fn delete_by_movie_and_user(&self, movie_id: &str, user_id: &str) -> AppResult<()> {
        self.latency.short().await;
        self.ratings
            .mutate(|ratings| {
                let index = ratings
                    .iter()
                    .position(|r| r.is_for(movie_id, user_id))
                    .ok_or_else(not_found)?;
                ratings.remove(index);
                Ok(())
            })
            .await?;

        tracing::info!(movie_id = %movie_id, user_id = %user_id, "Rating deleted");
        Ok(())
    }

    async fn get_average_rating(&self, movie_id: &str) -> AppResult<RatingSummary> {
        self.latency.short().await;
        let ratings = self.ratings.filter(|r| r.movie_id == movie_id).await;
        Ok(stats::summarize(&ratings))
    }

    async fn get_movie_stats(&self, movie_id: &str) -> AppResult<MovieStats> {
        self.latency.short().await;
        let ratings = self.ratings.filter(|r| r.movie_id == movie_id).await;
        Ok(stats::movie_stats(&ratings))
    }

    async fn get_paginated(&self, request: PageRequest) -> AppResult<Page<Rating>> {
        self.latency.medium().await;
        stats::paginate(self.ratings.snapshot().await, request)
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
