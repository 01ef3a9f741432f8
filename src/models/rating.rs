use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{AppError, AppResult};

pub const MIN_SCORE: i32 = 1;
pub const MAX_SCORE: i32 = 5;
pub const MAX_REVIEW_CHARS: usize = 500;

/// One user's score for one movie
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: String,
    pub movie_id: String,
    pub user_id: String,
    pub rating: u8,
    #[serde(default)]
    pub review: String,
    pub timestamp: DateTime<Utc>,
}

impl Rating {
    pub fn is_for(&self, movie_id: &str, user_id: &str) -> bool {
        self.movie_id == movie_id && self.user_id == user_id
    }

    pub fn apply(&mut self, patch: ValidRatingPatch, now: DateTime<Utc>) {
        if let Some(rating) = patch.rating {
            self.rating = rating;
        }
        if let Some(review) = patch.review {
            self.review = review;
        }
        self.timestamp = now;
    }
}

/// Scores outside 1..=5 are rejected
pub fn validate_score(score: i32) -> AppResult<u8> {
    if (MIN_SCORE..=MAX_SCORE).contains(&score) {
        Ok(score as u8)
    } else {
        Err(AppError::Validation(format!(
            "Rating must be between {} and {}",
            MIN_SCORE, MAX_SCORE
        )))
    }
}

pub fn validate_review(review: &str) -> AppResult<()> {
    if review.chars().count() > MAX_REVIEW_CHARS {
        return Err(AppError::Validation(format!(
            "Review must be at most {} characters",
            MAX_REVIEW_CHARS
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewRating {
    pub movie_id: String,
    pub user_id: String,
    pub rating: i32,
    #[serde(default)]
    pub review: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidNewRating {
    pub movie_id: String,
    pub user_id: String,
    pub rating: u8,
    pub review: String,
}

impl NewRating {
    pub fn validate(self) -> AppResult<ValidNewRating> {
        if self.movie_id.trim().is_empty() || self.user_id.trim().is_empty() {
            return Err(AppError::Validation(
                "Missing required fields: movieId, userId, and rating are required".to_string(),
            ));
        }
        let rating = validate_score(self.rating)?;
        let review = self.review.unwrap_or_default();
        validate_review(&review)?;

        Ok(ValidNewRating {
            movie_id: self.movie_id,
            user_id: self.user_id,
            rating,
            review,
        })
    }
}

impl ValidNewRating {
    pub fn into_rating(self, id: String, timestamp: DateTime<Utc>) -> Rating {
        Rating {
            id,
            movie_id: self.movie_id,
            user_id: self.user_id,
            rating: self.rating,
            review: self.review,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RatingPatch {
    pub rating: Option<i32>,
    pub review: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidRatingPatch {
    pub rating: Option<u8>,
    pub review: Option<String>,
}

impl RatingPatch {
    pub fn validate(self) -> AppResult<ValidRatingPatch> {
        let rating = self.rating.map(validate_score).transpose()?;
        if let Some(review) = &self.review {
            validate_review(review)?;
        }
        Ok(ValidRatingPatch {
            rating,
            review: self.review,
        })
    }
}

/// Mean score and sample size for one movie
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct RatingSummary {
    pub average: f64,
    pub count: usize,
}

/// Summary plus a histogram over the five score buckets
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieStats {
    pub average: f64,
    pub count: usize,
    pub distribution: BTreeMap<u8, usize>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RatingSortKey {
    Rating,
    #[default]
    Timestamp,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
    pub sort_by: RatingSortKey,
    pub sort_order: SortOrder,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            sort_by: RatingSortKey::Timestamp,
            sort_order: SortOrder::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}
