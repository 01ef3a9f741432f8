use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::{
    db::remote::{
        codec::{self, ID_FIELD},
        record_from, single_record, Operator, Record, RecordQuery, RecordStore, SortDirection,
    },
    error::{AppError, AppResult},
    models::{
        rating::validate_score, MovieStats, NewRating, Page, PageRequest, Rating, RatingPatch,
        RatingSummary,
    },
    services::ratings::{stats, RatingRepository},
};

const TABLE: &str = "rating";
const FIELDS: &[&str] = &[ID_FIELD, "movie_id", "user_id", "rating", "review", "timestamp"];

pub struct RemoteRatingRepository {
    store: Arc<dyn RecordStore>,
}

fn not_found() -> AppError {
    AppError::NotFound("Rating not found".to_string())
}

fn fields() -> Vec<String> {
    FIELDS.iter().map(|f| f.to_string()).collect()
}

pub(crate) fn rating_from_record(record: &Record) -> AppResult<Rating> {
    let score = codec::int_field(record, "rating").unwrap_or_default();
    let rating = i32::try_from(score)
        .ok()
        .and_then(|score| validate_score(score).ok())
        .ok_or_else(|| AppError::Remote(format!("Rating record has an invalid score: {}", score)))?;

    Ok(Rating {
        id: codec::record_id(record)?,
        movie_id: codec::required_str(record, "movie_id")?,
        user_id: codec::required_str(record, "user_id")?,
        rating,
        review: codec::str_field(record, "review").unwrap_or_default(),
        timestamp: codec::timestamp_field(record, "timestamp").unwrap_or_default(),
    })
}

fn timestamp_value(timestamp: DateTime<Utc>) -> serde_json::Value {
    json!(timestamp.to_rfc3339())
}

impl RemoteRatingRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    fn query() -> RecordQuery {
        RecordQuery::new(FIELDS).order_by("timestamp", SortDirection::Desc)
    }

    async fn fetch(&self, query: RecordQuery) -> AppResult<Vec<Rating>> {
        self.store
            .fetch_records(TABLE, query)
            .await?
            .iter()
            .map(rating_from_record)
            .collect()
    }

    async fn find(&self, id: &str) -> AppResult<(i64, Rating)> {
        let record_id = codec::parse_record_id(id, "Rating")?;
        let record = self
            .store
            .get_record_by_id(TABLE, record_id, fields())
            .await?
            .ok_or_else(not_found)?;
        Ok((record_id, rating_from_record(&record)?))
    }

    async fn for_movie(&self, movie_id: &str) -> AppResult<Vec<Rating>> {
        let mut ratings = self
            .fetch(Self::query().filter("movie_id", Operator::EqualTo, movie_id))
            .await?;
        ratings.retain(|r| r.movie_id == movie_id);
        Ok(ratings)
    }

    async fn write(&self, record: Record, id: &str) -> AppResult<Rating> {
        let outcomes = self.store.update_records(TABLE, vec![record]).await?;
        let record = single_record(TABLE, "update", outcomes)?;
        match rating_from_record(&record) {
            Ok(rating) => Ok(rating),
            Err(_) => self.get_by_id(id).await,
        }
    }

    async fn remove(&self, record_id: i64) -> AppResult<()> {
        let outcomes = self.store.delete_records(TABLE, vec![record_id]).await?;
        single_record(TABLE, "delete", outcomes)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl RatingRepository for RemoteRatingRepository {
    async fn get_all(&self) -> AppResult<Vec<Rating>> {
        self.fetch(Self::query()).await
    }

    async fn get_by_id(&self, id: &str) -> AppResult<Rating> {
        Ok(self.find(id).await?.1)
    }

    async fn get_by_movie_id(&self, movie_id: &str) -> AppResult<Vec<Rating>> {
        self.for_movie(movie_id).await
    }

    async fn get_by_user_id(&self, user_id: &str) -> AppResult<Vec<Rating>> {
        let mut ratings = self
            .fetch(Self::query().filter("user_id", Operator::EqualTo, user_id))
            .await?;
        ratings.retain(|r| r.user_id == user_id);
        Ok(ratings)
    }

    async fn get_user_rating_for_movie(
        &self,
        movie_id: &str,
        user_id: &str,
    ) -> AppResult<Option<Rating>> {
        let ratings = self
            .fetch(
                RecordQuery::new(FIELDS)
                    .filter("movie_id", Operator::EqualTo, movie_id)
                    .filter("user_id", Operator::EqualTo, user_id),
            )
            .await?;
        Ok(ratings.into_iter().find(|r| r.is_for(movie_id, user_id)))
    }

    async fn create(&self, rating: NewRating) -> AppResult<Rating> {
        let rating = rating.validate()?;
        let now = Utc::now();

        let saved = match self
            .get_user_rating_for_movie(&rating.movie_id, &rating.user_id)
            .await?
        {
            Some(existing) => {
                let record_id = codec::parse_record_id(&existing.id, "Rating")?;
                let record = record_from([
                    (ID_FIELD, json!(record_id)),
                    ("rating", json!(rating.rating)),
                    ("review", json!(rating.review)),
                    ("timestamp", timestamp_value(now)),
                ]);
                self.write(record, &existing.id).await?
            }
            None => {
                let record = record_from([
                    ("movie_id", json!(rating.movie_id)),
                    ("user_id", json!(rating.user_id)),
                    ("rating", json!(rating.rating)),
                    ("review", json!(rating.review)),
                    ("timestamp", timestamp_value(now)),
                ]);
                let outcomes = self.store.create_records(TABLE, vec![record]).await?;
                rating_from_record(&single_record(TABLE, "create", outcomes)?)?
            }
        };

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
        let (record_id, _) = self.find(id).await?;

        let mut record = record_from([
            (ID_FIELD, json!(record_id)),
            ("timestamp", timestamp_value(Utc::now())),
        ]);
        if let Some(rating) = patch.rating {
            record.insert("rating".to_string(), json!(rating));
        }
        if let Some(review) = patch.review {
            record.insert("review".to_string(), json!(review));
        }

        self.write(record, id).await
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let (record_id, _) = self.find(id).await?;
        self.remove(record_id).await?;

        tracing::info!(rating_id = %id, "Rating deleted");
        Ok(())
    }

    async fn delete_by_movie_and_user(&self, movie_id: &str, user_id: &str) -> AppResult<()> {
        let existing = self
            .get_user_rating_for_movie(movie_id, user_id)
            .await?
            .ok_or_else(not_found)?;
        self.remove(codec::parse_record_id(&existing.id, "Rating")?)
            .await?;

        tracing::info!(movie_id = %movie_id, user_id = %user_id, "Rating deleted");
        Ok(())
    }

    async fn get_average_rating(&self, movie_id: &str) -> AppResult<RatingSummary> {
        Ok(stats::summarize(&self.for_movie(movie_id).await?))
    }

    async fn get_movie_stats(&self, movie_id: &str) -> AppResult<MovieStats> {
        Ok(stats::movie_stats(&self.for_movie(movie_id).await?))
    }

    async fn get_paginated(&self, request: PageRequest) -> AppResult<Page<Rating>> {
        stats::paginate(self.get_all().await?, request)
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::remote::{MockRecordStore, RecordOutcome};

    fn rating_record(id: i64, movie_id: &str, user_id: &str, score: i64) -> Record {
        json!({
            "Id": id,
            "movie_id": movie_id,
            "user_id": user_id,
            "rating": score,
            "review": "",
            "timestamp": "2024-03-01T10:00:00Z"
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    fn echo(records: Vec<Record>) -> Vec<RecordOutcome> {
        records
            .into_iter()
            .map(|data| RecordOutcome {
                success: true,
                message: None,
                data: Some(data),
            })
            .collect()
    }

    fn new_rating(score: i32) -> NewRating {
        NewRating {
            movie_id: "12".to_string(),
            user_id: "ana".to_string(),
            rating: score,
            review: None,
        }
    }

    #[test]
    fn test_rating_from_record_accepts_string_scores() {
        let mut record = rating_record(1, "12", "ana", 0);
        record.insert("rating".to_string(), json!("4"));
        assert_eq!(rating_from_record(&record).unwrap().rating, 4);
    }

    #[test]
    fn test_rating_from_record_rejects_out_of_range() {
        let err = rating_from_record(&rating_record(1, "12", "ana", 9)).unwrap_err();
        assert!(matches!(err, AppError::Remote(_)));
    }

    #[tokio::test]
    async fn test_create_inserts_when_pair_is_new() {
        let mut store = MockRecordStore::new();
        store.expect_fetch_records().returning(|_, _| Ok(vec![]));
        store.expect_update_records().never();
        store
            .expect_create_records()
            .withf(|table, records| table == TABLE && records[0]["rating"] == json!(4))
            .returning(|_, records| {
                let mut record = records[0].clone();
                record.insert("Id".to_string(), json!(77));
                Ok(echo(vec![record]))
            });

        let repo = RemoteRatingRepository::new(Arc::new(store));
        let created = repo.create(new_rating(4)).await.unwrap();
        assert_eq!(created.id, "77");
        assert_eq!(created.user_id, "ana");
    }

    #[tokio::test]
    async fn test_create_overwrites_existing_pair() {
        let mut store = MockRecordStore::new();
        store
            .expect_fetch_records()
            .returning(|_, _| Ok(vec![rating_record(5, "12", "ana", 2)]));
        store.expect_create_records().never();
        store
            .expect_update_records()
            .withf(|_, records| records[0]["Id"] == json!(5) && records[0]["rating"] == json!(5))
            .returning(|_, _| Ok(echo(vec![rating_record(5, "12", "ana", 5)])));

        let repo = RemoteRatingRepository::new(Arc::new(store));
        let saved = repo.create(new_rating(5)).await.unwrap();
        assert_eq!(saved.id, "5");
        assert_eq!(saved.rating, 5);
    }

    #[tokio::test]
    async fn test_create_rejects_score_without_calling_backend() {
        let mut store = MockRecordStore::new();
        store.expect_fetch_records().never();
        store.expect_create_records().never();

        let repo = RemoteRatingRepository::new(Arc::new(store));
        assert!(repo.create(new_rating(6)).await.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_average_ignores_other_movies() {
        let mut store = MockRecordStore::new();
        store.expect_fetch_records().returning(|_, _| {
            Ok(vec![
                rating_record(1, "12", "ana", 4),
                rating_record(2, "12", "ben", 5),
                rating_record(3, "120", "cy", 1),
            ])
        });

        let repo = RemoteRatingRepository::new(Arc::new(store));
        let summary = repo.get_average_rating("12").await.unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.average, 4.5);
    }

    #[tokio::test]
    async fn test_delete_by_movie_and_user_not_found() {
        let mut store = MockRecordStore::new();
        store.expect_fetch_records().returning(|_, _| Ok(vec![]));
        store.expect_delete_records().never();

        let repo = RemoteRatingRepository::new(Arc::new(store));
        let err = repo.delete_by_movie_and_user("12", "ana").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_get_paginated_validates_request() {
        let mut store = MockRecordStore::new();
        store.expect_fetch_records().returning(|_, _| Ok(vec![]));

        let repo = RemoteRatingRepository::new(Arc::new(store));
        let err = repo
            .get_paginated(PageRequest {
                limit: 0,
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }
}
