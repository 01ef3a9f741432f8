use std::sync::Arc;

use serde_json::{json, Value};

use crate::{
    db::remote::{
        codec::{self, ID_FIELD},
        merge_records, record_from, single_record, Operator, Record, RecordQuery, RecordStore,
        SortDirection,
    },
    error::{AppError, AppResult},
    models::{movie::search_needle, Movie, MoviePatch, NewMovie},
    services::movies::MovieRepository,
};

const TABLE: &str = "movie";
const FIELDS: &[&str] = &[
    ID_FIELD,
    "title",
    "year",
    "poster",
    "rating",
    "runtime",
    "synopsis",
    "trailer_url",
    "genres",
    "moods",
    "CreatedOn",
];

pub struct RemoteMovieRepository {
    store: Arc<dyn RecordStore>,
}

impl RemoteMovieRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    fn query() -> RecordQuery {
        RecordQuery::new(FIELDS).order_by("CreatedOn", SortDirection::Desc)
    }

    async fn fetch(&self, query: RecordQuery) -> AppResult<Vec<Movie>> {
        self.store
            .fetch_records(TABLE, query)
            .await?
            .iter()
            .map(movie_from_record)
            .collect()
    }

    /// The stored record and its numeric id
    async fn find(&self, id: &str) -> AppResult<(i64, Record)> {
        let record_id = codec::parse_record_id(id, "Movie")?;
        let record = self
            .store
            .get_record_by_id(TABLE, record_id, fields())
            .await?
            .ok_or_else(not_found)?;
        Ok((record_id, record))
    }
}

fn fields() -> Vec<String> {
    FIELDS.iter().map(|f| f.to_string()).collect()
}

fn not_found() -> AppError {
    AppError::NotFound("Movie not found".to_string())
}

fn i32_field(record: &Record, name: &str) -> AppResult<i32> {
    let value = codec::int_field(record, name).unwrap_or_default();
    i32::try_from(value)
        .map_err(|_| AppError::Remote(format!("Movie field {} is out of range: {}", name, value)))
}

pub(crate) fn movie_from_record(record: &Record) -> AppResult<Movie> {
    Ok(Movie {
        id: codec::record_id(record)?,
        title: codec::str_field(record, "title").unwrap_or_default(),
        year: i32_field(record, "year")?,
        poster: codec::str_field(record, "poster").unwrap_or_default(),
        rating: codec::float_field(record, "rating").unwrap_or_default(),
        runtime: i32_field(record, "runtime")?,
        synopsis: codec::str_field(record, "synopsis").unwrap_or_default(),
        trailer_url: codec::str_field(record, "trailer_url").filter(|url| !url.is_empty()),
        genres: codec::list_field(record, "genres"),
        moods: codec::list_field(record, "moods"),
    })
}

fn new_movie_record(movie: &NewMovie) -> Record {
    record_from([
        ("title", json!(movie.title)),
        ("year", json!(movie.year)),
        ("poster", json!(movie.poster)),
        ("rating", json!(movie.rating)),
        ("runtime", json!(movie.runtime)),
        ("synopsis", json!(movie.synopsis)),
        (
            "trailer_url",
            json!(movie.trailer_url.clone().unwrap_or_default()),
        ),
        ("genres", json!(codec::join_list(&movie.genres))),
        ("moods", json!(codec::join_list(&movie.moods))),
    ])
}

fn patch_record(id: i64, patch: &MoviePatch) -> Record {
    let mut record = record_from([(ID_FIELD, json!(id))]);
    let mut put = |field: &'static str, value: Option<Value>| {
        if let Some(value) = value {
            record.insert(field.to_string(), value);
        }
    };

    put("title", patch.title.as_ref().map(|v| json!(v)));
    put("year", patch.year.map(|v| json!(v)));
    put("poster", patch.poster.as_ref().map(|v| json!(v)));
    put("rating", patch.rating.map(|v| json!(v)));
    put("runtime", patch.runtime.map(|v| json!(v)));
    put("synopsis", patch.synopsis.as_ref().map(|v| json!(v)));
    put("trailer_url", patch.trailer_url.as_ref().map(|v| json!(v)));
    put("genres", patch.genres.as_ref().map(|v| json!(codec::join_list(v))));
    put("moods", patch.moods.as_ref().map(|v| json!(codec::join_list(v))));
    record
}

#[async_trait::async_trait]
impl MovieRepository for RemoteMovieRepository {
    async fn get_all(&self) -> AppResult<Vec<Movie>> {
        self.fetch(Self::query()).await
    }

    async fn get_by_id(&self, id: &str) -> AppResult<Movie> {
        movie_from_record(&self.find(id).await?.1)
    }

    async fn get_by_mood(&self, mood: &str) -> AppResult<Vec<Movie>> {
        // Contains narrows on the joined string; membership is checked here
        let mut movies = self
            .fetch(Self::query().filter("moods", Operator::Contains, mood))
            .await?;
        movies.retain(|m| m.has_mood(mood));
        Ok(movies)
    }

    async fn get_by_genre(&self, genre: &str) -> AppResult<Vec<Movie>> {
        let mut movies = self
            .fetch(Self::query().filter("genres", Operator::Contains, genre))
            .await?;
        movies.retain(|m| m.has_genre(genre));
        Ok(movies)
    }

    async fn search(&self, query: &str) -> AppResult<Vec<Movie>> {
        // The backend has no OR across fields and its Contains is case-sensitive
        let mut movies = self.fetch(Self::query()).await?;
        if let Some(needle) = search_needle(query) {
            movies.retain(|m| m.matches_search(&needle));
        }

        tracing::info!(query = %query, results = movies.len(), "Movie search completed");
        Ok(movies)
    }

    async fn create(&self, movie: NewMovie) -> AppResult<Movie> {
        let outcomes = self
            .store
            .create_records(TABLE, vec![new_movie_record(&movie)])
            .await?;
        let record = single_record(TABLE, "create", outcomes)?;
        let created = movie_from_record(&record)?;

        tracing::info!(movie_id = %created.id, title = %created.title, "Movie created");
        Ok(created)
    }

    async fn update(&self, id: &str, patch: MoviePatch) -> AppResult<Movie> {
        let (record_id, stored) = self.find(id).await?;
        let changes = patch_record(record_id, &patch);

        let outcomes = self
            .store
            .update_records(TABLE, vec![changes.clone()])
            .await?;
        let echo = single_record(TABLE, "update", outcomes)?;

        movie_from_record(&merge_records(merge_records(stored, changes), echo))
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let (record_id, _) = self.find(id).await?;

        let outcomes = self.store.delete_records(TABLE, vec![record_id]).await?;
        single_record(TABLE, "delete", outcomes)?;

        tracing::info!(movie_id = %id, "Movie deleted");
        Ok(())
    }

    async fn add_to_watchlist(&self, movie_id: &str) -> AppResult<bool> {
        tracing::warn!(
            movie_id = %movie_id,
            "Legacy movie watchlist is not persisted in remote mode"
        );
        Ok(true)
    }

    async fn remove_from_watchlist(&self, movie_id: &str) -> AppResult<bool> {
        tracing::warn!(
            movie_id = %movie_id,
            "Legacy movie watchlist is not persisted in remote mode"
        );
        Ok(true)
    }

    async fn get_watchlist_movies(&self) -> AppResult<Vec<Movie>> {
        Ok(Vec::new())
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::remote::{MockRecordStore, RecordOutcome};

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn heat() -> Record {
        record(json!({
            "Id": 12,
            "title": "Heat",
            "year": "1995",
            "poster": "https://img.test/heat.jpg",
            "rating": "8.3",
            "runtime": 170,
            "synopsis": "A detective hunts a crew of bank robbers.",
            "trailer_url": "",
            "genres": "Crime,Thriller",
            "moods": "Excited,Feel Good Drama",
            "CreatedOn": "2024-01-01T00:00:00Z"
        }))
    }

    fn feel_good() -> Record {
        record(json!({
            "Id": 13,
            "title": "Amelie",
            "year": 2001,
            "poster": "",
            "rating": 8.3,
            "runtime": 122,
            "synopsis": "A shy waitress decides to change the lives of those around her.",
            "genres": "Romance",
            "moods": "Feel Good"
        }))
    }

    #[test]
    fn test_movie_from_record_coerces_fields() {
        let movie = movie_from_record(&heat()).unwrap();
        assert_eq!(movie.id, "12");
        assert_eq!(movie.year, 1995);
        assert_eq!(movie.rating, 8.3);
        assert_eq!(movie.trailer_url, None);
        assert_eq!(movie.genres, vec!["Crime", "Thriller"]);
        assert_eq!(movie.moods, vec!["Excited", "Feel Good Drama"]);
    }

    #[test]
    fn test_new_movie_record_joins_labels() {
        let rec = new_movie_record(&NewMovie {
            title: "Heat".to_string(),
            genres: vec!["Crime".to_string(), "Thriller".to_string()],
            ..Default::default()
        });
        assert_eq!(rec["genres"], "Crime,Thriller");
        assert_eq!(rec["moods"], "");
        assert!(rec.get(ID_FIELD).is_none());
    }

    #[test]
    fn test_patch_record_only_carries_changed_fields() {
        let rec = patch_record(
            12,
            &MoviePatch {
                runtime: Some(171),
                ..Default::default()
            },
        );
        assert_eq!(rec.len(), 2);
        assert_eq!(rec["Id"], 12);
        assert_eq!(rec["runtime"], 171);
    }

    #[tokio::test]
    async fn test_get_by_mood_filters_contains_false_positives() {
        let mut store = MockRecordStore::new();
        store
            .expect_fetch_records()
            .withf(|table, query| {
                table == TABLE
                    && query.conditions.len() == 1
                    && query.conditions[0].operator == Operator::Contains
                    && query.conditions[0].values == vec![json!("Feel Good")]
            })
            .returning(|_, _| Ok(vec![heat(), feel_good()]));

        let repo = RemoteMovieRepository::new(Arc::new(store));
        let movies = repo.get_by_mood("Feel Good").await.unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].title, "Amelie");
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_over_genres() {
        let mut store = MockRecordStore::new();
        store
            .expect_fetch_records()
            .returning(|_, _| Ok(vec![heat(), feel_good()]));

        let repo = RemoteMovieRepository::new(Arc::new(store));
        let movies = repo.search(" romance ").await.unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].id, "13");
    }

    #[tokio::test]
    async fn test_get_by_id_non_numeric_is_not_found_without_request() {
        let store = MockRecordStore::new();
        let repo = RemoteMovieRepository::new(Arc::new(store));
        assert!(repo.get_by_id("abc").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_get_by_id_missing_record() {
        let mut store = MockRecordStore::new();
        store
            .expect_get_record_by_id()
            .withf(|table, id, _| table == TABLE && *id == 99)
            .returning(|_, _, _| Ok(None));

        let repo = RemoteMovieRepository::new(Arc::new(store));
        assert!(repo.get_by_id("99").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_create_surfaces_record_failure() {
        let mut store = MockRecordStore::new();
        store.expect_create_records().returning(|_, _| {
            Ok(vec![RecordOutcome {
                success: false,
                message: Some("title is required".to_string()),
                data: None,
            }])
        });

        let repo = RemoteMovieRepository::new(Arc::new(store));
        let err = repo.create(NewMovie::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Remote(_)));
    }

    fn rating_patch(rating: f64) -> MoviePatch {
        MoviePatch {
            rating: Some(rating),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_update_keeps_fields_missing_from_echo() {
        let mut store = MockRecordStore::new();
        store
            .expect_get_record_by_id()
            .times(1)
            .returning(|_, _, _| Ok(Some(heat())));
        store
            .expect_update_records()
            .withf(|_, records| records[0].len() == 2 && records[0]["rating"] == json!(9.0))
            .returning(|_, _| {
                Ok(vec![RecordOutcome {
                    success: true,
                    message: None,
                    data: Some(record(json!({ "Id": 12, "rating": 9.0 }))),
                }])
            });

        let repo = RemoteMovieRepository::new(Arc::new(store));
        let movie = repo.update("12", rating_patch(9.0)).await.unwrap();
        assert_eq!(movie.id, "12");
        assert_eq!(movie.rating, 9.0);
        assert_eq!(movie.title, "Heat");
        assert_eq!(movie.year, 1995);
        assert_eq!(movie.genres, vec!["Crime", "Thriller"]);
        assert_eq!(movie.moods, vec!["Excited", "Feel Good Drama"]);
    }

    #[tokio::test]
    async fn test_update_with_bare_success_uses_sent_changes() {
        let mut store = MockRecordStore::new();
        store
            .expect_get_record_by_id()
            .returning(|_, _, _| Ok(Some(heat())));
        store.expect_update_records().returning(|_, _| {
            Ok(vec![RecordOutcome {
                success: true,
                message: None,
                data: None,
            }])
        });

        let repo = RemoteMovieRepository::new(Arc::new(store));
        let movie = repo.update("12", rating_patch(7.5)).await.unwrap();
        assert_eq!(movie.rating, 7.5);
        assert_eq!(movie.runtime, 170);
    }

    #[tokio::test]
    async fn test_update_unknown_movie_does_not_write() {
        let mut store = MockRecordStore::new();
        store.expect_get_record_by_id().returning(|_, _, _| Ok(None));
        store.expect_update_records().never();

        let repo = RemoteMovieRepository::new(Arc::new(store));
        let err = repo.update("12", rating_patch(7.5)).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_movie_from_record_rejects_out_of_range_year() {
        let mut rec = heat();
        rec.insert("year".to_string(), json!(i64::from(i32::MAX) + 1));
        let err = movie_from_record(&rec).unwrap_err();
        assert!(matches!(err, AppError::Remote(_)));
    }

    #[tokio::test]
    async fn test_legacy_watchlist_reports_success() {
        let repo = RemoteMovieRepository::new(Arc::new(MockRecordStore::new()));
        assert!(repo.add_to_watchlist("12").await.unwrap());
        assert!(repo.get_watchlist_movies().await.unwrap().is_empty());
    }
}
