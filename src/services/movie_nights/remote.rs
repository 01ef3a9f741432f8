use std::sync::Arc;

use serde_json::json;

use crate::{
    db::remote::{
        codec::{self, ID_FIELD},
        merge_records, record_from, single_record, Operator, Record, RecordQuery, RecordStore,
        SortDirection,
    },
    error::{AppError, AppResult},
    models::{
        dedup_ids,
        movie_night::{parse_night_date, sort_latest_first},
        MovieNight, MovieNightPatch, NewMovieNight,
    },
    services::{ids::IdGenerator, movie_nights::MovieNightRepository},
};

const TABLE: &str = "movie_night";
const FIELDS: &[&str] = &[ID_FIELD, "theme", "date", "movie_ids", "share_link"];
const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct RemoteMovieNightRepository {
    store: Arc<dyn RecordStore>,
    ids: Arc<IdGenerator>,
    app_domain: String,
}

fn not_found() -> AppError {
    AppError::NotFound("Movie night not found".to_string())
}

fn fields() -> Vec<String> {
    FIELDS.iter().map(|f| f.to_string()).collect()
}

pub(crate) fn movie_night_from_record(record: &Record) -> AppResult<MovieNight> {
    let raw_date = codec::required_str(record, "date")?;
    let date = parse_night_date(&raw_date)
        .map_err(|_| AppError::Remote(format!("Movie night has an unreadable date: {}", raw_date)))?;

    Ok(MovieNight {
        id: codec::record_id(record)?,
        theme: codec::str_field(record, "theme").unwrap_or_default(),
        date,
        movie_ids: dedup_ids(codec::list_field(record, "movie_ids")),
        share_link: codec::str_field(record, "share_link").unwrap_or_default(),
    })
}

fn membership_record(id: i64, movie_ids: &[String]) -> Record {
    record_from([
        (ID_FIELD, json!(id)),
        ("movie_ids", json!(codec::join_list(movie_ids))),
    ])
}

impl RemoteMovieNightRepository {
    pub fn new(
        store: Arc<dyn RecordStore>,
        ids: Arc<IdGenerator>,
        app_domain: impl Into<String>,
    ) -> Self {
        Self {
            store,
            ids,
            app_domain: app_domain.into(),
        }
    }

    async fn fetch(&self, query: RecordQuery) -> AppResult<Vec<MovieNight>> {
        self.store
            .fetch_records(TABLE, query)
            .await?
            .iter()
            .map(movie_night_from_record)
            .collect()
    }

    async fn find_record(&self, id: &str) -> AppResult<(i64, Record)> {
        let record_id = codec::parse_record_id(id, "Movie night")?;
        let record = self
            .store
            .get_record_by_id(TABLE, record_id, fields())
            .await?
            .ok_or_else(not_found)?;
        Ok((record_id, record))
    }

    async fn find(&self, id: &str) -> AppResult<(i64, MovieNight)> {
        let (record_id, record) = self.find_record(id).await?;
        Ok((record_id, movie_night_from_record(&record)?))
    }

    /// Sends `changes` and rebuilds the entity on top of `stored`
    async fn write(&self, stored: Record, changes: Record) -> AppResult<MovieNight> {
        let outcomes = self.store.update_records(TABLE, vec![changes.clone()]).await?;
        let echo = single_record(TABLE, "update", outcomes)?;
        movie_night_from_record(&merge_records(merge_records(stored, changes), echo))
    }
}

#[async_trait::async_trait]
impl MovieNightRepository for RemoteMovieNightRepository {
    async fn get_all(&self) -> AppResult<Vec<MovieNight>> {
        let mut nights = self
            .fetch(RecordQuery::new(FIELDS).order_by("date", SortDirection::Desc))
            .await?;
        sort_latest_first(&mut nights);
        Ok(nights)
    }

    async fn get_by_id(&self, id: &str) -> AppResult<MovieNight> {
        Ok(self.find(id).await?.1)
    }

    async fn create(&self, night: NewMovieNight) -> AppResult<MovieNight> {
        let night = night.validate()?;
        let millis = self.ids.next_millis();
        // The backend assigns the id; only the link needs the local stamp
        let draft = night.into_movie_night(String::new(), &self.app_domain, millis);

        let record = record_from([
            ("theme", json!(draft.theme)),
            ("date", json!(draft.date.format(DATE_FORMAT).to_string())),
            ("movie_ids", json!(codec::join_list(&draft.movie_ids))),
            ("share_link", json!(draft.share_link)),
        ]);

        let outcomes = self.store.create_records(TABLE, vec![record]).await?;
        let created = movie_night_from_record(&single_record(TABLE, "create", outcomes)?)?;

        tracing::info!(night_id = %created.id, share_link = %created.share_link, "Movie night created");
        Ok(created)
    }

    async fn update(&self, id: &str, patch: MovieNightPatch) -> AppResult<MovieNight> {
        let patch = patch.validate()?;
        let (record_id, stored) = self.find_record(id).await?;

        let mut record = record_from([(ID_FIELD, json!(record_id))]);
        if let Some(theme) = patch.theme {
            record.insert("theme".to_string(), json!(theme));
        }
        if let Some(date) = patch.date {
            record.insert("date".to_string(), json!(date.format(DATE_FORMAT).to_string()));
        }
        if let Some(movie_ids) = patch.movie_ids {
            record.insert(
                "movie_ids".to_string(),
                json!(codec::join_list(&dedup_ids(movie_ids))),
            );
        }
        if let Some(share_link) = patch.share_link {
            record.insert("share_link".to_string(), json!(share_link));
        }

        self.write(stored, record).await
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let (record_id, _) = self.find(id).await?;
        let outcomes = self.store.delete_records(TABLE, vec![record_id]).await?;
        single_record(TABLE, "delete", outcomes)?;

        tracing::info!(night_id = %id, "Movie night deleted");
        Ok(())
    }

    async fn add_movie(&self, night_id: &str, movie_id: &str) -> AppResult<MovieNight> {
        let (record_id, stored) = self.find_record(night_id).await?;
        let mut night = movie_night_from_record(&stored)?;
        if !night.add_movie(movie_id.trim()) {
            return Ok(night);
        }

        let saved = self
            .write(stored, membership_record(record_id, &night.movie_ids))
            .await?;

        tracing::info!(night_id = %night_id, movie_id = %movie_id, "Movie added to movie night");
        Ok(saved)
    }

    async fn remove_movie(&self, night_id: &str, movie_id: &str) -> AppResult<MovieNight> {
        let (record_id, stored) = self.find_record(night_id).await?;
        let mut night = movie_night_from_record(&stored)?;
        if !night.remove_movie(movie_id.trim()) {
            return Ok(night);
        }

        let saved = self
            .write(stored, membership_record(record_id, &night.movie_ids))
            .await?;

        tracing::info!(night_id = %night_id, movie_id = %movie_id, "Movie removed from movie night");
        Ok(saved)
    }

    async fn get_by_share_link(&self, share_link: &str) -> AppResult<MovieNight> {
        self.fetch(RecordQuery::new(FIELDS).filter("share_link", Operator::EqualTo, share_link))
            .await?
            .into_iter()
            .find(|n| n.share_link == share_link)
            .ok_or_else(not_found)
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::remote::{MockRecordStore, RecordOutcome};
    use serde_json::Value;

    fn night(id: i64, date: &str, movie_ids: &str) -> Record {
        json!({
            "Id": id,
            "theme": "Heist",
            "date": date,
            "movie_ids": movie_ids,
            "share_link": format!("moodflix.app/night/{}", id)
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

    fn repo(store: MockRecordStore) -> RemoteMovieNightRepository {
        RemoteMovieNightRepository::new(Arc::new(store), Arc::new(IdGenerator::new()), "moodflix.app")
    }

    #[test]
    fn test_movie_night_from_record_reads_timestamp_dates() {
        let parsed = movie_night_from_record(&night(4, "2024-05-01T00:00:00Z", "1,2")).unwrap();
        assert_eq!(parsed.date.to_string(), "2024-05-01");
        assert_eq!(parsed.movie_ids, vec!["1", "2"]);
    }

    #[test]
    fn test_movie_night_from_record_rejects_bad_date() {
        let err = movie_night_from_record(&night(4, "soon", "")).unwrap_err();
        assert!(matches!(err, AppError::Remote(_)));
    }

    #[tokio::test]
    async fn test_create_sends_generated_share_link() {
        let mut store = MockRecordStore::new();
        store
            .expect_create_records()
            .withf(|table, records| {
                let link = records[0]["share_link"].as_str().unwrap_or_default();
                table == "movie_night"
                    && records[0]["date"] == json!("2024-05-01")
                    && records[0]["movie_ids"] == json!("")
                    && link.starts_with("moodflix.app/night/")
            })
            .returning(|_, records| {
                let mut record = records[0].clone();
                record.insert("Id".to_string(), json!(31));
                Ok(echo(vec![record]))
            });

        let created = repo(store)
            .create(NewMovieNight {
                theme: "80s Night".to_string(),
                date: "2024-05-01".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(created.id, "31");
        assert!(created.movie_ids.is_empty());
    }

    #[tokio::test]
    async fn test_create_validates_before_writing() {
        let mut store = MockRecordStore::new();
        store.expect_create_records().never();

        let err = repo(store)
            .create(NewMovieNight {
                theme: String::new(),
                date: "2024-05-01".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_get_all_sorts_by_date() {
        let mut store = MockRecordStore::new();
        store.expect_fetch_records().returning(|_, _| {
            Ok(vec![
                night(1, "2024-01-01", ""),
                night(2, "2024-09-01", ""),
                night(3, "2024-03-01", ""),
            ])
        });

        let ids: Vec<_> = repo(store)
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, vec!["2", "3", "1"]);
    }

    #[tokio::test]
    async fn test_remove_missing_movie_skips_write() {
        let mut store = MockRecordStore::new();
        store
            .expect_get_record_by_id()
            .returning(|_, _, _| Ok(Some(night(1, "2024-01-01", "3"))));
        store.expect_update_records().never();

        let night = repo(store).remove_movie("1", "4").await.unwrap();
        assert_eq!(night.movie_ids, vec!["3"]);
    }

    #[tokio::test]
    async fn test_add_movie_writes_membership_and_keeps_fields() {
        let mut store = MockRecordStore::new();
        store
            .expect_get_record_by_id()
            .times(1)
            .returning(|_, _, _| Ok(Some(night(1, "2024-01-01", "3"))));
        store
            .expect_update_records()
            .withf(|table, records| {
                table == TABLE
                    && records[0].len() == 2
                    && records[0]["Id"] == json!(1)
                    && records[0]["movie_ids"] == json!("3,8")
            })
            .returning(|_, records| Ok(echo(records)));

        let saved = repo(store).add_movie("1", " 8 ").await.unwrap();
        assert_eq!(saved.movie_ids, vec!["3", "8"]);
        assert_eq!(saved.theme, "Heist");
        assert_eq!(saved.share_link, "moodflix.app/night/1");
        assert_eq!(saved.date.to_string(), "2024-01-01");
    }

    #[tokio::test]
    async fn test_update_date_keeps_theme_and_link() {
        let mut store = MockRecordStore::new();
        store
            .expect_get_record_by_id()
            .returning(|_, _, _| Ok(Some(night(2, "2024-01-01", "3"))));
        store
            .expect_update_records()
            .withf(|_, records| records[0]["date"] == json!("2024-07-04"))
            .returning(|_, _| {
                Ok(echo(vec![json!({ "Id": 2, "date": "2024-07-04" })
                    .as_object()
                    .cloned()
                    .unwrap()]))
            });

        let updated = repo(store)
            .update(
                "2",
                MovieNightPatch {
                    date: Some("2024-07-04".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.date.to_string(), "2024-07-04");
        assert_eq!(updated.theme, "Heist");
        assert_eq!(updated.share_link, "moodflix.app/night/2");
        assert_eq!(updated.movie_ids, vec!["3"]);
    }

    #[tokio::test]
    async fn test_update_rejects_bad_date_without_calling_backend() {
        let mut store = MockRecordStore::new();
        store.expect_get_record_by_id().never();
        store.expect_update_records().never();

        let err = repo(store)
            .update(
                "2",
                MovieNightPatch {
                    date: Some("someday".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_delete_sends_record_id() {
        let mut store = MockRecordStore::new();
        store
            .expect_get_record_by_id()
            .returning(|_, _, _| Ok(Some(night(5, "2024-01-01", ""))));
        store
            .expect_delete_records()
            .withf(|table, ids| table == TABLE && ids == &vec![5])
            .times(1)
            .returning(|_, _| {
                Ok(vec![RecordOutcome {
                    success: true,
                    message: None,
                    data: None,
                }])
            });

        repo(store).delete("5").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_unknown_night() {
        let mut store = MockRecordStore::new();
        store.expect_get_record_by_id().returning(|_, _, _| Ok(None));
        store.expect_delete_records().never();

        assert!(repo(store).delete("5").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_get_by_share_link_not_found() {
        let mut store = MockRecordStore::new();
        store
            .expect_fetch_records()
            .withf(|_, query| {
                serde_json::to_value(query).unwrap()["where"][0]["values"][0]
                    == Value::from("moodflix.app/night/9")
            })
            .returning(|_, _| Ok(vec![]));

        let err = repo(store)
            .get_by_share_link("moodflix.app/night/9")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
