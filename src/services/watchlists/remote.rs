use std::sync::Arc;

use serde_json::json;

use crate::{
    db::remote::{
        codec::{self, ID_FIELD},
        merge_records, record_from, single_record, successful_records, Operator, Record,
        RecordQuery, RecordStore, SortDirection,
    },
    error::{AppError, AppResult},
    models::{
        dedup_ids, watchlist::sort_newest_first, NewWatchlist, Watchlist, WatchlistPatch,
    },
    services::watchlists::WatchlistRepository,
};

const TABLE: &str = "watchlist";
const FIELDS: &[&str] = &[ID_FIELD, "Name", "movie_ids", "category", "CreatedOn"];

pub struct RemoteWatchlistRepository {
    store: Arc<dyn RecordStore>,
}

fn not_found() -> AppError {
    AppError::NotFound("Watchlist not found".to_string())
}

fn fields() -> Vec<String> {
    FIELDS.iter().map(|f| f.to_string()).collect()
}

pub(crate) fn watchlist_from_record(record: &Record) -> AppResult<Watchlist> {
    Ok(Watchlist {
        id: codec::record_id(record)?,
        name: codec::str_field(record, "Name").filter(|n| !n.is_empty()),
        movie_ids: dedup_ids(codec::list_field(record, "movie_ids")),
        created_at: codec::timestamp_field(record, "CreatedOn").unwrap_or_default(),
        category: codec::str_field(record, "category").filter(|c| !c.is_empty()),
    })
}

fn membership_record(id: i64, movie_ids: &[String]) -> Record {
    record_from([
        (ID_FIELD, json!(id)),
        ("movie_ids", json!(codec::join_list(movie_ids))),
    ])
}

impl RemoteWatchlistRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    fn query() -> RecordQuery {
        RecordQuery::new(FIELDS).order_by("CreatedOn", SortDirection::Desc)
    }

    async fn fetch(&self, query: RecordQuery) -> AppResult<Vec<Watchlist>> {
        self.store
            .fetch_records(TABLE, query)
            .await?
            .iter()
            .map(watchlist_from_record)
            .collect()
    }

    async fn find_record(&self, id: &str) -> AppResult<(i64, Record)> {
        let record_id = codec::parse_record_id(id, "Watchlist")?;
        let record = self
            .store
            .get_record_by_id(TABLE, record_id, fields())
            .await?
            .ok_or_else(not_found)?;
        Ok((record_id, record))
    }

    async fn find(&self, id: &str) -> AppResult<(i64, Watchlist)> {
        let (record_id, record) = self.find_record(id).await?;
        Ok((record_id, watchlist_from_record(&record)?))
    }

    /// Sends `changes` and rebuilds the entity on top of `stored`
    async fn write(&self, stored: Record, changes: Record) -> AppResult<Watchlist> {
        let outcomes = self.store.update_records(TABLE, vec![changes.clone()]).await?;
        let echo = single_record(TABLE, "update", outcomes)?;
        watchlist_from_record(&merge_records(merge_records(stored, changes), echo))
    }
}

#[async_trait::async_trait]
impl WatchlistRepository for RemoteWatchlistRepository {
    async fn get_all(&self) -> AppResult<Vec<Watchlist>> {
        let mut watchlists = self.fetch(Self::query()).await?;
        sort_newest_first(&mut watchlists);
        Ok(watchlists)
    }

    async fn get_by_id(&self, id: &str) -> AppResult<Watchlist> {
        Ok(self.find(id).await?.1)
    }

    async fn create(&self, watchlist: NewWatchlist) -> AppResult<Watchlist> {
        let movie_ids = dedup_ids(watchlist.movie_ids);
        let record = record_from([
            ("Name", json!(watchlist.name.unwrap_or_default())),
            ("category", json!(watchlist.category.unwrap_or_default())),
            ("movie_ids", json!(codec::join_list(&movie_ids))),
        ]);

        let outcomes = self.store.create_records(TABLE, vec![record]).await?;
        let created = watchlist_from_record(&single_record(TABLE, "create", outcomes)?)?;

        tracing::info!(watchlist_id = %created.id, "Watchlist created");
        Ok(created)
    }

    async fn update(&self, id: &str, patch: WatchlistPatch) -> AppResult<Watchlist> {
        let (record_id, stored) = self.find_record(id).await?;

        let mut record = record_from([(ID_FIELD, json!(record_id))]);
        if let Some(name) = patch.name {
            record.insert("Name".to_string(), json!(name));
        }
        if let Some(category) = patch.category {
            record.insert("category".to_string(), json!(category));
        }
        if let Some(movie_ids) = patch.movie_ids {
            record.insert(
                "movie_ids".to_string(),
                json!(codec::join_list(&dedup_ids(movie_ids))),
            );
        }

        self.write(stored, record).await
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let (record_id, _) = self.find(id).await?;
        let outcomes = self.store.delete_records(TABLE, vec![record_id]).await?;
        single_record(TABLE, "delete", outcomes)?;

        tracing::info!(watchlist_id = %id, "Watchlist deleted");
        Ok(())
    }

    async fn add_movie(&self, watchlist_id: &str, movie_id: &str) -> AppResult<Watchlist> {
        let (record_id, stored) = self.find_record(watchlist_id).await?;
        let mut watchlist = watchlist_from_record(&stored)?;
        if !watchlist.add_movie(movie_id.trim()) {
            return Ok(watchlist);
        }

        let saved = self
            .write(stored, membership_record(record_id, &watchlist.movie_ids))
            .await?;

        tracing::info!(watchlist_id = %watchlist_id, movie_id = %movie_id, "Movie added to watchlist");
        Ok(saved)
    }

    async fn remove_movie(&self, movie_id: &str) -> AppResult<usize> {
        let movie_id = movie_id.trim();
        let candidates = self
            .fetch(RecordQuery::new(FIELDS).filter("movie_ids", Operator::Contains, movie_id))
            .await?;

        let mut updates = Vec::new();
        for mut watchlist in candidates {
            if watchlist.remove_movie(movie_id) {
                let record_id = codec::parse_record_id(&watchlist.id, "Watchlist")?;
                updates.push(membership_record(record_id, &watchlist.movie_ids));
            }
        }

        if updates.is_empty() {
            return Ok(0);
        }

        let outcomes = self.store.update_records(TABLE, updates).await?;
        let removed = successful_records(TABLE, "update", outcomes)?.len();

        tracing::info!(movie_id = %movie_id, watchlists = removed, "Movie removed from watchlists");
        Ok(removed)
    }

    async fn get_by_category(&self, category: &str) -> AppResult<Vec<Watchlist>> {
        let mut watchlists = self
            .fetch(Self::query().filter("category", Operator::EqualTo, category))
            .await?;
        watchlists.retain(|w| w.category.as_deref() == Some(category));
        Ok(watchlists)
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}
