use std::sync::Arc;

use chrono::Utc;

use crate::{
    db::BlobStore,
    error::{AppError, AppResult},
    models::{watchlist::sort_newest_first, NewWatchlist, Watchlist, WatchlistPatch},
    seed,
    services::{
        delay::Latency, ids::IdGenerator, local_collection::LocalCollection,
        watchlists::WatchlistRepository,
    },
};

pub const WATCHLISTS_KEY: &str = "moodflix_watchlists";

pub struct LocalWatchlistRepository {
    watchlists: LocalCollection<Watchlist>,
    ids: Arc<IdGenerator>,
    latency: Latency,
}

impl LocalWatchlistRepository {
    pub async fn load(
        store: Arc<dyn BlobStore>,
        ids: Arc<IdGenerator>,
        latency: Latency,
    ) -> AppResult<Self> {
        Self::with_seed(store, seed::watchlists()?, ids, latency).await
    }

    pub async fn with_seed(
        store: Arc<dyn BlobStore>,
        seed: Vec<Watchlist>,
        ids: Arc<IdGenerator>,
        latency: Latency,
    ) -> AppResult<Self> {
        Ok(Self {
            watchlists: LocalCollection::load(WATCHLISTS_KEY, store, seed).await?,
            ids,
            latency,
        })
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Watchlist not found".to_string())
}

#[async_trait::async_trait]
impl WatchlistRepository for LocalWatchlistRepository {
    async fn get_all(&self) -> AppResult<Vec<Watchlist>> {
        self.latency.medium().await;
        let mut watchlists = self.watchlists.snapshot().await;
        sort_newest_first(&mut watchlists);
        Ok(watchlists)
    }

    async fn get_by_id(&self, id: &str) -> AppResult<Watchlist> {
        self.latency.short().await;
        self.watchlists
            .find(|w| w.id == id)
            .await
            .ok_or_else(not_found)
    }

    async fn create(&self, watchlist: NewWatchlist) -> AppResult<Watchlist> {
        self.latency.medium().await;
        let watchlist = Watchlist::from_new(self.ids.next_id(), Utc::now(), watchlist);

        let created = watchlist.clone();
        self.watchlists
            .mutate(move |watchlists| {
                watchlists.push(watchlist);
                Ok(())
            })
            .await?;

        tracing::info!(watchlist_id = %created.id, "Watchlist created");
        Ok(created)
    }

    async fn update(&self, id: &str, patch: WatchlistPatch) -> AppResult<Watchlist> {
        self.latency.medium().await;
        self.watchlists
            .mutate(|watchlists| {
                let watchlist = watchlists
                    .iter_mut()
                    .find(|w| w.id == id)
                    .ok_or_else(not_found)?;
                watchlist.apply(patch);
                Ok(watchlist.clone())
            })
            .await
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        self.latency.short().await;
        self.watchlists
            .mutate(|watchlists| {
                let index = watchlists
                    .iter()
                    .position(|w| w.id == id)
                    .ok_or_else(not_found)?;
                watchlists.remove(index);
                Ok(())
            })
            .await?;

        tracing::info!(watchlist_id = %id, "Watchlist deleted");
        Ok(())
    }

    async fn add_movie(&self, watchlist_id: &str, movie_id: &str) -> AppResult<Watchlist> {
        self.latency.short().await;
        let movie_id = movie_id.trim();
        let existing = self
            .watchlists
            .find(|w| w.id == watchlist_id)
            .await
            .ok_or_else(not_found)?;
        if existing.movie_ids.iter().any(|id| id == movie_id) {
            return Ok(existing);
        }

        let watchlist = self
            .watchlists
            .mutate(|watchlists| {
                let watchlist = watchlists
                    .iter_mut()
                    .find(|w| w.id == watchlist_id)
                    .ok_or_else(not_found)?;
                watchlist.add_movie(movie_id);
                Ok(watchlist.clone())
            })
            .await?;

        tracing::info!(watchlist_id = %watchlist_id, movie_id = %movie_id, "Movie added to watchlist");
        Ok(watchlist)
    }

    async fn remove_movie(&self, movie_id: &str) -> AppResult<usize> {
        self.latency.short().await;
        let movie_id = movie_id.trim();
        let removed = self
            .watchlists
            .mutate(|watchlists| {
                Ok(watchlists
                    .iter_mut()
                    .map(|w| w.remove_movie(movie_id))
                    .filter(|removed| *removed)
                    .count())
            })
            .await?;

        tracing::info!(movie_id = %movie_id, watchlists = removed, "Movie removed from watchlists");
        Ok(removed)
    }

    async fn get_by_category(&self, category: &str) -> AppResult<Vec<Watchlist>> {
        self.latency.medium().await;
        Ok(self
            .watchlists
            .filter(|w| w.category.as_deref() == Some(category))
            .await)
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
