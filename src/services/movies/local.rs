use std::sync::Arc;

use crate::{
    db::BlobStore,
    error::{AppError, AppResult},
    models::{insert_unique, movie::search_needle, Movie, MoviePatch, NewMovie},
    seed,
    services::{
        delay::Latency, ids::IdGenerator, local_collection::LocalCollection,
        movies::MovieRepository,
    },
};

pub const MOVIES_KEY: &str = "moodflix_movies";
pub const LEGACY_WATCHLIST_KEY: &str = "moodflix_watchlist";

pub struct LocalMovieRepository {
    movies: LocalCollection<Movie>,
    legacy_watchlist: LocalCollection<String>,
    ids: Arc<IdGenerator>,
    latency: Latency,
}

impl LocalMovieRepository {
    /// Loads the catalog from `store`, seeding it on first use
    pub async fn load(
        store: Arc<dyn BlobStore>,
        ids: Arc<IdGenerator>,
        latency: Latency,
    ) -> AppResult<Self> {
        Self::with_seed(store, seed::movies()?, ids, latency).await
    }

    pub async fn with_seed(
        store: Arc<dyn BlobStore>,
        seed: Vec<Movie>,
        ids: Arc<IdGenerator>,
        latency: Latency,
    ) -> AppResult<Self> {
        let movies = LocalCollection::load(MOVIES_KEY, store.clone(), seed).await?;
        let legacy_watchlist = LocalCollection::load(LEGACY_WATCHLIST_KEY, store, Vec::new()).await?;

        Ok(Self {
            movies,
            legacy_watchlist,
            ids,
            latency,
        })
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Movie not found".to_string())
}

#[async_trait::async_trait]
impl MovieRepository for LocalMovieRepository {
    async fn get_all(&self) -> AppResult<Vec<Movie>> {
        self.latency.medium().await;
        Ok(self.movies.snapshot().await)
    }

    async fn get_by_id(&self, id: &str) -> AppResult<Movie> {
        self.latency.short().await;
        self.movies.find(|m| m.id == id).await.ok_or_else(not_found)
    }

    async fn get_by_mood(&self, mood: &str) -> AppResult<Vec<Movie>> {
        self.latency.long().await;
        Ok(self.movies.filter(|m| m.has_mood(mood)).await)
    }

    async fn get_by_genre(&self, genre: &str) -> AppResult<Vec<Movie>> {
        self.latency.medium().await;
        Ok(self.movies.filter(|m| m.has_genre(genre)).await)
    }

    async fn search(&self, query: &str) -> AppResult<Vec<Movie>> {
        self.latency.medium().await;
        let results = match search_needle(query) {
            Some(needle) => self.movies.filter(|m| m.matches_search(&needle)).await,
            None => self.movies.snapshot().await,
        };

        tracing::info!(query = %query, results = results.len(), "Movie search completed");
        Ok(results)
    }

    async fn create(&self, movie: NewMovie) -> AppResult<Movie> {
        self.latency.medium().await;
        let movie = Movie::from_new(self.ids.next_id(), movie);

        let created = movie.clone();
        self.movies
            .mutate(move |movies| {
                movies.push(movie);
                Ok(())
            })
            .await?;

        tracing::info!(movie_id = %created.id, title = %created.title, "Movie created");
        Ok(created)
    }

    async fn update(&self, id: &str, patch: MoviePatch) -> AppResult<Movie> {
        self.latency.medium().await;
        self.movies
            .mutate(|movies| {
                let movie = movies.iter_mut().find(|m| m.id == id).ok_or_else(not_found)?;
                movie.apply(patch);
                Ok(movie.clone())
            })
            .await
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        self.latency.short().await;
        self.movies
            .mutate(|movies| {
                let index = movies.iter().position(|m| m.id == id).ok_or_else(not_found)?;
                movies.remove(index);
                Ok(())
            })
            .await?;

        tracing::info!(movie_id = %id, "Movie deleted");
        Ok(())
    }

    async fn add_to_watchlist(&self, movie_id: &str) -> AppResult<bool> {
        self.latency.short().await;
        if self.legacy_watchlist.find(|id| id == movie_id).await.is_some() {
            return Ok(true);
        }
        self.legacy_watchlist
            .mutate(|ids| {
                insert_unique(ids, movie_id);
                Ok(true)
            })
            .await
    }

    async fn remove_from_watchlist(&self, movie_id: &str) -> AppResult<bool> {
        self.latency.short().await;
        self.legacy_watchlist
            .mutate(|ids| {
                ids.retain(|id| id != movie_id);
                Ok(true)
            })
            .await
    }

    async fn get_watchlist_movies(&self) -> AppResult<Vec<Movie>> {
        self.latency.medium().await;
        let ids = self.legacy_watchlist.snapshot().await;
        Ok(self.movies.filter(|m| ids.contains(&m.id)).await)
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
