use std::sync::Arc;

use crate::{
    config::{BlobStoreKind, Config, DataMode},
    db::{
        create_redis_client, BlobStore, FileBlobStore, HttpRecordStore, MemoryBlobStore,
        RecordStore, RedisBlobStore,
    },
    error::AppResult,
};

pub mod delay;
pub mod ids;
pub mod local_collection;
pub mod movie_nights;
pub mod movies;
pub mod ratings;
pub mod watchlists;

pub use delay::{delay, Latency};
pub use ids::IdGenerator;
pub use movie_nights::{LocalMovieNightRepository, MovieNightRepository, RemoteMovieNightRepository};
pub use movies::{LocalMovieRepository, MovieRepository, RemoteMovieRepository};
pub use ratings::{LocalRatingRepository, RatingRepository, RemoteRatingRepository};
pub use watchlists::{LocalWatchlistRepository, RemoteWatchlistRepository, WatchlistRepository};

/// The four repositories, all backed by the same data mode
///
/// Built once at startup and cloned into whatever needs data access.
#[derive(Clone)]
pub struct ServiceRegistry {
    pub movies: Arc<dyn MovieRepository>,
    pub watchlists: Arc<dyn WatchlistRepository>,
    pub movie_nights: Arc<dyn MovieNightRepository>,
    pub ratings: Arc<dyn RatingRepository>,
    pub mode: DataMode,
}

impl ServiceRegistry {
    /// Seeded local repositories persisted to `store`
    pub async fn local(
        store: Arc<dyn BlobStore>,
        app_domain: &str,
        latency: Latency,
    ) -> AppResult<Self> {
        let ids = Arc::new(IdGenerator::new());

        let movies = LocalMovieRepository::load(store.clone(), ids.clone(), latency).await?;
        let watchlists = LocalWatchlistRepository::load(store.clone(), ids.clone(), latency).await?;
        let movie_nights =
            LocalMovieNightRepository::load(store.clone(), ids.clone(), app_domain, latency).await?;
        let ratings = LocalRatingRepository::load(store.clone(), ids, latency).await?;

        tracing::info!(store = store.name(), "Local repositories ready");

        Ok(Self {
            movies: Arc::new(movies),
            watchlists: Arc::new(watchlists),
            movie_nights: Arc::new(movie_nights),
            ratings: Arc::new(ratings),
            mode: DataMode::Local,
        })
    }

    /// Repositories that forward to a record store
    pub fn remote(store: Arc<dyn RecordStore>, app_domain: &str) -> Self {
        let ids = Arc::new(IdGenerator::new());

        tracing::info!(store = store.name(), "Remote repositories ready");

        Self {
            movies: Arc::new(RemoteMovieRepository::new(store.clone())),
            watchlists: Arc::new(RemoteWatchlistRepository::new(store.clone())),
            movie_nights: Arc::new(RemoteMovieNightRepository::new(store.clone(), ids, app_domain)),
            ratings: Arc::new(RemoteRatingRepository::new(store)),
            mode: DataMode::Remote,
        }
    }

    /// Wires the repositories `config` asks for
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        config.validate()?;

        match config.data_mode {
            DataMode::Remote => {
                let store = HttpRecordStore::new(config.remote_credentials()?);
                Ok(Self::remote(Arc::new(store), &config.app_domain))
            }
            DataMode::Local => {
                let store: Arc<dyn BlobStore> = match config.blob_store {
                    BlobStoreKind::Memory => Arc::new(MemoryBlobStore::new()),
                    BlobStoreKind::File => Arc::new(FileBlobStore::new(&config.storage_dir)),
                    BlobStoreKind::Redis => {
                        Arc::new(RedisBlobStore::new(create_redis_client(&config.redis_url)?))
                    }
                };
                let latency = Latency::simulated(config.simulate_latency);
                Ok(Self::local(store, &config.app_domain, latency).await?)
            }
        }
    }
}
