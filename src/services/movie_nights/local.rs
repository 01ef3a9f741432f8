use std::sync::Arc;

use crate::{
    db::BlobStore,
    error::{AppError, AppResult},
    models::{movie_night::sort_latest_first, MovieNight, MovieNightPatch, NewMovieNight},
    seed,
    services::{
        delay::Latency, ids::IdGenerator, local_collection::LocalCollection,
        movie_nights::MovieNightRepository,
    },
};

pub const MOVIE_NIGHTS_KEY: &str = "moodflix_movie_nights";

pub struct LocalMovieNightRepository {
    nights: LocalCollection<MovieNight>,
    ids: Arc<IdGenerator>,
    app_domain: String,
    latency: Latency,
}

impl LocalMovieNightRepository {
    pub async fn load(
        store: Arc<dyn BlobStore>,
        ids: Arc<IdGenerator>,
        app_domain: impl Into<String>,
        latency: Latency,
    ) -> AppResult<Self> {
        Self::with_seed(store, seed::movie_nights()?, ids, app_domain, latency).await
    }

    pub async fn with_seed(
        store: Arc<dyn BlobStore>,
        seed: Vec<MovieNight>,
        ids: Arc<IdGenerator>,
        app_domain: impl Into<String>,
        latency: Latency,
    ) -> AppResult<Self> {
        Ok(Self {
            nights: LocalCollection::load(MOVIE_NIGHTS_KEY, store, seed).await?,
            ids,
            app_domain: app_domain.into(),
            latency,
        })
    }

    async fn modify<F>(&self, id: &str, change: F) -> AppResult<MovieNight>
    where
        F: FnOnce(&mut MovieNight) + Send,
    {
        self.nights
            .mutate(|nights| {
                let night = nights.iter_mut().find(|n| n.id == id).ok_or_else(not_found)?;
                change(night);
                Ok(night.clone())
            })
            .await
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Movie night not found".to_string())
}

#[async_trait::async_trait]
impl MovieNightRepository for LocalMovieNightRepository {
    async fn get_all(&self) -> AppResult<Vec<MovieNight>> {
        self.latency.medium().await;
        let mut nights = self.nights.snapshot().await;
        sort_latest_first(&mut nights);
        Ok(nights)
    }

    async fn get_by_id(&self, id: &str) -> AppResult<MovieNight> {
        self.latency.short().await;
        self.nights.find(|n| n.id == id).await.ok_or_else(not_found)
    }

    async fn create(&self, night: NewMovieNight) -> AppResult<MovieNight> {
        let night = night.validate()?;
        self.latency.medium().await;

        let millis = self.ids.next_millis();
        let night = night.into_movie_night(millis.to_string(), &self.app_domain, millis);

        let created = night.clone();
        self.nights
            .mutate(move |nights| {
                nights.push(night);
                Ok(())
            })
            .await?;

        tracing::info!(night_id = %created.id, share_link = %created.share_link, "Movie night created");
        Ok(created)
    }

    async fn update(&self, id: &str, patch: MovieNightPatch) -> AppResult<MovieNight> {
        let patch = patch.validate()?;
        self.latency.medium().await;
        self.modify(id, |night| night.apply(patch)).await
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        self.latency.short().await;
        self.nights
            .mutate(|nights| {
                let index = nights.iter().position(|n| n.id == id).ok_or_else(not_found)?;
                nights.remove(index);
                Ok(())
            })
            .await?;

        tracing::info!(night_id = %id, "Movie night deleted");
        Ok(())
    }

    async fn add_movie(&self, night_id: &str, movie_id: &str) -> AppResult<MovieNight> {
        self.latency.short().await;
        let movie_id = movie_id.trim();
        let night = self
            .modify(night_id, |night| {
                night.add_movie(movie_id);
            })
            .await?;

        tracing::info!(night_id = %night_id, movie_id = %movie_id, "Movie added to movie night");
        Ok(night)
    }

    async fn remove_movie(&self, night_id: &str, movie_id: &str) -> AppResult<MovieNight> {
        self.latency.short().await;
        let movie_id = movie_id.trim();
        let night = self
            .modify(night_id, |night| {
                night.remove_movie(movie_id);
            })
            .await?;

        tracing::info!(night_id = %night_id, movie_id = %movie_id, "Movie removed from movie night");
        Ok(night)
    }

    async fn get_by_share_link(&self, share_link: &str) -> AppResult<MovieNight> {
        self.latency.short().await;
        self.nights
            .find(|n| n.share_link == share_link)
            .await
            .ok_or_else(not_found)
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryBlobStore;
    use crate::services::local_collection::tests::FailingBlobStore;
    use chrono::NaiveDate;

    fn night(id: &str, date: (i32, u32, u32), movie_ids: &[&str]) -> MovieNight {
        MovieNight {
            id: id.to_string(),
            theme: format!("Night {}", id),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            movie_ids: movie_ids.iter().map(|m| m.to_string()).collect(),
            share_link: format!("moodflix.app/night/{}", id),
        }
    }

    async fn repo_with(store: Arc<dyn BlobStore>) -> LocalMovieNightRepository {
        let seed = vec![
            night("1", (2024, 4, 20), &["2"]),
            night("2", (2024, 6, 8), &[]),
            night("3", (2023, 12, 31), &["1", "5"]),
        ];
        LocalMovieNightRepository::with_seed(
            store,
            seed,
            Arc::new(IdGenerator::new()),
            "moodflix.app",
            Latency::none(),
        )
        .await
        .unwrap()
    }

    async fn repo() -> LocalMovieNightRepository {
        repo_with(Arc::new(MemoryBlobStore::new())).await
    }

    fn eighties() -> NewMovieNight {
        NewMovieNight {
            theme: "80s Night".to_string(),
            date: "2024-05-01".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_get_all_latest_date_first() {
        let repo = repo().await;
        let ids: Vec<_> = repo.get_all().await.unwrap().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec!["2", "1", "3"]);
    }

    #[tokio::test]
    async fn test_create_generates_share_link() {
        let repo = repo().await;
        let created = repo.create(eighties()).await.unwrap();

        let millis = created
            .share_link
            .strip_prefix("moodflix.app/night/")
            .unwrap();
        assert!(!millis.is_empty());
        assert!(millis.chars().all(|c| c.is_ascii_digit()));
        assert!(created.movie_ids.is_empty());
        assert_eq!(repo.get_by_share_link(&created.share_link).await.unwrap().id, created.id);
    }

    #[tokio::test]
    async fn test_back_to_back_creates_get_distinct_links() {
        let repo = repo().await;
        let first = repo.create(eighties()).await.unwrap();
        let second = repo.create(eighties()).await.unwrap();
        assert_ne!(first.share_link, second.share_link);
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_create_without_date_is_rejected() {
        let repo = repo().await;
        let err = repo
            .create(NewMovieNight {
                theme: "Heist".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(repo.get_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_add_movie_is_idempotent() {
        let repo = repo().await;
        repo.add_movie("2", "7").await.unwrap();
        let night = repo.add_movie("2", " 7 ").await.unwrap();
        assert_eq!(night.movie_ids, vec!["7"]);
    }

    #[tokio::test]
    async fn test_remove_movie() {
        let repo = repo().await;
        let night = repo.remove_movie("3", "1").await.unwrap();
        assert_eq!(night.movie_ids, vec!["5"]);
        assert!(repo.remove_movie("9", "1").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_unknown_share_link() {
        let repo = repo().await;
        let err = repo.get_by_share_link("moodflix.app/night/0").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_moves_date() {
        let repo = repo().await;
        let updated = repo
            .update(
                "3",
                MovieNightPatch {
                    date: Some("2025-01-10".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.date, NaiveDate::from_ymd_opt(2025, 1, 10).unwrap());
        assert_eq!(repo.get_all().await.unwrap()[0].id, "3");
    }

    #[tokio::test]
    async fn test_delete_then_missing() {
        let repo = repo().await;
        repo.delete("1").await.unwrap();
        assert!(repo.get_by_id("1").await.unwrap_err().is_not_found());
        assert!(repo.delete("1").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_state() {
        let repo = repo_with(Arc::new(FailingBlobStore)).await;
        assert!(repo.create(eighties()).await.is_err());
        assert_eq!(repo.get_all().await.unwrap().len(), 3);
    }
}
