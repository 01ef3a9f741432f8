use moodflix::{telemetry, Config, ResultExt, ServiceRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;
    telemetry::init_tracing(&config.log_filter);

    // Wire the repositories for the configured data mode
    let registry = ServiceRegistry::from_config(&config).await?;

    let movies = registry.movies.get_all().await.or_fallback("list movies");
    let watchlists = registry.watchlists.get_all().await.or_fallback("list watchlists");
    let nights = registry.movie_nights.get_all().await.or_fallback("list movie nights");

    tracing::info!(
        mode = ?registry.mode,
        movies = movies.len(),
        watchlists = watchlists.len(),
        movie_nights = nights.len(),
        "Moodflix data layer ready"
    );
    Ok(())
}
