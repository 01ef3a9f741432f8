use serde::Deserialize;

/// Which repository implementations the composition root wires up
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DataMode {
    /// Seeded in-process collections persisted to a blob store
    Local,
    /// Generic record-management backend
    Remote,
}

/// Backing store for local mode
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BlobStoreKind {
    Memory,
    File,
    Redis,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Local or remote repositories
    #[serde(default = "default_data_mode")]
    pub data_mode: DataMode,

    /// Blob store used in local mode
    #[serde(default = "default_blob_store")]
    pub blob_store: BlobStoreKind,

    /// Directory for the file blob store
    #[serde(default = "default_storage_dir")]
    pub storage_dir: String,

    /// Redis connection URL for the redis blob store
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Record store base URL
    #[serde(default)]
    pub remote_api_url: Option<String>,

    /// Record store project identifier
    #[serde(default)]
    pub remote_project_id: Option<String>,

    /// Record store public key
    #[serde(default)]
    pub remote_public_key: Option<String>,

    /// Domain prefix for generated share links
    #[serde(default = "default_app_domain")]
    pub app_domain: String,

    /// Whether local repositories wait before answering
    #[serde(default = "default_simulate_latency")]
    pub simulate_latency: bool,

    /// tracing-subscriber filter directive
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_data_mode() -> DataMode {
    DataMode::Local
}

fn default_blob_store() -> BlobStoreKind {
    BlobStoreKind::Memory
}

fn default_storage_dir() -> String {
    ".moodflix".to_string()
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_app_domain() -> String {
    "moodflix.app".to_string()
}

fn default_simulate_latency() -> bool {
    true
}

fn default_log_filter() -> String {
    "moodflix=info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_mode: default_data_mode(),
            blob_store: default_blob_store(),
            storage_dir: default_storage_dir(),
            redis_url: default_redis_url(),
            remote_api_url: None,
            remote_project_id: None,
            remote_public_key: None,
            app_domain: default_app_domain(),
            simulate_latency: default_simulate_latency(),
            log_filter: default_log_filter(),
        }
    }
}

/// Credentials for the record store, present only in remote mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCredentials {
    pub api_url: String,
    pub project_id: String,
    pub public_key: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects combinations the composition root cannot build
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.data_mode == DataMode::Remote {
            self.remote_credentials()?;
        }
        if self.app_domain.trim().is_empty() {
            anyhow::bail!("APP_DOMAIN must not be empty");
        }
        Ok(())
    }

    pub fn remote_credentials(&self) -> anyhow::Result<RemoteCredentials> {
        fn required(value: &Option<String>, name: &str) -> anyhow::Result<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| anyhow::anyhow!("{} is required in remote mode", name))
        }

        Ok(RemoteCredentials {
            api_url: required(&self.remote_api_url, "REMOTE_API_URL")?,
            project_id: required(&self.remote_project_id, "REMOTE_PROJECT_ID")?,
            public_key: required(&self.remote_public_key, "REMOTE_PUBLIC_KEY")?,
        })
    }
}
