/// Data-access errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Remote store error: {0}")]
    Remote(String),

    #[error("Blob store error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Short message suitable for a user-facing notification
    ///
    /// Lower-level failures collapse into a generic message; the detail is
    /// only available through `Display` for logging.
    pub fn user_message(&self) -> String {
        match self {
            AppError::NotFound(msg) | AppError::Validation(msg) => msg.clone(),
            AppError::Storage(_) | AppError::Io(_) | AppError::Redis(_) => {
                "Failed to save your changes".to_string()
            }
            AppError::Serialization(_) => "Stored data could not be read".to_string(),
            AppError::Remote(_) | AppError::HttpClient(_) => {
                "The server could not complete the request".to_string()
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Caller-side fallback for repository results
///
/// Views that only want to show an empty state on failure call
/// `or_fallback` to log the error once and continue with `T::default()`.
pub trait ResultExt<T> {
    fn or_fallback(self, operation: &str) -> T;
}

impl<T: Default> ResultExt<T> for AppResult<T> {
    fn or_fallback(self, operation: &str) -> T {
        match self {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    operation = %operation,
                    notice = %e.user_message(),
                    "Data access failed, using fallback"
                );
                T::default()
            }
        }
    }
}
