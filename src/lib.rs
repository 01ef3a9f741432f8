pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod seed;
pub mod services;
pub mod telemetry;

pub use config::Config;
pub use error::{AppError, AppResult, ResultExt};
pub use services::ServiceRegistry;
