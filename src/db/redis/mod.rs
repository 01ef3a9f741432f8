pub mod blob;

pub use blob::create_redis_client;
pub use blob::RedisBlobStore;
