pub mod blob;
pub mod redis;
pub mod remote;

pub use blob::{BlobStore, FileBlobStore, MemoryBlobStore};
pub use self::redis::create_redis_client;
pub use self::redis::RedisBlobStore;
pub use remote::{HttpRecordStore, Record, RecordOutcome, RecordQuery, RecordStore};
