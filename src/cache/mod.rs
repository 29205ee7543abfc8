mod gateway;
mod store;

pub use gateway::{CacheGateway, GatewayError};
pub use store::{CachedSnapshot, FileStore, MemoryStore, SnapshotStore, StoreError};
