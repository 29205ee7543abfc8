use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use thiserror::Error;

use super::store::{CachedSnapshot, SnapshotStore, StoreError};
use crate::ephemeris::{parse_oem, ParseError};
use crate::feed::{FeedSource, FetchError};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Error fetching ISS data: {0}")]
    Fetch(#[from] FetchError),
    #[error("Error parsing ISS data: {0}")]
    Parse(#[from] ParseError),
    #[error("Snapshot storage error: {0}")]
    Store(#[from] StoreError),
}

/// Read-through cache in front of the ephemeris feed.
///
/// Concurrent misses each fetch and store their own snapshot; the feed is
/// idempotent so the last writer simply becomes the newest entry.
pub struct CacheGateway {
    feed: Arc<dyn FeedSource>,
    store: Arc<dyn SnapshotStore>,
    ttl: Duration,
}

impl CacheGateway {
    pub fn new(feed: Arc<dyn FeedSource>, store: Arc<dyn SnapshotStore>, ttl: Duration) -> Self {
        Self { feed, store, ttl }
    }

    pub async fn current(&self) -> Result<CachedSnapshot, GatewayError> {
        self.current_at(Utc::now()).await
    }

    /// Fresh snapshot as seen at `now`, fetching a new one when the store has
    /// nothing younger than the TTL.
    pub async fn current_at(&self, now: DateTime<Utc>) -> Result<CachedSnapshot, GatewayError> {
        if let Some(cached) = self.store.latest_since(now - self.ttl).await? {
            log::info!("Using cached ISS data from {}", cached.stored_at);
            return Ok(cached);
        }

        log::info!("Fetching new ISS data");
        let body = self.feed.fetch().await.map_err(|e| {
            log::error!("Error fetching ISS data: {}", e);
            e
        })?;
        let snapshot = parse_oem(&body).map_err(|e| {
            log::error!("Error parsing ISS data: {}", e);
            e
        })?;

        let entry = CachedSnapshot {
            stored_at: now,
            snapshot: Arc::new(snapshot),
        };
        self.store.insert(&entry).await?;
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::cache::MemoryStore;
    use crate::feed::tests::{StaticFeed, SAMPLE};

    fn ttl() -> Duration {
        Duration::hours(1)
    }

    fn gateway(feed: Arc<StaticFeed>) -> CacheGateway {
        CacheGateway::new(feed, Arc::new(MemoryStore::new()), ttl())
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 22, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn reuses_snapshot_within_ttl() {
        let feed = Arc::new(StaticFeed::new(SAMPLE));
        let gateway = gateway(feed.clone());

        let first = gateway.current_at(t0()).await.unwrap();
        let second = gateway.current_at(t0() + Duration::minutes(59)).await.unwrap();

        assert_eq!(first.stored_at, t0());
        assert_eq!(second.stored_at, first.stored_at);
        assert!(Arc::ptr_eq(&first.snapshot, &second.snapshot));
        assert_eq!(feed.fetch_count(), 1);
    }

    #[tokio::test]
    async fn refreshes_after_ttl() {
        let feed = Arc::new(StaticFeed::new(SAMPLE));
        let gateway = gateway(feed.clone());

        let first = gateway.current_at(t0()).await.unwrap();
        let later = t0() + Duration::minutes(61);
        let refreshed = gateway.current_at(later).await.unwrap();

        assert_eq!(refreshed.stored_at, later);
        assert!(refreshed.stored_at > first.stored_at);
        assert_eq!(feed.fetch_count(), 2);

        // The refreshed entry now serves subsequent reads.
        let again = gateway.current_at(later + Duration::minutes(5)).await.unwrap();
        assert_eq!(again.stored_at, later);
        assert_eq!(feed.fetch_count(), 2);
    }

    #[tokio::test]
    async fn exactly_one_ttl_old_is_stale() {
        let feed = Arc::new(StaticFeed::new(SAMPLE));
        let gateway = gateway(feed.clone());

        gateway.current_at(t0()).await.unwrap();
        let refreshed = gateway.current_at(t0() + ttl()).await.unwrap();
        assert_eq!(refreshed.stored_at, t0() + ttl());
        assert_eq!(feed.fetch_count(), 2);
    }

    #[tokio::test]
    async fn parse_failure_is_not_cached() {
        let feed = Arc::new(StaticFeed::new(b"<ndm><oem></oem></ndm>"));
        let gateway = gateway(feed.clone());

        let err = gateway.current_at(t0()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Parse(_)));

        assert!(gateway.current_at(t0()).await.is_err());
        assert_eq!(feed.fetch_count(), 2);
    }
}
