use chrono::NaiveDate;
use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::error::AppResult;
use crate::models::LearningCycle;

/// Key of a cached recommendation result.
///
/// `version` is the snapshot identity reported by the table provider. A refreshed
/// export produces a new version, so results computed from older tables are never
/// read back and simply expire.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Cycle {
        cycle: LearningCycle,
        date: NaiveDate,
        version: String,
    },
    Holiday {
        start: NaiveDate,
        end: NaiveDate,
        version: String,
    },
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Cycle {
                cycle,
                date,
                version,
            } => write!(f, "cycle:{}:{}:{}", cycle, date, version),
            CacheKey::Holiday {
                start,
                end,
                version,
            } => write!(f, "holiday:{}:{}:{}", start, end, version),
        }
    }
}

/// Creates a Redis client for caching
///
/// Opening the client does not connect. Connections are made per operation, so a
/// Redis outage shows up as failed reads and writes rather than a startup error.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Message for asynchronous cache writes
struct CacheWriteMessage {
    key: String,
    value: String,
    ttl: u64,
}

/// Cache handler for storing and retrieving recommendation results in Redis
///
/// Reads go straight to Redis. Writes are queued to a background task so a slow
/// or unreachable Redis never delays a response.
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<CacheWriteMessage>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl CacheWriterHandle {
    /// Initiates a graceful shutdown of the cache writer
    ///
    /// Sends a shutdown signal to the writer task, which writes out whatever is
    /// already queued before it stops.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");
    }
}

impl Cache {
    /// Creates a new Cache instance with an async write background task
    ///
    /// The writer task lives until the returned handle signals shutdown. Clones of
    /// the cache share the same task.
    pub async fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        tokio::spawn(async move {
            Self::cache_writer_task(client, write_rx, shutdown_rx).await;
        });

        let cache = Self {
            redis_client,
            write_tx,
        };

        let handle = CacheWriterHandle { shutdown_tx };

        (cache, handle)
    }

    /// Background task that processes cache write messages
    ///
    /// Writes each queued message to Redis as it arrives. A failed write is logged
    /// and dropped. On shutdown, messages already in the channel are flushed and
    /// the task exits without waiting for new ones.
    async fn cache_writer_task(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    if let Err(e) = Self::write_to_redis(&client, msg).await {
                        tracing::error!(error = %e, "Failed to write to Redis cache");
                    }
                }
                _ = shutdown_rx.recv() => {
                    // Senders live on in cloned caches, so drain without waiting
                    let mut flushed = 0;
                    while let Ok(msg) = write_rx.try_recv() {
                        if let Err(e) = Self::write_to_redis(&client, msg).await {
                            tracing::error!(error = %e, "Failed to flush cache write during shutdown");
                        }
                        flushed += 1;
                    }

                    tracing::info!(flushed, "Cache writer task stopped");
                    break;
                }
            }
        }
    }

    /// Writes a single message to Redis with its TTL
    async fn write_to_redis(client: &Client, msg: CacheWriteMessage) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(msg.key, msg.value, msg.ttl).await?;
        Ok(())
    }

    /// Retrieves a value from the cache by key
    ///
    /// Returns `None` when the key is absent or expired. Connection failures and
    /// entries that no longer deserialize are returned as errors; callers that
    /// only use the cache as an accelerator should treat them as a miss.
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key.to_string()).await?;

        match cached {
            Some(json) => {
                let data = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    /// Stores a value in the cache asynchronously without blocking
    ///
    /// Serializes the value and hands it to the background writer, then returns.
    /// There is no confirmation that the write reached Redis; serialization and
    /// queueing failures are logged and otherwise ignored.
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let msg = CacheWriteMessage {
            key: key.to_string(),
            value: json,
            ttl,
        };

        if let Err(e) = self.write_tx.send(msg) {
            tracing::error!(error = %e, "Failed to send cache write message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
    }

    #[test]
    fn test_cache_key_display_cycle() {
        let key = CacheKey::Cycle {
            cycle: LearningCycle::WeeklyDaf,
            date: day("2024-03-21"),
            version: "v1".to_string(),
        };
        assert_eq!(key.to_string(), "cycle:WEEKLY_DAF:2024-03-21:v1");
    }

    #[test]
    fn test_cache_key_display_holiday() {
        let key = CacheKey::Holiday {
            start: day("2024-03-21"),
            end: day("2024-03-24"),
            version: "v1".to_string(),
        };
        assert_eq!(key.to_string(), "holiday:2024-03-21:2024-03-24:v1");
    }

    #[test]
    fn test_cache_keys_differ_per_cycle() {
        let date = day("2024-03-21");
        let daf = CacheKey::Cycle {
            cycle: LearningCycle::Daf,
            date,
            version: "v1".to_string(),
        };
        let weekly = CacheKey::Cycle {
            cycle: LearningCycle::WeeklyDaf,
            date,
            version: "v1".to_string(),
        };
        assert_ne!(daf.to_string(), weekly.to_string());
    }

    #[test]
    fn test_cache_keys_differ_per_snapshot_version() {
        let key = |version: &str| CacheKey::Holiday {
            start: day("2024-03-21"),
            end: day("2024-03-24"),
            version: version.to_string(),
        };
        assert_ne!(key("before").to_string(), key("after").to_string());
    }

    #[tokio::test]
    async fn test_unreachable_redis_read_is_an_error() {
        let client = create_redis_client("redis://127.0.0.1:1").unwrap();
        let (cache, _handle) = Cache::new(client).await;

        let key = CacheKey::Cycle {
            cycle: LearningCycle::Daf,
            date: day("2024-03-21"),
            version: "v1".to_string(),
        };
        let result: AppResult<Option<Vec<i64>>> = cache.get_from_cache(&key).await;
        assert!(matches!(result, Err(AppError::Cache(_))));
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_cache_miss() {
        let client = create_redis_client(&redis_url()).unwrap();
        let (cache, _handle) = Cache::new(client).await;

        let key = CacheKey::Cycle {
            cycle: LearningCycle::Nach,
            date: day("1999-01-01"),
            version: "test".to_string(),
        };
        let retrieved: Option<Vec<i64>> = cache.get_from_cache(&key).await.unwrap();

        assert_eq!(retrieved, None);
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_set_in_background_writes_to_cache() {
        let client = create_redis_client(&redis_url()).unwrap();
        let (cache, _handle) = Cache::new(client.clone()).await;

        let key = CacheKey::Holiday {
            start: day("1999-03-01"),
            end: day("1999-03-04"),
            version: "test".to_string(),
        };
        let value: Vec<i64> = vec![11, 12];

        cache.set_in_background(&key, &value, 60);
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let retrieved: Option<Vec<i64>> = cache.get_from_cache(&key).await.unwrap();
        assert_eq!(retrieved, Some(value));

        let mut conn = client.get_multiplexed_async_connection().await.unwrap();
        let _: () = conn.del(key.to_string()).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_cache_writer_graceful_shutdown() {
        let client = create_redis_client(&redis_url()).unwrap();
        let (cache, handle) = Cache::new(client.clone()).await;

        let key = CacheKey::Cycle {
            cycle: LearningCycle::Parsha,
            date: day("1999-05-05"),
            version: "test".to_string(),
        };
        let value: Vec<i64> = vec![7];

        cache.set_in_background(&key, &value, 60);
        handle.shutdown().await;
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        let retrieved: Option<Vec<i64>> = cache.get_from_cache(&key).await.unwrap();
        assert_eq!(retrieved, Some(value));

        let mut conn = client.get_multiplexed_async_connection().await.unwrap();
        let _: () = conn.del(key.to_string()).await.unwrap();
    }
}
