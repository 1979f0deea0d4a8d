/// Read-through caching of a recommendation result in Redis.
///
/// Looks `$key` up in the cache and returns the stored value on a hit. On a miss
/// it awaits `$block`, queues the computed value for the background writer and
/// returns it. The cache only ever speeds things up: a failed read is logged at
/// `warn` and handled as a miss, and errors from `$block` are returned without
/// being cached.
///
/// # Arguments
/// * `$cache`: The cache to read from and write to. It must provide
///   `get_from_cache` and `set_in_background`.
/// * `$key`: The `CacheKey` for the result. Include the snapshot version so a
///   refreshed dataset never serves an older answer.
/// * `$ttl`: Time-to-live for the stored value, in seconds.
/// * `$block`: A future computing the value when it is not cached.
///
/// # Example
/// ```rust,ignore
/// let key = CacheKey::Cycle { cycle, date, version };
/// let shiurim = cached!(cache, key, ttl, async move {
///     engine.recommend(cycle, date).await
/// });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        match $cache.get_from_cache(&$key).await {
            Ok(Some(cached)) => {
                tracing::debug!(key = %$key, "Cache hit");
                Ok(cached)
            }
            result => {
                if let Err(e) = &result {
                    tracing::warn!(error = %e, key = %$key, "Cache read failed, computing result");
                }
                let value = $block.await?;
                $cache.set_in_background(&$key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
