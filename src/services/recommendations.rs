use chrono::NaiveDate;
use std::sync::Arc;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{LearningCycle, ShiurId},
    services::{
        cycle_recommendations::CycleRecommendationEngine,
        holiday_recommendations::HolidayRecommendationEngine, providers::TableProvider,
    },
};

/// Entry point for calendar-driven recommendations.
///
/// Wraps the cycle and holiday engines behind the selector-based call shapes the
/// API exposes, and memoizes results in Redis when a cache is configured and the
/// table provider reports a snapshot version.
pub struct RecommendationService {
    tables: Arc<dyn TableProvider>,
    cycles: CycleRecommendationEngine,
    holidays: HolidayRecommendationEngine,
    cache: Option<Cache>,
    cache_ttl: u64,
}

impl RecommendationService {
    pub fn new(tables: Arc<dyn TableProvider>, holiday_window_days: u32) -> Self {
        tracing::info!(
            provider = tables.name(),
            holiday_window_days,
            "Creating recommendation service"
        );

        Self {
            cycles: CycleRecommendationEngine::new(tables.clone()),
            holidays: HolidayRecommendationEngine::new(tables.clone(), holiday_window_days),
            tables,
            cache: None,
            cache_ttl: 0,
        }
    }

    /// Enables read-through caching of results for `ttl` seconds
    pub fn with_cache(mut self, cache: Cache, ttl: u64) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    /// The cache together with the current snapshot version, when results may be cached
    async fn cache_with_version(&self) -> AppResult<Option<(&Cache, String)>> {
        let Some(cache) = &self.cache else {
            return Ok(None);
        };

        match self.tables.snapshot_version().await? {
            Some(version) => Ok(Some((cache, version))),
            None => {
                tracing::debug!(
                    provider = self.tables.name(),
                    "Provider has no snapshot version, skipping cache"
                );
                Ok(None)
            }
        }
    }

    /// Recommendations for a cycle selector such as `DAF` or `MISHNAH`.
    ///
    /// An unrecognized selector is treated like a date without data: the result
    /// is empty rather than an error.
    pub async fn get_recommendations(
        &self,
        selector: &str,
        date: NaiveDate,
    ) -> AppResult<Vec<ShiurId>> {
        let Some(cycle) = LearningCycle::parse_selector(selector) else {
            tracing::warn!(selector = %selector, "Unknown learning cycle selector");
            return Ok(vec![]);
        };

        self.cycle_recommendations(cycle, date).await
    }

    pub async fn cycle_recommendations(
        &self,
        cycle: LearningCycle,
        date: NaiveDate,
    ) -> AppResult<Vec<ShiurId>> {
        match self.cache_with_version().await? {
            Some((cache, version)) => {
                let key = CacheKey::Cycle {
                    cycle,
                    date,
                    version,
                };
                cached!(cache, key, self.cache_ttl, self.cycles.recommend(cycle, date))
            }
            None => self.cycles.recommend(cycle, date).await,
        }
    }

    /// Holiday and rosh chodesh recommendations from `start` through `end`
    pub async fn get_holiday_recommendations(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<ShiurId>> {
        if end < start {
            return Err(AppError::InvalidInput(format!(
                "end date {} is before start date {}",
                end, start
            )));
        }

        match self.cache_with_version().await? {
            Some((cache, version)) => {
                let key = CacheKey::Holiday {
                    start,
                    end,
                    version,
                };
                cached!(
                    cache,
                    key,
                    self.cache_ttl,
                    self.holidays.recommend_holiday(start, end)
                )
            }
            None => self.holidays.recommend_holiday(start, end).await,
        }
    }

    /// End of the default holiday lookahead window for `start`
    pub fn holiday_window_end(&self, start: NaiveDate) -> AppResult<NaiveDate> {
        self.holidays.window_end(start)
    }
}
