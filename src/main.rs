use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use shiurim_recommender::{
    config::{Config, TableSource},
    db::{self, Cache},
    routes::{create_router, AppState},
    services::{
        providers::{CsvTableProvider, PostgresTableProvider, RelationNames, TableProvider},
        RecommendationService,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("shiurim_recommender=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let tables: Arc<dyn TableProvider> = match config.table_source {
        TableSource::Csv => Arc::new(CsvTableProvider::new(config.data_dir.clone())),
        TableSource::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres table source")?;
            let pool = db::create_pool(url).await?;
            Arc::new(PostgresTableProvider::new(
                pool,
                RelationNames {
                    calendar: config.calendar_table.clone(),
                    categories: config.categories_table.clone(),
                    shiurim: config.shiurim_table.clone(),
                },
            ))
        }
    };

    let mut recommendations = RecommendationService::new(tables, config.holiday_window_days);
    let mut cache_handle = None;
    if let Some(redis_url) = &config.redis_url {
        let (cache, handle) = Cache::new(db::create_redis_client(redis_url)?).await;
        recommendations = recommendations.with_cache(cache, config.cache_ttl_secs);
        cache_handle = Some(handle);
        tracing::info!(ttl = config.cache_ttl_secs, "Recommendation caching enabled");
    }

    let app = create_router(Arc::new(AppState::new(recommendations)));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_handle {
        handle.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
