use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use trailcast::api::AppState;
use trailcast::config::LoggingConfig;
use trailcast::{
    CachedWeatherSource, MemoryCache, OpenMeteoClient, PersistentCache, TrailReportService,
    TrailcastConfig, TtlCache, VERSION, web,
};

fn init_tracing(logging: &LoggingConfig) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("trailcast={},tower_http=info", logging.level)));
    let registry = tracing_subscriber::registry().with(filter);

    match logging.format.as_str() {
        "compact" => registry.with(fmt::layer().compact()).init(),
        _ => registry.with(fmt::layer().pretty()).init(),
    }
}

fn minutes(value: u32) -> Duration {
    Duration::from_secs(u64::from(value) * 60)
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = TrailcastConfig::load()?;
    init_tracing(&config.logging);
    info!(version = VERSION, zones = config.zones.len(), "Starting Trailcast");

    let cache: Arc<dyn TtlCache> = if config.cache.enabled {
        let path = config.cache_path();
        info!("Using persistent cache at {}", path.display());
        Arc::new(
            PersistentCache::open(&path)
                .with_context(|| format!("Failed to open cache at {}", path.display()))?,
        )
    } else {
        info!("Persistent cache disabled, using memory cache");
        Arc::new(MemoryCache::new())
    };

    let client = OpenMeteoClient::new(&config.weather)?;
    let source = CachedWeatherSource::new(
        client,
        cache.clone(),
        minutes(config.cache.forecast_ttl_minutes),
        minutes(config.cache.history_ttl_minutes),
    );
    let service = TrailReportService::new(&config, Arc::new(source))?;

    let state = AppState {
        service: Arc::new(service),
        cache,
    };
    web::run(state, config.server.port).await
}
