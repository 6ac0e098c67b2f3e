//! Weather data sources
//!
//! [`WeatherSource`] is the seam between the engine and the network. The
//! Open-Meteo client implements it directly; [`CachedWeatherSource`] wraps any
//! source with a TTL cache.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, instrument, warn};

use crate::cache::{self, TtlCache};
use crate::models::zone::coordinate_key;
use crate::models::{DailyHistory, HourlySeries};

pub mod open_meteo;

pub use open_meteo::OpenMeteoClient;

#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Hourly forecast starting at local midnight of today
    async fn fetch_forecast(&self, lat: f64, lon: f64) -> Result<HourlySeries>;

    /// `days` complete days of history ending on `end_date` (inclusive)
    async fn fetch_history(
        &self,
        lat: f64,
        lon: f64,
        days: usize,
        end_date: NaiveDate,
    ) -> Result<DailyHistory>;
}

#[async_trait]
impl<S: WeatherSource + ?Sized> WeatherSource for Arc<S> {
    async fn fetch_forecast(&self, lat: f64, lon: f64) -> Result<HourlySeries> {
        (**self).fetch_forecast(lat, lon).await
    }

    async fn fetch_history(
        &self,
        lat: f64,
        lon: f64,
        days: usize,
        end_date: NaiveDate,
    ) -> Result<DailyHistory> {
        (**self).fetch_history(lat, lon, days, end_date).await
    }
}

#[must_use]
pub fn forecast_key(lat: f64, lon: f64) -> String {
    format!("wx:forecast:{}", coordinate_key(lat, lon))
}

#[must_use]
pub fn history_key(lat: f64, lon: f64, days: usize) -> String {
    format!("wx:history:{}:d{days}", coordinate_key(lat, lon))
}

/// Drop cached forecast and both history windows for a coordinate
pub async fn invalidate(cache: &dyn TtlCache, lat: f64, lon: f64) -> Result<()> {
    cache.remove(&forecast_key(lat, lon)).await?;
    for days in [5, 7] {
        cache.remove(&history_key(lat, lon, days)).await?;
    }
    debug!(coordinate = %coordinate_key(lat, lon), "Weather cache invalidated");
    Ok(())
}

/// Adds TTL caching in front of another source.
///
/// Cache failures are logged and the inner source is used instead.
pub struct CachedWeatherSource<S> {
    inner: S,
    cache: Arc<dyn TtlCache>,
    forecast_ttl: Duration,
    history_ttl: Duration,
}

impl<S: WeatherSource> CachedWeatherSource<S> {
    pub fn new(inner: S, cache: Arc<dyn TtlCache>, forecast_ttl: Duration, history_ttl: Duration) -> Self {
        Self {
            inner,
            cache,
            forecast_ttl,
            history_ttl,
        }
    }

    pub async fn invalidate(&self, lat: f64, lon: f64) -> Result<()> {
        invalidate(self.cache.as_ref(), lat, lon).await
    }

    async fn lookup<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        match cache::get::<T>(self.cache.as_ref(), key).await {
            Ok(Some(value)) => {
                debug!(%key, "Cache hit");
                Some(value)
            }
            Ok(None) => {
                debug!(%key, "Cache miss");
                None
            }
            Err(e) => {
                warn!(%key, error = %e, "Cache read failed, fetching upstream");
                None
            }
        }
    }

    async fn store<T: serde::Serialize + Sync>(&self, key: &str, value: &T, ttl: Duration) {
        if let Err(e) = cache::put(self.cache.as_ref(), key, value, ttl).await {
            warn!(%key, error = %e, "Cache write failed");
        }
    }
}

#[async_trait]
impl<S: WeatherSource> WeatherSource for CachedWeatherSource<S> {
    #[instrument(level = "debug", skip(self))]
    async fn fetch_forecast(&self, lat: f64, lon: f64) -> Result<HourlySeries> {
        let key = forecast_key(lat, lon);
        if let Some(series) = self.lookup::<HourlySeries>(&key).await {
            return Ok(series);
        }

        let series = self.inner.fetch_forecast(lat, lon).await?;
        self.store(&key, &series, self.forecast_ttl).await;
        Ok(series)
    }

    #[instrument(level = "debug", skip(self))]
    async fn fetch_history(
        &self,
        lat: f64,
        lon: f64,
        days: usize,
        end_date: NaiveDate,
    ) -> Result<DailyHistory> {
        let key = history_key(lat, lon, days);
        if let Some(history) = self.lookup::<DailyHistory>(&key).await {
            return Ok(history);
        }

        let history = self.inner.fetch_history(lat, lon, days, end_date).await?;
        self.store(&key, &history, self.history_ttl).await;
        Ok(history)
    }
}
