//! Open-Meteo forecast and archive client

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::WeatherSource;
use crate::TrailcastError;
use crate::config::WeatherConfig;
use crate::models::{DailyHistory, HourlySeries};

const HOURLY_VARIABLES: &str = "temperature_2m,precipitation,weather_code,windspeed_10m,windgusts_10m";
const DAILY_VARIABLES: &str = "precipitation_sum,temperature_2m_max,temperature_2m_min";

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    hourly: Option<HourlySeries>,
}

#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    daily: Option<DailyHistory>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    reason: String,
}

pub struct OpenMeteoClient {
    client: ClientWithMiddleware,
    forecast_base_url: String,
    archive_base_url: String,
    timezone: String,
    forecast_days: u32,
}

impl OpenMeteoClient {
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("trailcast/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(http)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            forecast_base_url: config.forecast_base_url.trim_end_matches('/').to_string(),
            archive_base_url: config.archive_base_url.trim_end_matches('/').to_string(),
            timezone: config.timezone.clone(),
            forecast_days: config.forecast_days,
        })
    }

    #[must_use]
    pub fn forecast_url(&self, lat: f64, lon: f64) -> String {
        format!(
            "{}/forecast?latitude={lat}&longitude={lon}&hourly={HOURLY_VARIABLES}&forecast_days={}&timezone={}",
            self.forecast_base_url,
            self.forecast_days,
            urlencoding::encode(&self.timezone)
        )
    }

    #[must_use]
    pub fn archive_url(&self, lat: f64, lon: f64, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "{}/archive?latitude={lat}&longitude={lon}&start_date={start}&end_date={end}&daily={DAILY_VARIABLES}&timezone={}",
            self.archive_base_url,
            urlencoding::encode(&self.timezone)
        )
    }

    async fn get_body(&self, url: &str) -> Result<String> {
        debug!("Calling the API: {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TrailcastError::api(format!("Request to Open-Meteo failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TrailcastError::api(format!("Failed to read Open-Meteo response: {e}")))?;

        if !status.is_success() {
            let reason = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.reason)
                .unwrap_or(body);
            warn!(%status, %reason, "Open-Meteo returned an error");
            return Err(TrailcastError::api(format!("Open-Meteo returned {status}: {reason}")).into());
        }

        Ok(body)
    }
}

/// Extract the hourly block of a forecast response
pub fn parse_forecast(body: &str) -> Result<HourlySeries> {
    let response: ForecastResponse = serde_json::from_str(body)
        .map_err(|e| TrailcastError::api(format!("Invalid forecast payload: {e}")))?;
    response
        .hourly
        .ok_or_else(|| TrailcastError::api("Forecast payload has no hourly data").into())
}

/// Extract the daily block of an archive response
pub fn parse_archive(body: &str) -> Result<DailyHistory> {
    let response: ArchiveResponse = serde_json::from_str(body)
        .map_err(|e| TrailcastError::api(format!("Invalid archive payload: {e}")))?;
    response
        .daily
        .ok_or_else(|| TrailcastError::api("Archive payload has no daily data").into())
}

#[async_trait]
impl WeatherSource for OpenMeteoClient {
    #[instrument(skip(self))]
    async fn fetch_forecast(&self, lat: f64, lon: f64) -> Result<HourlySeries> {
        let body = self.get_body(&self.forecast_url(lat, lon)).await?;
        let series = parse_forecast(&body)?;
        info!(hours = series.len(), "Forecast received");
        Ok(series)
    }

    #[instrument(skip(self))]
    async fn fetch_history(
        &self,
        lat: f64,
        lon: f64,
        days: usize,
        end_date: NaiveDate,
    ) -> Result<DailyHistory> {
        if days == 0 {
            return Err(TrailcastError::validation("History needs at least one day").into());
        }
        let start = end_date - chrono::Duration::days(days as i64 - 1);
        let body = self.get_body(&self.archive_url(lat, lon, start, end_date)).await?;
        let history = parse_archive(&body)?;
        info!(days = history.len(), "History received");
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OpenMeteoClient {
        OpenMeteoClient::new(&WeatherConfig::default()).unwrap()
    }

    #[test]
    fn test_forecast_url() {
        let url = client().forecast_url(41.75, 12.71);
        assert_eq!(
            url,
            "https://api.open-meteo.com/v1/forecast?latitude=41.75&longitude=12.71\
             &hourly=temperature_2m,precipitation,weather_code,windspeed_10m,windgusts_10m\
             &forecast_days=3&timezone=Europe%2FRome"
        );
    }

    #[test]
    fn test_archive_url() {
        let start = NaiveDate::from_ymd_opt(2024, 5, 28).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let url = client().archive_url(41.75, 12.71, start, end);
        assert!(url.starts_with("https://archive-api.open-meteo.com/v1/archive?"));
        assert!(url.contains("start_date=2024-05-28&end_date=2024-06-03"));
        assert!(url.contains("daily=precipitation_sum,temperature_2m_max,temperature_2m_min"));
    }

    #[test]
    fn test_parse_forecast() {
        let body = r#"{
            "latitude": 41.75,
            "hourly": {
                "time": ["2024-06-06T00:00", "2024-06-06T01:00"],
                "temperature_2m": [14.2, 13.8],
                "precipitation": [0.0, 0.3],
                "weather_code": [1, 61],
                "windspeed_10m": [5.1, 6.0],
                "windgusts_10m": [9.0, 11.2]
            }
        }"#;
        let series = parse_forecast(body).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.weather_code, vec![1, 61]);
        assert_eq!(series.wind_gust_kmh[1], 11.2);
    }

    #[test]
    fn test_parse_forecast_rejects_nulls_and_missing_block() {
        let with_null = r#"{"hourly": {"time": ["2024-06-06T00:00"], "temperature_2m": [null]}}"#;
        let err = parse_forecast(with_null).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TrailcastError>(),
            Some(TrailcastError::Api { .. })
        ));

        assert!(parse_forecast(r#"{"latitude": 41.75}"#).is_err());
    }

    #[test]
    fn test_parse_archive_keeps_missing_values() {
        let body = r#"{
            "daily": {
                "time": ["2024-06-01", "2024-06-02"],
                "precipitation_sum": [3.4, null],
                "temperature_2m_max": [22.0, 23.1],
                "temperature_2m_min": [11.0, null]
            }
        }"#;
        let history = parse_archive(body).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.precip_sum_mm, vec![Some(3.4), None]);
        assert_eq!(history.temp_min_c[1], None);
    }
}
