//! Trail report service
//!
//! Fetches the forecast and every zone's rain history, runs the engine over
//! them and assembles the reports served over HTTP.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::TrailcastError;
use crate::config::TrailcastConfig;
use crate::models::{DailyHistory, GeologyZone, HourlySeries};
use crate::trail::matrix::PROJECTION_DAYS;
use crate::trail::{
    ForecastDay, LookBack, ProjectionInput, ProjectionStrategy, RidingWindow, SoilDryness,
    TrailConditions, ZoneInput, ZoneMatrixEntry, apply_soil_caps, build_zone_matrix,
    find_riding_windows, rain_by_offset,
};
use crate::weather::WeatherSource;

/// Dashboard report for the whole network
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrailReport {
    /// Key of the zone whose forecast drives conditions and windows
    pub reference_zone: String,
    /// `None` when the forecast came back empty
    pub conditions: Option<TrailConditions>,
    pub windows: Vec<RidingWindow>,
    pub soil: Option<SoilDryness>,
    pub matrix: Vec<ZoneMatrixEntry>,
    pub projection: ProjectionStrategy,
    pub strip: Vec<ForecastDay>,
    pub generated_at: DateTime<Utc>,
}

/// Report for a single zone, using that zone's own forecast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneReport {
    pub zone: GeologyZone,
    pub conditions: Option<TrailConditions>,
    pub windows: Vec<RidingWindow>,
    pub entry: ZoneMatrixEntry,
    pub projection: ProjectionStrategy,
    pub strip: Vec<ForecastDay>,
    pub generated_at: DateTime<Utc>,
}

pub struct TrailReportService {
    source: Arc<dyn WeatherSource>,
    zones: Vec<GeologyZone>,
    look_back: LookBack,
    projection: ProjectionStrategy,
    history_lag_days: u32,
    timezone: Tz,
}

impl TrailReportService {
    pub fn new(config: &TrailcastConfig, source: Arc<dyn WeatherSource>) -> Result<Self> {
        if config.zones.is_empty() {
            return Err(TrailcastError::config("At least one zone must be configured").into());
        }
        Ok(Self {
            source,
            zones: config.zones.clone(),
            look_back: config.engine.look_back,
            projection: config.engine.projection,
            history_lag_days: config.engine.history_lag_days,
            timezone: config.timezone()?,
        })
    }

    #[must_use]
    pub fn zones(&self) -> &[GeologyZone] {
        &self.zones
    }

    /// Current wall-clock time in the provider's timezone
    #[must_use]
    pub fn local_now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.timezone).naive_local()
    }

    pub async fn report(&self) -> Result<TrailReport> {
        self.report_at(self.local_now()).await
    }

    pub async fn zone_report(&self, key: &str) -> Result<ZoneReport> {
        self.zone_report_at(key, self.local_now()).await
    }

    /// Full report as of local time `now`
    #[instrument(skip(self))]
    pub async fn report_at(&self, now: NaiveDateTime) -> Result<TrailReport> {
        let today = now.date();
        let reference = &self.zones[0];

        let (forecast, histories) = tokio::join!(
            self.source.fetch_forecast(reference.lat, reference.lon),
            self.fetch_histories(today),
        );
        let forecast = forecast.with_context(|| format!("Forecast for {} unavailable", reference.key))?;

        let inputs: Vec<ZoneInput<'_>> = self
            .zones
            .iter()
            .zip(&histories)
            .map(|(zone, history)| ZoneInput {
                zone,
                history: history.as_ref(),
            })
            .collect();
        let matrix = build_zone_matrix(&inputs, &forecast, today, self.look_back);

        let conditions = TrailConditions::assess(&forecast.starting_at_hour(now));
        let raw_windows = find_riding_windows(&forecast, now);
        let (windows, strip) = self.project(&forecast, raw_windows, &matrix[0], today);

        info!(
            zones = matrix.len(),
            degraded = matrix.iter().filter(|e| e.soil.is_none()).count(),
            windows = windows.len(),
            "Trail report generated"
        );

        Ok(TrailReport {
            reference_zone: reference.key.clone(),
            conditions,
            windows,
            soil: matrix[0].soil.clone(),
            matrix,
            projection: self.projection,
            strip,
            generated_at: Utc::now(),
        })
    }

    /// Report for zone `key` as of local time `now`
    #[instrument(skip(self))]
    pub async fn zone_report_at(&self, key: &str, now: NaiveDateTime) -> Result<ZoneReport> {
        let zone = self
            .zones
            .iter()
            .find(|z| z.key == key)
            .ok_or_else(|| TrailcastError::unknown_zone(key))?;
        let today = now.date();

        let (forecast, history) = tokio::join!(
            self.source.fetch_forecast(zone.lat, zone.lon),
            self.fetch_history(zone, today),
        );
        let forecast = forecast.with_context(|| format!("Forecast for {} unavailable", zone.key))?;

        let input = ZoneInput {
            zone,
            history: history.as_ref(),
        };
        let entry = build_zone_matrix(&[input], &forecast, today, self.look_back)
            .into_iter()
            .next()
            .ok_or_else(|| TrailcastError::general("Matrix came back empty"))?;

        let conditions = TrailConditions::assess(&forecast.starting_at_hour(now));
        let raw_windows = find_riding_windows(&forecast, now);
        let (windows, strip) = self.project(&forecast, raw_windows, &entry, today);

        info!(zone = %zone.key, status = ?entry.days.first().map(|d| d.status), "Zone report generated");

        Ok(ZoneReport {
            zone: zone.clone(),
            conditions,
            windows,
            entry,
            projection: self.projection,
            strip,
            generated_at: Utc::now(),
        })
    }

    /// Zone matrix only; the forecast is taken at the reference point
    pub async fn matrix(&self) -> Result<Vec<ZoneMatrixEntry>> {
        Ok(self.report().await?.matrix)
    }

    /// Windows as displayed plus the forecast strip for one zone's soil
    fn project(
        &self,
        forecast: &HourlySeries,
        raw_windows: Vec<RidingWindow>,
        entry: &ZoneMatrixEntry,
        today: NaiveDate,
    ) -> (Vec<RidingWindow>, Vec<ForecastDay>) {
        let rain = rain_by_offset(&forecast.daily_precipitation(), today, PROJECTION_DAYS);
        let soil_rating = entry.soil.as_ref().map(|s| s.rating);

        let strip = self.projection.project(&ProjectionInput {
            today,
            windows: &raw_windows,
            rain_by_offset: &rain,
            soil_rating,
            smi: entry.smi,
            drainage_rate: entry.zone.drainage_rate,
        });

        let windows = match (self.projection, soil_rating) {
            (ProjectionStrategy::LevelCap, Some(base)) => {
                apply_soil_caps(&raw_windows, base, &rain, today)
            }
            _ => raw_windows,
        };
        (windows, strip)
    }

    /// History for every zone in configuration order, `None` where the fetch failed
    async fn fetch_histories(&self, today: NaiveDate) -> Vec<Option<DailyHistory>> {
        join_all(self.zones.iter().map(|zone| self.fetch_history(zone, today))).await
    }

    async fn fetch_history(&self, zone: &GeologyZone, today: NaiveDate) -> Option<DailyHistory> {
        let end_date = today - Duration::days(i64::from(self.history_lag_days));
        match self
            .source
            .fetch_history(zone.lat, zone.lon, self.look_back.days(), end_date)
            .await
        {
            Ok(history) => {
                debug!(zone = %zone.key, days = history.len(), "History fetched");
                Some(history)
            }
            Err(e) => {
                warn!(zone = %zone.key, error = %e, "History unavailable, zone degraded");
                None
            }
        }
    }
}
