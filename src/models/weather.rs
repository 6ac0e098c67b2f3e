//! Hourly forecast series and per-hour accessors

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// WMO weather codes reported for thunderstorms (with or without hail)
pub const THUNDERSTORM_CODES: [u16; 3] = [95, 96, 99];

/// Aligned hourly forecast arrays, as delivered by `OpenMeteo`
///
/// Every array is indexed by hour. Arrays of unequal length are tolerated:
/// hourly samples only come from the common prefix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlySeries {
    /// ISO-8601 local timestamps (`2024-05-01T14:00`)
    #[serde(default)]
    pub time: Vec<String>,
    /// Air temperature at 2m in Celsius
    #[serde(rename = "temperature_2m", default)]
    pub temperature_c: Vec<f64>,
    /// Precipitation in mm for the preceding hour
    #[serde(rename = "precipitation", default)]
    pub precipitation_mm: Vec<f64>,
    /// Wind speed at 10m in km/h
    #[serde(rename = "windspeed_10m", alias = "wind_speed_10m", default)]
    pub wind_speed_kmh: Vec<f64>,
    /// Wind gusts at 10m in km/h
    #[serde(rename = "windgusts_10m", alias = "wind_gusts_10m", default)]
    pub wind_gust_kmh: Vec<f64>,
    /// WMO weather condition code
    #[serde(rename = "weather_code", alias = "weathercode", default)]
    pub weather_code: Vec<u16>,
}

/// A single hour read out of an [`HourlySeries`]
#[derive(Debug, Clone, PartialEq)]
pub struct HourSample {
    /// Parsed timestamp, `None` when the raw value is malformed
    pub time: Option<NaiveDateTime>,
    pub temperature_c: f64,
    pub precipitation_mm: f64,
    pub wind_speed_kmh: f64,
    pub wind_gust_kmh: f64,
    pub weather_code: u16,
}

impl HourSample {
    #[must_use]
    pub fn is_thunderstorm(&self) -> bool {
        THUNDERSTORM_CODES.contains(&self.weather_code)
    }
}

impl HourlySeries {
    /// Number of hours for which every array has a value
    #[must_use]
    pub fn len(&self) -> usize {
        [
            self.time.len(),
            self.temperature_c.len(),
            self.precipitation_mm.len(),
            self.wind_speed_kmh.len(),
            self.wind_gust_kmh.len(),
            self.weather_code.len(),
        ]
        .into_iter()
        .min()
        .unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read the hour at `index`, if it lies inside the aligned prefix
    #[must_use]
    pub fn sample(&self, index: usize) -> Option<HourSample> {
        if index >= self.len() {
            return None;
        }

        Some(HourSample {
            time: parse_local_timestamp(&self.time[index]),
            temperature_c: self.temperature_c[index],
            precipitation_mm: self.precipitation_mm[index],
            wind_speed_kmh: self.wind_speed_kmh[index],
            wind_gust_kmh: self.wind_gust_kmh[index],
            weather_code: self.weather_code[index],
        })
    }

    /// Iterate over every aligned hour in order
    pub fn samples(&self) -> impl Iterator<Item = HourSample> + '_ {
        (0..self.len()).filter_map(|i| self.sample(i))
    }

    /// Total precipitation over the first `hours` samples.
    ///
    /// Returns 0 when fewer than `hours` precipitation values exist.
    #[must_use]
    pub fn leading_precipitation(&self, hours: usize) -> f64 {
        if self.precipitation_mm.len() < hours {
            return 0.0;
        }
        self.precipitation_mm[..hours].iter().sum()
    }

    /// The series from the hour containing `now` onward.
    ///
    /// Empty when every timestamp lies before that hour.
    #[must_use]
    pub fn starting_at_hour(&self, now: NaiveDateTime) -> HourlySeries {
        fn tail<T: Clone>(values: &[T], start: usize) -> Vec<T> {
            values.get(start..).map(<[T]>::to_vec).unwrap_or_default()
        }

        let hour = now
            .with_minute(0)
            .and_then(|t| t.with_second(0))
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(now);
        let start = self
            .time
            .iter()
            .position(|raw| parse_local_timestamp(raw).is_some_and(|t| t >= hour))
            .unwrap_or(self.time.len());

        HourlySeries {
            time: tail(&self.time, start),
            temperature_c: tail(&self.temperature_c, start),
            precipitation_mm: tail(&self.precipitation_mm, start),
            wind_speed_kmh: tail(&self.wind_speed_kmh, start),
            wind_gust_kmh: tail(&self.wind_gust_kmh, start),
            weather_code: tail(&self.weather_code, start),
        }
    }

    /// Precipitation summed per local calendar date.
    ///
    /// Hours with a malformed timestamp are skipped.
    #[must_use]
    pub fn daily_precipitation(&self) -> BTreeMap<NaiveDate, f64> {
        let mut totals = BTreeMap::new();
        for sample in self.samples() {
            if let Some(time) = sample.time {
                *totals.entry(time.date()).or_insert(0.0) += sample.precipitation_mm;
            }
        }
        totals
    }
}

/// Parse an `OpenMeteo` local timestamp, with or without seconds
#[must_use]
pub fn parse_local_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}
