//! Three-day forecast strip combining riding windows with soil state
//!
//! Two strategies are available. `LevelCap` keeps the riding-window ratings
//! and caps them by a soil level that recovers one step per dry day.
//! `SmiIndex` ignores window scores and rates each day from the projected
//! SMI verdict. Both label days and key dates identically, so riding
//! windows are attached the same way.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::access::{AccessStatus, TrailAccess};
use super::labels::{date_key, strip_day_label, weekday_abbrev};
use super::matrix::PROJECTION_DAYS;
use super::rating::Rating;
use super::round_to;
use super::smi::project_smi;
use super::soil::{SoilRating, WET_DAY_MM};
use super::windows::RidingWindow;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionStrategy {
    LevelCap,
    #[default]
    SmiIndex,
}

/// Soil information attached to a strip day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SoilOutlook {
    Level {
        level: SoilRating,
        label: String,
    },
    Index {
        smi: f64,
        access: TrailAccess,
        status: AccessStatus,
        access_label: String,
        color: String,
    },
}

impl SoilOutlook {
    #[must_use]
    pub fn level(level: SoilRating) -> Self {
        SoilOutlook::Level {
            level,
            label: level.label().to_string(),
        }
    }

    #[must_use]
    pub fn index(smi: f64, access: TrailAccess) -> Self {
        SoilOutlook::Index {
            smi,
            access,
            status: access.status(),
            access_label: access.label().to_string(),
            color: access.color().to_string(),
        }
    }
}

/// One day of the forecast strip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    /// "Oggi", "Domani", "Dopodomani"
    pub label: String,
    pub date: NaiveDate,
    /// Same key as [`RidingWindow::date`]
    pub date_key: String,
    pub weekday: String,
    pub rain_forecast_mm: f64,
    pub rating: Rating,
    pub soil: SoilOutlook,
    pub window: Option<RidingWindow>,
}

/// Everything a strategy may look at
#[derive(Debug, Clone, Copy)]
pub struct ProjectionInput<'a> {
    pub today: NaiveDate,
    pub windows: &'a [RidingWindow],
    /// Forecast rain for `today + d`
    pub rain_by_offset: &'a [f64],
    /// Soil rating of the reference zone, `None` without history
    pub soil_rating: Option<SoilRating>,
    pub smi: f64,
    pub drainage_rate: f64,
}

impl ProjectionStrategy {
    #[must_use]
    pub fn project(self, input: &ProjectionInput<'_>) -> Vec<ForecastDay> {
        match self {
            ProjectionStrategy::LevelCap => project_level_cap(input),
            ProjectionStrategy::SmiIndex => project_smi_index(input),
        }
    }
}

/// Effective soil level for each of the first `days` offsets.
///
/// Today keeps `base`; every later day forecast below [`WET_DAY_MM`] moves the
/// level one step toward dry, wetter days carry it over.
#[must_use]
pub fn soil_levels(base: SoilRating, rain_by_offset: &[f64], days: usize) -> Vec<SoilRating> {
    let mut level = base;
    (0..days)
        .map(|offset| {
            let rain = rain_by_offset.get(offset).copied().unwrap_or(0.0);
            if offset > 0 && rain < WET_DAY_MM {
                level = level.step_toward_dry();
            }
            level
        })
        .collect()
}

/// Best rating still allowed on ground at `level`
#[must_use]
pub fn cap_for_level(level: SoilRating) -> Option<Rating> {
    match level {
        SoilRating::Saturated => Some(Rating::Poor),
        SoilRating::Wet => Some(Rating::Medium),
        SoilRating::Damp => Some(Rating::Good),
        SoilRating::Dry => None,
    }
}

/// Cap riding-window ratings by soil state.
///
/// Only wet or saturated ground triggers capping; otherwise the windows are
/// returned unchanged.
#[must_use]
pub fn apply_soil_caps(
    windows: &[RidingWindow],
    base: SoilRating,
    rain_by_offset: &[f64],
    today: NaiveDate,
) -> Vec<RidingWindow> {
    if base < SoilRating::Wet {
        return windows.to_vec();
    }

    windows
        .iter()
        .map(|window| {
            let offset = usize::try_from((window.calendar_date - today).num_days()).unwrap_or(0);
            let level = soil_levels(base, rain_by_offset, offset + 1)
                .last()
                .copied()
                .unwrap_or(base);

            let mut capped = window.clone();
            if let Some(cap) = cap_for_level(level) {
                let rating = window.rating.capped_at(cap);
                if rating != window.rating {
                    capped.set_rating(rating);
                    capped.soil_cap = Some(level);
                }
            }
            capped
        })
        .collect()
}

fn project_level_cap(input: &ProjectionInput<'_>) -> Vec<ForecastDay> {
    let base = input.soil_rating.unwrap_or(SoilRating::Dry);
    let levels = soil_levels(base, input.rain_by_offset, PROJECTION_DAYS);
    let windows = apply_soil_caps(input.windows, base, input.rain_by_offset, input.today);

    levels
        .into_iter()
        .enumerate()
        .map(|(offset, level)| {
            let date = input.today + Duration::days(offset as i64);
            let window = window_for(&windows, date);
            let rating = window.as_ref().map_or(Rating::Poor, |w| w.rating);
            strip_day(input, offset, date, rating, SoilOutlook::level(level), window)
        })
        .collect()
}

fn project_smi_index(input: &ProjectionInput<'_>) -> Vec<ForecastDay> {
    (0..PROJECTION_DAYS)
        .map(|offset| {
            let date = input.today + Duration::days(offset as i64);
            let smi = round_to(
                project_smi(input.smi, input.drainage_rate, input.rain_by_offset, offset),
                2,
            );
            let rain = input.rain_by_offset.get(offset).copied().unwrap_or(0.0);
            let access = TrailAccess::classify(smi, rain);
            let soil = SoilOutlook::index(smi, access);
            let window = window_for(input.windows, date);
            strip_day(input, offset, date, access.rating(), soil, window)
        })
        .collect()
}

fn window_for(windows: &[RidingWindow], date: NaiveDate) -> Option<RidingWindow> {
    let key = date_key(date);
    windows.iter().find(|w| w.date == key).cloned()
}

fn strip_day(
    input: &ProjectionInput<'_>,
    offset: usize,
    date: NaiveDate,
    rating: Rating,
    soil: SoilOutlook,
    window: Option<RidingWindow>,
) -> ForecastDay {
    ForecastDay {
        label: strip_day_label(offset, date),
        date,
        date_key: date_key(date),
        weekday: weekday_abbrev(date).to_string(),
        rain_forecast_mm: input.rain_by_offset.get(offset).copied().unwrap_or(0.0),
        rating,
        soil,
        window,
    }
}
