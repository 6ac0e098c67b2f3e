//! Per-zone go/no-go matrix for the next three days

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::access::{AccessStatus, TrailAccess};
use super::labels::matrix_day_label;
use super::round_to;
use super::smi::{calculate_smi, estimate_recovery_days, project_smi};
use super::soil::{LookBack, SoilDryness};
use crate::models::{DailyHistory, GeologyZone, HourlySeries};

/// Number of day columns in the matrix
pub const PROJECTION_DAYS: usize = 3;

/// One column of a zone's row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayProjection {
    /// "Oggi", "Domani", "+2"
    pub label: String,
    pub date: NaiveDate,
    /// Rounded to two decimals; the verdict is taken on the rounded value
    pub smi_projected: f64,
    pub rain_forecast_mm: f64,
    pub access: TrailAccess,
    pub status: AccessStatus,
    /// "Praticabile", "Umido", "Fangoso" or "Saturo"
    pub access_label: String,
    pub color: String,
}

/// A zone's row of the matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneMatrixEntry {
    pub zone: GeologyZone,
    /// `None` when the zone's history could not be fetched
    pub soil: Option<SoilDryness>,
    pub smi: f64,
    /// Capped at 30, meaning "30 or more"
    pub recovery_days: u32,
    pub days: Vec<DayProjection>,
}

/// A configured zone paired with whatever history was fetched for it
#[derive(Debug, Clone, Copy)]
pub struct ZoneInput<'a> {
    pub zone: &'a GeologyZone,
    pub history: Option<&'a DailyHistory>,
}

impl ZoneMatrixEntry {
    /// Build a zone's row.
    ///
    /// `rain_by_offset[d]` is the forecast rain for `today + d`.
    #[must_use]
    pub fn build(
        zone: &GeologyZone,
        history: Option<&DailyHistory>,
        rain_by_offset: &[f64],
        today: NaiveDate,
        look_back: LookBack,
    ) -> Self {
        let soil = history.map(|h| SoilDryness::assess(h, look_back));
        let rain_window_mm = soil.as_ref().map_or(0.0, |s| s.rain_window_mm);

        let smi = calculate_smi(rain_window_mm, zone.field_capacity_mm);
        let recovery_days = estimate_recovery_days(smi, zone.drainage_rate);

        let days = (0..PROJECTION_DAYS)
            .map(|offset| {
                let smi_projected =
                    round_to(project_smi(smi, zone.drainage_rate, rain_by_offset, offset), 2);
                let rain_forecast_mm = rain_by_offset.get(offset).copied().unwrap_or(0.0);
                let access = TrailAccess::classify(smi_projected, rain_forecast_mm);
                DayProjection {
                    label: matrix_day_label(offset),
                    date: today + Duration::days(offset as i64),
                    smi_projected,
                    rain_forecast_mm,
                    access,
                    status: access.status(),
                    access_label: access.label().to_string(),
                    color: access.color().to_string(),
                }
            })
            .collect();

        Self {
            zone: zone.clone(),
            soil,
            smi,
            recovery_days,
            days,
        }
    }
}

/// Forecast rain for `today`, `today + 1`, ... `today + days - 1`; absent dates are 0
#[must_use]
pub fn rain_by_offset(daily: &BTreeMap<NaiveDate, f64>, today: NaiveDate, days: usize) -> Vec<f64> {
    (0..days)
        .map(|offset| {
            daily
                .get(&(today + Duration::days(offset as i64)))
                .copied()
                .unwrap_or(0.0)
        })
        .collect()
}

/// One entry per zone, in input order
#[must_use]
pub fn build_zone_matrix(
    inputs: &[ZoneInput<'_>],
    forecast: &HourlySeries,
    today: NaiveDate,
    look_back: LookBack,
) -> Vec<ZoneMatrixEntry> {
    let rain = rain_by_offset(&forecast.daily_precipitation(), today, PROJECTION_DAYS);
    inputs
        .iter()
        .map(|input| ZoneMatrixEntry::build(input.zone, input.history, &rain, today, look_back))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(field_capacity_mm: f64, drainage_rate: f64) -> GeologyZone {
        GeologyZone {
            key: "test".into(),
            name: "Test".into(),
            lat: 41.75,
            lon: 12.72,
            elevation_m: 900,
            geology_label: "Tufo".into(),
            geology_detail: String::new(),
            field_capacity_mm,
            drainage_rate,
        }
    }

    fn history(precip: &[f64]) -> DailyHistory {
        DailyHistory {
            date: (0..precip.len()).map(|d| format!("2024-06-{:02}", d + 1)).collect(),
            precip_sum_mm: precip.iter().copied().map(Some).collect(),
            ..Default::default()
        }
    }

    /// Three days of hourly rain starting on 2024-06-08
    fn forecast(hourly_rain: [f64; 3]) -> HourlySeries {
        let hours = 72;
        HourlySeries {
            time: (0..hours)
                .map(|h| format!("2024-06-{:02}T{:02}:00", 8 + h / 24, h % 24))
                .collect(),
            temperature_c: vec![15.0; hours],
            precipitation_mm: (0..hours).map(|h| hourly_rain[h / 24]).collect(),
            wind_speed_kmh: vec![5.0; hours],
            wind_gust_kmh: vec![8.0; hours],
            weather_code: vec![0; hours],
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 8).unwrap()
    }

    #[test]
    fn test_dry_zone_is_go() {
        let z = zone(45.0, 1.0);
        let h = history(&[0.0; 7]);
        let matrix = build_zone_matrix(
            &[ZoneInput { zone: &z, history: Some(&h) }],
            &forecast([0.0; 3]),
            today(),
            LookBack::SevenDay,
        );
        let entry = &matrix[0];
        assert_eq!(entry.smi, 0.0);
        assert_eq!(entry.recovery_days, 0);
        assert_eq!(entry.days.len(), PROJECTION_DAYS);
        assert!(entry.days.iter().all(|d| d.status == AccessStatus::Go));
        assert_eq!(entry.days[2].label, "+2");
        assert_eq!(entry.days[2].date, NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
    }

    #[test]
    fn test_wet_zone_recovers_over_days() {
        // 45mm in a week on 45mm capacity -> SMI 1.0
        let z = zone(45.0, 1.0);
        let h = history(&[15.0, 15.0, 15.0, 0.0, 0.0, 0.0, 0.0]);
        let entry = ZoneMatrixEntry::build(&z, Some(&h), &[0.0, 0.0, 0.0], today(), LookBack::SevenDay);
        assert_eq!(entry.smi, 1.0);
        assert_eq!(entry.recovery_days, 4);
        let access: Vec<_> = entry.days.iter().map(|d| d.access).collect();
        assert_eq!(
            access,
            vec![TrailAccess::Muddy, TrailAccess::Muddy, TrailAccess::Damp]
        );
        assert_eq!(entry.days[1].smi_projected, 0.85);
        assert_eq!(entry.days[2].smi_projected, 0.7);
    }

    #[test]
    fn test_forecast_rain_drives_nogo() {
        let z = zone(45.0, 1.0);
        let h = history(&[0.0; 7]);
        // 0.25mm/h = 6mm on the second day
        let matrix = build_zone_matrix(
            &[ZoneInput { zone: &z, history: Some(&h) }],
            &forecast([0.0, 0.25, 0.0]),
            today(),
            LookBack::SevenDay,
        );
        let statuses: Vec<_> = matrix[0].days.iter().map(|d| d.status).collect();
        assert_eq!(
            statuses,
            vec![AccessStatus::Go, AccessStatus::NoGo, AccessStatus::Go]
        );
        assert!((matrix[0].days[1].rain_forecast_mm - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_history_keeps_the_zone() {
        let a = zone(45.0, 1.0);
        let mut b = zone(30.0, 1.0);
        b.key = "other".into();
        let h = history(&[40.0; 7]);
        let matrix = build_zone_matrix(
            &[
                ZoneInput { zone: &a, history: None },
                ZoneInput { zone: &b, history: Some(&h) },
            ],
            &forecast([0.0; 3]),
            today(),
            LookBack::SevenDay,
        );
        assert_eq!(matrix.len(), 2);
        assert!(matrix[0].soil.is_none());
        assert_eq!(matrix[0].smi, 0.0);
        assert_eq!(matrix[1].zone.key, "other");
        assert_eq!(matrix[1].recovery_days, 30);
        assert_eq!(matrix[1].days[0].status, AccessStatus::NoGo);

        let json = serde_json::to_value(&matrix[1].days[0]).unwrap();
        assert_eq!(json["access"], "saturated");
        assert_eq!(json["access_label"], "Saturo");
        assert_eq!(json["color"], "red");
    }

    #[test]
    fn test_rain_by_offset_fills_gaps() {
        let mut daily = BTreeMap::new();
        daily.insert(today() + Duration::days(1), 4.0);
        assert_eq!(rain_by_offset(&daily, today(), 3), vec![0.0, 4.0, 0.0]);
    }
}
