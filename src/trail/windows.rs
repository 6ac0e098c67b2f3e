//! Riding window search
//!
//! For each of the next three days, scores every daytime hour and slides
//! windows of 6, 5 and 4 hours over them to find the best block to ride.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use super::labels::{date_key, window_day_label};
use super::rating::Rating;
use super::soil::SoilRating;
use crate::models::{HourSample, HourlySeries};

/// First eligible hour (inclusive)
pub const DAY_START_HOUR: u32 = 7;
/// First excluded evening hour
pub const DAY_END_HOUR: u32 = 20;
/// Window lengths in the order they are tried
pub const WINDOW_SIZES: [usize; 3] = [6, 5, 4];
pub const MAX_DAYS: usize = 3;
pub const MIN_WINDOW_SCORE: f64 = 50.0;

/// Best block to ride on a given day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RidingWindow {
    /// "Oggi", "Domani" or `"Sab 08 Jun"`
    pub day_label: String,
    /// Merge key (`"08 Jun"`)
    pub date: String,
    pub calendar_date: NaiveDate,
    /// `"HH:MM"` of the first hour
    pub start_time: String,
    /// `"HH:MM"` of the last hour
    pub end_time: String,
    pub duration_hours: u8,
    pub rating: Rating,
    pub rating_text: String,
    pub rating_emoji: String,
    /// Average over the window
    pub temperature_c: f64,
    /// Average over the window
    pub wind_speed_kmh: f64,
    /// Peak hourly value in the window
    pub precipitation_mm: f64,
    pub score: f64,
    /// Soil level that capped `rating`, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_cap: Option<SoilRating>,
}

impl RidingWindow {
    /// Replace the rating together with its display text
    pub fn set_rating(&mut self, rating: Rating) {
        self.rating = rating;
        self.rating_text = rating.headline().to_string();
        self.rating_emoji = rating.emoji().to_string();
    }
}

#[derive(Debug, Clone)]
struct ScoredHour {
    time: NaiveDateTime,
    score: i32,
    temperature_c: f64,
    wind_speed_kmh: f64,
    precipitation_mm: f64,
}

/// Score of a single hour; penalties stack and are never floored
#[must_use]
pub fn hour_score(sample: &HourSample) -> i32 {
    let mut score = 100;
    if sample.precipitation_mm > 0.5 {
        score -= 50;
    }
    if sample.wind_speed_kmh > 25.0 {
        score -= 30;
    }
    if sample.temperature_c < 3.0 {
        score -= 20;
    }
    if sample.is_thunderstorm() {
        score -= 60;
    }
    score
}

/// Find the best riding window for each of the first three days after `now`.
///
/// `now` is local time in the series' timezone. Days with fewer than four
/// daytime hours, or whose best window averages under 50, are left out.
#[must_use]
pub fn find_riding_windows(series: &HourlySeries, now: NaiveDateTime) -> Vec<RidingWindow> {
    let mut hours_by_day: BTreeMap<NaiveDate, Vec<ScoredHour>> = BTreeMap::new();

    for sample in series.samples() {
        let Some(time) = sample.time else {
            continue;
        };
        if time <= now || time.hour() < DAY_START_HOUR || time.hour() >= DAY_END_HOUR {
            continue;
        }
        hours_by_day.entry(time.date()).or_default().push(ScoredHour {
            time,
            score: hour_score(&sample),
            temperature_c: sample.temperature_c,
            wind_speed_kmh: sample.wind_speed_kmh,
            precipitation_mm: sample.precipitation_mm,
        });
    }

    let today = now.date();
    hours_by_day
        .into_iter()
        .take(MAX_DAYS)
        .filter_map(|(day, hours)| {
            let (start, size, score) = best_window(&hours)?;
            if score < MIN_WINDOW_SCORE {
                return None;
            }
            Some(build_window(day, today, &hours[start..start + size], score))
        })
        .collect()
}

/// `(start, size, mean)` of the best window.
///
/// Only a strictly greater mean replaces the current best, so ties go to the
/// earliest window of the longest size.
fn best_window(hours: &[ScoredHour]) -> Option<(usize, usize, f64)> {
    if hours.len() < *WINDOW_SIZES.last()? {
        return None;
    }

    let mut best = None;
    let mut best_mean = 0.0;
    for size in WINDOW_SIZES {
        for (start, window) in hours.windows(size).enumerate() {
            let mean = window.iter().map(|h| f64::from(h.score)).sum::<f64>() / size as f64;
            if mean > best_mean {
                best_mean = mean;
                best = Some((start, size, mean));
            }
        }
    }
    best
}

fn build_window(day: NaiveDate, today: NaiveDate, window: &[ScoredHour], score: f64) -> RidingWindow {
    let size = window.len() as f64;
    let first = &window[0];
    let last = &window[window.len() - 1];
    let rating = Rating::from_score(score);

    RidingWindow {
        day_label: window_day_label(day, today),
        date: date_key(day),
        calendar_date: day,
        start_time: first.time.format("%H:%M").to_string(),
        end_time: last.time.format("%H:%M").to_string(),
        duration_hours: u8::try_from(window.len()).unwrap_or(u8::MAX),
        rating,
        rating_text: rating.headline().to_string(),
        rating_emoji: rating.emoji().to_string(),
        temperature_c: window.iter().map(|h| h.temperature_c).sum::<f64>() / size,
        wind_speed_kmh: window.iter().map(|h| h.wind_speed_kmh).sum::<f64>() / size,
        precipitation_mm: window.iter().map(|h| h.precipitation_mm).fold(0.0, f64::max),
        score,
        soil_cap: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    /// Three days of hourly data starting at midnight on 2024-06-06, all clean
    fn clean_series() -> HourlySeries {
        let hours = 72;
        HourlySeries {
            time: (0..hours)
                .map(|h| format!("2024-06-{:02}T{:02}:00", 6 + h / 24, h % 24))
                .collect(),
            temperature_c: vec![18.0; hours],
            precipitation_mm: vec![0.0; hours],
            wind_speed_kmh: vec![10.0; hours],
            wind_gust_kmh: vec![15.0; hours],
            weather_code: vec![1; hours],
        }
    }

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn idx(day: u32, hour: u32) -> usize {
        ((day - 6) * 24 + hour) as usize
    }

    #[test]
    fn test_clean_midday_block_is_found_exactly() {
        let mut series = clean_series();
        // Rain on every daytime hour of the 7th except 10:00-15:00
        for hour in 0..24 {
            if !(10..=15).contains(&hour) {
                series.precipitation_mm[idx(7, hour)] = 2.0;
            }
        }

        let windows = find_riding_windows(&series, at(6, 23));
        let day = windows.iter().find(|w| w.calendar_date == at(7, 0).date()).unwrap();
        assert_eq!(day.start_time, "10:00");
        assert_eq!(day.end_time, "15:00");
        assert_eq!(day.duration_hours, 6);
        assert_eq!(day.score, 100.0);
        assert_eq!(day.rating, Rating::Excellent);
        assert_eq!(day.day_label, "Domani");
    }

    #[test]
    fn test_tie_prefers_first_longest_window() {
        let windows = find_riding_windows(&clean_series(), at(6, 0));
        let today = &windows[0];
        assert_eq!(today.day_label, "Oggi");
        assert_eq!(today.start_time, "07:00");
        assert_eq!(today.end_time, "12:00");
        assert_eq!(today.duration_hours, 6);
    }

    #[test]
    fn test_shorter_window_wins_on_strictly_better_mean() {
        // 13:00 now leaves 14-19 today; rain at 14:00 drags the 6h mean to 91.7
        let mut series = clean_series();
        series.precipitation_mm[idx(6, 14)] = 1.0;
        let windows = find_riding_windows(&series, at(6, 13));
        let today = &windows[0];
        assert_eq!(today.day_label, "Oggi");
        assert_eq!((today.start_time.as_str(), today.end_time.as_str()), ("15:00", "19:00"));
        assert_eq!(today.duration_hours, 5);
        assert_eq!(today.score, 100.0);

        // rain at both ends leaves a clean four-hour core
        series.precipitation_mm[idx(6, 19)] = 1.0;
        let windows = find_riding_windows(&series, at(6, 13));
        let today = &windows[0];
        assert_eq!((today.start_time.as_str(), today.end_time.as_str()), ("15:00", "18:00"));
        assert_eq!(today.duration_hours, 4);
        assert_eq!(today.score, 100.0);
    }

    #[test]
    fn test_past_and_night_hours_are_excluded() {
        // 16:00 now: only 17, 18, 19 remain today, too few for a window
        let windows = find_riding_windows(&clean_series(), at(6, 16));
        assert!(windows.iter().all(|w| w.calendar_date != at(6, 0).date()));
        assert_eq!(windows.len(), 2);

        // 15:00 now: 16-19 is exactly four hours
        let windows = find_riding_windows(&clean_series(), at(6, 15));
        assert_eq!(windows[0].start_time, "16:00");
        assert_eq!(windows[0].end_time, "19:00");
        assert_eq!(windows[0].duration_hours, 4);
    }

    #[test]
    fn test_short_day_is_not_replaced_by_a_later_one() {
        let mut series = clean_series();
        let extra = 24;
        for h in 0..extra {
            series.time.push(format!("2024-06-09T{h:02}:00"));
        }
        series.temperature_c.extend(vec![18.0; extra]);
        series.precipitation_mm.extend(vec![0.0; extra]);
        series.wind_speed_kmh.extend(vec![10.0; extra]);
        series.wind_gust_kmh.extend(vec![15.0; extra]);
        series.weather_code.extend(vec![1; extra]);

        let windows = find_riding_windows(&series, at(6, 17));
        let dates: Vec<_> = windows.iter().map(|w| w.date.as_str()).collect();
        assert_eq!(dates, vec!["07 Jun", "08 Jun"]);
    }

    #[test]
    fn test_bad_day_is_discarded() {
        let mut series = clean_series();
        for hour in 0..24 {
            series.weather_code[idx(8, hour)] = 95;
        }
        let windows = find_riding_windows(&series, at(6, 0));
        assert_eq!(windows.len(), 2);
        assert!(windows.iter().all(|w| w.date != "08 Jun"));
    }

    #[test]
    fn test_averages_and_peak() {
        let mut series = clean_series();
        series.precipitation_mm[idx(6, 8)] = 0.4;
        series.temperature_c[idx(6, 7)] = 24.0;
        let windows = find_riding_windows(&series, at(6, 0));
        let today = &windows[0];
        assert_eq!(today.precipitation_mm, 0.4);
        assert!((today.temperature_c - 19.0).abs() < 1e-9);
        assert_eq!(today.wind_speed_kmh, 10.0);
        assert_eq!(today.day_label, "Oggi");
    }

    #[test]
    fn test_hour_score_stacks() {
        let sample = HourSample {
            time: None,
            temperature_c: 1.0,
            precipitation_mm: 3.0,
            wind_speed_kmh: 30.0,
            wind_gust_kmh: 50.0,
            weather_code: 99,
        };
        assert_eq!(hour_score(&sample), 100 - 50 - 30 - 20 - 60);
    }

    #[test]
    fn test_window_json_has_rating_text() {
        let windows = find_riding_windows(&clean_series(), at(6, 0));
        let json = serde_json::to_value(&windows[0]).unwrap();
        assert_eq!(json["rating"], "excellent");
        assert_eq!(json["rating_text"], "OTTIME");
        assert_eq!(json["rating_emoji"], "🟢");
        assert!(json.get("soil_cap").is_none());
    }

    #[test]
    fn test_third_day_label_uses_weekday() {
        let windows = find_riding_windows(&clean_series(), at(6, 0));
        assert_eq!(windows[2].day_label, "Sab 08 Jun");
    }
}
