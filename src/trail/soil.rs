//! Soil dryness from recent daily precipitation
//!
//! Two look-back variants are supported. Their rating cut points are tuned
//! independently and are kept as separate named tables.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::labels::weekday_abbrev;
use super::round_to;
use crate::models::DailyHistory;

/// A day with at least this much rain breaks a dry streak
pub const WET_DAY_MM: f64 = 2.0;

/// Soil wetness, driest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoilRating {
    Dry,
    Damp,
    Wet,
    Saturated,
}

impl SoilRating {
    /// One recovery step (saturated -> wet -> damp -> dry)
    #[must_use]
    pub fn step_toward_dry(self) -> Self {
        match self {
            SoilRating::Saturated => SoilRating::Wet,
            SoilRating::Wet => SoilRating::Damp,
            SoilRating::Damp | SoilRating::Dry => SoilRating::Dry,
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            SoilRating::Dry => "Asciutto",
            SoilRating::Damp => "Umido",
            SoilRating::Wet => "Bagnato",
            SoilRating::Saturated => "Saturo",
        }
    }
}

/// Upper bounds (exclusive) of each rating in mm of rain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingThresholds {
    pub dry_below: f64,
    pub damp_below: f64,
    pub wet_below: f64,
}

pub const SEVEN_DAY_THRESHOLDS: RatingThresholds = RatingThresholds {
    dry_below: 5.0,
    damp_below: 15.0,
    wet_below: 35.0,
};

pub const FIVE_DAY_THRESHOLDS: RatingThresholds = RatingThresholds {
    dry_below: 4.0,
    damp_below: 12.0,
    wet_below: 28.0,
};

impl RatingThresholds {
    #[must_use]
    pub fn rate(&self, rain_mm: f64) -> SoilRating {
        if rain_mm < self.dry_below {
            SoilRating::Dry
        } else if rain_mm < self.damp_below {
            SoilRating::Damp
        } else if rain_mm < self.wet_below {
            SoilRating::Wet
        } else {
            SoilRating::Saturated
        }
    }

    /// Smallest rain total that produces `rating`
    #[must_use]
    pub fn lower_bound(&self, rating: SoilRating) -> f64 {
        match rating {
            SoilRating::Dry => 0.0,
            SoilRating::Damp => self.dry_below,
            SoilRating::Wet => self.damp_below,
            SoilRating::Saturated => self.wet_below,
        }
    }
}

/// How many days of history feed the rain window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookBack {
    FiveDay,
    #[default]
    SevenDay,
}

impl LookBack {
    #[must_use]
    pub fn days(self) -> usize {
        match self {
            LookBack::FiveDay => 5,
            LookBack::SevenDay => 7,
        }
    }

    #[must_use]
    pub fn thresholds(self) -> RatingThresholds {
        match self {
            LookBack::FiveDay => FIVE_DAY_THRESHOLDS,
            LookBack::SevenDay => SEVEN_DAY_THRESHOLDS,
        }
    }
}

/// One bar of the history chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDay {
    pub date: NaiveDate,
    pub weekday: String,
    /// Rounded to 0.1 mm, missing values shown as 0
    pub precip_mm: f64,
    pub temp_max_c: Option<f64>,
    pub temp_min_c: Option<f64>,
}

/// Derived dryness of a zone's soil
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilDryness {
    /// Consecutive days below [`WET_DAY_MM`], newest first
    pub dry_days: u32,
    pub rain_window_mm: f64,
    pub window_days: usize,
    pub rating: SoilRating,
    pub chart: Vec<ChartDay>,
}

impl SoilDryness {
    #[must_use]
    pub fn assess(history: &DailyHistory, look_back: LookBack) -> Self {
        let precipitation = history.precipitation();
        let days = look_back.days();
        let rain_window_mm = rain_window(precipitation, days);

        let chart = history
            .last_days(days)
            .filter_map(|record| {
                let date = record.date?;
                Some(ChartDay {
                    date,
                    weekday: weekday_abbrev(date).to_string(),
                    precip_mm: round_to(record.precip_mm.unwrap_or(0.0), 1),
                    temp_max_c: record.temp_max_c,
                    temp_min_c: record.temp_min_c,
                })
            })
            .collect();

        Self {
            dry_days: count_dry_days(precipitation),
            rain_window_mm,
            window_days: days,
            rating: look_back.thresholds().rate(rain_window_mm),
            chart,
        }
    }
}

/// Count consecutive days below [`WET_DAY_MM`] from the newest entry backward.
///
/// Missing values count as dry.
#[must_use]
pub fn count_dry_days(precipitation: &[Option<f64>]) -> u32 {
    let streak = precipitation
        .iter()
        .rev()
        .take_while(|value| value.is_none_or(|mm| mm < WET_DAY_MM))
        .count();
    u32::try_from(streak).unwrap_or(u32::MAX)
}

/// Sum of the newest `days` values, missing as 0
#[must_use]
pub fn rain_window(precipitation: &[Option<f64>], days: usize) -> f64 {
    let start = precipitation.len().saturating_sub(days);
    precipitation[start..].iter().map(|v| v.unwrap_or(0.0)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn history(precip: &[f64]) -> DailyHistory {
        DailyHistory {
            date: (0..precip.len()).map(|d| format!("2024-04-{:02}", d + 1)).collect(),
            precip_sum_mm: precip.iter().copied().map(Some).collect(),
            temp_max_c: vec![Some(18.0); precip.len()],
            temp_min_c: vec![Some(7.0); precip.len()],
        }
    }

    #[test]
    fn test_all_dry_week() {
        let soil = SoilDryness::assess(&history(&[0.0; 7]), LookBack::SevenDay);
        assert_eq!(soil.dry_days, 7);
        assert_eq!(soil.rain_window_mm, 0.0);
        assert_eq!(soil.rating, SoilRating::Dry);
        assert_eq!(soil.chart.len(), 7);
    }

    #[test]
    fn test_old_heavy_rain_counts_backward() {
        let soil = SoilDryness::assess(
            &history(&[20.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            LookBack::SevenDay,
        );
        assert_eq!(soil.dry_days, 6);
        assert_eq!(soil.rain_window_mm, 20.0);
        assert_eq!(soil.rating, SoilRating::Wet);
    }

    #[test]
    fn test_missing_values_are_dry() {
        let precip = [Some(3.0), None, Some(1.9), None];
        assert_eq!(count_dry_days(&precip), 3);
        assert_eq!(rain_window(&precip, 3), 1.9);
    }

    #[test]
    fn test_window_shorter_than_history() {
        let h = history(&[30.0, 30.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        let five = SoilDryness::assess(&h, LookBack::FiveDay);
        assert_eq!(five.rain_window_mm, 5.0);
        assert_eq!(five.rating, SoilRating::Damp);
        assert_eq!(five.chart.len(), 5);
        assert_eq!(five.dry_days, 5);
    }

    #[rstest]
    #[case(LookBack::SevenDay, 4.9, SoilRating::Dry)]
    #[case(LookBack::SevenDay, 5.0, SoilRating::Damp)]
    #[case(LookBack::SevenDay, 15.0, SoilRating::Wet)]
    #[case(LookBack::SevenDay, 35.0, SoilRating::Saturated)]
    #[case(LookBack::FiveDay, 4.0, SoilRating::Damp)]
    #[case(LookBack::FiveDay, 11.9, SoilRating::Damp)]
    #[case(LookBack::FiveDay, 12.0, SoilRating::Wet)]
    #[case(LookBack::FiveDay, 28.0, SoilRating::Saturated)]
    fn test_rating_bounds(#[case] look_back: LookBack, #[case] rain: f64, #[case] expected: SoilRating) {
        assert_eq!(look_back.thresholds().rate(rain), expected);
    }

    #[rstest]
    fn test_below_lower_bound_is_never_more_severe(
        #[values(LookBack::FiveDay, LookBack::SevenDay)] look_back: LookBack,
        #[values(SoilRating::Damp, SoilRating::Wet, SoilRating::Saturated)] rating: SoilRating,
    ) {
        let thresholds = look_back.thresholds();
        let bound = thresholds.lower_bound(rating);
        for tenth in 0..(bound * 10.0) as u32 {
            let rain = f64::from(tenth) / 10.0;
            if rain < bound {
                assert!(thresholds.rate(rain) < rating, "{rain}mm rated {rating:?} or worse");
            }
        }
    }

    #[test]
    fn test_chart_skips_malformed_dates() {
        let mut h = history(&[1.26, 0.0, 0.0]);
        h.date[1] = "??".to_string();
        let soil = SoilDryness::assess(&h, LookBack::SevenDay);
        assert_eq!(soil.chart.len(), 2);
        assert_eq!(soil.chart[0].precip_mm, 1.3);
        assert_eq!(soil.chart[0].weekday, "Lun"); // 2024-04-01
    }

    #[test]
    fn test_recovery_steps() {
        assert_eq!(SoilRating::Saturated.step_toward_dry(), SoilRating::Wet);
        assert_eq!(SoilRating::Dry.step_toward_dry(), SoilRating::Dry);
    }
}
