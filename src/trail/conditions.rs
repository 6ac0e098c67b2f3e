//! Instantaneous trail condition scoring
//!
//! Combines the rain of the last 24 hours with the current wind, gusts and
//! temperature into a single rideability score.

use serde::{Deserialize, Serialize};

use super::rating::Rating;
use crate::models::HourlySeries;

/// Hours of precipitation considered "recent rain"
pub const RAIN_LOOKBACK_HOURS: usize = 24;

/// Which input a reason talks about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Factor {
    Rain,
    Wind,
    Gust,
    Temperature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Ok,
    Warning,
    Critical,
}

impl Severity {
    #[must_use]
    pub fn icon(&self) -> &'static str {
        match self {
            Severity::Ok => "✅",
            Severity::Warning => "⚠️",
            Severity::Critical => "❌",
        }
    }
}

/// One line of the explanation shown next to the score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reason {
    pub factor: Factor,
    pub severity: Severity,
    pub icon: String,
    pub message: String,
}

impl Reason {
    fn new(factor: Factor, severity: Severity, message: String) -> Self {
        Self {
            factor,
            severity,
            icon: severity.icon().to_string(),
            message,
        }
    }
}

/// Current rideability of the trail network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailConditions {
    /// Starts at 100, penalties are never floored
    pub score: i32,
    pub rating: Rating,
    /// Italian headline for `rating`
    pub rating_text: String,
    pub rating_emoji: String,
    /// Ordered rain, wind, gust, temperature
    pub reasons: Vec<Reason>,
    pub rain_24h_mm: f64,
    pub current_wind_kmh: f64,
    pub current_gust_kmh: f64,
    pub current_temperature_c: f64,
}

impl TrailConditions {
    /// Score the hour at index 0 of `series`.
    ///
    /// Returns `None` for an empty series.
    #[must_use]
    pub fn assess(series: &HourlySeries) -> Option<Self> {
        let now = series.sample(0)?;
        let rain_24h = series.leading_precipitation(RAIN_LOOKBACK_HOURS);

        let mut score = 100;
        let mut reasons = Vec::with_capacity(4);

        if rain_24h > 15.0 {
            score -= 40;
            reasons.push(Reason::new(
                Factor::Rain,
                Severity::Critical,
                format!("Pioggia abbondante ultime 24h ({rain_24h:.1}mm)"),
            ));
        } else if rain_24h > 5.0 {
            score -= 20;
            reasons.push(Reason::new(
                Factor::Rain,
                Severity::Warning,
                format!("Pioggia moderata ultime 24h ({rain_24h:.1}mm)"),
            ));
        } else {
            reasons.push(Reason::new(
                Factor::Rain,
                Severity::Ok,
                "Sentieri asciutti".to_string(),
            ));
        }

        let wind = now.wind_speed_kmh;
        if wind > 30.0 {
            score -= 30;
            reasons.push(Reason::new(
                Factor::Wind,
                Severity::Critical,
                format!("Vento forte ({wind:.0} km/h)"),
            ));
        } else if wind > 20.0 {
            score -= 15;
            reasons.push(Reason::new(
                Factor::Wind,
                Severity::Warning,
                format!("Vento moderato ({wind:.0} km/h)"),
            ));
        } else {
            reasons.push(Reason::new(
                Factor::Wind,
                Severity::Ok,
                format!("Vento calmo ({wind:.0} km/h)"),
            ));
        }

        // Calm gusts add no line
        let gust = now.wind_gust_kmh;
        if gust > 40.0 {
            score -= 20;
            reasons.push(Reason::new(
                Factor::Gust,
                Severity::Critical,
                format!("Raffiche pericolose ({gust:.0} km/h)"),
            ));
        } else if gust > 30.0 {
            score -= 10;
            reasons.push(Reason::new(
                Factor::Gust,
                Severity::Warning,
                format!("Raffiche moderate ({gust:.0} km/h)"),
            ));
        }

        let temperature = now.temperature_c;
        if temperature < 0.0 {
            score -= 30;
            reasons.push(Reason::new(
                Factor::Temperature,
                Severity::Critical,
                format!("Rischio ghiaccio ({temperature:.0}°C)"),
            ));
        } else if temperature < 3.0 {
            score -= 15;
            reasons.push(Reason::new(
                Factor::Temperature,
                Severity::Warning,
                format!("Temperature basse ({temperature:.0}°C)"),
            ));
        } else {
            reasons.push(Reason::new(
                Factor::Temperature,
                Severity::Ok,
                format!("Temperatura OK ({temperature:.0}°C)"),
            ));
        }

        let rating = Rating::from_score(f64::from(score));
        Some(Self {
            score,
            rating,
            rating_text: rating.headline().to_string(),
            rating_emoji: rating.emoji().to_string(),
            reasons,
            rain_24h_mm: rain_24h,
            current_wind_kmh: wind,
            current_gust_kmh: gust,
            current_temperature_c: temperature,
        })
    }
}
