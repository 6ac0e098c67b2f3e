//! Go/No-Go trail access verdicts

use std::fmt;

use serde::{Deserialize, Serialize};

use super::rating::Rating;

/// Tri-state access decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessStatus {
    #[serde(rename = "go")]
    Go,
    #[serde(rename = "caution")]
    Caution,
    #[serde(rename = "nogo")]
    NoGo,
}

impl fmt::Display for AccessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessStatus::Go => write!(f, "go"),
            AccessStatus::Caution => write!(f, "caution"),
            AccessStatus::NoGo => write!(f, "nogo"),
        }
    }
}

/// Trail surface verdict, the two caution levels kept apart for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailAccess {
    Rideable,
    Damp,
    Muddy,
    Saturated,
}

impl TrailAccess {
    /// Classify from SMI and the day's forecast rain.
    ///
    /// Checks run from most to least severe and the first match wins.
    #[must_use]
    pub fn classify(smi: f64, rain_forecast_mm: f64) -> Self {
        if smi > 1.2 || rain_forecast_mm > 5.0 {
            TrailAccess::Saturated
        } else if smi > 0.8 || rain_forecast_mm > 2.0 {
            TrailAccess::Muddy
        } else if smi > 0.5 {
            TrailAccess::Damp
        } else {
            TrailAccess::Rideable
        }
    }

    #[must_use]
    pub fn status(&self) -> AccessStatus {
        match self {
            TrailAccess::Rideable => AccessStatus::Go,
            TrailAccess::Damp | TrailAccess::Muddy => AccessStatus::Caution,
            TrailAccess::Saturated => AccessStatus::NoGo,
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            TrailAccess::Rideable => "Praticabile",
            TrailAccess::Damp => "Umido",
            TrailAccess::Muddy => "Fangoso",
            TrailAccess::Saturated => "Saturo",
        }
    }

    #[must_use]
    pub fn color(&self) -> &'static str {
        match self {
            TrailAccess::Rideable => "green",
            TrailAccess::Damp => "yellow",
            TrailAccess::Muddy => "orange",
            TrailAccess::Saturated => "red",
        }
    }

    /// Rating shown on the forecast strip for this verdict
    #[must_use]
    pub fn rating(&self) -> Rating {
        match self {
            TrailAccess::Rideable => Rating::Excellent,
            TrailAccess::Damp => Rating::Good,
            TrailAccess::Muddy => Rating::Medium,
            TrailAccess::Saturated => Rating::Poor,
        }
    }
}

/// Shorthand for [`TrailAccess::classify`]
#[must_use]
pub fn gonogo(smi: f64, rain_forecast_mm: f64) -> TrailAccess {
    TrailAccess::classify(smi, rain_forecast_mm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1.3, 0.0, TrailAccess::Saturated)]
    #[case(0.3, 0.0, TrailAccess::Rideable)]
    #[case(0.6, 0.0, TrailAccess::Damp)]
    #[case(0.9, 0.0, TrailAccess::Muddy)]
    #[case(0.0, 6.0, TrailAccess::Saturated)]
    #[case(0.0, 3.0, TrailAccess::Muddy)]
    #[case(0.6, 2.5, TrailAccess::Muddy)]
    #[case(1.2, 5.0, TrailAccess::Muddy)]
    #[case(0.5, 2.0, TrailAccess::Rideable)]
    fn test_classification(#[case] smi: f64, #[case] rain: f64, #[case] expected: TrailAccess) {
        assert_eq!(gonogo(smi, rain), expected);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(gonogo(1.3, 0.0).status(), AccessStatus::NoGo);
        assert_eq!(gonogo(0.6, 0.0).status(), AccessStatus::Caution);
        assert_eq!(gonogo(0.6, 0.0).label(), "Umido");
        assert_eq!(gonogo(0.0, 0.0).color(), "green");
    }

    #[test]
    fn test_serialized_names() {
        assert_eq!(serde_json::to_string(&AccessStatus::NoGo).unwrap(), "\"nogo\"");
        assert_eq!(serde_json::to_string(&TrailAccess::Muddy).unwrap(), "\"muddy\"");
    }
}
