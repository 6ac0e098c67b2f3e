//! Daily precipitation history for a zone

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily history arrays, ordered oldest to newest.
///
/// The newest entry is the most recent *complete* day, never today.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyHistory {
    /// ISO dates (`2024-05-01`)
    #[serde(rename = "time", default)]
    pub date: Vec<String>,
    #[serde(rename = "precipitation_sum", default)]
    pub precip_sum_mm: Vec<Option<f64>>,
    #[serde(rename = "temperature_2m_max", default)]
    pub temp_max_c: Vec<Option<f64>>,
    #[serde(rename = "temperature_2m_min", default)]
    pub temp_min_c: Vec<Option<f64>>,
}

/// One day of history
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRecord {
    pub date: Option<NaiveDate>,
    pub precip_mm: Option<f64>,
    pub temp_max_c: Option<f64>,
    pub temp_min_c: Option<f64>,
}

impl DailyHistory {
    /// Number of days carrying both a date and a precipitation slot
    #[must_use]
    pub fn len(&self) -> usize {
        self.date.len().min(self.precip_sum_mm.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Precipitation values in chronological order
    #[must_use]
    pub fn precipitation(&self) -> &[Option<f64>] {
        &self.precip_sum_mm[..self.len()]
    }

    #[must_use]
    pub fn record(&self, index: usize) -> Option<DailyRecord> {
        if index >= self.len() {
            return None;
        }
        Some(DailyRecord {
            date: NaiveDate::parse_from_str(&self.date[index], "%Y-%m-%d").ok(),
            precip_mm: self.precip_sum_mm[index],
            temp_max_c: self.temp_max_c.get(index).copied().flatten(),
            temp_min_c: self.temp_min_c.get(index).copied().flatten(),
        })
    }

    /// The newest `days` records, oldest first
    pub fn last_days(&self, days: usize) -> impl Iterator<Item = DailyRecord> + '_ {
        let start = self.len().saturating_sub(days);
        (start..self.len()).filter_map(|i| self.record(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_temperatures_are_none() {
        let history = DailyHistory {
            date: vec!["2024-05-01".into(), "2024-05-02".into()],
            precip_sum_mm: vec![Some(1.0), None],
            temp_max_c: vec![Some(20.0)],
            temp_min_c: vec![],
        };
        let second = history.record(1).unwrap();
        assert_eq!(second.precip_mm, None);
        assert_eq!(second.temp_max_c, None);
        assert_eq!(history.record(0).unwrap().temp_max_c, Some(20.0));
    }

    #[test]
    fn test_last_days_is_chronological() {
        let history = DailyHistory {
            date: (1..=9).map(|d| format!("2024-05-0{d}")).collect(),
            precip_sum_mm: (1..=9).map(|d| Some(f64::from(d))).collect(),
            ..Default::default()
        };
        let values: Vec<_> = history.last_days(3).map(|r| r.precip_mm.unwrap()).collect();
        assert_eq!(values, vec![7.0, 8.0, 9.0]);
        assert_eq!(history.last_days(20).count(), 9);
    }

    #[test]
    fn test_malformed_date_parses_as_none() {
        let history = DailyHistory {
            date: vec!["not-a-date".into()],
            precip_sum_mm: vec![Some(0.0)],
            ..Default::default()
        };
        assert!(history.record(0).unwrap().date.is_none());
    }
}
