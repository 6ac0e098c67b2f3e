//! Day labels and date keys.
//!
//! Riding windows and forecast strips are merged by [`date_key`], so every
//! producer must go through these helpers.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Italian three-letter weekday abbreviation
#[must_use]
pub fn weekday_abbrev(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Lun",
        Weekday::Tue => "Mar",
        Weekday::Wed => "Mer",
        Weekday::Thu => "Gio",
        Weekday::Fri => "Ven",
        Weekday::Sat => "Sab",
        Weekday::Sun => "Dom",
    }
}

/// Merge key shared by windows and strips (`"07 Jun"`)
#[must_use]
pub fn date_key(date: NaiveDate) -> String {
    date.format("%d %b").to_string()
}

/// Label used on riding windows: "Oggi", "Domani", else `"Sab 08 Jun"`
#[must_use]
pub fn window_day_label(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "Oggi".to_string()
    } else if date == today + Duration::days(1) {
        "Domani".to_string()
    } else {
        format!("{} {}", weekday_abbrev(date), date_key(date))
    }
}

/// Label used in the zone matrix columns
#[must_use]
pub fn matrix_day_label(offset: usize) -> String {
    match offset {
        0 => "Oggi".to_string(),
        1 => "Domani".to_string(),
        n => format!("+{n}"),
    }
}

/// Label used in the forecast strip
#[must_use]
pub fn strip_day_label(offset: usize, date: NaiveDate) -> String {
    match offset {
        0 => "Oggi".to_string(),
        1 => "Domani".to_string(),
        2 => "Dopodomani".to_string(),
        _ => format!("{} {}", weekday_abbrev(date), date_key(date)),
    }
}
