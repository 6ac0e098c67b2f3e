//! Soil Moisture Index
//!
//! The SMI is the recent rain total divided by the zone's field capacity.
//! Around 1.0 the soil has absorbed as much as it can; above 1.2 the ground
//! is saturated. Recovery is modelled as a linear daily drain scaled by the
//! zone's drainage rate.

use super::round_to;
use super::soil::WET_DAY_MM;

/// SMI lost per dry day at drainage rate 1.0
pub const DAILY_DRAIN: f64 = 0.15;
/// At or below this SMI the trails are considered recovered
pub const SAFE_SMI: f64 = 0.5;
/// Recovery estimates stop here; the value means "30 or more"
pub const MAX_RECOVERY_DAYS: u32 = 30;
/// A day above this much forecast rain raises the SMI
pub const HEAVY_RAIN_MM: f64 = 10.0;
pub const HEAVY_RAIN_GAIN: f64 = 0.2;
pub const SMI_CEILING: f64 = 2.0;

/// `rain / field_capacity` rounded to two decimals, 0 for a non-positive capacity
#[must_use]
pub fn calculate_smi(rain_window_mm: f64, field_capacity_mm: f64) -> f64 {
    if field_capacity_mm <= 0.0 {
        return 0.0;
    }
    round_to(rain_window_mm / field_capacity_mm, 2)
}

/// Days of drying needed to bring `smi` down to [`SAFE_SMI`]
#[must_use]
pub fn estimate_recovery_days(smi: f64, drainage_rate: f64) -> u32 {
    let mut remaining = smi;
    let mut days = 0;
    while remaining > SAFE_SMI && days < MAX_RECOVERY_DAYS {
        remaining -= drainage_rate * DAILY_DRAIN;
        days += 1;
    }
    days
}

/// SMI expected after `offset` days of forecast rain.
///
/// Starts over from `smi` on every call; `daily_rain_mm[d]` is the forecast
/// for day `d` (0 = today), missing days count as dry.
#[must_use]
pub fn project_smi(smi: f64, drainage_rate: f64, daily_rain_mm: &[f64], offset: usize) -> f64 {
    (0..offset).fold(smi, |current, day| {
        let rain = daily_rain_mm.get(day).copied().unwrap_or(0.0);
        if rain < WET_DAY_MM {
            (current - drainage_rate * DAILY_DRAIN).max(0.0)
        } else if rain > HEAVY_RAIN_MM {
            (current + HEAVY_RAIN_GAIN).min(SMI_CEILING)
        } else {
            current
        }
    })
}
