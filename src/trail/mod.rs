//! Trail evaluation engine
//!
//! Pure functions over weather series and rain history: the current-conditions
//! scorer, the riding-window finder, the soil dryness and SMI models, the
//! go/no-go classifier, the per-zone matrix and the forecast strip. Nothing in
//! here performs I/O.

pub mod access;
pub mod conditions;
pub mod labels;
pub mod matrix;
pub mod projection;
pub mod rating;
pub mod smi;
pub mod soil;
pub mod windows;

pub use access::{AccessStatus, TrailAccess, gonogo};
pub use conditions::{Factor, Reason, Severity, TrailConditions};
pub use matrix::{DayProjection, ZoneInput, ZoneMatrixEntry, build_zone_matrix, rain_by_offset};
pub use projection::{ForecastDay, ProjectionInput, ProjectionStrategy, SoilOutlook, apply_soil_caps};
pub use rating::Rating;
pub use smi::{calculate_smi, estimate_recovery_days, project_smi};
pub use soil::{LookBack, SoilDryness, SoilRating};
pub use windows::{RidingWindow, find_riding_windows};

/// Round half away from zero to `decimals` places
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
