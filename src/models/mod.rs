//! Data models for the Trailcast engine
//!
//! This module contains the input series and static configuration the engine
//! works on, organized by concern:
//! - Weather: aligned hourly forecast arrays and per-hour samples
//! - History: daily precipitation/temperature history per zone
//! - Zone: geology zones of the trail network

pub mod history;
pub mod weather;
pub mod zone;

// Re-export all public types for convenient access
pub use history::{DailyHistory, DailyRecord};
pub use weather::{HourSample, HourlySeries};
pub use zone::GeologyZone;
