//! Trailcast - trail rideability forecasting for the Castelli Romani MTB network
//!
//! This library scores current trail conditions, finds the best riding
//! windows in the hourly forecast and tracks soil moisture per geology zone
//! to tell riders which trails are worth the trip.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod report;
pub mod trail;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use cache::{MemoryCache, PersistentCache, TtlCache};
pub use config::TrailcastConfig;
pub use error::TrailcastError;
pub use models::{DailyHistory, GeologyZone, HourlySeries};
pub use report::{TrailReport, TrailReportService, ZoneReport};
pub use weather::{CachedWeatherSource, OpenMeteoClient, WeatherSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
