//! Geology zones of the trail network

use serde::{Deserialize, Serialize};

/// A geographic zone with homogeneous soil behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeologyZone {
    /// Stable identifier used in URLs and config (`monte-cavo`)
    pub key: String,
    /// Display name
    pub name: String,
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lon: f64,
    /// Elevation in metres
    pub elevation_m: u32,
    /// Short geology description (`Tufo litoide`)
    pub geology_label: String,
    #[serde(default)]
    pub geology_detail: String,
    /// Rain in mm the soil absorbs before the surface saturates
    pub field_capacity_mm: f64,
    /// Relative daily recovery speed, 1.0 is the baseline
    pub drainage_rate: f64,
}

impl GeologyZone {
    /// Round coordinates for cache key generation
    #[must_use]
    pub fn coordinate_key(&self) -> String {
        coordinate_key(self.lat, self.lon)
    }

    /// The Castelli Romani zones served by default
    #[must_use]
    pub fn castelli_romani() -> Vec<Self> {
        vec![
            Self::builtin(
                "monte-cavo",
                "Monte Cavo",
                (41.7517, 12.710, 949),
                ("Lave leucititiche", "Colate laviche compatte, suolo sottile e roccioso"),
                (35.0, 1.3),
            ),
            Self::builtin(
                "colle-jano",
                "Colle Jano",
                (41.757, 12.726, 938),
                ("Tufo litoide", "Tufi consolidati con copertura di lettiera"),
                (45.0, 1.0),
            ),
            Self::builtin(
                "maschio-faete",
                "Maschio delle Faete",
                (41.7569, 12.7442, 956),
                ("Scorie e lapilli", "Piroclastiti grossolane molto drenanti"),
                (40.0, 1.2),
            ),
            Self::builtin(
                "maschio-ariano",
                "Maschio d'Ariano",
                (41.7394, 12.7908, 891),
                ("Pozzolane", "Pozzolane rosse e grigie, drenaggio medio"),
                (50.0, 0.9),
            ),
            Self::builtin(
                "maschio-artemisio",
                "Maschio d'Artemisio",
                (41.7122, 12.7534, 812),
                ("Tufi stratificati", "Alternanza di tufi e paleosuoli argillosi"),
                (55.0, 0.8),
            ),
            Self::builtin(
                "fontana-tempesta",
                "Fontana Tempesta",
                (41.735, 12.712, 560),
                ("Depositi di fondovalle", "Suoli argillosi con ristagno idrico"),
                (60.0, 0.6),
            ),
        ]
    }

    fn builtin(
        key: &str,
        name: &str,
        (lat, lon, elevation_m): (f64, f64, u32),
        (label, detail): (&str, &str),
        (field_capacity_mm, drainage_rate): (f64, f64),
    ) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            lat,
            lon,
            elevation_m,
            geology_label: label.to_string(),
            geology_detail: detail.to_string(),
            field_capacity_mm,
            drainage_rate,
        }
    }
}

/// `lat_lon` rounded to three decimals (~100 m)
#[must_use]
pub fn coordinate_key(lat: f64, lon: f64) -> String {
    format!("{lat:.3}_{lon:.3}")
}
