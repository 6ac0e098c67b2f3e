//! Rideability ratings shared by the scorer, the window finder and the projectors

use std::fmt;

use serde::{Deserialize, Serialize};

/// Overall rideability, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    /// Score >= 80
    Excellent,
    /// Score >= 60
    Good,
    /// Only produced by soil capping, between good and poor
    Medium,
    /// Everything else
    Poor,
}

impl Rating {
    /// Map a score onto the excellent/good/poor scale
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 80.0 => Rating::Excellent,
            s if s >= 60.0 => Rating::Good,
            _ => Rating::Poor,
        }
    }

    /// Keep whichever of `self` and `cap` is worse
    #[must_use]
    pub fn capped_at(self, cap: Rating) -> Self {
        self.max(cap)
    }

    #[must_use]
    pub fn emoji(&self) -> &'static str {
        match self {
            Rating::Excellent => "🟢",
            Rating::Good => "🟡",
            Rating::Medium => "🟠",
            Rating::Poor => "🔴",
        }
    }

    /// Italian headline shown next to the emoji
    #[must_use]
    pub fn headline(&self) -> &'static str {
        match self {
            Rating::Excellent => "OTTIME",
            Rating::Good => "DISCRETE",
            Rating::Medium => "MEDIE",
            Rating::Poor => "DIFFICILI",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rating::Excellent => write!(f, "excellent"),
            Rating::Good => write!(f, "good"),
            Rating::Medium => write!(f, "medium"),
            Rating::Poor => write!(f, "poor"),
        }
    }
}
