use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod app_config;
pub mod config;
pub mod geo;
pub mod normalize;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use geo::Coordinate;

/// Default service radius, in miles, when an imported row carries none.
pub const DEFAULT_SERVICE_RADIUS_MILES: f64 = 25.0;

/// Dispatch preference rank for a technician.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Best,
    #[default]
    Normal,
    Last,
}

impl Priority {
    /// Parse a priority label case-insensitively, defaulting to `Normal`
    /// when the value is absent or unrecognized.
    #[must_use]
    pub fn parse_or_default(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "best" => Priority::Best,
            "last" => Priority::Last,
            _ => Priority::Normal,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Best => "best",
            Priority::Normal => "normal",
            Priority::Last => "last",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field technician with geographic coverage.
///
/// Latitude/longitude of `(0.0, 0.0)` is the "unresolved" sentinel, distinct
/// from any real service location (see [`geo::UNRESOLVED`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Technician {
    pub id: i64,
    pub public_id: Uuid,
    pub name: String,
    /// Canonical `(XXX) XXX-XXXX` form, or the raw input preserved as-is
    /// when it did not strip to exactly 10 digits. Never partially
    /// transformed.
    pub phone: Option<String>,
    pub email: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub service_radius_miles: f64,
    pub specialties: Vec<String>,
    pub priority: Priority,
    pub notes: Option<String>,
    pub is_active: bool,
    /// Newly onboarded technicians rank ahead of everyone else in search
    /// results.
    pub is_new: bool,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Technician {
    /// Whether coordinates were ever resolved for this technician.
    #[must_use]
    pub fn has_coordinates(&self) -> bool {
        !(self.latitude == 0.0 && self.longitude == 0.0)
    }

    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_parses_case_insensitively() {
        assert_eq!(Priority::parse_or_default("BEST"), Priority::Best);
        assert_eq!(Priority::parse_or_default("Last"), Priority::Last);
        assert_eq!(Priority::parse_or_default("normal"), Priority::Normal);
    }

    #[test]
    fn priority_defaults_to_normal_on_unknown() {
        assert_eq!(Priority::parse_or_default(""), Priority::Normal);
        assert_eq!(Priority::parse_or_default("urgent"), Priority::Normal);
    }

    #[test]
    fn priority_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Priority::Best).unwrap(), "\"best\"");
        assert_eq!(
            serde_json::from_str::<Priority>("\"last\"").unwrap(),
            Priority::Last
        );
    }

    #[test]
    fn sentinel_coordinates_are_not_resolved() {
        let tech = sample(0.0, 0.0);
        assert!(!tech.has_coordinates());
        let tech = sample(32.77, -96.79);
        assert!(tech.has_coordinates());
    }

    fn sample(lat: f64, lng: f64) -> Technician {
        Technician {
            id: 1,
            public_id: Uuid::nil(),
            name: "Jo Rivera".to_string(),
            phone: Some("(555) 123-4567".to_string()),
            email: None,
            city: "Dallas".to_string(),
            state: "TX".to_string(),
            zip: Some("75201".to_string()),
            latitude: lat,
            longitude: lng,
            service_radius_miles: DEFAULT_SERVICE_RADIUS_MILES,
            specialties: vec![],
            priority: Priority::Normal,
            notes: None,
            is_active: true,
            is_new: false,
            created_by: None,
            created_at: Utc::now(),
        }
    }
}
