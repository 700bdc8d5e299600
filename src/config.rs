use failure::Fail;
use serde::{Deserialize, Serialize};

use std::fs;
use std::io;
use std::path;

use super::comp_finder::{PropertyCategory, SortMode};

#[derive(Debug, Fail)]
pub enum ConfigError {
    #[fail(display = "I/O error reading config: {}", _0)]
    Io(io::Error),
    #[fail(display = "Invalid config json: {}", _0)]
    Json(serde_json::Error),
    #[fail(display = "Invalid value for {}: {}", _0, _1)]
    InvalidValue(&'static str, String),
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> ConfigError {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> ConfigError {
        ConfigError::Json(err)
    }
}

/// Everything the engine needs besides the rows themselves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub category: PropertyCategory,
    pub use_hotel_class_rule: bool,
    pub max_radius_miles: f64,
    pub max_gap_pct_main: f64,
    pub max_gap_pct_value: f64,
    pub max_gap_pct_size: f64,
    pub max_comps: usize,
    pub use_strict_distance: bool,
    pub use_county_match: bool,
    pub sort_mode: SortMode,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            category: PropertyCategory::Hotel,
            use_hotel_class_rule: true,
            max_radius_miles: 15.0,
            max_gap_pct_main: 0.5,
            max_gap_pct_value: 0.5,
            max_gap_pct_size: 0.5,
            max_comps: 3,
            use_strict_distance: true,
            use_county_match: true,
            sort_mode: SortMode::DistancePriority,
        }
    }
}

/// Reads `0.35` as-is and `35` as thirty-five percent.
pub fn parse_fraction(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().trim_end_matches('%').trim().parse().ok()?;
    if value > 1.0 {
        Some(value / 100.0)
    } else {
        Some(value)
    }
}

impl MatchConfig {
    #[inline]
    pub fn is_hotel(&self) -> bool {
        self.category.is_hotel()
    }

    pub fn from_json_str(json: &str) -> Result<MatchConfig, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<path::Path>>(path: P) -> Result<MatchConfig, ConfigError> {
        let contents = fs::read_to_string(path)?;
        MatchConfig::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.max_radius_miles.is_finite() || self.max_radius_miles < 0.0 {
            return Err(ConfigError::InvalidValue(
                "max_radius_miles",
                self.max_radius_miles.to_string(),
            ));
        }

        let gaps = [
            ("max_gap_pct_main", self.max_gap_pct_main),
            ("max_gap_pct_value", self.max_gap_pct_value),
            ("max_gap_pct_size", self.max_gap_pct_size),
        ];
        for (name, pct) in gaps.iter() {
            if !(0.0..=1.0).contains(pct) {
                return Err(ConfigError::InvalidValue(*name, pct.to_string()));
            }
        }

        if self.max_comps < 1 {
            return Err(ConfigError::InvalidValue("max_comps", self.max_comps.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn it_should_default_to_the_hotel_setup() {
        let config = MatchConfig::default();
        assert!(config.is_hotel());
        assert_eq!(config.max_radius_miles, 15.0);
        assert_eq!(config.max_comps, 3);
        assert_eq!(config.sort_mode, SortMode::DistancePriority);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn it_should_fill_missing_json_fields_with_defaults() {
        let config = MatchConfig::from_json_str(
            r#"{"category": "warehouse", "max_comps": 5, "sort_mode": "gap_priority"}"#,
        )
        .unwrap();

        assert_eq!(config.category, PropertyCategory::Warehouse);
        assert_eq!(config.max_comps, 5);
        assert_eq!(config.sort_mode, SortMode::GapPriority);
        assert_eq!(config.max_gap_pct_value, 0.5);
        assert!(!config.is_hotel());
    }

    #[test]
    fn it_should_fail_with_malformed_json() {
        assert_matches!(MatchConfig::from_json_str("{"), Err(ConfigError::Json(_)));
    }

    #[test]
    fn it_should_reject_out_of_range_values() {
        let bad_gap = MatchConfig {
            max_gap_pct_size: 1.5,
            ..MatchConfig::default()
        };
        assert_matches!(bad_gap.validate(), Err(ConfigError::InvalidValue("max_gap_pct_size", _)));

        let bad_radius = MatchConfig {
            max_radius_miles: -1.0,
            ..MatchConfig::default()
        };
        assert_matches!(bad_radius.validate(), Err(ConfigError::InvalidValue("max_radius_miles", _)));

        let no_comps = MatchConfig {
            max_comps: 0,
            ..MatchConfig::default()
        };
        assert_matches!(no_comps.validate(), Err(ConfigError::InvalidValue("max_comps", _)));
    }

    #[test]
    fn it_should_read_percentages_and_fractions() {
        assert_eq!(parse_fraction("0.25"), Some(0.25));
        assert_eq!(parse_fraction("25"), Some(0.25));
        assert_eq!(parse_fraction("40%"), Some(0.4));
        assert_eq!(parse_fraction("1"), Some(1.0));
        assert_eq!(parse_fraction("abc"), None);
    }
}
