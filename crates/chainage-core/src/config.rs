use crate::error::{ChainageError, Result};
use crate::models::run::PropagationStrategy;
use crate::models::{fields, Station};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Resolved pipeline options with all layers applied
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    /// Corridor buffer radius around the route
    pub corridor_radius: f64,

    /// Maximum projection distance for a point to join the run
    pub projection_threshold: f64,

    /// Line-to-segment association tolerance (nearest-match strategy)
    pub snap_tolerance: f64,

    /// Point-to-line association tolerance (nearest-match strategy)
    pub point_tolerance: f64,

    /// Selection tolerance per cascade step
    pub cascade_tolerance: f64,

    /// Propagation strategy
    pub strategy: PropagationStrategy,

    /// Keep the route segment collection after the run
    pub keep_segments: bool,

    /// Output field name for station labels
    pub station_field: String,

    /// Output field name for segment IDs
    pub segment_field: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            corridor_radius: 50.0,
            projection_threshold: 50.0,
            snap_tolerance: 1.0,
            point_tolerance: 10.0,
            cascade_tolerance: 1.0,
            strategy: PropagationStrategy::Cascade,
            keep_segments: false,
            station_field: fields::STATIONING.to_string(),
            segment_field: fields::SEGMENT_ID.to_string(),
        }
    }
}

impl PipelineOptions {
    /// Check that every option holds a usable value
    pub fn validate(&self) -> Result<()> {
        let invalid = |key: &str, reason: String| ChainageError::ConfigInvalid {
            key: key.to_string(),
            reason,
        };

        if !self.corridor_radius.is_finite() || self.corridor_radius <= 0.0 {
            return Err(invalid(
                "corridor_radius",
                format!("must be a positive finite number, got {}", self.corridor_radius),
            ));
        }
        if !self.projection_threshold.is_finite() || self.projection_threshold < 0.0 {
            return Err(invalid(
                "projection_threshold",
                format!("must be a non-negative finite number, got {}", self.projection_threshold),
            ));
        }
        for (key, value) in [
            ("snap_tolerance", self.snap_tolerance),
            ("point_tolerance", self.point_tolerance),
            ("cascade_tolerance", self.cascade_tolerance),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(
                    key,
                    format!("must be a positive finite number, got {}", value),
                ));
            }
        }
        if self.station_field.is_empty() {
            return Err(invalid("station_field", "must not be empty".to_string()));
        }
        if self.segment_field.is_empty() {
            return Err(invalid("segment_field", "must not be empty".to_string()));
        }

        Ok(())
    }
}

/// Layered configuration for chainage
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub corridor_radius: ConfigValue<f64>,
    pub projection_threshold: ConfigValue<f64>,
    pub snap_tolerance: ConfigValue<f64>,
    pub point_tolerance: ConfigValue<f64>,
    pub cascade_tolerance: ConfigValue<f64>,
    pub strategy: ConfigValue<PropagationStrategy>,
    pub keep_segments: ConfigValue<bool>,
    pub station_field: ConfigValue<String>,
    pub segment_field: ConfigValue<String>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        let defaults = PipelineOptions::default();
        Self {
            corridor_radius: ConfigValue::new(defaults.corridor_radius, ConfigSource::Default),
            projection_threshold: ConfigValue::new(
                defaults.projection_threshold,
                ConfigSource::Default,
            ),
            snap_tolerance: ConfigValue::new(defaults.snap_tolerance, ConfigSource::Default),
            point_tolerance: ConfigValue::new(defaults.point_tolerance, ConfigSource::Default),
            cascade_tolerance: ConfigValue::new(
                defaults.cascade_tolerance,
                ConfigSource::Default,
            ),
            strategy: ConfigValue::new(defaults.strategy, ConfigSource::Default),
            keep_segments: ConfigValue::new(defaults.keep_segments, ConfigSource::Default),
            station_field: ConfigValue::new(defaults.station_field, ConfigSource::Default),
            segment_field: ConfigValue::new(defaults.segment_field, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ChainageError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| ChainageError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        // Update values from file
        if let Some(corridor_radius) = file_config.corridor_radius {
            self.corridor_radius.update(corridor_radius, ConfigSource::File);
        }

        if let Some(projection_threshold) = file_config.projection_threshold {
            self.projection_threshold.update(projection_threshold, ConfigSource::File);
        }

        if let Some(snap_tolerance) = file_config.snap_tolerance {
            self.snap_tolerance.update(snap_tolerance, ConfigSource::File);
        }

        if let Some(point_tolerance) = file_config.point_tolerance {
            self.point_tolerance.update(point_tolerance, ConfigSource::File);
        }

        if let Some(cascade_tolerance) = file_config.cascade_tolerance {
            self.cascade_tolerance.update(cascade_tolerance, ConfigSource::File);
        }

        if let Some(strategy) = file_config.strategy {
            self.strategy.update(strategy, ConfigSource::File);
        }

        if let Some(keep_segments) = file_config.keep_segments {
            self.keep_segments.update(keep_segments, ConfigSource::File);
        }

        if let Some(station_field) = file_config.station_field {
            self.station_field.update(station_field, ConfigSource::File);
        }

        if let Some(segment_field) = file_config.segment_field {
            self.segment_field.update(segment_field, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // CHAINAGE_CORRIDOR_RADIUS
        if let Ok(radius_str) = env::var("CHAINAGE_CORRIDOR_RADIUS") {
            match radius_str.parse::<f64>() {
                Ok(radius) => self.corridor_radius.update(radius, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid CHAINAGE_CORRIDOR_RADIUS value '{}': expected a number",
                    radius_str
                ),
            }
        }

        // CHAINAGE_PROJECTION_THRESHOLD
        if let Ok(threshold_str) = env::var("CHAINAGE_PROJECTION_THRESHOLD") {
            match threshold_str.parse::<f64>() {
                Ok(threshold) => {
                    self.projection_threshold.update(threshold, ConfigSource::Environment)
                }
                Err(_) => tracing::warn!(
                    "Invalid CHAINAGE_PROJECTION_THRESHOLD value '{}': expected a number",
                    threshold_str
                ),
            }
        }

        // CHAINAGE_SNAP_TOLERANCE
        if let Ok(tolerance_str) = env::var("CHAINAGE_SNAP_TOLERANCE") {
            match tolerance_str.parse::<f64>() {
                Ok(tolerance) => self.snap_tolerance.update(tolerance, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid CHAINAGE_SNAP_TOLERANCE value '{}': expected a number",
                    tolerance_str
                ),
            }
        }

        // CHAINAGE_POINT_TOLERANCE
        if let Ok(tolerance_str) = env::var("CHAINAGE_POINT_TOLERANCE") {
            match tolerance_str.parse::<f64>() {
                Ok(tolerance) => self.point_tolerance.update(tolerance, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid CHAINAGE_POINT_TOLERANCE value '{}': expected a number",
                    tolerance_str
                ),
            }
        }

        // CHAINAGE_CASCADE_TOLERANCE
        if let Ok(tolerance_str) = env::var("CHAINAGE_CASCADE_TOLERANCE") {
            match tolerance_str.parse::<f64>() {
                Ok(tolerance) => {
                    self.cascade_tolerance.update(tolerance, ConfigSource::Environment)
                }
                Err(_) => tracing::warn!(
                    "Invalid CHAINAGE_CASCADE_TOLERANCE value '{}': expected a number",
                    tolerance_str
                ),
            }
        }

        // CHAINAGE_STRATEGY
        if let Ok(strategy_str) = env::var("CHAINAGE_STRATEGY") {
            match parse_strategy(&strategy_str) {
                Ok(strategy) => self.strategy.update(strategy, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid CHAINAGE_STRATEGY value '{}': expected nearest-match or cascade",
                    strategy_str
                ),
            }
        }

        // CHAINAGE_KEEP_SEGMENTS
        if let Ok(keep_str) = env::var("CHAINAGE_KEEP_SEGMENTS") {
            match parse_bool(&keep_str) {
                Ok(keep) => self.keep_segments.update(keep, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid CHAINAGE_KEEP_SEGMENTS value '{}': expected true or false",
                    keep_str
                ),
            }
        }

        // CHAINAGE_STATION_FIELD
        if let Ok(field) = env::var("CHAINAGE_STATION_FIELD") {
            self.station_field.update(field, ConfigSource::Environment);
        }

        // CHAINAGE_SEGMENT_FIELD
        if let Ok(field) = env::var("CHAINAGE_SEGMENT_FIELD") {
            self.segment_field.update(field, ConfigSource::Environment);
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(corridor_radius) = overrides.corridor_radius {
            self.corridor_radius.update(corridor_radius, ConfigSource::Cli);
        }

        if let Some(projection_threshold) = overrides.projection_threshold {
            self.projection_threshold.update(projection_threshold, ConfigSource::Cli);
        }

        if let Some(snap_tolerance) = overrides.snap_tolerance {
            self.snap_tolerance.update(snap_tolerance, ConfigSource::Cli);
        }

        if let Some(point_tolerance) = overrides.point_tolerance {
            self.point_tolerance.update(point_tolerance, ConfigSource::Cli);
        }

        if let Some(cascade_tolerance) = overrides.cascade_tolerance {
            self.cascade_tolerance.update(cascade_tolerance, ConfigSource::Cli);
        }

        if let Some(strategy) = overrides.strategy {
            self.strategy.update(strategy, ConfigSource::Cli);
        }

        if let Some(keep_segments) = overrides.keep_segments {
            self.keep_segments.update(keep_segments, ConfigSource::Cli);
        }

        if let Some(station_field) = overrides.station_field {
            self.station_field.update(station_field, ConfigSource::Cli);
        }

        if let Some(segment_field) = overrides.segment_field {
            self.segment_field.update(segment_field, ConfigSource::Cli);
        }
    }

    /// Collapse the layers into plain pipeline options
    pub fn resolve(&self) -> PipelineOptions {
        PipelineOptions {
            corridor_radius: self.corridor_radius.value,
            projection_threshold: self.projection_threshold.value,
            snap_tolerance: self.snap_tolerance.value,
            point_tolerance: self.point_tolerance.value,
            cascade_tolerance: self.cascade_tolerance.value,
            strategy: self.strategy.value,
            keep_segments: self.keep_segments.value,
            station_field: self.station_field.value.clone(),
            segment_field: self.segment_field.value.clone(),
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "corridor_radius".to_string(),
            (format!("{}", self.corridor_radius.value), self.corridor_radius.source),
        );

        map.insert(
            "projection_threshold".to_string(),
            (format!("{}", self.projection_threshold.value), self.projection_threshold.source),
        );

        map.insert(
            "snap_tolerance".to_string(),
            (format!("{}", self.snap_tolerance.value), self.snap_tolerance.source),
        );

        map.insert(
            "point_tolerance".to_string(),
            (format!("{}", self.point_tolerance.value), self.point_tolerance.source),
        );

        map.insert(
            "cascade_tolerance".to_string(),
            (format!("{}", self.cascade_tolerance.value), self.cascade_tolerance.source),
        );

        map.insert(
            "strategy".to_string(),
            (self.strategy.value.to_string(), self.strategy.source),
        );

        map.insert(
            "keep_segments".to_string(),
            (format!("{}", self.keep_segments.value), self.keep_segments.source),
        );

        map.insert(
            "station_field".to_string(),
            (self.station_field.value.clone(), self.station_field.source),
        );

        map.insert(
            "segment_field".to_string(),
            (self.segment_field.value.clone(), self.segment_field.source),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    corridor_radius: Option<f64>,
    projection_threshold: Option<f64>,
    snap_tolerance: Option<f64>,
    point_tolerance: Option<f64>,
    cascade_tolerance: Option<f64>,
    strategy: Option<PropagationStrategy>,
    keep_segments: Option<bool>,
    station_field: Option<String>,
    segment_field: Option<String>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub corridor_radius: Option<f64>,
    pub projection_threshold: Option<f64>,
    pub snap_tolerance: Option<f64>,
    pub point_tolerance: Option<f64>,
    pub cascade_tolerance: Option<f64>,
    pub strategy: Option<PropagationStrategy>,
    pub keep_segments: Option<bool>,
    pub station_field: Option<String>,
    pub segment_field: Option<String>,
}

/// Parse a propagation strategy from string
pub fn parse_strategy(s: &str) -> Result<PropagationStrategy> {
    match s.to_lowercase().as_str() {
        "nearest-match" | "nearest_match" | "nearest" => Ok(PropagationStrategy::NearestMatch),
        "cascade" => Ok(PropagationStrategy::Cascade),
        _ => Err(ChainageError::ConfigInvalid {
            key: "strategy".to_string(),
            reason: format!("Invalid strategy: {}. Use nearest-match or cascade", s),
        }),
    }
}

/// Parse a boolean flag from string
pub fn parse_bool(s: &str) -> Result<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ChainageError::ConfigInvalid {
            key: "flag".to_string(),
            reason: format!("Invalid boolean: {}. Use true or false", s),
        }),
    }
}

/// Parse a station distance or label from a CLI argument
pub fn parse_station(s: &str) -> Result<Station> {
    if s.contains('+') {
        s.parse()
    } else {
        let distance: f64 = s.parse().map_err(|_| ChainageError::StationParse {
            label: s.to_string(),
            reason: "expected a distance or an HH+RR label".to_string(),
        })?;
        Station::from_distance(distance)
    }
}
