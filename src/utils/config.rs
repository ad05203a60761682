use crate::core::{
    GeoCoordinate, DEFAULT_ACCURACY_THRESHOLD_M, DEFAULT_GEOLOCATION_TIMEOUT_MS,
    DEFAULT_HEADING_FIX_TIME_MS, DEFAULT_READINESS_INTERVAL_MS, DEFAULT_RIBBON_COLOR,
    DEFAULT_RIBBON_HALF_WIDTH, DEFAULT_RIBBON_OPACITY, DEFAULT_SAMPLES_PER_POINT,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Complete configuration of a tracking session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub anchor: AnchorConfig,
    pub geolocation: GeolocationOptions,
    pub compass: CompassConfig,
    pub path: PathConfig,
}

/// Zero anchor and sample acceptance settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorConfig {
    /// Samples with a larger accuracy radius are rejected (meters)
    pub accuracy_threshold_m: u32,
    /// Preset zero latitude; used only together with the longitude
    pub zero_latitude: Option<f64>,
    /// Preset zero longitude; used only together with the latitude
    pub zero_longitude: Option<f64>,
    /// Altitude assigned to a preset zero (meters)
    pub zero_altitude_m: f64,
}

/// Options passed to the platform position watch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationOptions {
    pub enable_high_accuracy: bool,
    /// Oldest cached fix the platform may deliver (milliseconds)
    pub maximum_age_ms: u64,
    pub timeout_ms: u64,
}

/// Which orientation event stream feeds the compass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrientationEventSource {
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "deviceorientationabsolute")]
    Absolute,
    #[serde(rename = "deviceorientation")]
    Relative,
}

/// Compass fusion settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompassConfig {
    /// Minimum interval between two yaw corrections (milliseconds)
    pub fix_time_ms: u64,
    pub orientation_event: OrientationEventSource,
    /// Text shown when the platform asks for compass calibration
    pub calibration_message: String,
}

/// Path ribbon and binder settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Selector of the node whose anchor defines the zero point
    pub camera_selector: String,
    pub half_width: f64,
    pub samples_per_point: usize,
    pub opacity: f64,
    /// 0xRRGGBB
    pub color: u32,
    /// Random per-face colors instead of `color`
    pub debug_colors: bool,
    pub retry_interval_ms: u64,
    /// `None` retries until the anchor is ready
    pub max_retries: Option<u32>,
    /// Ordered path coordinates
    pub points: Vec<GeoCoordinate>,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            accuracy_threshold_m: DEFAULT_ACCURACY_THRESHOLD_M,
            zero_latitude: None,
            zero_longitude: None,
            zero_altitude_m: 0.0,
        }
    }
}

impl AnchorConfig {
    /// The preset zero coordinate, if both latitude and longitude are set
    pub fn preset_zero(&self) -> Option<GeoCoordinate> {
        match (self.zero_latitude, self.zero_longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => {
                Some(GeoCoordinate::new(lat, lon).with_altitude(self.zero_altitude_m))
            }
            _ => None,
        }
    }
}

impl Default for GeolocationOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            maximum_age_ms: 0,
            timeout_ms: DEFAULT_GEOLOCATION_TIMEOUT_MS,
        }
    }
}

impl Default for CompassConfig {
    fn default() -> Self {
        Self {
            fix_time_ms: DEFAULT_HEADING_FIX_TIME_MS,
            orientation_event: OrientationEventSource::Auto,
            calibration_message: "Your compass needs calibrating! Wave your device in a figure-eight motion."
                .to_string(),
        }
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            camera_selector: "a-camera, [camera]".to_string(),
            half_width: DEFAULT_RIBBON_HALF_WIDTH,
            samples_per_point: DEFAULT_SAMPLES_PER_POINT,
            opacity: DEFAULT_RIBBON_OPACITY,
            color: DEFAULT_RIBBON_COLOR,
            debug_colors: false,
            retry_interval_ms: DEFAULT_READINESS_INTERVAL_MS,
            max_retries: None,
            points: Vec::new(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Invalid parameter value
    #[error("invalid {parameter} = {value}: {reason}")]
    InvalidParameter { parameter: String, value: String, reason: String },
    /// Configuration file I/O error
    #[error("config I/O error: {message}")]
    IoError { message: String },
    /// JSON serialization/deserialization error
    #[error("config serialization error: {message}")]
    SerializationError { message: String },
}

impl ConfigError {
    fn invalid(parameter: &str, value: impl ToString, reason: &str) -> Self {
        ConfigError::InvalidParameter {
            parameter: parameter.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Loads, validates and persists a [`SessionConfig`]
pub struct ConfigurationManager {
    config: SessionConfig,
    config_file_path: Option<String>,
    is_modified: bool,
}

impl ConfigurationManager {
    /// Create a new configuration manager with default settings
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
            config_file_path: None,
            is_modified: false,
        }
    }

    /// Create configuration manager and load from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut manager = Self::new();
        manager.load_from_file(path)?;
        Ok(manager)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Replace the whole configuration after validation
    pub fn update_config(&mut self, config: SessionConfig) -> Result<(), ConfigError> {
        Self::validate(&config)?;
        self.config = config;
        self.is_modified = true;
        Ok(())
    }

    /// Load configuration from JSON file
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
            message: format!("Failed to read config file '{}': {}", path_str, e),
        })?;

        let config: SessionConfig = serde_json::from_str(&content).map_err(|e| ConfigError::SerializationError {
            message: format!("Failed to parse config file '{}': {}", path_str, e),
        })?;

        Self::validate(&config)?;

        tracing::info!(path = %path_str, points = config.path.points.len(), "loaded session config");
        self.config = config;
        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save configuration to JSON file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = serde_json::to_string_pretty(&self.config).map_err(|e| ConfigError::SerializationError {
            message: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(&path, content).map_err(|e| ConfigError::IoError {
            message: format!("Failed to write config file '{}': {}", path_str, e),
        })?;

        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save to the currently loaded file path
    pub fn save(&mut self) -> Result<(), ConfigError> {
        match self.config_file_path.clone() {
            Some(path) => self.save_to_file(path),
            None => Err(ConfigError::IoError {
                message: "No file path set for saving configuration".to_string(),
            }),
        }
    }

    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    // Runtime parameter adjustment

    /// Update the sample accuracy threshold, returning the previous value
    pub fn set_accuracy_threshold(&mut self, threshold_m: u32) -> Result<u32, ConfigError> {
        Self::validate_accuracy_threshold(threshold_m)?;
        let old = std::mem::replace(&mut self.config.anchor.accuracy_threshold_m, threshold_m);
        self.is_modified = true;
        Ok(old)
    }

    /// Preset the zero anchor coordinate
    pub fn set_zero_coordinate(&mut self, latitude: f64, longitude: f64) -> Result<(), ConfigError> {
        Self::validate_zero(Some(latitude), Some(longitude))?;
        self.config.anchor.zero_latitude = Some(latitude);
        self.config.anchor.zero_longitude = Some(longitude);
        self.is_modified = true;
        Ok(())
    }

    /// Update the heading fix interval, returning the previous value
    pub fn set_fix_time(&mut self, fix_time_ms: u64) -> Result<u64, ConfigError> {
        Self::validate_fix_time(fix_time_ms)?;
        let old = std::mem::replace(&mut self.config.compass.fix_time_ms, fix_time_ms);
        self.is_modified = true;
        Ok(old)
    }

    /// Update the ribbon half width, returning the previous value
    pub fn set_half_width(&mut self, half_width: f64) -> Result<f64, ConfigError> {
        Self::validate_half_width(half_width)?;
        let old = std::mem::replace(&mut self.config.path.half_width, half_width);
        self.is_modified = true;
        Ok(old)
    }

    pub fn set_orientation_event(&mut self, source: OrientationEventSource) -> OrientationEventSource {
        self.is_modified = true;
        std::mem::replace(&mut self.config.compass.orientation_event, source)
    }

    pub fn set_path_points(&mut self, points: Vec<GeoCoordinate>) {
        self.config.path.points = points;
        self.is_modified = true;
    }

    // Validation

    /// Validate every section of a session configuration
    pub fn validate(config: &SessionConfig) -> Result<(), ConfigError> {
        Self::validate_accuracy_threshold(config.anchor.accuracy_threshold_m)?;
        Self::validate_zero(config.anchor.zero_latitude, config.anchor.zero_longitude)?;
        if !config.anchor.zero_altitude_m.is_finite() {
            return Err(ConfigError::invalid(
                "zero_altitude_m",
                config.anchor.zero_altitude_m,
                "Altitude must be finite",
            ));
        }

        if config.geolocation.timeout_ms == 0 {
            return Err(ConfigError::invalid("timeout_ms", 0, "Geolocation timeout must be positive"));
        }

        Self::validate_fix_time(config.compass.fix_time_ms)?;

        let path = &config.path;
        Self::validate_half_width(path.half_width)?;
        if path.samples_per_point == 0 || path.samples_per_point > 10_000 {
            return Err(ConfigError::invalid(
                "samples_per_point",
                path.samples_per_point,
                "Samples per point must be between 1 and 10000",
            ));
        }
        if !(0.0..=1.0).contains(&path.opacity) {
            return Err(ConfigError::invalid("opacity", path.opacity, "Opacity must be within [0, 1]"));
        }
        if path.color > 0xff_ff_ff {
            return Err(ConfigError::invalid("color", format!("{:#x}", path.color), "Color must be 0xRRGGBB"));
        }
        if path.retry_interval_ms == 0 {
            return Err(ConfigError::invalid("retry_interval_ms", 0, "Retry interval must be positive"));
        }
        if path.camera_selector.trim().is_empty() {
            return Err(ConfigError::invalid("camera_selector", "\"\"", "Camera selector must not be empty"));
        }

        Ok(())
    }

    fn validate_accuracy_threshold(threshold_m: u32) -> Result<(), ConfigError> {
        if threshold_m == 0 || threshold_m > 10_000 {
            return Err(ConfigError::invalid(
                "accuracy_threshold_m",
                threshold_m,
                "Accuracy threshold must be between 1 and 10000 m",
            ));
        }
        Ok(())
    }

    fn validate_zero(latitude: Option<f64>, longitude: Option<f64>) -> Result<(), ConfigError> {
        if let Some(lat) = latitude {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(ConfigError::invalid("zero_latitude", lat, "Latitude must be within [-90, 90]"));
            }
        }
        if let Some(lon) = longitude {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(ConfigError::invalid("zero_longitude", lon, "Longitude must be within [-180, 180]"));
            }
        }
        Ok(())
    }

    fn validate_fix_time(fix_time_ms: u64) -> Result<(), ConfigError> {
        if fix_time_ms == 0 || fix_time_ms > 60_000 {
            return Err(ConfigError::invalid(
                "fix_time_ms",
                fix_time_ms,
                "Heading fix time must be between 1 and 60000 ms",
            ));
        }
        Ok(())
    }

    fn validate_half_width(half_width: f64) -> Result<(), ConfigError> {
        if !(half_width.is_finite() && half_width > 0.0) {
            return Err(ConfigError::invalid("half_width", half_width, "Half width must be positive"));
        }
        Ok(())
    }
}

impl Default for ConfigurationManager {
    fn default() -> Self {
        Self::new()
    }
}
