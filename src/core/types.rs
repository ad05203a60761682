//! Core data types for geo-anchored scenes

use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// GPS reading in geodetic coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Altitude in meters
    #[serde(default)]
    pub altitude: f64,
    /// Horizontal accuracy radius in meters, if the source reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

impl GeoCoordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: 0.0,
            accuracy: None,
        }
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = altitude;
        self
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }
}

/// The coordinate designated as the local-frame origin.
///
/// Only [`crate::processing::GeodeticAnchor`] creates one; the wrapped
/// coordinate cannot be changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZeroAnchor(GeoCoordinate);

impl ZeroAnchor {
    pub(crate) fn new(coordinate: GeoCoordinate) -> Self {
        ZeroAnchor(coordinate)
    }

    pub fn coordinate(&self) -> &GeoCoordinate {
        &self.0
    }
}

impl AsRef<GeoCoordinate> for ZeroAnchor {
    fn as_ref(&self) -> &GeoCoordinate {
        &self.0
    }
}

/// Cartesian offset in meters from the zero anchor.
///
/// x grows eastward, y is the altitude difference, z grows southward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LocalPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl LocalPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn to_point(&self) -> Point3<f64> {
        Point3::new(self.x, self.y, self.z)
    }
}

/// Raw device orientation reading.
///
/// Either an Euler triad (`alpha`, `beta`, `gamma` in degrees) or a heading
/// already fused by the platform compass with its own accuracy figure.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OrientationSample {
    pub alpha: Option<f64>,
    pub beta: f64,
    pub gamma: f64,
    /// Whether alpha is referenced to magnetic north; `None` when the
    /// platform does not say
    pub absolute: Option<bool>,
    pub compass_heading: Option<f64>,
    pub compass_accuracy: Option<f64>,
}

impl OrientationSample {
    pub fn euler(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self {
            alpha: Some(alpha),
            beta,
            gamma,
            ..Default::default()
        }
    }

    pub fn compass(heading: f64, accuracy: f64) -> Self {
        Self {
            compass_heading: Some(heading),
            compass_accuracy: Some(accuracy),
            ..Default::default()
        }
    }

    pub fn with_absolute(mut self, absolute: bool) -> Self {
        self.absolute = Some(absolute);
        self
    }
}

/// Latest accepted compass heading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadingState {
    /// Heading in degrees, [0, 360)
    pub heading: f64,
    pub last_update_ms: u64,
}

/// Base class of a screen orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrientationClass {
    Portrait,
    Landscape,
}

impl OrientationClass {
    /// Natural orientation of a device from its physical screen size
    pub fn from_screen_size(width: u32, height: u32) -> Self {
        if width > height {
            OrientationClass::Landscape
        } else {
            OrientationClass::Portrait
        }
    }
}

/// Current screen orientation as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScreenOrientation {
    #[serde(rename = "portrait-primary")]
    PortraitPrimary,
    #[serde(rename = "portrait-secondary")]
    PortraitSecondary,
    #[serde(rename = "landscape-primary")]
    LandscapePrimary,
    #[serde(rename = "landscape-secondary")]
    LandscapeSecondary,
}

impl ScreenOrientation {
    /// Map a legacy numeric window rotation (degrees) to an orientation
    pub fn from_window_rotation(rotation: i32) -> Option<Self> {
        match rotation {
            0 => Some(ScreenOrientation::PortraitPrimary),
            180 => Some(ScreenOrientation::PortraitSecondary),
            -90 => Some(ScreenOrientation::LandscapePrimary),
            90 => Some(ScreenOrientation::LandscapeSecondary),
            _ => None,
        }
    }

    pub fn class(&self) -> OrientationClass {
        match self {
            ScreenOrientation::PortraitPrimary | ScreenOrientation::PortraitSecondary => {
                OrientationClass::Portrait
            }
            ScreenOrientation::LandscapePrimary | ScreenOrientation::LandscapeSecondary => {
                OrientationClass::Landscape
            }
        }
    }

    pub fn is_secondary(&self) -> bool {
        matches!(
            self,
            ScreenOrientation::PortraitSecondary | ScreenOrientation::LandscapeSecondary
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScreenOrientation::PortraitPrimary => "portrait-primary",
            ScreenOrientation::PortraitSecondary => "portrait-secondary",
            ScreenOrientation::LandscapePrimary => "landscape-primary",
            ScreenOrientation::LandscapeSecondary => "landscape-secondary",
        }
    }
}

impl fmt::Display for ScreenOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScreenOrientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "portrait-primary" => Ok(ScreenOrientation::PortraitPrimary),
            "portrait-secondary" => Ok(ScreenOrientation::PortraitSecondary),
            "landscape-primary" => Ok(ScreenOrientation::LandscapePrimary),
            "landscape-secondary" => Ok(ScreenOrientation::LandscapeSecondary),
            other => Err(format!("unknown screen orientation '{}'", other)),
        }
    }
}
