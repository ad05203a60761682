//! Configuration utilities

pub mod config;

pub use config::{
    AnchorConfig, CompassConfig, ConfigError, ConfigurationManager, GeolocationOptions,
    OrientationEventSource, PathConfig, SessionConfig,
};
