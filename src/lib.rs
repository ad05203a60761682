//! Geo-anchored AR scenes
//!
//! Places GPS-tagged content in a local Cartesian frame around a zero
//! anchor, turns device orientation into a compass-aligned camera yaw and
//! renders geographic paths as triangulated ribbons.

pub mod algorithms;
pub mod api;
pub mod core;
pub mod platform;
pub mod processing;
pub mod utils;
pub mod validation;

// Re-export commonly used types
pub use crate::core::{
    GeoCoordinate, HeadingState, LocalPoint, OrientationClass, OrientationSample, ScreenOrientation, ZeroAnchor,
    EARTH_RADIUS_M,
};
pub use algorithms::{
    compass_heading, distance_meters, screen_adjustment, to_local, yaw_offset, CatmullRomCurve, Face, FaceColoring,
    MeshMaterial, RibbonMesh, RibbonMesher,
};
pub use api::{
    AnchorRegistry, AnchorTracker, BinderStatus, CompassRotation, PathBinder, PollStatus, ReadinessPoll, RetryPolicy,
};
pub use platform::{
    GeolocationService, NodeId, OrientationEventKind, OrientationService, PlatformError, SceneGraph, UserPrompt,
};
pub use processing::{FusionState, GeodeticAnchor, OrientationFusion, SampleOutcome};
pub use utils::{ConfigError, ConfigurationManager, SessionConfig};
pub use validation::{Diagnostics, GeoArError, GeoArResult, Severity};
