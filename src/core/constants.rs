//! Physical constants and system parameters

/// Mean Earth radius used by the haversine distance (m)
pub const EARTH_RADIUS_M: f64 = 6_378_160.0;

/// Default maximum accepted GPS accuracy radius (m)
pub const DEFAULT_ACCURACY_THRESHOLD_M: u32 = 100;

/// A fused compass heading is trusted only below this accuracy (degrees)
pub const MAX_COMPASS_ACCURACY_DEG: f64 = 50.0;

/// Default minimum interval between two yaw corrections (ms)
pub const DEFAULT_HEADING_FIX_TIME_MS: u64 = 100;

/// Lateral offset of each ribbon side from the path centerline (scene units)
pub const DEFAULT_RIBBON_HALF_WIDTH: f64 = 2.0;

/// Dense curve samples emitted per input path point
pub const DEFAULT_SAMPLES_PER_POINT: usize = 100;

/// Uniform ribbon face color (0xRRGGBB)
pub const DEFAULT_RIBBON_COLOR: u32 = 0xffff00;

/// Ribbon material opacity
pub const DEFAULT_RIBBON_OPACITY: f64 = 0.5;

/// Interval between readiness probes of the path binder (ms)
pub const DEFAULT_READINESS_INTERVAL_MS: u64 = 1000;

/// Geolocation watch timeout requested from the platform (ms)
pub const DEFAULT_GEOLOCATION_TIMEOUT_MS: u64 = 27_000;
