//! Compass heading derivation from device orientation
//!
//! Device orientation arrives as intrinsic Z-X'-Y'' Euler angles
//! (alpha, beta, gamma). The heading is the bearing of the rear-camera axis
//! projected on the horizontal plane, corrected for how the screen is
//! currently rotated relative to the device's natural orientation.

use crate::core::{OrientationClass, ScreenOrientation};
use std::f64::consts::PI;

/// Below this magnitude the planar components carry no direction
const PLANAR_EPSILON: f64 = 1e-12;

/// Heading in degrees [0, 360) for an Euler triad in degrees.
///
/// Returns `None` when the camera axis is vertical and the heading is
/// undefined.
pub fn compass_heading(alpha: f64, beta: f64, gamma: f64) -> Option<f64> {
    let (s_a, c_a) = alpha.to_radians().sin_cos();
    let (s_b, _) = beta.to_radians().sin_cos();
    let (s_g, c_g) = gamma.to_radians().sin_cos();

    let r_a = -c_a * s_g - s_a * s_b * c_g;
    let r_b = -s_a * s_g + c_a * s_b * c_g;

    if !r_a.is_finite() || !r_b.is_finite() || r_a.hypot(r_b) < PLANAR_EPSILON {
        return None;
    }

    let mut heading = (r_a / r_b).atan();

    // atan covers half the circle
    if r_b < 0.0 {
        heading += PI;
    } else if r_a < 0.0 {
        heading += 2.0 * PI;
    }

    Some(normalize_degrees(heading.to_degrees()))
}

/// Angular correction (degrees) for the current screen rotation
pub fn screen_adjustment(default_class: OrientationClass, current: Option<ScreenOrientation>) -> f64 {
    let mut adjustment = match default_class {
        OrientationClass::Landscape => -90.0,
        OrientationClass::Portrait => 0.0,
    };

    if let Some(current) = current {
        if current.class() != default_class {
            adjustment -= match default_class {
                OrientationClass::Landscape => 270.0,
                OrientationClass::Portrait => 90.0,
            };
        }

        if current.is_secondary() {
            adjustment -= 180.0;
        }
    }

    adjustment
}

/// Yaw (degrees) that points the rig at `heading` while keeping the look
/// input the rig has already accumulated.
pub fn yaw_offset(heading: f64, entity_rotation_y: f64, rig_yaw: f64) -> f64 {
    normalize_degrees((360.0 - heading) - (entity_rotation_y - rig_yaw))
}

/// Wrap an angle into [0, 360)
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped + 0.0
    }
}
