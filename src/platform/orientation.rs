//! Orientation event stream and user prompt interfaces

use crate::core::{OrientationClass, OrientationSample, ScreenOrientation};
use crate::platform::{PlatformResult, SubscriptionHandle};
use serde::{Deserialize, Serialize};

/// Orientation-related event streams a platform may expose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrientationEventKind {
    /// Orientation referenced to magnetic north
    Absolute,
    /// Orientation in an arbitrary device frame
    Relative,
    /// Platform request to recalibrate the magnetometer
    CompassCalibration,
}

impl OrientationEventKind {
    pub fn event_name(&self) -> &'static str {
        match self {
            OrientationEventKind::Absolute => "deviceorientationabsolute",
            OrientationEventKind::Relative => "deviceorientation",
            OrientationEventKind::CompassCalibration => "compassneedscalibration",
        }
    }
}

/// Event delivered to orientation listeners
#[derive(Debug, Clone, PartialEq)]
pub enum OrientationEvent {
    Reading {
        sample: OrientationSample,
        /// Screen orientation at the time of the reading, if known
        screen: Option<ScreenOrientation>,
        timestamp_ms: u64,
    },
    CalibrationNeeded,
}

/// What the platform should do after a listener ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    Continue,
    /// Suppress the platform's default handling
    PreventDefault,
}

pub type OrientationHandler = Box<dyn FnMut(&OrientationEvent) -> EventDisposition>;

/// Platform orientation service
pub trait OrientationService {
    fn supports(&self, kind: OrientationEventKind) -> bool;

    /// Natural orientation of the device, from its physical screen size
    fn default_orientation(&self) -> OrientationClass;

    fn add_listener(&mut self, kind: OrientationEventKind, handler: OrientationHandler) -> PlatformResult<SubscriptionHandle>;

    fn remove_listener(&mut self, handle: SubscriptionHandle) -> PlatformResult<()>;
}

/// User-facing message sink
pub trait UserPrompt {
    fn alert(&self, message: &str);
}
