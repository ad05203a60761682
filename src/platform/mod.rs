//! Platform abstraction layer
//!
//! Traits for the services the core consumes but does not own: the
//! position stream, the orientation event stream, user prompts and the
//! host scene graph. `mock` provides in-memory implementations.

pub mod error;
pub mod geolocation;
pub mod mock;
pub mod orientation;
pub mod scene;

pub use error::{PlatformError, PlatformResult};
pub use geolocation::{GeolocationService, PositionCallback, PositionErrorCallback};
pub use mock::{MockGeolocation, MockOrientation, MockPrompt, MockScene};
pub use orientation::{EventDisposition, OrientationEvent, OrientationEventKind, OrientationHandler, OrientationService, UserPrompt};
pub use scene::{NodeId, SceneGraph};

/// Handle of a platform subscription, used to cancel it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionHandle(u32);

impl SubscriptionHandle {
    pub(crate) fn new(id: u32) -> Self {
        SubscriptionHandle(id)
    }

    pub fn id(&self) -> u32 {
        self.0
    }
}
