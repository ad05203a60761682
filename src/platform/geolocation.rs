//! Push-based position stream interface

use crate::core::GeoCoordinate;
use crate::platform::{PlatformError, PlatformResult, SubscriptionHandle};
use crate::utils::config::GeolocationOptions;

/// Invoked for every position fix the platform pushes
pub type PositionCallback = Box<dyn FnMut(GeoCoordinate)>;

/// Invoked when the platform reports a watch error
pub type PositionErrorCallback = Box<dyn FnMut(PlatformError)>;

/// Platform geolocation service
pub trait GeolocationService {
    /// Whether the platform has a geolocation capability at all
    fn is_available(&self) -> bool;

    /// Start a continuous watch; fixes arrive until the watch is cleared
    fn watch_position(
        &mut self,
        on_position: PositionCallback,
        on_error: PositionErrorCallback,
        options: &GeolocationOptions,
    ) -> PlatformResult<SubscriptionHandle>;

    /// Cancel a watch started by [`GeolocationService::watch_position`]
    fn clear_watch(&mut self, handle: SubscriptionHandle) -> PlatformResult<()>;
}
