//! Compass heading fusion and rate-limited yaw application
//!
//! Orientation samples arrive either as Euler triads or as a heading the
//! platform already fused from its magnetometer. Both are reduced to one
//! heading, corrected for the current screen rotation, and stored eagerly.
//! The host loop calls [`OrientationFusion::tick`] to turn the latest
//! heading into a look-rig yaw at a bounded rate.

use crate::algorithms::compass::{self, compass_heading, screen_adjustment, yaw_offset};
use crate::core::{HeadingState, OrientationClass, OrientationSample, ScreenOrientation, MAX_COMPASS_ACCURACY_DEG};
use crate::platform::OrientationEventKind;
use crate::utils::config::{CompassConfig, OrientationEventSource};
use crate::validation::{GeoArError, GeoArResult};
use serde::Serialize;

/// Lifecycle of the fusion state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FusionState {
    Uninitialized,
    /// A source was selected; waiting for the subscription to succeed
    AwaitingCapability,
    Active,
    /// No usable source; every operation is a no-op
    Disabled,
}

/// Heading fusion for one camera rig
#[derive(Debug, Clone)]
pub struct OrientationFusion {
    fix_time_ms: u64,
    requested_source: OrientationEventSource,
    state: FusionState,
    source: Option<OrientationEventKind>,
    default_class: OrientationClass,
    heading: Option<HeadingState>,
    last_applied_ms: u64,
}

impl OrientationFusion {
    pub fn new(config: &CompassConfig) -> Self {
        Self {
            fix_time_ms: config.fix_time_ms,
            requested_source: config.orientation_event,
            state: FusionState::Uninitialized,
            source: None,
            default_class: OrientationClass::Portrait,
            heading: None,
            last_applied_ms: 0,
        }
    }

    pub fn state(&self) -> FusionState {
        self.state
    }

    /// Event stream selected at start
    pub fn source(&self) -> Option<OrientationEventKind> {
        self.source
    }

    pub fn default_class(&self) -> OrientationClass {
        self.default_class
    }

    pub fn heading(&self) -> Option<HeadingState> {
        self.heading
    }

    /// Probe for an orientation source and leave `Uninitialized`.
    ///
    /// `auto` prefers the absolute stream and falls back to the relative
    /// one. An explicit source must be supported as-is. Without a source
    /// the fusion becomes `Disabled`.
    pub fn start<F>(&mut self, default_class: OrientationClass, supports: F) -> GeoArResult<OrientationEventKind>
    where
        F: Fn(OrientationEventKind) -> bool,
    {
        if self.state != FusionState::Uninitialized {
            return Err(GeoArError::invalid(format!("orientation fusion already started ({:?})", self.state)));
        }

        let candidates: &[OrientationEventKind] = match self.requested_source {
            OrientationEventSource::Auto => &[OrientationEventKind::Absolute, OrientationEventKind::Relative],
            OrientationEventSource::Absolute => &[OrientationEventKind::Absolute],
            OrientationEventSource::Relative => &[OrientationEventKind::Relative],
        };

        self.default_class = default_class;

        match candidates.iter().copied().find(|kind| supports(*kind)) {
            Some(kind) => {
                tracing::info!(source = kind.event_name(), ?default_class, "orientation source selected");
                self.source = Some(kind);
                self.state = FusionState::AwaitingCapability;
                Ok(kind)
            }
            None => {
                self.state = FusionState::Disabled;
                Err(GeoArError::unavailable("compass"))
            }
        }
    }

    /// The platform accepted the subscription
    pub fn on_subscribed(&mut self) {
        if self.state == FusionState::AwaitingCapability {
            self.state = FusionState::Active;
        }
    }

    /// Stop using the fusion for the rest of the session
    pub fn disable(&mut self) {
        if self.state != FusionState::Disabled {
            tracing::info!("orientation fusion disabled");
        }
        self.state = FusionState::Disabled;
    }

    /// Fold one sample into the heading state.
    ///
    /// Returns the stored heading. Dropped samples leave the previous
    /// heading in place.
    pub fn handle_sample(
        &mut self,
        sample: &OrientationSample,
        screen: Option<ScreenOrientation>,
        timestamp_ms: u64,
    ) -> GeoArResult<f64> {
        if self.state != FusionState::Active {
            return Err(GeoArError::unavailable("compass"));
        }

        let raw = raw_heading(sample)?;
        let heading = compass::normalize_degrees(raw + screen_adjustment(self.default_class, screen));

        tracing::debug!(raw, heading, ?screen, "heading updated");
        self.heading = Some(HeadingState {
            heading,
            last_update_ms: timestamp_ms,
        });
        Ok(heading)
    }

    /// Rig yaw in radians to apply now, or `None` while rate limited or
    /// before the first heading.
    ///
    /// `entity_rotation_y` is the camera's world rotation in degrees and
    /// `rig_yaw` the look rig's current yaw in radians.
    pub fn tick(&mut self, now_ms: u64, entity_rotation_y: f64, rig_yaw: f64) -> Option<f64> {
        if self.state == FusionState::Disabled {
            return None;
        }
        let heading = self.heading?;
        if self.last_applied_ms.saturating_add(self.fix_time_ms) > now_ms {
            return None;
        }

        self.last_applied_ms = now_ms;
        let offset = yaw_offset(heading.heading, entity_rotation_y, rig_yaw.to_degrees());
        Some(offset.to_radians())
    }
}

/// Heading in degrees before screen correction
fn raw_heading(sample: &OrientationSample) -> GeoArResult<f64> {
    if let Some(heading) = sample.compass_heading {
        let accuracy = sample.compass_accuracy.unwrap_or(f64::INFINITY);
        if !(accuracy < MAX_COMPASS_ACCURACY_DEG) {
            tracing::warn!(accuracy, "dropping low accuracy compass reading");
            return Err(GeoArError::LowConfidenceSample {
                reason: "compass accuracy".to_string(),
                value: accuracy,
                threshold: MAX_COMPASS_ACCURACY_DEG,
            });
        }
        if !heading.is_finite() {
            tracing::warn!(heading, "dropping non-finite compass heading");
            return Err(GeoArError::MalformedSample {
                reason: format!("compass heading {}", heading),
            });
        }
        return Ok(heading);
    }

    let alpha = match sample.alpha {
        Some(alpha) => alpha,
        None => {
            tracing::warn!("dropping orientation sample without alpha");
            return Err(GeoArError::MalformedSample {
                reason: "neither compass heading nor alpha present".to_string(),
            });
        }
    };

    if sample.absolute == Some(false) {
        tracing::warn!("dropping orientation sample in a relative frame");
        return Err(GeoArError::LowConfidenceSample {
            reason: "orientation frame is not absolute".to_string(),
            value: 0.0,
            threshold: 1.0,
        });
    }

    compass_heading(alpha, sample.beta, sample.gamma).ok_or_else(|| {
        tracing::warn!(alpha, beta = sample.beta, gamma = sample.gamma, "dropping sample with no horizontal heading");
        GeoArError::MalformedSample {
            reason: format!("no horizontal heading for alpha={} beta={} gamma={}", alpha, sample.beta, sample.gamma),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::sync::{Arc, Mutex};

    fn active(config: &CompassConfig, class: OrientationClass) -> OrientationFusion {
        let mut fusion = OrientationFusion::new(config);
        fusion.start(class, |_| true).unwrap();
        fusion.on_subscribed();
        fusion
    }

    #[test]
    fn test_auto_prefers_absolute_source() {
        let mut fusion = OrientationFusion::new(&CompassConfig::default());
        assert_eq!(fusion.state(), FusionState::Uninitialized);

        let kind = fusion.start(OrientationClass::Portrait, |_| true).unwrap();
        assert_eq!(kind, OrientationEventKind::Absolute);
        assert_eq!(fusion.state(), FusionState::AwaitingCapability);

        fusion.on_subscribed();
        assert_eq!(fusion.state(), FusionState::Active);
    }

    #[test]
    fn test_auto_falls_back_to_relative() {
        let mut fusion = OrientationFusion::new(&CompassConfig::default());
        let kind = fusion
            .start(OrientationClass::Portrait, |k| k == OrientationEventKind::Relative)
            .unwrap();
        assert_eq!(kind, OrientationEventKind::Relative);
    }

    #[test]
    fn test_no_source_disables() {
        let mut fusion = OrientationFusion::new(&CompassConfig::default());
        let err = fusion.start(OrientationClass::Portrait, |_| false).unwrap_err();

        assert!(matches!(err, GeoArError::CapabilityUnavailable { .. }));
        assert_eq!(fusion.state(), FusionState::Disabled);
        assert!(fusion.handle_sample(&OrientationSample::compass(10.0, 5.0), None, 0).is_err());
        assert_eq!(fusion.tick(1_000, 0.0, 0.0), None);
    }

    #[test]
    fn test_explicit_source_must_be_supported() {
        let config = CompassConfig {
            orientation_event: OrientationEventSource::Absolute,
            ..Default::default()
        };
        let mut fusion = OrientationFusion::new(&config);
        assert!(fusion
            .start(OrientationClass::Portrait, |k| k == OrientationEventKind::Relative)
            .is_err());
        assert_eq!(fusion.state(), FusionState::Disabled);
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let mut fusion = active(&CompassConfig::default(), OrientationClass::Portrait);
        assert!(matches!(
            fusion.start(OrientationClass::Portrait, |_| true),
            Err(GeoArError::InvalidInput { .. })
        ));
        assert_eq!(fusion.state(), FusionState::Active);
    }

    #[test]
    fn test_fused_compass_accuracy_gate() {
        let mut fusion = active(&CompassConfig::default(), OrientationClass::Portrait);

        assert_eq!(fusion.handle_sample(&OrientationSample::compass(120.0, 10.0), None, 5).unwrap(), 120.0);

        let dropped = fusion.handle_sample(&OrientationSample::compass(200.0, 50.0), None, 10);
        assert!(matches!(dropped, Err(GeoArError::LowConfidenceSample { .. })));
        assert_eq!(
            fusion.heading(),
            Some(HeadingState {
                heading: 120.0,
                last_update_ms: 5
            })
        );

        assert_eq!(fusion.handle_sample(&OrientationSample::compass(200.0, 49.9), None, 15).unwrap(), 200.0);
    }

    #[test]
    fn test_fused_heading_takes_precedence() {
        let mut fusion = active(&CompassConfig::default(), OrientationClass::Portrait);
        let mut sample = OrientationSample::euler(30.0, 90.0, 0.0);
        sample.compass_heading = Some(45.0);
        sample.compass_accuracy = Some(5.0);

        assert_eq!(fusion.handle_sample(&sample, None, 0).unwrap(), 45.0);
    }

    #[test]
    fn test_euler_sample_with_screen_adjustment() {
        let mut fusion = active(&CompassConfig::default(), OrientationClass::Portrait);

        let sample = OrientationSample::euler(0.0, 90.0, 0.0);
        let heading = fusion
            .handle_sample(&sample, Some(ScreenOrientation::LandscapePrimary), 0)
            .unwrap();
        assert_abs_diff_eq!(heading, 270.0, epsilon = 1e-9);

        let heading = fusion
            .handle_sample(&sample, Some(ScreenOrientation::PortraitPrimary), 1)
            .unwrap();
        assert_abs_diff_eq!(heading, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_relative_frame_is_dropped() {
        let mut fusion = active(&CompassConfig::default(), OrientationClass::Portrait);
        let sample = OrientationSample::euler(10.0, 90.0, 0.0).with_absolute(false);
        assert!(matches!(
            fusion.handle_sample(&sample, None, 0),
            Err(GeoArError::LowConfidenceSample { .. })
        ));
        assert!(fusion.heading().is_none());

        let sample = OrientationSample::euler(10.0, 90.0, 0.0).with_absolute(true);
        assert!(fusion.handle_sample(&sample, None, 0).is_ok());
    }

    #[test]
    fn test_malformed_samples() {
        let mut fusion = active(&CompassConfig::default(), OrientationClass::Portrait);

        let empty = OrientationSample::default();
        assert!(matches!(
            fusion.handle_sample(&empty, None, 0),
            Err(GeoArError::MalformedSample { .. })
        ));

        let flat = OrientationSample::euler(10.0, 0.0, 0.0);
        assert!(matches!(
            fusion.handle_sample(&flat, None, 0),
            Err(GeoArError::MalformedSample { .. })
        ));
        assert!(fusion.heading().is_none());
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_malformed_samples_log_warnings() {
        let mut fusion = active(&CompassConfig::default(), OrientationClass::Portrait);
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let _ = fusion.handle_sample(&OrientationSample::default(), None, 0);
            let _ = fusion.handle_sample(&OrientationSample::euler(10.0, 0.0, 0.0), None, 0);
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"));
        assert!(output.contains("dropping orientation sample without alpha"));
        assert!(output.contains("dropping sample with no horizontal heading"));
    }

    #[test]
    fn test_tick_rate_limit() {
        let mut fusion = active(&CompassConfig::default(), OrientationClass::Portrait);

        // Nothing to apply before the first heading
        assert_eq!(fusion.tick(500, 0.0, 0.0), None);

        fusion.handle_sample(&OrientationSample::compass(90.0, 5.0), None, 500).unwrap();

        // First application waits a full interval from time zero
        assert_eq!(fusion.tick(50, 0.0, 0.0), None);

        let yaw = fusion.tick(500, 0.0, 0.0).unwrap();
        assert_abs_diff_eq!(yaw.to_degrees(), 270.0, epsilon = 1e-9);

        assert_eq!(fusion.tick(599, 0.0, 0.0), None);
        assert!(fusion.tick(600, 0.0, 0.0).is_some());
    }

    #[test]
    fn test_tick_keeps_manual_look() {
        let mut fusion = active(&CompassConfig::default(), OrientationClass::Portrait);
        fusion.handle_sample(&OrientationSample::compass(90.0, 5.0), None, 0).unwrap();

        // Entity is 30 degrees ahead of the rig from drag input
        let rig_yaw = 10.0f64.to_radians();
        let yaw = fusion.tick(1_000, 40.0, rig_yaw).unwrap();
        assert_abs_diff_eq!(yaw.to_degrees(), 240.0, epsilon = 1e-9);
    }
}
