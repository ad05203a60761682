//! Couples an `OrientationFusion` to the orientation service and a camera rig

use crate::core::HeadingState;
use crate::platform::{
    EventDisposition, NodeId, OrientationEvent, OrientationEventKind, OrientationService, SceneGraph,
    SubscriptionHandle, UserPrompt,
};
use crate::processing::{FusionState, OrientationFusion};
use crate::utils::config::CompassConfig;
use crate::validation::{Diagnostics, GeoArError};
use std::cell::RefCell;
use std::rc::Rc;

/// Rotates a camera's look rig toward the compass heading
pub struct CompassRotation {
    node: NodeId,
    fusion: Rc<RefCell<OrientationFusion>>,
    calibration_message: String,
    listeners: Vec<SubscriptionHandle>,
    diagnostics: Diagnostics,
}

impl CompassRotation {
    pub fn new(node: NodeId, config: &CompassConfig, diagnostics: Diagnostics) -> Self {
        Self {
            node,
            fusion: Rc::new(RefCell::new(OrientationFusion::new(config))),
            calibration_message: config.calibration_message.clone(),
            listeners: Vec::new(),
            diagnostics,
        }
    }

    pub fn state(&self) -> FusionState {
        self.fusion.borrow().state()
    }

    pub fn heading(&self) -> Option<HeadingState> {
        self.fusion.borrow().heading()
    }

    pub fn source(&self) -> Option<OrientationEventKind> {
        self.fusion.borrow().source()
    }

    /// Select a source and register the reading and calibration listeners.
    ///
    /// A node without look controls or a platform without a usable source
    /// leaves the compass disabled; returns whether it is active.
    pub fn start(
        &mut self,
        service: &mut dyn OrientationService,
        scene: &dyn SceneGraph,
        prompt: Rc<dyn UserPrompt>,
    ) -> bool {
        if scene.look_yaw(self.node).is_none() {
            self.fusion.borrow_mut().disable();
            self.diagnostics
                .report(GeoArError::unavailable(format!("look controls on node {}", self.node)));
            return false;
        }

        let default_class = service.default_orientation();
        let started = self.fusion.borrow_mut().start(default_class, |kind| service.supports(kind));
        let kind = match started {
            Ok(kind) => kind,
            Err(e) => {
                self.diagnostics.report(e);
                return false;
            }
        };

        let fusion = Rc::downgrade(&self.fusion);
        let reading_diagnostics = self.diagnostics.clone();
        let on_reading = Box::new(move |event: &OrientationEvent| {
            if let (Some(fusion), OrientationEvent::Reading { sample, screen, timestamp_ms }) = (fusion.upgrade(), event) {
                let result = fusion.borrow_mut().handle_sample(sample, *screen, *timestamp_ms);
                reading_diagnostics.check(result);
            }
            EventDisposition::Continue
        });

        match service.add_listener(kind, on_reading) {
            Ok(handle) => self.listeners.push(handle),
            Err(e) => {
                self.fusion.borrow_mut().disable();
                self.diagnostics.report(e.into());
                return false;
            }
        }
        self.fusion.borrow_mut().on_subscribed();

        let owner = Rc::downgrade(&self.fusion);
        let message = self.calibration_message.clone();
        let calibration_diagnostics = self.diagnostics.clone();
        let on_calibration = Box::new(move |_: &OrientationEvent| {
            if owner.strong_count() == 0 {
                return EventDisposition::Continue;
            }
            prompt.alert(&message);
            calibration_diagnostics.report(GeoArError::CalibrationRequested);
            EventDisposition::PreventDefault
        });

        // Calibration prompts are optional; readings still flow without them
        match service.add_listener(OrientationEventKind::CompassCalibration, on_calibration) {
            Ok(handle) => self.listeners.push(handle),
            Err(e) => {
                self.diagnostics.report(e.into());
            }
        }

        true
    }

    /// Apply the latest heading to the camera rig if the rate limit allows.
    ///
    /// Returns the yaw written, in radians.
    pub fn tick(&mut self, now_ms: u64, scene: &mut dyn SceneGraph) -> Option<f64> {
        let rotation_y = scene.rotation_y(self.node)?;
        let rig_yaw = scene.look_yaw(self.node)?;
        let yaw = self.fusion.borrow_mut().tick(now_ms, rotation_y, rig_yaw)?;

        match scene.set_look_yaw(self.node, yaw) {
            Ok(()) => Some(yaw),
            Err(e) => {
                self.diagnostics.report(e.into());
                None
            }
        }
    }

    /// Remove every listener registered by `start`
    pub fn teardown(&mut self, service: &mut dyn OrientationService) {
        for handle in self.listeners.drain(..) {
            if let Err(e) = service.remove_listener(handle) {
                self.diagnostics.report(e.into());
            }
        }
        self.fusion.borrow_mut().disable();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{OrientationClass, OrientationSample, ScreenOrientation};
    use crate::platform::{MockOrientation, MockPrompt, MockScene};
    use approx::assert_abs_diff_eq;

    struct Rig {
        compass: CompassRotation,
        service: MockOrientation,
        scene: MockScene,
        prompt: Rc<MockPrompt>,
        diagnostics: Diagnostics,
    }

    fn rig(class: OrientationClass, with_look_controls: bool) -> Rig {
        let mut scene = MockScene::new();
        let camera = scene.add_node(&["a-camera"]);
        if with_look_controls {
            scene.attach_look_rig(camera, 0.0);
        }
        let diagnostics = Diagnostics::new();
        Rig {
            compass: CompassRotation::new(camera, &CompassConfig::default(), diagnostics.clone()),
            service: MockOrientation::new(class),
            scene,
            prompt: Rc::new(MockPrompt::new()),
            diagnostics,
        }
    }

    fn start(rig: &mut Rig) -> bool {
        let prompt: Rc<dyn UserPrompt> = rig.prompt.clone();
        rig.compass.start(&mut rig.service, &rig.scene, prompt)
    }

    #[test]
    fn test_readings_drive_rig_yaw() {
        let mut rig = rig(OrientationClass::Portrait, true);
        assert!(start(&mut rig));
        assert_eq!(rig.compass.state(), FusionState::Active);
        assert_eq!(rig.compass.source(), Some(OrientationEventKind::Absolute));

        rig.service
            .emit_reading(OrientationEventKind::Absolute, OrientationSample::compass(90.0, 10.0), None, 0);
        assert_eq!(rig.compass.heading().unwrap().heading, 90.0);

        let yaw = rig.compass.tick(1_000, &mut rig.scene).unwrap();
        assert_abs_diff_eq!(yaw.to_degrees(), 270.0, epsilon = 1e-9);
        assert_eq!(rig.scene.look_yaw(rig.compass.node), Some(yaw));

        // Rate limited
        assert_eq!(rig.compass.tick(1_050, &mut rig.scene), None);
    }

    #[test]
    fn test_yaw_compensates_entity_and_rig_rotation() {
        let mut rig = rig(OrientationClass::Portrait, true);
        let camera = rig.compass.node;
        rig.scene.set_rotation_y(camera, 40.0);
        rig.scene.attach_look_rig(camera, 10f64.to_radians());
        assert!(start(&mut rig));

        rig.service
            .emit_reading(OrientationEventKind::Absolute, OrientationSample::compass(90.0, 10.0), None, 0);

        // (360 - 90) - (40 - 10)
        let yaw = rig.compass.tick(1_000, &mut rig.scene).unwrap();
        assert_abs_diff_eq!(yaw.to_degrees(), 240.0, epsilon = 1e-9);
        assert_eq!(rig.scene.look_yaw(camera), Some(yaw));
    }

    #[test]
    fn test_landscape_device_adjustment() {
        let mut rig = rig(OrientationClass::Landscape, true);
        start(&mut rig);

        rig.service.emit_reading(
            OrientationEventKind::Absolute,
            OrientationSample::compass(100.0, 10.0),
            Some(ScreenOrientation::LandscapePrimary),
            0,
        );
        assert_abs_diff_eq!(rig.compass.heading().unwrap().heading, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_dropped_readings_keep_heading() {
        let mut rig = rig(OrientationClass::Portrait, true);
        start(&mut rig);

        rig.service
            .emit_reading(OrientationEventKind::Absolute, OrientationSample::compass(45.0, 5.0), None, 0);
        rig.service
            .emit_reading(OrientationEventKind::Absolute, OrientationSample::compass(200.0, 80.0), None, 10);
        rig.service
            .emit_reading(OrientationEventKind::Absolute, OrientationSample::default(), None, 20);

        assert_eq!(rig.compass.heading().unwrap().heading, 45.0);
        assert_eq!(rig.diagnostics.count_of("LowConfidenceSample"), 1);
        assert_eq!(rig.diagnostics.count_of("MalformedSample"), 1);
    }

    #[test]
    fn test_calibration_prompts_user() {
        let mut rig = rig(OrientationClass::Portrait, true);
        start(&mut rig);

        let dispositions = rig.service.emit_calibration();
        assert_eq!(dispositions, vec![EventDisposition::PreventDefault]);
        assert_eq!(rig.prompt.messages(), vec![CompassConfig::default().calibration_message]);
        assert_eq!(rig.diagnostics.count_of("CalibrationRequested"), 1);
    }

    #[test]
    fn test_missing_look_controls_disables() {
        let mut rig = rig(OrientationClass::Portrait, false);
        assert!(!start(&mut rig));
        assert_eq!(rig.compass.state(), FusionState::Disabled);
        assert_eq!(rig.service.listener_count(OrientationEventKind::Absolute), 0);
        assert_eq!(rig.diagnostics.count_of("CapabilityUnavailable"), 1);
    }

    #[test]
    fn test_no_orientation_sensor_disables() {
        let mut rig = rig(OrientationClass::Portrait, true);
        rig.service = MockOrientation::with_support(OrientationClass::Portrait, &[]);

        assert!(!start(&mut rig));
        assert_eq!(rig.compass.state(), FusionState::Disabled);
        assert_eq!(rig.compass.tick(5_000, &mut rig.scene), None);
    }

    #[test]
    fn test_teardown_removes_listeners() {
        let mut rig = rig(OrientationClass::Portrait, true);
        start(&mut rig);
        assert_eq!(rig.service.listener_count(OrientationEventKind::Absolute), 1);
        assert_eq!(rig.service.listener_count(OrientationEventKind::CompassCalibration), 1);

        rig.compass.teardown(&mut rig.service);
        assert_eq!(rig.service.listener_count(OrientationEventKind::Absolute), 0);
        assert_eq!(rig.service.listener_count(OrientationEventKind::CompassCalibration), 0);
        assert!(rig.service.emit_calibration().is_empty());
    }
}
