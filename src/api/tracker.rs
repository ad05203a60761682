//! Binds a geolocation watch to a scene node through a `GeodeticAnchor`

use crate::core::{GeoCoordinate, LocalPoint};
use crate::platform::{GeolocationService, NodeId, PlatformError, SceneGraph, SubscriptionHandle};
use crate::processing::GeodeticAnchor;
use crate::utils::config::{GeolocationOptions, SessionConfig};
use crate::validation::{Diagnostics, GeoArError};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// Anchor shared between a tracker, its watch callbacks and readers
pub type SharedAnchor = Rc<RefCell<GeodeticAnchor>>;

/// Lookup from scene nodes to the anchors tracking them.
///
/// Entries are weak; an anchor disappears from the registry when its
/// tracker is dropped.
#[derive(Debug, Default)]
pub struct AnchorRegistry {
    anchors: HashMap<NodeId, Weak<RefCell<GeodeticAnchor>>>,
}

impl AnchorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `anchor` to `node`, dropping entries whose trackers are gone
    pub fn register(&mut self, node: NodeId, anchor: &SharedAnchor) {
        self.anchors.retain(|_, weak| weak.strong_count() > 0);
        self.anchors.insert(node, Rc::downgrade(anchor));
    }

    /// Anchor attached to `node`, if its tracker is still alive
    pub fn get(&self, node: NodeId) -> Option<SharedAnchor> {
        self.anchors.get(&node).and_then(Weak::upgrade)
    }

    /// Number of live anchors
    pub fn len(&self) -> usize {
        self.anchors.values().filter(|w| w.strong_count() > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Watches the platform position stream for one scene node
pub struct AnchorTracker {
    node: NodeId,
    anchor: SharedAnchor,
    options: GeolocationOptions,
    watch: Option<SubscriptionHandle>,
    last_written: Option<LocalPoint>,
    diagnostics: Diagnostics,
}

impl AnchorTracker {
    pub fn new(node: NodeId, config: &SessionConfig, diagnostics: Diagnostics) -> Self {
        Self {
            node,
            anchor: Rc::new(RefCell::new(GeodeticAnchor::new(&config.anchor))),
            options: config.geolocation.clone(),
            watch: None,
            last_written: None,
            diagnostics,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn anchor(&self) -> &SharedAnchor {
        &self.anchor
    }

    pub fn is_watching(&self) -> bool {
        self.watch.is_some()
    }

    /// Make this tracker's anchor discoverable through its node
    pub fn register(&self, registry: &mut AnchorRegistry) {
        registry.register(self.node, &self.anchor);
    }

    /// Subscribe to the position stream.
    ///
    /// Failures are reported to the diagnostics channel and leave the
    /// tracker inert; returns whether a watch is active.
    pub fn start(&mut self, geolocation: &mut dyn GeolocationService) -> bool {
        if self.watch.is_some() {
            return true;
        }

        if !geolocation.is_available() {
            self.diagnostics.report(GeoArError::unavailable("geolocation"));
            return false;
        }

        let anchor = Rc::downgrade(&self.anchor);
        let sample_diagnostics = self.diagnostics.clone();
        let on_position = Box::new(move |coordinate: GeoCoordinate| {
            if let Some(anchor) = anchor.upgrade() {
                let result = anchor.borrow_mut().ingest_sample(coordinate);
                sample_diagnostics.check(result);
            }
        });

        let owner = Rc::downgrade(&self.anchor);
        let error_diagnostics = self.diagnostics.clone();
        let node = self.node;
        let on_error = Box::new(move |error: PlatformError| {
            tracing::debug!(node = %node, code = error.code(), "geolocation watch error");
            if owner.strong_count() > 0 {
                error_diagnostics.report(GeoArError::Platform(error));
            }
        });

        match geolocation.watch_position(on_position, on_error, &self.options) {
            Ok(handle) => {
                tracing::info!(node = %self.node, watch = handle.id(), "geolocation watch started");
                self.watch = Some(handle);
                true
            }
            Err(e) => {
                self.diagnostics.report(e.into());
                false
            }
        }
    }

    /// Write the latest local position into the node; returns whether a
    /// write happened
    pub fn update(&mut self, scene: &mut dyn SceneGraph) -> bool {
        let local = match self.anchor.borrow().local_position() {
            Some(local) => local,
            None => return false,
        };
        if self.last_written == Some(local) {
            return false;
        }

        match scene.set_position(self.node, local) {
            Ok(()) => {
                self.last_written = Some(local);
                true
            }
            Err(e) => {
                self.diagnostics.report(e.into());
                false
            }
        }
    }

    /// Cancel the position watch
    pub fn teardown(&mut self, geolocation: &mut dyn GeolocationService) {
        if let Some(handle) = self.watch.take() {
            if let Err(e) = geolocation.clear_watch(handle) {
                self.diagnostics.report(e.into());
            }
            tracing::info!(node = %self.node, "geolocation watch cleared");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{MockGeolocation, MockScene};

    fn setup() -> (AnchorTracker, MockGeolocation, MockScene, Diagnostics) {
        let mut scene = MockScene::new();
        let camera = scene.add_node(&["a-camera"]);
        let diagnostics = Diagnostics::new();
        let tracker = AnchorTracker::new(camera, &SessionConfig::default(), diagnostics.clone());
        (tracker, MockGeolocation::new(), scene, diagnostics)
    }

    #[test]
    fn test_samples_flow_into_scene() {
        let (mut tracker, mut geo, mut scene, _) = setup();
        assert!(tracker.start(&mut geo));
        assert!(geo.last_options().unwrap().enable_high_accuracy);

        // Nothing to write before the zero exists
        assert!(!tracker.update(&mut scene));

        geo.push_position(GeoCoordinate::new(21.046306, 105.7937535).with_accuracy(5.0));
        assert!(tracker.update(&mut scene));
        assert!(tracker.anchor().borrow().is_ready());

        geo.push_position(GeoCoordinate::new(21.046296, 105.7940615).with_accuracy(5.0));
        assert!(tracker.update(&mut scene));
        assert!(scene.position(tracker.node()).unwrap().x > 0.0);

        // Unchanged position is not rewritten
        assert!(!tracker.update(&mut scene));
        assert_eq!(scene.position_writes(tracker.node()), 2);
    }

    #[test]
    fn test_rejected_samples_are_reported() {
        let (mut tracker, mut geo, _, diagnostics) = setup();
        tracker.start(&mut geo);

        geo.push_position(GeoCoordinate::new(21.0, 105.0).with_accuracy(500.0));
        assert!(!tracker.anchor().borrow().is_ready());
        assert_eq!(diagnostics.count_of("LowConfidenceSample"), 1);

        geo.push_error(PlatformError::Timeout { timeout_ms: 27_000 });
        assert_eq!(diagnostics.count_of("Platform"), 1);
    }

    #[test]
    fn test_missing_geolocation_is_reported_once() {
        let (mut tracker, _, _, diagnostics) = setup();
        let mut geo = MockGeolocation::unavailable();

        assert!(!tracker.start(&mut geo));
        assert!(!tracker.is_watching());
        assert_eq!(diagnostics.count_of("CapabilityUnavailable"), 1);
    }

    #[test]
    fn test_teardown_clears_watch() {
        let (mut tracker, mut geo, _, diagnostics) = setup();
        tracker.start(&mut geo);
        assert_eq!(geo.active_watches(), 1);

        tracker.teardown(&mut geo);
        assert_eq!(geo.active_watches(), 0);
        assert!(!tracker.is_watching());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_callbacks_are_inert_after_drop() {
        let (mut tracker, mut geo, _, diagnostics) = setup();
        tracker.start(&mut geo);
        drop(tracker);

        assert_eq!(geo.push_position(GeoCoordinate::new(21.0, 105.0)), 1);
        geo.push_error(PlatformError::Timeout { timeout_ms: 1 });
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_registry_tracks_live_anchors() {
        let (tracker, _, _, _) = setup();
        let mut registry = AnchorRegistry::new();
        tracker.register(&mut registry);

        assert!(registry.get(tracker.node()).is_some());
        assert_eq!(registry.len(), 1);

        let node = tracker.node();
        drop(tracker);
        assert!(registry.get(node).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_prunes_dropped_anchors() {
        let mut scene = MockScene::new();
        let mut registry = AnchorRegistry::new();
        let diagnostics = Diagnostics::new();

        for _ in 0..3 {
            let node = scene.add_node(&["a-camera"]);
            let tracker = AnchorTracker::new(node, &SessionConfig::default(), diagnostics.clone());
            tracker.register(&mut registry);
        }
        let survivor = scene.add_node(&["a-camera"]);
        let tracker = AnchorTracker::new(survivor, &SessionConfig::default(), diagnostics);
        tracker.register(&mut registry);

        assert_eq!(registry.anchors.len(), 1);
        assert!(registry.get(survivor).is_some());
    }
}
