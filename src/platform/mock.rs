//! In-memory platform services for testing and the demo binary

use crate::algorithms::ribbon::RibbonMesh;
use crate::core::{GeoCoordinate, LocalPoint, OrientationClass, OrientationSample, ScreenOrientation};
use crate::platform::geolocation::{GeolocationService, PositionCallback, PositionErrorCallback};
use crate::platform::orientation::{
    EventDisposition, OrientationEvent, OrientationEventKind, OrientationHandler, OrientationService, UserPrompt,
};
use crate::platform::scene::{NodeId, SceneGraph};
use crate::platform::{PlatformError, PlatformResult, SubscriptionHandle};
use crate::utils::config::GeolocationOptions;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};

struct Watch {
    on_position: PositionCallback,
    on_error: PositionErrorCallback,
}

/// Mock position stream; the test pushes fixes by hand
pub struct MockGeolocation {
    available: bool,
    permission_denied: bool,
    watches: BTreeMap<SubscriptionHandle, Watch>,
    next_id: u32,
    last_options: Option<GeolocationOptions>,
}

impl MockGeolocation {
    pub fn new() -> Self {
        Self {
            available: true,
            permission_denied: false,
            watches: BTreeMap::new(),
            next_id: 1,
            last_options: None,
        }
    }

    /// A platform without geolocation
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Make subsequent watch requests fail with a permission error
    pub fn deny_permission(&mut self) {
        self.permission_denied = true;
    }

    /// Deliver a fix to every active watch; returns how many received it
    pub fn push_position(&mut self, coordinate: GeoCoordinate) -> usize {
        for watch in self.watches.values_mut() {
            (watch.on_position)(coordinate);
        }
        self.watches.len()
    }

    /// Deliver an error to every active watch
    pub fn push_error(&mut self, error: PlatformError) -> usize {
        for watch in self.watches.values_mut() {
            (watch.on_error)(error.clone());
        }
        self.watches.len()
    }

    pub fn active_watches(&self) -> usize {
        self.watches.len()
    }

    /// Options passed with the most recent watch request
    pub fn last_options(&self) -> Option<&GeolocationOptions> {
        self.last_options.as_ref()
    }
}

impl Default for MockGeolocation {
    fn default() -> Self {
        Self::new()
    }
}

impl GeolocationService for MockGeolocation {
    fn is_available(&self) -> bool {
        self.available
    }

    fn watch_position(
        &mut self,
        on_position: PositionCallback,
        on_error: PositionErrorCallback,
        options: &GeolocationOptions,
    ) -> PlatformResult<SubscriptionHandle> {
        if !self.available {
            return Err(PlatformError::Unsupported {
                service: "geolocation".to_string(),
            });
        }
        if self.permission_denied {
            return Err(PlatformError::PermissionDenied {
                service: "geolocation".to_string(),
            });
        }

        let handle = SubscriptionHandle::new(self.next_id);
        self.next_id += 1;
        self.last_options = Some(options.clone());
        self.watches.insert(handle, Watch { on_position, on_error });
        Ok(handle)
    }

    fn clear_watch(&mut self, handle: SubscriptionHandle) -> PlatformResult<()> {
        self.watches
            .remove(&handle)
            .map(|_| ())
            .ok_or(PlatformError::UnknownHandle { handle: handle.id() })
    }
}

/// Mock orientation event source
pub struct MockOrientation {
    supported: HashSet<OrientationEventKind>,
    default_class: OrientationClass,
    listeners: BTreeMap<SubscriptionHandle, (OrientationEventKind, OrientationHandler)>,
    next_id: u32,
}

impl MockOrientation {
    /// A device supporting both orientation streams
    pub fn new(default_class: OrientationClass) -> Self {
        Self::with_support(
            default_class,
            &[OrientationEventKind::Absolute, OrientationEventKind::Relative],
        )
    }

    pub fn with_support(default_class: OrientationClass, kinds: &[OrientationEventKind]) -> Self {
        Self {
            supported: kinds.iter().copied().collect(),
            default_class,
            listeners: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Dispatch an event to every listener of `kind`
    pub fn emit(&mut self, kind: OrientationEventKind, event: &OrientationEvent) -> Vec<EventDisposition> {
        self.listeners
            .values_mut()
            .filter(|(k, _)| *k == kind)
            .map(|(_, handler)| handler(event))
            .collect()
    }

    pub fn emit_reading(
        &mut self,
        kind: OrientationEventKind,
        sample: OrientationSample,
        screen: Option<ScreenOrientation>,
        timestamp_ms: u64,
    ) -> Vec<EventDisposition> {
        self.emit(
            kind,
            &OrientationEvent::Reading {
                sample,
                screen,
                timestamp_ms,
            },
        )
    }

    pub fn emit_calibration(&mut self) -> Vec<EventDisposition> {
        self.emit(OrientationEventKind::CompassCalibration, &OrientationEvent::CalibrationNeeded)
    }

    pub fn listener_count(&self, kind: OrientationEventKind) -> usize {
        self.listeners.values().filter(|(k, _)| *k == kind).count()
    }
}

impl OrientationService for MockOrientation {
    fn supports(&self, kind: OrientationEventKind) -> bool {
        kind == OrientationEventKind::CompassCalibration || self.supported.contains(&kind)
    }

    fn default_orientation(&self) -> OrientationClass {
        self.default_class
    }

    fn add_listener(&mut self, kind: OrientationEventKind, handler: OrientationHandler) -> PlatformResult<SubscriptionHandle> {
        if !self.supports(kind) {
            return Err(PlatformError::Unsupported {
                service: kind.event_name().to_string(),
            });
        }
        let handle = SubscriptionHandle::new(self.next_id);
        self.next_id += 1;
        self.listeners.insert(handle, (kind, handler));
        Ok(handle)
    }

    fn remove_listener(&mut self, handle: SubscriptionHandle) -> PlatformResult<()> {
        self.listeners
            .remove(&handle)
            .map(|_| ())
            .ok_or(PlatformError::UnknownHandle { handle: handle.id() })
    }
}

/// Records every prompt shown to the user
#[derive(Debug, Default)]
pub struct MockPrompt {
    messages: RefCell<Vec<String>>,
}

impl MockPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }
}

impl UserPrompt for MockPrompt {
    fn alert(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}

#[derive(Debug)]
struct MockNode {
    selectors: Vec<String>,
    position: LocalPoint,
    position_writes: u32,
    rotation_y: f64,
    look_yaw: Option<f64>,
    mesh: Option<RibbonMesh>,
    mesh_installs: u32,
}

/// Flat scene graph with selector lookup by exact tag or attribute text
#[derive(Debug, Default)]
pub struct MockScene {
    nodes: Vec<MockNode>,
}

impl MockScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node matched by any of `selectors` (e.g. `"a-camera"`, `"[camera]"`)
    pub fn add_node(&mut self, selectors: &[&str]) -> NodeId {
        self.nodes.push(MockNode {
            selectors: selectors.iter().map(|s| s.to_string()).collect(),
            position: LocalPoint::default(),
            position_writes: 0,
            rotation_y: 0.0,
            look_yaw: None,
            mesh: None,
            mesh_installs: 0,
        });
        NodeId(self.nodes.len() as u32 - 1)
    }

    /// Give a node a look-control rig with the given yaw (radians)
    pub fn attach_look_rig(&mut self, node: NodeId, yaw: f64) {
        if let Some(n) = self.node_mut(node) {
            n.look_yaw = Some(yaw);
        }
    }

    /// Set a node's world rotation about Y (degrees)
    pub fn set_rotation_y(&mut self, node: NodeId, degrees: f64) {
        if let Some(n) = self.node_mut(node) {
            n.rotation_y = degrees;
        }
    }

    pub fn mesh(&self, node: NodeId) -> Option<&RibbonMesh> {
        self.node(node).and_then(|n| n.mesh.as_ref())
    }

    pub fn mesh_installs(&self, node: NodeId) -> u32 {
        self.node(node).map_or(0, |n| n.mesh_installs)
    }

    pub fn position_writes(&self, node: NodeId) -> u32 {
        self.node(node).map_or(0, |n| n.position_writes)
    }

    fn node(&self, node: NodeId) -> Option<&MockNode> {
        self.nodes.get(node.0 as usize)
    }

    fn node_mut(&mut self, node: NodeId) -> Option<&mut MockNode> {
        self.nodes.get_mut(node.0 as usize)
    }

    fn node_or_err(&mut self, node: NodeId) -> PlatformResult<&mut MockNode> {
        self.nodes
            .get_mut(node.0 as usize)
            .ok_or(PlatformError::UnknownNode { node: node.0 })
    }
}

impl SceneGraph for MockScene {
    fn find(&self, selector: &str) -> Option<NodeId> {
        let wanted: Vec<&str> = selector.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
        self.nodes
            .iter()
            .position(|n| n.selectors.iter().any(|s| wanted.contains(&s.as_str())))
            .map(|i| NodeId(i as u32))
    }

    fn position(&self, node: NodeId) -> Option<LocalPoint> {
        self.node(node).map(|n| n.position)
    }

    fn set_position(&mut self, node: NodeId, position: LocalPoint) -> PlatformResult<()> {
        let n = self.node_or_err(node)?;
        n.position = position;
        n.position_writes += 1;
        Ok(())
    }

    fn set_mesh(&mut self, node: NodeId, mesh: RibbonMesh) -> PlatformResult<()> {
        let n = self.node_or_err(node)?;
        n.mesh = Some(mesh);
        n.mesh_installs += 1;
        Ok(())
    }

    fn clear_mesh(&mut self, node: NodeId) -> PlatformResult<()> {
        self.node_or_err(node)?.mesh = None;
        Ok(())
    }

    fn rotation_y(&self, node: NodeId) -> Option<f64> {
        self.node(node).map(|n| n.rotation_y)
    }

    fn look_yaw(&self, node: NodeId) -> Option<f64> {
        self.node(node).and_then(|n| n.look_yaw)
    }

    fn set_look_yaw(&mut self, node: NodeId, yaw: f64) -> PlatformResult<()> {
        let n = self.node_or_err(node)?;
        match n.look_yaw {
            Some(_) => {
                n.look_yaw = Some(yaw);
                Ok(())
            }
            None => Err(PlatformError::Unsupported {
                service: format!("look controls on node {}", node),
            }),
        }
    }
}
