//! Host scene graph interface

use crate::algorithms::ribbon::RibbonMesh;
use crate::core::LocalPoint;
use crate::platform::PlatformResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a scene node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Attribute access on the host scene graph.
///
/// Rotations about Y are in degrees for nodes and in radians for look
/// rigs, matching what hosts usually store.
pub trait SceneGraph {
    /// First node matching a comma-separated selector list
    fn find(&self, selector: &str) -> Option<NodeId>;

    fn position(&self, node: NodeId) -> Option<LocalPoint>;

    fn set_position(&mut self, node: NodeId, position: LocalPoint) -> PlatformResult<()>;

    fn set_mesh(&mut self, node: NodeId, mesh: RibbonMesh) -> PlatformResult<()>;

    fn clear_mesh(&mut self, node: NodeId) -> PlatformResult<()>;

    /// World rotation about Y in degrees
    fn rotation_y(&self, node: NodeId) -> Option<f64>;

    /// Yaw of the node's look-control rig in radians; `None` without a rig
    fn look_yaw(&self, node: NodeId) -> Option<f64>;

    fn set_look_yaw(&mut self, node: NodeId, yaw: f64) -> PlatformResult<()>;
}
