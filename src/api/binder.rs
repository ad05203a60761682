//! Installs the path ribbon once the camera's anchor has a zero point

use crate::algorithms::ribbon::{FaceColoring, MeshMaterial, RibbonMesh, RibbonMesher};
use crate::api::readiness::{PollOutcome, PollStatus, ReadinessPoll, RetryPolicy};
use crate::api::tracker::{AnchorRegistry, SharedAnchor};
use crate::core::GeoCoordinate;
use crate::platform::{NodeId, SceneGraph};
use crate::processing::GeodeticAnchor;
use crate::utils::config::PathConfig;
use crate::validation::{Diagnostics, GeoArError, GeoArResult};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Where a binder is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinderStatus {
    /// Polling for the camera anchor
    Waiting,
    /// Anchor found; the mesh follows the path
    Bound,
    /// Gave up waiting for the anchor
    Exhausted,
    Cancelled,
}

impl From<&PathConfig> for RibbonMesher {
    fn from(config: &PathConfig) -> Self {
        let coloring = if config.debug_colors {
            FaceColoring::RandomDebug
        } else {
            FaceColoring::Uniform(config.color)
        };
        RibbonMesher::new()
            .with_half_width(config.half_width)
            .with_samples_per_point(config.samples_per_point)
            .with_coloring(coloring)
            .with_material(MeshMaterial::with_opacity(config.opacity))
    }
}

/// Meshes a geographic path relative to the camera's zero anchor and
/// keeps the mesh installed on one scene node
pub struct PathBinder {
    node: NodeId,
    camera_selector: String,
    points: Vec<GeoCoordinate>,
    mesher: RibbonMesher,
    poll: ReadinessPoll,
    anchor: Option<Weak<RefCell<GeodeticAnchor>>>,
    builds: u32,
    diagnostics: Diagnostics,
}

impl PathBinder {
    pub fn new(node: NodeId, config: &PathConfig, diagnostics: Diagnostics) -> Self {
        Self {
            node,
            camera_selector: config.camera_selector.clone(),
            points: config.points.clone(),
            mesher: RibbonMesher::from(config),
            poll: ReadinessPoll::new(config.retry_interval_ms, RetryPolicy::from_max_retries(config.max_retries)),
            anchor: None,
            builds: 0,
            diagnostics,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn points(&self) -> &[GeoCoordinate] {
        &self.points
    }

    /// Successful mesh installs so far
    pub fn builds(&self) -> u32 {
        self.builds
    }

    pub fn status(&self) -> BinderStatus {
        match self.poll.status() {
            PollStatus::Pending => BinderStatus::Waiting,
            PollStatus::Ready => BinderStatus::Bound,
            PollStatus::Exhausted => BinderStatus::Exhausted,
            PollStatus::Cancelled => BinderStatus::Cancelled,
        }
    }

    /// Advance the binder from the host loop.
    ///
    /// While waiting, looks up the camera node and its anchor at most once
    /// per retry interval; the first time the anchor has a zero point the
    /// path is meshed and installed.
    pub fn update(&mut self, now_ms: u64, scene: &mut dyn SceneGraph, registry: &AnchorRegistry) -> BinderStatus {
        let selector = &self.camera_selector;
        let outcome = self.poll.poll(now_ms, || {
            let camera = scene.find(selector)?;
            let anchor = registry.get(camera)?;
            let ready = anchor.borrow().is_ready();
            ready.then_some(anchor)
        });

        match outcome {
            PollOutcome::Ready(anchor) => {
                tracing::info!(node = %self.node, attempts = self.poll.attempts(), "camera anchor ready, binding path");
                self.anchor = Some(Rc::downgrade(&anchor));
                self.rebuild(scene);
            }
            PollOutcome::Exhausted => {
                self.diagnostics.report(GeoArError::invalid(format!(
                    "no anchored camera matching '{}' after {} attempts",
                    self.camera_selector,
                    self.poll.attempts()
                )));
            }
            PollOutcome::Pending | PollOutcome::Inactive => {}
        }

        self.status()
    }

    /// Replace the path; once bound the mesh is rebuilt immediately
    pub fn set_path(&mut self, points: Vec<GeoCoordinate>, scene: &mut dyn SceneGraph) {
        self.points = points;
        if self.anchor.is_some() {
            self.rebuild(scene);
        }
    }

    /// Stop waiting for the anchor
    pub fn cancel(&mut self) {
        self.poll.cancel();
    }

    /// Rebuild the mesh from scratch; a failure clears the installed mesh.
    /// Returns whether a mesh is installed afterwards.
    pub fn rebuild(&mut self, scene: &mut dyn SceneGraph) -> bool {
        match self.build_mesh() {
            Ok(mesh) => {
                let triangles = mesh.triangle_count();
                match scene.set_mesh(self.node, mesh) {
                    Ok(()) => {
                        self.builds += 1;
                        tracing::debug!(node = %self.node, triangles, "path mesh installed");
                        true
                    }
                    Err(e) => {
                        self.diagnostics.report(e.into());
                        false
                    }
                }
            }
            Err(e) => {
                self.diagnostics.report(e);
                if let Err(e) = scene.clear_mesh(self.node) {
                    self.diagnostics.report(e.into());
                }
                false
            }
        }
    }

    fn build_mesh(&self) -> GeoArResult<RibbonMesh> {
        let anchor: SharedAnchor = self
            .anchor
            .as_ref()
            .and_then(Weak::upgrade)
            .ok_or(GeoArError::AnchorNotReady)?;
        let local = anchor.borrow().path_to_local(&self.points)?;
        self.mesher.build(&local)
    }
}
