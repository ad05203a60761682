//! Path ribbon mesh generation
//!
//! Turns an ordered list of local-frame points into a flat triangulated
//! strip of constant width:
//! 1. Fit a centripetal Catmull-Rom curve and resample it densely
//! 2. Emit a quad of four side points for every consecutive dense pair,
//!    plus a closing quad for the last point
//! 3. Triangulate the vertex sequence as a strip
//! 4. Derive face and vertex normals from the finished topology
//!
//! The mesh is rebuilt wholesale on every call.

use crate::algorithms::spline::CatmullRomCurve;
use crate::core::{
    LocalPoint, DEFAULT_RIBBON_COLOR, DEFAULT_RIBBON_HALF_WIDTH, DEFAULT_RIBBON_OPACITY,
    DEFAULT_SAMPLES_PER_POINT,
};
use crate::validation::{CoordinateValidator, GeoArError, GeoArResult};
use nalgebra::{Point3, Vector3};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Lateral length below which a segment has no horizontal extent
const MIN_LATERAL_NORM: f64 = 1e-12;

/// Triangle referencing three vertex indices.
///
/// Face `k` of a strip covers vertices `k`, `k + 1` and `k + 2`; on odd
/// faces the first two indices are swapped to keep a consistent winding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Face {
    pub indices: [u32; 3],
    /// 0xRRGGBB
    pub color: u32,
}

/// Rendering flags handed to the scene along with the geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshMaterial {
    pub double_sided: bool,
    pub opacity: f64,
    pub transparent: bool,
    pub face_colors: bool,
}

impl MeshMaterial {
    pub fn with_opacity(opacity: f64) -> Self {
        let opacity = opacity.clamp(0.0, 1.0);
        Self {
            double_sided: true,
            opacity,
            transparent: opacity < 1.0,
            face_colors: true,
        }
    }
}

impl Default for MeshMaterial {
    fn default() -> Self {
        Self::with_opacity(DEFAULT_RIBBON_OPACITY)
    }
}

/// How faces are colored
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FaceColoring {
    Uniform(u32),
    /// A random color per face, for inspecting the triangulation
    RandomDebug,
}

impl Default for FaceColoring {
    fn default() -> Self {
        FaceColoring::Uniform(DEFAULT_RIBBON_COLOR)
    }
}

/// Renderable ribbon geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RibbonMesh {
    pub vertices: Vec<Point3<f64>>,
    pub faces: Vec<Face>,
    pub face_normals: Vec<Vector3<f64>>,
    pub vertex_normals: Vec<Vector3<f64>>,
    pub half_width: f64,
    pub material: MeshMaterial,
}

impl RibbonMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.faces.len()
    }
}

/// Builds ribbon meshes from local-frame paths
#[derive(Debug, Clone)]
pub struct RibbonMesher {
    pub half_width: f64,
    pub samples_per_point: usize,
    pub coloring: FaceColoring,
    pub material: MeshMaterial,
}

impl Default for RibbonMesher {
    fn default() -> Self {
        Self {
            half_width: DEFAULT_RIBBON_HALF_WIDTH,
            samples_per_point: DEFAULT_SAMPLES_PER_POINT,
            coloring: FaceColoring::default(),
            material: MeshMaterial::default(),
        }
    }
}

impl RibbonMesher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_half_width(mut self, half_width: f64) -> Self {
        self.half_width = half_width;
        self
    }

    pub fn with_samples_per_point(mut self, samples_per_point: usize) -> Self {
        self.samples_per_point = samples_per_point.max(1);
        self
    }

    pub fn with_coloring(mut self, coloring: FaceColoring) -> Self {
        self.coloring = coloring;
        self
    }

    pub fn with_material(mut self, material: MeshMaterial) -> Self {
        self.material = material;
        self
    }

    /// Mesh a sparse path: interpolate, resample, then triangulate
    pub fn build(&self, points: &[LocalPoint]) -> GeoArResult<RibbonMesh> {
        if points.len() < 2 {
            return Err(GeoArError::invalid(format!(
                "ribbon needs at least 2 path points, got {}",
                points.len()
            )));
        }
        points.iter().try_for_each(CoordinateValidator::validate_local)?;

        let controls = points.iter().map(LocalPoint::to_point).collect();
        let curve = CatmullRomCurve::new(controls)
            .ok_or_else(|| GeoArError::invalid("ribbon curve needs at least 2 points"))?;
        let dense = curve.sample(self.samples_per_point * points.len());

        self.build_from_polyline(&dense)
    }

    /// Mesh an already dense polyline without resampling
    pub fn build_from_polyline(&self, dense: &[Point3<f64>]) -> GeoArResult<RibbonMesh> {
        let len = dense.len();
        if len < 2 {
            return Err(GeoArError::invalid(format!(
                "ribbon needs at least 2 polyline points, got {}",
                len
            )));
        }
        if !(self.half_width.is_finite() && self.half_width > 0.0) {
            return Err(GeoArError::invalid(format!("half width {} must be positive", self.half_width)));
        }

        // Every dense pair, then the last point against its predecessor
        let segments: Vec<(Point3<f64>, Point3<f64>)> = dense
            .windows(2)
            .map(|w| (w[0], w[1]))
            .chain(std::iter::once((dense[len - 1], dense[len - 2])))
            .collect();

        let offsets = fill_offsets(
            segments
                .iter()
                .map(|(a, b)| lateral_offset(a, b, self.half_width))
                .collect(),
        )
        .ok_or_else(|| GeoArError::invalid("path has no horizontal extent"))?;

        let mut vertices = Vec::with_capacity(segments.len() * 4);
        for ((a, b), offset) in segments.iter().zip(&offsets) {
            vertices.push(a + offset);
            vertices.push(a - offset);
            vertices.push(b + offset);
            vertices.push(b - offset);
        }

        let faces = self.triangulate(vertices.len())?;
        let face_normals = compute_face_normals(&vertices, &faces);
        let vertex_normals = compute_vertex_normals(&vertices, &faces);

        tracing::debug!(
            dense_points = len,
            vertices = vertices.len(),
            faces = faces.len(),
            "built ribbon mesh"
        );

        Ok(RibbonMesh {
            vertices,
            faces,
            face_normals,
            vertex_normals,
            half_width: self.half_width,
            material: self.material,
        })
    }

    /// Strip triangulation over `vertex_count` vertices; odd faces swap
    /// their first two indices so all faces share one winding
    fn triangulate(&self, vertex_count: usize) -> GeoArResult<Vec<Face>> {
        let last = u32::try_from(vertex_count)
            .map_err(|_| GeoArError::invalid("ribbon exceeds the u32 index range"))?;

        let mut rng = rand::thread_rng();
        let faces = (0..last.saturating_sub(2))
            .map(|k| {
                let indices = if k % 2 == 0 { [k, k + 1, k + 2] } else { [k + 1, k, k + 2] };
                let color = match self.coloring {
                    FaceColoring::Uniform(color) => color,
                    FaceColoring::RandomDebug => rng.gen_range(0..=0xff_ff_ff),
                };
                Face { indices, color }
            })
            .collect();
        Ok(faces)
    }
}

/// Horizontal vector perpendicular to `a -> b` with length `half_width`
pub fn lateral_offset(a: &Point3<f64>, b: &Point3<f64>, half_width: f64) -> Option<Vector3<f64>> {
    let side = (b - a).cross(&Vector3::y());
    side.try_normalize(MIN_LATERAL_NORM).map(|n| n * half_width)
}

/// Replace missing offsets with the nearest preceding one, then the nearest
/// following one; `None` when no segment has an offset
fn fill_offsets(mut offsets: Vec<Option<Vector3<f64>>>) -> Option<Vec<Vector3<f64>>> {
    let mut last = None;
    for slot in offsets.iter_mut() {
        match slot {
            Some(v) => last = Some(*v),
            None => *slot = last,
        }
    }

    let mut next = None;
    for slot in offsets.iter_mut().rev() {
        match slot {
            Some(v) => next = Some(*v),
            None => *slot = next,
        }
    }

    offsets.into_iter().collect()
}

fn face_cross(vertices: &[Point3<f64>], face: &Face) -> Vector3<f64> {
    let [a, b, c] = face.indices.map(|i| vertices[i as usize]);
    (c - b).cross(&(a - b))
}

/// Unit normal per face; zero for degenerate faces
pub fn compute_face_normals(vertices: &[Point3<f64>], faces: &[Face]) -> Vec<Vector3<f64>> {
    faces
        .iter()
        .map(|f| face_cross(vertices, f).try_normalize(0.0).unwrap_or_else(Vector3::zeros))
        .collect()
}

/// Area-weighted average of adjacent face normals per vertex
pub fn compute_vertex_normals(vertices: &[Point3<f64>], faces: &[Face]) -> Vec<Vector3<f64>> {
    let mut sums = vec![Vector3::zeros(); vertices.len()];
    for face in faces {
        // The cross product length is twice the face area
        let weighted = face_cross(vertices, face);
        for i in face.indices {
            sums[i as usize] += weighted;
        }
    }

    sums.into_iter()
        .map(|n| n.try_normalize(0.0).unwrap_or_else(Vector3::zeros))
        .collect()
}
