//! Core geo-anchoring algorithms

pub mod compass;
pub mod geodetic;
pub mod ribbon;
pub mod spline;

pub use compass::{compass_heading, screen_adjustment, yaw_offset};
pub use geodetic::{distance_meters, to_local};
pub use ribbon::{Face, FaceColoring, MeshMaterial, RibbonMesh, RibbonMesher};
pub use spline::CatmullRomCurve;
