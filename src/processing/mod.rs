//! Stateful processing of sensor streams

pub mod anchor;
pub mod orientation;

pub use anchor::{GeodeticAnchor, SampleOutcome};
pub use orientation::{FusionState, OrientationFusion};
