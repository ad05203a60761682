//! Error taxonomy and input validation

pub mod data;
pub mod error;

pub use data::CoordinateValidator;
pub use error::{DiagnosticRecord, DiagnosticSummary, Diagnostics, GeoArError, GeoArResult, Severity};
