//! Zero-anchor state and GPS sample ingestion

use crate::algorithms::geodetic;
use crate::core::{GeoCoordinate, LocalPoint, ZeroAnchor};
use crate::utils::config::AnchorConfig;
use crate::validation::{CoordinateValidator, GeoArError, GeoArResult};

/// Outcome of an accepted sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleOutcome {
    /// The sample became the zero anchor
    ZeroEstablished(LocalPoint),
    /// The current position moved to this local point
    Updated(LocalPoint),
}

impl SampleOutcome {
    pub fn local(&self) -> LocalPoint {
        match self {
            SampleOutcome::ZeroEstablished(p) | SampleOutcome::Updated(p) => *p,
        }
    }
}

/// Single-writer state of one tracking session.
///
/// Holds the zero anchor (set at most once), the latest accepted sample and
/// its offset in the local frame.
#[derive(Debug, Clone)]
pub struct GeodeticAnchor {
    accuracy_threshold_m: f64,
    zero: Option<ZeroAnchor>,
    current: Option<GeoCoordinate>,
    local: Option<LocalPoint>,
}

impl GeodeticAnchor {
    /// Create an anchor; a preset zero from the config is applied immediately
    pub fn new(config: &AnchorConfig) -> Self {
        let zero = config.preset_zero().map(|coordinate| {
            tracing::info!(
                latitude = coordinate.latitude,
                longitude = coordinate.longitude,
                "zero anchor preset from configuration"
            );
            ZeroAnchor::new(coordinate)
        });

        Self {
            accuracy_threshold_m: config.accuracy_threshold_m as f64,
            zero,
            current: None,
            local: None,
        }
    }

    pub fn accuracy_threshold(&self) -> f64 {
        self.accuracy_threshold_m
    }

    pub fn zero_anchor(&self) -> Option<&ZeroAnchor> {
        self.zero.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.zero.is_some()
    }

    /// Latest accepted sample
    pub fn current_position(&self) -> Option<&GeoCoordinate> {
        self.current.as_ref()
    }

    /// Latest accepted sample in the local frame
    pub fn local_position(&self) -> Option<LocalPoint> {
        self.local
    }

    /// Accept or reject one pushed GPS sample.
    ///
    /// Rejected samples leave every piece of state untouched.
    pub fn ingest_sample(&mut self, sample: GeoCoordinate) -> GeoArResult<SampleOutcome> {
        CoordinateValidator::validate_geo(&sample)?;

        if let Some(accuracy) = sample.accuracy {
            if accuracy > self.accuracy_threshold_m {
                tracing::warn!(accuracy, threshold = self.accuracy_threshold_m, "dropping imprecise position sample");
                return Err(GeoArError::LowConfidenceSample {
                    reason: "position accuracy".to_string(),
                    value: accuracy,
                    threshold: self.accuracy_threshold_m,
                });
            }
        }

        let (zero, established) = match self.zero {
            Some(zero) => (zero, false),
            None => {
                let zero = ZeroAnchor::new(sample);
                tracing::info!(
                    latitude = sample.latitude,
                    longitude = sample.longitude,
                    "zero anchor established from first accepted sample"
                );
                (zero, true)
            }
        };

        let local = geodetic::to_local(&zero, &sample);

        // Commit all three together
        self.zero = Some(zero);
        self.current = Some(sample);
        self.local = Some(local);

        tracing::debug!(x = local.x, y = local.y, z = local.z, "position sample accepted");

        Ok(if established {
            SampleOutcome::ZeroEstablished(local)
        } else {
            SampleOutcome::Updated(local)
        })
    }

    /// Convert a coordinate into the local frame of this session
    pub fn to_local(&self, coordinate: &GeoCoordinate) -> GeoArResult<LocalPoint> {
        let zero = self.zero.as_ref().ok_or(GeoArError::AnchorNotReady)?;
        CoordinateValidator::validate_geo(coordinate)?;
        Ok(geodetic::to_local(zero, coordinate))
    }

    /// Convert an ordered path into the local frame, preserving order
    pub fn path_to_local(&self, points: &[GeoCoordinate]) -> GeoArResult<Vec<LocalPoint>> {
        let zero = self.zero.as_ref().ok_or(GeoArError::AnchorNotReady)?;
        CoordinateValidator::validate_path(points)?;
        Ok(points.iter().map(|p| geodetic::to_local(zero, p)).collect())
    }
}

impl Default for GeodeticAnchor {
    fn default() -> Self {
        Self::new(&AnchorConfig::default())
    }
}
