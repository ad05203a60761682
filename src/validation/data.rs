//! Input validation for coordinates and path specifications

use crate::core::{GeoCoordinate, LocalPoint};
use crate::validation::error::{GeoArError, GeoArResult};

/// Coordinate range and sanity checks
pub struct CoordinateValidator;

impl CoordinateValidator {
    /// Validate a geodetic coordinate read from a sensor or a path spec
    pub fn validate_geo(coordinate: &GeoCoordinate) -> GeoArResult<()> {
        if !coordinate.latitude.is_finite() || !coordinate.longitude.is_finite() {
            return Err(GeoArError::invalid("latitude and longitude must be finite"));
        }

        if coordinate.latitude < -90.0 || coordinate.latitude > 90.0 {
            return Err(GeoArError::invalid(format!(
                "latitude {} outside [-90, 90]",
                coordinate.latitude
            )));
        }

        if coordinate.longitude < -180.0 || coordinate.longitude > 180.0 {
            return Err(GeoArError::invalid(format!(
                "longitude {} outside [-180, 180]",
                coordinate.longitude
            )));
        }

        if !coordinate.altitude.is_finite() {
            return Err(GeoArError::invalid("altitude must be finite"));
        }

        if let Some(accuracy) = coordinate.accuracy {
            if accuracy.is_nan() || accuracy < 0.0 {
                return Err(GeoArError::invalid(format!("accuracy {} is not a radius", accuracy)));
            }
        }

        Ok(())
    }

    /// Validate every coordinate of an ordered path
    pub fn validate_path(points: &[GeoCoordinate]) -> GeoArResult<()> {
        if points.len() < 2 {
            return Err(GeoArError::invalid(format!(
                "a path needs at least 2 points, got {}",
                points.len()
            )));
        }
        points.iter().try_for_each(Self::validate_geo)
    }

    /// Validate a point already in the local frame
    pub fn validate_local(point: &LocalPoint) -> GeoArResult<()> {
        if point.x.is_finite() && point.y.is_finite() && point.z.is_finite() {
            Ok(())
        } else {
            Err(GeoArError::invalid("local point has non-finite components"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_coordinate() {
        let c = GeoCoordinate::new(21.046306, 105.7937535).with_accuracy(12.0);
        assert!(CoordinateValidator::validate_geo(&c).is_ok());
    }

    #[test]
    fn test_out_of_range_coordinates() {
        assert!(CoordinateValidator::validate_geo(&GeoCoordinate::new(91.0, 0.0)).is_err());
        assert!(CoordinateValidator::validate_geo(&GeoCoordinate::new(0.0, -180.5)).is_err());
        assert!(CoordinateValidator::validate_geo(&GeoCoordinate::new(f64::NAN, 0.0)).is_err());
        assert!(CoordinateValidator::validate_geo(&GeoCoordinate::new(0.0, 0.0).with_accuracy(-1.0)).is_err());
    }

    #[test]
    fn test_path_requires_two_points() {
        let one = [GeoCoordinate::new(21.0, 105.0)];
        assert!(matches!(
            CoordinateValidator::validate_path(&one),
            Err(GeoArError::InvalidInput { .. })
        ));

        let two = [GeoCoordinate::new(21.0, 105.0), GeoCoordinate::new(21.001, 105.0)];
        assert!(CoordinateValidator::validate_path(&two).is_ok());
    }

    #[test]
    fn test_local_point_validation() {
        assert!(CoordinateValidator::validate_local(&LocalPoint::new(1.0, 2.0, 3.0)).is_ok());
        assert!(CoordinateValidator::validate_local(&LocalPoint::new(f64::INFINITY, 0.0, 0.0)).is_err());
    }
}
