//! Centripetal Catmull-Rom interpolation through ordered control points
//!
//! The curve passes through every control point. Open ends are
//! extrapolated by reflecting the neighboring point, so a two-point curve
//! is the straight segment between them.

use nalgebra::Point3;

/// Knot spacing below which a segment is treated as degenerate
const MIN_KNOT_SPACING: f64 = 1e-4;

/// Cubic polynomial coefficients for one axis of one segment
#[derive(Debug, Clone, Copy)]
struct CubicPoly {
    c0: f64,
    c1: f64,
    c2: f64,
    c3: f64,
}

impl CubicPoly {
    /// Hermite form from endpoint values and tangents
    fn hermite(x0: f64, x1: f64, t0: f64, t1: f64) -> Self {
        Self {
            c0: x0,
            c1: t0,
            c2: -3.0 * x0 + 3.0 * x1 - 2.0 * t0 - t1,
            c3: 2.0 * x0 - 2.0 * x1 + t0 + t1,
        }
    }

    /// Non-uniform Catmull-Rom segment between x1 and x2 with knot
    /// intervals dt0, dt1, dt2
    fn nonuniform(x0: f64, x1: f64, x2: f64, x3: f64, dt0: f64, dt1: f64, dt2: f64) -> Self {
        let mut t1 = (x1 - x0) / dt0 - (x2 - x0) / (dt0 + dt1) + (x2 - x1) / dt1;
        let mut t2 = (x2 - x1) / dt1 - (x3 - x1) / (dt1 + dt2) + (x3 - x2) / dt2;

        // Rescale tangents to the [0, 1] parameter of the middle segment
        t1 *= dt1;
        t2 *= dt1;

        Self::hermite(x1, x2, t1, t2)
    }

    fn eval(&self, t: f64) -> f64 {
        let t2 = t * t;
        self.c0 + self.c1 * t + self.c2 * t2 + self.c3 * t2 * t
    }
}

/// Open centripetal Catmull-Rom curve
#[derive(Debug, Clone)]
pub struct CatmullRomCurve {
    points: Vec<Point3<f64>>,
}

impl CatmullRomCurve {
    /// Build a curve; returns `None` for fewer than 2 control points
    pub fn new(points: Vec<Point3<f64>>) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        Some(Self { points })
    }

    /// Point at curve parameter `t` in [0, 1]
    pub fn point_at(&self, t: f64) -> Point3<f64> {
        let points = &self.points;
        let len = points.len();

        let p = (len - 1) as f64 * t.clamp(0.0, 1.0);
        let mut index = p.floor() as usize;
        let mut weight = p - index as f64;

        if index >= len - 1 {
            index = len - 2;
            weight = 1.0;
        }

        let p0 = if index > 0 {
            points[index - 1]
        } else {
            points[0] + (points[0] - points[1])
        };
        let p1 = points[index];
        let p2 = points[index + 1];
        let p3 = if index + 2 < len {
            points[index + 2]
        } else {
            points[len - 1] + (points[len - 1] - points[len - 2])
        };

        // Centripetal parameterization: knot spacing is sqrt of chord length
        let mut dt0 = nalgebra::distance_squared(&p0, &p1).powf(0.25);
        let mut dt1 = nalgebra::distance_squared(&p1, &p2).powf(0.25);
        let mut dt2 = nalgebra::distance_squared(&p2, &p3).powf(0.25);

        if dt1 < MIN_KNOT_SPACING {
            dt1 = 1.0;
        }
        if dt0 < MIN_KNOT_SPACING {
            dt0 = dt1;
        }
        if dt2 < MIN_KNOT_SPACING {
            dt2 = dt1;
        }

        let px = CubicPoly::nonuniform(p0.x, p1.x, p2.x, p3.x, dt0, dt1, dt2);
        let py = CubicPoly::nonuniform(p0.y, p1.y, p2.y, p3.y, dt0, dt1, dt2);
        let pz = CubicPoly::nonuniform(p0.z, p1.z, p2.z, p3.z, dt0, dt1, dt2);

        Point3::new(px.eval(weight), py.eval(weight), pz.eval(weight))
    }

    /// `divisions + 1` points at evenly spaced parameters from start to end
    pub fn sample(&self, divisions: usize) -> Vec<Point3<f64>> {
        let divisions = divisions.max(1);
        (0..=divisions)
            .map(|d| self.point_at(d as f64 / divisions as f64))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_requires_two_points() {
        assert!(CatmullRomCurve::new(vec![]).is_none());
        assert!(CatmullRomCurve::new(vec![Point3::origin()]).is_none());
    }

    #[test]
    fn test_passes_through_control_points() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, -5.0),
            Point3::new(20.0, 2.0, 3.0),
            Point3::new(35.0, 0.0, 0.0),
        ];
        let curve = CatmullRomCurve::new(points.clone()).unwrap();

        for (i, expected) in points.iter().enumerate() {
            let t = i as f64 / (points.len() - 1) as f64;
            assert_relative_eq!(curve.point_at(t), *expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_two_point_curve_is_straight() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(12.0, 0.0, -4.0);
        let curve = CatmullRomCurve::new(vec![a, b]).unwrap();

        let samples = curve.sample(200);
        assert_eq!(samples.len(), 201);

        let direction = (b - a).normalize();
        for p in &samples {
            let along = (p - a).dot(&direction);
            let off_axis = (p - a) - direction * along;
            assert!(off_axis.norm() < 1e-9);
            assert!(along >= -1e-9 && along <= (b - a).norm() + 1e-9);
        }
    }

    #[test]
    fn test_sample_endpoints() {
        let a = Point3::new(1.0, 2.0, 3.0);
        let b = Point3::new(4.0, 2.0, 3.0);
        let c = Point3::new(4.0, 2.0, 9.0);
        let curve = CatmullRomCurve::new(vec![a, b, c]).unwrap();

        let samples = curve.sample(300);
        assert_eq!(samples.len(), 301);
        assert_relative_eq!(samples[0], a, epsilon = 1e-9);
        assert_relative_eq!(samples[300], c, epsilon = 1e-9);
        assert_relative_eq!(samples[150], b, epsilon = 1e-9);
    }

    #[test]
    fn test_duplicate_control_points_stay_finite() {
        let a = Point3::new(1.0, 0.0, 1.0);
        let curve = CatmullRomCurve::new(vec![a, a, Point3::new(5.0, 0.0, 1.0)]).unwrap();
        assert!(curve.sample(50).iter().all(|p| p.coords.iter().all(|c| c.is_finite())));
    }
}
