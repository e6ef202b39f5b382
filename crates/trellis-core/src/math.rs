//! Geometry helpers: rounding, rotation frames, axis transfer and ranges.

use kurbo::{Affine, Vec2};
use serde::{Deserialize, Serialize};

/// Values are rounded to this many units per 1.0 before comparisons.
const ROUND_FACTOR: f64 = 1e6;

/// Rounding step applied before equality and tie checks.
pub const ROUND_PRECISION: f64 = 1.0 / ROUND_FACTOR;

/// Round a value to the fixed comparison step.
pub fn round(value: f64) -> f64 {
    let rounded = (value * ROUND_FACTOR).round() / ROUND_FACTOR;
    // Avoid -0.0 leaking into stringified keys.
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// A coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub const BOTH: [Axis; 2] = [Axis::X, Axis::Y];

    /// The perpendicular axis.
    pub fn other(self) -> Self {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }

    /// Pick this axis' component of a vector.
    pub fn component(self, v: Vec2) -> f64 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
        }
    }

    /// A vector with `value` on this axis and zero on the other.
    pub fn vec(self, value: f64) -> Vec2 {
        match self {
            Axis::X => Vec2::new(value, 0.0),
            Axis::Y => Vec2::new(0.0, value),
        }
    }
}

/// Normalize an angle in degrees to `[0, 360)`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    let normalized = degrees % 360.0;
    let normalized = if normalized < 0.0 { normalized + 360.0 } else { normalized };
    if normalized >= 360.0 || normalized == 0.0 { 0.0 } else { normalized }
}

/// Signed angle difference in `(-180, 180]`.
pub fn wrap_degrees(degrees: f64) -> f64 {
    let normalized = normalize_degrees(degrees);
    if normalized > 180.0 { normalized - 360.0 } else { normalized }
}

/// Rotation modulo 180°, rounded, in `[0, 180)`.
pub fn rotation_class(degrees: f64) -> f64 {
    let class = round(normalize_degrees(degrees) % 180.0);
    if class >= 180.0 { 0.0 } else { class }
}

/// Whether an angle is a multiple of 90°.
pub fn is_axis_aligned(degrees: f64) -> bool {
    let class = rotation_class(degrees);
    class == 0.0 || class == 90.0
}

/// How a dependency along one axis carries over between two rotated frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisTransfer {
    /// Relative rotation is a multiple of 180°.
    Same,
    /// Relative rotation is an odd multiple of 90°.
    Swapped,
    /// Any other relative rotation: both axes are affected.
    Coupled,
}

impl AxisTransfer {
    /// Classify the relative rotation between a dependent frame and its dependency frame.
    pub fn from_delta(delta_degrees: f64) -> Self {
        let class = rotation_class(delta_degrees);
        if class == 0.0 {
            AxisTransfer::Same
        } else if class == 90.0 {
            AxisTransfer::Swapped
        } else {
            AxisTransfer::Coupled
        }
    }

    /// Axes of the other frame that `axis` maps onto.
    pub fn targets(self, axis: Axis) -> &'static [Axis] {
        match (self, axis) {
            (AxisTransfer::Same, Axis::X) | (AxisTransfer::Swapped, Axis::Y) => &[Axis::X],
            (AxisTransfer::Same, Axis::Y) | (AxisTransfer::Swapped, Axis::X) => &[Axis::Y],
            (AxisTransfer::Coupled, _) => &Axis::BOTH,
        }
    }
}

/// Map a gesture axis into a frame rotated by `rotation_degrees`.
///
/// Frames in the first 90° bracket keep the axis, frames in the second bracket swap it.
/// The mapping is its own inverse.
pub fn local_axis(axis: Axis, rotation_degrees: f64) -> Axis {
    if rotation_class(rotation_degrees) < 90.0 { axis } else { axis.other() }
}

/// Sine and cosine of an angle in degrees, exact for multiples of 90°.
pub fn sin_cos_degrees(degrees: f64) -> (f64, f64) {
    let normalized = round(normalize_degrees(degrees));
    if normalized == 0.0 {
        (0.0, 1.0)
    } else if normalized == 90.0 {
        (1.0, 0.0)
    } else if normalized == 180.0 {
        (0.0, -1.0)
    } else if normalized == 270.0 {
        (-1.0, 0.0)
    } else {
        degrees.to_radians().sin_cos()
    }
}

/// Rotate a vector by an angle in degrees.
pub fn rotate_vec(v: Vec2, degrees: f64) -> Vec2 {
    let (sin, cos) = sin_cos_degrees(degrees);
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Rotation about the origin by an angle in degrees.
pub fn rotation(degrees: f64) -> Affine {
    let (sin, cos) = sin_cos_degrees(degrees);
    Affine::new([cos, sin, -sin, cos, 0.0, 0.0])
}

/// Translation, rotation and scale extracted from an affine transform (skew is dropped).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decomposed {
    pub translation: Vec2,
    pub rotation_degrees: f64,
    pub scale: Vec2,
}

/// Split an affine transform into translation, rotation and scale.
pub fn decompose(affine: Affine) -> Decomposed {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    let scale_x = a.hypot(b);
    let det = a * d - b * c;
    let scale_y = if scale_x == 0.0 { 0.0 } else { det / scale_x };
    Decomposed {
        translation: Vec2::new(e, f),
        rotation_degrees: normalize_degrees(round(b.atan2(a).to_degrees())),
        scale: Vec2::new(scale_x, scale_y),
    }
}

/// Build `translate * rotate * scale`.
pub fn compose(decomposed: Decomposed) -> Affine {
    Affine::translate(decomposed.translation)
        * rotation(decomposed.rotation_degrees)
        * Affine::scale_non_uniform(decomposed.scale.x, decomposed.scale.y)
}

/// A closed interval `(min, max)`.
pub type Range = (f64, f64);

/// Whether two closed ranges share at least one value.
pub fn ranges_overlap(a: Range, b: Range) -> bool {
    a.0 <= b.1 && b.0 <= a.1
}

/// Intersection of two closed ranges.
pub fn range_intersection(a: Range, b: Range) -> Option<Range> {
    let start = a.0.max(b.0);
    let end = a.1.min(b.1);
    (start <= end).then_some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    #[test]
    fn test_round_is_stable() {
        assert_eq!(round(0.1 + 0.2), round(0.3));
        assert_eq!(round(5.0), 5.0);
        assert_eq!(round(-5.0).abs(), round(5.0));
        assert_eq!(round(-0.0000001), 0.0);
    }

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(0.0), 0.0);
        assert_eq!(normalize_degrees(360.0), 0.0);
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(450.0), 90.0);
    }

    #[test]
    fn test_wrap_degrees() {
        assert_eq!(wrap_degrees(-340.0), 20.0);
        assert_eq!(wrap_degrees(340.0), -20.0);
        assert_eq!(wrap_degrees(180.0), 180.0);
        assert_eq!(wrap_degrees(-180.0), 180.0);
        assert_eq!(wrap_degrees(0.0), 0.0);
    }

    #[test]
    fn test_rotation_class() {
        assert_eq!(rotation_class(270.0), 90.0);
        assert_eq!(rotation_class(180.0), 0.0);
        assert_eq!(rotation_class(-45.0), 135.0);
    }

    #[test]
    fn test_axis_transfer() {
        assert_eq!(AxisTransfer::from_delta(0.0), AxisTransfer::Same);
        assert_eq!(AxisTransfer::from_delta(-180.0), AxisTransfer::Same);
        assert_eq!(AxisTransfer::from_delta(90.0), AxisTransfer::Swapped);
        assert_eq!(AxisTransfer::from_delta(-270.0), AxisTransfer::Swapped);
        assert_eq!(AxisTransfer::from_delta(30.0), AxisTransfer::Coupled);

        assert_eq!(AxisTransfer::Swapped.targets(Axis::X), &[Axis::Y]);
        assert_eq!(AxisTransfer::Coupled.targets(Axis::Y), &[Axis::X, Axis::Y]);
    }

    #[test]
    fn test_local_axis_brackets() {
        assert_eq!(local_axis(Axis::X, 0.0), Axis::X);
        assert_eq!(local_axis(Axis::X, 45.0), Axis::X);
        assert_eq!(local_axis(Axis::X, 90.0), Axis::Y);
        assert_eq!(local_axis(Axis::Y, 270.0), Axis::X);
        assert_eq!(local_axis(Axis::Y, 180.0), Axis::Y);
    }

    #[test]
    fn test_rotate_vec_exact_quarter_turn() {
        let v = rotate_vec(Vec2::new(10.0, 0.0), 90.0);
        assert_eq!(v, Vec2::new(0.0, 10.0));
        let v = rotate_vec(Vec2::new(10.0, 0.0), -90.0);
        assert_eq!(v, Vec2::new(0.0, -10.0));
    }

    #[test]
    fn test_decompose_compose() {
        let original = Decomposed {
            translation: Vec2::new(5.0, -3.0),
            rotation_degrees: 90.0,
            scale: Vec2::new(2.0, 3.0),
        };
        let affine = compose(original);
        let decomposed = decompose(affine);
        assert_eq!(decomposed.translation, original.translation);
        assert_eq!(decomposed.rotation_degrees, 90.0);
        assert!((decomposed.scale.x - 2.0).abs() < 1e-9);
        assert!((decomposed.scale.y - 3.0).abs() < 1e-9);

        let p = affine * Point::new(1.0, 0.0);
        assert!((p.x - 5.0).abs() < 1e-9);
        assert!((p.y - -1.0).abs() < 1e-9);
    }

    #[test]
    fn test_inverse_rotation() {
        let forward = rotation(90.0);
        let back = forward.inverse();
        let p = back * (forward * Point::new(3.0, 4.0));
        assert!((p.x - 3.0).abs() < 1e-9);
        assert!((p.y - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_ranges() {
        assert!(ranges_overlap((0.0, 10.0), (10.0, 20.0)));
        assert!(!ranges_overlap((0.0, 10.0), (10.5, 20.0)));
        assert_eq!(range_intersection((0.0, 10.0), (5.0, 20.0)), Some((5.0, 10.0)));
        assert_eq!(range_intersection((0.0, 1.0), (2.0, 3.0)), None);
    }
}
