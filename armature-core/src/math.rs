// Copyright (C) 2024 Laixer Equipment B.V.
// All rights reserved.
//
// This software may be modified and distributed under the terms
// of the included license.  See the LICENSE file for details.

use std::f64::consts::PI;

/// Calculate the shortest rotation between two points on a circle.
///
/// The result lies in the half-open interval `(-PI, PI]`.
pub fn shortest_rotation(distance: f64) -> f64 {
    let dist_normal = distance.rem_euclid(2.0 * PI);

    if dist_normal > PI {
        dist_normal - (2.0 * PI)
    } else {
        dist_normal
    }
}

/// Wrap an absolute angle into `(-PI, PI]`.
#[inline]
pub fn wrap_angle(angle: f64) -> f64 {
    shortest_rotation(angle)
}

/// Calculate the angle of a triangle using the law of cosines.
///
/// Returns the angle opposite to side `c`. The cosine is clamped to `[-1, 1]`
/// so degenerate (flat) triangles yield `0` or `PI` instead of `NaN`.
pub fn law_of_cosines(a: f64, b: f64, c: f64) -> f64 {
    let numerator = a.powi(2) + b.powi(2) - c.powi(2);
    let denominator = 2.0 * a * b;

    (numerator / denominator).clamp(-1.0, 1.0).acos()
}

/// Linear interpolation.
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortest_rotation() {
        assert!((shortest_rotation(45_f64.to_radians()) - 45_f64.to_radians()).abs() < 1e-12);
        assert!((shortest_rotation(270_f64.to_radians()) + 90_f64.to_radians()).abs() < 1e-12);
        assert!((shortest_rotation(-270_f64.to_radians()) - 90_f64.to_radians()).abs() < 1e-12);
        assert!((shortest_rotation(PI) - PI).abs() < 1e-12);
        assert!((shortest_rotation(-PI) - PI).abs() < 1e-12);
    }

    #[test]
    fn test_wrap_angle() {
        assert!((wrap_angle(3.0 * PI - 0.25) - (PI - 0.25)).abs() < 1e-12);
        assert!((wrap_angle(-0.5) + 0.5).abs() < 1e-12);
        assert!(wrap_angle(4.0 * PI).abs() < 1e-12);
    }

    #[test]
    fn test_law_of_cosines() {
        // Equilateral triangle.
        assert!((law_of_cosines(1.0, 1.0, 1.0) - 60_f64.to_radians()).abs() < 1e-12);
        // Right triangle.
        assert!((law_of_cosines(3.0, 4.0, 5.0) - 90_f64.to_radians()).abs() < 1e-12);
        // Flat triangles must not produce NaN.
        assert!((law_of_cosines(1.0, 1.0, 2.0 + 1e-12) - PI).abs() < 1e-6);
        assert!(law_of_cosines(1.0, 1.0, 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(0.0, 10.0, 0.5), 5.0);
        assert_eq!(lerp(-1.0, 1.0, 0.0), -1.0);
        assert_eq!(lerp(-1.0, 1.0, 1.0), 1.0);
    }
}
