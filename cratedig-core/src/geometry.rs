//! Spherical coordinates and easing on top of [`glam::DVec3`].
//!
//! Spherical coordinates follow the Y-up convention: `phi` is the polar angle
//! measured from +Y, `theta` the azimuth around Y measured from +Z toward +X.

use glam::DVec3;
use std::f64::consts::PI;

/// Margin kept between the polar angle and the poles.
const POLE_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Spherical {
    pub radius: f64,
    /// Polar angle from +Y
    pub phi: f64,
    /// Azimuth around +Y
    pub theta: f64,
}

impl Spherical {
    #[must_use]
    pub fn from_vec3(v: DVec3) -> Self {
        let radius = v.length();
        if radius == 0.0 {
            return Self::default();
        }
        Self {
            radius,
            theta: v.x.atan2(v.z),
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    #[must_use]
    pub fn to_vec3(self) -> DVec3 {
        let ring = self.phi.sin() * self.radius;
        DVec3::new(
            ring * self.theta.sin(),
            self.phi.cos() * self.radius,
            ring * self.theta.cos(),
        )
    }

    /// Keep `phi` strictly between the poles so the view never flips.
    #[must_use]
    pub fn make_safe(mut self) -> Self {
        self.phi = self.phi.clamp(POLE_EPSILON, PI - POLE_EPSILON);
        self
    }
}

/// Cubic ease-in-out over `t` in `[0, 1]`.
#[must_use]
pub fn ease_in_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0) * 2.0;
    if t < 1.0 {
        0.5 * t * t * t
    } else {
        let t = t - 2.0;
        0.5 * (t * t).mul_add(t, 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: DVec3, b: DVec3) -> bool {
        a.distance(b) < 1e-9
    }

    #[test]
    fn test_spherical_round_trip() {
        let points = [
            DVec3::new(-30.0, 45.0, 0.0),
            DVec3::new(0.0, 20.0, 40.0),
            DVec3::new(25.0, -10.0, 10.0),
        ];
        for p in points {
            assert!(close(Spherical::from_vec3(p).to_vec3(), p));
        }
    }

    #[test]
    fn test_spherical_zero_vector() {
        let s = Spherical::from_vec3(DVec3::ZERO);
        assert!(s.radius.abs() < f64::EPSILON);
        assert!(close(s.to_vec3(), DVec3::ZERO));
    }

    #[test]
    fn test_make_safe_keeps_off_poles() {
        let top = Spherical { radius: 1.0, phi: 0.0, theta: 0.0 }.make_safe();
        let bottom = Spherical { radius: 1.0, phi: 4.0, theta: 0.0 }.make_safe();
        assert!(top.phi > 0.0);
        assert!(bottom.phi < PI);
    }

    #[test]
    fn test_ease_in_out_cubic() {
        assert!(ease_in_out_cubic(0.0).abs() < 1e-12);
        assert!((ease_in_out_cubic(0.5) - 0.5).abs() < 1e-12);
        assert!((ease_in_out_cubic(1.0) - 1.0).abs() < 1e-12);
        assert!(ease_in_out_cubic(0.25) < 0.25);
        assert!(ease_in_out_cubic(0.75) > 0.75);
    }
}
