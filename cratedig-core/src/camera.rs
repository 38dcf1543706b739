//! Camera pose with instant or eased placement and a pointer-driven orbit.

use crate::config::OrbitProfile;
use crate::geometry::{ease_in_out_cubic, Spherical};
use glam::DVec3;
use std::time::Duration;

/// Where the camera is, what it looks at, and its vertical field of view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: DVec3,
    pub look_at: DVec3,
    /// Vertical field of view in degrees
    pub fov: f64,
}

/// An in-flight eased move between two poses.
#[derive(Debug, Clone, Copy)]
struct Transition {
    from_position: DVec3,
    to_position: DVec3,
    from_fov: f64,
    to_fov: f64,
    elapsed: Duration,
    duration: Duration,
}

impl Transition {
    fn progress(&self) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }
}

/// Spherical offset of the camera around its look-at point.
#[derive(Debug, Clone, Copy, Default)]
struct OrbitState {
    radius: f64,
    theta: f64,
    phi: f64,
    target_theta: f64,
    target_phi: f64,
    drag: Option<Drag>,
}

/// Baseline captured when a pointer drag starts.
#[derive(Debug, Clone, Copy)]
struct Drag {
    pointer: (f64, f64),
    base_theta: f64,
    base_phi: f64,
    profile: OrbitProfile,
}

#[derive(Debug, Clone)]
pub struct CameraRig {
    pose: CameraPose,
    transition: Option<Transition>,
    orbit: OrbitState,
    smoothing: f64,
}

impl CameraRig {
    #[must_use]
    pub fn new(pose: CameraPose, smoothing: f64) -> Self {
        let mut rig = Self {
            pose,
            transition: None,
            orbit: OrbitState::default(),
            smoothing,
        };
        rig.resync_orbit();
        rig
    }

    #[must_use]
    pub const fn pose(&self) -> CameraPose {
        self.pose
    }

    #[must_use]
    pub const fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    #[must_use]
    pub const fn is_orbiting(&self) -> bool {
        self.orbit.drag.is_some()
    }

    /// Current eased orbit angles as `(theta, phi)`.
    #[must_use]
    pub const fn orbit_angles(&self) -> (f64, f64) {
        (self.orbit.theta, self.orbit.phi)
    }

    /// Orbit angles the camera is easing toward, as `(theta, phi)`.
    #[must_use]
    pub const fn orbit_target(&self) -> (f64, f64) {
        (self.orbit.target_theta, self.orbit.target_phi)
    }

    /// Move to a new pose. A zero duration places the camera immediately;
    /// otherwise position and field of view ease over `duration` while the
    /// look-at point is applied as given.
    pub fn place(&mut self, position: DVec3, look_at: DVec3, fov: f64, duration: Duration) {
        self.pose.look_at = look_at;
        if duration.is_zero() {
            self.transition = None;
            self.pose.position = position;
            self.pose.fov = fov;
            self.resync_orbit();
            return;
        }
        self.transition = Some(Transition {
            from_position: self.pose.position,
            to_position: position,
            from_fov: self.pose.fov,
            to_fov: fov,
            elapsed: Duration::ZERO,
            duration,
        });
    }

    /// Retarget the look-at point. Callers only do this between transitions.
    pub fn set_look_at(&mut self, look_at: DVec3) {
        self.pose.look_at = look_at;
    }

    /// Adjust field of view by `delta`, clamped to `[min, max]`.
    pub fn zoom(&mut self, delta: f64, min: f64, max: f64) {
        if delta.is_finite() {
            self.pose.fov = (self.pose.fov + delta).max(min).min(max);
        }
    }

    /// Start a drag: the current spherical offset becomes the baseline.
    pub fn begin_orbit(&mut self, pointer: (f64, f64), profile: OrbitProfile) {
        self.resync_orbit();
        self.orbit.drag = Some(Drag {
            pointer,
            base_theta: self.orbit.theta,
            base_phi: self.orbit.phi,
            profile,
        });
    }

    /// Map the pointer's offset from the drag origin onto target angles.
    pub fn drag_orbit(&mut self, pointer: (f64, f64)) {
        let Some(drag) = self.orbit.drag else {
            return;
        };
        let p = drag.profile;
        let dx = (pointer.0 - drag.pointer.0) * p.sensitivity;
        let dy = (pointer.1 - drag.pointer.1) * p.sensitivity;
        if !dx.is_finite() || !dy.is_finite() {
            return;
        }

        let theta = (drag.base_theta - dx)
            .max(drag.base_theta - p.limit_azimuth)
            .min(drag.base_theta + p.limit_azimuth);

        let lo = p.min_polar.max(drag.base_phi - p.limit_polar);
        let hi = p.max_polar.min(drag.base_phi + p.limit_polar);
        let phi = (drag.base_phi - dy)
            .max(lo)
            .min(hi)
            .max(p.min_polar)
            .min(p.max_polar);

        self.orbit.target_theta = theta;
        self.orbit.target_phi = phi;
    }

    /// Release the drag; angles stay wherever they have eased to.
    pub fn end_orbit(&mut self) {
        self.orbit.drag = None;
    }

    /// Advance one frame.
    pub fn update(&mut self, dt: Duration) {
        if let Some(mut transition) = self.transition {
            transition.elapsed += dt;
            let t = ease_in_out_cubic(transition.progress());
            self.pose.position = transition.from_position.lerp(transition.to_position, t);
            self.pose.fov = (transition.to_fov - transition.from_fov).mul_add(t, transition.from_fov);
            if transition.progress() >= 1.0 {
                self.transition = None;
                self.resync_orbit();
            } else {
                self.transition = Some(transition);
            }
            return;
        }

        let orbit = &mut self.orbit;
        orbit.theta += (orbit.target_theta - orbit.theta) * self.smoothing;
        orbit.phi += (orbit.target_phi - orbit.phi) * self.smoothing;
        let offset = Spherical {
            radius: orbit.radius,
            phi: orbit.phi,
            theta: orbit.theta,
        }
        .make_safe()
        .to_vec3();
        self.pose.position = self.pose.look_at + offset;
    }

    fn resync_orbit(&mut self) {
        let s = Spherical::from_vec3(self.pose.position - self.pose.look_at);
        self.orbit.radius = s.radius;
        self.orbit.theta = s.theta;
        self.orbit.phi = s.phi;
        self.orbit.target_theta = s.theta;
        self.orbit.target_phi = s.phi;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const FRAME: Duration = Duration::from_millis(16);

    fn rig() -> CameraRig {
        CameraRig::new(
            CameraPose {
                position: DVec3::new(0.0, 30.0, 0.0),
                look_at: DVec3::new(0.0, 10.0, -80.0),
                fov: 30.0,
            },
            0.1,
        )
    }

    fn profile() -> OrbitProfile {
        OrbitProfile {
            sensitivity: 0.005,
            limit_azimuth: 0.2,
            limit_polar: 0.2,
            min_polar: 0.1,
            max_polar: PI / 1.5,
        }
    }

    #[test]
    fn test_instant_place_sets_pose() {
        let mut rig = rig();
        rig.place(DVec3::new(-75.0, 25.0, 10.0), DVec3::new(-100.0, 0.0, 0.0), 30.0, Duration::ZERO);
        assert!(!rig.is_transitioning());
        assert_eq!(rig.pose().position, DVec3::new(-75.0, 25.0, 10.0));

        // Settled frames keep the camera where it was placed
        rig.update(FRAME);
        assert!(rig.pose().position.distance(DVec3::new(-75.0, 25.0, 10.0)) < 1e-9);
    }

    #[test]
    fn test_eased_place_interpolates_then_settles() {
        let mut rig = rig();
        let start = rig.pose().position;
        let end = DVec3::new(0.0, 0.0, 70.0);
        rig.place(end, DVec3::new(0.0, 0.0, 100.0), 65.0, Duration::from_millis(400));
        assert!(rig.is_transitioning());

        rig.update(Duration::from_millis(200));
        let halfway = rig.pose();
        assert!(halfway.position.distance(start.lerp(end, 0.5)) < 1e-9);
        assert!((halfway.fov - 47.5).abs() < 1e-9);

        rig.update(Duration::from_millis(250));
        assert!(!rig.is_transitioning());
        assert!(rig.pose().position.distance(end) < 1e-9);
        assert!((rig.pose().fov - 65.0).abs() < 1e-9);
    }

    #[test]
    fn test_camera_follows_look_at() {
        let mut rig = rig();
        let before = rig.pose();
        let shift = DVec3::new(16.0, 0.0, 0.0);
        rig.set_look_at(before.look_at + shift);
        rig.update(FRAME);
        assert!(rig.pose().position.distance(before.position + shift) < 1e-9);
    }

    #[test]
    fn test_zoom_clamps_fov() {
        let mut rig = rig();
        rig.zoom(500.0, 10.0, 75.0);
        assert!((rig.pose().fov - 75.0).abs() < f64::EPSILON);
        rig.zoom(-500.0, 10.0, 75.0);
        assert!((rig.pose().fov - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_orbit_polar_stays_in_window() {
        let mut rig = rig();
        let p = profile();
        rig.begin_orbit((400.0, 300.0), p);
        let moves = [
            (400.0, -5000.0),
            (410.0, 9000.0),
            (-3000.0, 300.0),
            (450.0, 250.0),
            (400.0, 1e7),
        ];
        for pointer in moves {
            rig.drag_orbit(pointer);
            let (_, phi) = rig.orbit_target();
            assert!(phi >= p.min_polar && phi <= p.max_polar, "phi {phi} escaped");
            rig.update(FRAME);
            let (_, eased) = rig.orbit_angles();
            assert!(eased > 0.0 && eased < PI);
        }
    }

    #[test]
    fn test_orbit_azimuth_window_is_relative_to_baseline() {
        let mut rig = rig();
        let (base_theta, _) = rig.orbit_angles();
        rig.begin_orbit((0.0, 0.0), profile());
        rig.drag_orbit((10_000.0, 0.0));
        let (theta, _) = rig.orbit_target();
        assert!((theta - (base_theta - 0.2)).abs() < 1e-9);
    }

    #[test]
    fn test_end_orbit_freezes_angles() {
        let mut rig = rig();
        rig.begin_orbit((0.0, 0.0), profile());
        rig.drag_orbit((20.0, 0.0));
        for _ in 0..5 {
            rig.update(FRAME);
        }
        rig.end_orbit();
        let frozen = rig.orbit_angles();
        assert!(!rig.is_orbiting());

        // Still easing toward the last target, never back to the baseline
        rig.update(FRAME);
        let (theta, _) = rig.orbit_angles();
        assert!(theta <= frozen.0);
    }

    #[test]
    fn test_drag_without_begin_is_ignored() {
        let mut rig = rig();
        let before = rig.orbit_target();
        rig.drag_orbit((500.0, 500.0));
        assert_eq!(rig.orbit_target(), before);
    }
}
