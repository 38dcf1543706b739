//! Exponentially damped scalar scroll used for digging and overview panning.

use std::f64::consts::FRAC_PI_2;

/// Default share of the remaining distance covered per frame.
pub const DEFAULT_DAMPING: f64 = 0.1;

/// Scroll position over a run of `item_count` slots.
///
/// `target` is where input wants to be, `current` eases toward it once per
/// frame. The target is clamped to `[0, item_count - 1]` on every mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollEngine {
    target: f64,
    current: f64,
    item_count: usize,
    damping: f64,
}

impl Default for ScrollEngine {
    fn default() -> Self {
        Self::new(DEFAULT_DAMPING)
    }
}

impl ScrollEngine {
    #[must_use]
    pub const fn new(damping: f64) -> Self {
        Self {
            target: 0.0,
            current: 0.0,
            item_count: 0,
            damping,
        }
    }

    #[must_use]
    pub const fn target(&self) -> f64 {
        self.target
    }

    #[must_use]
    pub const fn current(&self) -> f64 {
        self.current
    }

    #[must_use]
    pub const fn item_count(&self) -> usize {
        self.item_count
    }

    /// Largest reachable position.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn max_position(&self) -> f64 {
        self.item_count.saturating_sub(1) as f64
    }

    /// Snap both target and current back to the first slot over a new run.
    pub fn reset(&mut self, item_count: usize) {
        self.item_count = item_count;
        self.target = 0.0;
        self.current = 0.0;
    }

    /// Move the target by a scaled wheel delta.
    pub fn nudge(&mut self, delta: f64) {
        self.set_target(self.target + delta);
    }

    /// Jump the target to a slot (click-to-select).
    #[allow(clippy::cast_precision_loss)]
    pub fn select(&mut self, index: usize) {
        self.set_target(index as f64);
    }

    fn set_target(&mut self, value: f64) {
        let value = if value.is_finite() { value } else { self.target };
        self.target = value.max(0.0).min(self.max_position());
    }

    /// Integrate one frame: `current += (target - current) * damping`.
    pub fn step(&mut self) {
        self.current += (self.target - self.current) * self.damping;
    }

    /// Whether `current` is within one slot of `index`.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn is_near(&self, index: usize) -> bool {
        (index as f64 - self.current).abs() < 1.0
    }

    /// How far the item at `index` is raised out of the crate, in `[0, 1]`.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn lift(&self, index: usize) -> f64 {
        let distance = (index as f64 - self.current).abs();
        if distance < 1.0 {
            (distance * FRAC_PI_2).cos()
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_clamped_for_any_wheel_sequence() {
        let deltas = [5.0, -100.0, 0.3, 1e9, -0.2, f64::NAN, 42.0, -1e12, 7.5];
        for n in 1..12 {
            let mut scroll = ScrollEngine::default();
            scroll.reset(n);
            for delta in deltas {
                scroll.nudge(delta);
                assert!(scroll.target() >= 0.0);
                assert!(scroll.target() <= scroll.max_position());
            }
        }
    }

    #[test]
    fn test_single_item_pins_target_at_zero() {
        let mut scroll = ScrollEngine::default();
        scroll.reset(1);
        scroll.nudge(3.0);
        assert!(scroll.target().abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_run_pins_target_at_zero() {
        let mut scroll = ScrollEngine::default();
        scroll.reset(0);
        scroll.select(4);
        assert!(scroll.target().abs() < f64::EPSILON);
    }

    #[test]
    fn test_step_eases_toward_target() {
        let mut scroll = ScrollEngine::new(0.1);
        scroll.reset(20);
        scroll.select(10);
        scroll.step();
        assert!((scroll.current() - 1.0).abs() < 1e-9);
        scroll.step();
        assert!((scroll.current() - 1.9).abs() < 1e-9);
        for _ in 0..200 {
            scroll.step();
        }
        assert!((scroll.current() - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_reset_zeroes_both() {
        let mut scroll = ScrollEngine::default();
        scroll.reset(10);
        scroll.select(9);
        scroll.step();
        scroll.reset(3);
        assert!(scroll.target().abs() < f64::EPSILON);
        assert!(scroll.current().abs() < f64::EPSILON);
        assert_eq!(scroll.item_count(), 3);
    }

    #[test]
    fn test_lift_and_nearness() {
        let mut scroll = ScrollEngine::new(1.0);
        scroll.reset(10);
        scroll.select(4);
        scroll.step();
        assert!((scroll.lift(4) - 1.0).abs() < 1e-9);
        assert!(scroll.lift(5).abs() < 1e-9);
        assert!(scroll.is_near(4));
        assert!(!scroll.is_near(5));
    }
}
