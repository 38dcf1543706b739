//! Time and duration conversion utilities.
//!
//! Track offsets travel over the wire as floating-point seconds, so every
//! conversion into a [`Duration`] goes through the saturating helpers here
//! instead of `Duration::from_secs_f64`, which panics on negative or
//! non-finite input.

use std::time::Duration;

/// Extension trait for safe Duration conversions.
pub trait DurationExt {
    /// Convert duration to seconds as u32, saturating at `u32::MAX`.
    fn as_secs_u32(&self) -> u32;
}

impl DurationExt for Duration {
    fn as_secs_u32(&self) -> u32 {
        u32::try_from(self.as_secs()).unwrap_or(u32::MAX)
    }
}

/// Build a duration from floating-point seconds.
///
/// Negative, NaN and infinite inputs collapse to zero; values beyond what a
/// `Duration` can hold saturate at `Duration::MAX`.
#[must_use]
pub fn duration_from_secs(secs: f64) -> Duration {
    if !secs.is_finite() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

/// Format an elapsed time as `m:ss` for the transport display.
///
/// Zero renders as `--:--`, matching an idle transport.
#[must_use]
pub fn format_clock(elapsed: Duration) -> String {
    if elapsed.is_zero() {
        return "--:--".to_string();
    }
    let total = elapsed.as_secs_u32();
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_secs_u32_large() {
        let duration = Duration::from_secs(u64::from(u32::MAX) + 1);
        assert_eq!(duration.as_secs_u32(), u32::MAX);
    }

    #[test]
    fn test_duration_from_secs_rejects_garbage() {
        assert_eq!(duration_from_secs(-3.0), Duration::ZERO);
        assert_eq!(duration_from_secs(f64::NAN), Duration::ZERO);
        assert_eq!(duration_from_secs(f64::INFINITY), Duration::ZERO);
        assert_eq!(duration_from_secs(f64::MAX), Duration::MAX);
    }

    #[test]
    fn test_duration_from_secs_fractional() {
        assert_eq!(duration_from_secs(1.5), Duration::from_millis(1500));
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(Duration::ZERO), "--:--");
        assert_eq!(format_clock(Duration::from_secs(5)), "0:05");
        assert_eq!(format_clock(Duration::from_millis(125_900)), "2:05");
        assert_eq!(format_clock(Duration::from_secs(3600)), "60:00");
    }
}
