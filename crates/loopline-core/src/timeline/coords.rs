//! Time ↔ percent conversions over a track of known duration
//!
//! A duration of zero (or less) means "unknown" - every conversion then
//! yields 0 so callers never divide by zero while media is still loading.

/// Convert a time in seconds to a percentage of the track (0-100)
#[inline]
pub fn time_to_percent(time: f64, duration: f64) -> f64 {
    if duration <= 0.0 {
        return 0.0;
    }
    (time / duration * 100.0).clamp(0.0, 100.0)
}

/// Convert a percentage of the track (0-100) to a time in seconds
#[inline]
pub fn percent_to_time(percent: f64, duration: f64) -> f64 {
    if duration <= 0.0 {
        return 0.0;
    }
    (percent / 100.0 * duration).clamp(0.0, duration)
}

/// Batch variant of [`time_to_percent`] for render loops
pub fn times_to_percents(times: &[f64], duration: f64) -> Vec<f64> {
    times.iter().map(|&t| time_to_percent(t, duration)).collect()
}

/// Batch variant of [`percent_to_time`] for render loops
pub fn percents_to_times(percents: &[f64], duration: f64) -> Vec<f64> {
    percents.iter().map(|&p| percent_to_time(p, duration)).collect()
}

/// Convert a horizontal pixel offset on a track of `width` pixels to a time
///
/// The offset is clamped to the track, so dragging past either edge pins
/// the result to 0 or `duration`.
#[inline]
pub fn x_to_time(x: f64, width: f64, duration: f64) -> f64 {
    if width <= 0.0 {
        return 0.0;
    }
    percent_to_time(x / width * 100.0, duration)
}

/// Convert a time to a horizontal pixel offset on a track of `width` pixels
#[inline]
pub fn time_to_x(time: f64, width: f64, duration: f64) -> f64 {
    time_to_percent(time, duration) / 100.0 * width.max(0.0)
}

/// Convert a pixel delta into a time delta (unclamped, may be negative)
#[inline]
pub fn delta_x_to_time(dx: f64, width: f64, duration: f64) -> f64 {
    if width <= 0.0 || duration <= 0.0 {
        return 0.0;
    }
    dx / width * duration
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_within_tolerance() {
        for &duration in &[0.5, 1.0, 150.0, 3600.0] {
            for i in 0..=20 {
                let t = duration * i as f64 / 20.0;
                let back = percent_to_time(time_to_percent(t, duration), duration);
                assert!((back - t).abs() < 1e-9, "t={} back={}", t, back);
            }
        }
    }

    #[test]
    fn test_unknown_duration_yields_zero() {
        assert_eq!(time_to_percent(10.0, 0.0), 0.0);
        assert_eq!(time_to_percent(10.0, -5.0), 0.0);
        assert_eq!(percent_to_time(50.0, 0.0), 0.0);
        assert_eq!(x_to_time(100.0, 200.0, 0.0), 0.0);
        assert_eq!(delta_x_to_time(50.0, 200.0, 0.0), 0.0);
    }

    #[test]
    fn test_clamping() {
        assert_eq!(time_to_percent(200.0, 100.0), 100.0);
        assert_eq!(time_to_percent(-1.0, 100.0), 0.0);
        assert_eq!(percent_to_time(150.0, 60.0), 60.0);
        assert_eq!(x_to_time(-20.0, 200.0, 150.0), 0.0);
        assert_eq!(x_to_time(260.0, 200.0, 150.0), 150.0);
    }

    #[test]
    fn test_batch_matches_single() {
        let times = [0.0, 12.5, 75.0, 149.9, 200.0];
        let percents = times_to_percents(&times, 150.0);
        for (t, p) in times.iter().zip(&percents) {
            assert_eq!(*p, time_to_percent(*t, 150.0));
        }
        let back = percents_to_times(&percents, 150.0);
        for (p, t) in percents.iter().zip(&back) {
            assert_eq!(*t, percent_to_time(*p, 150.0));
        }
    }

    #[test]
    fn test_pixel_delta() {
        // 50px on a 200px track of 150s
        assert_eq!(delta_x_to_time(50.0, 200.0, 150.0), 37.5);
        assert_eq!(delta_x_to_time(-50.0, 200.0, 150.0), -37.5);
        assert_eq!(time_to_x(75.0, 200.0, 150.0), 100.0);
    }
}
