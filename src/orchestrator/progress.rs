//! Progress arithmetic for in-stage heartbeats

/// Fraction of a stage's range a single heartbeat tries to advance.
const HEARTBEAT_STEP: f64 = 0.01;

/// Progress after one UPDATE heartbeat within the stage range `(start, end)`.
///
/// Advances by 1% of the range width, halving the step until the result stays
/// strictly below `end`. Progress already at or past `end` is returned as is,
/// so a late heartbeat never lowers a job's progress.
pub fn heartbeat_progress(current: f64, (start, end): (u32, u32)) -> f64 {
    let end = f64::from(end);
    if current >= end {
        return current;
    }
    let mut increment = (end - f64::from(start)) * HEARTBEAT_STEP;
    while current + increment >= end {
        increment *= 0.5;
    }
    current + increment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heartbeat_advances_one_percent_of_range() {
        let next = heartbeat_progress(34.0, (34, 66));
        assert!((next - 34.32).abs() < 1e-9);
    }

    #[test]
    fn test_heartbeats_converge_below_end() {
        let mut progress = 34.0;
        for _ in 0..10_000 {
            let next = heartbeat_progress(progress, (34, 66));
            assert!(next >= progress);
            assert!(next < 66.0);
            progress = next;
        }
        assert!(progress > 65.0);
    }

    #[test]
    fn test_heartbeat_halves_near_end() {
        let next = heartbeat_progress(65.9, (34, 66));
        assert!(next > 65.9 && next < 66.0);
    }

    #[test]
    fn test_heartbeat_never_regresses() {
        assert_eq!(heartbeat_progress(66.0, (34, 66)), 66.0);
        assert_eq!(heartbeat_progress(80.0, (34, 66)), 80.0);
    }

    #[test]
    fn test_heartbeat_on_single_point_range_is_stable() {
        assert_eq!(heartbeat_progress(50.0, (51, 51)), 50.0);
    }
}
