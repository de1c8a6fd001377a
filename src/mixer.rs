// Differential-drive mixer
// Converts a yaw/throttle stick pair into left/right motor power.

use crate::messages::{PowerLevel, PowerPair};

/// Mix a yaw/throttle pair into left/right power scaled to `ceiling`
///
/// # Arguments
/// * `yaw` - Turn intent, -1.0 (left) to 1.0 (right)
/// * `throttle` - Forward intent, -1.0 (reverse) to 1.0 (forward)
/// * `ceiling` - Largest magnitude either side may receive
///
/// Inputs outside [-1, 1] are not rejected; the result extrapolates linearly.
pub fn mix(yaw: f32, throttle: f32, ceiling: PowerLevel) -> PowerPair {
    let left = throttle + yaw;
    let right = throttle - yaw;

    // Divisor floor of 1 keeps small inputs proportional
    let scale = ceiling as f32 / left.abs().max(right.abs()).max(1.0);

    // `as` truncates toward zero
    PowerPair::new((left * scale) as i32, (right * scale) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_sticks_stop() {
        assert_eq!(mix(0.0, 0.0, 100), PowerPair::zero());
        assert_eq!(mix(0.0, 0.0, 0), PowerPair::zero());
    }

    #[test]
    fn test_pure_forward() {
        assert_eq!(mix(0.0, 1.0, 100), PowerPair::new(100, 100));
        assert_eq!(mix(0.0, -1.0, 100), PowerPair::new(-100, -100));
    }

    #[test]
    fn test_pure_turn() {
        assert_eq!(mix(1.0, 0.0, 100), PowerPair::new(100, -100));
        assert_eq!(mix(-1.0, 0.0, 100), PowerPair::new(-100, 100));
    }

    #[test]
    fn test_diagonal_is_normalized() {
        // left_raw = 2, right_raw = 0 -> scale halves
        assert_eq!(mix(1.0, 1.0, 80), PowerPair::new(80, 0));
    }

    #[test]
    fn test_truncates_toward_zero() {
        // 0.5 * 15 = 7.5 on both sides, opposite signs
        assert_eq!(mix(0.5, 0.0, 15), PowerPair::new(7, -7));
    }

    #[test]
    fn test_output_bounded_and_ordered() {
        let steps: Vec<f32> = (-10..=10).map(|i| i as f32 / 10.0).collect();
        for ceiling in [0, 20, 55, 80, 100] {
            for &yaw in &steps {
                for &throttle in &steps {
                    let power = mix(yaw, throttle, ceiling);
                    assert!(
                        power.left.abs() <= ceiling && power.right.abs() <= ceiling,
                        "mix({}, {}, {}) = {:?} exceeds ceiling",
                        yaw,
                        throttle,
                        ceiling,
                        power
                    );
                    if yaw > 0.0 {
                        assert!(power.left >= power.right, "yaw {} not turning right", yaw);
                    } else if yaw < 0.0 {
                        assert!(power.left <= power.right, "yaw {} not turning left", yaw);
                    } else {
                        assert_eq!(power.left, power.right);
                    }
                }
            }
        }
    }

    #[test]
    fn test_out_of_range_extrapolates() {
        // Throttle of 2 saturates the divisor, still bounded by the ceiling
        assert_eq!(mix(0.0, 2.0, 50), PowerPair::new(50, 50));
    }
}
