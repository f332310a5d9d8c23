//! Reductions from simulator output to scalar objectives (lower is better).

use std::f64::consts::PI;

/// Simulator observation: `[x, y, z]` position followed by a 4-component orientation.
pub type Pose = [f64; 7];

/// Scale applied to farm power so objective values stay near unit magnitude.
pub const FARM_POWER_SCALE: f64 = 1e7;

/// Step-weighted cumulative distance from each pose to `target`.
///
/// `f = Σ_i i * |target - pose_i[0..3]|`, so late deviations cost more than early ones and
/// the first pose contributes nothing. An episode that terminates early simply has fewer
/// terms.
///
/// ```
/// use rotorlab_design::objective::weighted_tracking_error;
///
/// let target = [0.0, 0.0, 1.0];
/// let poses = [
///     [5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0],
///     [0.0, 0.0, 3.0, 0.0, 0.0, 0.0, 1.0],
///     [0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
/// ];
/// assert_eq!(weighted_tracking_error(target, &poses), 2.0);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn weighted_tracking_error(target: [f64; 3], poses: &[Pose]) -> f64 {
    poses
        .iter()
        .enumerate()
        .map(|(i, pose)| {
            let d = [
                target[0] - pose[0],
                target[1] - pose[1],
                target[2] - pose[2],
            ];
            let distance = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
            distance * i as f64
        })
        .sum()
}

/// Minimization objective for a wind farm: `-power / 1e7`.
#[must_use]
pub fn farm_power_objective(farm_power: f64) -> f64 {
    -farm_power / FARM_POWER_SCALE
}

/// Lower and upper bound shared by both Langermann coordinates.
pub const LANGERMANN_BOUNDS: (f64, f64) = (-2.0, 10.0);

const LANGERMANN_A: [f64; 5] = [3.0, 5.0, 2.0, 1.0, 7.0];
const LANGERMANN_B: [f64; 5] = [5.0, 2.0, 1.0, 4.0, 9.0];
const LANGERMANN_C: [f64; 5] = [1.0, 2.0, 5.0, 2.0, 3.0];

/// Two-dimensional Langermann function, a multimodal test objective.
#[must_use]
pub fn langermann(x: [f64; 2]) -> f64 {
    let mut f = 0.0;
    for i in 0..5 {
        let r2 = (x[0] - LANGERMANN_A[i]).powi(2) + (x[1] - LANGERMANN_B[i]).powi(2);
        f -= LANGERMANN_C[i] * (-r2 / PI).exp() * (PI * r2).cos();
    }
    f
}

/// Disc constraint paired with [`langermann`]: positive inside the disc of squared radius
/// `20.04895` centered at `(-2, -1)`.
///
/// The value is a margin, positive when feasible. Under pyOpt's `g <= 0` inequality
/// convention the same expression makes the outside of the disc feasible instead, so the
/// sign here is inverted relative to pyOpt.
#[must_use]
pub fn langermann_constraint(x: [f64; 2]) -> f64 {
    20.048_95 - (x[0] + 2.0).powi(2) - (x[1] + 1.0).powi(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose_at(p: [f64; 3]) -> Pose {
        [p[0], p[1], p[2], 0.0, 0.0, 0.0, 1.0]
    }

    #[test]
    fn test_tracking_error_weights_by_step() {
        let target = [2.3, 0.75, 1.5];
        let poses = [
            pose_at([0.0, 0.0, 0.0]),
            pose_at([2.3, 0.75, 0.5]),
            pose_at([2.3, 0.75, 1.5]),
            pose_at([2.3, 0.75, 3.5]),
        ];
        // 0 * d0 + 1 * 1.0 + 2 * 0.0 + 3 * 2.0
        assert!((weighted_tracking_error(target, &poses) - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_tracking_error_empty_episode() {
        assert_eq!(weighted_tracking_error([1.0, 2.0, 3.0], &[]), 0.0);
    }

    #[test]
    fn test_tracking_error_ignores_orientation() {
        let target = [0.0, 0.0, 0.0];
        let a = [pose_at([0.0; 3]), pose_at([3.0, 4.0, 0.0])];
        let mut b = a;
        b[1][3..].copy_from_slice(&[0.5, 0.5, 0.5, 0.5]);
        assert_eq!(
            weighted_tracking_error(target, &a),
            weighted_tracking_error(target, &b)
        );
        assert_eq!(weighted_tracking_error(target, &a), 5.0);
    }

    #[test]
    fn test_farm_power_objective() {
        assert_eq!(farm_power_objective(2.5e7), -2.5);
        assert_eq!(farm_power_objective(0.0), 0.0);
    }

    #[test]
    fn test_langermann_constraint() {
        assert!(langermann_constraint([-2.0, -1.0]) > 0.0);
        assert!(langermann_constraint([10.0, 10.0]) < 0.0);
        assert!((langermann_constraint([0.0, 0.0]) - 15.048_95).abs() < 1e-9);
    }

    #[test]
    fn test_langermann_is_finite_on_domain() {
        let (lo, hi) = LANGERMANN_BOUNDS;
        for i in 0..=12 {
            for j in 0..=12 {
                let x = [
                    lo + (hi - lo) * f64::from(i) / 12.0,
                    lo + (hi - lo) * f64::from(j) / 12.0,
                ];
                assert!(langermann(x).is_finite());
            }
        }
    }

    #[test]
    fn test_langermann_at_center() {
        // at a center the matching term contributes exactly -c
        let at_third = langermann([2.0, 1.0]);
        let others: f64 = (0..5)
            .filter(|&i| i != 2)
            .map(|i| {
                let r2: f64 =
                    (2.0 - LANGERMANN_A[i]).powi(2) + (1.0 - LANGERMANN_B[i]).powi(2);
                -LANGERMANN_C[i] * (-r2 / PI).exp() * (PI * r2).cos()
            })
            .sum();
        assert!((at_third - (-5.0 + others)).abs() < 1e-12);
    }
}
