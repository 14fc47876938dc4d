mod align;
mod classify;
mod score;
mod trajectory;

use serde::{Deserialize, Serialize};

pub use align::{align, AlignedSample};
pub use classify::{
    classify, SymmetryLabel, IDENTICAL_SCORE, MINOR_DIFFERENCE_MIN, SIGNIFICANT_DIFFERENCE_MAX,
};
pub use score::{
    attempt_correlation, distance_score, score, CorrelationAttempt, Fallback, FallbackMethod,
    FallbackReason, Score, ScoreMethod, SymmetryError,
};
pub use trajectory::{TrackSet, Trajectory, TrajectoryError};
pub use tracksym_metrics::Point2;
pub use tracksym_trackspec::{TrackId, TrackPair};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SymmetryResult {
    pub pair: TrackPair,
    pub method: ScoreMethod,
    pub score: f64,
    pub label: SymmetryLabel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<Fallback>,
}

pub fn compute_symmetry(
    first: &Trajectory,
    second: &Trajectory,
) -> Result<SymmetryResult, SymmetryError> {
    compute_symmetry_with(first, second, FallbackMethod::default())
}

pub fn compute_symmetry_with(
    first: &Trajectory,
    second: &Trajectory,
    metric: FallbackMethod,
) -> Result<SymmetryResult, SymmetryError> {
    let Score {
        value,
        method,
        fallback,
    } = score(first, second, metric)?;
    Ok(SymmetryResult {
        pair: TrackPair::new(first.id(), second.id()),
        method,
        score: value,
        label: classify(value),
        fallback,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn track(id: TrackId, points: Vec<Point2>) -> Trajectory {
        Trajectory::new(id, points).expect("finite")
    }

    fn wavy(id: TrackId) -> Trajectory {
        track(
            id,
            (0..12)
                .map(|i| {
                    let x = i as f64 * 0.5;
                    [x, (x * 1.3).sin() * 4.0 + 0.25 * x]
                })
                .collect(),
        )
    }

    // Square loop of side 80 offset so the largest coordinate is exactly 100.
    fn loop_track(id: TrackId, offset: f64, x_shift: f64) -> Trajectory {
        let base = [
            [20.0, 20.0],
            [100.0, 20.0],
            [100.0, 100.0],
            [20.0, 100.0],
        ];
        track(
            id,
            base.iter()
                .map(|p| [p[0] - offset + x_shift, p[1] - offset])
                .collect(),
        )
    }

    #[test]
    fn self_symmetry_is_identical() {
        let a = wavy(1);
        let result = compute_symmetry(&a, &a).expect("score");
        assert_eq!(result.score, 100.0);
        assert_eq!(result.label, SymmetryLabel::Identical);
        assert_eq!(result.method, ScoreMethod::Correlation);
    }

    #[test]
    fn symmetric_in_arguments() {
        let a = wavy(1);
        let b = track(
            2,
            a.points()
                .iter()
                .map(|p| [p[0], p[1] * p[1] - 3.0])
                .collect(),
        );
        let ab = compute_symmetry(&a, &b).expect("ab");
        let ba = compute_symmetry(&b, &a).expect("ba");
        assert_eq!(ab.method, ScoreMethod::Correlation);
        assert_abs_diff_eq!(ab.score, ba.score, epsilon = 1e-12);

        let c = loop_track(3, 0.0, 0.25);
        let d = loop_track(4, 10.0, 0.0);
        let cd = compute_symmetry(&c, &d).expect("cd");
        let dc = compute_symmetry(&d, &c).expect("dc");
        assert_eq!(cd.method, ScoreMethod::Distance);
        assert_eq!(cd.score, dc.score);
    }

    #[test]
    fn scores_stay_in_percent_range() {
        let tracks = [
            wavy(1),
            loop_track(2, 0.0, 0.1),
            loop_track(3, 60.0, 0.0),
            track(4, vec![[0.0, 3.0], [0.5, 3.0], [1.0, 3.0]]),
        ];
        for a in &tracks {
            for b in &tracks {
                let result = compute_symmetry(a, b).expect("score");
                assert!((0.0..=100.0).contains(&result.score), "{:?}", result);
            }
        }
    }

    #[test]
    fn flat_track_falls_back_to_distance() {
        let flat = track(1, vec![[0.0, 2.0], [1.0, 2.0], [2.0, 2.0]]);
        let other = track(2, vec![[0.0, 1.0], [1.0, 4.0], [2.0, 3.0]]);
        let result = compute_symmetry(&flat, &other).expect("score");
        assert_eq!(result.method, ScoreMethod::Distance);
        assert!(matches!(
            result.fallback.map(|f| f.reason),
            Some(FallbackReason::ZeroVariance { first: true, .. })
        ));
        assert!(result.score.is_finite());
    }

    #[test]
    fn unaligned_loops_use_distance() {
        // No shared x; every corner sits sqrt(100.25) from its partner.
        let a = track(
            1,
            vec![[20.0, 30.0], [100.0, 30.0], [100.0, 100.0], [20.0, 100.0]],
        );
        let b = track(
            2,
            vec![[20.5, 20.0], [100.5, 20.0], [99.5, 90.0], [19.5, 90.0]],
        );
        let result = compute_symmetry(&a, &b).expect("score");
        assert_eq!(result.method, ScoreMethod::Distance);
        assert_eq!(result.pair, TrackPair::new(1, 2));
        assert_abs_diff_eq!(
            result.score,
            100.0 * (1.0 - (100.25_f64).sqrt() / 100.5),
            epsilon = 1e-9
        );
        assert_eq!(result.label, SymmetryLabel::MinorDifference);
    }

    #[test]
    fn both_empty_fails_explicitly() {
        let err = compute_symmetry(&Trajectory::empty(1), &Trajectory::empty(2))
            .expect_err("must fail");
        assert_eq!(err, SymmetryError::EmptyTrajectory { track: 1 });
    }
}
