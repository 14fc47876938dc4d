use crate::align::{align, AlignedSample};
use crate::Trajectory;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use tracksym_metrics::{
    clamp_percent, max_coordinate, max_ordinate, pearson_guarded, symmetric_hausdorff,
    symmetric_nearest_x_mean_abs_dy, Correlation, CorrelationError,
};
use tracksym_trackspec::TrackId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreMethod {
    Correlation,
    Distance,
}

impl ScoreMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Correlation => "correlation",
            Self::Distance => "distance",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FallbackMethod {
    #[default]
    #[serde(rename = "hausdorff")]
    Hausdorff,
    #[serde(rename = "nearest-neighbor")]
    NearestNeighborMeanDifference,
}

impl FallbackMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hausdorff => "hausdorff",
            Self::NearestNeighborMeanDifference => "nearest-neighbor",
        }
    }
}

impl FromStr for FallbackMethod {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "hausdorff" => Ok(Self::Hausdorff),
            "nearest-neighbor" | "nearest_neighbor" | "nn" => {
                Ok(Self::NearestNeighborMeanDifference)
            }
            other => Err(format!(
                "unknown fallback method {:?} (expected hausdorff or nearest-neighbor)",
                other
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FallbackReason {
    NoOverlap,
    ZeroVariance { first: bool, second: bool },
    ZeroCorrelation,
    NonFiniteCorrelation,
}

impl FallbackReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoOverlap => "no_overlap",
            Self::ZeroVariance { .. } => "zero_variance",
            Self::ZeroCorrelation => "zero_correlation",
            Self::NonFiniteCorrelation => "non_finite_correlation",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fallback {
    pub reason: FallbackReason,
    pub metric: FallbackMethod,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CorrelationAttempt {
    Score(f64),
    Fallback(FallbackReason),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Score {
    pub value: f64,
    pub method: ScoreMethod,
    pub fallback: Option<Fallback>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SymmetryError {
    EmptyTrajectory { track: TrackId },
    ScaleUnderflow { scale: f64 },
    NonFiniteScore { distance: f64, scale: f64 },
}

impl SymmetryError {
    pub fn stage(&self) -> ScoreMethod {
        ScoreMethod::Distance
    }
}

impl fmt::Display for SymmetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTrajectory { track } => write!(f, "trajectory {} is empty", track),
            Self::ScaleUnderflow { scale } => {
                write!(f, "normalization scale is {}; distance cannot be scaled", scale)
            }
            Self::NonFiniteScore { distance, scale } => write!(
                f,
                "distance {} against scale {} does not give a finite score",
                distance, scale
            ),
        }
    }
}

impl std::error::Error for SymmetryError {}

pub fn attempt_correlation(aligned: &[AlignedSample]) -> CorrelationAttempt {
    let y_first: Vec<f64> = aligned.iter().map(|s| s.y_first).collect();
    let y_second: Vec<f64> = aligned.iter().map(|s| s.y_second).collect();

    // Both columns come from the same join, so their lengths always match.
    let correlation = match pearson_guarded(&y_first, &y_second) {
        Ok(correlation) => correlation,
        Err(CorrelationError::NonFinite) => {
            return CorrelationAttempt::Fallback(FallbackReason::NonFiniteCorrelation);
        }
        Err(_) => return CorrelationAttempt::Fallback(FallbackReason::NoOverlap),
    };

    match correlation {
        Correlation::ZeroVariance { left, right } => {
            CorrelationAttempt::Fallback(FallbackReason::ZeroVariance {
                first: left,
                second: right,
            })
        }
        Correlation::Defined(r) => match clamp_percent(r.abs() * 100.0) {
            None => CorrelationAttempt::Fallback(FallbackReason::NonFiniteCorrelation),
            Some(candidate) if candidate == 0.0 => {
                CorrelationAttempt::Fallback(FallbackReason::ZeroCorrelation)
            }
            Some(candidate) => CorrelationAttempt::Score(candidate),
        },
    }
}

fn ensure_non_empty(track: &Trajectory) -> Result<(), SymmetryError> {
    if track.is_empty() {
        return Err(SymmetryError::EmptyTrajectory { track: track.id() });
    }
    Ok(())
}

// A negative scale is kept signed and the result clamped; only zero fails.
fn normalize(distance: f64, scale: f64) -> Result<f64, SymmetryError> {
    if scale == 0.0 {
        return Err(SymmetryError::ScaleUnderflow { scale });
    }
    clamp_percent((1.0 - distance / scale) * 100.0)
        .ok_or(SymmetryError::NonFiniteScore { distance, scale })
}

pub fn distance_score(
    first: &Trajectory,
    second: &Trajectory,
    metric: FallbackMethod,
) -> Result<f64, SymmetryError> {
    ensure_non_empty(first)?;
    ensure_non_empty(second)?;
    let (a, b) = (first.points(), second.points());

    let (distance, scale) = match metric {
        FallbackMethod::Hausdorff => (symmetric_hausdorff(a, b), max_coordinate(&[a, b])),
        FallbackMethod::NearestNeighborMeanDifference => (
            symmetric_nearest_x_mean_abs_dy(a, b),
            max_ordinate(&[a, b]),
        ),
    };
    match (distance, scale) {
        (Some(distance), Some(scale)) => normalize(distance, scale),
        _ => Err(SymmetryError::EmptyTrajectory {
            track: empty_side(first, second),
        }),
    }
}

fn empty_side(first: &Trajectory, second: &Trajectory) -> TrackId {
    if first.is_empty() {
        first.id()
    } else {
        second.id()
    }
}

pub fn score(
    first: &Trajectory,
    second: &Trajectory,
    metric: FallbackMethod,
) -> Result<Score, SymmetryError> {
    let aligned = align(first, second);
    let reason = if aligned.is_empty() {
        FallbackReason::NoOverlap
    } else {
        match attempt_correlation(&aligned) {
            CorrelationAttempt::Score(value) => {
                debug!(
                    first = first.id(),
                    second = second.id(),
                    aligned = aligned.len(),
                    value,
                    "scored by correlation"
                );
                return Ok(Score {
                    value,
                    method: ScoreMethod::Correlation,
                    fallback: None,
                });
            }
            CorrelationAttempt::Fallback(reason) => reason,
        }
    };

    debug!(
        first = first.id(),
        second = second.id(),
        reason = reason.as_str(),
        metric = metric.as_str(),
        "falling back to distance"
    );
    let value = distance_score(first, second, metric)?;
    Ok(Score {
        value,
        method: ScoreMethod::Distance,
        fallback: Some(Fallback { reason, metric }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn track(id: u32, points: &[[f64; 2]]) -> Trajectory {
        Trajectory::new(id, points.to_vec()).expect("finite")
    }

    #[test]
    fn correlation_used_when_aligned_and_varying() {
        let a = track(1, &[[0.0, 1.0], [1.0, 3.0], [2.0, 2.0]]);
        let s = score(&a, &a, FallbackMethod::Hausdorff).expect("score");
        assert_eq!(s.method, ScoreMethod::Correlation);
        assert_eq!(s.value, 100.0);
        assert!(s.fallback.is_none());
    }

    #[test]
    fn negative_correlation_scores_by_magnitude() {
        let a = track(1, &[[0.0, 1.0], [1.0, 2.0], [2.0, 3.0]]);
        let b = track(2, &[[0.0, 3.0], [1.0, 2.0], [2.0, 1.0]]);
        let s = score(&a, &b, FallbackMethod::Hausdorff).expect("score");
        assert_eq!(s.method, ScoreMethod::Correlation);
        assert_abs_diff_eq!(s.value, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn zero_variance_falls_back_with_tag() {
        let flat = track(1, &[[0.0, 5.0], [1.0, 5.0], [2.0, 5.0]]);
        let rising = track(2, &[[0.0, 4.0], [1.0, 5.0], [2.0, 6.0]]);
        let s = score(&flat, &rising, FallbackMethod::Hausdorff).expect("score");
        assert_eq!(s.method, ScoreMethod::Distance);
        assert_eq!(
            s.fallback,
            Some(Fallback {
                reason: FallbackReason::ZeroVariance {
                    first: true,
                    second: false
                },
                metric: FallbackMethod::Hausdorff,
            })
        );
        // Hausdorff is 1 (vertical offsets), scale is 6.
        assert_abs_diff_eq!(s.value, (1.0 - 1.0 / 6.0) * 100.0, epsilon = 1e-9);
    }

    #[test]
    fn zero_correlation_falls_back_with_tag() {
        let a = track(1, &[[1.0, 0.0], [2.0, 2.0], [3.0, 2.0], [4.0, 0.0]]);
        let b = track(2, &[[1.0, 0.0], [2.0, 0.0], [3.0, 2.0], [4.0, 2.0]]);
        let s = score(&a, &b, FallbackMethod::Hausdorff).expect("score");
        assert_eq!(s.method, ScoreMethod::Distance);
        assert_eq!(
            s.fallback.map(|f| f.reason),
            Some(FallbackReason::ZeroCorrelation)
        );
    }

    #[test]
    fn no_overlap_uses_distance() {
        let a = track(1, &[[0.0, 0.0], [10.0, 10.0]]);
        let b = track(2, &[[0.5, 0.0], [10.5, 10.0]]);
        let s = score(&a, &b, FallbackMethod::Hausdorff).expect("score");
        assert_eq!(s.method, ScoreMethod::Distance);
        assert_eq!(
            s.fallback.map(|f| f.reason),
            Some(FallbackReason::NoOverlap)
        );
        assert_abs_diff_eq!(s.value, (1.0 - 0.5 / 10.5) * 100.0, epsilon = 1e-9);
    }

    #[test]
    fn empty_side_is_degenerate() {
        let a = track(1, &[[0.0, 1.0]]);
        assert_eq!(
            score(&a, &Trajectory::empty(4), FallbackMethod::Hausdorff),
            Err(SymmetryError::EmptyTrajectory { track: 4 })
        );
        assert_eq!(
            score(&Trajectory::empty(3), &Trajectory::empty(4), FallbackMethod::Hausdorff),
            Err(SymmetryError::EmptyTrajectory { track: 3 })
        );
    }

    #[test]
    fn all_zero_coordinates_underflow() {
        let a = track(1, &[[0.0, 0.0]]);
        let b = track(2, &[[0.0, 0.0], [0.0, 0.0]]);
        let err = score(&a, &b, FallbackMethod::Hausdorff).expect_err("scale 0");
        assert_eq!(err, SymmetryError::ScaleUnderflow { scale: 0.0 });
        assert_eq!(err.stage(), ScoreMethod::Distance);
    }

    #[test]
    fn negative_scale_is_clamped_not_rejected() {
        let a = track(1, &[[-10.0, -20.0], [-5.0, -15.0]]);
        let b = track(2, &[[-10.5, -20.0], [-5.5, -15.0]]);
        // Hausdorff 0.5 against scale -5 gives 110, clamped to 100.
        assert_eq!(distance_score(&a, &b, FallbackMethod::Hausdorff), Ok(100.0));
        let s = score(&a, &b, FallbackMethod::Hausdorff).expect("score");
        assert_eq!(s.method, ScoreMethod::Distance);
        assert_eq!(s.value, 100.0);
    }

    #[test]
    fn normalize_refuses_nan() {
        assert!(matches!(
            normalize(f64::NAN, 10.0),
            Err(SymmetryError::NonFiniteScore { .. })
        ));
        assert_eq!(normalize(f64::INFINITY, 10.0), Ok(0.0));
        assert_eq!(
            normalize(1.0, 0.0),
            Err(SymmetryError::ScaleUnderflow { scale: 0.0 })
        );
    }

    #[test]
    fn empty_side_is_never_scored_as_zero_distance() {
        let a = track(1, &[[0.0, 1.0]]);
        for metric in [
            FallbackMethod::Hausdorff,
            FallbackMethod::NearestNeighborMeanDifference,
        ] {
            assert_eq!(
                distance_score(&a, &Trajectory::empty(7), metric),
                Err(SymmetryError::EmptyTrajectory { track: 7 })
            );
            assert_eq!(
                distance_score(&Trajectory::empty(6), &a, metric),
                Err(SymmetryError::EmptyTrajectory { track: 6 })
            );
        }
    }

    #[test]
    fn huge_magnitudes_keep_correlation_in_range() {
        for unit in [1e80, 1e160] {
            let a = track(1, &[[0.0, unit], [1.0, 2.0 * unit], [2.0, 3.0 * unit]]);
            let s = score(&a, &a, FallbackMethod::Hausdorff).expect("score");
            assert_eq!(s.method, ScoreMethod::Correlation);
            assert_eq!(s.value, 100.0);
            assert!(s.fallback.is_none());
        }
    }

    #[test]
    fn overflowing_correlation_is_tagged() {
        let a = track(1, &[[0.0, f64::MAX], [1.0, -f64::MAX], [2.0, f64::MAX]]);
        let b = track(2, &[[0.0, 1.0], [1.0, 2.0], [2.0, 3.0]]);
        let s = score(&a, &b, FallbackMethod::Hausdorff).expect("score");
        assert_eq!(s.method, ScoreMethod::Distance);
        assert_eq!(
            s.fallback.map(|f| f.reason),
            Some(FallbackReason::NonFiniteCorrelation)
        );
        assert!((0.0..=100.0).contains(&s.value));
    }

    #[test]
    fn distance_score_clamps_at_zero() {
        let a = track(1, &[[0.0, 0.0]]);
        let b = track(2, &[[1.0, 50.0]]);
        // Hausdorff ~50.01 exceeds scale 50.
        assert_eq!(distance_score(&a, &b, FallbackMethod::Hausdorff), Ok(0.0));
    }

    #[test]
    fn nearest_neighbor_variant() {
        let a = track(1, &[[0.0, 10.0], [2.0, 10.0]]);
        let b = track(2, &[[0.5, 8.0], [2.5, 12.0]]);
        // Both directions give mean |dy| = 2; max y = 12.
        let value =
            distance_score(&a, &b, FallbackMethod::NearestNeighborMeanDifference).expect("score");
        assert_abs_diff_eq!(value, (1.0 - 2.0 / 12.0) * 100.0, epsilon = 1e-9);
        let swapped =
            distance_score(&b, &a, FallbackMethod::NearestNeighborMeanDifference).expect("score");
        assert_eq!(value, swapped);
    }

    #[test]
    fn fallback_method_parsing() {
        assert_eq!("hausdorff".parse::<FallbackMethod>(), Ok(FallbackMethod::Hausdorff));
        assert_eq!(
            " Nearest-Neighbor ".parse::<FallbackMethod>(),
            Ok(FallbackMethod::NearestNeighborMeanDifference)
        );
        assert!("median".parse::<FallbackMethod>().is_err());
    }
}
