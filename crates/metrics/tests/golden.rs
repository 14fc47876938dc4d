use approx::assert_abs_diff_eq;
use tracksym_metrics::{
    directed_hausdorff, max_coordinate, nearest_x_mean_abs_dy, pearson_guarded,
    symmetric_hausdorff, symmetric_nearest_x_mean_abs_dy, Correlation, Point2,
};

fn square(offset: f64) -> Vec<Point2> {
    vec![
        [offset, offset],
        [offset + 10.0, offset],
        [offset + 10.0, offset + 10.0],
        [offset, offset + 10.0],
    ]
}

#[test]
fn g1_identical_series_correlate_exactly() {
    let y = [0.3, -1.7, 2.25, 8.0, 4.125];
    match pearson_guarded(&y, &y).expect("must correlate") {
        Correlation::Defined(r) => assert_eq!(r, 1.0),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn g2_affine_relation_is_perfect() {
    let y4 = [0.0, 1.0, 2.0, 3.0, 4.0];
    let y3: Vec<f64> = y4.iter().map(|v| 2.0 * v + 5.0).collect();
    match pearson_guarded(&y3, &y4).expect("must correlate") {
        Correlation::Defined(r) => assert_eq!(r, 1.0),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn g3_inverse_relation_is_minus_one() {
    let a = [1.0, 2.0, 3.0, 4.0];
    let b = [8.0, 6.0, 4.0, 2.0];
    match pearson_guarded(&a, &b).expect("must correlate") {
        Correlation::Defined(r) => assert_abs_diff_eq!(r, -1.0, epsilon = 1e-12),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn g4_orthogonal_series_are_uncorrelated() {
    // Deviations (-1, 1, 1, -1) and (-1, -1, 1, 1) have a zero dot product.
    let a = [0.0, 2.0, 2.0, 0.0];
    let b = [0.0, 0.0, 2.0, 2.0];
    match pearson_guarded(&a, &b).expect("must correlate") {
        Correlation::Defined(r) => assert_eq!(r, 0.0),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn g5_known_coefficient() {
    let a = [1.0, 2.0, 3.0, 4.0, 5.0];
    let b = [2.0, 4.0, 5.0, 4.0, 5.0];
    // sxy = 6, sxx = 10, syy = 6
    let expected = 6.0 / (60.0_f64).sqrt();
    match pearson_guarded(&a, &b).expect("must correlate") {
        Correlation::Defined(r) => assert_abs_diff_eq!(r, expected, epsilon = 1e-12),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn g6_huge_magnitudes_still_correlate() {
    let huge = [1e160, 2e160, 3e160];
    let large = [1e80, 2e80, 3e80];
    for y in [&huge[..], &large[..]] {
        match pearson_guarded(y, y).expect("must correlate") {
            Correlation::Defined(r) => assert_eq!(r, 1.0),
            other => panic!("unexpected {:?}", other),
        }
    }
    match pearson_guarded(&huge, &[4e-200, 5e-200, 6e-200]).expect("must correlate") {
        Correlation::Defined(r) => assert_abs_diff_eq!(r, 1.0, epsilon = 1e-12),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn h1_shifted_square() {
    let a = square(0.0);
    let b = square(3.0);
    let d = symmetric_hausdorff(&a, &b).expect("non-empty");
    assert_abs_diff_eq!(d, (18.0_f64).sqrt(), epsilon = 1e-12);
}

#[test]
fn h2_directed_is_asymmetric() {
    let a: Vec<Point2> = vec![[0.0, 0.0]];
    let b: Vec<Point2> = vec![[0.0, 0.0], [30.0, 40.0]];
    assert_abs_diff_eq!(directed_hausdorff(&a, &b).unwrap(), 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(directed_hausdorff(&b, &a).unwrap(), 50.0, epsilon = 1e-12);
    assert_abs_diff_eq!(symmetric_hausdorff(&a, &b).unwrap(), 50.0, epsilon = 1e-12);
    assert_abs_diff_eq!(symmetric_hausdorff(&b, &a).unwrap(), 50.0, epsilon = 1e-12);
}

#[test]
fn h3_self_distance_is_zero() {
    let a = square(-4.5);
    assert_eq!(symmetric_hausdorff(&a, &a), Some(0.0));
}

#[test]
fn h4_far_apart_points_stay_finite() {
    let a: Vec<Point2> = vec![[0.0, 0.0]];
    let b: Vec<Point2> = vec![[3e200, 4e200]];
    assert_abs_diff_eq!(
        symmetric_hausdorff(&a, &b).unwrap() / 1e200,
        5.0,
        epsilon = 1e-12
    );
}

#[test]
fn n1_nearest_x_picks_first_on_ties() {
    let from: Vec<Point2> = vec![[1.0, 10.0]];
    // Both candidates are 1.0 away in x; the first one wins.
    let to: Vec<Point2> = vec![[0.0, 4.0], [2.0, 100.0]];
    assert_abs_diff_eq!(
        nearest_x_mean_abs_dy(&from, &to).unwrap(),
        6.0,
        epsilon = 1e-12
    );
}

#[test]
fn n2_symmetric_variant_takes_larger_direction() {
    let a: Vec<Point2> = vec![[0.0, 0.0], [10.0, 0.0]];
    let b: Vec<Point2> = vec![[0.0, 2.0], [5.0, 8.0], [10.0, 2.0]];
    // a -> b: |0-2|, |0-2| => 2
    // b -> a: 2, 8 (x=5 ties, first point wins), 2 => 4
    assert_abs_diff_eq!(nearest_x_mean_abs_dy(&a, &b).unwrap(), 2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(nearest_x_mean_abs_dy(&b, &a).unwrap(), 4.0, epsilon = 1e-12);
    assert_abs_diff_eq!(
        symmetric_nearest_x_mean_abs_dy(&a, &b).unwrap(),
        4.0,
        epsilon = 1e-12
    );
}

#[test]
fn s1_scale_spans_both_axes() {
    let a: Vec<Point2> = vec![[1.0, 100.0]];
    let b: Vec<Point2> = vec![[250.0, -3.0]];
    assert_eq!(max_coordinate(&[&a, &b]), Some(250.0));
}
