pub const POINT_DIM: usize = 2;

pub type Point2 = [f64; POINT_DIM];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CorrelationError {
    LengthMismatch { left: usize, right: usize },
    Empty,
    NonFinite,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Correlation {
    Defined(f64),
    ZeroVariance { left: bool, right: bool },
}

#[inline]
fn clamp(x: f64, lo: f64, hi: f64) -> f64 {
    if x < lo {
        lo
    } else if x > hi {
        hi
    } else {
        x
    }
}

#[inline]
pub fn clamp_percent(x: f64) -> Option<f64> {
    if x.is_nan() {
        return None;
    }
    Some(clamp(x, 0.0, 100.0))
}

fn mean(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let total: f64 = values.iter().sum();
    if total.is_finite() {
        total / n
    } else {
        values.iter().map(|v| v / n).sum()
    }
}

// Deviations from the mean divided by the largest one, so every sum of
// products below is bounded by the sample count.
fn unit_deviations(values: &[f64]) -> Result<Vec<f64>, CorrelationError> {
    let centre = mean(values);
    let deviations: Vec<f64> = values.iter().map(|v| v - centre).collect();
    let largest = deviations.iter().fold(0.0_f64, |acc, d| acc.max(d.abs()));
    if !largest.is_finite() {
        return Err(CorrelationError::NonFinite);
    }
    if largest == 0.0 {
        return Ok(deviations);
    }
    Ok(deviations.iter().map(|d| d / largest).collect())
}

#[inline]
fn euclidean(p: &Point2, q: &Point2) -> f64 {
    (p[0] - q[0]).hypot(p[1] - q[1])
}

pub fn is_constant(values: &[f64]) -> bool {
    match values.first() {
        Some(first) => values.iter().all(|v| v == first),
        None => true,
    }
}

pub fn pearson_guarded(left: &[f64], right: &[f64]) -> Result<Correlation, CorrelationError> {
    if left.len() != right.len() {
        return Err(CorrelationError::LengthMismatch {
            left: left.len(),
            right: right.len(),
        });
    }
    if left.is_empty() {
        return Err(CorrelationError::Empty);
    }

    let left_flat = is_constant(left);
    let right_flat = is_constant(right);
    if left_flat || right_flat {
        return Ok(Correlation::ZeroVariance {
            left: left_flat,
            right: right_flat,
        });
    }

    let dev_l = unit_deviations(left)?;
    let dev_r = unit_deviations(right)?;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (&dl, &dr) in dev_l.iter().zip(dev_r.iter()) {
        sxy += dl * dr;
        sxx += dl * dl;
        syy += dr * dr;
    }

    // sqrt(sxx * syy) keeps r == 1.0 exact for identical inputs.
    let r = sxy / (sxx * syy).sqrt();
    if !r.is_finite() {
        return Err(CorrelationError::NonFinite);
    }
    Ok(Correlation::Defined(clamp(r, -1.0, 1.0)))
}

pub fn directed_hausdorff(from: &[Point2], to: &[Point2]) -> Option<f64> {
    if from.is_empty() || to.is_empty() {
        return None;
    }
    let mut cmax = 0.0_f64;
    for p in from {
        let mut cmin = f64::INFINITY;
        for q in to {
            let d = euclidean(p, q);
            if d < cmin {
                cmin = d;
                // Cannot raise the running maximum any more.
                if cmin <= cmax {
                    break;
                }
            }
        }
        if cmin > cmax {
            cmax = cmin;
        }
    }
    Some(cmax)
}

pub fn symmetric_hausdorff(a: &[Point2], b: &[Point2]) -> Option<f64> {
    let forward = directed_hausdorff(a, b)?;
    let backward = directed_hausdorff(b, a)?;
    Some(forward.max(backward))
}

// Mean of |y_p - y_q| where q is the first point of `to` whose x is closest
// to p's x, over every p in `from`.
pub fn nearest_x_mean_abs_dy(from: &[Point2], to: &[Point2]) -> Option<f64> {
    if from.is_empty() || to.is_empty() {
        return None;
    }
    let mut total = 0.0;
    for p in from {
        let mut best = &to[0];
        let mut best_dx = (to[0][0] - p[0]).abs();
        for q in to.iter().skip(1) {
            let dx = (q[0] - p[0]).abs();
            if dx < best_dx {
                best_dx = dx;
                best = q;
            }
        }
        total += (p[1] - best[1]).abs();
    }
    Some(total / from.len() as f64)
}

pub fn symmetric_nearest_x_mean_abs_dy(a: &[Point2], b: &[Point2]) -> Option<f64> {
    let forward = nearest_x_mean_abs_dy(a, b)?;
    let backward = nearest_x_mean_abs_dy(b, a)?;
    Some(forward.max(backward))
}

pub fn max_coordinate(sets: &[&[Point2]]) -> Option<f64> {
    sets.iter()
        .flat_map(|set| set.iter())
        .flat_map(|p| p.iter().copied())
        .reduce(f64::max)
}

pub fn max_ordinate(sets: &[&[Point2]]) -> Option<f64> {
    sets.iter()
        .flat_map(|set| set.iter())
        .map(|p| p[1])
        .reduce(f64::max)
}
