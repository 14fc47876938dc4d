use crate::Trajectory;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AlignedSample {
    pub x: f64,
    pub y_first: f64,
    pub y_second: f64,
}

#[inline]
fn x_key(x: f64) -> Option<u64> {
    if x.is_nan() {
        None
    } else if x == 0.0 {
        Some(0)
    } else {
        Some(x.to_bits())
    }
}

// Inner join on exact x. One sample per distinct shared x, in `first`'s
// order, each side contributing its first sample at that x.
pub fn align(first: &Trajectory, second: &Trajectory) -> Vec<AlignedSample> {
    let mut second_by_x: HashMap<u64, f64> = HashMap::with_capacity(second.len());
    for p in second.points() {
        if let Some(key) = x_key(p[0]) {
            second_by_x.entry(key).or_insert(p[1]);
        }
    }

    let mut seen: HashSet<u64> = HashSet::new();
    let mut out = Vec::new();
    for p in first.points() {
        let Some(key) = x_key(p[0]) else {
            continue;
        };
        let Some(&y_second) = second_by_x.get(&key) else {
            continue;
        };
        if !seen.insert(key) {
            continue;
        }
        out.push(AlignedSample {
            x: p[0],
            y_first: p[1],
            y_second,
        });
    }
    out
}
