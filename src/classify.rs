use serde::{Deserialize, Serialize};

pub const IDENTICAL_SCORE: f64 = 100.0;
pub const MINOR_DIFFERENCE_MIN: f64 = 90.0;
pub const SIGNIFICANT_DIFFERENCE_MAX: f64 = 30.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SymmetryLabel {
    Identical,
    MinorDifference,
    Differs,
    SignificantDifference,
}

impl SymmetryLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Identical => "identical",
            Self::MinorDifference => "minor-difference",
            Self::Differs => "differs",
            Self::SignificantDifference => "significant-difference",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Identical => "trajectories fully coincide",
            Self::MinorDifference => "minor difference between trajectories",
            Self::Differs => "trajectories differ",
            Self::SignificantDifference => "significant difference between trajectories",
        }
    }
}

pub fn classify(score: f64) -> SymmetryLabel {
    if score == IDENTICAL_SCORE {
        SymmetryLabel::Identical
    } else if score >= MINOR_DIFFERENCE_MIN {
        SymmetryLabel::MinorDifference
    } else if score <= SIGNIFICANT_DIFFERENCE_MAX {
        SymmetryLabel::SignificantDifference
    } else {
        SymmetryLabel::Differs
    }
}
