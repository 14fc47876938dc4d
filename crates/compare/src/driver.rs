use crate::CompareConfig;
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};
use tracksym_core::{
    compute_symmetry_with, FallbackMethod, ScoreMethod, SymmetryError, SymmetryResult, TrackPair,
    TrackSet,
};

#[derive(Clone, Debug, PartialEq)]
pub struct PairError {
    pub pair: TrackPair,
    pub stage: ScoreMethod,
    pub source: SymmetryError,
}

impl PairError {
    pub fn code(&self) -> &'static str {
        match self.source {
            SymmetryError::EmptyTrajectory { .. } => "DEGENERATE_INPUT",
            SymmetryError::ScaleUnderflow { .. } => "SCALE_UNDERFLOW",
            SymmetryError::NonFiniteScore { .. } => "NON_FINITE_SCORE",
        }
    }
}

impl fmt::Display for PairError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pair {} failed during {}: {}",
            self.pair,
            self.stage.as_str(),
            self.source
        )
    }
}

impl std::error::Error for PairError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

pub type PairOutcome = Result<SymmetryResult, PairError>;

pub fn score_pair(
    tracks: &TrackSet,
    pair: TrackPair,
    fallback: FallbackMethod,
) -> PairOutcome {
    let first = tracks.get_or_empty(pair.first);
    let second = tracks.get_or_empty(pair.second);
    compute_symmetry_with(&first, &second, fallback).map_err(|source| PairError {
        pair,
        stage: source.stage(),
        source,
    })
}

pub fn compute_all_pairs(
    tracks: &TrackSet,
    config: &CompareConfig,
) -> Result<Vec<SymmetryResult>, PairError> {
    let pairs = config.scenario.pairs();
    let mut results = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let result = score_pair(tracks, pair, config.fallback)?;
        debug!(
            pair = %pair,
            method = result.method.as_str(),
            score = result.score,
            "pair scored"
        );
        results.push(result);
    }
    Ok(results)
}

pub fn compute_pairs_isolated(tracks: &TrackSet, config: &CompareConfig) -> Vec<PairOutcome> {
    config
        .scenario
        .pairs()
        .into_iter()
        .map(|pair| {
            let outcome = score_pair(tracks, pair, config.fallback);
            if let Err(err) = &outcome {
                warn!(pair = %pair, code = err.code(), "{}", err.source);
            }
            outcome
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PairRecord {
    Scored(SymmetryResult),
    Failed {
        pair: TrackPair,
        stage: ScoreMethod,
        code: &'static str,
        message: String,
    },
}

impl From<&PairOutcome> for PairRecord {
    fn from(outcome: &PairOutcome) -> Self {
        match outcome {
            Ok(result) => PairRecord::Scored(*result),
            Err(err) => PairRecord::Failed {
                pair: err.pair,
                stage: err.stage,
                code: err.code(),
                message: err.source.to_string(),
            },
        }
    }
}
