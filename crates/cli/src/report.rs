use tracksym_compare::{PairError, PairOutcome};
use tracksym_core::SymmetryResult;

pub(super) fn format_result(result: &SymmetryResult) -> String {
    format!(
        "symmetry between tracks {} and {} (method {}): {:.2}%, verdict: {} ({})",
        result.pair.first,
        result.pair.second,
        result.method.as_str(),
        result.score,
        result.label.as_str(),
        result.label.description()
    )
}

pub(super) fn format_failure(err: &PairError) -> String {
    format!(
        "symmetry between tracks {} and {} failed during {} [{}]: {}",
        err.pair.first,
        err.pair.second,
        err.stage.as_str(),
        err.code(),
        err.source
    )
}

pub(super) fn format_outcome(outcome: &PairOutcome) -> String {
    match outcome {
        Ok(result) => format_result(result),
        Err(err) => format_failure(err),
    }
}
