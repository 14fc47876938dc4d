use crate::plot::{self, PlotError};
use crate::{load_session, report, AppError, JsonEnvelope};
use serde_json::json;
use std::path::PathBuf;
use tracing::{info, warn};
use tracksym_compare::{
    compute_all_pairs, compute_pairs_isolated, PairError, PairOutcome, PairRecord,
};
use tracksym_core::FallbackMethod;

pub(super) struct ScoreCommand {
    pub file: PathBuf,
    pub config: Option<PathBuf>,
    pub fallback: Option<FallbackMethod>,
    pub keep_going: bool,
    pub plot: bool,
    pub json_output: bool,
}

pub(super) fn run(command: ScoreCommand) -> Result<JsonEnvelope, AppError> {
    let session = load_session(command.config.as_deref(), &command.file, command.fallback)?;
    let audit = session.audit_trace();
    let tracks = &session.ingest.tracks;
    let config = &session.resolved.config;

    let outcomes: Vec<PairOutcome> = if command.keep_going {
        compute_pairs_isolated(tracks, config)
    } else {
        compute_all_pairs(tracks, config)
            .map_err(|err| AppError::from_pair(&err).with_audit(audit.clone()))?
            .into_iter()
            .map(Ok)
            .collect()
    };

    if !command.json_output {
        for outcome in &outcomes {
            println!("{}", report::format_outcome(outcome));
        }
    }

    let records: Vec<PairRecord> = outcomes.iter().map(PairRecord::from).collect();
    let data = json!({ "pairs": records });

    let failures: Vec<&PairError> = outcomes.iter().filter_map(|o| o.as_ref().err()).collect();
    if let Some(first) = failures.first() {
        return Err(AppError::pair_failed(
            first.code(),
            format!("{} of {} pairs failed", failures.len(), outcomes.len()),
        )
        .with_details(json!({
            "failed": failures
                .iter()
                .map(|f| json!({ "pair": f.pair, "stage": f.stage, "code": f.code() }))
                .collect::<Vec<_>>(),
        }))
        .with_data(data)
        .with_audit(audit));
    }
    info!(
        pairs = outcomes.len(),
        fallback = config.fallback.as_str(),
        "scoring finished"
    );

    if command.plot {
        match plot::show(tracks) {
            Ok(()) => {}
            Err(PlotError::NotATerminal) => warn!("stdout is not a terminal; skipping plot"),
            Err(err) => {
                return Err(AppError::plot_failed(err.to_string()).with_audit(audit));
            }
        }
    }

    Ok(JsonEnvelope {
        status: "OK".to_string(),
        error: None,
        audit_trace: audit,
        data: Some(data),
    })
}
