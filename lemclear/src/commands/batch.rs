use crate::IOArgs;
use lem_core::models::{Mechanism, MechanismParams};
use lem_solver::io::{Market, PeriodOutcome, PeriodReport};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{Level, event};

/// Read a market file and clear its periods concurrently.
///
/// Periods share nothing, so each is cleared on the blocking pool. Reports are
/// written in the order of the market file, and a failed period is reported
/// rather than aborting the batch.
pub async fn run(
    io: &IOArgs,
    mechanism: Mechanism,
    params: MechanismParams,
) -> anyhow::Result<()> {
    let market = io.read_json::<Market>()?;
    let params = Arc::new(params);

    let mut tasks = JoinSet::new();
    for (index, period) in market.periods.into_iter().enumerate() {
        let params = params.clone();
        tasks.spawn_blocking(move || (index, period.report(mechanism, &params)));
    }

    let mut reports = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        reports.push(joined?);
    }
    reports.sort_by_key(|(index, _)| *index);
    let reports = reports
        .into_iter()
        .map(|(_, report)| report)
        .collect::<Vec<PeriodReport>>();

    let failed = reports
        .iter()
        .filter(|report| matches!(report.outcome, PeriodOutcome::Error(_)))
        .count();
    event!(
        Level::INFO,
        %mechanism,
        periods = reports.len(),
        failed,
        "batch cleared"
    );

    io.write_json(&reports)
}
