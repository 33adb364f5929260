//! One complete optimization session, from configuration to dump.

use chrono::{DateTime, Utc};
use rb_types::{BridgeResult, OptimizerConfig, Report};
use std::path::Path;
use tracing::info;

use crate::client::CostService;
use crate::descriptor::BlackBoxDescriptor;
use crate::driver::BlackBoxOptimizer;
use crate::evaluator::{Evaluator, SessionId};
use crate::table::EvaluationTable;

/// Everything a session hands to downstream consumers (e.g. plot rendering).
#[derive(Debug, Clone)]
pub struct SessionOutput {
    pub id: SessionId,
    pub table: EvaluationTable,
    pub report: Report,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SessionOutput {
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}

/// Drive `optimizer` against `service` until it terminates, then register
/// and dump the report under `root_dir`.
///
/// Any error aborts the session; nothing is retried.
pub fn run_session<S, O, P>(
    config: &OptimizerConfig,
    service: S,
    optimizer: &mut O,
    root_dir: P,
) -> BridgeResult<SessionOutput>
where
    S: CostService,
    O: BlackBoxOptimizer + ?Sized,
    P: AsRef<Path>,
{
    let started_at = Utc::now();
    let descriptor = BlackBoxDescriptor::new(config)?;
    let mut evaluator = Evaluator::new(&descriptor, service, root_dir);

    info!(
        "Session {} starting with optimizer '{}'",
        evaluator.session_id(),
        optimizer.name()
    );

    let outcome = optimizer.optimize(&descriptor, &mut evaluator)?;
    evaluator.register_report(&outcome)?;
    let (table, report) = evaluator.dump()?;

    let output = SessionOutput {
        id: evaluator.session_id(),
        table,
        report,
        started_at,
        finished_at: Utc::now(),
    };

    info!(
        "Session {} finished in {}s: optimum cost {} over {} evaluations",
        output.id,
        output.duration_seconds(),
        output.report.cost(),
        output.table.len()
    );

    Ok(output)
}
