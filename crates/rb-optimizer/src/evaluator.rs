//! Evaluation session: the callback the optimizer drives, plus the
//! bookkeeping around it.

use rb_types::{
    BridgeResult, Cost, EvaluationRecord, Parameter, Report, SessionError,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::client::CostService;
use crate::descriptor::{BlackBoxDescriptor, ParameterLayout};
use crate::driver::{Objective, OptimizationOutcome};
use crate::table::EvaluationTable;

pub const EVALUATIONS_FILE: &str = "evaluations.csv";
pub const REPORT_FILE: &str = "report.json";

/// Unique session identifier, used to correlate log lines.
pub type SessionId = Uuid;

/// Lifecycle of an evaluation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Configured,
    Evaluating,
    Reported,
    Dumped,
}

/// Bridges optimizer callbacks to a [`CostService`] and keeps the
/// append-only evaluation history of one session.
#[derive(Debug)]
pub struct Evaluator<S: CostService> {
    id: SessionId,
    bounds: Vec<Parameter>,
    layout: ParameterLayout,
    service: S,
    root_dir: PathBuf,
    history: Vec<EvaluationRecord>,
    iterations: usize,
    report: Option<Report>,
    state: SessionState,
}

impl<S: CostService> Evaluator<S> {
    pub fn new<P: AsRef<Path>>(descriptor: &BlackBoxDescriptor, service: S, root_dir: P) -> Self {
        let id = Uuid::new_v4();
        info!(
            "Session {} configured with {} parameters",
            id,
            descriptor.dimension()
        );

        Self {
            id,
            bounds: descriptor.parameters().to_vec(),
            layout: descriptor.layout().clone(),
            service,
            root_dir: root_dir.as_ref().to_path_buf(),
            history: Vec::new(),
            iterations: 0,
            report: None,
            state: SessionState::Configured,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn history(&self) -> &[EvaluationRecord] {
        &self.history
    }

    pub fn report(&self) -> Option<&Report> {
        self.report.as_ref()
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Evaluate one candidate on the remote side and record the result.
    ///
    /// On failure nothing is recorded and the iteration counter is left as
    /// it was.
    pub fn estimate_cost(&mut self, vector: &[f64]) -> BridgeResult<Cost> {
        let iteration = self.iterations + 1;
        let values = self.layout.to_values(vector)?;

        if self.report.is_some() {
            warn!(
                "Session {}: evaluation {} after the report was registered; report statistics are stale",
                self.id, iteration
            );
        }

        let outcome = self.service.estimate_cost(&values)?;

        debug!(
            "Session {}: iteration {} cost {} invalid {}",
            self.id,
            iteration,
            outcome.cost(),
            outcome.is_invalid()
        );

        self.iterations = iteration;
        self.history.push(EvaluationRecord {
            iteration,
            values,
            outcome,
        });
        if self.state == SessionState::Configured {
            self.state = SessionState::Evaluating;
        }

        Ok(outcome.cost())
    }

    /// Build the final report from the optimizer's outcome, post it and keep
    /// it. Only one report may be registered per session.
    pub fn register_report(&mut self, outcome: &OptimizationOutcome) -> BridgeResult<()> {
        if self.report.is_some() {
            return Err(SessionError::ReportAlreadyRegistered.into());
        }

        let optimum = self.layout.to_values(&outcome.optimum)?;
        let report = Report::new(
            self.bounds.clone(),
            optimum,
            outcome.cost,
            outcome.statistics(),
        )?;

        self.service.register_report(&report)?;

        info!(
            "Session {}: report registered, cost {} after {} evaluations",
            self.id,
            report.cost(),
            report.evaluations()
        );

        self.report = Some(report);
        self.state = SessionState::Reported;
        Ok(())
    }

    /// The history as a table, ordered by iteration.
    pub fn table(&self) -> EvaluationTable {
        EvaluationTable::new(self.layout.names().to_vec(), self.history.clone())
    }

    /// Persist `evaluations.csv` and `report.json` into the root directory
    /// and return both.
    pub fn dump(&mut self) -> BridgeResult<(EvaluationTable, Report)> {
        let report = self
            .report
            .clone()
            .ok_or(SessionError::ReportNotRegistered)?;

        std::fs::create_dir_all(&self.root_dir)?;

        let table = self.table();
        let evaluations_path = self.root_dir.join(EVALUATIONS_FILE);
        table.write_csv(&evaluations_path)?;

        let report_path = self.root_dir.join(REPORT_FILE);
        report.save_to_file(&report_path)?;

        info!(
            "Session {}: dumped {} evaluations to {}",
            self.id,
            table.len(),
            self.root_dir.display()
        );

        self.state = SessionState::Dumped;
        Ok((table, report))
    }
}

impl<S: CostService> Objective for Evaluator<S> {
    fn evaluate(&mut self, point: &[f64]) -> BridgeResult<Cost> {
        self.estimate_cost(point)
    }
}
