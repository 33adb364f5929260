//! # rb-optimizer
//!
//! Evaluation bridge between a derivative-free black-box optimizer and a
//! remote cost service.
//!
//! Provides the positional black-box descriptor, the synchronous HTTP client
//! of the remote service, the evaluator session the optimizer calls back
//! into, the evaluation history table, and a session runner tying them
//! together.

mod client;
mod descriptor;
mod driver;
mod evaluator;
mod session;
mod table;

pub use client::{CostService, HttpCostService};
pub use descriptor::{BlackBoxDescriptor, OptimizerSettings, ParameterLayout, VariableType};
pub use driver::{BlackBoxOptimizer, Objective, OptimizationOutcome, RandomSearchOptimizer};
pub use evaluator::{Evaluator, SessionId, SessionState, EVALUATIONS_FILE, REPORT_FILE};
pub use session::{run_session, SessionOutput};
pub use table::EvaluationTable;
