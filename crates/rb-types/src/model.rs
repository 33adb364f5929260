//! Parameter space and evaluation value types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ConfigError;

/// Value returned by the remote cost function.
pub type Cost = f64;

pub const ITERATION_COLUMN: &str = "iteration";
pub const COST_COLUMN: &str = "cost";
pub const INVALID_COLUMN: &str = "invalid_parameter_combination";

/// Columns the evaluation history appends after the parameter columns, in
/// this order. No parameter may use one of these names.
pub const UTILITY_COLUMNS: [&str; 3] = [ITERATION_COLUMN, COST_COLUMN, INVALID_COLUMN];

/// Inclusive integer range a parameter may vary in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bound {
    pub left: i64,
    pub right: i64,
}

impl Bound {
    pub fn new(left: i64, right: i64) -> Self {
        Self { left, right }
    }
}

/// A named, bounded argument of the cost function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub bound: Bound,
}

impl Parameter {
    pub fn new(name: impl Into<String>, left: i64, right: i64) -> Self {
        Self {
            name: name.into(),
            bound: Bound::new(left, right),
        }
    }

    pub fn validate(&self, position: usize) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName { position });
        }
        if UTILITY_COLUMNS.contains(&self.name.as_str()) {
            return Err(ConfigError::ReservedName {
                name: self.name.clone(),
            });
        }
        if self.bound.left > self.bound.right {
            return Err(ConfigError::InvalidBound {
                name: self.name.clone(),
                left: self.bound.left,
                right: self.bound.right,
            });
        }
        Ok(())
    }
}

/// Value of a particular parameter for one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterValue {
    pub name: String,
    pub value: i64,
}

impl ParameterValue {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// Result of one remote evaluation.
///
/// A rejected combination still carries a cost (the configured
/// `invalid_parameter_combination_cost`) so the optimizer's numeric
/// contract stays unbroken, but it is never confused with a measured one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CostOutcome {
    /// Cost measured by the remote cost function.
    Valid(Cost),
    /// Combination judged infeasible; the cost was assigned, not measured.
    Rejected(Cost),
}

impl CostOutcome {
    pub fn from_parts(cost: Cost, invalid_parameter_combination: bool) -> Self {
        if invalid_parameter_combination {
            CostOutcome::Rejected(cost)
        } else {
            CostOutcome::Valid(cost)
        }
    }

    pub fn cost(&self) -> Cost {
        match self {
            CostOutcome::Valid(cost) | CostOutcome::Rejected(cost) => *cost,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, CostOutcome::Rejected(_))
    }
}

/// One optimizer callback invocation as observed by the bridge.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRecord {
    /// 1-based, gap-free.
    pub iteration: usize,
    /// All parameter values, in configured order.
    pub values: Vec<ParameterValue>,
    pub outcome: CostOutcome,
}

impl EvaluationRecord {
    pub fn cost(&self) -> Cost {
        self.outcome.cost()
    }

    pub fn is_invalid(&self) -> bool {
        self.outcome.is_invalid()
    }

    pub fn value_of(&self, name: &str) -> Option<i64> {
        self.values.iter().find(|pv| pv.name == name).map(|pv| pv.value)
    }
}
