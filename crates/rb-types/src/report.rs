//! Final result of an optimization session.
//!
//! The same JSON object is posted to the remote service and persisted as
//! `report.json`. Its layout is pinned by [`ReportSchemaV1`]: exactly the six
//! fields below, unknown fields rejected, and the optimum re-checked against
//! the bounds on every decode.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::errors::{BridgeResult, LookupError, ReportError, SerializationError};
use crate::model::{Cost, Parameter, ParameterValue};

/// Run statistics reported by the optimizer on termination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub iterations: usize,
    pub evaluations: usize,
    pub fast_evaluations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ReportSchemaV1", try_from = "ReportSchemaV1")]
pub struct Report {
    bounds: Vec<Parameter>,
    optimum: Vec<ParameterValue>,
    cost: Cost,
    statistics: RunStatistics,
}

impl Report {
    /// Build a report, checking that `optimum` names exactly the parameters
    /// in `bounds`, once each.
    pub fn new(
        bounds: Vec<Parameter>,
        optimum: Vec<ParameterValue>,
        cost: Cost,
        statistics: RunStatistics,
    ) -> Result<Self, ReportError> {
        if bounds.len() != optimum.len() {
            return Err(ReportError::LengthMismatch {
                bounds: bounds.len(),
                optimum: optimum.len(),
            });
        }

        let known: HashSet<&str> = bounds.iter().map(|p| p.name.as_str()).collect();
        let mut seen = HashSet::with_capacity(optimum.len());
        for pv in &optimum {
            if !known.contains(pv.name.as_str()) {
                return Err(ReportError::UnknownOptimumName {
                    name: pv.name.clone(),
                });
            }
            if !seen.insert(pv.name.as_str()) {
                return Err(ReportError::DuplicateOptimumName {
                    name: pv.name.clone(),
                });
            }
        }

        Ok(Self {
            bounds,
            optimum,
            cost,
            statistics,
        })
    }

    pub fn bounds(&self) -> &[Parameter] {
        &self.bounds
    }

    pub fn optimum(&self) -> &[ParameterValue] {
        &self.optimum
    }

    pub fn cost(&self) -> Cost {
        self.cost
    }

    pub fn statistics(&self) -> RunStatistics {
        self.statistics
    }

    pub fn iterations(&self) -> usize {
        self.statistics.iterations
    }

    pub fn evaluations(&self) -> usize {
        self.statistics.evaluations
    }

    pub fn fast_evaluations(&self) -> usize {
        self.statistics.fast_evaluations
    }

    /// Optimum value for a configured parameter.
    pub fn optimum_argument(&self, name: &str) -> Result<i64, LookupError> {
        self.optimum
            .iter()
            .find(|pv| pv.name == name)
            .map(|pv| pv.value)
            .ok_or_else(|| LookupError::UnknownParameter {
                name: name.to_string(),
            })
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> BridgeResult<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self).map_err(|e| {
            SerializationError::json(format!("encode report to {}", path.display()), e)
        })?;
        writer.flush()?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> BridgeResult<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let report = serde_json::from_reader(reader).map_err(|e| {
            SerializationError::json(format!("decode report from {}", path.display()), e)
        })?;
        Ok(report)
    }
}

/// On-disk and on-wire layout of a [`Report`], version 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportSchemaV1 {
    bounds: Vec<Parameter>,
    optimum: Vec<ParameterValue>,
    cost: Cost,
    iterations: usize,
    evaluations: usize,
    fast_evaluations: usize,
}

impl From<Report> for ReportSchemaV1 {
    fn from(report: Report) -> Self {
        Self {
            bounds: report.bounds,
            optimum: report.optimum,
            cost: report.cost,
            iterations: report.statistics.iterations,
            evaluations: report.statistics.evaluations,
            fast_evaluations: report.statistics.fast_evaluations,
        }
    }
}

impl TryFrom<ReportSchemaV1> for Report {
    type Error = ReportError;

    fn try_from(schema: ReportSchemaV1) -> Result<Self, Self::Error> {
        Report::new(
            schema.bounds,
            schema.optimum,
            schema.cost,
            RunStatistics {
                iterations: schema.iterations,
                evaluations: schema.evaluations,
                fast_evaluations: schema.fast_evaluations,
            },
        )
    }
}
