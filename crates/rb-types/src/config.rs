//! Session configuration, read from `config.json` in the session root.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::errors::{BridgeResult, ConfigError, SerializationError};
use crate::model::{Cost, Parameter};

/// How the optimizer selects its initial sample points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitStrategy {
    LhdMaximin,
    LhdCorr,
    AllCorners,
    LowerCorners,
    RandCorners,
}

impl Default for InitStrategy {
    fn default() -> Self {
        Self::LhdMaximin
    }
}

/// Parameter space and run limits handed to the optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Arguments of the cost function, in declaration order.
    pub parameters: Vec<Parameter>,
    /// Evaluations limit.
    pub max_evaluations: usize,
    /// Iterations limit.
    pub max_iterations: usize,
    #[serde(default)]
    pub init_strategy: InitStrategy,
    /// Cost assigned by the remote service to infeasible combinations.
    pub invalid_parameter_combination_cost: Cost,
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.parameters.is_empty() {
            return Err(ConfigError::EmptyParameters);
        }

        let mut names = HashSet::with_capacity(self.parameters.len());
        for (position, param) in self.parameters.iter().enumerate() {
            param.validate(position)?;
            if !names.insert(param.name.as_str()) {
                return Err(ConfigError::DuplicateName {
                    name: param.name.clone(),
                });
            }
        }

        if self.max_evaluations == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "max_evaluations",
            });
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "max_iterations",
            });
        }

        let cost = self.invalid_parameter_combination_cost;
        if !cost.is_finite() || cost == f64::MAX {
            return Err(ConfigError::InvalidCombinationCostTooHigh { cost });
        }

        Ok(())
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// Name of the session configuration file inside `root_dir`.
pub const CONFIG_FILE: &str = "config.json";

/// Endpoint used when the configuration leaves it out or empty.
pub const DEFAULT_ENDPOINT: &str = "0.0.0.0:8080";

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

/// Top-level configuration of one bridge session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session directory: holds `config.json`, `evaluations.csv` and
    /// `report.json`. Created when missing.
    pub root_dir: PathBuf,
    /// `host:port` of the remote evaluation service.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    pub rbfopt: OptimizerConfig,
    /// Per-request timeout; unset means wait as long as the evaluation takes.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl SessionConfig {
    pub fn from_json_str(raw: &str) -> BridgeResult<Self> {
        let config: SessionConfig = serde_json::from_str(raw)
            .map_err(|e| SerializationError::json("decode session config", e))?;
        let config = config.with_defaults();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> BridgeResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// Replace a blank endpoint with [`DEFAULT_ENDPOINT`].
    pub fn with_defaults(mut self) -> Self {
        if self.endpoint.trim().is_empty() {
            self.endpoint = default_endpoint();
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyRootDir);
        }
        self.rbfopt.validate()
    }
}
