//! Positional view of the parameter space for the optimizer.

use chrono::Utc;
use rb_types::{
    BridgeError, BridgeResult, ConfigError, InitStrategy, OptimizerConfig, Parameter,
    ParameterValue,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Variable kind understood by the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableType {
    #[serde(rename = "I")]
    Integer,
}

/// Ordered parameter names: position `i` of every optimizer vector belongs
/// to `names()[i]`.
///
/// Built once by [`BlackBoxDescriptor`] and shared by cloning the handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterLayout {
    names: Arc<[String]>,
}

impl ParameterLayout {
    fn from_parameters(parameters: &[Parameter]) -> Self {
        Self {
            names: parameters.iter().map(|p| p.name.clone()).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Zip an optimizer vector against the names.
    ///
    /// Integer variables come back as floats; each coordinate is rounded to
    /// the nearest integer.
    pub fn to_values(&self, vector: &[f64]) -> BridgeResult<Vec<ParameterValue>> {
        if vector.len() != self.names.len() {
            return Err(ConfigError::DimensionMismatch {
                expected: self.names.len(),
                actual: vector.len(),
            }
            .into());
        }

        self.names
            .iter()
            .zip(vector)
            .enumerate()
            .map(|(index, (name, &raw))| {
                if !raw.is_finite() {
                    return Err(BridgeError::InvalidCandidate { index, value: raw });
                }
                Ok(ParameterValue::new(name.clone(), raw.round() as i64))
            })
            .collect()
    }
}

/// Settings for one optimizer run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizerSettings {
    pub max_evaluations: usize,
    pub max_iterations: usize,
    pub init_strategy: InitStrategy,
    /// Reseeded from wall-clock time on every construction.
    pub rand_seed: u64,
}

/// Bounds, types and settings in the positional form a black-box optimizer
/// consumes.
#[derive(Debug, Clone)]
pub struct BlackBoxDescriptor {
    parameters: Vec<Parameter>,
    layout: ParameterLayout,
    var_lower: Vec<f64>,
    var_upper: Vec<f64>,
    var_type: Vec<VariableType>,
    settings: OptimizerSettings,
}

impl BlackBoxDescriptor {
    pub fn new(config: &OptimizerConfig) -> BridgeResult<Self> {
        config.validate()?;

        let layout = ParameterLayout::from_parameters(&config.parameters);
        let var_lower = config
            .parameters
            .iter()
            .map(|p| p.bound.left as f64)
            .collect();
        let var_upper = config
            .parameters
            .iter()
            .map(|p| p.bound.right as f64)
            .collect();
        let var_type = vec![VariableType::Integer; config.parameters.len()];

        let settings = OptimizerSettings {
            max_evaluations: config.max_evaluations,
            max_iterations: config.max_iterations,
            init_strategy: config.init_strategy,
            rand_seed: Utc::now().timestamp().unsigned_abs(),
        };

        tracing::debug!(
            "Black box described: {} dimensions, seed {}",
            layout.len(),
            settings.rand_seed
        );

        Ok(Self {
            parameters: config.parameters.clone(),
            layout,
            var_lower,
            var_upper,
            var_type,
            settings,
        })
    }

    pub fn dimension(&self) -> usize {
        self.layout.len()
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn layout(&self) -> &ParameterLayout {
        &self.layout
    }

    pub fn var_lower(&self) -> &[f64] {
        &self.var_lower
    }

    pub fn var_upper(&self) -> &[f64] {
        &self.var_upper
    }

    pub fn var_type(&self) -> &[VariableType] {
        &self.var_type
    }

    pub fn settings(&self) -> &OptimizerSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(parameters: Vec<Parameter>) -> OptimizerConfig {
        OptimizerConfig {
            parameters,
            max_evaluations: 30,
            max_iterations: 60,
            init_strategy: InitStrategy::LowerCorners,
            invalid_parameter_combination_cost: 1e6,
        }
    }

    #[test]
    fn declaration_order_is_preserved() {
        let descriptor = BlackBoxDescriptor::new(&config(vec![
            Parameter::new("p1", 1, 10),
            Parameter::new("p2", -3, 3),
        ]))
        .unwrap();

        assert_eq!(descriptor.layout().names(), ["p1", "p2"]);
        assert_eq!(descriptor.var_lower(), [1.0, -3.0]);
        assert_eq!(descriptor.var_upper(), [10.0, 3.0]);
        assert_eq!(descriptor.var_type(), [VariableType::Integer; 2]);
        assert_eq!(descriptor.dimension(), 2);

        let values = descriptor.layout().to_values(&[3.0, 5.0]).unwrap();
        assert_eq!(
            values,
            vec![ParameterValue::new("p1", 3), ParameterValue::new("p2", 5)]
        );
    }

    #[test]
    fn array_lengths_match_parameter_count() {
        let parameters: Vec<Parameter> = (0..9)
            .map(|i| Parameter::new(format!("x{i}"), 0, i))
            .collect();
        let descriptor = BlackBoxDescriptor::new(&config(parameters)).unwrap();
        assert_eq!(descriptor.layout().len(), 9);
        assert_eq!(descriptor.var_lower().len(), 9);
        assert_eq!(descriptor.var_upper().len(), 9);
        assert_eq!(descriptor.var_type().len(), 9);
        assert_eq!(descriptor.layout().names()[4], "x4");
        assert_eq!(descriptor.var_upper()[4], 4.0);
    }

    #[test]
    fn settings_copy_limits() {
        let descriptor =
            BlackBoxDescriptor::new(&config(vec![Parameter::new("a", 0, 1)])).unwrap();
        let settings = descriptor.settings();
        assert_eq!(settings.max_evaluations, 30);
        assert_eq!(settings.max_iterations, 60);
        assert_eq!(settings.init_strategy, InitStrategy::LowerCorners);
        assert!(settings.rand_seed > 0);
    }

    #[test]
    fn invalid_config_fails_at_construction() {
        let result = BlackBoxDescriptor::new(&config(vec![
            Parameter::new("a", 0, 1),
            Parameter::new("a", 0, 2),
        ]));
        assert!(matches!(
            result,
            Err(BridgeError::Config(ConfigError::DuplicateName { .. }))
        ));
    }

    #[test]
    fn wrong_dimensionality_is_rejected() {
        let descriptor =
            BlackBoxDescriptor::new(&config(vec![Parameter::new("a", 0, 1)])).unwrap();
        let result = descriptor.layout().to_values(&[1.0, 2.0]);
        assert!(matches!(
            result,
            Err(BridgeError::Config(ConfigError::DimensionMismatch {
                expected: 1,
                actual: 2
            }))
        ));
    }

    #[test]
    fn float_coordinates_are_rounded() {
        let descriptor = BlackBoxDescriptor::new(&config(vec![
            Parameter::new("a", 0, 10),
            Parameter::new("b", -10, 10),
        ]))
        .unwrap();
        let values = descriptor.layout().to_values(&[3.9999999, -2.0000001]).unwrap();
        assert_eq!(values[0].value, 4);
        assert_eq!(values[1].value, -2);
    }

    #[test]
    fn non_finite_coordinate_is_rejected() {
        let descriptor =
            BlackBoxDescriptor::new(&config(vec![Parameter::new("a", 0, 10)])).unwrap();
        assert!(matches!(
            descriptor.layout().to_values(&[f64::NAN]),
            Err(BridgeError::InvalidCandidate { index: 0, .. })
        ));
    }

    #[test]
    fn type_tag_serializes_as_letter() {
        assert_eq!(
            serde_json::to_string(&VariableType::Integer).unwrap(),
            "\"I\""
        );
    }
}
