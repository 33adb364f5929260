//! Server-side cost estimation: applies candidates to the user's cost
//! function and collects the final report.

use rb_types::{
    ConfigError, Cost, CostOutcome, EstimateCostRequest, EstimateCostResponse, OptimizerConfig,
    ParameterValue, RegisterReportRequest, RegisterReportResponse, Report,
};
use tracing::{debug, error, info};

use crate::error::{ServiceError, ServiceResult};

/// Errors a cost function may report for a candidate.
#[derive(Debug, thiserror::Error)]
pub enum CostFunctionError {
    /// The candidate cannot be evaluated (e.g. the system refuses to start
    /// with it). The optimizer is told so and given the configured cost.
    #[error("invalid parameter combination")]
    InvalidParameterCombination,
    #[error("cost function failed: {message}")]
    Failed { message: String },
}

/// The expensive objective the optimizer is searching over.
///
/// Receives every parameter value of one candidate, in configured order.
pub trait CostFunction: Send + 'static {
    fn evaluate(&mut self, values: &[ParameterValue]) -> Result<Cost, CostFunctionError>;
}

impl<F> CostFunction for F
where
    F: FnMut(&[ParameterValue]) -> Result<Cost, CostFunctionError> + Send + 'static,
{
    fn evaluate(&mut self, values: &[ParameterValue]) -> Result<Cost, CostFunctionError> {
        self(values)
    }
}

#[derive(Debug)]
pub struct CostEstimator<F> {
    config: OptimizerConfig,
    function: F,
    attempts: usize,
    final_report: Option<Report>,
    last_error: Option<String>,
}

impl<F: CostFunction> CostEstimator<F> {
    pub fn new(config: OptimizerConfig, function: F) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            function,
            attempts: 0,
            final_report: None,
            last_error: None,
        })
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Number of cost function calls made so far.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn final_report(&self) -> Option<&Report> {
        self.final_report.as_ref()
    }

    /// Message of the most recent failed request, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn estimate_cost(
        &mut self,
        request: &EstimateCostRequest,
    ) -> ServiceResult<EstimateCostResponse> {
        let result = self.try_estimate_cost(request);
        self.remember(result)
    }

    pub fn register_report(
        &mut self,
        request: RegisterReportRequest,
    ) -> ServiceResult<RegisterReportResponse> {
        let result = self.try_register_report(request);
        self.remember(result)
    }

    fn try_estimate_cost(
        &mut self,
        request: &EstimateCostRequest,
    ) -> ServiceResult<EstimateCostResponse> {
        for pv in &request.parameter_values {
            if self.config.parameter(&pv.name).is_none() {
                return Err(ServiceError::UnknownParameter {
                    name: pv.name.clone(),
                });
            }
        }

        self.attempts += 1;

        let limit = self.config.invalid_parameter_combination_cost;
        let outcome = match self.function.evaluate(&request.parameter_values) {
            Ok(cost) if cost >= limit => {
                return Err(ServiceError::TooHighObservedCost { cost, limit });
            }
            Ok(cost) => CostOutcome::Valid(cost),
            Err(CostFunctionError::InvalidParameterCombination) => CostOutcome::Rejected(limit),
            Err(CostFunctionError::Failed { message }) => {
                return Err(ServiceError::CostFunction { message });
            }
        };

        debug!(
            "estimate cost: attempt {} values {:?} -> {:?}",
            self.attempts, request.parameter_values, outcome
        );

        Ok(outcome.into())
    }

    fn try_register_report(
        &mut self,
        request: RegisterReportRequest,
    ) -> ServiceResult<RegisterReportResponse> {
        if self.final_report.is_some() {
            return Err(ServiceError::ReportAlreadyRegistered);
        }

        info!(
            "register report: cost {} optimum {:?}",
            request.report.cost(),
            request.report.optimum()
        );
        self.final_report = Some(request.report);

        Ok(RegisterReportResponse::default())
    }

    fn remember<T>(&mut self, result: ServiceResult<T>) -> ServiceResult<T> {
        if let Err(e) = &result {
            error!("request handling failed: {}", e);
            self.last_error = Some(e.to_string());
        }
        result
    }
}
