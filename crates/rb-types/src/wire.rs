//! Request and response bodies exchanged with the remote evaluation service.

use serde::{Deserialize, Serialize};

use crate::model::{Cost, CostOutcome, ParameterValue};
use crate::report::Report;

/// Path of the cost estimation endpoint (served over `GET`).
pub const ESTIMATE_COST_PATH: &str = "/estimate_cost";
/// Path of the report registration endpoint (served over `POST`).
pub const REGISTER_REPORT_PATH: &str = "/register_report";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateCostRequest {
    pub parameter_values: Vec<ParameterValue>,
}

/// Both fields are required; a reply missing either one is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimateCostResponse {
    pub cost: Cost,
    pub invalid_parameter_combination: bool,
}

impl From<EstimateCostResponse> for CostOutcome {
    fn from(response: EstimateCostResponse) -> Self {
        CostOutcome::from_parts(response.cost, response.invalid_parameter_combination)
    }
}

impl From<CostOutcome> for EstimateCostResponse {
    fn from(outcome: CostOutcome) -> Self {
        Self {
            cost: outcome.cost(),
            invalid_parameter_combination: outcome.is_invalid(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterReportRequest {
    pub report: Report,
}

/// Carries no fields; only the status of the reply matters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisterReportResponse {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_cost_request_shape() {
        let request = EstimateCostRequest {
            parameter_values: vec![
                ParameterValue::new("threads", 4),
                ParameterValue::new("batch", 16),
            ],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "parameter_values": [
                    {"name": "threads", "value": 4},
                    {"name": "batch", "value": 16}
                ]
            })
        );
    }

    #[test]
    fn response_without_flag_is_rejected() {
        let result = serde_json::from_str::<EstimateCostResponse>(r#"{"cost": 1.5}"#);
        assert!(result.is_err());
    }

    #[test]
    fn response_with_mistyped_cost_is_rejected() {
        let result = serde_json::from_str::<EstimateCostResponse>(
            r#"{"cost": "fast", "invalid_parameter_combination": false}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn response_maps_to_tagged_outcome() {
        let response: EstimateCostResponse = serde_json::from_str(
            r#"{"cost": 1000000, "invalid_parameter_combination": true}"#,
        )
        .unwrap();
        assert_eq!(CostOutcome::from(response), CostOutcome::Rejected(1_000_000.0));
    }
}
