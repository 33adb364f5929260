//! Synchronous client of the remote evaluation service.

use rb_types::{
    BridgeResult, CostOutcome, EstimateCostRequest, EstimateCostResponse, ParameterValue,
    RegisterReportRequest, Report, SerializationError, TransportError, ESTIMATE_COST_PATH,
    REGISTER_REPORT_PATH,
};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

/// Remote side of the evaluation bridge.
///
/// Both calls are single round trips: no retries, no batching.
pub trait CostService {
    /// Evaluate one candidate.
    fn estimate_cost(&mut self, values: &[ParameterValue]) -> BridgeResult<CostOutcome>;

    /// Hand the final report over; only the response status matters.
    fn register_report(&mut self, report: &Report) -> BridgeResult<()>;
}

impl<S: CostService + ?Sized> CostService for &mut S {
    fn estimate_cost(&mut self, values: &[ParameterValue]) -> BridgeResult<CostOutcome> {
        (**self).estimate_cost(values)
    }

    fn register_report(&mut self, report: &Report) -> BridgeResult<()> {
        (**self).register_report(report)
    }
}

/// HTTP/JSON implementation of [`CostService`].
///
/// Holds one pooled connection set for the whole session; it is released
/// when the client is dropped.
#[derive(Debug)]
pub struct HttpCostService {
    base_url: String,
    client: Client,
}

impl HttpCostService {
    /// `endpoint` is `host:port`; an explicit `http://` or `https://` prefix
    /// is kept as is.
    pub fn new(endpoint: &str, timeout: Option<Duration>) -> BridgeResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request {
                operation: "build client".to_string(),
                message: e.to_string(),
            })?;

        let endpoint = endpoint.trim_end_matches('/');
        let base_url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("http://{endpoint}")
        };

        tracing::info!("Evaluation service client targets {}", base_url);

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn send(operation: &str, request: RequestBuilder) -> BridgeResult<Response> {
        let response = request.send().map_err(|e| TransportError::Request {
            operation: operation.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        debug!("{} response status {}", operation, status);

        if status != StatusCode::OK {
            return Err(TransportError::UnexpectedStatus {
                operation: operation.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        Ok(response)
    }
}

impl CostService for HttpCostService {
    fn estimate_cost(&mut self, values: &[ParameterValue]) -> BridgeResult<CostOutcome> {
        let payload = EstimateCostRequest {
            parameter_values: values.to_vec(),
        };
        debug!("estimate_cost request {:?}", payload.parameter_values);

        let request = self.client.get(self.url(ESTIMATE_COST_PATH)).json(&payload);
        let response = Self::send("estimate_cost", request)?;

        let body = response.bytes().map_err(|e| TransportError::Request {
            operation: "estimate_cost".to_string(),
            message: format!("read body: {e}"),
        })?;
        let parsed: EstimateCostResponse = serde_json::from_slice(&body)
            .map_err(|e| SerializationError::json("estimate_cost response", e))?;

        debug!(
            "estimate_cost response cost={} invalid={}",
            parsed.cost, parsed.invalid_parameter_combination
        );

        Ok(parsed.into())
    }

    fn register_report(&mut self, report: &Report) -> BridgeResult<()> {
        let payload = RegisterReportRequest {
            report: report.clone(),
        };
        debug!("register_report request {:?}", payload.report);

        let request = self.client.post(self.url(REGISTER_REPORT_PATH)).json(&payload);
        Self::send("register_report", request)?;
        Ok(())
    }
}

impl Drop for HttpCostService {
    fn drop(&mut self) {
        debug!("Closing evaluation service client for {}", self.base_url);
    }
}
