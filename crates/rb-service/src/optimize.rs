//! Service-side entry point: serve the cost function while a bridge run
//! drives the optimizer, then hand back the final report.

use rb_types::{Report, SessionConfig, CONFIG_FILE};
use std::fmt;
use tracing::{info, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::estimator::{CostEstimator, CostFunction};
use crate::server::EvaluationServer;

/// Run one optimization.
///
/// Validates `config`, starts an [`EvaluationServer`] on its endpoint,
/// creates `root_dir` when missing and writes [`CONFIG_FILE`] there with the
/// endpoint actually bound. `run_bridge` then runs on a blocking thread with
/// that configuration and is expected to drive the optimizer to completion
/// (typically by launching `rb-bridge <root_dir>`). The server is stopped
/// whatever the outcome.
///
/// When `run_bridge` fails, the last error the service answered is reported
/// in preference to the bridge's own message since it names the cause.
pub async fn optimize<F, R, E>(
    config: SessionConfig,
    cost_function: F,
    run_bridge: R,
) -> ServiceResult<Report>
where
    F: CostFunction,
    R: FnOnce(&SessionConfig) -> Result<(), E> + Send + 'static,
    E: fmt::Display,
{
    let config = config.with_defaults();
    config.validate()?;

    let estimator = CostEstimator::new(config.rbfopt.clone(), cost_function)?;
    let server = EvaluationServer::bind(config.endpoint.as_str(), estimator).await?;

    let outcome = drive(&config, &server, run_bridge).await;
    let report = server.final_report();
    if let Err(e) = server.shutdown().await {
        warn!("Evaluation server shutdown failed: {}", e);
    }
    outcome?;

    let report = report.ok_or(ServiceError::MissingReport)?;
    info!(
        "Optimization finished: cost {} after {} evaluations",
        report.cost(),
        report.evaluations()
    );
    Ok(report)
}

async fn drive<F, R, E>(
    config: &SessionConfig,
    server: &EvaluationServer<F>,
    run_bridge: R,
) -> ServiceResult<()>
where
    F: CostFunction,
    R: FnOnce(&SessionConfig) -> Result<(), E> + Send + 'static,
    E: fmt::Display,
{
    tokio::fs::create_dir_all(&config.root_dir).await?;

    let mut resolved = config.clone();
    resolved.endpoint = server.endpoint();
    let raw = serde_json::to_vec_pretty(&resolved)
        .map_err(|e| ServiceError::Internal(format!("encode {CONFIG_FILE}: {e}")))?;
    tokio::fs::write(resolved.root_dir.join(CONFIG_FILE), raw).await?;

    info!(
        "Running bridge against {} in {}",
        resolved.endpoint,
        resolved.root_dir.display()
    );

    let ran = tokio::task::spawn_blocking(move || run_bridge(&resolved).map_err(|e| e.to_string()))
        .await
        .map_err(|e| ServiceError::Internal(e.to_string()))?;

    if let Err(message) = ran {
        let cause = server.last_error().unwrap_or(message);
        return Err(ServiceError::BridgeRun { cause });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::CostFunctionError;
    use rb_types::{Cost, InitStrategy, OptimizerConfig, Parameter, ParameterValue};
    use std::io::{Read, Write};
    use std::net::TcpStream;
    use std::path::Path;
    use tempfile::tempdir;

    type Linear = fn(&[ParameterValue]) -> Result<Cost, CostFunctionError>;

    fn linear(values: &[ParameterValue]) -> Result<Cost, CostFunctionError> {
        Ok(values.iter().map(|pv| pv.value as Cost).sum())
    }

    fn config(root_dir: &Path) -> SessionConfig {
        SessionConfig {
            root_dir: root_dir.to_path_buf(),
            endpoint: "127.0.0.1:0".into(),
            rbfopt: OptimizerConfig {
                parameters: vec![Parameter::new("x", 0, 10)],
                max_evaluations: 5,
                max_iterations: 5,
                init_strategy: InitStrategy::LhdMaximin,
                invalid_parameter_combination_cost: 100.0,
            },
            request_timeout_secs: None,
        }
    }

    /// Minimal HTTP/1.1 exchange; returns the response status.
    fn send(endpoint: &str, method: &str, path: &str, body: &str) -> u16 {
        let mut stream = TcpStream::connect(endpoint).unwrap();
        write!(
            stream,
            "{method} {path} HTTP/1.1\r\nHost: {endpoint}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
        .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        response
            .split_whitespace()
            .nth(1)
            .and_then(|status| status.parse().ok())
            .unwrap()
    }

    const REPORT: &str = r#"{"report": {
        "bounds": [{"name": "x", "bound": {"left": 0, "right": 10}}],
        "optimum": [{"name": "x", "value": 0}],
        "cost": 0.0,
        "iterations": 1,
        "evaluations": 1,
        "fast_evaluations": 0
    }}"#;

    #[tokio::test]
    async fn returns_registered_report() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("session");

        let report = optimize(config(&root), linear as Linear, |session: &SessionConfig| {
            let status = send(
                &session.endpoint,
                "GET",
                "/estimate_cost",
                r#"{"parameter_values": [{"name": "x", "value": 0}]}"#,
            );
            assert_eq!(status, 200);
            assert_eq!(send(&session.endpoint, "POST", "/register_report", REPORT), 200);
            Ok::<(), String>(())
        })
        .await
        .unwrap();

        assert_eq!(report.optimum_argument("x"), Ok(0));
        assert_eq!(report.evaluations(), 1);

        let written = SessionConfig::from_file(root.join(CONFIG_FILE)).unwrap();
        assert_ne!(written.endpoint, "127.0.0.1:0");
        assert_eq!(written.rbfopt, config(&root).rbfopt);
    }

    #[tokio::test]
    async fn bridge_exiting_without_report_is_a_protocol_error() {
        let dir = tempdir().unwrap();

        let err = optimize(config(dir.path()), linear as Linear, |_: &SessionConfig| {
            Ok::<(), String>(())
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ServiceError::MissingReport));
        assert!(err.to_string().contains("protocol error"));
    }

    #[tokio::test]
    async fn bridge_failure_reports_last_service_error() {
        let dir = tempdir().unwrap();

        let err = optimize(config(dir.path()), linear as Linear, |session: &SessionConfig| {
            let status = send(
                &session.endpoint,
                "GET",
                "/estimate_cost",
                r#"{"parameter_values": [{"name": "y", "value": 1}]}"#,
            );
            assert_eq!(status, 400);
            Err("bridge exited with status 1")
        })
        .await
        .unwrap_err();

        match err {
            ServiceError::BridgeRun { cause } => {
                assert_eq!(cause, "param 'y' does not exist");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn bridge_failure_without_service_error_keeps_its_message() {
        let dir = tempdir().unwrap();

        let err = optimize(config(dir.path()), linear as Linear, |_: &SessionConfig| {
            Err("bridge exited with status 2")
        })
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "run bridge: bridge exited with status 2");
    }

    #[tokio::test]
    async fn invalid_config_never_starts_the_bridge() {
        let dir = tempdir().unwrap();
        let mut config = config(dir.path());
        config.rbfopt.parameters.clear();

        let err = optimize(config, linear as Linear, |_: &SessionConfig| -> Result<(), String> {
            panic!("bridge must not run")
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ServiceError::Config(_)));
    }
}
