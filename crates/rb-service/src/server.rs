//! HTTP front of a [`CostEstimator`].

use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use rb_types::{
    EstimateCostRequest, EstimateCostResponse, RegisterReportRequest, RegisterReportResponse,
    Report, ESTIMATE_COST_PATH, REGISTER_REPORT_PATH,
};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::estimator::{CostEstimator, CostFunction};

pub type SharedEstimator<F> = Arc<Mutex<CostEstimator<F>>>;

/// Routes for both bridge operations. Exposed separately so callers can
/// mount them under their own server.
pub fn router<F: CostFunction>(estimator: SharedEstimator<F>) -> Router {
    Router::new()
        .route(ESTIMATE_COST_PATH, get(estimate_cost::<F>))
        .route(REGISTER_REPORT_PATH, post(register_report::<F>))
        .layer(middleware::from_fn(log_requests))
        .with_state(estimator)
}

async fn estimate_cost<F: CostFunction>(
    State(estimator): State<SharedEstimator<F>>,
    Json(request): Json<EstimateCostRequest>,
) -> ServiceResult<Json<EstimateCostResponse>> {
    // Cost functions usually run a benchmark; keep them off the reactor.
    let response = tokio::task::spawn_blocking(move || estimator.lock().estimate_cost(&request))
        .await
        .map_err(|e| ServiceError::Internal(e.to_string()))??;
    Ok(Json(response))
}

async fn register_report<F: CostFunction>(
    State(estimator): State<SharedEstimator<F>>,
    Json(request): Json<RegisterReportRequest>,
) -> ServiceResult<Json<RegisterReportResponse>> {
    let response = estimator.lock().register_report(request)?;
    Ok(Json(response))
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let elapsed_ms = start.elapsed().as_millis();
    if status.is_success() {
        info!("{} {} -> {} in {}ms", method, uri, status.as_u16(), elapsed_ms);
    } else {
        warn!("{} {} -> {} in {}ms", method, uri, status.as_u16(), elapsed_ms);
    }

    response
}

/// A running evaluation server bound to a local address.
pub struct EvaluationServer<F> {
    local_addr: SocketAddr,
    estimator: SharedEstimator<F>,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<io::Result<()>>,
}

impl<F: CostFunction> EvaluationServer<F> {
    /// Bind `addr` and start serving in a background task. Port 0 picks a
    /// free port; see [`EvaluationServer::local_addr`].
    pub async fn bind<A: ToSocketAddrs>(addr: A, estimator: CostEstimator<F>) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        let estimator = Arc::new(Mutex::new(estimator));
        let app = router(estimator.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        info!("Evaluation server listening on {}", local_addr);

        Ok(Self {
            local_addr,
            estimator,
            shutdown_tx,
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Endpoint string in the form the bridge configuration expects.
    pub fn endpoint(&self) -> String {
        self.local_addr.to_string()
    }

    pub fn attempts(&self) -> usize {
        self.estimator.lock().attempts()
    }

    pub fn final_report(&self) -> Option<Report> {
        self.estimator.lock().final_report().cloned()
    }

    pub fn last_error(&self) -> Option<String> {
        self.estimator.lock().last_error().map(str::to_owned)
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(self) -> io::Result<()> {
        let _ = self.shutdown_tx.send(());
        let served = self
            .task
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        info!("Evaluation server on {} stopped", self.local_addr);
        served
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::CostFunctionError;
    use rb_types::{Cost, InitStrategy, OptimizerConfig, Parameter, ParameterValue};

    type Square = fn(&[ParameterValue]) -> Result<Cost, CostFunctionError>;

    fn estimator() -> CostEstimator<Square> {
        let config = OptimizerConfig {
            parameters: vec![Parameter::new("x", 0, 10)],
            max_evaluations: 5,
            max_iterations: 5,
            init_strategy: InitStrategy::LhdMaximin,
            invalid_parameter_combination_cost: 100.0,
        };
        fn square(values: &[ParameterValue]) -> Result<Cost, CostFunctionError> {
            Ok(values.iter().map(|pv| (pv.value * pv.value) as Cost).sum())
        }
        CostEstimator::new(config, square as Square).unwrap()
    }

    #[tokio::test]
    async fn binds_ephemeral_port_and_shuts_down() {
        let server = EvaluationServer::bind("127.0.0.1:0", estimator())
            .await
            .unwrap();
        assert_ne!(server.local_addr().port(), 0);
        assert_eq!(server.attempts(), 0);
        assert!(server.final_report().is_none());
        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn handler_answers_cost() {
        let shared = Arc::new(Mutex::new(estimator()));
        let request = EstimateCostRequest {
            parameter_values: vec![ParameterValue::new("x", 3)],
        };

        let Json(response) = estimate_cost(State(shared.clone()), Json(request))
            .await
            .unwrap();

        assert_eq!(response.cost, 9.0);
        assert!(!response.invalid_parameter_combination);
        assert_eq!(shared.lock().attempts(), 1);
    }
}
