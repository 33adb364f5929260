use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rb_types::{ConfigError, Cost};
use thiserror::Error;

/// Failures of the evaluation service. Request failures reach the bridge
/// as [`ServiceError::status_code`] with a JSON body.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("param '{name}' does not exist")]
    UnknownParameter { name: String },

    #[error("cost function call: {message}")]
    CostFunction { message: String },

    #[error("observed cost {cost} is not below invalid_parameter_combination_cost {limit}")]
    TooHighObservedCost { cost: Cost, limit: Cost },

    #[error("report has been already registered")]
    ReportAlreadyRegistered,

    #[error("validate config: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("run bridge: {cause}")]
    BridgeRun { cause: String },

    #[error("protocol error: no report was registered")]
    MissingReport,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::UnknownParameter { .. } => StatusCode::BAD_REQUEST,
            ServiceError::ReportAlreadyRegistered => StatusCode::CONFLICT,
            ServiceError::CostFunction { .. }
            | ServiceError::TooHighObservedCost { .. }
            | ServiceError::Config(_)
            | ServiceError::Io(_)
            | ServiceError::BridgeRun { .. }
            | ServiceError::MissingReport
            | ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status_code(), body).into_response()
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
