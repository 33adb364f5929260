//! Evaluation service side of the rbfopt bridge.
//!
//! Hosts a user cost function behind the two HTTP operations the bridge
//! calls, `GET /estimate_cost` and `POST /register_report`. [`optimize()`]
//! runs a whole optimization around a bridge run and returns its report.

pub mod error;
pub mod estimator;
pub mod optimize;
pub mod server;

pub use error::{ServiceError, ServiceResult};
pub use estimator::{CostEstimator, CostFunction, CostFunctionError};
pub use optimize::optimize;
pub use server::{router, EvaluationServer, SharedEstimator};
