use thiserror::Error;

/// Main error type for the evaluation bridge
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Invalid candidate: coordinate {index} is {value}")]
    InvalidCandidate { index: usize, value: f64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(String),
}

/// Failures talking to the remote evaluation service
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("{operation}: unexpected response status {status}")]
    UnexpectedStatus { operation: String, status: u16 },

    #[error("{operation}: request failed: {message}")]
    Request { operation: String, message: String },
}

impl TransportError {
    /// Response status, when the failure came from a non-success reply.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::UnexpectedStatus { status, .. } => Some(*status),
            TransportError::Request { .. } => None,
        }
    }
}

/// Payloads or files that do not match the expected schema
#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("{context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{context}: {message}")]
    Schema { context: String, message: String },
}

impl SerializationError {
    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        SerializationError::Json {
            context: context.into(),
            source,
        }
    }

    pub fn schema(context: impl Into<String>, message: impl Into<String>) -> Self {
        SerializationError::Schema {
            context: context.into(),
            message: message.into(),
        }
    }
}

/// Configuration problems detected before any evaluation starts
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("no parameters configured")]
    EmptyParameters,

    #[error("parameter name is empty at position {position}")]
    EmptyName { position: usize },

    #[error("duplicate parameter name: {name}")]
    DuplicateName { name: String },

    #[error("invalid bound for '{name}': left {left} is greater than right {right}")]
    InvalidBound { name: String, left: i64, right: i64 },

    #[error("field {field} must be greater than zero")]
    ZeroLimit { field: &'static str },

    #[error("invalid_parameter_combination_cost must be finite and below f64::MAX, got {cost}")]
    InvalidCombinationCostTooHigh { cost: f64 },

    #[error("parameter name '{name}' is reserved for an evaluation history column")]
    ReservedName { name: String },

    #[error("root_dir is empty")]
    EmptyRootDir,

    #[error("dimension mismatch: expected {expected} coordinates, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Calls made in the wrong session state
#[derive(Error, Debug, PartialEq)]
pub enum SessionError {
    #[error("report has not been registered yet")]
    ReportNotRegistered,

    #[error("report has been already registered")]
    ReportAlreadyRegistered,
}

/// Lookups against the closed set of configured parameter names
#[derive(Error, Debug, PartialEq)]
pub enum LookupError {
    #[error("unexpected parameter name: {name}")]
    UnknownParameter { name: String },
}

/// Report invariant violations
#[derive(Error, Debug, PartialEq)]
pub enum ReportError {
    #[error("optimum has {optimum} values but {bounds} parameters are configured")]
    LengthMismatch { bounds: usize, optimum: usize },

    #[error("optimum value for '{name}' does not match any configured parameter")]
    UnknownOptimumName { name: String },

    #[error("optimum holds more than one value for '{name}'")]
    DuplicateOptimumName { name: String },
}

impl From<csv::Error> for BridgeError {
    fn from(err: csv::Error) -> Self {
        BridgeError::Csv(err.to_string())
    }
}

/// Result type alias for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;
