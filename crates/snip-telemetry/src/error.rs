use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TelemetryError {
    #[error("invalid {field}: {value}")]
    InvalidField { field: &'static str, value: String },
    #[error("invalid collector endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("log delivery failed: {0}")]
    Delivery(String),
    #[error("collector rejected log event ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("tracing initialization failed: {0}")]
    Initialization(String),
}
