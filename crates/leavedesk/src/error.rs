use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::leave::{LeaveServiceError, PermissionDenied, RepositoryError};
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Ledger(serde_json::Error),
    Workflow(LeaveServiceError),
    UnknownLogin(String),
}

impl AppError {
    /// Process exit code: validation outcomes are distinguishable from hard failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Workflow(LeaveServiceError::Rejected(_))
            | AppError::Workflow(LeaveServiceError::Forbidden(_)) => 2,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Ledger(_)
            | AppError::Workflow(_)
            | AppError::UnknownLogin(_) => 1,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Ledger(err) => write!(f, "ledger error: {}", err),
            AppError::Workflow(err) => write!(f, "workflow error: {}", err),
            AppError::UnknownLogin(login) => write!(f, "no person signed in as '{}'", login),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Ledger(err) => Some(err),
            AppError::Workflow(err) => Some(err),
            AppError::UnknownLogin(_) => None,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Ledger(value)
    }
}

impl From<LeaveServiceError> for AppError {
    fn from(value: LeaveServiceError) -> Self {
        Self::Workflow(value)
    }
}

impl From<RepositoryError> for AppError {
    fn from(value: RepositoryError) -> Self {
        Self::Workflow(value.into())
    }
}

impl From<PermissionDenied> for AppError {
    fn from(value: PermissionDenied) -> Self {
        Self::Workflow(value.into())
    }
}
