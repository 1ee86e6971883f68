use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::workflows::leave::{CarryOverCutoff, LeavePolicy};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub ledger: LedgerConfig,
    pub leave: LeavePolicy,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = env::var("APP_LOG_FORMAT")
            .map(|raw| LogFormat::from_str(&raw))
            .unwrap_or(LogFormat::Compact);

        let ledger_path = env::var("LEAVE_LEDGER_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("leavedesk.json"));

        let defaults = LeavePolicy::default();

        let carry_over_cutoff = match env::var("LEAVE_CARRY_OVER_CUTOFF") {
            Ok(raw) => parse_cutoff(&raw)?,
            Err(_) => defaults.carry_over_cutoff,
        };

        let remind_after_days = match env::var("LEAVE_REMIND_AFTER_DAYS") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidRemindAfterDays)?,
            Err(_) => defaults.remind_after_days,
        };

        let comment_max_length = match env::var("LEAVE_COMMENT_MAX_LENGTH") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|length| *length > 0)
                .ok_or(ConfigError::InvalidCommentMaxLength)?,
            Err(_) => defaults.comment_max_length,
        };

        Ok(Self {
            environment,
            telemetry: TelemetryConfig {
                log_level,
                log_format,
            },
            ledger: LedgerConfig { path: ledger_path },
            leave: LeavePolicy {
                carry_over_cutoff,
                remind_after_days,
                comment_max_length,
                ..defaults
            },
        })
    }
}

fn parse_cutoff(raw: &str) -> Result<CarryOverCutoff, ConfigError> {
    let invalid = || ConfigError::InvalidCarryOverCutoff {
        value: raw.to_string(),
    };

    let (month, day) = raw.trim().split_once('-').ok_or_else(invalid)?;
    let month = month.parse::<u32>().map_err(|_| invalid())?;
    let day = day.parse::<u32>().map_err(|_| invalid())?;

    CarryOverCutoff::new(month, day).ok_or_else(invalid)
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

/// Line format of the log output on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// Location of the JSON ledger the CLI reads and writes.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub path: PathBuf,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidCarryOverCutoff { value: String },
    InvalidRemindAfterDays,
    InvalidCommentMaxLength,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidCarryOverCutoff { value } => write!(
                f,
                "LEAVE_CARRY_OVER_CUTOFF must be a MM-DD day that exists in every year, got '{}'",
                value
            ),
            ConfigError::InvalidRemindAfterDays => {
                write!(f, "LEAVE_REMIND_AFTER_DAYS must be a valid u32")
            }
            ConfigError::InvalidCommentMaxLength => {
                write!(f, "LEAVE_COMMENT_MAX_LENGTH must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
