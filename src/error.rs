use crate::config::ConfigError;
use crate::pool::CsvPoolError;
use crate::telemetry::TelemetryError;
use crate::valuation::ValuationError;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Pool(CsvPoolError),
    Valuation(ValuationError),
    Serialization(serde_json::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Pool(err) => write!(f, "sale pool error: {}", err),
            AppError::Valuation(err) => write!(f, "valuation error: {}", err),
            AppError::Serialization(err) => write!(f, "serialization error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Pool(err) => Some(err),
            AppError::Valuation(err) => Some(err),
            AppError::Serialization(err) => Some(err),
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

impl From<CsvPoolError> for AppError {
    fn from(value: CsvPoolError) -> Self {
        Self::Pool(value)
    }
}

impl From<ValuationError> for AppError {
    fn from(value: ValuationError) -> Self {
        Self::Valuation(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}
