use std::env;
use std::fmt;
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the tool.
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
    pub analysis: AnalysisDefaults,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let analysis = AnalysisDefaults {
            search_radius_miles: parse_env("CMA_SEARCH_RADIUS_MILES", 1.0)?,
            max_comparables: parse_env("CMA_MAX_COMPARABLES", 6)?,
            max_age_days: parse_env("CMA_MAX_AGE_DAYS", 180)?,
            cache_ttl: Duration::from_secs(parse_env("CMA_CACHE_TTL_SECONDS", 300)?),
        };

        if analysis.search_radius_miles <= 0.0 {
            return Err(ConfigError::Invalid {
                name: "CMA_SEARCH_RADIUS_MILES",
                reason: "must be positive".to_string(),
            });
        }
        if analysis.max_comparables < 1 {
            return Err(ConfigError::Invalid {
                name: "CMA_MAX_COMPARABLES",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            environment,
            telemetry: TelemetryConfig { log_level },
            analysis,
        })
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Defaults applied to valuation requests at the boundary.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisDefaults {
    pub search_radius_miles: f64,
    pub max_comparables: usize,
    pub max_age_days: i64,
    pub cache_ttl: Duration,
}

fn parse_env<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => raw.parse::<T>().map_err(|_| ConfigError::Invalid {
            name,
            reason: format!("could not parse '{raw}'"),
        }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Invalid { name: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid { name, reason } => {
                write!(f, "{name} is invalid: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
