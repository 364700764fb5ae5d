use chrono::FixedOffset;
use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub store: StoreConfig,
    pub business: BusinessConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Mongodb,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub mongodb: MongoConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: Secret<String>,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BusinessConfig {
    /// Civil time offset, in minutes east of UTC, that decides "today".
    pub utc_offset_minutes: i32,
}

impl BusinessConfig {
    pub fn offset(&self) -> Result<FixedOffset, AppError> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            AppError::ConfigError(anyhow::anyhow!(
                "BUSINESS_UTC_OFFSET_MINUTES out of range: {}",
                self.utc_offset_minutes
            ))
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    pub max_records: usize,
    pub char_limit: usize,
}

impl SubscriptionConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let backend: StoreBackend = get_env("STORE_BACKEND", Some("mongodb"), false)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;
        let mongo_required = is_prod && backend == StoreBackend::Mongodb;

        let config = SubscriptionConfig {
            common: common_config,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("subscription-service"), false)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), false)?,
            log_level: get_env("LOG_LEVEL", Some("info"), false)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|v| !v.is_empty()),
            store: StoreConfig {
                backend,
                mongodb: MongoConfig {
                    uri: Secret::new(get_env(
                        "MONGODB_URI",
                        Some("mongodb://localhost:27017"),
                        mongo_required,
                    )?),
                    database: get_env("MONGODB_DATABASE", Some("magazine_db"), false)?,
                },
            },
            business: BusinessConfig {
                utc_offset_minutes: parse_env("BUSINESS_UTC_OFFSET_MINUTES", "330")?,
            },
            report: ReportConfig {
                max_records: parse_env("REPORT_MAX_RECORDS", "5000")?,
                char_limit: parse_env("REPORT_CHAR_LIMIT", "42")?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// In-memory defaults for tests and local runs without a database.
    pub fn for_memory_store() -> Self {
        Self {
            common: core_config::Config::default(),
            environment: Environment::Dev,
            service_name: "subscription-service".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: "info".to_string(),
            otlp_endpoint: None,
            store: StoreConfig {
                backend: StoreBackend::Memory,
                mongodb: MongoConfig {
                    uri: Secret::new("mongodb://localhost:27017".to_string()),
                    database: "magazine_db".to_string(),
                },
            },
            business: BusinessConfig {
                utc_offset_minutes: 330,
            },
            report: ReportConfig {
                max_records: 5000,
                char_limit: 42,
            },
        }
    }

    fn validate(&self) -> Result<(), AppError> {
        self.business.offset()?;

        if self.report.max_records == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "REPORT_MAX_RECORDS must be positive"
            )));
        }

        if self.report.char_limit == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "REPORT_CHAR_LIMIT must be positive"
            )));
        }

        if self.environment == Environment::Prod && self.store.backend == StoreBackend::Memory {
            tracing::warn!("In-memory store selected in production; data will not survive restarts");
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, required: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if required {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: &str) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, Some(default), false)?
        .trim()
        .parse()
        .map_err(|e: T::Err| AppError::ConfigError(anyhow::anyhow!("{} is invalid: {}", key, e)))
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(StoreBackend::Mongodb),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!("Invalid store backend: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_enums() {
        assert_eq!("PROD".parse::<Environment>().unwrap(), Environment::Prod);
        assert!("staging".parse::<Environment>().is_err());
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!("mongo".parse::<StoreBackend>().unwrap(), StoreBackend::Mongodb);
        assert!("postgres".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_business_offset() {
        let config = SubscriptionConfig::for_memory_store();
        assert_eq!(config.business.offset().unwrap().local_minus_utc(), 330 * 60);

        let bad = BusinessConfig {
            utc_offset_minutes: 24 * 60,
        };
        assert!(bad.offset().is_err());
    }

    #[test]
    fn test_memory_defaults_validate() {
        let config = SubscriptionConfig::for_memory_store();
        assert!(config.validate().is_ok());
        assert_eq!(config.report.char_limit, 42);
        assert_eq!(config.report.max_records, 5000);
    }

    #[test]
    fn test_zero_report_limit_fails_validation() {
        let mut config = SubscriptionConfig::for_memory_store();
        config.report.max_records = 0;
        assert!(matches!(config.validate(), Err(AppError::ConfigError(_))));
    }
}
