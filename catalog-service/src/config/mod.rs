use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub pagination: PaginationConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    /// `None` when `MONGODB_URI` is unset; the service still starts.
    pub uri: Option<Secret<String>>,
    pub database: String,
    pub collection: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationConfig {
    pub default_limit: i64,
    pub max_limit: i64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
        }
    }
}

impl PaginationConfig {
    fn validate(self) -> Result<Self, AppError> {
        if self.max_limit < 1 || self.default_limit < 1 || self.default_limit > self.max_limit {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "invalid pagination limits: default {} must be within [1, {}]",
                self.default_limit,
                self.max_limit
            )));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// `*` allows any origin.
    pub allowed_origins: Vec<String>,
}

impl CatalogConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env, bare env vars and APP__ prefix)
        let common_config = core_config::Config::load()?;

        let uri = env::var("MONGODB_URI")
            .ok()
            .filter(|uri| !uri.trim().is_empty())
            .map(Secret::new);

        let pagination = PaginationConfig {
            default_limit: get_parsed("CATALOG_DEFAULT_LIMIT", 10)?,
            max_limit: get_parsed("CATALOG_MAX_LIMIT", 100)?,
        }
        .validate()?;

        Ok(CatalogConfig {
            common: common_config,
            mongodb: MongoConfig {
                uri,
                database: get_env("MONGODB_DATABASE", "radiomart"),
                collection: get_env("MONGODB_COLLECTION", "products"),
            },
            pagination,
            cors: CorsConfig {
                allowed_origins: parse_origins(&get_env("CORS_ALLOWED_ORIGINS", "*")),
            },
        })
    }
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn get_parsed<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val.trim().parse().map_err(|e: T::Err| {
            AppError::ConfigError(anyhow::anyhow!("{} has an invalid value '{}': {}", key, val, e))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();

    if origins.is_empty() {
        vec!["*".to_string()]
    } else {
        origins
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_origins_splits_and_trims() {
        assert_eq!(
            parse_origins("http://a.test, http://b.test ,"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn parse_origins_defaults_to_wildcard() {
        assert_eq!(parse_origins(" , "), vec!["*".to_string()]);
    }

    #[test]
    fn pagination_defaults_are_valid() {
        assert!(PaginationConfig::default().validate().is_ok());
    }

    #[test]
    fn pagination_rejects_default_above_max() {
        let config = PaginationConfig {
            default_limit: 50,
            max_limit: 20,
        };
        assert!(matches!(config.validate(), Err(AppError::ConfigError(_))));
    }
}
