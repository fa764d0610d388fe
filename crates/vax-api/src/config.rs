//! # API Configuration
//!
//! Environment-based configuration for the API service. Parsing goes through
//! a lookup function so it can be exercised without touching the process
//! environment.

use std::env::VarError;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;
use vax_domain::CountryId;

/// Countries compared when a request does not name any.
pub const DEFAULT_COUNTRIES: [&str; 4] = ["brasil", "portugal", "italia", "usa"];

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address
    pub server_addr: SocketAddr,

    /// DuckDB file; `None` keeps observations in memory
    pub database_path: Option<PathBuf>,

    /// Countries used when a query omits its country list
    pub default_countries: Vec<CountryId>,

    /// Serve the GraphQL Playground on `GET /graphql`
    pub enable_playground: bool,

    /// Maximum query depth
    pub max_query_depth: usize,

    /// Maximum query complexity
    pub max_query_complexity: usize,

    /// Logging level
    pub log_level: String,

    /// CORS allowed origins
    pub cors_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key))
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable holds an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let or_default =
            |var: &str, default: &str| lookup(var).unwrap_or_else(|_| default.to_string());

        let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason,
        };

        let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
            or_default(var, default)
                .parse::<usize>()
                .map_err(|e| invalid(var, e.to_string()))
        };

        let server_addr = or_default("SERVER_ADDR", "0.0.0.0:8080")
            .parse::<SocketAddr>()
            .map_err(|e| invalid("SERVER_ADDR", e.to_string()))?;

        let database_path = lookup("DATABASE_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let default_countries = or_default("DEFAULT_COUNTRIES", &DEFAULT_COUNTRIES.join(","))
            .split(',')
            .filter(|c| !c.trim().is_empty())
            .map(CountryId::parse)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| invalid("DEFAULT_COUNTRIES", e.to_string()))?;
        if default_countries.is_empty() {
            return Err(invalid(
                "DEFAULT_COUNTRIES",
                "at least one country is required".to_string(),
            ));
        }

        Ok(Self {
            server_addr,
            database_path,
            default_countries,
            enable_playground: lookup("ENABLE_PLAYGROUND").map_or(true, |v| v == "true" || v == "1"),
            max_query_depth: parse_usize("MAX_QUERY_DEPTH", "10")?,
            max_query_complexity: parse_usize("MAX_QUERY_COMPLEXITY", "1000")?,
            log_level: or_default("LOG_LEVEL", "info"),
            cors_origins: or_default("CORS_ORIGINS", "*")
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database_path: None,
            default_countries: DEFAULT_COUNTRIES
                .iter()
                .filter_map(|c| CountryId::parse(c).ok())
                .collect(),
            enable_playground: true,
            max_query_depth: 10,
            max_query_complexity: 1000,
            log_level: "info".to_string(),
            cors_origins: vec!["*".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn test_defaults_without_env() {
        let map = HashMap::new();
        let config = Config::from_lookup(lookup_from_map(&map)).unwrap();
        let defaults = Config::default();

        assert_eq!(config.server_addr, defaults.server_addr);
        assert_eq!(config.default_countries, defaults.default_countries);
        assert_eq!(config.default_countries.len(), 4);
        assert!(config.database_path.is_none());
        assert!(config.enable_playground);
        assert_eq!(config.cors_origins, vec!["*".to_string()]);
    }

    #[test]
    fn test_overrides() {
        let mut map = HashMap::new();
        map.insert("SERVER_ADDR", "127.0.0.1:9000");
        map.insert("DATABASE_PATH", "/tmp/vax.duckdb");
        map.insert("DEFAULT_COUNTRIES", "Portugal, ITALIA");
        map.insert("ENABLE_PLAYGROUND", "false");
        map.insert("CORS_ORIGINS", "http://a.test, http://b.test");

        let config = Config::from_lookup(lookup_from_map(&map)).unwrap();
        assert_eq!(config.server_addr.port(), 9000);
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/vax.duckdb")));
        let names: Vec<_> = config.default_countries.iter().map(CountryId::as_str).collect();
        assert_eq!(names, vec!["portugal", "italia"]);
        assert!(!config.enable_playground);
        assert_eq!(config.cors_origins.len(), 2);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        let mut map = HashMap::new();
        map.insert("MAX_QUERY_DEPTH", "deep");
        let result = Config::from_lookup(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MAX_QUERY_DEPTH")
        );

        let mut map = HashMap::new();
        map.insert("SERVER_ADDR", "not-an-addr");
        assert!(Config::from_lookup(lookup_from_map(&map)).is_err());

        let mut map = HashMap::new();
        map.insert("DEFAULT_COUNTRIES", " , ");
        assert!(Config::from_lookup(lookup_from_map(&map)).is_err());
    }
}
