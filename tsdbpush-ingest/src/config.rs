use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Configuration for the write front end
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Address to bind the HTTP server to
    pub bind_address: String,

    /// Ingestion limits and settings
    pub ingestion: IngestionConfig,

    /// Concurrency and resource limits
    pub performance: PerformanceConfig,
}

/// Ingestion-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Maximum size of a single insert request in bytes, after
    /// decompression; shared across wire formats
    pub max_request_size: u64,
}

/// Concurrency and resource limits configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Maximum requests concurrently executing parse-and-insert
    pub max_concurrent_inserts: usize,

    /// How long a request may wait for an insert slot, in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:4242".to_string(),
            ingestion: IngestionConfig::default(),
            performance: PerformanceConfig::default(),
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            max_request_size: 32 * 1024 * 1024, // 32MB
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(8);
        Self {
            max_concurrent_inserts: cpus * 4,
            request_timeout_ms: 30000,
        }
    }
}

impl IngestConfig {
    /// Load configuration from file, environment variables, and defaults
    pub fn load() -> Result<Self> {
        let mut config = if let Ok(config_path) = env::var("CONFIG_PATH") {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        if let Ok(bind_addr) = env::var("TSDBPUSH_BIND_ADDRESS") {
            config.bind_address = bind_addr;
        }

        if let Ok(max_request_size) = env::var("TSDBPUSH_MAX_REQUEST_SIZE") {
            config.ingestion.max_request_size = max_request_size.parse()?;
        }

        if let Ok(max_concurrent) = env::var("TSDBPUSH_MAX_CONCURRENT_INSERTS") {
            config.performance.max_concurrent_inserts = max_concurrent.parse()?;
        }

        if let Ok(request_timeout) = env::var("TSDBPUSH_REQUEST_TIMEOUT_MS") {
            config.performance.request_timeout_ms = request_timeout.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn load_from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Self = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.bind_address.is_empty() {
            return Err(anyhow::anyhow!("Bind address cannot be empty"));
        }

        if self.ingestion.max_request_size == 0 {
            return Err(anyhow::anyhow!("Max request size must be greater than 0"));
        }

        if self.performance.max_concurrent_inserts == 0 {
            return Err(anyhow::anyhow!(
                "Max concurrent inserts must be greater than 0"
            ));
        }

        if self.performance.request_timeout_ms == 0 {
            return Err(anyhow::anyhow!("Request timeout must be greater than 0"));
        }

        Ok(())
    }

    /// Get the request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.performance.request_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = IngestConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ingestion.max_request_size, 32 * 1024 * 1024);
    }

    #[test]
    fn test_zero_limits_are_rejected() {
        let mut config = IngestConfig::default();
        config.ingestion.max_request_size = 0;
        assert!(config.validate().is_err());

        let mut config = IngestConfig::default();
        config.performance.max_concurrent_inserts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: IngestConfig =
            serde_yaml::from_str("ingestion:\n  max_request_size: 1024\n").unwrap();
        assert_eq!(config.ingestion.max_request_size, 1024);
        assert_eq!(config.bind_address, "0.0.0.0:4242");
        assert!(config.performance.max_concurrent_inserts > 0);
    }
}
