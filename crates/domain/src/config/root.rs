use serde::{Deserialize, Serialize};

use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::resolver::{parse_nameserver, ResolverConfig};

/// Main configuration structure for Ferrous Resolver
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Query engine policy and upstream nameservers
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. ferrous-resolver.toml in current directory
    /// 3. /etc/ferrous-resolver/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if std::path::Path::new("ferrous-resolver.toml").exists() {
            Self::from_file("ferrous-resolver.toml")?
        } else if std::path::Path::new("/etc/ferrous-resolver/config.toml").exists() {
            Self::from_file("/etc/ferrous-resolver/config.toml")?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply command-line overrides to configuration
    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if !overrides.nameservers.is_empty() {
            self.resolver.nameservers = overrides.nameservers;
        }
        if !overrides.search.is_empty() {
            self.resolver.search = overrides.search;
        }
        if let Some(timeout) = overrides.timeout {
            self.resolver.timeout = timeout;
        }
        if let Some(attempts) = overrides.attempts {
            self.resolver.attempts = attempts;
        }
        if let Some(ndots) = overrides.ndots {
            self.resolver.ndots = ndots;
        }
        if overrides.no_system {
            self.resolver.use_system = false;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolver.attempts == 0 {
            return Err(ConfigError::Validation(
                "attempts must be at least 1".to_string(),
            ));
        }

        if !self.resolver.timeout.is_finite() || !self.resolver.interval.is_finite() {
            return Err(ConfigError::Validation(
                "timeout and interval must be finite".to_string(),
            ));
        }

        for server in &self.resolver.nameservers {
            parse_nameserver(server)?;
        }

        Ok(())
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub nameservers: Vec<String>,
    pub search: Vec<String>,
    pub timeout: Option<f64>,
    pub attempts: Option<usize>,
    pub ndots: Option<u8>,
    pub no_system: bool,
    pub log_level: Option<String>,
}
