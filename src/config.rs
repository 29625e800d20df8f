//! Application configuration.
//!
//! Loaded from YAML files and environment variables. Every field has a
//! default so the report binary runs with no configuration at all.

use serde::Deserialize;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "SALESDB_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "SALESDB";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "SALESDB_LOG";
/// Environment variable selecting the log output format (`json` or `text`).
pub const LOG_FORMAT_ENV_VAR: &str = "SALESDB_LOG_FORMAT";

/// Path value that selects a private in-memory database.
pub const IN_MEMORY_PATH: &str = ":memory:";

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Parameters fed to the exercise queries.
    pub report: ReportConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the SQLite database file, or `:memory:`.
    pub path: String,
    /// Pool size. Ignored for in-memory databases, which need a single
    /// connection to see one database.
    pub max_connections: u32,
    /// Seconds to wait on a locked database before failing.
    pub busy_timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "./data/sales.db".to_string(),
            max_connections: 5,
            busy_timeout_secs: 30,
        }
    }
}

impl StorageConfig {
    /// In-memory storage, used by tests.
    pub fn in_memory() -> Self {
        Self {
            path: IN_MEMORY_PATH.to_string(),
            ..Self::default()
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.path == IN_MEMORY_PATH
    }
}

/// Arguments for the parameterised exercises.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Location filter for Q1.
    pub location: String,
    /// Minimum summed quantity for Q4.
    pub min_quantity: i64,
    /// Row limit for Q5.
    pub top_customers: i64,
    /// Spend threshold baked into the `high_value_customers` view.
    pub high_value_threshold: f64,
    /// Customer passed to the `get_customer_sales` procedure.
    pub customer_id: i64,
    /// Inclusive lower bound for Q11.
    pub amount_min: f64,
    /// Inclusive upper bound for Q11.
    pub amount_max: f64,
    /// Month (`YYYY-MM`) for the monthly top-sales report.
    pub month: String,
    /// Rank cut-off for the monthly top-sales report.
    pub monthly_top: i64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            location: "Nairobi".to_string(),
            min_quantity: 5,
            top_customers: 3,
            high_value_threshold: 15000.0,
            customer_id: 1,
            amount_min: 4000.0,
            amount_max: 9000.0,
            month: "2024-01".to_string(),
            monthly_top: 2,
        }
    }
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `config.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix
    pub fn load(path: Option<&str>) -> Result<Self, ::config::ConfigError> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Create config for testing.
    pub fn for_test() -> Self {
        Self {
            storage: StorageConfig::in_memory(),
            report: ReportConfig::default(),
        }
    }
}
