//! Configuration for [`FakeDatabase`](crate::FakeDatabase).

use crate::monitor::SqlLogger;
use tracing::Level;

/// Row count used by `limit` when a non-positive count is requested.
pub const DEFAULT_LIMIT: u64 = 30;

/// Configuration for `FakeDatabase`.
#[derive(Debug, Clone)]
pub struct FakeDatabaseConfig {
    /// Whether `execute` reuses cursors by compiled query text.
    pub result_cache: bool,
    /// Row count substituted for a non-positive `limit`.
    pub default_limit: u64,
    /// Whether to collect execution statistics.
    pub stats_enabled: bool,
    /// Whether to emit executed SQL through `tracing`.
    pub logging_enabled: bool,
    /// SQL logger settings.
    pub logger: SqlLogger,
}

impl Default for FakeDatabaseConfig {
    fn default() -> Self {
        Self {
            result_cache: true,
            default_limit: DEFAULT_LIMIT,
            stats_enabled: true,
            logging_enabled: true,
            logger: SqlLogger::default(),
        }
    }
}

impl FakeDatabaseConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable the result cache; every `execute` consults the registry.
    pub fn no_result_cache(mut self) -> Self {
        self.result_cache = false;
        self
    }

    /// Set the row count used for a non-positive `limit`.
    pub fn default_limit(mut self, rows: u64) -> Self {
        self.default_limit = rows;
        self
    }

    /// Disable statistics collection.
    pub fn no_stats(mut self) -> Self {
        self.stats_enabled = false;
        self
    }

    /// Enable SQL logging.
    pub fn with_logging(mut self) -> Self {
        self.logging_enabled = true;
        self
    }

    /// Disable SQL logging.
    pub fn no_logging(mut self) -> Self {
        self.logging_enabled = false;
        self
    }

    /// Set the tracing level SQL is logged at.
    pub fn log_level(mut self, level: Level) -> Self {
        self.logger = self.logger.level(level);
        self
    }

    /// Set maximum SQL length to log.
    pub fn log_max_sql_length(mut self, len: usize) -> Self {
        self.logger = self.logger.max_sql_length(len);
        self
    }
}
