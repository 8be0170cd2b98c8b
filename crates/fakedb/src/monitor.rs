//! Execution logging and statistics.
//!
//! Every statement execution is reported to a [`StatsMonitor`] and, when enabled, emitted as a
//! `tracing` event under the `fakedb.sql` target:
//!
//! ```text
//! DEBUG fakedb.sql: query_type=Select outcome=Matched cached=false sql=SELECT * FROM test WHERE id=1
//! ```

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::Level;

fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

pub(crate) fn starts_with_keyword(s: &str, keyword: &str) -> bool {
    match s.get(0..keyword.len()) {
        Some(prefix) => prefix.eq_ignore_ascii_case(keyword),
        None => false,
    }
}

/// The type of SQL operation being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    /// SELECT query
    Select,
    /// INSERT statement
    Insert,
    /// UPDATE statement
    Update,
    /// DELETE statement
    Delete,
    /// Other SQL (e.g., DDL, custom)
    Other,
}

impl QueryType {
    /// Detect query type from the leading keyword (case-insensitive).
    pub fn from_sql(sql: &str) -> Self {
        let trimmed = sql.trim_start();
        if starts_with_keyword(trimmed, "SELECT") {
            QueryType::Select
        } else if starts_with_keyword(trimmed, "INSERT") {
            QueryType::Insert
        } else if starts_with_keyword(trimmed, "UPDATE") {
            QueryType::Update
        } else if starts_with_keyword(trimmed, "DELETE") {
            QueryType::Delete
        } else {
            QueryType::Other
        }
    }
}

/// How an execution was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Served from the result cache.
    CacheHit,
    /// A registered expectation supplied a result set.
    Matched,
    /// No expectation matched; the statement was acknowledged without rows.
    Unmatched,
    /// A registered expectation failed the statement.
    Failed,
}

/// Emits executed SQL through `tracing`.
#[derive(Debug, Clone)]
pub struct SqlLogger {
    /// Tracing event level to emit at.
    pub level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for SqlLogger {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

impl SqlLogger {
    /// Create a new logger with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub(crate) fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }

    /// Emit one execution event.
    pub fn log(&self, sql: &str, outcome: ExecutionOutcome, cached: bool) {
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let sql = self.truncate_sql(sql);
        emit_at_level!(
            self.level,
            target: "fakedb.sql",
            query_type = ?QueryType::from_sql(&sql),
            outcome = ?outcome,
            cached,
            sql = %sql
        );
    }
}

/// Collected execution statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryStats {
    /// Total number of executions.
    pub total_queries: u64,
    /// Executions answered from the result cache.
    pub cache_hits: u64,
    /// Cached executions that had to consult the registry.
    pub cache_misses: u64,
    /// Executions answered by a registered result.
    pub matched: u64,
    /// Executions no expectation matched.
    pub unmatched: u64,
    /// Executions failed by a registered error.
    pub failed: u64,
    /// Number of SELECT queries.
    pub select_count: u64,
    /// Number of INSERT queries.
    pub insert_count: u64,
    /// Number of UPDATE queries.
    pub update_count: u64,
    /// Number of DELETE queries.
    pub delete_count: u64,
}

/// Counts executions and remembers the canonical SQL of each one.
#[derive(Debug, Default)]
pub struct StatsMonitor {
    total_queries: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    matched: AtomicU64,
    unmatched: AtomicU64,
    failed: AtomicU64,
    select_count: AtomicU64,
    insert_count: AtomicU64,
    update_count: AtomicU64,
    delete_count: AtomicU64,
    executed: Mutex<Vec<String>>,
}

impl StatsMonitor {
    /// Create a new stats monitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a snapshot of current statistics.
    pub fn stats(&self) -> QueryStats {
        QueryStats {
            total_queries: self.total_queries.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            matched: self.matched.load(Ordering::Relaxed),
            unmatched: self.unmatched.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            select_count: self.select_count.load(Ordering::Relaxed),
            insert_count: self.insert_count.load(Ordering::Relaxed),
            update_count: self.update_count.load(Ordering::Relaxed),
            delete_count: self.delete_count.load(Ordering::Relaxed),
        }
    }

    /// Canonical SQL of every execution, oldest first.
    pub fn executed_queries(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    /// Reset all counters and the execution log.
    pub fn reset(&self) {
        for counter in [
            &self.total_queries,
            &self.cache_hits,
            &self.cache_misses,
            &self.matched,
            &self.unmatched,
            &self.failed,
            &self.select_count,
            &self.insert_count,
            &self.update_count,
            &self.delete_count,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        self.executed.lock().unwrap().clear();
    }

    /// Record one execution. `cached` is whether the result cache was consulted.
    pub fn record(&self, sql: &str, outcome: ExecutionOutcome, cached: bool) {
        self.total_queries.fetch_add(1, Ordering::Relaxed);

        match QueryType::from_sql(sql) {
            QueryType::Select => self.select_count.fetch_add(1, Ordering::Relaxed),
            QueryType::Insert => self.insert_count.fetch_add(1, Ordering::Relaxed),
            QueryType::Update => self.update_count.fetch_add(1, Ordering::Relaxed),
            QueryType::Delete => self.delete_count.fetch_add(1, Ordering::Relaxed),
            QueryType::Other => 0,
        };

        match outcome {
            ExecutionOutcome::CacheHit => {
                self.cache_hits.fetch_add(1, Ordering::Relaxed);
            }
            ExecutionOutcome::Matched => {
                self.matched.fetch_add(1, Ordering::Relaxed);
            }
            ExecutionOutcome::Unmatched => {
                self.unmatched.fetch_add(1, Ordering::Relaxed);
            }
            ExecutionOutcome::Failed => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
        if cached && outcome != ExecutionOutcome::CacheHit {
            self.cache_misses.fetch_add(1, Ordering::Relaxed);
        }

        self.executed.lock().unwrap().push(sql.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_type_detection() {
        assert_eq!(QueryType::from_sql("SELECT * FROM users"), QueryType::Select);
        assert_eq!(QueryType::from_sql("  select * FROM users"), QueryType::Select);
        assert_eq!(QueryType::from_sql("INSERT INTO users %s"), QueryType::Insert);
        assert_eq!(QueryType::from_sql("update users %s"), QueryType::Update);
        assert_eq!(QueryType::from_sql("DELETE FROM users"), QueryType::Delete);
        assert_eq!(QueryType::from_sql("SHOW TABLES"), QueryType::Other);
        assert_eq!(QueryType::from_sql("SEL"), QueryType::Other);
    }

    #[test]
    fn test_logger_truncation() {
        let logger = SqlLogger::new().max_sql_length(10);
        assert_eq!(logger.truncate_sql("SELECT * FROM users"), "SELECT * F...");
        assert_eq!(logger.truncate_sql("SELECT 1"), "SELECT 1");
        assert_eq!(
            SqlLogger::new().no_truncate().truncate_sql("SELECT * FROM users"),
            "SELECT * FROM users"
        );
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let logger = SqlLogger::new().max_sql_length(9);
        assert_eq!(logger.truncate_sql("SELECT 'ü'"), "SELECT '...");
    }

    #[test]
    fn test_stats_monitor() {
        let monitor = StatsMonitor::new();
        monitor.record("SELECT 1", ExecutionOutcome::Matched, true);
        monitor.record("SELECT 1", ExecutionOutcome::CacheHit, true);
        monitor.record("DELETE FROM t", ExecutionOutcome::Unmatched, false);
        monitor.record("UPDATE t SET a=1", ExecutionOutcome::Failed, true);

        let stats = monitor.stats();
        assert_eq!(stats.total_queries, 4);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.cache_misses, 2);
        assert_eq!(stats.matched, 1);
        assert_eq!(stats.unmatched, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.select_count, 2);
        assert_eq!(stats.delete_count, 1);
        assert_eq!(stats.update_count, 1);
        assert_eq!(
            monitor.executed_queries(),
            vec!["SELECT 1", "SELECT 1", "DELETE FROM t", "UPDATE t SET a=1"]
        );

        monitor.reset();
        assert_eq!(monitor.stats(), QueryStats::default());
        assert!(monitor.executed_queries().is_empty());
    }
}
