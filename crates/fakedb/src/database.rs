//! The fake connection handed to code under test.
//!
//! A [`FakeDatabase`] owns everything one test needs: the expectation registry, the result
//! cache, configuration and execution statistics. Nothing is process-global, so tests running
//! in parallel never see each other's expectations.

use crate::config::FakeDatabaseConfig;
use crate::cursor::{ResultCursor, ResultSet};
use crate::error::{DbError, DbResult};
use crate::monitor::{ExecutionOutcome, QueryStats, StatsMonitor};
use crate::registry::{Expectation, Outcome, QueryRegistry};
use crate::statement::{Execution, PreparedStatement, ResultCache, Statement};
use crate::value::{Row, escape_string};
use std::sync::Arc;

/// Connection contract: statement preparation, direct queries and schema helpers.
pub trait Connection {
    /// Statement type returned by [`Connection::prepare`].
    type Statement: PreparedStatement;

    /// Prepare a query template. Fails with [`DbError::EmptyQuery`] for a blank template.
    fn prepare(&self, sql: &str) -> DbResult<Self::Statement>;

    /// Send a query string as is: no placeholder substitution and no result cache.
    fn query(
        &self,
        sql: &str,
    ) -> DbResult<Execution<<Self::Statement as PreparedStatement>::Result>>;

    /// Prepare and execute a statement without bound values.
    fn execute(
        &self,
        sql: &str,
    ) -> DbResult<Execution<<Self::Statement as PreparedStatement>::Result>> {
        self.prepare(sql)?.execute(&[])
    }

    /// Prepare and execute a statement without bound values, bypassing the result cache.
    fn execute_uncached(
        &self,
        sql: &str,
    ) -> DbResult<Execution<<Self::Statement as PreparedStatement>::Result>> {
        self.prepare(sql)?.execute_uncached(&[])
    }

    /// Build a `FIND_IN_SET` expression. `set` is quoted unless it names a field.
    fn find_in_set(&self, key: &str, set: &str, is_field: bool) -> String {
        if is_field {
            format!("FIND_IN_SET({}, {})", key, set)
        } else {
            format!("FIND_IN_SET({}, {})", key, escape_string(set))
        }
    }

    /// Build a `FIND_IN_SET` expression over a list of values, joined with `,` and quoted.
    fn find_in_set_list<I, S>(&self, key: &str, set: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = set
            .into_iter()
            .map(|item| item.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.find_in_set(key, &joined, false)
    }

    /// Column metadata of a table.
    fn list_fields(&self, table: &str) -> DbResult<Vec<Row>> {
        let _ = table;
        Err(DbError::unsupported())
    }

    /// Switch the current database.
    fn set_database(&self, database: &str) -> DbResult<()> {
        let _ = database;
        Err(DbError::unsupported())
    }

    /// Size of a table in bytes.
    fn size_of(&self, table: &str) -> DbResult<u64> {
        let _ = table;
        Err(DbError::unsupported())
    }

    /// Next auto-increment id of a table.
    fn next_id(&self, table: &str) -> DbResult<u64> {
        let _ = table;
        Err(DbError::unsupported())
    }

    /// A server-generated UUID.
    fn uuid(&self) -> DbResult<String> {
        Err(DbError::unsupported())
    }
}

/// State shared by a database and every statement prepared on it.
#[derive(Debug)]
pub(crate) struct Engine {
    pub(crate) config: FakeDatabaseConfig,
    pub(crate) registry: Arc<QueryRegistry>,
    cache: ResultCache,
    stats: StatsMonitor,
}

impl Engine {
    fn new(config: FakeDatabaseConfig, registry: Arc<QueryRegistry>) -> Self {
        Self {
            config,
            registry,
            cache: ResultCache::new(),
            stats: StatsMonitor::new(),
        }
    }

    /// Answer a canonical query from the cache (when `cached`) or the registry.
    pub(crate) fn dispatch(&self, sql: String, cached: bool) -> DbResult<Execution> {
        let key = cached.then(|| ResultCache::key(&sql));

        if let Some(result) = key.as_deref().and_then(|key| self.cache.get(key)) {
            result.reset();
            self.report(&sql, ExecutionOutcome::CacheHit, cached);
            return Ok(Execution::Rows(result));
        }

        let Some(expectation) = self.registry.find(&sql)? else {
            self.report(&sql, ExecutionOutcome::Unmatched, cached);
            return Ok(Execution::Done { query: sql });
        };

        match expectation.outcome() {
            Outcome::Error(message) => {
                self.report(&sql, ExecutionOutcome::Failed, cached);
                Err(DbError::query_execution(message, sql))
            }
            Outcome::Rows(rows) => {
                let result = ResultSet::new(sql.clone(), rows);
                if let Some(key) = key {
                    self.cache.insert(key, result.clone());
                }
                self.report(&sql, ExecutionOutcome::Matched, cached);
                Ok(Execution::Rows(result))
            }
        }
    }

    fn report(&self, sql: &str, outcome: ExecutionOutcome, cached: bool) {
        if self.config.stats_enabled {
            self.stats.record(sql, outcome, cached);
        }
        if self.config.logging_enabled {
            self.config.logger.log(sql, outcome, cached);
        }
    }
}

/// An in-memory stand-in for a database connection.
///
/// # Example
///
/// ```
/// use fakedb::prelude::*;
/// use serde_json::json;
///
/// let db = FakeDatabase::new();
/// db.expect("INSERT INTO tl_member %s")
///     .with_assignments(json!({"firstname": "Leo"}))?
///     .will_fail_with("Duplicate entry");
///
/// let mut stmt = db.prepare("INSERT INTO tl_member %s")?;
/// let err = stmt.set(json!({"firstname": "Leo"}))?.execute(&[]).unwrap_err();
/// assert_eq!(
///     err.to_string(),
///     "Query error: Duplicate entry (INSERT INTO tl_member (firstname) VALUES ('Leo'))"
/// );
/// # Ok::<(), fakedb::DbError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FakeDatabase {
    engine: Arc<Engine>,
}

impl Default for FakeDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDatabase {
    /// Create a database with default configuration and an empty registry.
    pub fn new() -> Self {
        Self::with_config(FakeDatabaseConfig::default())
    }

    /// Create a database with the given configuration.
    pub fn with_config(config: FakeDatabaseConfig) -> Self {
        Self {
            engine: Arc::new(Engine::new(config, Arc::new(QueryRegistry::new()))),
        }
    }

    /// Use an existing registry, e.g. one shared between several fakes of one test.
    ///
    /// The result cache and statistics start empty.
    pub fn with_registry(self, registry: Arc<QueryRegistry>) -> Self {
        Self {
            engine: Arc::new(Engine::new(self.engine.config.clone(), registry)),
        }
    }

    /// The expectation registry.
    pub fn registry(&self) -> Arc<QueryRegistry> {
        Arc::clone(&self.engine.registry)
    }

    /// Register an expectation for `sql`.
    pub fn expect(&self, sql: impl Into<String>) -> Expectation {
        self.engine.registry.expect(sql)
    }

    /// The active configuration.
    pub fn config(&self) -> &FakeDatabaseConfig {
        &self.engine.config
    }

    /// Snapshot of execution statistics.
    pub fn stats(&self) -> QueryStats {
        self.engine.stats.stats()
    }

    /// Canonical SQL of every execution, oldest first.
    pub fn executed_queries(&self) -> Vec<String> {
        self.engine.stats.executed_queries()
    }

    /// Reset statistics and the execution log.
    pub fn reset_stats(&self) {
        self.engine.stats.reset();
    }

    /// Number of cursors held by the result cache.
    pub fn cached_results(&self) -> usize {
        self.engine.cache.len()
    }
}

impl Connection for FakeDatabase {
    type Statement = Statement;

    fn prepare(&self, sql: &str) -> DbResult<Statement> {
        Statement::prepare(Arc::clone(&self.engine), sql)
    }

    fn query(&self, sql: &str) -> DbResult<Execution> {
        if sql.trim().is_empty() {
            return Err(DbError::EmptyQuery);
        }
        self.engine.dispatch(sql.to_string(), false)
    }
}
