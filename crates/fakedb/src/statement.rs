//! Prepared statements: bind values, compile, and answer from the cache or the registry.
//!
//! # Example
//!
//! ```
//! use fakedb::prelude::*;
//! use serde_json::json;
//!
//! let db = FakeDatabase::new();
//! db.expect("SELECT * FROM test WHERE id=?")
//!     .with_parameters(params![1])
//!     .result()
//!     .add_row(json!({"id": 1, "tstamp": 343094400}))?;
//!
//! let mut stmt = db.prepare("SELECT * FROM test WHERE id=?")?;
//! let result = stmt.execute(&params![1])?.into_result()?;
//! assert_eq!(result.num_rows(), 1);
//! assert_eq!(result.get("tstamp"), Some(json!(343094400)));
//! # Ok::<(), fakedb::DbError>(())
//! ```

mod cache;

pub(crate) use cache::ResultCache;

use crate::cursor::{ResultCursor, ResultSet};
use crate::database::Engine;
use crate::error::{DbError, DbResult};
use crate::template::Template;
use crate::value::{Row, Value, to_row};
use serde::Serialize;
use std::sync::Arc;


/// The answer to an executed statement.
#[derive(Debug, Clone)]
pub enum Execution<R = ResultSet> {
    /// A matching expectation supplied rows.
    Rows(R),
    /// Nothing matched: the statement was acknowledged without a result set.
    Done {
        /// The canonical query that was executed.
        query: String,
    },
}

impl<R> Execution<R> {
    /// The result set, if any.
    pub fn rows(self) -> Option<R> {
        match self {
            Execution::Rows(result) => Some(result),
            Execution::Done { .. } => None,
        }
    }

    /// Whether the statement produced no result set.
    pub fn is_done(&self) -> bool {
        matches!(self, Execution::Done { .. })
    }

    /// The result set, or [`DbError::NotFound`] when the statement matched nothing.
    pub fn into_result(self) -> DbResult<R> {
        match self {
            Execution::Rows(result) => Ok(result),
            Execution::Done { query } => Err(DbError::not_found(format!(
                "no result set for query: {}",
                query
            ))),
        }
    }
}

/// Prepare/bind/execute contract of a statement.
pub trait PreparedStatement {
    /// Cursor type returned for statements that produce rows.
    type Result: ResultCursor;

    /// The current query text: the compiled SQL once executed, the template before that.
    fn query(&self) -> String;

    /// Expand the `%s` marker of an INSERT/UPDATE template from an associative map.
    fn set<T: Serialize>(&mut self, assignments: T) -> DbResult<&mut Self>;

    /// Append a LIMIT clause. `rows <= 0` uses the default row count, `offset < 0` becomes 0.
    fn limit(&mut self, rows: i64, offset: i64) -> &mut Self;

    /// Bind `values`, compile and execute, reusing a cached unmodified cursor for the same SQL.
    fn execute(&mut self, values: &[Value]) -> DbResult<Execution<Self::Result>>;

    /// Like [`PreparedStatement::execute`] but never reads or writes the result cache.
    fn execute_uncached(&mut self, values: &[Value]) -> DbResult<Execution<Self::Result>>;

    /// The error registered for the current query text, or an empty string.
    fn error(&self) -> DbResult<String>;

    /// Query plan information. The fake has none.
    fn explain(&self) -> Vec<Row> {
        Vec::new()
    }

    /// Number of rows changed by the last execution.
    fn affected_rows(&self) -> DbResult<u64> {
        Err(DbError::unsupported())
    }

    /// Auto-increment id generated by the last INSERT.
    fn insert_id(&self) -> DbResult<u64> {
        Err(DbError::unsupported())
    }
}

/// A statement prepared on a [`FakeDatabase`](crate::FakeDatabase).
///
/// The template is kept after execution, so the same statement can be executed again with
/// different values.
#[derive(Debug)]
pub struct Statement {
    engine: Arc<Engine>,
    template: Template,
    compiled: Option<String>,
}

impl Statement {
    pub(crate) fn prepare(engine: Arc<Engine>, sql: &str) -> DbResult<Self> {
        if sql.trim().is_empty() {
            return Err(DbError::EmptyQuery);
        }

        Ok(Self {
            engine,
            template: Template::parse(sql),
            compiled: None,
        })
    }

    /// The parsed template.
    pub fn template(&self) -> &Template {
        &self.template
    }

    fn run(&mut self, values: &[Value], cached: bool) -> DbResult<Execution> {
        let sql = self.template.render(values)?;
        self.compiled = Some(sql.clone());
        let cached = cached && self.engine.config.result_cache;
        self.engine.dispatch(sql, cached)
    }
}

impl PreparedStatement for Statement {
    type Result = ResultSet;

    fn query(&self) -> String {
        match &self.compiled {
            Some(sql) => sql.clone(),
            None => self.template.to_string(),
        }
    }

    fn set<T: Serialize>(&mut self, assignments: T) -> DbResult<&mut Self> {
        let row = to_row(assignments)?;
        self.template.set(&row);
        self.compiled = None;
        Ok(self)
    }

    fn limit(&mut self, rows: i64, offset: i64) -> &mut Self {
        let rows = u64::try_from(rows)
            .ok()
            .filter(|rows| *rows > 0)
            .unwrap_or(self.engine.config.default_limit);
        let offset = u64::try_from(offset).unwrap_or(0);
        self.template.limit(rows, offset);
        self.compiled = None;
        self
    }

    fn execute(&mut self, values: &[Value]) -> DbResult<Execution> {
        self.run(values, true)
    }

    fn execute_uncached(&mut self, values: &[Value]) -> DbResult<Execution> {
        self.run(values, false)
    }

    fn error(&self) -> DbResult<String> {
        let Some(sql) = &self.compiled else {
            return Ok(String::new());
        };
        let expectation = self.engine.registry.find(sql)?;
        Ok(expectation
            .and_then(|expectation| expectation.error())
            .unwrap_or_default())
    }
}
