//! Registered query expectations.
//!
//! A test registers the statements it expects the code under test to run, together with the
//! rows (or the error) each one should produce:
//!
//! ```
//! use fakedb::{QueryRegistry, params, template::compile};
//! use serde_json::json;
//!
//! let registry = QueryRegistry::new();
//! registry
//!     .expect("SELECT * FROM test WHERE id=?")
//!     .with_parameters(params![1])
//!     .result()
//!     .add_row(json!({"id": 1, "tstamp": 343094400}))?;
//!
//! let sql = compile("SELECT * FROM test WHERE id=?", &params![1])?;
//! assert!(registry.find(&sql)?.is_some());
//! # Ok::<(), fakedb::DbError>(())
//! ```

use crate::error::DbResult;
use crate::fake_result::FakeResult;
use crate::template::{compile, compile_with_assignments};
use crate::value::{Row, Value, to_row};
use serde::Serialize;
use std::sync::{Arc, Mutex};

#[derive(Debug)]
struct ExpectationState {
    template: String,
    parameters: Vec<Value>,
    assignments: Option<Row>,
    result: Option<FakeResult>,
    error: Option<String>,
    compiled: Option<String>,
}

/// What a matched expectation answers with.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Return these rows.
    Rows(FakeResult),
    /// Fail the statement with this message.
    Error(String),
}

/// One expected statement: template, bound values and the canned outcome.
///
/// `Expectation` is a handle shared with the registry, so builder calls made after
/// registration are seen by later lookups.
#[derive(Debug, Clone)]
pub struct Expectation {
    inner: Arc<Mutex<ExpectationState>>,
}

impl Expectation {
    /// Create an unregistered expectation for a query template.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ExpectationState {
                template: template.into(),
                parameters: Vec::new(),
                assignments: None,
                result: None,
                error: None,
                compiled: None,
            })),
        }
    }

    /// Set the positional values bound to the template.
    pub fn with_parameters<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        {
            let mut state = self.inner.lock().unwrap();
            state.parameters = values.into_iter().map(Into::into).collect();
            state.compiled = None;
        }
        self
    }

    /// Set the associative map that expands the `%s` marker of an INSERT/UPDATE template.
    pub fn with_assignments<T: Serialize>(self, data: T) -> DbResult<Self> {
        let row = to_row(data)?;
        {
            let mut state = self.inner.lock().unwrap();
            state.assignments = Some(row);
            state.compiled = None;
        }
        Ok(self)
    }

    /// Answer matching statements with `result`.
    pub fn will_return(self, result: FakeResult) -> Self {
        self.inner.lock().unwrap().result = Some(result);
        self
    }

    /// Fail matching statements with `message`.
    pub fn will_fail_with(self, message: impl Into<String>) -> Self {
        self.inner.lock().unwrap().error = Some(message.into());
        self
    }

    /// The result buffer, created empty on first access.
    pub fn result(&self) -> FakeResult {
        let mut state = self.inner.lock().unwrap();
        state.result.get_or_insert_with(FakeResult::new).clone()
    }

    /// The registered error message, if any.
    pub fn error(&self) -> Option<String> {
        self.inner.lock().unwrap().error.clone()
    }

    /// The raw query template.
    pub fn template(&self) -> String {
        self.inner.lock().unwrap().template.clone()
    }

    /// The bound positional values.
    pub fn parameters(&self) -> Vec<Value> {
        self.inner.lock().unwrap().parameters.clone()
    }

    /// How a matching statement is answered. A registered error takes precedence.
    pub fn outcome(&self) -> Outcome {
        match self.error() {
            Some(message) => Outcome::Error(message),
            None => Outcome::Rows(self.result()),
        }
    }

    /// The canonical SQL of this expectation, compiled on first use.
    pub fn compiled_query(&self) -> DbResult<String> {
        let mut state = self.inner.lock().unwrap();
        if let Some(compiled) = &state.compiled {
            return Ok(compiled.clone());
        }

        let compiled = match &state.assignments {
            Some(assignments) => {
                compile_with_assignments(&state.template, &state.parameters, assignments)?
            }
            None => compile(&state.template, &state.parameters)?,
        };
        state.compiled = Some(compiled.clone());
        Ok(compiled)
    }

    /// Whether `sql` is exactly this expectation's canonical SQL.
    pub fn matches(&self, sql: &str) -> DbResult<bool> {
        Ok(self.compiled_query()? == sql)
    }
}

/// Ordered collection of expectations. The first match in registration order wins.
#[derive(Debug, Default)]
pub struct QueryRegistry {
    expectations: Mutex<Vec<Expectation>>,
}

impl QueryRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an expectation for `template` and return it for further setup.
    pub fn expect(&self, template: impl Into<String>) -> Expectation {
        self.register(Expectation::new(template))
    }

    /// Register a prepared expectation.
    pub fn register(&self, expectation: Expectation) -> Expectation {
        self.expectations.lock().unwrap().push(expectation.clone());
        expectation
    }

    /// Find the first expectation whose canonical SQL equals `sql`.
    ///
    /// An expectation whose own template cannot be compiled fails the lookup.
    pub fn find(&self, sql: &str) -> DbResult<Option<Expectation>> {
        let expectations = self.expectations.lock().unwrap().clone();
        for expectation in expectations {
            if expectation.matches(sql)? {
                return Ok(Some(expectation));
            }
        }
        Ok(None)
    }

    /// Number of registered expectations.
    pub fn len(&self) -> usize {
        self.expectations.lock().unwrap().len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all expectations.
    pub fn clear(&self) {
        self.expectations.lock().unwrap().clear();
    }
}
