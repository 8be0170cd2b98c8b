//! # fakedb
//!
//! An in-memory stand-in for a SQL database connection, for unit tests.
//!
//! ## Features
//!
//! - **Expectations**: register the exact statements the code under test will run, with the rows
//!   (or the error) each one answers
//! - **Real compilation**: `?` placeholders and the INSERT/UPDATE `%s` marker are expanded and
//!   escaped the way a MySQL driver would, so expectations match on canonical SQL
//! - **Cursors**: `fetch_assoc` / `first` / `next` / `prev` / `last` / `seek` over canned rows
//! - **Result cache**: repeated executions of the same SQL reuse the cursor until it is modified
//! - **Query monitoring**: executed SQL is logged through `tracing` and counted
//!
//! ## Example
//!
//! ```
//! use fakedb::prelude::*;
//! use serde_json::json;
//!
//! let db = FakeDatabase::new();
//! db.expect("SELECT * FROM tl_member WHERE username=?")
//!     .with_parameters(params!["leo"])
//!     .result()
//!     .add_row(json!({"id": 7, "username": "leo"}))?;
//!
//! let member = db
//!     .prepare("SELECT * FROM tl_member WHERE username=?")?
//!     .execute(&params!["leo"])?
//!     .into_result()?;
//! assert_eq!(member.get("id"), Some(json!(7)));
//!
//! // Statements without an expectation succeed without a result set.
//! assert!(db.execute("DELETE FROM tl_log")?.is_done());
//! # Ok::<(), fakedb::DbError>(())
//! ```

pub mod config;
pub mod cursor;
pub mod database;
pub mod error;
pub mod fake_result;
pub mod monitor;
pub mod prelude;
pub mod registry;
pub mod statement;
pub mod template;
pub mod value;

pub use config::{DEFAULT_LIMIT, FakeDatabaseConfig};
pub use cursor::{ResultCursor, ResultSet};
pub use database::{Connection, FakeDatabase};
pub use error::{DbError, DbResult};
pub use fake_result::FakeResult;
pub use monitor::{ExecutionOutcome, QueryStats, QueryType, SqlLogger, StatsMonitor};
pub use registry::{Expectation, Outcome, QueryRegistry};
pub use statement::{Execution, PreparedStatement, Statement};
pub use template::{Template, compile, compile_with_assignments};
pub use value::{Row, Value, escape, escape_string, to_row};
