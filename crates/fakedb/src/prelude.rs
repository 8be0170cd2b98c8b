//! Convenient imports for typical `fakedb` usage.
//!
//! Brings the connection, statement and cursor traits into scope so their methods resolve:
//!
//! ```ignore
//! use fakedb::prelude::*;
//! ```

pub use crate::params;
pub use crate::{
    Connection, DbError, DbResult, Execution, Expectation, FakeDatabase, FakeDatabaseConfig,
    FakeResult, PreparedStatement, QueryRegistry, ResultCursor, ResultSet, Row, Value,
};
