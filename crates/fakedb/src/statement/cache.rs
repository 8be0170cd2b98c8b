use crate::cursor::{ResultCursor, ResultSet};
use std::collections::HashMap;
use std::sync::Mutex;

/// Cursors keyed by a content hash of their canonical SQL.
///
/// Entries are never evicted; a cursor whose rows were written to is skipped instead.
#[derive(Debug, Default)]
pub(crate) struct ResultCache {
    inner: Mutex<HashMap<String, ResultSet>>,
}

impl ResultCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn key(sql: &str) -> String {
        blake3::hash(sql.as_bytes()).to_hex().to_string()
    }

    /// The cached cursor for `key`, unless it was modified.
    pub(crate) fn get(&self, key: &str) -> Option<ResultSet> {
        let result = self.inner.lock().unwrap().get(key).cloned()?;
        (!result.is_modified()).then_some(result)
    }

    pub(crate) fn insert(&self, key: String, result: ResultSet) {
        self.inner.lock().unwrap().insert(key, result);
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}
