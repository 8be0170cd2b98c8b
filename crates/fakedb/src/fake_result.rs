//! Canned result rows registered by a test.
//!
//! A [`FakeResult`] is an ordered, keyed row buffer. It is a cheap handle: clones share the same
//! rows, so a test may keep adding rows after handing the buffer to an expectation, and every
//! cursor opened on it sees them.

use crate::error::DbResult;
use crate::value::{Row, Value, row_key, to_row};
use serde::Serialize;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct RowBuffer {
    rows: Vec<(String, Row)>,
}

impl RowBuffer {
    /// Insert or overwrite. An existing key keeps its position.
    fn insert(&mut self, key: String, row: Row) {
        match self.rows.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = row,
            None => self.rows.push((key, row)),
        }
    }
}

/// A shared buffer of fake result rows.
///
/// # Example
///
/// ```
/// use fakedb::FakeResult;
/// use serde_json::json;
///
/// let result = FakeResult::new();
/// result
///     .add_row(json!({"id": 1, "name": "a"}))?
///     .add_row(json!({"id": 2, "name": "b"}))?;
/// assert_eq!(result.len(), 2);
/// # Ok::<(), fakedb::DbError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct FakeResult {
    inner: Arc<Mutex<RowBuffer>>,
}

impl FakeResult {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer from rows, keyed as by [`FakeResult::add_rows`].
    pub fn with_rows<I, T>(rows: I) -> DbResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: Serialize,
    {
        let result = Self::new();
        result.add_rows(rows)?;
        Ok(result)
    }

    /// Add a row keyed by its `id` column, or by the current row count when it has none.
    ///
    /// A row whose key already exists replaces the earlier row in place; the key keeps its
    /// original position. This includes a row without `id` whose row-count key collides with
    /// an explicit id added earlier.
    pub fn add_row<T: Serialize>(&self, data: T) -> DbResult<&Self> {
        let row = to_row(data)?;
        self.insert(row, None);
        Ok(self)
    }

    /// Add a row under an explicit key. A `null` key behaves like [`FakeResult::add_row`].
    pub fn add_row_with_key<T: Serialize>(
        &self,
        data: T,
        key: impl Into<Value>,
    ) -> DbResult<&Self> {
        let row = to_row(data)?;
        self.insert(row, row_key(&key.into()));
        Ok(self)
    }

    /// Add many rows. Each row is keyed by its `id` column, or by its position in `rows`.
    pub fn add_rows<I, T>(&self, rows: I) -> DbResult<&Self>
    where
        I: IntoIterator<Item = T>,
        T: Serialize,
    {
        for (position, data) in rows.into_iter().enumerate() {
            let row = to_row(data)?;
            let key = row
                .get("id")
                .and_then(row_key)
                .unwrap_or_else(|| position.to_string());
            self.insert(row, Some(key));
        }
        Ok(self)
    }

    fn insert(&self, row: Row, key: Option<String>) {
        let mut buffer = self.inner.lock().unwrap();
        let key = key
            .or_else(|| row.get("id").and_then(row_key))
            .unwrap_or_else(|| buffer.rows.len().to_string());
        buffer.insert(key, row);
    }

    /// The row at a position (insertion order), if any.
    pub fn get_row(&self, index: usize) -> Option<Row> {
        let buffer = self.inner.lock().unwrap();
        buffer.rows.get(index).map(|(_, row)| row.clone())
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().rows.len()
    }

    /// Whether the buffer has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        let buffer = self.inner.lock().unwrap();
        buffer.rows.iter().map(|(key, _)| key.clone()).collect()
    }

    /// All rows in insertion order.
    pub fn rows(&self) -> Vec<Row> {
        let buffer = self.inner.lock().unwrap();
        buffer.rows.iter().map(|(_, row)| row.clone()).collect()
    }

    /// Whether two handles share the same buffer.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn add_row_keys_by_id() {
        let result = FakeResult::new();
        result
            .add_row(json!({"id": 10, "name": "a"}))
            .unwrap()
            .add_row(json!({"name": "b"}))
            .unwrap();

        assert_eq!(result.keys(), vec!["10", "1"]);
        assert_eq!(result.get_row(1).unwrap()["name"], json!("b"));
        assert!(result.get_row(2).is_none());
    }

    #[test]
    fn duplicate_key_overwrites_in_place() {
        let result = FakeResult::new();
        result.add_row(json!({"id": 1, "v": "first"})).unwrap();
        result.add_row(json!({"id": 2, "v": "second"})).unwrap();
        result.add_row(json!({"id": 1, "v": "replaced"})).unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result.keys(), vec!["1", "2"]);
        assert_eq!(result.get_row(0).unwrap()["v"], json!("replaced"));
    }

    #[test]
    fn row_count_key_can_collide_with_explicit_id() {
        // Legacy behavior: the implicit key is the row count, which may already be taken.
        let result = FakeResult::new();
        result.add_row(json!({"id": 0, "v": "zero"})).unwrap();
        result.add_row(json!({"id": 1, "v": "one"})).unwrap();
        result.add_row(json!({"v": "no id"})).unwrap();
        assert_eq!(result.len(), 3);

        result.add_row(json!({"id": 2, "v": "two"})).unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(result.get_row(2).unwrap()["v"], json!("two"));
    }

    #[test]
    fn explicit_key_wins_over_id() {
        let result = FakeResult::new();
        result.add_row_with_key(json!({"id": 5}), "five").unwrap();
        result.add_row_with_key(json!({"id": 6}), Value::Null).unwrap();
        assert_eq!(result.keys(), vec!["five", "6"]);
    }

    #[test]
    fn add_rows_uses_position_without_id() {
        let result =
            FakeResult::with_rows(vec![json!({"v": 1}), json!({"id": 7, "v": 2}), json!({"v": 3})])
                .unwrap();
        assert_eq!(result.keys(), vec!["0", "7", "2"]);
        assert_eq!(result.rows().len(), 3);
    }

    #[test]
    fn non_object_rows_are_rejected() {
        let result = FakeResult::new();
        assert!(result.add_row(json!("nope")).is_err());
        assert!(result.is_empty());
    }

    #[test]
    fn clones_share_rows() {
        let result = FakeResult::new();
        let handle = result.clone();
        handle.add_row(json!({"id": 1})).unwrap();
        assert_eq!(result.len(), 1);
        assert!(result.ptr_eq(&handle));
        assert!(!result.ptr_eq(&FakeResult::new()));
    }
}
