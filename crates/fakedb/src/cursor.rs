//! Stateful cursors over fake result rows.
//!
//! A [`ResultSet`] behaves like a streaming driver cursor over a [`FakeResult`]: rows are
//! pulled from the buffer one at a time as the cursor advances and kept in a local cache, so
//! the cursor can later move backwards, jump to the first or last row, or be reset and read
//! again. Field writes only touch the local cache and flag the result as modified.
//!
//! Positions follow the usual driver convention: before the first fetch the cursor sits
//! "before first" (`position() == None`).

use crate::error::{DbError, DbResult};
use crate::fake_result::FakeResult;
use crate::value::{Row, Value};
use std::sync::{Arc, Mutex};

#[cfg(test)]
mod tests;

/// Read and navigation contract of a query result.
pub trait ResultCursor {
    /// The canonical query text that produced this result.
    fn query(&self) -> String;

    /// Number of rows in the result.
    fn num_rows(&self) -> usize;

    /// Number of columns, taken from the first row.
    fn num_fields(&self) -> usize;

    /// Whether a field of any row was written through [`ResultCursor::set`].
    fn is_modified(&self) -> bool;

    /// Advance one row and return its values in column order; `None` at the end.
    fn fetch_row(&self) -> Option<Vec<Value>>;

    /// Advance one row and return it; `None` at the end.
    ///
    /// Once the end is reached the cursor is exhausted and keeps returning `None` until
    /// [`ResultCursor::reset`] or [`ResultCursor::seek`].
    fn fetch_assoc(&self) -> Option<Row>;

    /// Drain the cursor and return every row read so far, including earlier fetches.
    fn fetch_all_assoc(&self) -> Vec<Row>;

    /// Drain the cursor and return one column of every row (`null` where missing).
    fn fetch_each(&self, column: &str) -> Vec<Value> {
        self.fetch_all_assoc()
            .iter()
            .map(|row| row.get(column).cloned().unwrap_or(Value::Null))
            .collect()
    }

    /// The value at a column offset of the current row.
    fn fetch_field(&self, offset: usize) -> DbResult<Value> {
        let row = self.row()?;
        row.values().nth(offset).cloned().ok_or_else(|| {
            DbError::out_of_bounds(format!(
                "Invalid field offset {} (only {} fields in the row)",
                offset,
                row.len()
            ))
        })
    }

    /// Move to the first row.
    fn first(&self) -> bool;

    /// Move to the next row; `false` when there is none.
    fn next(&self) -> bool;

    /// Move to the previous row; `false` at the first row or before it.
    fn prev(&self) -> bool;

    /// Read all remaining rows and move to the last one.
    fn last(&self) -> bool;

    /// Position the cursor so the next fetch returns row `index`.
    ///
    /// Seeking on an empty result is a no-op.
    fn seek(&self, index: i64) -> DbResult<()>;

    /// Move back before the first row and clear exhaustion. Loaded rows and field writes
    /// are kept.
    fn reset(&self);

    /// The current row, moving to the first row if nothing was fetched yet.
    fn row(&self) -> DbResult<Row>;

    /// The current row's values in column order.
    fn row_values(&self) -> DbResult<Vec<Value>> {
        Ok(self.row()?.into_iter().map(|(_, value)| value).collect())
    }

    /// A field of the current row, moving to the first row if nothing was fetched yet.
    fn get(&self, column: &str) -> Option<Value>;

    /// Overwrite a field of the current row and mark the result as modified.
    fn set(&self, column: &str, value: Value) -> DbResult<()>;
}

#[derive(Debug)]
struct CursorState {
    query: String,
    source: FakeResult,
    /// Next row of `source` to pull.
    source_pos: usize,
    loaded: Vec<Row>,
    /// Last fetched position; -1 is "before first".
    index: isize,
    row_index: isize,
    done: bool,
    modified: bool,
}

impl CursorState {
    fn pull(&mut self) -> Option<Row> {
        let row = self.source.get_row(self.source_pos)?;
        self.source_pos += 1;
        Some(row)
    }

    fn fetch_assoc(&mut self) -> Option<Row> {
        if self.done {
            return None;
        }

        let next = (self.index + 1) as usize;
        if let Some(row) = self.loaded.get(next) {
            self.index += 1;
            return Some(row.clone());
        }

        match self.pull() {
            Some(row) => {
                self.loaded.push(row.clone());
                self.index = self.loaded.len() as isize - 1;
                Some(row)
            }
            None => {
                self.done = true;
                None
            }
        }
    }

    fn fetch_all(&mut self) {
        while self.fetch_assoc().is_some() {}
    }

    fn first(&mut self) -> bool {
        if self.loaded.is_empty() {
            if self.fetch_assoc().is_none() {
                return false;
            }
            self.row_index += 1;
        }
        self.index = 0;
        true
    }

    fn next(&mut self) -> bool {
        if self.done {
            return false;
        }

        let next = (self.index + 1) as usize;
        if next < self.loaded.len() {
            self.index += 1;
            return true;
        }

        if self.fetch_assoc().is_none() {
            return false;
        }
        self.row_index += 1;
        true
    }

    fn current(&mut self) -> Option<&mut Row> {
        if self.index < 0 && !self.first() {
            return None;
        }
        self.loaded.get_mut(self.index as usize)
    }
}

/// A cursor over a [`FakeResult`].
///
/// `ResultSet` is a handle: clones share the same cursor position and cached rows, which is
/// what lets the result cache hand the same cursor back to a later execution.
#[derive(Debug, Clone)]
pub struct ResultSet {
    inner: Arc<Mutex<CursorState>>,
}

impl ResultSet {
    /// Open a cursor over `source`, positioned before the first row.
    pub fn new(query: impl Into<String>, source: FakeResult) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CursorState {
                query: query.into(),
                source,
                source_pos: 0,
                loaded: Vec::new(),
                index: -1,
                row_index: -1,
                done: false,
                modified: false,
            })),
        }
    }

    /// The current position, `None` before the first row.
    pub fn position(&self) -> Option<usize> {
        let state = self.inner.lock().unwrap();
        usize::try_from(state.index).ok()
    }

    /// Index of the furthest row reached by `first`, `next` or `last`, `None` before that.
    pub fn row_index(&self) -> Option<usize> {
        let state = self.inner.lock().unwrap();
        usize::try_from(state.row_index).ok()
    }

    /// Whether a fetch ran past the last row.
    pub fn is_exhausted(&self) -> bool {
        self.inner.lock().unwrap().done
    }

    /// The row buffer this cursor reads from.
    pub fn source(&self) -> FakeResult {
        self.inner.lock().unwrap().source.clone()
    }

    /// Whether two handles share the same cursor.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl ResultCursor for ResultSet {
    fn query(&self) -> String {
        self.inner.lock().unwrap().query.clone()
    }

    fn num_rows(&self) -> usize {
        self.inner.lock().unwrap().source.len()
    }

    fn num_fields(&self) -> usize {
        let state = self.inner.lock().unwrap();
        state.source.get_row(0).map_or(0, |row| row.len())
    }

    fn is_modified(&self) -> bool {
        self.inner.lock().unwrap().modified
    }

    fn fetch_row(&self) -> Option<Vec<Value>> {
        let row = self.fetch_assoc()?;
        Some(row.into_iter().map(|(_, value)| value).collect())
    }

    fn fetch_assoc(&self) -> Option<Row> {
        self.inner.lock().unwrap().fetch_assoc()
    }

    fn fetch_all_assoc(&self) -> Vec<Row> {
        let mut state = self.inner.lock().unwrap();
        state.fetch_all();
        state.loaded.clone()
    }

    fn first(&self) -> bool {
        self.inner.lock().unwrap().first()
    }

    fn next(&self) -> bool {
        self.inner.lock().unwrap().next()
    }

    fn prev(&self) -> bool {
        let mut state = self.inner.lock().unwrap();
        if state.index < 1 {
            return false;
        }
        state.index -= 1;
        true
    }

    fn last(&self) -> bool {
        let mut state = self.inner.lock().unwrap();
        if !state.done {
            state.fetch_all();
        }
        state.done = true;
        state.index = state.loaded.len() as isize - 1;
        state.row_index = state.index;
        !state.loaded.is_empty()
    }

    fn seek(&self, index: i64) -> DbResult<()> {
        if index < 0 {
            return Err(DbError::out_of_bounds(format!(
                "Invalid index {} (must be >= 0)",
                index
            )));
        }

        let mut state = self.inner.lock().unwrap();
        let total = state.source.len();
        if total == 0 {
            return Ok(());
        }

        let target = index as usize;
        if target >= total {
            return Err(DbError::out_of_bounds(format!(
                "Invalid index {} (only {} rows in the result set)",
                index, total
            )));
        }

        while state.loaded.len() <= target {
            let Some(row) = state.pull() else {
                break;
            };
            state.loaded.push(row);
        }
        state.index = target as isize - 1;
        state.done = false;
        Ok(())
    }

    fn reset(&self) {
        let mut state = self.inner.lock().unwrap();
        state.index = -1;
        state.done = false;
    }

    fn row(&self) -> DbResult<Row> {
        let mut state = self.inner.lock().unwrap();
        match state.current() {
            Some(row) => Ok(row.clone()),
            None => Err(DbError::out_of_bounds("No current row in the result set")),
        }
    }

    fn get(&self, column: &str) -> Option<Value> {
        let mut state = self.inner.lock().unwrap();
        state.current()?.get(column).cloned()
    }

    fn set(&self, column: &str, value: Value) -> DbResult<()> {
        let mut state = self.inner.lock().unwrap();
        let Some(row) = state.current() else {
            return Err(DbError::out_of_bounds("No current row in the result set"));
        };
        row.insert(column.to_string(), value);
        state.modified = true;
        Ok(())
    }
}
