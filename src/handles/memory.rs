use std::{cell::Cell, rc::Rc};

use super::{ColumnFlags, StatementHandle};
use crate::Error;

/// Counts the calls to the more interesting primitives of a [`MemoryStatement`]. Shared via `Rc`
/// so it can still be inspected after the statement has been moved into a cursor.
#[derive(Debug, Default)]
pub struct MemoryStats {
    metadata_fetches: Cell<usize>,
    resets: Cell<usize>,
    closes: Cell<usize>,
}

impl MemoryStats {
    /// Number of calls to [`StatementHandle::column_metadata`].
    pub fn metadata_fetches(&self) -> usize {
        self.metadata_fetches.get()
    }

    /// Number of calls to [`StatementHandle::reset`].
    pub fn resets(&self) -> usize {
        self.resets.get()
    }

    /// Number of calls to [`StatementHandle::close`] which actually released the statement.
    pub fn closes(&self) -> usize {
        self.closes.get()
    }

    fn bump(counter: &Cell<usize>) {
        counter.set(counter.get() + 1)
    }
}

/// A statement over rows which are already materialized in memory. Useful to put a cursor on top
/// of data which did not come out of the engine, and for testing.
///
/// ```
/// use lite_cursor::{Cursor, Statement, handles::MemoryStatement};
///
/// let mut handle = MemoryStatement::new("SELECT id, name FROM people", ["id", "name"]);
/// handle.push_row([Some("1"), Some("Alice")]);
///
/// let mut cursor = Cursor::new(Statement::new(handle));
/// cursor.open()?;
/// assert!(cursor.next()?);
/// assert_eq!(Some("Alice".to_owned()), cursor.get_text_by_name("name")?);
/// # Ok::<(), lite_cursor::Error>(())
/// ```
#[derive(Debug)]
pub struct MemoryStatement {
    sql: String,
    names: Vec<String>,
    flags: Vec<ColumnFlags>,
    rows: Vec<Vec<Option<String>>>,
    /// Index of the current row. `None` before the first call to `step`.
    position: Option<usize>,
    closed: bool,
    stats: Rc<MemoryStats>,
}

impl MemoryStatement {
    /// A statement without rows. All columns are described as nullable.
    pub fn new<I>(sql: impl Into<String>, column_names: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let names: Vec<String> = column_names.into_iter().map(Into::into).collect();
        let flags = vec![ColumnFlags::default(); names.len()];
        Self {
            sql: sql.into(),
            names,
            flags,
            rows: Vec::new(),
            position: None,
            closed: false,
            stats: Rc::new(MemoryStats::default()),
        }
    }

    /// Replaces the flags reported for the columns.
    ///
    /// # Panics
    ///
    /// If the number of flags does not match the number of columns.
    pub fn with_flags(mut self, flags: Vec<ColumnFlags>) -> Self {
        assert_eq!(self.names.len(), flags.len(), "One set of flags per column expected.");
        self.flags = flags;
        self
    }

    /// Appends a row to the result set.
    ///
    /// # Panics
    ///
    /// If the number of values does not match the number of columns.
    pub fn push_row<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let row: Vec<Option<String>> = row.into_iter().map(|v| v.map(Into::into)).collect();
        assert_eq!(self.names.len(), row.len(), "One value per column expected.");
        self.rows.push(row);
    }

    /// Counters shared with this statement.
    pub fn stats(&self) -> Rc<MemoryStats> {
        self.stats.clone()
    }

    fn current_row(&self, function: &'static str) -> Result<&[Option<String>], Error> {
        if self.closed {
            return Err(Error::engine(function, "statement has been closed"));
        }
        self.position
            .and_then(|position| self.rows.get(position))
            .map(Vec::as_slice)
            .ok_or_else(|| Error::engine(function, "no row is available"))
    }
}

impl StatementHandle for MemoryStatement {
    fn sql(&self) -> &str {
        &self.sql
    }

    fn reset(&mut self) -> Result<(), Error> {
        MemoryStats::bump(&self.stats.resets);
        self.position = None;
        Ok(())
    }

    fn step(&mut self) -> Result<bool, Error> {
        if self.closed {
            return Err(Error::engine("step", "statement has been closed"));
        }
        // Stay behind the last row once exhausted.
        let next = self.position.map_or(0, |position| position + 1).min(self.rows.len());
        self.position = Some(next);
        Ok(next < self.rows.len())
    }

    fn column_count(&self) -> usize {
        self.names.len()
    }

    fn column_name(&self, index: usize) -> Result<String, Error> {
        self.names
            .get(index)
            .cloned()
            .ok_or_else(|| Error::engine("column_name", format!("no column at index {index}")))
    }

    fn column_text(&self, index: usize) -> Result<Option<String>, Error> {
        self.current_row("column_text")?
            .get(index)
            .cloned()
            .ok_or_else(|| Error::engine("column_text", format!("no column at index {index}")))
    }

    fn column_metadata(&self) -> Result<Vec<ColumnFlags>, Error> {
        if self.closed {
            return Err(Error::engine("column_metadata", "statement has been closed"));
        }
        MemoryStats::bump(&self.stats.metadata_fetches);
        Ok(self.flags.clone())
    }

    fn close(&mut self) -> Result<(), Error> {
        if !self.closed {
            MemoryStats::bump(&self.stats.closes);
            self.closed = true;
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryStatement, StatementHandle};

    #[test]
    fn step_stays_behind_last_row() {
        let mut stmt = MemoryStatement::new("SELECT a FROM t", ["a"]);
        stmt.push_row([Some("1")]);

        assert!(stmt.step().unwrap());
        assert_eq!(Some("1".to_owned()), stmt.column_text(0).unwrap());
        assert!(!stmt.step().unwrap());
        assert!(!stmt.step().unwrap());
        assert!(stmt.column_text(0).is_err());
    }

    #[test]
    fn reset_rewinds() {
        let mut stmt = MemoryStatement::new("SELECT a FROM t", ["a"]);
        stmt.push_row([Some("1")]);
        stmt.step().unwrap();
        stmt.step().unwrap();

        stmt.reset().unwrap();

        assert!(stmt.step().unwrap());
        assert_eq!(1, stmt.stats().resets());
    }

    #[test]
    fn closing_twice_releases_once() {
        let mut stmt = MemoryStatement::new("SELECT a FROM t", ["a"]);
        stmt.close().unwrap();
        stmt.close().unwrap();

        assert!(stmt.is_closed());
        assert_eq!(1, stmt.stats().closes());
        assert!(stmt.step().is_err());
    }
}
