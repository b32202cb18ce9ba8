use std::{mem, thread::panicking};

use log::{debug, warn};

use crate::{
    Error, Value,
    buffers::{PendingUpdates, StagedRow, StagingRow},
    column_catalog::ColumnCatalog,
    handles::{ColumnFlags, StatementHandle},
    statement::{AsStatement, Statement},
};

/// Options governing the lifetime of a [`Cursor`] and the number of rows it yields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CursorOptions {
    /// Maximum number of rows the cursor yields. `0` means unlimited. If the statement carries a
    /// limit of its own (see [`Statement::set_max_rows`]) the smaller of the two applies.
    pub row_limit: usize,
    /// If `true` closing the cursor also closes the statement it has been opened on. This happens
    /// at most once.
    pub close_statement: bool,
}

/// Receives rows staged with a [`Cursor`] and writes them to storage.
pub trait RowWriter {
    /// Write a row staged with [`Cursor::move_to_insert_row`].
    fn insert(&mut self, row: StagedRow<'_>) -> Result<(), Error>;

    /// Write a row staged with [`Cursor::begin_row_update`]. [`StagedRow::current`] holds the
    /// values of the row before the update.
    fn update(&mut self, row: StagedRow<'_>) -> Result<(), Error>;
}

/// Forward only cursor over the result set of a [`Statement`]. Next to reading values, the cursor
/// can stage a new row, or an update to the current row, and hand it to a [`RowWriter`].
///
/// A cursor is created closed. [`Self::open`] fixes the columns of the result set and
/// [`Self::close`] releases everything derived from it and rewinds the statement, so the same
/// cursor and statement can be reused for the next execution.
///
/// Cursors are not synchronized in any way. A cursor and its statement must be driven by one
/// thread at a time.
///
/// ```
/// use lite_cursor::{Cursor, Statement, handles::MemoryStatement};
///
/// let mut handle = MemoryStatement::new("SELECT id, name FROM people", ["id", "people.name"]);
/// handle.push_row([Some("1"), Some("Alice")]);
/// handle.push_row([Some("2"), None]);
/// let mut statement = Statement::new(handle);
///
/// let mut cursor = Cursor::new(&mut statement);
/// cursor.open()?;
/// let mut names = Vec::new();
/// while cursor.next()? {
///     names.push(cursor.get_text_by_name("name")?);
/// }
/// assert_eq!(vec![Some("Alice".to_owned()), None], names);
/// cursor.close()?;
/// # Ok::<(), lite_cursor::Error>(())
/// ```
pub struct Cursor<S: AsStatement> {
    statement: S,
    options: CursorOptions,
    /// Column names, flags and cached ordinals of the open result set. `None` if and only if the
    /// cursor is closed.
    catalog: Option<ColumnCatalog>,
    /// Number of rows advanced over. `0` before the first row.
    row: usize,
    /// Effective row limit of the open result set. `0` means unlimited.
    row_limit: usize,
    /// The engine reported that no further rows are available.
    exhausted: bool,
    /// Column accessed by the last getter, consulted by `was_null`.
    last_column: Option<i32>,
    on_insert_row: bool,
    staging: Option<StagingRow>,
    pending: Option<PendingUpdates>,
    /// One shot guard. Cleared before the statement is closed, so it is closed at most once.
    close_statement: bool,
}

impl<S> Drop for Cursor<S>
where
    S: AsStatement,
{
    fn drop(&mut self) {
        if !self.is_open() {
            return;
        }
        if let Err(e) = self.close() {
            // Avoid panicking, if we already have a panic. We don't want to mask the original
            // error.
            if !panicking() {
                panic!("Unexpected error closing cursor: {e:?}")
            }
        }
    }
}

impl<S> Cursor<S>
where
    S: AsStatement,
{
    /// A closed cursor over `statement`, using default options.
    pub fn new(statement: S) -> Self {
        Self::with_options(statement, CursorOptions::default())
    }

    /// A closed cursor over `statement`.
    pub fn with_options(statement: S, options: CursorOptions) -> Self {
        Self {
            statement,
            options,
            catalog: None,
            row: 0,
            row_limit: 0,
            exhausted: false,
            last_column: None,
            on_insert_row: false,
            staging: None,
            pending: None,
            close_statement: options.close_statement,
        }
    }

    /// Statement the cursor has been created for.
    pub fn statement(&self) -> &Statement<S::Handle> {
        self.statement.as_statement()
    }

    /// Controls whether the next call to [`Self::close`] also closes the statement.
    pub fn set_close_statement(&mut self, close_statement: bool) {
        self.close_statement = close_statement;
    }

    /// Opens the cursor on the result set of the executed statement. This is the only place the
    /// number of columns is determined. Any state derived from a previous result set is discarded
    /// first, including cached column ordinals and metadata. If the cursor is already open, the
    /// statement is rewound, so iteration starts over at the first row.
    pub fn open(&mut self) -> Result<(), Error> {
        if self.statement.as_statement().is_closed() {
            return Err(Error::StatementClosed);
        }
        if self.is_open() {
            debug!("Cursor reopened without being closed. Discarding previous result set.");
            // Like `close`, but the statement stays open even if the cursor is responsible for it.
            self.release();
            self.statement.as_statement_mut().handle_mut().reset()?;
        }
        let statement = self.statement.as_statement();
        let catalog = ColumnCatalog::from_handle(statement.handle())?;
        self.row_limit = effective_limit(self.options.row_limit, statement.max_rows());
        debug!(
            "Opened cursor over '{}' with {} columns.",
            statement.handle().sql(),
            catalog.len()
        );
        self.catalog = Some(catalog);
        Ok(())
    }

    /// Closes the cursor. Column names, metadata, cached ordinals and any staged row are released
    /// and the statement is reset. If the cursor is responsible for its statement, the statement
    /// is closed as well. Calling `close` on a closed cursor is safe.
    pub fn close(&mut self) -> Result<(), Error> {
        if self.is_open() {
            debug!("Closing cursor after {} rows.", self.row);
        }
        self.release();

        let statement = self.statement.as_statement_mut();
        if statement.is_closed() {
            return Ok(());
        }
        statement.handle_mut().reset()?;
        if mem::take(&mut self.close_statement) {
            statement.close()?;
        }
        Ok(())
    }

    /// Drops all state derived from the open result set.
    fn release(&mut self) {
        self.catalog = None;
        self.staging = None;
        self.pending = None;
        self.on_insert_row = false;
        self.row = 0;
        self.row_limit = 0;
        self.exhausted = false;
        self.last_column = None;
    }

    /// `true` if a result set is open and can be iterated.
    pub fn is_open(&self) -> bool {
        self.catalog.is_some()
    }

    /// `true` if the cursor is not open.
    pub fn is_closed(&self) -> bool {
        !self.is_open()
    }

    fn check_open(&self) -> Result<&ColumnCatalog, Error> {
        self.catalog.as_ref().ok_or(Error::ClosedCursor)
    }

    fn check_open_mut(&mut self) -> Result<&mut ColumnCatalog, Error> {
        self.catalog.as_mut().ok_or(Error::ClosedCursor)
    }

    /// Takes `column` in `[1,n]` form, checks it and remembers it as the last accessed column.
    /// Returns the column in `[0,n-1]` form.
    fn mark_column(&mut self, column: i32) -> Result<usize, Error> {
        let index = self.check_open()?.check_column(column)?;
        self.last_column = Some(column);
        Ok(index)
    }

    /// Advances the cursor to the next row.
    ///
    /// # Return
    ///
    /// `false` once the result set is exhausted, or the row limit has been reached. The cursor
    /// stays open in that case.
    ///
    /// Any row staged but not flushed is abandoned.
    pub fn next(&mut self) -> Result<bool, Error> {
        self.check_open()?;
        self.last_column = None;
        if self.on_insert_row || self.staging.is_some() {
            warn!("Advancing cursor abandons a staged row which has not been flushed.");
            self.finish_staging();
        }
        if self.exhausted {
            return Ok(false);
        }
        if self.row_limit != 0 && self.row >= self.row_limit {
            self.exhausted = true;
            return Ok(false);
        }
        if self.statement.as_statement_mut().handle_mut().step()? {
            self.row += 1;
            Ok(true)
        } else {
            self.exhausted = true;
            Ok(false)
        }
    }

    /// Number of the current row, starting with `1`. `0` before the first row or if the cursor is
    /// closed. Keeps the number of the last row once the result set is exhausted.
    pub fn row(&self) -> usize {
        self.row
    }

    /// `true` if the cursor is open and `next` has not been called yet.
    pub fn is_before_first(&self) -> bool {
        self.is_open() && self.row == 0 && !self.exhausted
    }

    /// `true` if the cursor is positioned on the first row.
    pub fn is_first(&self) -> bool {
        self.row == 1 && !self.exhausted
    }

    /// `true` if the cursor has moved past the last row of a non empty result set.
    pub fn is_after_last(&self) -> bool {
        self.exhausted && self.row > 0
    }

    fn has_current_row(&self) -> bool {
        self.row > 0 && !self.exhausted
    }

    /// Number of columns in the result set.
    pub fn column_count(&self) -> Result<usize, Error> {
        Ok(self.check_open()?.len())
    }

    /// Name of the column with the one based index `column`.
    pub fn column_name(&self, column: i32) -> Result<&str, Error> {
        self.check_open()?.name(column)
    }

    /// Names of all columns of the result set.
    pub fn column_names(&self) -> Result<&[String], Error> {
        Ok(self.check_open()?.names())
    }

    /// Resolves a column label to its one based index.
    ///
    /// A column matches if its name equals `label`, or ends with `.label`, ignoring case in both
    /// cases. Exactly one column must match, otherwise [`Error::AmbiguousColumnName`] or
    /// [`Error::NoSuchColumnName`] is returned. Results are cached per label until the cursor is
    /// closed.
    pub fn find_column(&mut self, label: &str) -> Result<i32, Error> {
        self.check_open_mut()?.resolve(label)
    }

    /// Value of the column with one based index `column` within the current row, as text. `None`
    /// indicates `NULL`.
    pub fn get_text(&mut self, column: i32) -> Result<Option<String>, Error> {
        let index = self.mark_column(column)?;
        self.statement.as_statement().handle().column_text(index)
    }

    /// Value of the column identified by `label` within the current row, as text.
    pub fn get_text_by_name(&mut self, label: &str) -> Result<Option<String>, Error> {
        let column = self.find_column(label)?;
        self.get_text(column)
    }

    /// `true` if the value last read by a getter has been `NULL`. `false` if no value has been read
    /// since the cursor has been advanced.
    pub fn was_null(&self) -> Result<bool, Error> {
        let catalog = self.check_open()?;
        let Some(column) = self.last_column else {
            return Ok(false);
        };
        let index = catalog.check_column(column)?;
        let text = self.statement.as_statement().handle().column_text(index)?;
        Ok(text.is_none())
    }

    /// Makes sure the column flags have been fetched from the engine. The first call per open
    /// result set fetches them, subsequent calls do nothing.
    pub fn check_meta(&mut self) -> Result<(), Error> {
        let catalog = self.catalog.as_mut().ok_or(Error::ClosedCursor)?;
        catalog.flags(self.statement.as_statement().handle())?;
        Ok(())
    }

    /// Flags of the column with one based index `column`.
    pub fn column_flags(&mut self, column: i32) -> Result<ColumnFlags, Error> {
        self.check_meta()?;
        let catalog = self.catalog.as_mut().ok_or(Error::ClosedCursor)?;
        let index = catalog.check_column(column)?;
        let flags = catalog.flags(self.statement.as_statement().handle())?;
        flags.get(index).copied().ok_or_else(|| {
            Error::engine(
                "column_metadata",
                format!("no flags reported for column {column}"),
            )
        })
    }

    /// `true` if the column may hold `NULL`.
    pub fn is_nullable(&mut self, column: i32) -> Result<bool, Error> {
        Ok(self.column_flags(column)?.could_be_nullable())
    }

    /// `true` if the column is part of the primary key.
    pub fn is_primary_key(&mut self, column: i32) -> Result<bool, Error> {
        Ok(self.column_flags(column)?.primary_key)
    }

    /// `true` if values of the column are generated on insert.
    pub fn is_auto_increment(&mut self, column: i32) -> Result<bool, Error> {
        Ok(self.column_flags(column)?.auto_increment)
    }

    /// `true` while a new row is being staged with [`Self::move_to_insert_row`].
    pub fn is_on_insert_row(&self) -> bool {
        self.on_insert_row
    }

    /// Row staged for insertion or update. Reflects pending updates only after
    /// [`Self::merge_updates`].
    pub fn staged_row(&self) -> Option<&StagingRow> {
        self.staging.as_ref()
    }

    /// Edits staged with [`Self::update_value`] which are part of the current staging cycle.
    pub fn pending_updates(&self) -> Option<&PendingUpdates> {
        self.pending.as_ref()
    }

    fn ensure_insertable(&mut self) -> Result<(), Error> {
        if self.catalog.as_ref().is_none_or(ColumnCatalog::is_empty) {
            return Err(Error::MissingMetadata);
        }
        self.pending.get_or_insert_with(PendingUpdates::new);
        Ok(())
    }

    fn ensure_updatable(&mut self) -> Result<(), Error> {
        self.check_open()?;
        self.pending.get_or_insert_with(PendingUpdates::new);
        Ok(())
    }

    /// Starts a new staging cycle with a fresh staging row and no pending updates. Values of the
    /// current row are read before anything is replaced, so a failing read leaves the previous
    /// staging state untouched.
    fn reset_staging_buffer(&mut self, copy_current_row: bool) -> Result<(), Error> {
        let num_cols = self.check_open()?.len();
        let row = if copy_current_row {
            let handle = self.statement.as_statement().handle();
            let current = (0..num_cols)
                .map(|index| handle.column_text(index))
                .collect::<Result<_, _>>()?;
            StagingRow::from_current(current)
        } else {
            StagingRow::empty(num_cols)
        };
        self.staging = Some(row);
        self.pending = Some(PendingUpdates::new());
        Ok(())
    }

    /// Ends the current staging cycle.
    fn finish_staging(&mut self) {
        self.staging = None;
        self.pending = None;
        self.on_insert_row = false;
    }

    /// Positions the cursor on the insert row. All cells of the staged row start out as `NULL`,
    /// regardless of the rows iterated so far.
    pub fn move_to_insert_row(&mut self) -> Result<(), Error> {
        self.check_open()?;
        self.ensure_insertable()?;
        self.reset_staging_buffer(false)?;
        self.on_insert_row = true;
        debug!("Moved cursor to insert row.");
        Ok(())
    }

    /// Stages an update of the current row. The staged row starts out as a copy of the current
    /// row.
    pub fn begin_row_update(&mut self) -> Result<(), Error> {
        self.ensure_updatable()?;
        if self.on_insert_row {
            return Err(Error::OnInsertRow);
        }
        if !self.has_current_row() {
            return Err(Error::NoCurrentRow);
        }
        self.reset_staging_buffer(true)?;
        debug!("Staging update of row {}.", self.row);
        Ok(())
    }

    /// Stages `value` for the column identified by `label`. The label is resolved then the updates
    /// are merged, so an unknown or ambiguous label is reported by [`Self::merge_updates`].
    ///
    /// Starts an update of the current row, unless a staging cycle is already in progress.
    pub fn update_value(&mut self, label: &str, value: impl Into<Value>) -> Result<(), Error> {
        self.ensure_updatable()?;
        if self.staging.is_none() {
            self.begin_row_update()?;
        }
        self.pending
            .get_or_insert_with(PendingUpdates::new)
            .insert(label.to_owned(), value.into());
        Ok(())
    }

    /// Stages `value` for the column with one based index `column`. The value is keyed by the
    /// column name, so it is subject to the same matching rules as [`Self::update_value`].
    pub fn update_value_at(&mut self, column: i32, value: impl Into<Value>) -> Result<(), Error> {
        let name = self.check_open()?.name(column)?.to_owned();
        self.update_value(&name, value)
    }

    /// Writes all pending updates into the staged row. `NULL` values clear the cell, all other
    /// values are stored in their canonical text form (see [`Value`]).
    ///
    /// All labels are resolved before the first cell is written. If any label fails to resolve,
    /// the staged row is left as it was. Pending updates are kept, so merging repeatedly yields the
    /// same staged row.
    pub fn merge_updates(&mut self) -> Result<(), Error> {
        let catalog = self.catalog.as_mut().ok_or(Error::ClosedCursor)?;
        let (Some(staging), Some(pending)) = (self.staging.as_mut(), self.pending.as_ref()) else {
            return Ok(());
        };
        let edits = pending
            .iter()
            .map(|(label, value)| -> Result<_, Error> {
                let ordinal = catalog.resolve(label)?;
                let index = catalog.check_column(ordinal)?;
                Ok((index, value.to_text()))
            })
            .collect::<Result<Vec<_>, Error>>()?;
        staging.apply(edits);
        Ok(())
    }

    /// Merges pending updates and hands the row staged with [`Self::move_to_insert_row`] to
    /// `writer`. Afterwards the cursor leaves the insert row and iteration resumes.
    pub fn insert_row(&mut self, writer: &mut impl RowWriter) -> Result<(), Error> {
        self.check_open()?;
        if !self.on_insert_row {
            return Err(Error::NotOnInsertRow);
        }
        self.merge_updates()?;
        self.write_staged(|row| writer.insert(row))?;
        debug!("Flushed insert row.");
        self.finish_staging();
        Ok(())
    }

    /// Merges pending updates and hands the updated current row to `writer`. Does nothing if no
    /// update has been staged.
    pub fn update_row(&mut self, writer: &mut impl RowWriter) -> Result<(), Error> {
        self.check_open()?;
        if self.on_insert_row {
            return Err(Error::OnInsertRow);
        }
        if self.staging.is_none() {
            debug!("No update staged for row {}. Nothing to flush.", self.row);
            return Ok(());
        }
        self.merge_updates()?;
        self.write_staged(|row| writer.update(row))?;
        debug!("Flushed update of row {}.", self.row);
        self.finish_staging();
        Ok(())
    }

    fn write_staged(
        &self,
        write: impl FnOnce(StagedRow<'_>) -> Result<(), Error>,
    ) -> Result<(), Error> {
        let catalog = self.check_open()?;
        let Some(staging) = self.staging.as_ref() else {
            return Ok(());
        };
        write(StagedRow {
            table: self.statement.as_statement().table_name(),
            columns: catalog.names(),
            values: staging.cells(),
            current: staging.current(),
        })
    }

    /// Always fails. The cursor is forward only.
    pub fn previous(&mut self) -> Result<bool, Error> {
        Err(Error::forward_only("previous"))
    }

    /// Always fails. The cursor is forward only.
    pub fn first(&mut self) -> Result<bool, Error> {
        Err(Error::forward_only("first"))
    }

    /// Always fails. The cursor is forward only.
    pub fn last(&mut self) -> Result<bool, Error> {
        Err(Error::forward_only("last"))
    }

    /// Always fails. The cursor is forward only.
    pub fn before_first(&mut self) -> Result<(), Error> {
        Err(Error::forward_only("before_first"))
    }

    /// Always fails. The cursor is forward only.
    pub fn after_last(&mut self) -> Result<(), Error> {
        Err(Error::forward_only("after_last"))
    }

    /// Always fails. The cursor is forward only.
    pub fn absolute(&mut self, _row: i64) -> Result<bool, Error> {
        Err(Error::forward_only("absolute"))
    }

    /// Always fails. The cursor is forward only.
    pub fn relative(&mut self, _rows: i64) -> Result<bool, Error> {
        Err(Error::forward_only("relative"))
    }

    /// Always fails. The cursor is forward only, so it can not return from the insert row to a
    /// previous position. Flush the insert row with [`Self::insert_row`] instead.
    pub fn move_to_current_row(&mut self) -> Result<(), Error> {
        Err(Error::forward_only("move_to_current_row"))
    }

    /// Always fails.
    pub fn refresh_row(&mut self) -> Result<(), Error> {
        Err(Error::not_implemented("refresh_row"))
    }

    /// Always fails. Advancing the cursor abandons a staged row.
    pub fn cancel_row_updates(&mut self) -> Result<(), Error> {
        Err(Error::not_implemented("cancel_row_updates"))
    }

    /// Always fails.
    pub fn row_id(&mut self, _column: i32) -> Result<i64, Error> {
        Err(Error::not_implemented("row_id"))
    }

    /// Always fails.
    pub fn update_row_id(&mut self, _column: i32, _row_id: i64) -> Result<(), Error> {
        Err(Error::not_implemented("update_row_id"))
    }
}

/// Smallest of two row limits, there `0` stands for no limit.
fn effective_limit(a: usize, b: usize) -> usize {
    match (a, b) {
        (0, other) | (other, 0) => other,
        (a, b) => a.min(b),
    }
}

#[cfg(test)]
mod tests {
    use crate::{Statement, handles::MemoryStatement};

    use super::{Cursor, effective_limit};

    #[test]
    fn reopening_starts_with_empty_ordinal_cache() {
        let mut cursor = Cursor::new(Statement::new(MemoryStatement::new(
            "SELECT id, name FROM people",
            ["id", "name"],
        )));
        cursor.open().unwrap();
        cursor.find_column("name").unwrap();
        cursor.find_column("name").unwrap();
        assert_eq!(1, cursor.catalog.as_ref().unwrap().num_scans());

        cursor.close().unwrap();
        cursor.open().unwrap();

        // Same column names, yet the label is resolved anew
        assert_eq!(0, cursor.catalog.as_ref().unwrap().num_scans());
        assert_eq!(2, cursor.find_column("name").unwrap());
        assert_eq!(1, cursor.catalog.as_ref().unwrap().num_scans());
    }

    #[test]
    fn zero_means_unlimited() {
        assert_eq!(0, effective_limit(0, 0));
        assert_eq!(5, effective_limit(5, 0));
        assert_eq!(5, effective_limit(0, 5));
        assert_eq!(3, effective_limit(3, 5));
    }
}
