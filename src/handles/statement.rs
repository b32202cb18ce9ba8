use super::ColumnFlags;
use crate::Error;

/// Engine side of a compiled statement. Implementations own whatever pointer the engine hands out
/// and expose the handful of primitives the cursor is built upon. The cursor never reimplements any
/// of these, it only calls them.
///
/// All column indices passed to a statement handle are zero based.
///
/// Engines are assumed to be non-reentrant per connection. A handle must therefore not be driven
/// from two threads at once. This trait does not demand `Send` or `Sync` and the cursor provides no
/// internal locking.
pub trait StatementHandle {
    /// SQL text the statement has been compiled from.
    fn sql(&self) -> &str;

    /// Rewinds the engine side statement, so it can either be executed again or be discarded
    /// safely.
    fn reset(&mut self) -> Result<(), Error>;

    /// Advances the engine cursor to the next row.
    ///
    /// # Return
    ///
    /// `true` if a row is available, `false` if the result set is exhausted. Calling `step` again
    /// after it returned `false` must keep returning `false`.
    fn step(&mut self) -> Result<bool, Error>;

    /// Number of columns in the result set. This is known once the statement has been compiled.
    fn column_count(&self) -> usize;

    /// Name of the column at `index`. Joins may qualify names with their table, e.g. `t.name`.
    fn column_name(&self, index: usize) -> Result<String, Error>;

    /// Value of the column at `index` within the current row in its text representation. `None`
    /// indicates `NULL`.
    fn column_text(&self, index: usize) -> Result<Option<String>, Error>;

    /// Flags for every column of the result set, one entry per column. This is considered
    /// expensive, the cursor fetches it at most once per open result set.
    fn column_metadata(&self) -> Result<Vec<ColumnFlags>, Error>;

    /// Releases the engine side compiled statement. After this call [`Self::is_closed`] returns
    /// `true`.
    fn close(&mut self) -> Result<(), Error>;

    /// `true` once [`Self::close`] has been called successfully.
    fn is_closed(&self) -> bool;
}

impl<H> StatementHandle for Box<H>
where
    H: StatementHandle + ?Sized,
{
    fn sql(&self) -> &str {
        (**self).sql()
    }

    fn reset(&mut self) -> Result<(), Error> {
        (**self).reset()
    }

    fn step(&mut self) -> Result<bool, Error> {
        (**self).step()
    }

    fn column_count(&self) -> usize {
        (**self).column_count()
    }

    fn column_name(&self, index: usize) -> Result<String, Error> {
        (**self).column_name(index)
    }

    fn column_text(&self, index: usize) -> Result<Option<String>, Error> {
        (**self).column_text(index)
    }

    fn column_metadata(&self) -> Result<Vec<ColumnFlags>, Error> {
        (**self).column_metadata()
    }

    fn close(&mut self) -> Result<(), Error> {
        (**self).close()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}
