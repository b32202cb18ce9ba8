use log::debug;

use crate::{Error, handles::StatementHandle};

/// A compiled statement. Owns the engine handle and remembers the row limit applications set for
/// result sets produced by it.
///
/// A statement may outlive many cursors: each time a query is executed a cursor is opened over it,
/// and closing that cursor resets the statement, so it can be executed again.
#[derive(Debug)]
pub struct Statement<H> {
    handle: H,
    /// Maximum number of rows a cursor over this statement yields. `0` means unlimited.
    max_rows: usize,
}

impl<H> Statement<H>
where
    H: StatementHandle,
{
    pub fn new(handle: H) -> Self {
        Self {
            handle,
            max_rows: 0,
        }
    }

    /// Limits the number of rows cursors over this statement yield. `0` lifts the limit. Takes
    /// effect with the next call to [`crate::Cursor::open`].
    pub fn set_max_rows(&mut self, max_rows: usize) {
        self.max_rows = max_rows;
    }

    /// Maximum number of rows cursors over this statement yield. `0` means unlimited.
    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    /// The underlying engine handle.
    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// Mutable access to the underlying engine handle.
    pub fn handle_mut(&mut self) -> &mut H {
        &mut self.handle
    }

    /// `true` once the engine side of the statement has been released.
    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }

    /// Releases the engine side of the statement. Calling this on an already closed statement does
    /// nothing.
    pub fn close(&mut self) -> Result<(), Error> {
        if self.handle.is_closed() {
            return Ok(());
        }
        debug!("Closing statement '{}'.", self.handle.sql());
        self.handle.close()
    }

    /// Table the statement selects from, guessed from the SQL text. See [`table_name`].
    pub fn table_name(&self) -> Option<&str> {
        table_name(self.handle.sql())
    }

    /// Consumes the statement and hands out the engine handle.
    pub fn into_handle(self) -> H {
        self.handle
    }
}

/// Grants a cursor access to its statement. Implemented both for owned statements and mutable
/// references to statements, so a cursor can either take ownership of its statement or merely
/// borrow it for the duration of the result set.
pub trait AsStatement {
    /// Engine handle of the statement.
    type Handle: StatementHandle;

    fn as_statement(&self) -> &Statement<Self::Handle>;

    fn as_statement_mut(&mut self) -> &mut Statement<Self::Handle>;
}

impl<H> AsStatement for Statement<H>
where
    H: StatementHandle,
{
    type Handle = H;

    fn as_statement(&self) -> &Statement<H> {
        self
    }

    fn as_statement_mut(&mut self) -> &mut Statement<H> {
        self
    }
}

impl<H> AsStatement for &mut Statement<H>
where
    H: StatementHandle,
{
    type Handle = H;

    fn as_statement(&self) -> &Statement<H> {
        self
    }

    fn as_statement_mut(&mut self) -> &mut Statement<H> {
        self
    }
}

/// Guesses the table a query selects from: the word following the first ` from ` (ignoring case),
/// up to the next space or semicolon. This is a heuristic. It does not understand subqueries,
/// quoted identifiers or joins beyond returning the first table named.
pub fn table_name(sql: &str) -> Option<&str> {
    // ASCII lowercase keeps byte offsets intact.
    let start = sql.to_ascii_lowercase().find(" from ")? + " from ".len();
    let rest = sql[start..].trim();
    let end = rest
        .find(' ')
        .or_else(|| rest.find(';'))
        .unwrap_or(rest.len());
    let name = &rest[..end];
    (!name.is_empty()).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::table_name;

    #[test]
    fn table_name_from_select() {
        assert_eq!(Some("people"), table_name("SELECT * FROM people"));
        assert_eq!(Some("people"), table_name("select id from people;"));
        assert_eq!(Some("people"), table_name("SELECT id FROM  people WHERE id = 1"));
        assert_eq!(Some("main.people"), table_name("SELECT id FROM main.people"));
    }

    #[test]
    fn no_table_name() {
        assert_eq!(None, table_name("SELECT 1"));
        assert_eq!(None, table_name("SELECT 1 FROM "));
    }
}
