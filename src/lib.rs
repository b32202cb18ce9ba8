//! # Lite Cursor
//!
//! A forward only, updatable row cursor on top of the statements of an embedded SQL engine. The
//! cursor resolves column labels to ordinals, fetches column metadata lazily and can stage an
//! insert of a new row, or an update of the current one, before handing it to a writer.
//!
//! The engine itself is abstracted by [`handles::StatementHandle`]. The crate ships
//! [`handles::MemoryStatement`] to put a cursor on top of rows already held in memory.

mod column_catalog;
mod cursor;
mod error;
mod statement;
mod value;

pub mod buffers;
pub mod handles;

pub use self::{
    cursor::{Cursor, CursorOptions, RowWriter},
    error::{Error, Unsupported},
    statement::{AsStatement, Statement, table_name},
    value::Value,
};
