//! Provides the seam between the cursor and the embedded storage engine. Two decisions are already
//! baked into this module:
//!
//! * Column values travel as text. Typed conversions are left to the application.
//! * Column indices passed to the engine are zero based. One based ordinals are a concern of the
//!   cursor.

mod column_flags;
mod memory;
mod statement;

pub use {
    column_flags::ColumnFlags,
    memory::{MemoryStatement, MemoryStats},
    statement::StatementHandle,
};
