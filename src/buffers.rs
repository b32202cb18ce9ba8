//! In memory buffers used to stage rows for insertion or update before they are flushed to
//! storage.

mod staging_row;

pub use staging_row::{PendingUpdates, StagedRow, StagingRow};
