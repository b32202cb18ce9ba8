use std::fmt;

use thiserror::Error as ThisError;

/// Why an operation is not supported by a [`crate::Cursor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unsupported {
    /// The operation would move the cursor backwards, or to an arbitrary position. The cursor is
    /// forward only.
    ForwardOnly,
    /// The operation is part of the usual cursor vocabulary, but has no implementation.
    NotImplemented,
}

impl fmt::Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unsupported::ForwardOnly => f.write_str("the cursor is forward only"),
            Unsupported::NotImplemented => f.write_str("it is not implemented"),
        }
    }
}

#[derive(Debug, ThisError)]
/// Error type returned by every fallible operation of this crate.
pub enum Error {
    /// An accessor has been invoked on a cursor which is not open.
    #[error("The cursor is closed.")]
    ClosedCursor,
    /// A one based column index has been outside of `[1, bound]`.
    #[error("Column index {index} out of bounds [1,{bound}].")]
    ColumnIndexOutOfRange {
        /// Offending index, as passed by the application.
        index: i32,
        /// Number of columns in the result set.
        bound: usize,
    },
    /// More than one column matches a label. Qualify the label with the table name to pick one.
    #[error("Ambiguous column: '{label}'.")]
    AmbiguousColumnName { label: String },
    /// No column matches a label.
    #[error("No such column: '{label}'.")]
    NoSuchColumnName { label: String },
    /// A row can only be staged for a result set with at least one known column.
    #[error("No column metadata available. The result set does not describe any column.")]
    MissingMetadata,
    /// The operation will never succeed on this cursor, regardless of its state.
    #[error("'{operation}' is not supported, because {reason}.")]
    UnsupportedOperation {
        operation: &'static str,
        reason: Unsupported,
    },
    /// A cursor has been opened on a statement which has already been released.
    #[error("The statement has been closed.")]
    StatementClosed,
    /// An update has been staged without the cursor being positioned on a row.
    #[error("The cursor is not positioned on a row.")]
    NoCurrentRow,
    /// An insert has been flushed without being on the insert row.
    #[error("The cursor is not on the insert row.")]
    NotOnInsertRow,
    /// The current row has been accessed for an update while staging a new row.
    #[error("The cursor is on the insert row.")]
    OnInsertRow,
    /// A storage primitive reported a failure.
    #[error("The engine emitted an error calling '{function}': {message}")]
    Engine {
        /// Primitive of the statement handle which failed.
        function: &'static str,
        message: String,
    },
}

impl Error {
    pub(crate) fn forward_only(operation: &'static str) -> Self {
        Error::UnsupportedOperation {
            operation,
            reason: Unsupported::ForwardOnly,
        }
    }

    pub(crate) fn not_implemented(operation: &'static str) -> Self {
        Error::UnsupportedOperation {
            operation,
            reason: Unsupported::NotImplemented,
        }
    }

    /// Failure of the storage primitive `function`. Intended for implementations of
    /// [`crate::handles::StatementHandle`].
    pub fn engine(function: &'static str, message: impl Into<String>) -> Self {
        Error::Engine {
            function,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn unsupported_names_operation_and_reason() {
        assert_eq!(
            "'previous' is not supported, because the cursor is forward only.",
            Error::forward_only("previous").to_string()
        );
        assert_eq!(
            "'row_id' is not supported, because it is not implemented.",
            Error::not_implemented("row_id").to_string()
        );
    }
}
