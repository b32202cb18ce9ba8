use std::collections::{HashMap, hash_map};

use crate::Value;

/// Sparse set of edits, keyed by column label, which have not been merged into a [`StagingRow`]
/// yet. Keys are unique, inserting a value for a label twice replaces the first one.
#[derive(Debug, Default, Clone)]
pub struct PendingUpdates {
    values: HashMap<String, Value>,
}

impl PendingUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages `value` for the column identified by `label`.
    pub fn insert(&mut self, label: String, value: Value) {
        self.values.insert(label, value);
    }

    /// Value staged for `label`, if any.
    pub fn get(&self, label: &str) -> Option<&Value> {
        self.values.get(label)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates the staged edits in no particular order.
    pub fn iter(&self) -> hash_map::Iter<'_, String, Value> {
        self.values.iter()
    }
}

/// One text cell per column of the result set. Filled with the current row if an update is staged,
/// or with `NULL`s if an insert is staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingRow {
    cells: Vec<Option<String>>,
    /// Copy of the row which is being updated, as it has been at the time of staging. `None` for
    /// the insert row.
    current: Option<Vec<Option<String>>>,
}

impl StagingRow {
    /// A row of `num_cols` `NULL`s, used to stage an insert.
    pub fn empty(num_cols: usize) -> Self {
        Self {
            cells: vec![None; num_cols],
            current: None,
        }
    }

    /// A row initialized with the values of `current`, used to stage an update of `current`.
    pub fn from_current(current: Vec<Option<String>>) -> Self {
        Self {
            cells: current.clone(),
            current: Some(current),
        }
    }

    /// Cells of the staged row. Index `0` holds the first column.
    pub fn cells(&self) -> &[Option<String>] {
        &self.cells
    }

    /// Cell at zero based `index`. `None` if out of bounds, `Some(None)` for `NULL`.
    pub fn cell(&self, index: usize) -> Option<Option<&str>> {
        self.cells.get(index).map(Option::as_deref)
    }

    /// Row values at the time the update has been staged. `None` for the insert row.
    pub fn current(&self) -> Option<&[Option<String>]> {
        self.current.as_deref()
    }

    /// Number of cells.
    pub fn num_cols(&self) -> usize {
        self.cells.len()
    }

    /// Writes all `edits` into the row. Every edit addresses a zero based column index which must
    /// be in bounds.
    ///
    /// # Panics
    ///
    /// If an index is out of bounds. Callers resolve indices against the same result set the row
    /// has been sized for.
    pub(crate) fn apply(&mut self, edits: impl IntoIterator<Item = (usize, Option<String>)>) {
        for (index, text) in edits {
            self.cells[index] = text;
        }
    }
}

/// A staged row ready to be flushed to storage. Handed to [`crate::RowWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagedRow<'a> {
    /// Table the result set has been selected from, if it could be determined from the SQL text.
    pub table: Option<&'a str>,
    /// Column names of the result set.
    pub columns: &'a [String],
    /// Staged values, one per column. `None` is `NULL`.
    pub values: &'a [Option<String>],
    /// Values of the updated row before the update. `None` if the row is inserted.
    pub current: Option<&'a [Option<String>]>,
}

#[cfg(test)]
mod tests {
    use super::{PendingUpdates, StagingRow};
    use crate::Value;

    #[test]
    fn empty_row_is_all_null() {
        let row = StagingRow::empty(3);
        assert_eq!(3, row.num_cols());
        assert!(row.cells().iter().all(Option::is_none));
        assert_eq!(None, row.current());
    }

    #[test]
    fn apply_keeps_untouched_cells() {
        let mut row = StagingRow::from_current(vec![Some("1".to_owned()), Some("Alice".to_owned())]);

        row.apply([(1, Some("Bob".to_owned()))]);

        assert_eq!(Some(Some("1")), row.cell(0));
        assert_eq!(Some(Some("Bob")), row.cell(1));
        assert_eq!(Some(&[Some("1".to_owned()), Some("Alice".to_owned())][..]), row.current());
    }

    #[test]
    fn later_update_of_same_label_wins() {
        let mut pending = PendingUpdates::new();
        pending.insert("name".to_owned(), Value::from("Bob"));
        pending.insert("name".to_owned(), Value::Null);

        assert_eq!(1, pending.len());
        assert_eq!(Some(&Value::Null), pending.get("name"));
    }
}
