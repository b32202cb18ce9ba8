use lite_cursor::{
    Cursor, Error, RowWriter, Statement,
    buffers::StagedRow,
    handles::{ColumnFlags, MemoryStatement},
};

/// Cursor owning a statement over in memory rows.
pub type MemoryCursor = Cursor<Statement<MemoryStatement>>;

pub fn init() {
    // Set environment to something like:
    // RUST_LOG=lite_cursor=debug cargo test
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Two rows of people. The second one has a `NULL` name.
pub fn people() -> MemoryStatement {
    let mut stmt = MemoryStatement::new("SELECT id, name FROM people", ["id", "name"]).with_flags(
        vec![
            ColumnFlags {
                not_null: true,
                primary_key: true,
                auto_increment: true,
            },
            ColumnFlags::default(),
        ],
    );
    stmt.push_row([Some("1"), Some("Alice")]);
    stmt.push_row([Some("2"), None]);
    stmt
}

/// Result of a join there `name` is both a column of its own, and the suffix of a qualified one.
pub fn joined() -> MemoryStatement {
    let mut stmt = MemoryStatement::new(
        "SELECT p.id, t.name, p.name FROM people p JOIN teams t ON p.team = t.id",
        ["id", "t.name", "name"],
    );
    stmt.push_row([Some("1"), Some("Red"), Some("Alice")]);
    stmt
}

/// A query without any rows.
pub fn empty() -> MemoryStatement {
    MemoryStatement::new("SELECT id, name FROM people WHERE 0", ["id", "name"])
}

/// Opens a cursor owning `stmt`.
pub fn open(stmt: MemoryStatement) -> MemoryCursor {
    let mut cursor = Cursor::new(Statement::new(stmt));
    cursor.open().unwrap();
    cursor
}

/// Remembers every row it is asked to write.
#[derive(Default)]
pub struct RecordingWriter {
    pub inserted: Vec<WrittenRow>,
    pub updated: Vec<WrittenRow>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct WrittenRow {
    pub table: Option<String>,
    pub values: Vec<Option<String>>,
    pub current: Option<Vec<Option<String>>>,
}

impl WrittenRow {
    fn from_staged(row: StagedRow<'_>) -> Self {
        Self {
            table: row.table.map(str::to_owned),
            values: row.values.to_vec(),
            current: row.current.map(<[_]>::to_vec),
        }
    }
}

impl RowWriter for RecordingWriter {
    fn insert(&mut self, row: StagedRow<'_>) -> Result<(), Error> {
        self.inserted.push(WrittenRow::from_staged(row));
        Ok(())
    }

    fn update(&mut self, row: StagedRow<'_>) -> Result<(), Error> {
        self.updated.push(WrittenRow::from_staged(row));
        Ok(())
    }
}

/// Shorthand for a row of text values.
pub fn row(values: &[Option<&str>]) -> Vec<Option<String>> {
    values.iter().map(|v| v.map(str::to_owned)).collect()
}
